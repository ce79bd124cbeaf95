use std::time::Instant;

use crate::camera::domain::camera_source::{CameraAccess, CameraSource, VideoConstraints};
use crate::detection::domain::analysis_config::AnalysisConfig;
use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::session::camera_session::CameraSession;
use crate::session::display_state::DisplayState;

/// Counters of one headless run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiveSummary {
    pub frames: u64,
    pub ticks: u64,
    pub failures: u64,
    pub frames_with_face: u64,
}

/// Headless live session: permission → open camera → capture continuously,
/// launching an inference whenever the detection gate allows one.
///
/// Inference runs inline, so the gate's single in-flight slot is always
/// free again by the next frame.
pub struct LiveSessionUseCase {
    access: Box<dyn CameraAccess>,
    camera: Box<dyn CameraSource>,
    analyzer: Box<dyn FaceAnalyzer>,
    session: CameraSession,
    constraints: VideoConstraints,
}

impl LiveSessionUseCase {
    pub fn new(
        access: Box<dyn CameraAccess>,
        camera: Box<dyn CameraSource>,
        analyzer: Box<dyn FaceAnalyzer>,
        config: AnalysisConfig,
        constraints: VideoConstraints,
    ) -> Self {
        Self {
            access,
            camera,
            analyzer,
            session: CameraSession::new(config),
            constraints,
        }
    }

    pub fn session(&self) -> &CameraSession {
        &self.session
    }

    /// Runs until `max_ticks` completed detections (forever when `None`).
    /// `on_tick` sees the display state after every completed detection.
    pub fn execute(
        &mut self,
        max_ticks: Option<u64>,
        on_tick: &mut dyn FnMut(&DisplayState),
    ) -> Result<LiveSummary, Box<dyn std::error::Error>> {
        self.access.request_permission()?;
        self.session.permission_granted()?;

        self.camera.open(&self.constraints)?;
        self.session.camera_started()?;

        let result = self.run_loop(max_ticks, on_tick);

        self.camera.close();
        self.session.stop()?;
        result
    }

    fn run_loop(
        &mut self,
        max_ticks: Option<u64>,
        on_tick: &mut dyn FnMut(&DisplayState),
    ) -> Result<LiveSummary, Box<dyn std::error::Error>> {
        let mut summary = LiveSummary::default();
        let options = self.session.config().detection_options();

        while max_ticks.map_or(true, |max| summary.ticks < max) {
            let frame = self.camera.capture()?;
            summary.frames += 1;

            let Some(ticket) = self.session.poll(Instant::now(), frame.dimensions()) else {
                continue;
            };
            match self.analyzer.analyze(&frame, &options) {
                Ok(faces) => {
                    if self.session.apply_detections(ticket, &faces) {
                        summary.ticks += 1;
                        on_tick(self.session.display());
                    }
                }
                Err(e) => {
                    summary.failures += 1;
                    self.session.inference_failed(ticket, &e);
                }
            }
        }

        summary.frames_with_face = self.session.display().frames_with_face();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::domain::camera_source::{CameraError, CameraInfo};
    use crate::detection::domain::expressions::Expressions;
    use crate::detection::domain::face_analysis::{FaceAnalysis, Gender};
    use crate::detection::domain::face_analyzer::DetectionOptions;
    use crate::detection::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT};
    use crate::session::camera_state::CameraState;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct StubAccess {
        granted: bool,
    }

    impl CameraAccess for StubAccess {
        fn request_permission(&self) -> Result<(), CameraError> {
            if self.granted {
                Ok(())
            } else {
                Err(CameraError::PermissionDenied)
            }
        }

        fn devices(&self) -> Result<Vec<CameraInfo>, CameraError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct CameraLog {
        opened: bool,
        closed: bool,
    }

    struct StubCamera {
        log: Arc<Mutex<CameraLog>>,
        fail_after: Option<u64>,
        captured: u64,
    }

    impl CameraSource for StubCamera {
        fn open(&mut self, _constraints: &VideoConstraints) -> Result<(), CameraError> {
            self.log.lock().unwrap().opened = true;
            Ok(())
        }

        fn capture(&mut self) -> Result<Frame, CameraError> {
            self.captured += 1;
            if self.fail_after.is_some_and(|n| self.captured > n) {
                return Err(CameraError::Capture("unplugged".into()));
            }
            Ok(Frame::new(vec![0; 8 * 6 * 3], 8, 6, self.captured))
        }

        fn close(&mut self) {
            self.log.lock().unwrap().closed = true;
        }

        fn is_open(&self) -> bool {
            let log = self.log.lock().unwrap();
            log.opened && !log.closed
        }
    }

    /// Replays a script of per-call results.
    struct ScriptedAnalyzer {
        script: VecDeque<Result<usize, String>>,
    }

    impl FaceAnalyzer for ScriptedAnalyzer {
        fn analyze(
            &mut self,
            _frame: &Frame,
            _options: &DetectionOptions,
        ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
            match self.script.pop_front().unwrap_or(Ok(0)) {
                Ok(n) => Ok((0..n).map(|_| face()).collect()),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn face() -> FaceAnalysis {
        FaceAnalysis {
            bbox: BoundingBox::new(1.0, 1.0, 4.0, 4.0),
            score: 0.9,
            landmarks: FaceLandmarks::new(vec![(3.0, 3.0); LANDMARK_COUNT]).unwrap(),
            age: 30.0,
            gender: Gender::Female,
            gender_probability: 0.9,
            expressions: Expressions::default(),
        }
    }

    fn fast_config() -> AnalysisConfig {
        AnalysisConfig {
            detection_interval: Duration::ZERO,
            ..AnalysisConfig::default()
        }
    }

    fn use_case(
        granted: bool,
        fail_after: Option<u64>,
        script: Vec<Result<usize, String>>,
    ) -> (LiveSessionUseCase, Arc<Mutex<CameraLog>>) {
        let log = Arc::new(Mutex::new(CameraLog::default()));
        let uc = LiveSessionUseCase::new(
            Box::new(StubAccess { granted }),
            Box::new(StubCamera {
                log: log.clone(),
                fail_after,
                captured: 0,
            }),
            Box::new(ScriptedAnalyzer {
                script: script.into(),
            }),
            fast_config(),
            VideoConstraints::default(),
        );
        (uc, log)
    }

    #[test]
    fn test_runs_requested_ticks_and_reports_each() {
        let (mut uc, log) = use_case(true, None, vec![Ok(1), Ok(0), Ok(2)]);
        let mut seen = Vec::new();

        let summary = uc
            .execute(Some(3), &mut |d: &DisplayState| seen.push(d.has_face()))
            .unwrap();

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.frames_with_face, 2);
        assert_eq!(seen, vec![true, false, true]);
        assert!(log.lock().unwrap().closed);
        assert_eq!(uc.session().state(), CameraState::PermissionGranted);
    }

    #[test]
    fn test_inference_failure_is_skipped() {
        let (mut uc, _) = use_case(true, None, vec![Err("boom".into()), Ok(1)]);
        let summary = uc.execute(Some(1), &mut |_| {}).unwrap();
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.ticks, 1);
    }

    #[test]
    fn test_permission_denied_never_opens_camera() {
        let (mut uc, log) = use_case(false, None, Vec::new());
        assert!(uc.execute(Some(1), &mut |_| {}).is_err());
        assert!(!log.lock().unwrap().opened);
        assert_eq!(uc.session().state(), CameraState::NoPermission);
    }

    #[test]
    fn test_capture_error_still_releases_camera() {
        let (mut uc, log) = use_case(true, Some(2), vec![Ok(1), Ok(1), Ok(1)]);
        assert!(uc.execute(None, &mut |_| {}).is_err());
        assert!(log.lock().unwrap().closed);
        assert_eq!(uc.session().state(), CameraState::PermissionGranted);
    }
}
