use std::time::Instant;

use thiserror::Error;

use crate::detection::domain::analysis_config::AnalysisConfig;
use crate::detection::domain::face_analysis::FaceAnalysis;
use crate::session::camera_state::{CameraState, PrimaryAction};
use crate::session::detection_loop::{DetectionGate, TickTicket};
use crate::session::display_state::DisplayState;
use crate::session::snapshot::{CapturedImage, Review, ReviewAnalysis, SnapshotError};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: CameraState,
    },
    #[error("camera is not active")]
    NotActive,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// The camera workflow for one view: permission and activation state,
/// the live detection gate, the derived display state and the open review.
///
/// Pure state. Opening devices and running inference is the caller's job;
/// the session only decides when and what to keep.
pub struct CameraSession {
    state: CameraState,
    display: DisplayState,
    gate: DetectionGate,
    config: AnalysisConfig,
    review: Option<Review>,
}

impl CameraSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            state: CameraState::default(),
            display: DisplayState::initial(),
            gate: DetectionGate::new(config.detection_interval),
            config,
            review: None,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn primary_action(&self) -> PrimaryAction {
        self.state.primary_action()
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.state == CameraState::CameraActive
    }

    pub fn is_inference_in_flight(&self) -> bool {
        self.gate.is_in_flight()
    }

    /// Applies new tunables. Takes effect on the next tick.
    pub fn set_config(&mut self, config: AnalysisConfig) {
        self.gate.set_interval(config.detection_interval);
        self.config = config;
    }

    pub fn permission_granted(&mut self) -> Result<(), SessionError> {
        self.transition("grant permission", CameraState::NoPermission)?;
        self.state = CameraState::PermissionGranted;
        log::info!("Camera permission granted");
        Ok(())
    }

    /// Call once the capture handle is open.
    pub fn camera_started(&mut self) -> Result<(), SessionError> {
        self.transition("start camera", CameraState::PermissionGranted)?;
        self.state = CameraState::CameraActive;
        self.display = DisplayState::initial();
        self.gate.start();
        log::info!(
            "Camera active, detecting every {}ms",
            self.config.detection_interval.as_millis()
        );
        Ok(())
    }

    /// Leaves `CameraActive`; clears display state including the counter.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        self.transition("stop camera", CameraState::CameraActive)?;
        self.state = CameraState::PermissionGranted;
        self.display = DisplayState::initial();
        self.gate.stop();
        log::info!("Camera stopped");
        Ok(())
    }

    fn transition(&self, action: &'static str, from: CameraState) -> Result<(), SessionError> {
        if self.state == from {
            Ok(())
        } else {
            log::warn!("Rejected '{action}' in state {}", self.state);
            Err(SessionError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    /// Called on every redraw. Returns a ticket when an inference on the
    /// current frame should be launched now.
    pub fn poll(&mut self, now: Instant, frame_dims: (u32, u32)) -> Option<TickTicket> {
        if !self.is_active() || frame_dims.0 == 0 || frame_dims.1 == 0 {
            return None;
        }
        let ticket = self.gate.try_launch(now)?;
        log::debug!("Launching detection tick {}", ticket.sequence());
        Some(ticket)
    }

    /// Folds one tick's result into the display state. Returns false when
    /// the ticket is stale and the result was dropped.
    pub fn apply_detections(&mut self, ticket: TickTicket, faces: &[FaceAnalysis]) -> bool {
        if !self.gate.complete(ticket) {
            log::debug!("Dropping stale result of tick {}", ticket.sequence());
            return false;
        }
        self.display = self.display.next(faces, &self.config);
        true
    }

    /// Frees the in-flight slot after a failed inference, keeping the
    /// previous display state.
    pub fn inference_failed(&mut self, ticket: TickTicket, error: &dyn std::fmt::Display) {
        if self.gate.complete(ticket) {
            log::warn!("Detection tick {} failed: {error}", ticket.sequence());
        }
    }

    /// Captures `frame` as a still and opens the review for it. Live state
    /// is untouched.
    pub fn capture(&mut self, frame: &Frame) -> Result<&CapturedImage, SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }
        let image = CapturedImage::encode(frame)?;
        log::info!("Captured {}x{} still", image.width(), image.height());
        let review = self.review.insert(Review {
            image,
            analysis: ReviewAnalysis::Pending,
        });
        Ok(&review.image)
    }

    pub fn review(&self) -> Option<&Review> {
        self.review.as_ref()
    }

    /// Attaches the one-shot analysis result. Ignored when no review is open.
    pub fn set_review_analysis(&mut self, analysis: ReviewAnalysis) {
        if let Some(review) = self.review.as_mut() {
            review.analysis = analysis;
        }
    }

    /// Discards the captured still and its analysis.
    pub fn close_review(&mut self) {
        self.review = None;
    }
}
