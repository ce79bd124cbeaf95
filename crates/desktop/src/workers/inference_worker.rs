use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use facelens_core::detection::domain::analysis_config::{AnalysisConfig, DetectorModel};
use facelens_core::detection::domain::face_analysis::FaceAnalysis;
use facelens_core::detection::domain::face_analyzer::{DetectionOptions, FaceAnalyzer};
use facelens_core::detection::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;
use facelens_core::session::detection_loop::TickTicket;
use facelens_core::session::snapshot::{analyze_snapshot, CapturedImage, SnapshotReport};
use facelens_core::shared::frame::Frame;
use facelens_core::shared::model_resolver::{self, ModelSource, Progress};

pub enum InferenceRequest {
    Live {
        ticket: TickTicket,
        frame: Arc<Frame>,
        options: DetectionOptions,
    },
    Snapshot {
        id: u64,
        image: CapturedImage,
        config: AnalysisConfig,
    },
}

pub enum InferenceEvent {
    DownloadProgress(u64, u64),
    Ready,
    LoadFailed(String),
    Live {
        ticket: TickTicket,
        result: Result<Vec<FaceAnalysis>, String>,
    },
    Snapshot {
        id: u64,
        result: Result<SnapshotReport, String>,
    },
}

type AnalyzerResult = Result<Box<dyn FaceAnalyzer>, Box<dyn std::error::Error>>;

/// Owns the face analyzer on a dedicated thread. Models are resolved and
/// loaded there first; requests are then served one at a time in arrival
/// order. Dropping the worker closes the request channel and the thread
/// exits after its current request.
pub struct InferenceWorker {
    requests: Sender<InferenceRequest>,
    events: Receiver<InferenceEvent>,
}

impl InferenceWorker {
    pub fn spawn(detector: DetectorModel, source: ModelSource) -> Self {
        Self::spawn_with(move |progress| {
            let paths = model_resolver::resolve_models(detector, &source, Some(progress))?;
            let analyzer = OnnxFaceAnalyzer::load(&paths, detector)?;
            Ok(Box::new(analyzer) as Box<dyn FaceAnalyzer>)
        })
    }

    pub fn spawn_with<F>(load: F) -> Self
    where
        F: FnOnce(Progress<'_>) -> AnalyzerResult + Send + 'static,
    {
        let (req_tx, req_rx) = crossbeam_channel::unbounded::<InferenceRequest>();
        let (evt_tx, evt_rx) = crossbeam_channel::unbounded::<InferenceEvent>();

        thread::spawn(move || {
            let progress_tx = evt_tx.clone();
            let progress = move |downloaded: u64, total: u64| {
                let _ = progress_tx.send(InferenceEvent::DownloadProgress(downloaded, total));
            };
            let mut analyzer = match load(&progress) {
                Ok(analyzer) => analyzer,
                Err(e) => {
                    log::error!("Failed to load face analyzer: {e}");
                    let _ = evt_tx.send(InferenceEvent::LoadFailed(e.to_string()));
                    return;
                }
            };
            let _ = evt_tx.send(InferenceEvent::Ready);

            for request in req_rx.iter() {
                let event = serve(analyzer.as_mut(), request);
                if evt_tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: req_tx,
            events: evt_rx,
        }
    }

    /// Queues a request. Returns it back if the worker has exited.
    pub fn submit(&self, request: InferenceRequest) -> Result<(), InferenceRequest> {
        self.requests.send(request).map_err(|e| e.into_inner())
    }

    pub fn try_event(&self) -> Option<InferenceEvent> {
        self.events.try_recv().ok()
    }
}

fn serve(analyzer: &mut dyn FaceAnalyzer, request: InferenceRequest) -> InferenceEvent {
    match request {
        InferenceRequest::Live {
            ticket,
            frame,
            options,
        } => InferenceEvent::Live {
            ticket,
            result: analyzer
                .analyze(&frame, &options)
                .map_err(|e| e.to_string()),
        },
        InferenceRequest::Snapshot { id, image, config } => InferenceEvent::Snapshot {
            id,
            result: analyze_snapshot(analyzer, &image, &config).map_err(|e| e.to_string()),
        },
    }
}
