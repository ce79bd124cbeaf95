use std::future::Future;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, scrollable, text, Space};
use iced::{Element, Length, Subscription, Task, Theme};

use facelens_core::camera::domain::camera_source::{CameraAccess, CameraInfo, VideoConstraints};
use facelens_core::camera::infrastructure::nokhwa_camera::NokhwaAccess;
use facelens_core::detection::domain::analysis_config::DetectorModel;
use facelens_core::session::camera_session::CameraSession;
use facelens_core::session::camera_state::PrimaryAction;
use facelens_core::session::detection_loop::TickTicket;
use facelens_core::session::display_state::GenderLabels;
use facelens_core::session::snapshot::ReviewAnalysis;

use crate::settings::{Appearance, Settings};
use crate::tabs;
use crate::tabs::camera_tab::CameraView;
use crate::tabs::settings_tab::CameraChoice;
use crate::theme;
use crate::widgets::review_modal::review_modal;
use crate::workers::camera_worker::{CameraEvent, CameraWorker};
use crate::workers::inference_worker::{InferenceEvent, InferenceRequest, InferenceWorker};

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Camera,
    Settings,
    Appearance,
    About,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Camera, Tab::Settings, Tab::Appearance, Tab::About];

    fn label(self) -> &'static str {
        match self {
            Tab::Camera => "Camera",
            Tab::Settings => "Settings",
            Tab::Appearance => "Appearance",
            Tab::About => "About",
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    PrimaryPressed,
    PrimaryHovered(bool),
    StopPressed,
    StopHovered(bool),
    PermissionResolved(Result<(), String>),
    Redraw(Instant),
    CloseReview,
    SavePhoto,
    PhotoSaved(Result<Option<PathBuf>, String>),
    DismissAlert,
    RetryModels,
    RefreshCameras,
    CamerasListed(Result<Vec<CameraInfo>, String>),
    CameraSelected(CameraChoice),
    DetectorChanged(DetectorModel),
    ConfidenceChanged(u32),
    GazeThresholdChanged(u32),
    ShowLandmarksChanged(bool),
    ShowExpressionsChanged(bool),
    RestoreDefaults,
    AppearanceChanged(Appearance),
    HighContrastChanged(bool),
    FontScaleChanged(f32),
    PollSystemTheme,
}

// ---------------------------------------------------------------------------
// Supporting state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Loading { downloaded: u64, total: u64 },
    Ready,
    Failed(String),
}

impl ModelStatus {
    fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready)
    }

    fn is_loading(&self) -> bool {
        matches!(self, ModelStatus::Loading { .. })
    }
}

/// The most recent camera frame, uploaded for display.
pub struct VideoFrame {
    pub handle: Handle,
    pub width: u32,
    pub height: u32,
    sequence: u64,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    session: CameraSession,
    camera: Option<CameraWorker>,
    inference: InferenceWorker,
    models: ModelStatus,
    /// Live inference launched and not yet answered.
    pending_tick: Option<TickTicket>,
    video: Option<VideoFrame>,
    review_photo: Option<Handle>,
    /// Identifies the snapshot request of the open review.
    snapshot_id: u64,
    requesting_permission: bool,
    starting_camera: bool,
    cameras: Vec<CameraInfo>,
    alert: Option<String>,
    labels: GenderLabels,
    primary_hovered: bool,
    stop_hovered: bool,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let session = CameraSession::new(settings.analysis_config());
        let inference = InferenceWorker::spawn(settings.detector, settings.model_source());
        (
            Self {
                active_tab: Tab::Camera,
                settings,
                session,
                camera: None,
                inference,
                models: ModelStatus::Loading {
                    downloaded: 0,
                    total: 0,
                },
                pending_tick: None,
                video: None,
                review_photo: None,
                snapshot_id: 0,
                requesting_permission: false,
                starting_camera: false,
                cameras: Vec::new(),
                alert: None,
                labels: GenderLabels::default(),
                primary_hovered: false,
                stop_hovered: false,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
                if tab == Tab::Settings && self.cameras.is_empty() {
                    return list_cameras();
                }
            }
            Message::PrimaryPressed => return self.primary_action(),
            Message::PrimaryHovered(hovered) => self.primary_hovered = hovered,
            Message::StopPressed => self.stop_camera(),
            Message::StopHovered(hovered) => self.stop_hovered = hovered,
            Message::PermissionResolved(result) => {
                self.requesting_permission = false;
                match result {
                    Ok(()) => {
                        if let Err(e) = self.session.permission_granted() {
                            log::warn!("{e}");
                        }
                    }
                    Err(e) => self.alert = Some(format!("Camera access was not granted: {e}")),
                }
            }
            Message::Redraw(now) => self.on_redraw(now),
            Message::CloseReview => {
                self.session.close_review();
                self.review_photo = None;
            }
            Message::SavePhoto => return self.save_photo(),
            Message::PhotoSaved(Ok(Some(path))) => {
                log::info!("Saved photo to {}", path.display());
            }
            Message::PhotoSaved(Ok(None)) => {}
            Message::PhotoSaved(Err(e)) => self.alert = Some(format!("Could not save photo: {e}")),
            Message::DismissAlert => self.alert = None,
            Message::RetryModels => self.load_models(),
            Message::RefreshCameras => return list_cameras(),
            Message::CamerasListed(Ok(cameras)) => self.cameras = cameras,
            Message::CamerasListed(Err(e)) => {
                log::warn!("Failed to list cameras: {e}");
                self.cameras.clear();
            }
            Message::CameraSelected(choice) => {
                self.settings.camera_index = choice.index;
                self.settings.save();
            }
            Message::DetectorChanged(detector) => {
                if detector != self.settings.detector {
                    self.settings.detector = detector;
                    self.apply_settings();
                    self.load_models();
                }
            }
            Message::ConfidenceChanged(val) => {
                self.settings.confidence = val;
                self.apply_settings();
            }
            Message::GazeThresholdChanged(val) => {
                self.settings.gaze_threshold = val;
                self.apply_settings();
            }
            Message::ShowLandmarksChanged(enabled) => {
                self.settings.show_landmarks = enabled;
                self.settings.save();
            }
            Message::ShowExpressionsChanged(enabled) => {
                self.settings.show_expressions = enabled;
                self.settings.save();
            }
            Message::RestoreDefaults => {
                let previous = self.settings.detector;
                self.settings.restore_detection_defaults();
                self.apply_settings();
                if self.settings.detector != previous {
                    self.load_models();
                }
            }
            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings.save();
            }
            Message::HighContrastChanged(enabled) => {
                self.settings.high_contrast = enabled;
                self.settings.save();
            }
            Message::FontScaleChanged(scale) => {
                self.settings.font_scale = scale;
                self.settings.save();
            }
            Message::PollSystemTheme => {
                // Theme is resolved fresh in theme() on every render,
                // so just requesting a redraw is enough.
            }
        }
        Task::none()
    }

    fn primary_action(&mut self) -> Task<Message> {
        if self.requesting_permission || self.starting_camera {
            return Task::none();
        }
        match self.session.primary_action() {
            PrimaryAction::RequestPermission => {
                self.requesting_permission = true;
                Task::perform(
                    blocking(|| NokhwaAccess.request_permission().map_err(|e| e.to_string())),
                    |result| {
                        Message::PermissionResolved(result.unwrap_or_else(|| {
                            Err("the permission request was interrupted".to_string())
                        }))
                    },
                )
            }
            PrimaryAction::StartCamera => {
                self.start_camera();
                Task::none()
            }
            PrimaryAction::CapturePhoto => {
                self.capture_photo();
                Task::none()
            }
        }
    }

    fn start_camera(&mut self) {
        let constraints = VideoConstraints::with_device(self.settings.camera_index);
        log::info!("Starting camera {}", constraints.device_index);
        self.camera = Some(CameraWorker::spawn(constraints));
        self.starting_camera = true;
    }

    /// Releases the device and leaves `CameraActive`. Safe to call in any
    /// state.
    fn stop_camera(&mut self) {
        self.camera = None;
        self.starting_camera = false;
        self.video = None;
        self.pending_tick = None;
        if self.session.is_active() {
            if let Err(e) = self.session.stop() {
                log::warn!("{e}");
            }
        }
    }

    fn capture_photo(&mut self) {
        let Some(frame) = self.camera.as_ref().and_then(CameraWorker::latest_frame) else {
            self.alert = Some("No camera frame to capture yet".to_string());
            return;
        };
        let image = match self.session.capture(&frame) {
            Ok(image) => image.clone(),
            Err(e) => {
                self.alert = Some(format!("Could not capture photo: {e}"));
                return;
            }
        };
        self.review_photo = Some(Handle::from_bytes(image.png_bytes().to_vec()));
        self.snapshot_id += 1;

        if !self.models.is_ready() {
            self.session.set_review_analysis(ReviewAnalysis::Failed(
                "face analysis is not available".to_string(),
            ));
            return;
        }
        let request = InferenceRequest::Snapshot {
            id: self.snapshot_id,
            image,
            config: self.session.config().clone(),
        };
        if self.inference.submit(request).is_err() {
            self.session.set_review_analysis(ReviewAnalysis::Failed(
                "face analysis stopped".to_string(),
            ));
        }
    }

    fn save_photo(&self) -> Task<Message> {
        let Some(review) = self.session.review() else {
            return Task::none();
        };
        let png = review.image.png_bytes().to_vec();
        Task::perform(
            async move {
                let handle = rfd::AsyncFileDialog::new()
                    .set_title("Save photo")
                    .add_filter("PNG image", &["png"])
                    .set_file_name("facelens.png")
                    .save_file()
                    .await;
                match handle {
                    Some(h) => {
                        let path = h.path().to_path_buf();
                        std::fs::write(&path, &png)
                            .map(|_| Some(path))
                            .map_err(|e| e.to_string())
                    }
                    None => Ok(None),
                }
            },
            Message::PhotoSaved,
        )
    }

    fn apply_settings(&mut self) {
        self.settings.save();
        self.session.set_config(self.settings.analysis_config());
    }

    /// Replaces the inference worker, loading models for the current
    /// detector. Outstanding requests to the old worker are abandoned.
    fn load_models(&mut self) {
        if let Some(ticket) = self.pending_tick.take() {
            self.session
                .inference_failed(ticket, &"face analyzer was reloaded");
        }
        if self.review_is_pending() {
            self.session.set_review_analysis(ReviewAnalysis::Failed(
                "face analyzer was reloaded".to_string(),
            ));
        }
        self.inference =
            InferenceWorker::spawn(self.settings.detector, self.settings.model_source());
        self.models = ModelStatus::Loading {
            downloaded: 0,
            total: 0,
        };
    }

    fn review_is_pending(&self) -> bool {
        matches!(
            self.session.review().map(|r| &r.analysis),
            Some(ReviewAnalysis::Pending)
        )
    }

    // -----------------------------------------------------------------------
    // Redraw loop
    // -----------------------------------------------------------------------

    fn on_redraw(&mut self, now: Instant) {
        self.drain_camera_events();
        self.drain_inference_events();
        self.launch_detection(now);
        self.refresh_video();
    }

    fn drain_camera_events(&mut self) {
        while let Some(event) = self.camera.as_ref().and_then(CameraWorker::try_event) {
            match event {
                CameraEvent::Opened(..) => {
                    self.starting_camera = false;
                    if let Err(e) = self.session.camera_started() {
                        log::warn!("{e}");
                    }
                }
                CameraEvent::Failed(e) => {
                    self.stop_camera();
                    self.alert = Some(format!("Could not start the camera: {e}"));
                }
                CameraEvent::Lost(e) => {
                    self.stop_camera();
                    self.alert = Some(format!("The camera stopped: {e}"));
                }
            }
        }
    }

    fn drain_inference_events(&mut self) {
        while let Some(event) = self.inference.try_event() {
            match event {
                InferenceEvent::DownloadProgress(downloaded, total) => {
                    if self.models.is_loading() {
                        self.models = ModelStatus::Loading { downloaded, total };
                    }
                }
                InferenceEvent::Ready => self.models = ModelStatus::Ready,
                InferenceEvent::LoadFailed(e) => self.models = ModelStatus::Failed(e),
                InferenceEvent::Live { ticket, result } => {
                    if self.pending_tick == Some(ticket) {
                        self.pending_tick = None;
                    }
                    match result {
                        Ok(faces) => {
                            self.session.apply_detections(ticket, &faces);
                        }
                        Err(e) => self.session.inference_failed(ticket, &e),
                    }
                }
                InferenceEvent::Snapshot { id, result } => {
                    if id != self.snapshot_id {
                        continue;
                    }
                    self.session.set_review_analysis(match result {
                        Ok(report) => ReviewAnalysis::Ready(report),
                        Err(e) => ReviewAnalysis::Failed(e),
                    });
                }
            }
        }
    }

    fn launch_detection(&mut self, now: Instant) {
        if !self.models.is_ready() {
            return;
        }
        let Some(frame) = self.camera.as_ref().and_then(CameraWorker::latest_frame) else {
            return;
        };
        let Some(ticket) = self.session.poll(now, frame.dimensions()) else {
            return;
        };
        let request = InferenceRequest::Live {
            ticket,
            frame,
            options: self.session.config().detection_options(),
        };
        match self.inference.submit(request) {
            Ok(()) => self.pending_tick = Some(ticket),
            Err(_) => {
                self.session
                    .inference_failed(ticket, &"inference worker has stopped");
                self.models = ModelStatus::Failed("face analysis stopped".to_string());
            }
        }
    }

    fn refresh_video(&mut self) {
        let Some(frame) = self.camera.as_ref().and_then(CameraWorker::latest_frame) else {
            return;
        };
        if self
            .video
            .as_ref()
            .is_some_and(|v| v.sequence == frame.sequence())
        {
            return;
        }
        self.video = Some(VideoFrame {
            handle: Handle::from_rgba(frame.width(), frame.height(), frame.to_rgba()),
            width: frame.width(),
            height: frame.height(),
            sequence: frame.sequence(),
        });
    }

    // -----------------------------------------------------------------------
    // View
    // -----------------------------------------------------------------------

    pub fn view(&self) -> Element<'_, Message> {
        let fs = self.settings.font_scale;
        let theme = self.theme();

        // Tab bar
        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(scaled(13.0, fs));
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        // Tab content
        let content: Element<'_, Message> = match self.active_tab {
            Tab::Camera => tabs::camera_tab::view(
                CameraView {
                    session: &self.session,
                    video: self.video.as_ref(),
                    models: &self.models,
                    settings: &self.settings,
                    labels: &self.labels,
                    busy: self.requesting_permission || self.starting_camera,
                    primary_hovered: self.primary_hovered,
                    stop_hovered: self.stop_hovered,
                },
                &theme,
            ),
            Tab::Settings => scrollable(tabs::settings_tab::view(&self.settings, &self.cameras))
                .height(Length::Fill)
                .into(),
            Tab::Appearance => scrollable(tabs::appearance_tab::view(&self.settings))
                .height(Length::Fill)
                .into(),
            Tab::About => scrollable(tabs::about_tab::view(fs))
                .height(Length::Fill)
                .into(),
        };

        let mut body = column![].spacing(8);
        if let Some(alert) = &self.alert {
            body = body.push(alert_bar(alert, fs, &theme));
        }
        body = body.push(content);

        let page: Element<'_, Message> = column![
            tab_bar,
            container(body).padding(16).height(Length::Fill)
        ]
        .spacing(0)
        .height(Length::Fill)
        .into();

        match (self.session.review(), &self.review_photo) {
            (Some(review), Some(photo)) => review_modal(page, review, photo, &self.labels, fs),
            _ => page,
        }
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance, self.settings.high_contrast)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = Vec::new();
        if self.camera.is_some() || self.models.is_loading() || self.review_is_pending() {
            subscriptions.push(iced::window::frames().map(Message::Redraw));
        }
        if self.settings.appearance == Appearance::System {
            subscriptions
                .push(iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme));
        }
        Subscription::batch(subscriptions)
    }
}

fn alert_bar<'a>(message: &str, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let danger = theme.extended_palette().danger.base.color;
    container(
        row![
            text(message.to_owned()).size(scaled(13.0, fs)),
            Space::new().width(Length::Fill),
            button(text("Dismiss").size(scaled(12.0, fs)))
                .on_press(Message::DismissAlert)
                .style(button::text),
        ]
        .align_y(iced::Alignment::Center),
    )
    .padding([6, 12])
    .width(Length::Fill)
    .style(move |_theme: &Theme| container::Style {
        background: Some(iced::Color { a: 0.15, ..danger }.into()),
        border: iced::border::Border {
            radius: 8.0.into(),
            ..iced::border::Border::default()
        },
        ..container::Style::default()
    })
    .into()
}

fn list_cameras() -> Task<Message> {
    Task::perform(
        blocking(|| NokhwaAccess.devices().map_err(|e| e.to_string())),
        |result| {
            Message::CamerasListed(
                result.unwrap_or_else(|| Err("camera query was interrupted".to_string())),
            )
        },
    )
}

/// Runs `work` on its own thread and resolves with its result. Resolves to
/// `None` if the thread panicked.
fn blocking<T, F>(work: F) -> impl Future<Output = Option<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = iced::futures::channel::oneshot::channel();
    thread::spawn(move || {
        let _ = tx.send(work());
    });
    async move { rx.await.ok() }
}

/// Scale a base font size by the user's font_scale setting.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_rounds() {
        assert_eq!(scaled(13.0, 1.0), 13.0);
        assert_eq!(scaled(13.0, 1.25), 16.0);
    }

    #[test]
    fn test_model_status_predicates() {
        assert!(ModelStatus::Ready.is_ready());
        assert!(ModelStatus::Loading {
            downloaded: 1,
            total: 2
        }
        .is_loading());
        assert!(!ModelStatus::Failed("x".into()).is_ready());
    }
}
