use std::sync::mpsc;
use std::time::Duration;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;

use crate::camera::domain::camera_source::{
    CameraAccess, CameraError, CameraInfo, CameraSource, VideoConstraints,
};
use crate::shared::frame::Frame;

const PERMISSION_TIMEOUT: Duration = Duration::from_secs(60);

/// Platform camera access through nokhwa's native backends.
#[derive(Clone, Copy, Debug, Default)]
pub struct NokhwaAccess;

impl CameraAccess for NokhwaAccess {
    fn request_permission(&self) -> Result<(), CameraError> {
        let (tx, rx) = mpsc::channel();
        nokhwa::nokhwa_initialize(move |granted| {
            let _ = tx.send(granted);
        });
        match rx.recv_timeout(PERMISSION_TIMEOUT) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(CameraError::PermissionDenied),
        }
    }

    fn devices(&self) -> Result<Vec<CameraInfo>, CameraError> {
        let cameras =
            nokhwa::query(ApiBackend::Auto).map_err(|e| CameraError::Open(e.to_string()))?;
        Ok(cameras
            .into_iter()
            .enumerate()
            .map(|(i, cam)| CameraInfo {
                index: match cam.index() {
                    CameraIndex::Index(n) => *n,
                    CameraIndex::String(_) => i as u32,
                },
                name: cam.human_name(),
                description: cam.description().to_string(),
            })
            .collect())
    }
}

/// Capture handle backed by a nokhwa [`Camera`]. The stream is stopped on
/// [`CameraSource::close`] and when the value is dropped.
#[derive(Default)]
pub struct NokhwaCamera {
    camera: Option<Camera>,
    sequence: u64,
}

impl NokhwaCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Negotiated resolution, once open.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.camera.as_ref().map(|cam| {
            let res = cam.resolution();
            (res.width(), res.height())
        })
    }
}

impl CameraSource for NokhwaCamera {
    fn open(&mut self, constraints: &VideoConstraints) -> Result<(), CameraError> {
        self.close();

        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(constraints.width, constraints.height),
                FrameFormat::MJPEG,
                constraints.fps,
            ),
        ));
        let mut camera = Camera::new(CameraIndex::Index(constraints.device_index), format)
            .map_err(|e| match e {
                nokhwa::NokhwaError::OpenDeviceError(..) => {
                    CameraError::NoDevice(constraints.device_index)
                }
                other => CameraError::Open(other.to_string()),
            })?;
        camera
            .open_stream()
            .map_err(|e| CameraError::Open(e.to_string()))?;

        let res = camera.resolution();
        log::info!(
            "Opened camera {} at {}x{}",
            constraints.device_index,
            res.width(),
            res.height()
        );
        self.camera = Some(camera);
        self.sequence = 0;
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let camera = self.camera.as_mut().ok_or(CameraError::NotOpen)?;
        let buffer = camera
            .frame()
            .map_err(|e| CameraError::Capture(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Capture(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());
        self.sequence += 1;
        Ok(Frame::new(decoded.into_raw(), width, height, self.sequence))
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera stream: {e}");
            }
            log::info!("Camera released");
        }
    }

    fn is_open(&self) -> bool {
        self.camera.is_some()
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_camera_is_closed() {
        let cam = NokhwaCamera::new();
        assert!(!cam.is_open());
        assert!(cam.resolution().is_none());
    }

    #[test]
    fn test_capture_before_open_fails() {
        let mut cam = NokhwaCamera::new();
        assert!(matches!(cam.capture(), Err(CameraError::NotOpen)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut cam = NokhwaCamera::new();
        cam.close();
        cam.close();
        assert!(!cam.is_open());
    }
}
