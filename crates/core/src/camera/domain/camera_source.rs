use thiserror::Error;

use crate::shared::constants::{IDEAL_CAPTURE_FPS, IDEAL_CAPTURE_HEIGHT, IDEAL_CAPTURE_WIDTH};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera access was denied")]
    PermissionDenied,
    #[error("no camera found at index {0}")]
    NoDevice(u32),
    #[error("failed to open camera: {0}")]
    Open(String),
    #[error("failed to capture frame: {0}")]
    Capture(String),
    #[error("camera is not open")]
    NotOpen,
}

/// Requested capture format. The device picks the closest it supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoConstraints {
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: IDEAL_CAPTURE_WIDTH,
            height: IDEAL_CAPTURE_HEIGHT,
            fps: IDEAL_CAPTURE_FPS,
        }
    }
}

impl VideoConstraints {
    pub fn with_device(device_index: u32) -> Self {
        Self {
            device_index,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraInfo {
    pub index: u32,
    pub name: String,
    pub description: String,
}

/// Permission and enumeration for the platform's capture devices.
pub trait CameraAccess {
    /// Asks the OS for camera access. Blocks until the user answers.
    fn request_permission(&self) -> Result<(), CameraError>;

    fn devices(&self) -> Result<Vec<CameraInfo>, CameraError>;
}

/// An exclusive capture handle on one device.
///
/// Not `Send`: some backends tie the handle to the thread that opened it, so
/// workers construct their source inside the thread that reads it.
pub trait CameraSource {
    fn open(&mut self, constraints: &VideoConstraints) -> Result<(), CameraError>;

    /// Blocks until the next frame is available.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Releases the device. Closing a closed source is a no-op.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}
