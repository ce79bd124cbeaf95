use std::fmt;

/// Stage of the camera workflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraState {
    #[default]
    NoPermission,
    PermissionGranted,
    CameraActive,
}

/// What the single primary control does in the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryAction {
    RequestPermission,
    StartCamera,
    CapturePhoto,
}

impl CameraState {
    pub fn primary_action(self) -> PrimaryAction {
        match self {
            CameraState::NoPermission => PrimaryAction::RequestPermission,
            CameraState::PermissionGranted => PrimaryAction::StartCamera,
            CameraState::CameraActive => PrimaryAction::CapturePhoto,
        }
    }
}

impl PrimaryAction {
    pub fn label(self) -> &'static str {
        match self {
            PrimaryAction::RequestPermission => "Allow Camera Access",
            PrimaryAction::StartCamera => "Start Camera",
            PrimaryAction::CapturePhoto => "Take Photo",
        }
    }
}

impl fmt::Display for CameraState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraState::NoPermission => write!(f, "no-permission"),
            CameraState::PermissionGranted => write!(f, "permission-granted"),
            CameraState::CameraActive => write!(f, "camera-active"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_initial_state_has_no_permission() {
        assert_eq!(CameraState::default(), CameraState::NoPermission);
    }

    #[rstest]
    #[case(CameraState::NoPermission, PrimaryAction::RequestPermission)]
    #[case(CameraState::PermissionGranted, PrimaryAction::StartCamera)]
    #[case(CameraState::CameraActive, PrimaryAction::CapturePhoto)]
    fn test_primary_action_per_state(#[case] state: CameraState, #[case] action: PrimaryAction) {
        assert_eq!(state.primary_action(), action);
    }

    #[test]
    fn test_labels_are_distinct() {
        let labels = [
            PrimaryAction::RequestPermission.label(),
            PrimaryAction::StartCamera.label(),
            PrimaryAction::CapturePhoto.label(),
        ];
        assert_ne!(labels[0], labels[1]);
        assert_ne!(labels[1], labels[2]);
    }
}
