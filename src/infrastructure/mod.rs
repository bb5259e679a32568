pub mod capture_device;
pub mod directory_camera;

pub use capture_device::{
    CaptureConstraints, CaptureDevice, DeviceHandle, DeviceLease, FacingMode, Resolution,
};
pub use directory_camera::DirectoryCamera;
