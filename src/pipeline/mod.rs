#[cfg(feature = "camera-nokhwa")]
pub mod camera;
pub mod landmarker;
pub mod prep;

// Re-exports for convenience
#[cfg(feature = "camera-nokhwa")]
pub use camera::{CameraStream, start_camera_stream};
pub use landmarker::HandLandmarker;
