//! Landmark Frames
//!
//! Per-frame evidence produced by the external face and pose detectors.
//! Either source may be missing in any given frame; the decision engine
//! treats a frame with no evidence at all as an absence signal.

mod error;
mod frame;
mod validator;

pub use error::ValidationError;
pub use frame::{
    BoundingBox, FaceEvidence, LandmarkFrame, LandmarkKind, Point2, PoseEvidence, PoseLandmark,
};
pub use validator::{FrameValidator, ValidationConfig, ValidationResult};
