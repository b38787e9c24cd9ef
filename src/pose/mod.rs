pub mod keypoint;
pub mod track;

#[cfg(feature = "video")]
pub mod detector;
#[cfg(feature = "video")]
pub mod preprocess;

#[cfg(feature = "video")]
pub use detector::{MoveNetEstimator, PoseEstimator};
pub use keypoint::{Keypoint, KeypointIndex, Pose, DEFAULT_CONFIDENCE, JOINT_TRIPLES};
#[cfg(feature = "video")]
pub use preprocess::{preprocess_for_movenet, unletterbox_pose, LetterboxInfo};
pub use track::{build_track, FramePose, PoseTrack};
