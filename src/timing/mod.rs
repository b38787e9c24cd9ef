pub mod classifier;
pub mod dwell;
pub mod selector;
pub mod state;
pub mod tame;

pub use classifier::HysteresisClassifier;
pub use dwell::{enforce_min_dwell, min_dwell_frames};
pub use selector::{build_plan, OutputPlan};
pub use state::{runs, MotionState, StateRun};
pub use tame::{annotate_tame_tsume, TameAnnotation, TSUME_RISE_WINDOW};
