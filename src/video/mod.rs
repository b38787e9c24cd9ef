pub mod reader;
pub mod writer;

pub use reader::{validate_frame_rate, VideoReader, FPS_TOLERANCE};
pub use writer::write_retimed_video;
