pub mod container;
pub mod transform;

pub use container::{VideoFrame, VideoStream};
pub use transform::VideoFrameTransformer;
