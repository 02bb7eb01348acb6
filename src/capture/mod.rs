pub mod chunk;
pub mod source;

pub use chunk::{ChunkBuffer, FrozenBuffer, MediaChunk};
pub use source::{CaptureSource, ScriptedSource};
