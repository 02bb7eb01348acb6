use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// A single raw fragment delivered by the capture source.
///
/// Chunk bytes are opaque to the pipeline: they are never inspected or
/// mutated after creation, only concatenated back into the original stream.
#[derive(Debug, Clone)]
pub struct MediaChunk {
    /// Raw container bytes for this fragment
    pub data: Vec<u8>,
    /// Arrival sequence number (0-indexed)
    pub sequence: u64,
}

impl MediaChunk {
    pub fn new(sequence: u64, data: Vec<u8>) -> Self {
        Self { data, sequence }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered, append-only storage for captured fragments.
///
/// Chunks are stored in arrival order. Concatenating them in stored order
/// reconstructs the raw media byte stream the capture source produced.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<MediaChunk>,
    total_bytes: usize,
    frozen: bool,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk, preserving arrival order.
    ///
    /// Zero-length chunks are silently dropped. Appending to a frozen
    /// buffer is rejected.
    pub fn append(&mut self, chunk: MediaChunk) -> PipelineResult<()> {
        if self.frozen {
            return Err(PipelineError::BufferFrozen);
        }

        if chunk.is_empty() {
            debug!("Dropping zero-length chunk (sequence {})", chunk.sequence);
            return Ok(());
        }

        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
        Ok(())
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Stop accepting appends and move the stored chunks into an immutable
    /// snapshot. The buffer itself stays behind, empty and frozen, so that
    /// late append attempts fail instead of silently growing a dead buffer.
    pub fn freeze(&mut self) -> FrozenBuffer {
        self.frozen = true;
        let chunks = std::mem::take(&mut self.chunks);
        let total_bytes = std::mem::take(&mut self.total_bytes);

        debug!(
            "Chunk buffer frozen: {} chunks, {} bytes",
            chunks.len(),
            total_bytes
        );

        FrozenBuffer {
            chunks,
            total_bytes,
        }
    }
}

/// Read-only snapshot of a completed capture.
///
/// Exactly one downstream transform consumes a frozen buffer.
#[derive(Debug)]
pub struct FrozenBuffer {
    chunks: Vec<MediaChunk>,
    total_bytes: usize,
}

impl FrozenBuffer {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.total_bytes == 0
    }

    /// Join all chunks in stored order into one contiguous byte stream.
    ///
    /// This is the canonical raw-stream reconstruction used by both the
    /// audio and video transforms.
    pub fn concatenate(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.total_bytes);
        for chunk in &self.chunks {
            bytes.extend_from_slice(&chunk.data);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut buffer = ChunkBuffer::new();
        buffer.append(MediaChunk::new(0, vec![1, 2])).unwrap();
        buffer.append(MediaChunk::new(1, vec![3])).unwrap();
        buffer.append(MediaChunk::new(2, vec![4, 5, 6])).unwrap();

        assert_eq!(buffer.chunk_count(), 3);
        assert_eq!(buffer.total_bytes(), 6);

        let frozen = buffer.freeze();
        assert_eq!(frozen.concatenate(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_zero_length_chunks_are_dropped() {
        let mut buffer = ChunkBuffer::new();
        buffer.append(MediaChunk::new(0, vec![])).unwrap();
        buffer.append(MediaChunk::new(1, vec![7])).unwrap();

        assert_eq!(buffer.chunk_count(), 1);
        assert_eq!(buffer.total_bytes(), 1);
    }

    #[test]
    fn test_append_after_freeze_is_rejected() {
        let mut buffer = ChunkBuffer::new();
        buffer.append(MediaChunk::new(0, vec![1])).unwrap();
        let frozen = buffer.freeze();

        let result = buffer.append(MediaChunk::new(1, vec![2]));
        assert!(matches!(result, Err(PipelineError::BufferFrozen)));

        // The snapshot is unaffected by the failed append
        assert_eq!(frozen.concatenate(), vec![1]);
    }

    #[test]
    fn test_empty_buffer_concatenates_to_empty_stream() {
        let mut buffer = ChunkBuffer::new();
        let frozen = buffer.freeze();

        assert!(frozen.is_empty());
        assert!(frozen.concatenate().is_empty());
    }
}
