// Frame-stream container
//
// The capture source delivers video as a simple uncompressed frame stream:
// a fixed header (magic, dimensions, frame rate, frame count) followed by
// densely packed RGBA frames. The same format is written back out after
// transformation, so input and output containers always match.

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Container magic, "reel frame stream" version 1
pub const MAGIC: [u8; 4] = *b"RFS1";

/// Header size in bytes: magic + width + height + fps_num + fps_den + count
const HEADER_LEN: usize = 4 + 4 * 5;

/// Bytes per pixel (RGBA)
pub const PIXEL_BYTES: usize = 4;

/// One decoded video frame: a width x height RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA pixel data, width * height * 4 bytes
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Reflect the pixel buffer across its vertical center axis.
    ///
    /// Equivalent to reversing each row of pixels. Applying the mirror
    /// twice returns the original frame.
    pub fn mirrored(&self) -> VideoFrame {
        let stride = self.width as usize * PIXEL_BYTES;
        let mut pixels = Vec::with_capacity(self.pixels.len());

        for row in self.pixels.chunks_exact(stride) {
            for pixel in row.chunks_exact(PIXEL_BYTES).rev() {
                pixels.extend_from_slice(pixel);
            }
        }

        VideoFrame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// A decoded frame-stream container: header fields plus per-instant frame
/// access.
#[derive(Debug, Clone)]
pub struct VideoStream {
    pub width: u32,
    pub height: u32,
    /// Frame rate as a rational (frames per second = fps_num / fps_den)
    pub fps_num: u32,
    pub fps_den: u32,
    frames: Vec<VideoFrame>,
}

impl VideoStream {
    pub fn new(width: u32, height: u32, fps_num: u32, fps_den: u32) -> Self {
        Self {
            width,
            height,
            fps_num,
            fps_den,
            frames: Vec::new(),
        }
    }

    /// Parse a byte stream into a frame stream.
    ///
    /// Rejects truncated headers, bad magic, zero dimensions and payloads
    /// whose length does not match the declared frame count.
    pub fn parse(bytes: &[u8]) -> PipelineResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(PipelineError::Container(format!(
                "stream too short for header: {} bytes",
                bytes.len()
            )));
        }

        if bytes[0..4] != MAGIC {
            return Err(PipelineError::Container("bad magic".to_string()));
        }

        let width = read_u32(bytes, 4);
        let height = read_u32(bytes, 8);
        let fps_num = read_u32(bytes, 12);
        let fps_den = read_u32(bytes, 16);
        let frame_count = read_u32(bytes, 20) as usize;

        if frame_count > 0 && (width == 0 || height == 0) {
            return Err(PipelineError::Container(format!(
                "zero dimensions with {frame_count} frames"
            )));
        }

        let frame_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(PIXEL_BYTES))
            .ok_or_else(|| {
                PipelineError::Container("declared frame size overflows".to_string())
            })?;
        let expected = frame_count
            .checked_mul(frame_len)
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| {
                PipelineError::Container("declared payload size overflows".to_string())
            })?;
        if bytes.len() != expected {
            return Err(PipelineError::Container(format!(
                "payload length mismatch: expected {} bytes, got {}",
                expected,
                bytes.len()
            )));
        }

        let mut frames = Vec::with_capacity(frame_count);
        for i in 0..frame_count {
            let start = HEADER_LEN + i * frame_len;
            frames.push(VideoFrame::new(
                width,
                height,
                bytes[start..start + frame_len].to_vec(),
            ));
        }

        debug!(
            "Parsed frame stream: {}x{}, {}/{} fps, {} frames",
            width, height, fps_num, fps_den, frame_count
        );

        Ok(Self {
            width,
            height,
            fps_num,
            fps_den,
            frames,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total duration in seconds, 0.0 when the frame rate is unusable.
    pub fn duration_seconds(&self) -> f64 {
        if self.fps_num == 0 || self.fps_den == 0 {
            return 0.0;
        }
        self.frames.len() as f64 * self.fps_den as f64 / self.fps_num as f64
    }

    /// The frame covering a given time position, if any.
    pub fn frame_at(&self, seconds: f64) -> Option<&VideoFrame> {
        if self.frames.is_empty() || self.fps_den == 0 {
            return None;
        }
        let fps = self.fps_num as f64 / self.fps_den as f64;
        let index = (seconds * fps).floor() as usize;
        // Float stepping can land exactly on the tail boundary
        self.frames.get(index.min(self.frames.len() - 1))
    }

    pub fn push_frame(&mut self, frame: VideoFrame) {
        self.frames.push(frame);
    }

    /// Serialize back into container bytes, same format as `parse` accepts.
    pub fn to_bytes(&self) -> Vec<u8> {
        let frame_len = self.width as usize * self.height as usize * PIXEL_BYTES;
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.frames.len() * frame_len);

        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.extend_from_slice(&self.fps_num.to_le_bytes());
        bytes.extend_from_slice(&self.fps_den.to_le_bytes());
        bytes.extend_from_slice(&(self.frames.len() as u32).to_le_bytes());

        for frame in &self.frames {
            bytes.extend_from_slice(&frame.pixels);
        }

        bytes
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
