// Time-stepped video mirror transform
//
// Steps through a decoded frame stream at a fixed time increment, mirrors
// each sampled frame horizontally, and reassembles the result in the same
// container format as the input.

use tracing::info;

use super::container::VideoStream;
use crate::config::VideoTransformConfig;
use crate::error::PipelineResult;

/// Stepping state for one transform invocation.
///
/// Lives only for the duration of the frame loop; the loop is plain bounded
/// iteration with an explicit termination condition, so arbitrarily long
/// sources cannot exhaust the stack.
#[derive(Debug)]
struct FrameStepper {
    position: f64,
    duration: f64,
    increment: f64,
}

impl FrameStepper {
    fn new(duration: f64, increment: f64) -> Self {
        Self {
            position: 0.0,
            duration,
            increment,
        }
    }

    fn done(&self) -> bool {
        self.position >= self.duration
    }

    fn advance(&mut self) {
        self.position += self.increment;
    }
}

/// Transforms a captured video stream into its horizontally mirrored
/// counterpart.
///
/// Unlike the audio transcoder there is no fallback: a stream that cannot
/// be parsed fails artifact production outright.
pub struct VideoFrameTransformer {
    config: VideoTransformConfig,
}

impl VideoFrameTransformer {
    pub fn new(config: VideoTransformConfig) -> Self {
        Self { config }
    }

    /// Mirror a raw capture stream frame-by-frame.
    ///
    /// Empty input yields empty output. A source with zero or unusable
    /// duration yields a frame-less stream in the same container format;
    /// neither case is an error.
    pub fn transform(&self, raw: Vec<u8>) -> PipelineResult<Vec<u8>> {
        if raw.is_empty() {
            info!("Video transform invoked on empty capture, returning empty output");
            return Ok(raw);
        }

        let source = VideoStream::parse(&raw)?;
        let duration = source.duration_seconds();
        let frame_rate = self.config.frame_rate.max(1);

        let mut output = VideoStream::new(source.width, source.height, frame_rate, 1);

        let mut stepper = FrameStepper::new(duration, 1.0 / frame_rate as f64);
        while !stepper.done() {
            if let Some(frame) = source.frame_at(stepper.position) {
                output.push_frame(frame.mirrored());
            }
            stepper.advance();
        }

        info!(
            "Video transform complete: {:.2}s source sampled into {} mirrored frames",
            duration,
            output.frame_count()
        );

        Ok(output.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::container::{VideoFrame, PIXEL_BYTES};

    fn numbered_stream(frame_count: u8, fps: u32) -> VideoStream {
        let mut stream = VideoStream::new(2, 1, fps, 1);
        for i in 0..frame_count {
            stream.push_frame(VideoFrame::new(2, 1, vec![i; 2 * PIXEL_BYTES]));
        }
        stream
    }

    #[test]
    fn test_transform_samples_at_configured_rate() {
        // 2 seconds of source at 10 fps, sampled at 30 fps
        let source = numbered_stream(20, 10);
        let transformer = VideoFrameTransformer::new(VideoTransformConfig::default());

        let output = transformer.transform(source.to_bytes()).unwrap();
        let parsed = VideoStream::parse(&output).unwrap();

        assert_eq!(parsed.frame_count(), 60);
        assert_eq!(parsed.fps_num, 30);
    }

    #[test]
    fn test_transform_mirrors_every_sampled_frame() {
        let mut source = VideoStream::new(2, 1, 30, 1);
        // Two pixels: left is 1s, right is 2s
        let mut pixels = vec![1; PIXEL_BYTES];
        pixels.extend_from_slice(&[2; PIXEL_BYTES]);
        source.push_frame(VideoFrame::new(2, 1, pixels));

        let transformer = VideoFrameTransformer::new(VideoTransformConfig::default());
        let parsed = VideoStream::parse(&transformer.transform(source.to_bytes()).unwrap()).unwrap();

        let frame = parsed.frame_at(0.0).unwrap();
        assert_eq!(&frame.pixels[..PIXEL_BYTES], &[2; PIXEL_BYTES]);
        assert_eq!(&frame.pixels[PIXEL_BYTES..], &[1; PIXEL_BYTES]);
    }

    #[test]
    fn test_zero_duration_source_is_not_an_error() {
        let source = VideoStream::new(4, 4, 30, 1);
        let transformer = VideoFrameTransformer::new(VideoTransformConfig::default());

        let output = transformer.transform(source.to_bytes()).unwrap();
        let parsed = VideoStream::parse(&output).unwrap();
        assert_eq!(parsed.frame_count(), 0);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let transformer = VideoFrameTransformer::new(VideoTransformConfig::default());
        assert!(transformer.transform(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_stream_fails_loudly() {
        let transformer = VideoFrameTransformer::new(VideoTransformConfig::default());
        assert!(transformer.transform(vec![0; 64]).is_err());
    }
}
