// Streaming MP3 transcoder
//
// Drives a LAME encoder across fixed-size sample windows. The emitted byte
// count depends only on the total sample count and the bitrate, not on how
// the samples are windowed, as long as every sample is fed exactly once and
// in order.

use mp3lame_encoder::{Birtate, Builder, FlushNoGap, MonoPcm};
use tracing::{info, warn};

use super::pcm;
use crate::config::AudioEncodeConfig;
use crate::error::{PipelineError, PipelineResult};

/// Converts a captured audio container into a mono, 16-bit, constant-bitrate
/// MP3 byte stream.
///
/// On any decode or encoder-init failure the transcoder falls back to the
/// original un-transcoded bytes rather than failing the capture; the
/// consumer only sees a byte sequence either way.
pub struct AudioTranscoder {
    config: AudioEncodeConfig,
}

impl AudioTranscoder {
    pub fn new(config: AudioEncodeConfig) -> Self {
        Self { config }
    }

    /// Transcode a raw capture stream, applying the fallback policy.
    ///
    /// Empty input produces empty output; failures return the input bytes
    /// unchanged.
    pub fn transcode(&self, raw: Vec<u8>) -> Vec<u8> {
        if raw.is_empty() {
            info!("Audio transcode invoked on empty capture, returning empty output");
            return raw;
        }

        match self.try_transcode(&raw) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Audio transcode failed ({}), falling back to raw capture bytes", e);
                raw
            }
        }
    }

    /// Transcode without the fallback policy, surfacing the error.
    pub fn try_transcode(&self, raw: &[u8]) -> PipelineResult<Vec<u8>> {
        let pcm = pcm::decode(raw.to_vec())?;
        let mono = pcm::downmix_to_mono(&pcm)?;
        let quantized = pcm::quantize(&mono);

        info!(
            "Encoding {} samples at {}Hz mono, {} kbps",
            quantized.len(),
            pcm.sample_rate,
            self.config.bitrate_kbps
        );

        self.encode_windows(&quantized, pcm.sample_rate)
    }

    /// Feed quantized samples to the encoder in fixed-size windows, then
    /// flush once.
    fn encode_windows(&self, samples: &[i16], sample_rate: u32) -> PipelineResult<Vec<u8>> {
        let mut encoder = self.build_encoder(sample_rate)?;
        let mut output: Vec<u8> = Vec::new();

        for window in samples.chunks(self.config.window_samples.max(1)) {
            // encode_to_vec writes into spare capacity only; LAME treats a
            // zero-sized output buffer as unbounded, so reserving is required
            output.reserve(mp3lame_encoder::max_required_buffer_size(window.len()));
            encoder
                .encode_to_vec(MonoPcm(window), &mut output)
                .map_err(|e| PipelineError::Encode(format!("encode window failed: {e}")))?;
        }

        // flush needs up to 7200 bytes of spare capacity for the final frame
        output.reserve(7200);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut output)
            .map_err(|e| PipelineError::Encode(format!("encoder flush failed: {e}")))?;

        info!("Audio transcode complete: {} MP3 bytes emitted", output.len());

        Ok(output)
    }

    fn build_encoder(&self, sample_rate: u32) -> PipelineResult<mp3lame_encoder::Encoder> {
        let mut builder = Builder::new()
            .ok_or_else(|| PipelineError::EncoderInit("failed to allocate LAME context".to_string()))?;

        builder
            .set_num_channels(1)
            .map_err(|e| PipelineError::EncoderInit(format!("set channels: {e}")))?;
        builder
            .set_sample_rate(sample_rate)
            .map_err(|e| PipelineError::EncoderInit(format!("set sample rate: {e}")))?;
        builder
            .set_brate(self.bitrate())
            .map_err(|e| PipelineError::EncoderInit(format!("set bitrate: {e}")))?;
        builder
            .set_quality(mp3lame_encoder::Quality::Best)
            .map_err(|e| PipelineError::EncoderInit(format!("set quality: {e}")))?;

        builder
            .build()
            .map_err(|e| PipelineError::EncoderInit(format!("build encoder: {e}")))
    }

    fn bitrate(&self) -> Birtate {
        match self.config.bitrate_kbps {
            96 => Birtate::Kbps96,
            112 => Birtate::Kbps112,
            128 => Birtate::Kbps128,
            160 => Birtate::Kbps160,
            192 => Birtate::Kbps192,
            256 => Birtate::Kbps256,
            320 => Birtate::Kbps320,
            other => {
                warn!("Unsupported bitrate {} kbps, using 128 kbps", other);
                Birtate::Kbps128
            }
        }
    }
}
