// PCM extraction and downmix
//
// Decodes an assembled capture byte stream into normalized f32 samples
// using symphonia, and reduces multi-channel audio to mono by per-sample
// averaging.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

/// Normalized audio samples extracted from a capture stream.
///
/// Samples are interleaved f32 in [-1.0, 1.0], at the container's native
/// sample rate and channel count.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    /// Interleaved samples
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

impl PcmBuffer {
    /// Number of audio frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frame_count() as f64 / self.sample_rate as f64
        }
    }
}

/// Decode an encoded audio container into normalized samples.
///
/// The container format is probed from the bytes themselves (WAV, MP3, OGG,
/// FLAC, M4A, ...). Any probe or decode failure maps to
/// [`PipelineError::Decode`].
pub fn decode(bytes: Vec<u8>) -> PipelineResult<PcmBuffer> {
    let byte_count = bytes.len();
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PipelineError::Decode(format!("container probe failed: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PipelineError::Decode("no decodable audio track".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PipelineError::Decode(format!("no decoder for track: {e}")))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // end of stream
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(PipelineError::Decode(format!("packet read failed: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_buf.is_none() {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u16;
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }

                if let Some(buf) = &mut sample_buf {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // A corrupt packet does not abort the stream
                debug!("Skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(PipelineError::Decode(format!("decode failed: {e}"))),
        }
    }

    if sample_rate == 0 || channels == 0 {
        return Err(PipelineError::Decode(
            "stream has no sample rate or channel layout".to_string(),
        ));
    }

    let pcm = PcmBuffer {
        samples,
        sample_rate,
        channels,
    };

    info!(
        "Decoded capture stream: {} bytes -> {:.2}s, {}Hz, {} channels",
        byte_count,
        pcm.duration_seconds(),
        pcm.sample_rate,
        pcm.channels
    );

    Ok(pcm)
}

/// Reduce a decoded buffer to a single channel.
///
/// Stereo is downmixed by averaging left and right per sample; mono passes
/// through unchanged. Any other channel count is out of scope and treated
/// as a decode failure.
pub fn downmix_to_mono(pcm: &PcmBuffer) -> PipelineResult<Vec<f32>> {
    match pcm.channels {
        1 => Ok(pcm.samples.clone()),
        2 => {
            let mut mono = Vec::with_capacity(pcm.samples.len() / 2);
            for pair in pcm.samples.chunks_exact(2) {
                mono.push((pair[0] + pair[1]) / 2.0);
            }
            Ok(mono)
        }
        n => Err(PipelineError::Decode(format!(
            "unsupported channel count: {n}"
        ))),
    }
}

/// Quantize normalized f32 samples to 16-bit signed integers.
///
/// Each sample is clipped to [-1.0, 1.0], then scaled asymmetrically:
/// negative values by 32768 and non-negative values by 32767, so that the
/// endpoints map exactly to i16::MIN and i16::MAX. No dithering.
pub fn quantize(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            let clipped = s.clamp(-1.0, 1.0);
            let scaled = if clipped < 0.0 {
                clipped * 32768.0
            } else {
                clipped * 32767.0
            };
            scaled.round() as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_endpoints() {
        let quantized = quantize(&[1.0, -1.0, 0.0]);
        assert_eq!(quantized, vec![32767, -32768, 0]);
    }

    #[test]
    fn test_quantize_clips_out_of_range_samples() {
        let quantized = quantize(&[2.5, -3.0]);
        assert_eq!(quantized, vec![32767, -32768]);
    }

    #[test]
    fn test_quantize_rounds_midscale_values() {
        let quantized = quantize(&[0.5, -0.5]);
        assert_eq!(quantized[0], (0.5f32 * 32767.0).round() as i16);
        assert_eq!(quantized[1], (-0.5f32 * 32768.0).round() as i16);
    }

    #[test]
    fn test_downmix_stereo_averages_channels() {
        // L = [1.0, -1.0], R = [1.0, 1.0] interleaved
        let pcm = PcmBuffer {
            samples: vec![1.0, 1.0, -1.0, 1.0],
            sample_rate: 44100,
            channels: 2,
        };

        let mono = downmix_to_mono(&pcm).unwrap();
        assert_eq!(mono, vec![1.0, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let pcm = PcmBuffer {
            samples: vec![0.25, -0.5],
            sample_rate: 44100,
            channels: 1,
        };

        let mono = downmix_to_mono(&pcm).unwrap();
        assert_eq!(mono, pcm.samples);
    }

    #[test]
    fn test_downmix_rejects_unsupported_layouts() {
        let pcm = PcmBuffer {
            samples: vec![0.0; 6],
            sample_rate: 44100,
            channels: 6,
        };

        assert!(matches!(
            downmix_to_mono(&pcm),
            Err(PipelineError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage_bytes() {
        let result = decode(vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02]);
        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }
}
