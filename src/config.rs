use anyhow::Result;
use serde::Deserialize;

/// Pipeline-wide configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub audio: AudioEncodeConfig,
    #[serde(default)]
    pub video: VideoTransformConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Audio encoder settings
#[derive(Debug, Clone, Deserialize)]
pub struct AudioEncodeConfig {
    /// Constant output bitrate in kbps
    #[serde(default = "default_bitrate_kbps")]
    pub bitrate_kbps: u32,
    /// Samples fed to the encoder per window (one MP3 granule pair)
    #[serde(default = "default_window_samples")]
    pub window_samples: usize,
}

impl Default for AudioEncodeConfig {
    fn default() -> Self {
        Self {
            bitrate_kbps: 128,
            window_samples: 1152,
        }
    }
}

/// Video transform settings
#[derive(Debug, Clone, Deserialize)]
pub struct VideoTransformConfig {
    /// Frames sampled per second of source time
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

impl Default for VideoTransformConfig {
    fn default() -> Self {
        Self { frame_rate: 30 }
    }
}

/// Chunk delivery settings
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Bounded capacity of the chunk delivery channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
        }
    }
}

fn default_bitrate_kbps() -> u32 {
    128
}

fn default_window_samples() -> usize {
    1152
}

fn default_frame_rate() -> u32 {
    30
}

fn default_channel_capacity() -> usize {
    100
}

impl PipelineConfig {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_contract() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.audio.bitrate_kbps, 128);
        assert_eq!(cfg.audio.window_samples, 1152);
        assert_eq!(cfg.video.frame_rate, 30);
        assert_eq!(cfg.capture.channel_capacity, 100);
    }

    #[test]
    fn test_load_applies_file_overrides_over_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pipeline.toml");
        std::fs::write(
            &path,
            "[audio]\nbitrate_kbps = 192\n\n[video]\nframe_rate = 24\n",
        )?;

        let cfg = PipelineConfig::load(path.to_str().expect("utf-8 temp path"))?;
        assert_eq!(cfg.audio.bitrate_kbps, 192);
        assert_eq!(cfg.video.frame_rate, 24);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.audio.window_samples, 1152);
        assert_eq!(cfg.capture.channel_capacity, 100);

        Ok(())
    }
}
