pub mod pcm;
pub mod transcode;

pub use pcm::{decode, downmix_to_mono, quantize, PcmBuffer};
pub use transcode::AudioTranscoder;
