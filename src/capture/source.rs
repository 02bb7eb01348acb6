use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use super::chunk::MediaChunk;

/// Capture source trait
///
/// A capture source delivers raw media fragments over a bounded channel and
/// signals end-of-capture by closing its sender. The bytes are opaque to the
/// pipeline except that, concatenated, they must form a decodable audio or
/// video container.
///
/// Implementations:
/// - Device-backed sources live outside this crate (UI / platform layer)
/// - `ScriptedSource`: replays a fixed byte stream (tests, demo binary)
#[async_trait::async_trait]
pub trait CaptureSource: Send + Sync {
    /// Start delivering chunks
    ///
    /// Returns a channel receiver that will receive media chunks until the
    /// source closes it.
    async fn start(&mut self) -> Result<mpsc::Receiver<MediaChunk>>;

    /// Stop delivering chunks
    async fn stop(&mut self) -> Result<()>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// A capture source that replays a pre-assembled byte stream, split into
/// fixed-size fragments.
pub struct ScriptedSource {
    bytes: Vec<u8>,
    fragment_size: usize,
    channel_capacity: usize,
}

impl ScriptedSource {
    pub fn new(bytes: Vec<u8>, fragment_size: usize) -> Self {
        Self {
            bytes,
            fragment_size: fragment_size.max(1),
            channel_capacity: 100,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

#[async_trait::async_trait]
impl CaptureSource for ScriptedSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<MediaChunk>> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let bytes = std::mem::take(&mut self.bytes);
        let fragment_size = self.fragment_size;

        info!(
            "Scripted source starting: {} bytes in fragments of {}",
            bytes.len(),
            fragment_size
        );

        tokio::spawn(async move {
            for (sequence, fragment) in bytes.chunks(fragment_size).enumerate() {
                let chunk = MediaChunk::new(sequence as u64, fragment.to_vec());
                if tx.send(chunk).await.is_err() {
                    // Receiver dropped; the session stopped draining
                    break;
                }
            }
            // Sender drops here, closing the channel and signalling
            // end-of-capture to the session.
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
