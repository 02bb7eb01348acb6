use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of media a session captures, and therefore which transform
/// consumes its frozen buffer on stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    Audio,
    Video,
}

impl CaptureKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            CaptureKind::Audio => "audio/mp3",
            CaptureKind::Video => "video/webm",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            CaptureKind::Audio => "mp3",
            CaptureKind::Video => "webm",
        }
    }
}

/// A finalized, downloadable media artifact.
///
/// The bytes are opaque to consumers; for audio they are either the
/// transcoded stream or, after a recovered transcode failure, the original
/// capture bytes.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: CaptureKind,
    /// Final artifact bytes
    pub bytes: Vec<u8>,
    /// Suggested download file name
    pub file_name: String,
    /// Suggested MIME type
    pub mime_type: String,
}

impl Artifact {
    pub fn new(kind: CaptureKind, session_id: Uuid, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            bytes,
            file_name: format!("capture-{}.{}", session_id, kind.file_extension()),
            mime_type: kind.mime_type().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
