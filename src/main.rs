use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::f32::consts::TAU;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::info;

use reelkit::video::container::{VideoFrame, VideoStream};
use reelkit::{CaptureKind, CaptureSession, PipelineConfig, ScriptedSource};

/// Run a capture session against a synthetic source and write the produced
/// artifact to disk.
#[derive(Parser)]
#[command(name = "reelkit", version)]
struct Args {
    /// Capture kind to simulate
    #[arg(long, value_enum, default_value_t = Mode::Audio)]
    mode: Mode,

    /// Optional pipeline config file
    #[arg(long)]
    config: Option<String>,

    /// Where to write the artifact (defaults to the suggested file name)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Audio,
    Video,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path).context("Failed to load config")?,
        None => PipelineConfig::default(),
    };

    let (kind, bytes) = match args.mode {
        Mode::Audio => (CaptureKind::Audio, tone_wav(440.0, 2.0)?),
        Mode::Video => (CaptureKind::Video, gradient_stream(64, 36, 60)),
    };

    info!("Simulating {:?} capture: {} source bytes", kind, bytes.len());

    let mut source =
        ScriptedSource::new(bytes, 4096).with_channel_capacity(config.capture.channel_capacity);
    let mut session = CaptureSession::new(kind, config);

    session.start_source(&mut source).await?;

    // Give the scripted source time to deliver everything
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let stats = session.stats().await;
    info!(
        "Session state: {:?}, {} chunks, {} bytes buffered",
        stats.state, stats.chunk_count, stats.total_bytes
    );

    let artifact = session.stop().await?;
    info!(
        "Artifact produced: {} ({}) - {} bytes",
        artifact.file_name,
        artifact.mime_type,
        artifact.bytes.len()
    );

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&artifact.file_name));
    std::fs::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write artifact to {}", path.display()))?;

    info!("Artifact written to {}", path.display());

    Ok(())
}

/// A mono 44.1 kHz sine tone, encoded as WAV in memory
fn tone_wav(frequency: f32, seconds: f32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        let sample_count = (seconds * spec.sample_rate as f32) as u32;
        for n in 0..sample_count {
            let t = n as f32 / spec.sample_rate as f32;
            let sample = (t * frequency * TAU).sin() * 0.5;
            writer.write_sample((sample * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// A frame stream of sliding horizontal gradients
fn gradient_stream(width: u32, height: u32, frame_count: u32) -> Vec<u8> {
    let mut stream = VideoStream::new(width, height, 30, 1);

    for f in 0..frame_count {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let shade = ((x + f) % 256) as u8;
                pixels.extend_from_slice(&[shade, shade / 2, (y % 256) as u8, 255]);
            }
        }
        stream.push_frame(VideoFrame::new(width, height, pixels));
    }

    stream.to_bytes()
}
