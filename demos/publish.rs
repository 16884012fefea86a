// Publish a silent AAC stream
//
// Usage:
//   cargo run --example publish -- rtmp://localhost/live/mystream [seconds]

use std::env;
use std::time::Duration;
use log::{error, info};
use rtmp::{
    AudioFormat, AudioFrame, ClientConfig, PublishSession, Result, StreamMetadata, AAC_OBJECT_TYPE_LC,
};

/// One silent AAC-LC stereo frame
const SILENT_FRAME: [u8; 6] = [0x21, 0x10, 0x04, 0x60, 0x8C, 0x1C];

/// 1024 samples at 44.1 kHz
const FRAME_DURATION: Duration = Duration::from_micros(23_220);

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <rtmp-url> [seconds]", args[0]);
        eprintln!("Example: {} rtmp://localhost/live/mystream 30", args[0]);
        std::process::exit(1);
    }
    let url = &args[1];
    let seconds: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(30);

    let config = ClientConfig::builder()
        .chunk_size(4096)
        .build()?;
    let format = AudioFormat {
        sample_rate: 44100,
        channels: 2,
        object_type: AAC_OBJECT_TYPE_LC,
    };

    let mut session = PublishSession::new(config);
    let mut metadata = StreamMetadata::for_audio(&format, 128.0);
    metadata.encoder = Some("rtmp-publish demo".to_string());
    session.set_metadata(metadata).await?;

    info!("Connecting to {}", url);
    session.connect(url).await?;
    if let Err(e) = session.wait_ready().await {
        error!("Could not start publishing: {}", e);
        return Err(e);
    }
    info!("Publishing for {}s", seconds);

    let frames = seconds * 1_000_000 / FRAME_DURATION.as_micros() as u64;
    let mut ticker = tokio::time::interval(FRAME_DURATION);
    for n in 0..frames {
        ticker.tick().await;
        let frame = AudioFrame {
            data: SILENT_FRAME.to_vec(),
            pts: FRAME_DURATION * n as u32,
            format: Some(format),
        };
        session.send_audio_frame(frame).await?;
    }

    info!("Stopping");
    session.stop().await?;
    Ok(())
}
