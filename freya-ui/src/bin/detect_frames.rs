//! detect-frames: run the emotion detection loop against a running gateway
//!
//! Replays a folder of JPEG frames as the camera, posts one frame per second
//! to the gateway's `/api/yolo` and prints each detection. Optionally creates
//! a playlist from the last detected emotion when done.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use freya_common::config::BaseUrl;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use freya_ui::capture::{DetectionController, FolderCamera, HttpDetectionBackend, CAPTURE_INTERVAL};

#[derive(Parser, Debug)]
#[command(name = "detect-frames")]
#[command(about = "Drive FreyaAI emotion detection from a folder of JPEG frames")]
#[command(version)]
struct Args {
    /// Gateway base URL
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    gateway: String,

    /// Folder of .jpg/.jpeg frames, replayed in name order
    #[arg(long)]
    frames: PathBuf,

    /// Value of the `session` cookie to send
    #[arg(long, env = "FREYA_SESSION_COOKIE")]
    session: Option<String>,

    /// Stop after this many seconds (runs until Ctrl+C when omitted)
    #[arg(long)]
    duration: Option<u64>,

    /// Create a playlist from the last detected emotion before exiting
    #[arg(long)]
    create_playlist: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freya_ui=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let gateway = BaseUrl::parse(&args.gateway).context("Invalid gateway URL")?;
    let mut backend = HttpDetectionBackend::new(gateway, Duration::from_secs(args.timeout))
        .context("Failed to build HTTP client")?;
    if let Some(session) = &args.session {
        backend = backend.with_session(session.clone());
    }

    let mut controller = DetectionController::new(FolderCamera::new(args.frames.clone()), backend);
    controller
        .start_camera()
        .with_context(|| format!("Failed to open frames in {}", args.frames.display()))?;
    controller.start_detection()?;

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut report = tokio::time::interval(CAPTURE_INTERVAL);
    let mut last_printed = None;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping");
                break;
            }
            _ = report.tick() => {
                let snapshot = controller.snapshot();
                if last_printed.as_ref() != Some(&snapshot) {
                    match (&snapshot.emotion, &snapshot.error) {
                        (_, Some(error)) => println!("error: {error}"),
                        (Some(emotion), None) => {
                            println!("{emotion} ({:.2}%)", snapshot.confidence * 100.0)
                        }
                        (None, None) => {}
                    }
                    last_printed = Some(snapshot);
                }
            }
        }
    }

    controller.stop_detection();

    if args.create_playlist {
        let playlist = controller
            .create_playlist()
            .await
            .context("Playlist creation failed")?;
        println!("{}", playlist.embedded_playlist_code);
        for track in &playlist.top_tracks_embedded {
            println!("{track}");
        }
    }

    controller.stop_camera();
    Ok(())
}
