use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use error::AppError;
use lectern_engine::factory::{SourceShape, detect_source};
use lectern_engine::media::StaticCapabilities;
use lectern_engine::quality::{FixedNetworkHint, UnknownNetwork};
use lectern_engine::{
    EngineConfig, HttpProgressService, NetworkQualityHint, PlaybackConfig, PlaybackEvent,
    PlaybackSessionManager, PlayerError, ProgressService, ProviderKind, SessionEvent,
};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod error;
mod progress;
mod simulator;

use cli::CliArgs;
use progress::LogProgressService;
use simulator::{SimulatedClock, SimulatedSurface};

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    if !(args.speed.is_finite() && args.speed > 0.0) {
        return Err(AppError::InvalidInput(format!(
            "Speed must be a positive number, got {}",
            args.speed
        )));
    }
    if !(args.duration.is_finite() && args.duration > 0.0) {
        return Err(AppError::InvalidInput(format!(
            "Duration must be a positive number, got {}",
            args.duration
        )));
    }

    let engine_config = EngineConfig::builder()
        .with_timeout(Duration::from_secs(args.timeout))
        .build();
    info!(
        "HTTP timeout configuration: overall={}s, connect={}s",
        engine_config.http.timeout.as_secs(),
        engine_config.http.connect_timeout.as_secs()
    );

    let progress: Arc<dyn ProgressService> = match &args.progress_endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "Persisting progress over HTTP");
            Arc::new(HttpProgressService::from_config(endpoint, &engine_config.http)?)
        }
        None => Arc::new(LogProgressService::new()),
    };

    let network: Arc<dyn NetworkQualityHint> = match &args.connection {
        Some(connection) => Arc::new(FixedNetworkHint::new(connection.as_str())),
        None => Arc::new(UnknownNetwork),
    };

    let manager = PlaybackSessionManager::builder(progress)
        .engine_config(engine_config)
        .capabilities(Arc::new(StaticCapabilities {
            media_source: !args.no_mse,
        }))
        .network_hint(network)
        .build()?;

    info!(
        adaptive_streaming = manager.is_adaptive_streaming_supported(),
        quality = %manager.recommended_quality(),
        "Playback capabilities"
    );

    let provider = args.provider.unwrap_or_else(|| match detect_source(&args.url) {
        SourceShape::Manifest => ProviderKind::LibraryHls,
        SourceShape::File => ProviderKind::PlainFile,
    });
    // The packaged component renders its own controls, so nothing but
    // autoplay can start it from here.
    let autoplay = provider == ProviderKind::PackagedComponent;

    let mut config = PlaybackConfig::builder(args.url.as_str(), provider).autoplay(autoplay);
    if let Some(start) = args.start_time {
        config = config.start_time(start);
    }
    if let Some(playback_id) = &args.playback_id {
        config = config.playback_id(playback_id.as_str());
    }
    let config = config.build();

    let clock = SimulatedClock {
        speed: args.speed,
        duration: args.duration,
        ..SimulatedClock::default()
    };
    let surface = SimulatedSurface::new(clock, args.native_hls);

    manager.on_error(|e| warn!(error = %e, "Playback failed"));

    let mut events = manager
        .initialize(config, surface, args.lesson.as_str())
        .await?;
    info!(lesson_id = %events.lesson_id(), provider = %provider, "Lesson loaded");

    let outcome = play_until_done(&manager, &mut events).await;

    manager.teardown().await;
    info!("Playback session closed");
    outcome
}

async fn play_until_done(
    manager: &PlaybackSessionManager,
    events: &mut lectern_engine::SessionEvents,
) -> Result<(), AppError> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let event = tokio::select! {
            signal = &mut ctrl_c => {
                signal?;
                info!("Interrupted, stopping playback");
                return Ok(());
            }
            event = events.recv() => event,
        };

        match event {
            Some(Ok(SessionEvent::Ready)) => {
                info!(state = %manager.state(), "Session ready");
                match manager.play() {
                    Ok(()) => {}
                    Err(PlayerError::NoController) => {
                        debug!("Transport is owned by the packaged component");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Some(Ok(SessionEvent::Playback(PlaybackEvent::TimeUpdate {
                current_time,
                duration,
            }))) => {
                debug!(current_time, duration, "Time update");
            }
            Some(Ok(SessionEvent::Playback(PlaybackEvent::Ended))) => {
                info!("Lesson video finished");
                return Ok(());
            }
            Some(Ok(SessionEvent::Playback(event))) => {
                info!(?event, state = %manager.state(), "Playback event");
            }
            Some(Err(e)) => return Err(e.into()),
            None => {
                info!("Session ended");
                return Ok(());
            }
        }
    }
}
