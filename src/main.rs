use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use receptionist_live::config::AgentConfig;
use receptionist_live::core::realtime::create_realtime_connector;
use receptionist_live::core::session::{ChannelObserver, SessionEvent, SessionManager};
use receptionist_live::core::tools::{
    BookingSink, FanoutBookingSink, LoggingBookingSink, ToolDispatcher, WebhookBookingSink,
    tool_declarations,
};
use receptionist_live::core::{AudioBackend, ConnectionState};

/// Receptionist Live - voice front desk over Gemini Live
#[derive(Parser, Debug)]
#[command(name = "receptionist-live")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run (defaults to `run`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a voice session on the default audio devices
    Run,

    /// Print the tool declarations sent to the model as JSON
    Tools,

    /// List available input devices
    #[cfg(feature = "device-audio")]
    Devices,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Must happen before the first TLS handshake
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Tools => {
            let json = serde_json::to_string_pretty(&tool_declarations())?;
            println!("{json}");
            Ok(())
        }
        #[cfg(feature = "device-audio")]
        Commands::Devices => {
            let devices = receptionist_live::core::audio::DeviceBackend::list_input_devices()?;
            for name in devices {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Run => {
            let config = if let Some(config_path) = cli.config {
                println!("Loading configuration from {}", config_path.display());
                AgentConfig::from_file(&config_path)?
            } else {
                AgentConfig::from_env()?
            };
            run(config).await
        }
    }
}

#[cfg(feature = "device-audio")]
fn audio_backend() -> anyhow::Result<Arc<dyn AudioBackend>> {
    Ok(Arc::new(receptionist_live::core::audio::DeviceBackend::new()))
}

#[cfg(not(feature = "device-audio"))]
fn audio_backend() -> anyhow::Result<Arc<dyn AudioBackend>> {
    anyhow::bail!("device audio unavailable: rebuild with `--features device-audio`")
}

async fn run(config: AgentConfig) -> anyhow::Result<()> {
    let backend = audio_backend()?;
    let session_config = config.session_config()?;
    let connector = create_realtime_connector("gemini", config.gemini_config())?;

    let (observer, mut events) = ChannelObserver::new();
    let mut sink = FanoutBookingSink::new(vec![
        Arc::new(LoggingBookingSink) as Arc<dyn BookingSink>,
        Arc::new(observer.clone()),
    ]);
    if let Some(url) = config.booking_webhook() {
        info!("Forwarding bookings to {}", url);
        sink.push(Arc::new(WebhookBookingSink::new(url)?));
    }

    let manager = SessionManager::new(
        session_config,
        backend,
        connector,
        Arc::new(observer),
        ToolDispatcher::new(Arc::new(sink)),
    );

    info!(
        model = %manager.config().setup.model,
        voice = %manager.config().setup.voice,
        "Starting receptionist session"
    );

    tokio::select! {
        result = manager.connect() => result?,
        _ = tokio::signal::ctrl_c() => {
            manager.disconnect();
            return Ok(());
        }
    }

    let outcome = tokio::select! {
        outcome = watch_session(&mut events) => outcome,
        _ = tokio::signal::ctrl_c() => {
            println!("\nHanging up");
            Ok(())
        }
    };
    manager.disconnect();
    outcome
}

/// Print session events until the session ends.
async fn watch_session(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> anyhow::Result<()> {
    let mut last_error = None;
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::State(state) => {
                println!("[{state}]");
                match state {
                    ConnectionState::Disconnected => return Ok(()),
                    ConnectionState::Error => {
                        return Err(anyhow!(
                            last_error.unwrap_or_else(|| "session failed".to_string())
                        ));
                    }
                    _ => {}
                }
            }
            SessionEvent::Error(message) => last_error = message,
            SessionEvent::Booking(booking) => {
                println!(
                    "Booked: {} ({}), {} on {} at {}",
                    booking.name,
                    booking.age,
                    booking.visit_type,
                    booking.appointment_date,
                    booking.appointment_time
                );
            }
            SessionEvent::Volume(volume) => {
                tracing::trace!(volume, "Input level");
            }
        }
    }
    Ok(())
}
