use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_assistant::{
    create_router, AppState, CommandSink, CommandSpeech, Config, HttpSynthesizer, LocalSpeech,
    NatsSpeechCapture, OpenRouterModel, Role, ServiceInfo, SessionConfig, SessionController,
    SessionHandle, SessionServices, SpeechSynthesizer, SynthesisFallbackCoordinator,
};

#[derive(Parser)]
#[command(name = "voice-assistant", version, about = "Voice-driven chat assistant")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/voice-assistant")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the session behind the HTTP control API
    Serve,
    /// Drive the session from the terminal: Enter starts and stops recording
    Talk,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Voice Assistant v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {} ({})", cfg.service.name, cfg.service.environment);

    let session_config = SessionConfig::from_config(&cfg);
    let services = build_services(&cfg, &session_config).await?;
    let service_info = ServiceInfo {
        name: cfg.service.name.clone(),
        environment: cfg.service.environment.clone(),
        synthesis_primary: services.synthesis.has_primary(),
        synthesis_fallback: services.synthesis.has_fallback(),
    };

    let (session, session_task) = SessionController::spawn(session_config, services);

    match cli.command {
        Command::Serve => serve(&cfg, session.clone(), service_info).await?,
        Command::Talk => talk(session.clone()).await?,
    }

    // Already closed if the loop exited on its own
    let _ = session.shutdown();
    session_task.await.context("Session task panicked")?;

    Ok(())
}

async fn build_services(cfg: &Config, session: &SessionConfig) -> Result<SessionServices> {
    let capture = NatsSpeechCapture::connect(&cfg.capture, session.session_id.clone())
        .await
        .context("Failed to connect speech capture")?;

    let model = OpenRouterModel::from_config(&cfg.model)?;

    let primary = if cfg.synthesis.enabled {
        info!("Primary synthesis: {}", cfg.synthesis.endpoint);
        Some(Arc::new(HttpSynthesizer::new(&cfg.synthesis)?) as Arc<dyn SpeechSynthesizer>)
    } else {
        None
    };

    let local = if cfg.fallback.enabled {
        info!("Fallback synthesis: {}", cfg.fallback.program);
        Some(Arc::new(CommandSpeech::new(&cfg.fallback)) as Arc<dyn LocalSpeech>)
    } else {
        None
    };

    Ok(SessionServices {
        capture: Arc::new(capture),
        model: Arc::new(model),
        synthesis: SynthesisFallbackCoordinator::new(primary, local),
        sink: Arc::new(CommandSink::new(&cfg.playback)),
    })
}

async fn serve(cfg: &Config, session: SessionHandle, service_info: ServiceInfo) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP API listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let router = create_router(AppState::new(session, service_info));
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn talk(session: SessionHandle) -> Result<()> {
    let mut status = session.subscribe();

    let printer = tokio::spawn(async move {
        let mut last_state = None;
        let mut printed = HashSet::new();

        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();

            if last_state != Some(current.state) {
                println!("[{}]", current.state.as_str());
                last_state = Some(current.state);
            }

            for message in current.messages.iter().filter(|m| !m.pending) {
                if printed.insert(message.id) {
                    let speaker = match message.role {
                        Role::User => "You said",
                        Role::Assistant => "AI says",
                    };
                    println!("{}: {}", speaker, message.content);
                }
            }

            if let Some(error) = &current.last_error {
                println!("(error: {})", error);
            }
        }
    });

    println!("Press Enter to start or stop speaking, q to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "q" {
            break;
        }
        session.toggle_recording()?;
    }

    session.shutdown()?;
    printer.await.context("Status printer panicked")?;
    Ok(())
}
