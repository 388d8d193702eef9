use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use vancix_core::core::audio::playback::{AudioSink, NullSink};
use vancix_core::core::audio::wav::{WavCapture, WavSink};
use vancix_core::core::realtime::{GeminiConfig, GeminiLive, SessionSetup};
use vancix_core::core::session::{Session, SessionState};
use vancix_core::core::tools::{
    function_declarations, LoggingActions, MockContacts, ScheduleStore, ToolDispatcher,
    SYSTEM_INSTRUCTION,
};
use vancix_core::AppConfig;

/// Vancix voice core - realtime voice assistant session runner
#[derive(Parser, Debug)]
#[command(name = "vancix-core")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 16 kHz mono 16-bit WAV file streamed as microphone input
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: PathBuf,

    /// WAV file the model's speech is written to (discarded if omitted)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Override the configured voice
    #[arg(long = "voice")]
    voice: Option<String>,

    /// Override the configured model
    #[arg(long = "model")]
    model: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tool declarations sent to the model
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Some(Commands::Tools) = cli.command {
        println!("{}", serde_json::to_string_pretty(&function_declarations())?);
        return Ok(());
    }

    let mut config = AppConfig::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(voice) = cli.voice {
        config.voice = voice;
    }

    let transport = Box::new(GeminiLive::new(
        GeminiConfig::new(config.api_key.clone())?.with_model(config.model.clone()),
    ));
    let capture = Box::new(WavCapture::open(&cli.input)?);
    let sink: Box<dyn AudioSink> = match &cli.output {
        Some(path) => Box::new(WavSink::create(path)?),
        None => Box::new(NullSink),
    };
    let dispatcher = ToolDispatcher::new(
        Arc::new(LoggingActions),
        Arc::new(MockContacts),
        Arc::new(ScheduleStore::default()),
    );
    let setup = SessionSetup {
        voice: config.voice.clone(),
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        tools: function_declarations(),
        enable_search: config.enable_search,
    };

    info!(model = %config.model, voice = %config.voice, "starting session");
    let handle = Session::start(transport, capture, sink, dispatcher, setup)?;

    // Echo state transitions and the command log while the session runs.
    let mut states = handle.subscribe_state();
    let reporter = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            info!(state = %*states.borrow(), "session state changed");
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, stopping session");
            handle.stop().await;
        }
        // The reporter exits when the session task ends and drops its
        // state channel.
        _ = reporter => {
            handle.wait().await;
        }
    }

    Ok(())
}
