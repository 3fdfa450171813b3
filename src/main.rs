use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use unmute_relay::api::ApiServer;
use unmute_relay::db::{self, ContextRepo};
use unmute_relay::speech::SpeechSynthesizer;
use unmute_relay::{Config, GeminiClient};

/// Demo facts matching the companion frontend's examples
const DEMO_FACTS: &[(&str, &str)] = &[
    ("spouse_name", "Sarah"),
    ("home_address", "42 Wallaby Way, Sydney"),
    ("dog_name", "Buster"),
    ("emergency_contact", "Dr. Smith at 555-0199"),
];

/// Unmute - backend relay for an aphasia communication assistant
#[derive(Parser)]
#[command(name = "unmute", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Seed the context store with demo facts
    Seed,
    /// Synthesize a line of text and write the audio to a file
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,

        /// Output file for the audio bytes
        #[arg(short, long, default_value = "tts-test.mp3")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,unmute_relay=info",
        1 => "info,unmute_relay=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // A missing Gemini key fails here, before any traffic is served
    let mut config = Config::load()?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Seed => seed(&config),
            Command::TestTts { text, output } => test_tts(&config, &text, &output).await,
        };
    }

    tracing::info!(
        port = config.server.port,
        tts_provider = %config.voice.tts_provider,
        "starting unmute relay"
    );

    let pool = db::init(&config.db_path)?;
    let server = ApiServer::from_config(&config, pool)?;

    server.run().await?;

    Ok(())
}

/// Seed the context store with demo facts
fn seed(config: &Config) -> anyhow::Result<()> {
    let pool = db::init(&config.db_path)?;
    let repo = ContextRepo::new(pool);

    repo.seed(DEMO_FACTS)?;

    println!("Context store seeded with {} facts", DEMO_FACTS.len());
    Ok(())
}

/// One-shot synthesis smoke test
async fn test_tts(config: &Config, text: &str, output: &Path) -> anyhow::Result<()> {
    println!("Synthesizing: \"{text}\"");

    let gemini = GeminiClient::new(config.api_keys.gemini.clone())?;
    let synthesizer = SpeechSynthesizer::from_config(config, gemini)?;

    let audio = synthesizer.synthesize(text, None).await?;

    if audio.len() > 3 {
        println!(
            "First 4 bytes: {:02x} {:02x} {:02x} {:02x}",
            audio[0], audio[1], audio[2], audio[3]
        );
    }

    std::fs::write(output, &audio)?;
    println!("Wrote {} bytes to {}", audio.len(), output.display());

    Ok(())
}
