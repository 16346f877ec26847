use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use sage_chat::cli::chat::personality::Personality;
use sage_chat::cli::chat::{render_personalities, ChatContext};
use sage_chat::config::{Config, Overrides};
use sage_chat::sage_client::SageClient;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    chat: ChatArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ChatArgs {
    /// Send a single message and exit
    #[arg(short, long)]
    input: Option<String>,

    /// Sage to talk to (littlefinger, mac, lawyer, businessman)
    #[arg(short, long)]
    personality: Option<Personality>,

    /// PDF to upload as context before chatting
    #[arg(short, long)]
    upload: Option<PathBuf>,

    /// Chat backend base url
    #[arg(long)]
    backend_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat(ChatArgs),
    /// List the available Sages
    Personalities {
        /// Only show Sages matching this text
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Personalities { query }) => {
            print!("{}", render_personalities(query.as_deref().unwrap_or("")));
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Chat(args)) => run_chat(args).await,
        // Default to chat if no subcommand is provided
        None => run_chat(cli.chat).await,
    }
}

async fn run_chat(args: ChatArgs) -> Result<ExitCode> {
    let config = Config::load(Overrides {
        backend_url: args.backend_url,
        personality: args.personality,
    })?;

    info!("Starting Sage Chat against {}", config.backend_url);

    let client = match SageClient::with_timeout(&config.backend_url, config.request_timeout()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to initialize Sage client: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let interactive = args.input.is_none();
    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        Box::new(client),
        &config,
        args.input,
        interactive,
    )
    .with_upload(args.upload);

    chat_context.run().await
}
