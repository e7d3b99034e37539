use clap::Parser;
use std::process::ExitCode;

use mailpilot_cli::{build_assistant, config::Config, logging::init_logging, session};

#[derive(Parser)]
#[command(name = "mailpilot", version, about = "Email assistant that can send mail through Gmail")]
struct Cli {
    /// Conversation thread; turns on the same thread share history
    #[arg(long, env = "THREAD_ID")]
    thread_id: Option<String>,

    /// User the conversation belongs to
    #[arg(long, env = "USER_ID")]
    user_id: Option<String>,

    /// Message for a single turn. Omit to start an interactive session.
    #[arg(short, long, env = "RUN_MESSAGE")]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    init_logging(&config.logging);

    let thread_id = cli.thread_id.unwrap_or_else(|| config.thread_id.clone());
    let user_id = cli.user_id.unwrap_or_else(|| config.user_id.clone());
    let message = cli.message.or_else(|| config.run_message.clone());

    let assistant = build_assistant(&config)?;
    tracing::info!(
        model = %config.llm.model,
        thread_id = %thread_id,
        persistence = assistant.persistence_enabled(),
        "Email assistant ready"
    );

    let mut stdout = std::io::stdout();
    match message {
        Some(message) => {
            session::run_turn(&assistant, &thread_id, &user_id, &message, &mut stdout).await?;
        }
        None => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let turns = session::interactive(&assistant, &thread_id, &user_id, stdin, &mut stdout).await?;
            tracing::info!(turns, "Session ended");
        }
    }

    Ok(())
}
