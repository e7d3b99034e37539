//! Create the mailpilot schema: users, conversations, messages and checkpoints.
//!
//! Every statement is idempotent, so running this again is harmless.

use std::process::ExitCode;

use mailpilot_persist::{postgres::lazy_pool, schema};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()) else {
        eprintln!("DATABASE_URL is not set. Set it to your Postgres connection string and run again.");
        return ExitCode::FAILURE;
    };

    match setup(&database_url).await {
        Ok(()) => {
            println!("Schema ready: checkpoint and application tables created.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn setup(database_url: &str) -> anyhow::Result<()> {
    let pool = lazy_pool(database_url)?;
    schema::setup(&pool).await?;
    Ok(())
}
