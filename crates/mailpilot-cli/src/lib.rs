pub mod config;
pub mod logging;
pub mod session;

use std::sync::Arc;

use anyhow::{Context, Result};
use mailpilot::{
    ClientFactory, EmailAssistant, GmailAuth, GmailClient, OpenAIConfig, PersistenceBuilder,
};

use crate::config::Config;

/// Wire the assistant from loaded configuration.
///
/// Nothing here touches the network or the token cache; the database pool
/// connects lazily and Gmail credentials are fetched on the first send.
pub fn build_assistant(config: &Config) -> Result<EmailAssistant> {
    let mut openai = OpenAIConfig::new(config.openai_api_key.clone());
    if let Some(base_url) = &config.llm.base_url {
        openai = openai.with_base_url(base_url.clone());
    }
    let chat_client = ClientFactory::create_chat_client(openai).context("Failed to create chat client")?;

    let auth = Arc::new(GmailAuth::new((&config.gmail).into()));
    let gmail = Arc::new(GmailClient::new(auth));

    let backends = PersistenceBuilder::new()
        .maybe_database_url(config.database_url.clone())
        .build()
        .context("Failed to set up persistence")?;

    EmailAssistant::builder()
        .chat_client(chat_client)
        .email_sender(gmail)
        .backends(backends)
        .graph_config((&config.graph).into())
        .llm_config((&config.llm).into())
        .build()
}
