//! System prompt for the email assistant
//!
//! The prompt is sent ahead of every model request and never stored in the
//! conversation history.

use chrono::{NaiveDate, Utc};

/// Base instruction for the assistant
pub const BASE_INSTRUCTION: &str =
    "You are a helpful assistant. Answer the user's questions clearly and concisely.";

/// Tools section of the prompt, stamped with the given date
pub fn tools_section(today: NaiveDate) -> String {
    format!(
        "## Tools
- **send_email_tool**: Send an email. For a NEW email to a specific recipient, call with:
  - email_address: recipient email
  - subject: subject line
  - body: body text
  Do not pass email_id when sending a new email. Use this when the user says e.g. \"send an email to X\" or \"email Y with subject Z\".
- **question_tool**: Ask the user for clarification when you need more info (e.g. recipient, subject).
- **done_tool**: Call when you have finished the request (e.g. after sending the email).

Today's date is {}. Do not invent email addresses or content. When the user asks to send an email to a specific address, use send_email_tool with that address, subject, and body.",
        today.format("%Y-%m-%d")
    )
}

/// Full system prompt for a given date
pub fn system_prompt_for(today: NaiveDate) -> String {
    format!("{}\n\n{}", BASE_INSTRUCTION, tools_section(today))
}

/// Full system prompt stamped with today's UTC date
pub fn system_prompt() -> String {
    system_prompt_for(Utc::now().date_naive())
}
