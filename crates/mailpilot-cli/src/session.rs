//! Running turns from the terminal: one-shot or an interactive session

use std::io::Write;

use anyhow::{anyhow, Result};
use mailpilot::{EmailAssistant, StreamEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const NO_MESSAGES: &str = "(no messages in state)";

/// One line describing tool activity, or `None` for events the user doesn't need to see
pub fn render_event(event: &StreamEvent) -> Option<String> {
    match event {
        StreamEvent::ToolCall { name, arguments, .. } => Some(format!("-> {}({})", name, arguments)),
        StreamEvent::ToolResult { result, is_error, .. } => {
            if *is_error {
                Some(format!("<- error: {}", result))
            } else {
                Some(format!("<- {}", result))
            }
        }
        _ => None,
    }
}

/// Run one turn, echoing tool activity as it happens, and print the assistant's reply.
///
/// Returns the reply text. A failed turn is returned as an error.
pub async fn run_turn<W: Write>(
    assistant: &EmailAssistant,
    thread_id: &str,
    user_id: &str,
    message: &str,
    out: &mut W,
) -> Result<String> {
    let mut events = assistant.spawn_turn(thread_id, user_id, message);
    let mut reply = None;

    while let Some(event) = events.recv().await {
        if let Some(line) = render_event(&event) {
            writeln!(out, "{}", line)?;
        }
        match event {
            StreamEvent::Message { content } => reply = Some(content),
            // Text that came with tool calls is not the final answer
            StreamEvent::ToolCall { .. } => reply = None,
            StreamEvent::Error { message, .. } => return Err(anyhow!(message)),
            _ => {}
        }
    }

    let reply = reply.unwrap_or_else(|| NO_MESSAGES.to_string());
    writeln!(out, "{}", reply)?;
    Ok(reply)
}

/// Read user messages line by line until EOF or `exit`, running one turn per line.
///
/// Blank lines are skipped. A failed turn is reported and the session goes on.
/// Returns the number of turns that completed.
pub async fn interactive<R, W>(
    assistant: &EmailAssistant,
    thread_id: &str,
    user_id: &str,
    input: R,
    out: &mut W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut completed = 0;

    loop {
        write!(out, "you> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") {
            break;
        }

        match run_turn(assistant, thread_id, user_id, line, out).await {
            Ok(_) => completed += 1,
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                writeln!(out, "error: {}", e)?;
            }
        }
    }

    Ok(completed)
}
