//! History command - show or clear the chat transcript.

use anyhow::Result;
use clap::Args;
use geotech_agents::TranscriptEntry;
use tabled::Tabled;

use crate::backend::Backend;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the history command.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Clear the transcript
    #[arg(long)]
    pub clear: bool,

    /// Show only the last N messages
    #[arg(short, long)]
    pub last: Option<usize>,

    /// Print full messages instead of a table
    #[arg(long)]
    pub full: bool,
}

fn time_of(entry: &TranscriptEntry) -> String {
    entry
        .timestamp
        .as_ref()
        .map_or_else(|| "Unknown time".to_string(), ToString::to_string)
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Message")]
    content: String,
}

/// Execute the history command.
pub async fn execute(args: HistoryArgs, backend: &dyn Backend, format: OutputFormat) -> Result<()> {
    if args.clear {
        backend.clear_history().await?;
        return CommandResult::<()>::success_message("Chat history cleared").print(format);
    }

    let mut entries = backend.history().await?;
    if let Some(last) = args.last {
        let skip = entries.len().saturating_sub(last);
        entries.drain(..skip);
    }

    if format == OutputFormat::Json {
        return output::json(&entries);
    }

    if entries.is_empty() {
        output::info("No chat history yet");
        return Ok(());
    }

    if args.full {
        for entry in &entries {
            output::section(&format!("{} ({})", entry.role, time_of(entry)));
            println!("{}", entry.content);
        }
    } else {
        let rows: Vec<HistoryRow> = entries
            .iter()
            .map(|entry| HistoryRow {
                time: time_of(entry),
                role: entry.role.to_string(),
                content: output::truncate(&entry.content, 80),
            })
            .collect();
        output::table(&rows);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_missing_and_free_text() {
        let entry: TranscriptEntry = serde_json::from_str(
            r#"{"role": "user", "content": "q1", "timestamp": "2025-03-19 22:35:07"}"#,
        )
        .unwrap();
        assert_eq!(time_of(&entry), "2025-03-19 22:35:07");

        let entry: TranscriptEntry =
            serde_json::from_str(r#"{"role": "assistant", "content": "a1"}"#).unwrap();
        assert_eq!(time_of(&entry), "Unknown time");
    }
}
