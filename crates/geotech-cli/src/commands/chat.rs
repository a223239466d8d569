//! Chat command - ask geotechnical questions.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, BufRead, Write};

use crate::backend::Backend;
use crate::output::{self, CommandResult, OutputFormat};

/// Starter questions shown in interactive mode.
const SUGGESTIONS: [&str; 4] = [
    "What is the typical bearing capacity of glacial till?",
    "How do I assess slope stability in a seismic zone?",
    "What foundation type is best for clay soils?",
    "Can you explain the soil profile for a lakeside site?",
];

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Question to ask (if not provided, reads one line from stdin)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Interactive chat mode
    #[arg(short, long)]
    pub interactive: bool,
}

/// Chat answer for output.
#[derive(Debug, Serialize)]
pub struct ChatOutput {
    pub query: String,
    pub response: String,
}

/// Execute the chat command.
pub async fn execute(args: ChatArgs, backend: &dyn Backend, format: OutputFormat) -> Result<()> {
    if args.interactive {
        run_interactive_mode(backend).await
    } else {
        run_single_message(backend, args.message, format).await
    }
}

async fn run_single_message(
    backend: &dyn Backend,
    message: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let query = match message {
        Some(message) => message,
        None => {
            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;
            input.trim().to_string()
        }
    };

    if query.trim().is_empty() {
        let result: CommandResult<()> = CommandResult::failure("No question provided");
        result.print(format)?;
        return Ok(());
    }

    let response = output::with_spinner(format, "Thinking...", backend.chat(&query)).await?;

    match format {
        OutputFormat::Json => CommandResult::success(ChatOutput { query, response }).print(format),
        OutputFormat::Text => {
            println!("{response}");
            Ok(())
        }
    }
}

async fn run_interactive_mode(backend: &dyn Backend) -> Result<()> {
    output::info("Geotechnical assistant (type 'exit' to quit, 'clear' to reset history)");
    output::section("Try these questions");
    for (idx, suggestion) in SUGGESTIONS.iter().enumerate() {
        println!("  {}. {}", idx + 1, suggestion);
    }
    println!();

    loop {
        print!("{} ", "You:".bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            output::info("Goodbye!");
            break;
        }
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("clear") {
            match backend.clear_history().await {
                Ok(()) => output::success("Chat history cleared"),
                Err(e) => output::error(&format!("Error: {e:#}")),
            }
            continue;
        }

        // A bare number picks a suggestion
        let query = match input.parse::<usize>() {
            Ok(n) if (1..=SUGGESTIONS.len()).contains(&n) => SUGGESTIONS[n - 1].to_string(),
            _ => input.to_string(),
        };

        let spinner = output::spinner("Thinking...");
        let result = backend.chat(&query).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => println!("{} {}", "Assistant:".bold().blue(), response),
            Err(e) => output::error(&format!("Error: {e:#}")),
        }
        println!();
    }

    Ok(())
}
