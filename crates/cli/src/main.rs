mod cli;
mod input;
mod provider_bridge;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use tada_core::config::{load_dotenv, Config};
use tada_storage::{open_store, MemoryStore, TodoStore};
use tada_tool_runtime::{build_system_prompt, todo_registry, AgentLoop, Transcript};

use crate::cli::{CliArgs, ShellCommand};
use crate::provider_bridge::create_inference_provider;
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the REPL
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let mut config = Config::for_profile(args.profile.as_deref().unwrap_or_default());
    args.apply(&mut config);
    config.log_summary();

    let store: Arc<dyn TodoStore> = if args.memory {
        info!("Storage: --memory given, using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        open_store(&config.postgres)
            .await
            .context("failed to open todo store")?
    };

    let registry = Arc::new(todo_registry(store.clone()).context("failed to build tool registry")?);

    let system_prompt = match &args.system_prompt {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read system prompt from {}", path.display()))?,
        None => build_system_prompt(&registry),
    };

    let provider = create_inference_provider(&config).context("failed to create LLM provider")?;
    let agent = AgentLoop::new(provider, registry.clone()).with_config(&config.agent);

    // The one piece of state that lives for the whole session
    let mut transcript = Transcript::new(system_prompt);
    let mut terminal = Terminal::new();

    terminal.print_banner(
        agent.provider_name(),
        config.llm.model_for(&config.ollama),
        store.backend_name(),
    )?;

    let mut lines = input::stdin_lines();

    // REPL loop
    loop {
        terminal.print_prompt()?;

        let line = tokio::select! {
            line = lines.recv() => line.transpose().context("failed to read input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            terminal.print_info("\nGoodbye.")?;
            break;
        };

        let input = match ShellCommand::parse(&line) {
            ShellCommand::Empty => continue,
            ShellCommand::Quit => {
                terminal.print_info("Goodbye.")?;
                break;
            }
            ShellCommand::Help => {
                terminal.print_help()?;
                continue;
            }
            ShellCommand::Tools => {
                terminal.print_tools(&registry.list())?;
                continue;
            }
            ShellCommand::History => {
                terminal.print_history(transcript.snapshot())?;
                continue;
            }
            ShellCommand::Prompt(text) => text,
        };

        let outcome = tokio::select! {
            result = agent.run_turn(&mut transcript, &input, &mut terminal) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        match outcome {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!(error = %e, "Turn failed");
                terminal.print_error(&e.to_string())?;
            }
            None => {
                terminal.print_info("\nInterrupted. Goodbye.")?;
                break;
            }
        }
    }

    Ok(())
}
