use std::path::PathBuf;

use clap::Parser;
use tada_core::Config;

/// Natural-language todo agent.
///
/// Reads one request per line, lets the model plan and call the todo tools,
/// and prints its answer.
#[derive(Parser, Debug)]
#[command(name = "tada", about = "Natural-language todo agent")]
pub struct CliArgs {
    /// Config profile; keys resolve as {PROFILE}_{KEY} before {KEY}
    #[arg(long, env = "TADA_PROFILE")]
    pub profile: Option<String>,

    /// LLM provider to use: openai, anthropic, or ollama
    #[arg(long)]
    pub provider: Option<String>,

    /// Model name override (uses provider default if not set)
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum inference calls per turn
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Timeout for a single inference call, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Keep todos in memory even if DATABASE_URL is set
    #[arg(long)]
    pub memory: bool,

    /// Read the system prompt from this file instead of generating it
    #[arg(long)]
    pub system_prompt: Option<PathBuf>,
}

impl CliArgs {
    /// Overlay command-line flags onto the environment config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.to_lowercase();
        }
        // After the provider so the model lands on the right one
        if let Some(model) = &self.model {
            config.llm.set_model(&mut config.ollama, model.clone());
        }
        if let Some(max) = self.max_iterations {
            config.agent.max_iterations = max;
        }
        if let Some(secs) = self.timeout_secs {
            config.agent.inference_timeout_secs = secs;
        }
    }
}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Quit,
    Help,
    Tools,
    History,
    /// Anything else goes to the agent.
    Prompt(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => ShellCommand::Empty,
            ":quit" | ":q" | "exit" | "quit" => ShellCommand::Quit,
            ":help" | ":h" => ShellCommand::Help,
            ":tools" => ShellCommand::Tools,
            ":history" => ShellCommand::History,
            text => ShellCommand::Prompt(text.to_string()),
        }
    }
}
