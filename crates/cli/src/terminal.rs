use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::fmt::Display;
use std::io::{self, Write};
use tada_tool_runtime::{ToolDefinition, TranscriptEntry, TurnEvent, TurnObserver};
use tracing::debug;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const USER_PROMPT: Color = Color::Green;
    const ASSISTANT_TEXT: Color = Color::Cyan;
    const PLAN: Color = Color::Blue;
    const TOOL_CALL: Color = Color::Yellow;
    const TOOL_RESULT: Color = Color::DarkGreen;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Longest observation shown before it is cut.
const MAX_RESULT_CHARS: usize = 500;

const HELP: [(&str, &str); 4] = [
    (":help", "show this help"),
    (":tools", "list the tools the model can call"),
    (":history", "show the conversation transcript"),
    (":quit, exit", "leave (Ctrl+D and Ctrl+C work too)"),
];

/// Manages terminal output for the interactive REPL.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the startup banner.
    pub fn print_banner(&self, provider: &str, model: &str, store: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("tada"),
            ResetColor,
            Print(" - natural-language todo agent\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!(
                "Provider: {} | Model: {} | Store: {}\n",
                provider, model, store
            )),
            Print("Type :help for commands, 'exit' or 'quit' to end.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_prompt(&self) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::USER_PROMPT),
            Print(">> "),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Display a turn event with appropriate formatting.
    pub fn display_event(&self, event: &TurnEvent) -> Result<()> {
        match event {
            TurnEvent::Response { raw } => self.line(Colors::DIM, raw.trim()),
            TurnEvent::Plan { plan } => self.line(Colors::PLAN, format!("[plan] {}", plan)),
            TurnEvent::Action { function, input } => {
                self.line(Colors::TOOL_CALL, format!("[tool: {}] {}", function, input))
            }
            TurnEvent::Observation {
                function,
                value,
                is_error,
            } => {
                let (color, label) = if *is_error {
                    (Colors::ERROR, "error")
                } else {
                    (Colors::TOOL_RESULT, "result")
                };
                let shown = truncate(&value.to_string(), MAX_RESULT_CHARS);
                self.line(color, format!("  [{} {}]: {}", function, label, shown))
            }
            TurnEvent::Malformed { attempt, reason } => {
                self.line(Colors::ERROR, format!("[malformed #{}] {}", attempt, reason))
            }
            TurnEvent::Output { output } => {
                self.line(Colors::ASSISTANT_TEXT, format!("AI: {}", output))
            }
        }
    }

    pub fn print_help(&self) -> Result<()> {
        self.line(Colors::HEADER, "Commands:")?;
        for (command, what) in HELP {
            self.line(Colors::TOOL_CALL, format!("  {:<14} {}", command, what))?;
        }
        self.line(Colors::DIM, "Anything else is sent to the agent.")
    }

    pub fn print_tools(&self, tools: &[ToolDefinition]) -> Result<()> {
        for def in tools {
            self.line(Colors::TOOL_CALL, format!("{:<14} {}", def.name, def.description))?;
            self.line(
                Colors::DIM,
                format!("{:<14} input: {} -> {}", "", def.input, def.output),
            )?;
        }
        Ok(())
    }

    pub fn print_history(&self, entries: &[TranscriptEntry]) -> Result<()> {
        self.line(Colors::HEADER, format!("Transcript: {} entries", entries.len()))?;
        for (i, entry) in entries.iter().enumerate() {
            self.line(Colors::DIM, history_line(i, entry))?;
        }
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        self.line(Colors::ERROR, format!("Error: {}", msg))
    }

    /// Print an info message.
    pub fn print_info(&self, msg: &str) -> Result<()> {
        self.line(Colors::DIM, msg)
    }

    /// Write one colored line and flush.
    fn line(&self, color: Color, text: impl Display) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(color),
            Print(format!("{}\n", text)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnObserver for Terminal {
    fn on_event(&mut self, event: &TurnEvent) {
        if let Err(e) = self.display_event(event) {
            debug!(error = %e, "Failed to write turn event");
        }
    }
}

/// Cut `text` to at most `max` characters, noting the original length.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}... ({} chars total)", &text[..cut], text.chars().count()),
        None => text.to_string(),
    }
}

/// One `:history` row: index, role and the first line of content.
fn history_line(index: usize, entry: &TranscriptEntry) -> String {
    let first_line = entry.content.lines().next().unwrap_or("");
    format!(
        "{:>3} {:<11} {}",
        index,
        entry.role.as_str(),
        truncate(first_line, 80)
    )
}
