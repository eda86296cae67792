//! System prompt generation.
//!
//! The prompt is derived from the registry so the tool list the model sees
//! always matches what `dispatch` accepts.

use std::fmt::Write;

use serde_json::json;

use crate::protocol::{self, Envelope, ProtocolError};
use crate::registry::ToolRegistry;

const PREAMBLE: &str = "\
You are an AI Todo Assistant with START, PLAN, ACTION, OBSERVATION and OUTPUT states.
Wait for the user prompt and first PLAN using the available tools.
After planning, take the ACTION with the appropriate tool and wait for the OBSERVATION.
Once you have the OBSERVATION, return the OUTPUT based on the user prompt and the OBSERVATION.

You can manage todos by adding, viewing, searching and deleting them based on user requests.

Response rules:
- Reply with exactly ONE JSON object per message and nothing else.
- The object must have a \"type\" of \"plan\", \"action\" or \"output\".
- plan:   {\"type\": \"plan\", \"plan\": \"<your reasoning>\"}
- action: {\"type\": \"action\", \"function\": \"<tool name>\", \"input\": \"<string input>\"}
- output: {\"type\": \"output\", \"output\": \"<message for the user>\"}
- Observations are sent to you as {\"type\": \"observation\", \"observation\": <result>}.
- If an observation contains an \"error\" field, the tool call failed; correct the input or explain the problem.

Todo DB Schema:
id: integer, primary key
text: string, not null
created_at: timestamp, set on creation
updated_at: timestamp, set on modification
";

/// Build the system prompt for the tools in `registry`.
pub fn build_system_prompt(registry: &ToolRegistry) -> String {
    let mut prompt = String::from(PREAMBLE);

    prompt.push_str("\nAvailable Tools:\n");
    for (i, def) in registry.list().iter().enumerate() {
        // Writing to a String cannot fail
        let _ = writeln!(prompt, "{}. {}: {}", i + 1, def.name, def.description);
        let _ = writeln!(prompt, "   - Input: {}", def.input);
        let _ = writeln!(prompt, "   - Output: {}", def.output);
    }

    prompt.push_str("\nExample Interaction:\nSTART\n");
    for envelope in example_interaction() {
        prompt.push_str(&protocol::serialize(&envelope));
        prompt.push('\n');
    }

    prompt
}

fn example_interaction() -> Vec<Envelope> {
    vec![
        Envelope::User {
            user: "Add a new task to buy groceries.".into(),
        },
        Envelope::Plan {
            plan: "I will try to get more context on what the user needs to shop for.".into(),
        },
        Envelope::Output {
            output: "Can you tell me what items you want to shop for?".into(),
        },
        Envelope::User {
            user: "I want to shop for milk, bread, and vegetables.".into(),
        },
        Envelope::Plan {
            plan: "I will use the createTodo tool to add the task.".into(),
        },
        Envelope::Action {
            function: "createTodo".into(),
            input: "Shop for milk, bread, and vegetables.".into(),
        },
        Envelope::Observation {
            observation: json!(2),
        },
        Envelope::Output {
            output: "Your todo has been added successfully with ID 2.".into(),
        },
    ]
}

/// System note appended after a response that failed to parse.
pub fn corrective_note(error: &ProtocolError) -> String {
    format!(
        "Your last message was rejected: {error}. Reply with exactly one JSON object \
         whose \"type\" is \"plan\", \"action\" or \"output\", with its matching field, \
         and no other text."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::testing::{EchoTool, FailingTool};

    #[test]
    fn test_lists_every_tool_in_order() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        registry.register(FailingTool).unwrap();

        let prompt = build_system_prompt(&registry);
        let echo = prompt.find("1. echo: Echoes back the input.").unwrap();
        let fail = prompt.find("2. fail: Always fails.").unwrap();
        assert!(echo < fail);
        assert!(prompt.contains("   - Input: any text"));
    }

    #[test]
    fn test_example_lines_are_valid_envelopes() {
        let prompt = build_system_prompt(&ToolRegistry::new());
        let examples: Vec<&str> = prompt
            .lines()
            .skip_while(|l| *l != "START")
            .skip(1)
            .collect();
        assert_eq!(examples.len(), 8);
        for line in examples {
            protocol::parse(line).unwrap();
        }
    }

    #[test]
    fn test_corrective_note_names_the_problem() {
        let note = corrective_note(&ProtocolError::UnknownType("start".into()));
        assert!(note.contains("unknown envelope type 'start'"));
    }
}
