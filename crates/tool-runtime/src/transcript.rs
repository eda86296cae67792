use serde::{Deserialize, Serialize};

use crate::protocol::{self, Envelope};

/// Who an entry is attributed to when replayed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryRole {
    System,
    User,
    Assistant,
    ToolResult,
}

impl EntryRole {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryRole::System => "system",
            EntryRole::User => "user",
            EntryRole::Assistant => "assistant",
            EntryRole::ToolResult => "tool-result",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: EntryRole,
    pub content: String,
}

/// Append-only conversation log replayed in full on every inference call.
///
/// Entry 0 is always the system prompt the transcript was created with.
/// Entries are never edited, reordered or removed.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            entries: vec![TranscriptEntry {
                role: EntryRole::System,
                content: system_prompt.into(),
            }],
        }
    }

    pub fn append(&mut self, role: EntryRole, content: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            role,
            content: content.into(),
        });
    }

    /// Serialize an envelope and append it under the role its type implies.
    pub fn append_envelope(&mut self, envelope: &Envelope) {
        let role = match envelope {
            Envelope::User { .. } => EntryRole::User,
            Envelope::Observation { .. } => EntryRole::ToolResult,
            Envelope::Plan { .. } | Envelope::Action { .. } | Envelope::Output { .. } => {
                EntryRole::Assistant
            }
        };
        self.append(role, protocol::serialize(envelope));
    }

    /// The full log in append order.
    pub fn snapshot(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn system_prompt(&self) -> &str {
        &self.entries[0].content
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: the system entry is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seeded_with_system_prompt() {
        let transcript = Transcript::new("You are a todo assistant.");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.snapshot()[0].role, EntryRole::System);
        assert_eq!(transcript.system_prompt(), "You are a todo assistant.");
    }

    #[test]
    fn test_appends_grow_by_one_and_keep_prefix() {
        let mut transcript = Transcript::new("sys");
        let mut previous: Vec<TranscriptEntry> = transcript.snapshot().to_vec();

        for n in 1..=6 {
            let role = if n % 2 == 0 {
                EntryRole::Assistant
            } else {
                EntryRole::User
            };
            transcript.append(role, format!("entry {n}"));

            let current = transcript.snapshot();
            assert_eq!(current.len(), n + 1);
            assert_eq!(&current[..previous.len()], previous.as_slice());
            assert!(current.len() > previous.len());
            previous = current.to_vec();
        }
    }

    #[test]
    fn test_envelope_roles() {
        let mut transcript = Transcript::new("sys");
        transcript.append_envelope(&Envelope::User {
            user: "hi".into(),
        });
        transcript.append_envelope(&Envelope::Plan {
            plan: "p".into(),
        });
        transcript.append_envelope(&Envelope::Observation {
            observation: json!([]),
        });
        transcript.append_envelope(&Envelope::Output {
            output: "bye".into(),
        });

        let roles: Vec<EntryRole> = transcript.snapshot().iter().map(|e| e.role).collect();
        assert_eq!(
            roles,
            vec![
                EntryRole::System,
                EntryRole::User,
                EntryRole::Assistant,
                EntryRole::ToolResult,
                EntryRole::Assistant,
            ]
        );

        let last = transcript.last().unwrap();
        assert_eq!(
            protocol::parse(&last.content).unwrap(),
            Envelope::Output {
                output: "bye".into()
            }
        );
    }

    #[test]
    fn test_role_serializes_kebab_case() {
        let json = serde_json::to_string(&EntryRole::ToolResult).unwrap();
        assert_eq!(json, "\"tool-result\"");
        assert_eq!(EntryRole::ToolResult.as_str(), "tool-result");
    }
}
