//! The envelope protocol spoken with the model.
//!
//! Every model turn must be exactly one JSON object tagged by `type`:
//!
//! ```text
//! {"type": "user",        "user": "..."}
//! {"type": "plan",        "plan": "..."}
//! {"type": "action",      "function": "createTodo", "input": "..."}
//! {"type": "observation", "observation": <any JSON>}
//! {"type": "output",      "output": "..."}
//! ```
//!
//! [`parse`] is strict: one object, a known `type`, its own field present and
//! no other variant's field alongside it.

use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    User,
    Plan,
    Action,
    Observation,
    Output,
}

impl EnvelopeKind {
    pub const ALL: [EnvelopeKind; 5] = [
        EnvelopeKind::User,
        EnvelopeKind::Plan,
        EnvelopeKind::Action,
        EnvelopeKind::Observation,
        EnvelopeKind::Output,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeKind::User => "user",
            EnvelopeKind::Plan => "plan",
            EnvelopeKind::Action => "action",
            EnvelopeKind::Observation => "observation",
            EnvelopeKind::Output => "output",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }

    /// The field that must accompany this `type`.
    pub fn discriminant_field(self) -> &'static str {
        match self {
            EnvelopeKind::User => "user",
            EnvelopeKind::Plan => "plan",
            EnvelopeKind::Action => "function",
            EnvelopeKind::Observation => "observation",
            EnvelopeKind::Output => "output",
        }
    }
}

impl std::fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    User {
        user: String,
    },
    Plan {
        plan: String,
    },
    Action {
        function: String,
        #[serde(default, deserialize_with = "input_text")]
        input: String,
    },
    Observation {
        observation: Value,
    },
    Output {
        output: String,
    },
}

impl Envelope {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::User { .. } => EnvelopeKind::User,
            Envelope::Plan { .. } => EnvelopeKind::Plan,
            Envelope::Action { .. } => EnvelopeKind::Action,
            Envelope::Observation { .. } => EnvelopeKind::Observation,
            Envelope::Output { .. } => EnvelopeKind::Output,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Envelope::User { user } => json!({ "type": "user", "user": user }),
            Envelope::Plan { plan } => json!({ "type": "plan", "plan": plan }),
            Envelope::Action { function, input } => {
                json!({ "type": "action", "function": function, "input": input })
            }
            Envelope::Observation { observation } => {
                json!({ "type": "observation", "observation": observation })
            }
            Envelope::Output { output } => json!({ "type": "output", "output": output }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("response was empty")]
    Empty,
    #[error("response is not a single JSON value: {0}")]
    Decode(String),
    #[error("response is JSON but not an object")]
    NotAnObject,
    #[error("response has no string 'type' field")]
    MissingType,
    #[error("unknown envelope type '{0}'")]
    UnknownType(String),
    #[error("'{kind}' envelope is missing its '{field}' field")]
    MissingField {
        kind: EnvelopeKind,
        field: &'static str,
    },
    #[error("'{kind}' envelope also carries '{field}', which belongs to another type")]
    ConflictingField {
        kind: EnvelopeKind,
        field: &'static str,
    },
    #[error("'{kind}' envelope has an invalid field: {reason}")]
    InvalidField { kind: EnvelopeKind, reason: String },
}

/// Decode and validate one model response.
pub fn parse(raw: &str) -> Result<Envelope, ProtocolError> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(ProtocolError::Empty);
    }

    // from_str rejects trailing data, so concatenated objects fail here.
    let value: Value =
        serde_json::from_str(body).map_err(|e| ProtocolError::Decode(e.to_string()))?;
    let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;

    let tag = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;
    let kind =
        EnvelopeKind::from_tag(tag).ok_or_else(|| ProtocolError::UnknownType(tag.to_string()))?;

    let field = kind.discriminant_field();
    if !object.contains_key(field) {
        return Err(ProtocolError::MissingField { kind, field });
    }
    if let Some(other) = EnvelopeKind::ALL
        .into_iter()
        .filter(|k| *k != kind)
        .map(EnvelopeKind::discriminant_field)
        .find(|f| object.contains_key(*f))
    {
        return Err(ProtocolError::ConflictingField { kind, field: other });
    }

    let envelope: Envelope = serde_json::from_value(value).map_err(|e| {
        ProtocolError::InvalidField {
            kind,
            reason: e.to_string(),
        }
    })?;

    if let Envelope::Action { function, .. } = &envelope {
        if function.trim().is_empty() {
            return Err(ProtocolError::MissingField { kind, field });
        }
    }

    Ok(envelope)
}

/// Encode an envelope as a single-line JSON object.
pub fn serialize(envelope: &Envelope) -> String {
    envelope.to_value().to_string()
}

/// Models often wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the language tag line (```json)
    let Some((_, body)) = rest.split_once('\n') else {
        return text;
    };
    body.trim_end()
        .strip_suffix("```")
        .map_or(text, str::trim)
}

/// `input` is nominally a string, but models routinely send ids as numbers.
/// Scalars are taken as their text; null means empty.
fn input_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Envelope> {
        vec![
            Envelope::User {
                user: "Add a task to buy groceries.".into(),
            },
            Envelope::Plan {
                plan: "I will use createTodo.".into(),
            },
            Envelope::Action {
                function: "createTodo".into(),
                input: "Shop for milk, bread, and vegetables.".into(),
            },
            Envelope::Action {
                function: "getAllTodos".into(),
                input: String::new(),
            },
            Envelope::Observation {
                observation: json!(2),
            },
            Envelope::Observation {
                observation: json!([{"id": 1, "text": "buy milk"}]),
            },
            Envelope::Observation {
                observation: Value::Null,
            },
            Envelope::Output {
                output: "Your todo has been added with ID 2 — \"quoted\" ✓".into(),
            },
        ]
    }

    #[test]
    fn test_round_trip() {
        for envelope in samples() {
            let text = serialize(&envelope);
            assert_eq!(parse(&text).unwrap(), envelope, "round trip of {text}");
        }
    }

    #[test]
    fn test_parse_source_examples() {
        let plan = parse(r#"{"type": "plan", "plan": "I will try to get more context."}"#).unwrap();
        assert_eq!(plan.kind(), EnvelopeKind::Plan);

        let action = parse(
            r#"{"type": "action", "function": "createTodo","input": "Shop for milk."}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            Envelope::Action {
                function: "createTodo".into(),
                input: "Shop for milk.".into()
            }
        );
    }

    #[test]
    fn test_unknown_types_rejected() {
        for tag in ["start", "USER", "Output", "tool", "", "observations"] {
            let raw = json!({ "type": tag, "output": "x" }).to_string();
            assert_eq!(
                parse(&raw).unwrap_err(),
                ProtocolError::UnknownType(tag.to_string()),
                "type {tag:?}"
            );
        }
    }

    #[test]
    fn test_missing_or_non_string_type() {
        assert_eq!(parse(r#"{"output": "x"}"#).unwrap_err(), ProtocolError::MissingType);
        assert_eq!(
            parse(r#"{"type": 3, "output": "x"}"#).unwrap_err(),
            ProtocolError::MissingType
        );
    }

    #[test]
    fn test_action_without_function() {
        let err = parse(r#"{"type": "action", "input": "buy milk"}"#).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MissingField {
                kind: EnvelopeKind::Action,
                field: "function"
            }
        );

        let err = parse(r#"{"type": "action", "function": "  "}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField { .. }));
    }

    #[test]
    fn test_action_input_defaults_and_coercion() {
        let absent = parse(r#"{"type": "action", "function": "getAllTodos"}"#).unwrap();
        assert_eq!(
            absent,
            Envelope::Action {
                function: "getAllTodos".into(),
                input: String::new()
            }
        );

        let numeric = parse(r#"{"type": "action", "function": "deleteTodo", "input": 3}"#).unwrap();
        assert_eq!(
            numeric,
            Envelope::Action {
                function: "deleteTodo".into(),
                input: "3".into()
            }
        );

        let null =
            parse(r#"{"type": "action", "function": "getAllTodos", "input": null}"#).unwrap();
        assert!(matches!(null, Envelope::Action { input, .. } if input.is_empty()));
    }

    #[test]
    fn test_misspelled_observation_field_rejected() {
        let err = parse(r#"{"type": "observation", "bservation": 2}"#).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MissingField {
                kind: EnvelopeKind::Observation,
                field: "observation"
            }
        );
    }

    #[test]
    fn test_conflicting_discriminants() {
        let err = parse(r#"{"type": "plan", "plan": "a", "output": "b"}"#).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::ConflictingField {
                kind: EnvelopeKind::Plan,
                field: "output"
            }
        );
    }

    #[test]
    fn test_wrong_field_type() {
        let err = parse(r#"{"type": "output", "output": 42}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidField { kind: EnvelopeKind::Output, .. }));
    }

    #[test]
    fn test_concatenated_objects_rejected() {
        let raw = r#"{"type": "plan", "plan": "a"}{"type": "output", "output": "b"}"#;
        assert!(matches!(parse(raw).unwrap_err(), ProtocolError::Decode(_)));

        let raw = "{\"type\": \"plan\", \"plan\": \"a\"}\n{\"type\": \"output\", \"output\": \"b\"}";
        assert!(matches!(parse(raw).unwrap_err(), ProtocolError::Decode(_)));
    }

    #[test]
    fn test_non_object_and_garbage() {
        assert_eq!(parse("[1, 2]").unwrap_err(), ProtocolError::NotAnObject);
        assert_eq!(parse("\"output\"").unwrap_err(), ProtocolError::NotAnObject);
        assert_eq!(parse("   ").unwrap_err(), ProtocolError::Empty);
        assert!(matches!(
            parse("Sure! Here you go.").unwrap_err(),
            ProtocolError::Decode(_)
        ));
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let raw = "```json\n{\"type\": \"output\", \"output\": \"Done\"}\n```";
        assert_eq!(
            parse(raw).unwrap(),
            Envelope::Output {
                output: "Done".into()
            }
        );

        let raw = "```\n{\"type\": \"plan\", \"plan\": \"p\"}\n```\n";
        assert_eq!(parse(raw).unwrap().kind(), EnvelopeKind::Plan);
    }

    #[test]
    fn test_extra_non_discriminant_fields_tolerated() {
        let parsed = parse(r#"{"type": "output", "output": "ok", "confidence": 0.9}"#).unwrap();
        assert_eq!(
            parsed,
            Envelope::Output {
                output: "ok".into()
            }
        );
    }
}
