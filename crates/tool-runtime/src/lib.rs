pub mod bridge;
pub mod prompt;
pub mod protocol;
pub mod provider;
pub mod registry;
pub mod runtime;
pub mod tool;
pub mod tools;
pub mod transcript;

pub use bridge::{LlmProviderBridge, SimpleLlmProvider, SimpleMessage, SimpleRole};
pub use prompt::build_system_prompt;
pub use protocol::{Envelope, EnvelopeKind, ProtocolError};
pub use provider::{InferenceError, InferenceProvider};
pub use registry::{DispatchError, RegistryError, ToolRegistry};
pub use runtime::{AgentError, AgentLoop, TurnEvent, TurnObserver};
pub use tool::{Tool, ToolDefinition, ToolError};
pub use tools::todo_registry;
pub use transcript::{EntryRole, Transcript, TranscriptEntry};
