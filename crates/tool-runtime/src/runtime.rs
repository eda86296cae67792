use crate::prompt::corrective_note;
use crate::protocol::{self, Envelope, EnvelopeKind, ProtocolError};
use crate::provider::{InferenceError, InferenceProvider};
use crate::registry::{DispatchError, ToolRegistry};
use crate::tool::ToolError;
use crate::transcript::{EntryRole, Transcript};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tada_core::config::AgentConfig;
use tracing::{debug, error, info, warn};

/// Something the loop did during a turn, reported as it happens.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// Raw model response, before validation.
    Response { raw: String },
    Plan { plan: String },
    Action { function: String, input: String },
    Observation {
        function: String,
        value: Value,
        is_error: bool,
    },
    /// A response failed to parse; `attempt` counts consecutive failures.
    Malformed { attempt: usize, reason: String },
    Output { output: String },
}

/// Receives [`TurnEvent`]s while a turn runs.
pub trait TurnObserver: Send {
    fn on_event(&mut self, event: &TurnEvent);
}

/// Discards events.
impl TurnObserver for () {
    fn on_event(&mut self, _event: &TurnEvent) {}
}

/// Collects events, mostly for tests.
impl TurnObserver for Vec<TurnEvent> {
    fn on_event(&mut self, event: &TurnEvent) {
        self.push(event.clone());
    }
}

enum TurnState {
    Reasoning,
    Dispatching { function: String, input: String },
    Done { output: String },
}

/// The agent control loop.
///
/// Flow per turn: user envelope → inference → plan* → action → observation
/// → inference → ... → output. The transcript is owned by the caller and
/// outlives every turn.
pub struct AgentLoop {
    provider: Arc<dyn InferenceProvider>,
    registry: Arc<ToolRegistry>,
    max_iterations: usize,
    max_malformed_retries: usize,
    max_tool_failures: usize,
    inference_timeout: Option<Duration>,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn InferenceProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            max_iterations: 10,
            max_malformed_retries: 3,
            max_tool_failures: 3,
            inference_timeout: None,
        }
    }

    /// Apply every limit from `config`.
    pub fn with_config(self, config: &AgentConfig) -> Self {
        self.with_max_iterations(config.max_iterations)
            .with_max_malformed_retries(config.max_malformed_retries)
            .with_max_tool_failures(config.max_tool_failures)
            .with_inference_timeout(config.inference_timeout())
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_malformed_retries(mut self, max: usize) -> Self {
        self.max_malformed_retries = max;
        self
    }

    pub fn with_max_tool_failures(mut self, max: usize) -> Self {
        self.max_tool_failures = max;
        self
    }

    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Run one user turn and return the model's final output text.
    ///
    /// Every raw model response is appended to `transcript` as an assistant
    /// entry, valid or not. On error the transcript keeps everything appended
    /// so far and the caller can start the next turn.
    pub async fn run_turn(
        &self,
        transcript: &mut Transcript,
        user_input: &str,
        observer: &mut dyn TurnObserver,
    ) -> Result<String, AgentError> {
        transcript.append_envelope(&Envelope::User {
            user: user_input.to_string(),
        });

        let mut state = TurnState::Reasoning;
        let mut iteration = 0;
        let mut malformed = 0;
        let mut tool_failures = 0;

        loop {
            state = match state {
                TurnState::Reasoning => {
                    if iteration >= self.max_iterations {
                        error!(max = self.max_iterations, "Turn hit the iteration cap");
                        return Err(AgentError::MaxIterations(self.max_iterations));
                    }
                    iteration += 1;
                    debug!(iteration, "Requesting inference");

                    let raw = self.infer(transcript).await?;
                    transcript.append(EntryRole::Assistant, raw.clone());
                    observer.on_event(&TurnEvent::Response { raw: raw.clone() });

                    match protocol::parse(&raw) {
                        Ok(envelope) => {
                            malformed = 0;
                            self.interpret(envelope, observer)?
                        }
                        Err(e) => {
                            malformed += 1;
                            warn!(iteration, attempt = malformed, error = %e, "Malformed model response");
                            observer.on_event(&TurnEvent::Malformed {
                                attempt: malformed,
                                reason: e.to_string(),
                            });
                            if malformed > self.max_malformed_retries {
                                error!(attempts = malformed, "Giving up on malformed responses");
                                return Err(AgentError::MalformedEnvelope {
                                    attempts: malformed,
                                    source: e,
                                });
                            }
                            transcript.append(EntryRole::System, corrective_note(&e));
                            TurnState::Reasoning
                        }
                    }
                }
                TurnState::Dispatching { function, input } => {
                    match self.registry.dispatch(&function, &input).await {
                        Ok(value) => {
                            tool_failures = 0;
                            debug!(tool = %function, "Tool succeeded");
                            record_observation(transcript, observer, function, value, false);
                            TurnState::Reasoning
                        }
                        Err(DispatchError::UnknownTool(name)) => {
                            error!(tool = %name, "Model called an unknown tool");
                            let value = json!({ "error": format!("unknown tool '{name}'") });
                            record_observation(transcript, observer, name.clone(), value, true);
                            return Err(AgentError::UnknownTool(name));
                        }
                        Err(DispatchError::Execution { tool, source }) => {
                            tool_failures += 1;
                            warn!(tool = %tool, attempt = tool_failures, error = %source, "Tool failed");
                            let value = json!({ "error": source.to_string() });
                            record_observation(transcript, observer, tool.clone(), value, true);
                            if tool_failures > self.max_tool_failures {
                                error!(tool = %tool, failures = tool_failures, "Too many tool failures");
                                return Err(AgentError::ToolFailures {
                                    tool,
                                    failures: tool_failures,
                                    source,
                                });
                            }
                            TurnState::Reasoning
                        }
                    }
                }
                TurnState::Done { output } => {
                    info!(iterations = iteration, "Turn complete");
                    observer.on_event(&TurnEvent::Output {
                        output: output.clone(),
                    });
                    return Ok(output);
                }
            };
        }
    }

    async fn infer(&self, transcript: &Transcript) -> Result<String, InferenceError> {
        let call = self.provider.complete(transcript.snapshot());
        match self.inference_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| InferenceError::Timeout(limit))?,
            None => call.await,
        }
    }

    /// Decide the next state for a well-formed envelope.
    fn interpret(
        &self,
        envelope: Envelope,
        observer: &mut dyn TurnObserver,
    ) -> Result<TurnState, AgentError> {
        match envelope {
            Envelope::Plan { plan } => {
                info!(plan = %plan, "Model plan");
                observer.on_event(&TurnEvent::Plan { plan });
                Ok(TurnState::Reasoning)
            }
            Envelope::Action { function, input } => {
                info!(tool = %function, input = %input, "Model action");
                observer.on_event(&TurnEvent::Action {
                    function: function.clone(),
                    input: input.clone(),
                });
                Ok(TurnState::Dispatching { function, input })
            }
            Envelope::Output { output } => Ok(TurnState::Done { output }),
            other @ (Envelope::User { .. } | Envelope::Observation { .. }) => {
                error!(kind = %other.kind(), "Model sent a runtime-only envelope");
                Err(AgentError::ProtocolViolation(other.kind()))
            }
        }
    }
}

fn record_observation(
    transcript: &mut Transcript,
    observer: &mut dyn TurnObserver,
    function: String,
    value: Value,
    is_error: bool,
) {
    transcript.append_envelope(&Envelope::Observation {
        observation: value.clone(),
    });
    observer.on_event(&TurnEvent::Observation {
        function,
        value,
        is_error,
    });
}

/// Errors that end a turn. None of them end the process.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),
    #[error("Model called unknown tool '{0}'")]
    UnknownTool(String),
    #[error("Model sent {attempts} malformed responses in a row (last: {source})")]
    MalformedEnvelope {
        attempts: usize,
        #[source]
        source: ProtocolError,
    },
    #[error("Model sent a '{0}' envelope, which only the runtime may send")]
    ProtocolViolation(EnvelopeKind),
    #[error("Tool '{tool}' failed {failures} times in a row (last: {source})")]
    ToolFailures {
        tool: String,
        failures: usize,
        #[source]
        source: ToolError,
    },
    #[error("Max iterations ({0}) exceeded")]
    MaxIterations(usize),
}
