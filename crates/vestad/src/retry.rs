//! Bounded validation retry loop.
//!
//! State machine: INIT → CALLED → {VALID, RETRY} → … → {VALID, EXHAUSTED}.
//! The conversation history is an immutable, append-only [`Transcript`]
//! passed forward at each transition, so every state the loop visits can be
//! reproduced from its inputs. An invalid response never surfaces to the
//! caller unless the retry budget is spent, and what happens then is an
//! explicit per-session policy, not a fixed choice.

use crate::llm::{ChatBackend, ChatRequest};
use tracing::{debug, warn};
use vesta_common::{ChatMessage, VestaError};

/// Append-only conversation history. `with` returns a new transcript; the
/// original is never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// INIT state: history seeded with the system turn and the task prompt.
    pub fn seeded(system_prompt: &str, task_prompt: &str) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(task_prompt),
            ],
        }
    }

    pub fn with(&self, message: ChatMessage) -> Self {
        let mut messages = self.messages.clone();
        messages.push(message);
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// What to do when the retry budget is exhausted without a valid response.
#[derive(Debug, Clone, PartialEq)]
pub enum ExhaustionPolicy {
    /// Return a predetermined fallback value (classification use).
    Fallback(String),
    /// Surface a terminal error (recommendation-synthesis use).
    Fail,
}

/// Outcome of a session that reached VALID (possibly by substitution).
#[derive(Debug, Clone)]
pub struct Accepted {
    /// The accepted (trimmed) response, or the fallback value.
    pub response: String,
    /// History including the accepted response, retained for follow-ups.
    pub transcript: Transcript,
    /// Reasoning calls actually made.
    pub attempts: usize,
    /// True when the response came from the fallback, not the model.
    pub substituted: bool,
}

/// One configured run of the retry state machine.
pub struct RetrySession<'a> {
    backend: &'a dyn ChatBackend,
    model: String,
    temperature: f32,
    force_json: bool,
    /// Corrective re-calls allowed after the first attempt.
    max_retries: usize,
    /// Corrective user turn appended after each invalid response.
    correction: String,
    policy: ExhaustionPolicy,
}

impl<'a> RetrySession<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        backend: &'a dyn ChatBackend,
        model: impl Into<String>,
        temperature: f32,
        force_json: bool,
        max_retries: usize,
        correction: impl Into<String>,
        policy: ExhaustionPolicy,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            temperature,
            force_json,
            max_retries,
            correction: correction.into(),
            policy,
        }
    }

    /// Drive the machine until VALID or EXHAUSTED. Makes at most
    /// `1 + max_retries` calls; exactly `k` when the k-th response first
    /// validates. Connection errors are fatal and are not retried here.
    pub async fn run<F>(&self, transcript: Transcript, validate: F) -> Result<Accepted, VestaError>
    where
        F: Fn(&str) -> bool,
    {
        let budget = 1 + self.max_retries;
        let mut transcript = transcript;

        for attempt in 1..=budget {
            let request = ChatRequest {
                model: self.model.clone(),
                temperature: self.temperature,
                messages: transcript.messages().to_vec(),
                force_json: self.force_json,
            };
            let response = self.backend.chat(&request).await?.trim().to_string();

            if validate(&response) {
                debug!("Response valid on attempt {}/{}", attempt, budget);
                return Ok(Accepted {
                    transcript: transcript.with(ChatMessage::assistant(response.clone())),
                    response,
                    attempts: attempt,
                    substituted: false,
                });
            }

            warn!(
                "Invalid response on attempt {}/{} ({} chars)",
                attempt,
                budget,
                response.len()
            );
            // RETRY: keep the invalid turn and the correction in history so
            // the next call sees what was wrong.
            transcript = transcript
                .with(ChatMessage::assistant(response))
                .with(ChatMessage::user(self.correction.clone()));
        }

        match &self.policy {
            ExhaustionPolicy::Fallback(value) => {
                warn!("Retry budget exhausted, substituting default '{}'", value);
                Ok(Accepted {
                    response: value.clone(),
                    transcript: transcript.with(ChatMessage::assistant(value.clone())),
                    attempts: budget,
                    substituted: true,
                })
            }
            ExhaustionPolicy::Fail => Err(VestaError::RetryExhausted { attempts: budget }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedBackend;
    use vesta_common::ChatRole;

    fn session<'a>(
        backend: &'a ScriptedBackend,
        max_retries: usize,
        policy: ExhaustionPolicy,
    ) -> RetrySession<'a> {
        RetrySession::new(backend, "qwen3-max", 0.0, false, max_retries, "解析失败，只输出要求的格式", policy)
    }

    #[test]
    fn test_seeded_transcript_has_system_then_user() {
        let t = Transcript::seeded("系统", "任务");
        assert_eq!(t.len(), 2);
        assert_eq!(t.messages()[0].role, ChatRole::System);
        assert_eq!(t.messages()[1].role, ChatRole::User);
    }

    #[test]
    fn test_with_does_not_mutate_original() {
        let t = Transcript::seeded("系统", "任务");
        let t2 = t.with(ChatMessage::assistant("答复"));
        assert_eq!(t.len(), 2);
        assert_eq!(t2.len(), 3);
    }

    #[tokio::test]
    async fn test_valid_first_response_makes_one_call() {
        let backend = ScriptedBackend::new(vec!["电源"]);
        let session = session(&backend, 3, ExhaustionPolicy::Fail);
        let accepted = session
            .run(Transcript::seeded("s", "t"), |r| r == "电源")
            .await
            .unwrap();
        assert_eq!(backend.call_count(), 1);
        assert_eq!(accepted.attempts, 1);
        assert!(!accepted.substituted);
        // Accepted response is appended to the retained history.
        assert_eq!(accepted.transcript.len(), 3);
        assert_eq!(accepted.transcript.messages()[2].content, "电源");
    }

    #[tokio::test]
    async fn test_kth_valid_response_makes_k_calls() {
        let backend = ScriptedBackend::new(vec!["废话", "更多废话", "电源"]);
        let session = session(&backend, 3, ExhaustionPolicy::Fail);
        let accepted = session
            .run(Transcript::seeded("s", "t"), |r| r == "电源")
            .await
            .unwrap();
        assert_eq!(backend.call_count(), 3);
        assert_eq!(accepted.attempts, 3);
        assert_eq!(accepted.response, "电源");
    }

    #[tokio::test]
    async fn test_exhaustion_makes_exactly_one_plus_n_calls() {
        let backend = ScriptedBackend::new(vec!["永远无效"]);
        let session = session(&backend, 3, ExhaustionPolicy::Fail);
        let err = session
            .run(Transcript::seeded("s", "t"), |_| false)
            .await
            .unwrap_err();
        assert_eq!(backend.call_count(), 4);
        assert!(matches!(err, VestaError::RetryExhausted { attempts: 4 }));
    }

    #[tokio::test]
    async fn test_fallback_policy_substitutes_default() {
        let backend = ScriptedBackend::new(vec!["不在集合里"]);
        let session = session(&backend, 2, ExhaustionPolicy::Fallback("电源".into()));
        let accepted = session
            .run(Transcript::seeded("s", "t"), |_| false)
            .await
            .unwrap();
        assert_eq!(backend.call_count(), 3);
        assert!(accepted.substituted);
        assert_eq!(accepted.response, "电源");
        // The substituted value still lands in history.
        let last = accepted.transcript.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "电源");
    }

    #[tokio::test]
    async fn test_retry_appends_invalid_turn_and_correction() {
        let backend = ScriptedBackend::new(vec!["胡言乱语", "电源"]);
        let session = session(&backend, 3, ExhaustionPolicy::Fail);
        session
            .run(Transcript::seeded("系统", "任务"), |r| r == "电源")
            .await
            .unwrap();

        // Second call must see: system, task, invalid assistant, correction.
        let second = backend.request(1);
        assert_eq!(second.messages.len(), 4);
        assert_eq!(second.messages[2].role, ChatRole::Assistant);
        assert_eq!(second.messages[2].content, "胡言乱语");
        assert_eq!(second.messages[3].role, ChatRole::User);
        assert_eq!(second.messages[3].content, "解析失败，只输出要求的格式");
    }

    #[tokio::test]
    async fn test_responses_are_trimmed_before_validation() {
        let backend = ScriptedBackend::new(vec!["  电源\n"]);
        let session = session(&backend, 0, ExhaustionPolicy::Fail);
        let accepted = session
            .run(Transcript::seeded("s", "t"), |r| r == "电源")
            .await
            .unwrap();
        assert_eq!(accepted.response, "电源");
    }
}
