use std::time::Instant;

use intent_router::{FallbackHeuristic, RoutingDecision, SuggestedAction};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::ports::{ClassifierPort, InferencePort, ShellPort};
use crate::prompt::build_context;
use crate::session::{ConversationTurn, ErrorRecord, Session};
use crate::stats::{DispatchStats, StatsSnapshot};

/// What happened to one line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Blank input; nothing was done.
    Ignored,
    ShellWritten,
    AiReplied,
    /// The failure was reported into the conversation.
    Failed(DispatchError),
    /// The session closed before the dispatch could finish.
    Discarded,
}

/// Carries out routing decisions against a session's shell and assistant channels.
pub struct Dispatcher<C: ClassifierPort, S: ShellPort, A: InferencePort> {
    classifier: C,
    shell: S,
    inference: A,
    fallback: FallbackHeuristic,
    config: DispatchConfig,
    stats: DispatchStats,
}

impl<C: ClassifierPort, S: ShellPort, A: InferencePort> Dispatcher<C, S, A> {
    pub fn new(classifier: C, shell: S, inference: A) -> Self {
        Self::with_config(classifier, shell, inference, DispatchConfig::default())
    }

    pub fn with_config(classifier: C, shell: S, inference: A, config: DispatchConfig) -> Self {
        Self {
            classifier,
            shell,
            inference,
            fallback: FallbackHeuristic::new(),
            config,
            stats: DispatchStats::default(),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Classifies `input` and performs exactly one side effect for it.
    ///
    /// Failures never escape: they are recorded in the session and reflected
    /// in the returned outcome, and the session stays usable.
    pub async fn dispatch(&self, input: &str, session: &Session) -> DispatchOutcome {
        let input = input.trim();
        if input.is_empty() {
            return DispatchOutcome::Ignored;
        }
        if !session.is_open() {
            return self.discard(session, "session closed before dispatch");
        }

        let decision = self.route(input).await;
        info!(
            session = %session.id(),
            action = ?decision.suggested_action,
            confidence = decision.confidence,
            reason = %decision.reason,
            "routing input"
        );

        match decision.suggested_action {
            SuggestedAction::ExecuteShell => self.run_shell(&decision, session).await,
            SuggestedAction::SendToAI => self.run_ai(&decision, session).await,
            SuggestedAction::AskUser => DispatchOutcome::Ignored,
        }
    }

    /// Primary classifier under the classification budget, fallback heuristic otherwise.
    async fn route(&self, input: &str) -> RoutingDecision {
        let failure = match timeout(self.config.classify_timeout(), self.classifier.classify(input)).await {
            Ok(Ok(decision)) => return decision,
            Ok(Err(e)) => DispatchError::ClassificationService(e.to_string()),
            Err(_) => DispatchError::ClassificationService(format!(
                "no decision within {}ms",
                self.config.classify_timeout_ms
            )),
        };
        warn!(error = %failure, "using fallback heuristic");
        self.stats.record_fallback();
        self.fallback.classify(input)
    }

    async fn run_shell(&self, decision: &RoutingDecision, session: &Session) -> DispatchOutcome {
        let command = decision.dispatch_text().unwrap_or_default();

        let Some(handle) = session.shell_handle() else {
            let err = DispatchError::ShellUnavailable;
            warn!(session = %session.id(), command, "no shell attached");
            let turn = ConversationTurn::assistant_error(format!(
                "No shell is available in this tab yet, so `{}` was not run.",
                command
            ));
            return self.fail(session, err, command, turn);
        };

        if decision.confidence < self.config.low_confidence_threshold {
            self.stats.record_low_confidence();
            info!(
                command,
                confidence = decision.confidence,
                "running low-confidence shell decision"
            );
        }

        if !session.is_open() {
            return self.discard(session, "session closed before shell write");
        }

        let payload = format!("{}{}", command, self.config.line_terminator);
        match self.shell.write(&handle, payload.as_bytes()).await {
            Ok(()) => {
                self.stats.record_shell_write();
                if !session.record_command(command) {
                    debug!(command, "session closed after shell write; history not updated");
                }
                DispatchOutcome::ShellWritten
            }
            Err(e) => {
                let err = DispatchError::ShellWrite {
                    command: command.to_string(),
                    message: e.to_string(),
                };
                warn!(error = %err, "shell write failed");
                let turn = ConversationTurn::assistant_error(format!(
                    "I couldn't run `{}`: {}. Would you like help troubleshooting it?",
                    command, e
                ));
                self.fail(session, err, command, turn)
            }
        }
    }

    async fn run_ai(&self, decision: &RoutingDecision, session: &Session) -> DispatchOutcome {
        let message = decision.dispatch_text().unwrap_or_default();

        let Some(context) = session.read(|ctx| build_context(ctx, decision, self.config.context_commands)) else {
            return self.discard(session, "session closed before assistant request");
        };

        // The user turn lands before the backend is awaited.
        if !session.append_turn(ConversationTurn::user(message, Some(decision.confidence))) {
            return self.discard(session, "session closed before user turn");
        }

        let conversation_id = session.id().to_string();
        let started = Instant::now();
        let reply = timeout(
            self.config.inference_timeout(),
            self.inference.chat(message, &conversation_id, &context),
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match reply {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(DispatchError::Inference { message: e.to_string(), timed_out: false }),
            Err(_) => Err(DispatchError::Inference {
                message: format!("no reply within {}s", self.config.inference_timeout_secs),
                timed_out: true,
            }),
        };

        match result {
            Ok(text) => {
                let turn = ConversationTurn::assistant(text, elapsed_ms, Some(decision.confidence));
                if !session.append_turn(turn) {
                    return self.discard(session, "session closed while assistant was replying");
                }
                self.stats.record_ai_reply();
                debug!(session = %session.id(), elapsed_ms, "assistant replied");
                DispatchOutcome::AiReplied
            }
            Err(err) => {
                warn!(
                    session = %session.id(),
                    error = %err,
                    timed_out = err.is_timeout(),
                    elapsed_ms,
                    "assistant request failed"
                );
                let turn = ConversationTurn::assistant_error(format!(
                    "Sorry, I couldn't get an answer: {}. You can resubmit to try again.",
                    err
                ));
                self.fail(session, err, message, turn)
            }
        }
    }

    fn fail(&self, session: &Session, err: DispatchError, input: &str, turn: ConversationTurn) -> DispatchOutcome {
        if !session.record_failure(ErrorRecord::new(&err, input), turn) {
            return self.discard(session, "session closed before failure was recorded");
        }
        self.stats.record_failure();
        DispatchOutcome::Failed(err)
    }

    pub(crate) fn discard(&self, session: &Session, why: &str) -> DispatchOutcome {
        debug!(session = %session.id(), why, "discarding dispatch");
        self.stats.record_discarded();
        DispatchOutcome::Discarded
    }
}
