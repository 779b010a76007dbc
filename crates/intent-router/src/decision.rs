use serde::{Deserialize, Serialize};

use crate::rules::RuleCategory;

/// What the dispatcher should do with a line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestedAction {
    ExecuteShell,
    SendToAI,
    AskUser,
}

/// The precedence tier that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionTier {
    Empty,
    AiTrigger,
    HighPriorityShell,
    Vocabulary,
    ShellSyntax,
    CapabilityProbe,
    Heuristic,
    Fallback,
}

/// Immutable result of classifying one line of input.
///
/// `suggested_action` is `AskUser` exactly when the input was blank; in every
/// other case it mirrors `is_shell_command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub is_shell_command: bool,
    pub confidence: f32,
    pub reason: String,
    pub suggested_action: SuggestedAction,
    pub normalized_input: Option<String>,
    pub tier: DecisionTier,
    pub category: Option<RuleCategory>,
}

impl RoutingDecision {
    pub fn ask_user() -> Self {
        Self {
            is_shell_command: false,
            confidence: 0.0,
            reason: "empty input".to_string(),
            suggested_action: SuggestedAction::AskUser,
            normalized_input: None,
            tier: DecisionTier::Empty,
            category: None,
        }
    }

    pub fn shell(
        input: &str,
        confidence: f32,
        reason: impl Into<String>,
        tier: DecisionTier,
        category: Option<RuleCategory>,
    ) -> Self {
        Self {
            is_shell_command: true,
            confidence: clamp_confidence(confidence),
            reason: reason.into(),
            suggested_action: SuggestedAction::ExecuteShell,
            normalized_input: Some(input.trim().to_string()),
            tier,
            category,
        }
    }

    pub fn ai(
        input: &str,
        confidence: f32,
        reason: impl Into<String>,
        tier: DecisionTier,
        category: Option<RuleCategory>,
    ) -> Self {
        Self {
            is_shell_command: false,
            confidence: clamp_confidence(confidence),
            reason: reason.into(),
            suggested_action: SuggestedAction::SendToAI,
            normalized_input: Some(input.trim().to_string()),
            tier,
            category,
        }
    }

    /// The text to dispatch. Blank decisions dispatch nothing.
    pub fn dispatch_text(&self) -> Option<&str> {
        self.normalized_input.as_deref()
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= HIGH_CONFIDENCE
    }
}

/// Boundary between a confident decision and one worth an advisory.
pub const HIGH_CONFIDENCE: f32 = 0.8;

fn clamp_confidence(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_mirrors_shell_flag() {
        let shell = RoutingDecision::shell("  ls  ", 0.9, "listing", DecisionTier::HighPriorityShell, None);
        assert!(shell.is_shell_command);
        assert_eq!(shell.suggested_action, SuggestedAction::ExecuteShell);
        assert_eq!(shell.dispatch_text(), Some("ls"));

        let ai = RoutingDecision::ai("why?", 0.95, "question", DecisionTier::AiTrigger, None);
        assert!(!ai.is_shell_command);
        assert_eq!(ai.suggested_action, SuggestedAction::SendToAI);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let d = RoutingDecision::shell("sudo ls", 1.3, "sudo", DecisionTier::HighPriorityShell, None);
        assert_eq!(d.confidence, 1.0);
    }

    #[test]
    fn test_ask_user_has_no_dispatch_text() {
        let d = RoutingDecision::ask_user();
        assert_eq!(d.confidence, 0.0);
        assert!(d.dispatch_text().is_none());
        assert!(!d.is_high_confidence());
    }
}
