//! Reduced classifier used when the primary path is unavailable.
//!
//! Runs the standard rule table tiers and the length heuristic, skipping
//! the capability probe, so it performs no I/O. A fallback decision
//! therefore agrees with the synchronous classifier on routing and only
//! differs in its tier and reason.

use crate::classifier::{heuristic, match_rules};
use crate::decision::{DecisionTier, RoutingDecision};
use crate::rules::{InputView, RuleTable};

/// Stateless fallback classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackHeuristic;

impl FallbackHeuristic {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, input: &str) -> RoutingDecision {
        let Some(view) = InputView::parse(input) else {
            return RoutingDecision::ask_user();
        };
        let mut decision =
            match_rules(RuleTable::standard(), &view).unwrap_or_else(|| heuristic(&view));
        decision.tier = DecisionTier::Fallback;
        decision.reason = format!("fallback: {}", decision.reason);
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::SuggestedAction;
    use crate::rules::RuleCategory;

    #[test]
    fn test_fallback_routes_common_inputs() {
        let f = FallbackHeuristic::new();
        assert!(f.classify("git status").is_shell_command);
        assert!(!f.classify("please help me debug this").is_shell_command);
        assert!(!f.classify("what is docker?").is_shell_command);
        assert!(f.classify("FOO=1 ./run.sh").is_shell_command);
    }

    #[test]
    fn test_fallback_marks_its_tier() {
        let d = FallbackHeuristic::new().classify("ls");
        assert_eq!(d.tier, DecisionTier::Fallback);
        assert!(d.reason.starts_with("fallback: "));
    }

    #[test]
    fn test_fallback_keeps_rule_categories() {
        let f = FallbackHeuristic::new();

        let greeting = f.classify("hello");
        assert!(!greeting.is_shell_command);
        assert_eq!(greeting.category, Some(RuleCategory::AiTrigger));

        let sync = f.classify("rsync -a a b");
        assert!(sync.is_shell_command);
        assert_eq!(sync.category, Some(RuleCategory::NetworkOps));
        assert!(sync.reason.starts_with("fallback: known"));

        assert!(!f.classify("teach me rust").is_shell_command);
        assert!(!f.classify("will you").is_shell_command);
    }

    #[test]
    fn test_fallback_blank_asks_user() {
        let d = FallbackHeuristic::new().classify("\t\n");
        assert_eq!(d.suggested_action, SuggestedAction::AskUser);
    }
}
