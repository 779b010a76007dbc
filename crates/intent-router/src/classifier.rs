use tracing::{debug, warn};

use crate::decision::{DecisionTier, RoutingDecision};
use crate::error::ClassificationError;
use crate::fallback::FallbackHeuristic;
use crate::probe::{CapabilityProbe, NoProbe};
use crate::rules::{InputView, RuleCategory, RuleTable};

const AI_TRIGGER_CONFIDENCE: f32 = 0.95;
const HIGH_PRIORITY_BASE: f32 = 0.9;
const VOCABULARY_BASE: f32 = 0.8;
const SYNTAX_CONFIDENCE: f32 = 0.75;
const PROBE_CONFIDENCE: f32 = 0.85;
const SHORT_INPUT_CONFIDENCE: f32 = 0.6;
const SHORT_FLAGGED_CONFIDENCE: f32 = 0.7;
const PROSE_CONFIDENCE: f32 = 0.8;

const SHORT_MAX_TOKENS: usize = 3;
const SHORT_MAX_CHARS: usize = 40;

/// Scores a line of input as shell command or AI request.
///
/// Tiers are consulted in a fixed order and the first match wins:
/// AI triggers, high-priority shell commands, categorized vocabulary,
/// generic shell syntax, the capability probe (async path only), and finally
/// a length heuristic. The classifier holds no mutable state, so `classify`
/// returns identical decisions for identical input.
pub struct IntentClassifier<P: CapabilityProbe = NoProbe> {
    rules: &'static RuleTable,
    probe: P,
}

impl IntentClassifier<NoProbe> {
    pub fn new() -> Self {
        Self::with_probe(NoProbe)
    }
}

impl Default for IntentClassifier<NoProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: CapabilityProbe> IntentClassifier<P> {
    pub fn with_probe(probe: P) -> Self {
        Self { rules: RuleTable::standard(), probe }
    }

    pub fn rules(&self) -> &RuleTable {
        self.rules
    }

    /// Fast path: tiers 1-4 and 6. Never suspends.
    pub fn classify(&self, input: &str) -> RoutingDecision {
        let Some(view) = InputView::parse(input) else {
            return RoutingDecision::ask_user();
        };
        let decision = match_rules(self.rules, &view).unwrap_or_else(|| heuristic(&view));
        debug!(tier = ?decision.tier, confidence = decision.confidence, "classified input");
        decision
    }

    /// Thorough path: like `classify`, but asks the capability probe about the
    /// leading token before falling back to the length heuristic.
    pub async fn classify_async(&self, input: &str) -> Result<RoutingDecision, ClassificationError> {
        let Some(view) = InputView::parse(input) else {
            return Ok(RoutingDecision::ask_user());
        };
        if let Some(decision) = match_rules(self.rules, &view) {
            debug!(tier = ?decision.tier, confidence = decision.confidence, "classified input");
            return Ok(decision);
        }

        if self.probe.is_enabled() {
            let token = view.first_token();
            let resolved = self
                .probe
                .resolves(token)
                .await
                .map_err(|e| ClassificationError::ProbeFailed {
                    token: token.to_string(),
                    message: e.to_string(),
                })?;
            if resolved {
                debug!(token, "capability probe resolved leading token");
                return Ok(RoutingDecision::shell(
                    view.raw(),
                    PROBE_CONFIDENCE,
                    format!("'{}' resolves to an executable", token),
                    DecisionTier::CapabilityProbe,
                    None,
                ));
            }
        }

        let decision = heuristic(&view);
        debug!(tier = ?decision.tier, confidence = decision.confidence, "classified input");
        Ok(decision)
    }

    /// `classify_async`, degrading to the fallback heuristic on error.
    pub async fn classify_or_fallback(&self, input: &str) -> RoutingDecision {
        match self.classify_async(input).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "classification failed; using fallback heuristic");
                FallbackHeuristic::new().classify(input)
            }
        }
    }
}

/// Tiers 1-4, consulted strictly in order.
pub(crate) fn match_rules(rules: &RuleTable, view: &InputView<'_>) -> Option<RoutingDecision> {
    if let Some(hit) = RuleTable::first_hit(rules.ai_triggers(), view) {
        return Some(RoutingDecision::ai(
            view.raw(),
            AI_TRIGGER_CONFIDENCE,
            format!("natural-language {} '{}'", hit.rule.name, hit.evidence),
            DecisionTier::AiTrigger,
            Some(RuleCategory::AiTrigger),
        ));
    }

    if let Some(hit) = RuleTable::first_hit(rules.high_priority(), view) {
        return Some(RoutingDecision::shell(
            view.raw(),
            HIGH_PRIORITY_BASE + f32::from(hit.rule.priority) / 100.0,
            format!("{} '{}'", hit.rule.name, hit.evidence),
            DecisionTier::HighPriorityShell,
            Some(RuleCategory::HighPriorityShell),
        ));
    }

    if let Some(hit) = RuleTable::first_hit(rules.vocabulary(), view) {
        return Some(RoutingDecision::shell(
            view.raw(),
            VOCABULARY_BASE + f32::from(hit.rule.category.priority()) / 100.0,
            format!("known {} command '{}'", hit.rule.category.label(), hit.evidence),
            DecisionTier::Vocabulary,
            Some(hit.rule.category),
        ));
    }

    if let Some(hit) = RuleTable::first_hit(rules.syntax(), view) {
        return Some(RoutingDecision::shell(
            view.raw(),
            SYNTAX_CONFIDENCE,
            format!("shell syntax: {} '{}'", hit.rule.name, hit.evidence),
            DecisionTier::ShellSyntax,
            Some(RuleCategory::GenericSyntax),
        ));
    }

    None
}

/// Tier 6: short inputs lean shell, everything else leans AI.
pub(crate) fn heuristic(view: &InputView<'_>) -> RoutingDecision {
    let short = view.token_count() <= SHORT_MAX_TOKENS
        && view.char_count() < SHORT_MAX_CHARS
        && !view.has_question_mark();
    if short {
        let (confidence, reason) = if view.has_flag() {
            (SHORT_FLAGGED_CONFIDENCE, "short input with command-line flags")
        } else {
            (SHORT_INPUT_CONFIDENCE, "short input without natural-language cues")
        };
        RoutingDecision::shell(view.raw(), confidence, reason, DecisionTier::Heuristic, None)
    } else {
        RoutingDecision::ai(
            view.raw(),
            PROSE_CONFIDENCE,
            "longer free-form text",
            DecisionTier::Heuristic,
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::SuggestedAction;

    #[test]
    fn test_ai_trigger_beats_command_name() {
        let c = IntentClassifier::new();
        let d = c.classify("how do I use git?");
        assert!(!d.is_shell_command);
        assert_eq!(d.tier, DecisionTier::AiTrigger);
        assert!((d.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_high_priority_confidence_includes_priority() {
        let c = IntentClassifier::new();
        let d = c.classify("ls -la");
        assert_eq!(d.tier, DecisionTier::HighPriorityShell);
        assert!((d.confidence - 0.95).abs() < 1e-6);

        let d = c.classify("git status");
        assert_eq!(d.tier, DecisionTier::HighPriorityShell);
        assert!((d.confidence - 0.93).abs() < 1e-6);
    }

    #[test]
    fn test_vocabulary_confidence_uses_category_priority() {
        let c = IntentClassifier::new();
        let d = c.classify("tar -xzf release.tgz");
        assert_eq!(d.category, Some(RuleCategory::ArchiveOps));
        assert!((d.confidence - 0.82).abs() < 1e-6);
    }

    #[test]
    fn test_heuristic_short_and_long() {
        let c = IntentClassifier::new();
        let d = c.classify("frobnicate --all");
        assert_eq!(d.tier, DecisionTier::Heuristic);
        assert!(d.is_shell_command);
        assert!((d.confidence - 0.7).abs() < 1e-6);

        let d = c.classify("frobnicate widgets");
        assert!((d.confidence - 0.6).abs() < 1e-6);

        let d = c.classify("refactor the login module so it uses async handlers");
        assert!(!d.is_shell_command);
        assert_eq!(d.suggested_action, SuggestedAction::SendToAI);
    }

    #[test]
    fn test_normalized_input_keeps_case() {
        let c = IntentClassifier::new();
        let d = c.classify("  LS -la  ");
        assert!(d.is_shell_command);
        assert_eq!(d.normalized_input.as_deref(), Some("LS -la"));
    }
}
