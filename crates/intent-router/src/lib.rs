pub mod classifier;
pub mod decision;
pub mod error;
pub mod fallback;
pub mod probe;
pub mod rules;

pub use classifier::IntentClassifier;
pub use decision::{DecisionTier, RoutingDecision, SuggestedAction};
pub use error::ClassificationError;
pub use fallback::FallbackHeuristic;
pub use probe::{CapabilityProbe, NoProbe};
pub use rules::{InputView, Matcher, PatternRule, RuleCategory, RuleTable};
