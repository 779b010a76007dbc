use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use intent_router::{
    CapabilityProbe, ClassificationError, DecisionTier, FallbackHeuristic, IntentClassifier,
    RuleCategory, SuggestedAction,
};

struct StubProbe {
    known: HashSet<&'static str>,
    calls: AtomicUsize,
}

impl StubProbe {
    fn new(known: &[&'static str]) -> Self {
        Self { known: known.iter().copied().collect(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl CapabilityProbe for StubProbe {
    async fn resolves(&self, token: &str) -> anyhow::Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.known.contains(token))
    }
}

struct BrokenProbe;

#[async_trait]
impl CapabilityProbe for BrokenProbe {
    async fn resolves(&self, _token: &str) -> anyhow::Result<bool> {
        Err(anyhow!("PATH lookup failed"))
    }
}

#[test]
fn test_known_commands_route_to_shell() {
    let classifier = IntentClassifier::new();
    let inputs = vec![
        "ls",
        "pwd",
        "git status",
        "docker ps",
        "cd ..",
        "ls -la",
        "sudo apt update",
        "kubectl get pods",
        "npm install",
        "cat README.md",
        "grep -r TODO src",
        "curl https://example.com",
        "export PATH=$HOME/bin:$PATH",
        "brew install jq",
        "mkdir build",
        "kill 1234",
        "tar -czf out.tgz dist",
    ];

    for input in inputs {
        let d = classifier.classify(input);
        assert!(d.is_shell_command, "expected shell for '{}': {}", input, d.reason);
        assert_eq!(d.suggested_action, SuggestedAction::ExecuteShell);
        assert!(d.confidence >= 0.8, "low confidence {} for '{}'", d.confidence, input);
    }
}

#[test]
fn test_natural_language_routes_to_ai() {
    let classifier = IntentClassifier::new();
    let inputs = vec![
        "how do I use git?",
        "what is docker?",
        "can you list my files",
        "please help me debug this",
        "why does ls hang on network drives",
        "explain git rebase",
        "help me write a docker compose file",
        "Could you run the tests",
        "git status?",
        "ls?",
        "What's using port 8080",
        "hello there",
    ];

    for input in inputs {
        let d = classifier.classify(input);
        assert!(!d.is_shell_command, "expected AI for '{}': {}", input, d.reason);
        assert_eq!(d.suggested_action, SuggestedAction::SendToAI);
        assert_eq!(d.tier, DecisionTier::AiTrigger, "wrong tier for '{}'", input);
        assert!(d.confidence >= 0.8);
    }
}

#[test]
fn test_blank_input_asks_user() {
    let classifier = IntentClassifier::new();
    for input in ["", "   ", "\t\n"] {
        let d = classifier.classify(input);
        assert_eq!(d.suggested_action, SuggestedAction::AskUser);
        assert_eq!(d.confidence, 0.0);
        assert!(d.normalized_input.is_none());
    }
}

#[test]
fn test_generic_shell_syntax() {
    let classifier = IntentClassifier::new();
    let inputs = vec![
        "./configure --prefix=/opt",
        "/usr/local/bin/tool",
        "~/scripts/deploy.sh",
        "RUST_LOG=debug some-binary",
        "frob widgets > widgets.txt",
        "frob widgets | wc -l",
        "frob && frob again",
    ];

    for input in inputs {
        let d = classifier.classify(input);
        assert_eq!(d.tier, DecisionTier::ShellSyntax, "wrong tier for '{}'", input);
        assert_eq!(d.category, Some(RuleCategory::GenericSyntax));
        assert!((d.confidence - 0.75).abs() < 1e-6);
    }
}

#[test]
fn test_sync_classification_is_idempotent() {
    let classifier = IntentClassifier::new();
    for input in ["git status", "what is docker?", "frobnicate", "", "a much longer sentence with many words in it"] {
        assert_eq!(classifier.classify(input), classifier.classify(input));
    }
}

#[tokio::test]
async fn test_probe_tier_only_runs_after_rules_miss() {
    let stub = Arc::new(StubProbe::new(&["terraformer"]));
    let classifier = IntentClassifier::with_probe(stub.clone());

    let d = classifier.classify_async("ls -la").await.unwrap();
    assert_eq!(d.tier, DecisionTier::HighPriorityShell);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

    let d = classifier.classify_async("terraformer plan").await.unwrap();
    assert_eq!(d.tier, DecisionTier::CapabilityProbe);
    assert!(d.is_shell_command);
    assert!((d.confidence - 0.85).abs() < 1e-6);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unresolved_probe_falls_through_to_heuristic() {
    let classifier = IntentClassifier::with_probe(StubProbe::new(&[]));
    let d = classifier
        .classify_async("summarize the changes from this morning for the standup")
        .await
        .unwrap();
    assert_eq!(d.tier, DecisionTier::Heuristic);
    assert!(!d.is_shell_command);
}

#[tokio::test]
async fn test_async_matches_sync_when_probe_disabled() {
    let classifier = IntentClassifier::new();
    for input in ["git status", "how do I use git?", "frobnicate --all", "   "] {
        let sync = classifier.classify(input);
        let async_ = classifier.classify_async(input).await.unwrap();
        assert_eq!(sync, async_);
    }
}

#[tokio::test]
async fn test_probe_failure_is_reported() {
    let classifier = IntentClassifier::with_probe(BrokenProbe);
    let err = classifier.classify_async("frobnicate").await.unwrap_err();
    assert!(matches!(err, ClassificationError::ProbeFailed { ref token, .. } if token == "frobnicate"));

    // Rule hits never reach the probe.
    assert!(classifier.classify_async("git status").await.is_ok());
}

#[test]
fn test_fallback_agrees_with_rule_tiers() {
    let classifier = IntentClassifier::new();
    let fallback = FallbackHeuristic::new();
    let inputs = vec![
        // AI triggers
        "what is docker?",
        "how do I use git?",
        "will you",
        "hello",
        "hi there",
        "hey",
        "thanks",
        "please help me debug this",
        "teach me rust",
        "walk me through git",
        // High-priority shell
        "ls -la",
        "sudo apt update",
        "git status",
        "docker ps",
        // Vocabulary, one per category
        "uname -a",
        "make release",
        "mkdir build",
        "brew install jq",
        "cat notes.txt",
        "rsync -a a b",
        "unset HOME",
        "unzip bundle.zip",
        // Syntax and heuristic
        "./build.sh",
        "FOO=1 run",
        "frobnicate",
        "frobnicate --all",
        "summarize the changes from this morning for the standup",
    ];

    for input in inputs {
        let primary = classifier.classify(input);
        let reduced = fallback.classify(input);
        assert_eq!(primary.is_shell_command, reduced.is_shell_command, "fallback disagrees for '{}'", input);
        assert_eq!(primary.category, reduced.category, "category differs for '{}'", input);
        assert!((primary.confidence - reduced.confidence).abs() < 1e-6, "confidence differs for '{}'", input);
        assert_eq!(reduced.tier, DecisionTier::Fallback);
        assert_eq!(reduced.reason, format!("fallback: {}", primary.reason));
    }
}

#[tokio::test]
async fn test_failed_classification_degrades_to_fallback() {
    let classifier = IntentClassifier::with_probe(BrokenProbe);

    let d = classifier.classify_or_fallback("frobnicate widgets").await;
    assert_eq!(d.tier, DecisionTier::Fallback);
    assert!(d.is_shell_command);
    assert!(d.reason.starts_with("fallback: "));

    let d = classifier.classify_or_fallback("git status").await;
    assert_eq!(d.tier, DecisionTier::HighPriorityShell);
}

#[test]
fn test_decision_serializes() {
    let d = IntentClassifier::new().classify("docker ps");
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json["suggested_action"], "ExecuteShell");
    assert_eq!(json["normalized_input"], "docker ps");
}
