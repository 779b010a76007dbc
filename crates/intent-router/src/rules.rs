//! The rule table: ordered, categorized lexical triggers and syntax patterns.
//!
//! Precedence between tiers is fixed by the classifier. Within a tier, rules
//! are tried in table order and the first hit wins. `priority` only adjusts
//! confidence.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    AiTrigger,
    HighPriorityShell,
    FileOps,
    TextOps,
    SystemOps,
    NetworkOps,
    PackageOps,
    DevTools,
    ArchiveOps,
    EnvOps,
    GenericSyntax,
}

impl RuleCategory {
    /// Weight folded into vocabulary-tier confidence.
    pub fn priority(self) -> u8 {
        match self {
            RuleCategory::SystemOps => 9,
            RuleCategory::DevTools => 8,
            RuleCategory::FileOps => 7,
            RuleCategory::PackageOps => 6,
            RuleCategory::TextOps => 5,
            RuleCategory::NetworkOps => 4,
            RuleCategory::EnvOps => 3,
            RuleCategory::ArchiveOps => 2,
            RuleCategory::AiTrigger | RuleCategory::HighPriorityShell | RuleCategory::GenericSyntax => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RuleCategory::AiTrigger => "ai-trigger",
            RuleCategory::HighPriorityShell => "high-priority-shell",
            RuleCategory::FileOps => "file-ops",
            RuleCategory::TextOps => "text-ops",
            RuleCategory::SystemOps => "system-ops",
            RuleCategory::NetworkOps => "network-ops",
            RuleCategory::PackageOps => "package-ops",
            RuleCategory::DevTools => "dev-tools",
            RuleCategory::ArchiveOps => "archive-ops",
            RuleCategory::EnvOps => "env-ops",
            RuleCategory::GenericSyntax => "generic-syntax",
        }
    }
}

/// Lookup order of the categorized vocabulary tier.
pub const VOCABULARY_ORDER: [RuleCategory; 8] = [
    RuleCategory::SystemOps,
    RuleCategory::DevTools,
    RuleCategory::FileOps,
    RuleCategory::PackageOps,
    RuleCategory::TextOps,
    RuleCategory::NetworkOps,
    RuleCategory::EnvOps,
    RuleCategory::ArchiveOps,
];

const QUESTION_WORDS: &[&str] = &[
    "what", "how", "why", "when", "where", "who", "whom", "whose", "is", "are", "was", "were",
    "does", "do", "did", "can", "could", "would", "should", "will", "shall", "may", "might",
];

const CONVERSATIONAL_OPENERS: &[&str] = &[
    "please", "explain", "describe", "tell", "hi", "hello", "hey", "thanks", "thank",
];

const HELP_PHRASES: &[&str] = &[
    "help me", "can you", "could you", "would you", "will you", "i want", "i need", "i'd like",
    "i would like", "how do i", "how to", "show me how", "tell me", "walk me through", "teach me",
];

const HIGH_PRIORITY_COMMANDS: &[&str] = &[
    "ls", "ll", "la", "pwd", "cd", "ps", "top", "htop", "clear", "whoami", "history", "exit",
];

const PRIVILEGE_PREFIXES: &[&str] = &["sudo", "doas"];

const DEV_TOOL_PREFIXES: &[&str] = &[
    "git", "docker", "docker-compose", "kubectl", "npm", "npx", "yarn", "pnpm", "cargo", "pip",
    "pip3", "python", "python3", "node",
];

const SYSTEM_OPS: &[&str] = &[
    "ps", "top", "htop", "kill", "killall", "pkill", "df", "du", "free", "uname", "uptime",
    "whoami", "id", "systemctl", "service", "journalctl", "shutdown", "reboot", "lsof", "dmesg",
    "mount", "umount", "crontab", "chmod", "chown", "chgrp", "jobs", "fg", "bg", "nohup", "which",
    "whereis", "man", "sudo", "su", "watch", "date", "hostname",
];

const DEV_TOOLS: &[&str] = &[
    "git", "gh", "docker", "docker-compose", "podman", "kubectl", "helm", "terraform", "ansible",
    "npm", "npx", "yarn", "pnpm", "node", "deno", "bun", "python", "python3", "pip", "pip3",
    "cargo", "rustc", "rustup", "make", "cmake", "gcc", "g++", "clang", "javac", "java", "mvn",
    "gradle", "ruby", "gem", "bundle", "rails", "php", "composer", "vim", "nvim", "vi", "nano",
    "emacs", "code",
];

const FILE_OPS: &[&str] = &[
    "ls", "cd", "pwd", "cp", "mv", "rm", "mkdir", "rmdir", "touch", "ln", "find", "locate", "tree",
    "stat", "realpath", "basename", "dirname",
];

const PACKAGE_OPS: &[&str] = &[
    "apt", "apt-get", "apt-cache", "dpkg", "yum", "dnf", "rpm", "pacman", "yay", "brew", "snap",
    "flatpak", "zypper", "apk", "port", "nix", "nix-env",
];

const TEXT_OPS: &[&str] = &[
    "cat", "less", "head", "tail", "grep", "egrep", "fgrep", "rg", "ag", "sed", "awk", "sort",
    "uniq", "wc", "cut", "tr", "diff", "echo", "printf", "tee", "xargs", "jq", "column", "nl",
    "bat",
];

const NETWORK_OPS: &[&str] = &[
    "curl", "wget", "ping", "ssh", "scp", "sftp", "rsync", "ftp", "telnet", "nc", "netcat",
    "netstat", "ss", "ifconfig", "ip", "dig", "nslookup", "traceroute", "nmap",
];

const ENV_OPS: &[&str] = &["export", "unset", "env", "printenv", "source", "alias", "unalias"];

const ARCHIVE_OPS: &[&str] = &[
    "tar", "zip", "unzip", "gzip", "gunzip", "bzip2", "bunzip2", "xz", "unxz", "7z", "rar",
    "unrar", "zstd",
];

const PATH_PREFIXES: &[&str] = &["./", "../", "/", "~/"];

const CHAIN_OPERATORS: &[&str] = &["|", "&&", ";"];

static ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").expect("assignment pattern is valid"));

static STANDARD: Lazy<RuleTable> = Lazy::new(RuleTable::build);

/// Pre-tokenized view of one trimmed, non-empty line of input.
#[derive(Debug, Clone)]
pub struct InputView<'a> {
    raw: &'a str,
    lower: String,
    tokens: Vec<&'a str>,
    words: Vec<String>,
}

impl<'a> InputView<'a> {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(input: &'a str) -> Option<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return None;
        }
        let lower = raw.to_lowercase();
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let words = tokens.iter().map(|t| bare_word(&t.to_lowercase())).collect();
        Some(Self { raw, lower, tokens, words })
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }

    /// First whitespace-delimited token, case preserved.
    pub fn first_token(&self) -> &'a str {
        self.tokens.first().copied().unwrap_or(self.raw)
    }

    /// First token lower-cased, punctuation untouched.
    pub fn command_word(&self) -> String {
        self.first_token().to_lowercase()
    }

    /// First word lower-cased with trailing punctuation and contractions removed.
    pub fn leading_word(&self) -> &str {
        self.words.first().map(String::as_str).unwrap_or("")
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn char_count(&self) -> usize {
        self.raw.chars().count()
    }

    pub fn has_question_mark(&self) -> bool {
        self.raw.contains('?')
    }

    pub fn has_flag(&self) -> bool {
        self.tokens.iter().any(|t| t.len() > 1 && t.starts_with('-'))
    }

    fn contains_phrase(&self, phrase: &str) -> bool {
        let needle: Vec<&str> = phrase.split(' ').collect();
        if needle.is_empty() || needle.len() > self.words.len() {
            return false;
        }
        self.words
            .windows(needle.len())
            .any(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
    }
}

/// "what's" -> "what", "hello," -> "hello", "i'd" -> "i'd" is kept for phrases.
fn bare_word(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .trim_end_matches("'s")
        .trim_end_matches('\'')
        .to_string()
}

/// How a rule recognizes input.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// First token, lower-cased, is one of the words.
    FirstToken(&'static [&'static str]),
    /// First token is one of the words and at least one argument follows.
    CommandPrefix(&'static [&'static str]),
    /// First word, with punctuation and contractions stripped, is one of the words.
    LeadingWord(&'static [&'static str]),
    /// One of the phrases appears as a run of whole words.
    Phrase(&'static [&'static str]),
    QuestionMark,
    /// Input starts with path syntax.
    PathPrefix(&'static [&'static str]),
    /// First token has the shape `NAME=value`.
    Assignment,
    /// A token begins with a redirection operator.
    Redirection,
    /// Input contains a pipe or chaining operator.
    Operator(&'static [&'static str]),
}

impl Matcher {
    /// Returns the matched evidence, used to build the decision reason.
    pub fn find(&self, view: &InputView<'_>) -> Option<String> {
        match self {
            Matcher::FirstToken(words) => {
                let first = view.command_word();
                words.iter().find(|w| **w == first).map(|w| w.to_string())
            }
            Matcher::CommandPrefix(words) => {
                if view.token_count() < 2 {
                    return None;
                }
                let first = view.command_word();
                words.iter().find(|w| **w == first).map(|w| format!("{} ...", w))
            }
            Matcher::LeadingWord(words) => {
                let leading = view.leading_word();
                words.iter().find(|w| **w == leading).map(|w| w.to_string())
            }
            Matcher::Phrase(phrases) => phrases
                .iter()
                .find(|p| view.contains_phrase(p))
                .map(|p| p.to_string()),
            Matcher::QuestionMark => view.has_question_mark().then(|| "?".to_string()),
            Matcher::PathPrefix(prefixes) => prefixes
                .iter()
                .find(|p| view.raw().starts_with(**p))
                .map(|p| p.to_string()),
            Matcher::Assignment => ASSIGNMENT
                .find(view.first_token())
                .map(|m| m.as_str().to_string()),
            Matcher::Redirection => view
                .tokens()
                .iter()
                .find(|t| is_redirection(t))
                .map(|t| t.to_string()),
            Matcher::Operator(ops) => ops
                .iter()
                .find(|op| view.raw().contains(**op))
                .map(|op| op.to_string()),
        }
    }
}

fn is_redirection(token: &str) -> bool {
    let token = token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '&');
    token.starts_with('>') || token.starts_with('<')
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub category: RuleCategory,
    pub priority: u8,
}

impl PatternRule {
    const fn new(name: &'static str, matcher: Matcher, category: RuleCategory, priority: u8) -> Self {
        Self { name, matcher, category, priority }
    }

    pub fn matches(&self, view: &InputView<'_>) -> Option<String> {
        self.matcher.find(view)
    }
}

/// A rule that fired, together with what it matched.
#[derive(Debug, Clone)]
pub struct RuleHit<'r> {
    pub rule: &'r PatternRule,
    pub evidence: String,
}

/// Immutable, process-wide rule table.
#[derive(Debug)]
pub struct RuleTable {
    ai_triggers: Vec<PatternRule>,
    high_priority: Vec<PatternRule>,
    vocabulary: Vec<PatternRule>,
    syntax: Vec<PatternRule>,
}

impl RuleTable {
    /// The built-in table, constructed on first use.
    pub fn standard() -> &'static RuleTable {
        &STANDARD
    }

    fn build() -> Self {
        let ai_triggers = vec![
            PatternRule::new("question word", Matcher::LeadingWord(QUESTION_WORDS), RuleCategory::AiTrigger, 3),
            PatternRule::new("conversational opener", Matcher::LeadingWord(CONVERSATIONAL_OPENERS), RuleCategory::AiTrigger, 2),
            PatternRule::new("help phrase", Matcher::Phrase(HELP_PHRASES), RuleCategory::AiTrigger, 2),
            PatternRule::new("question mark", Matcher::QuestionMark, RuleCategory::AiTrigger, 1),
        ];

        let high_priority = vec![
            PatternRule::new("core command", Matcher::FirstToken(HIGH_PRIORITY_COMMANDS), RuleCategory::HighPriorityShell, 5),
            PatternRule::new("privilege prefix", Matcher::CommandPrefix(PRIVILEGE_PREFIXES), RuleCategory::HighPriorityShell, 6),
            PatternRule::new("dev-tool prefix", Matcher::CommandPrefix(DEV_TOOL_PREFIXES), RuleCategory::HighPriorityShell, 3),
        ];

        let vocabulary = VOCABULARY_ORDER
            .iter()
            .map(|category| {
                PatternRule::new(category.label(), Matcher::FirstToken(vocabulary_words(*category)), *category, category.priority())
            })
            .collect();

        let syntax = vec![
            PatternRule::new("path prefix", Matcher::PathPrefix(PATH_PREFIXES), RuleCategory::GenericSyntax, 0),
            PatternRule::new("variable assignment", Matcher::Assignment, RuleCategory::GenericSyntax, 0),
            PatternRule::new("redirection", Matcher::Redirection, RuleCategory::GenericSyntax, 0),
            PatternRule::new("command chaining", Matcher::Operator(CHAIN_OPERATORS), RuleCategory::GenericSyntax, 0),
        ];

        Self { ai_triggers, high_priority, vocabulary, syntax }
    }

    pub fn ai_triggers(&self) -> &[PatternRule] {
        &self.ai_triggers
    }

    pub fn high_priority(&self) -> &[PatternRule] {
        &self.high_priority
    }

    /// Vocabulary rules in `VOCABULARY_ORDER`.
    pub fn vocabulary(&self) -> &[PatternRule] {
        &self.vocabulary
    }

    pub fn syntax(&self) -> &[PatternRule] {
        &self.syntax
    }

    /// First rule in `rules` that matches.
    pub fn first_hit<'r>(rules: &'r [PatternRule], view: &InputView<'_>) -> Option<RuleHit<'r>> {
        rules
            .iter()
            .find_map(|rule| rule.matches(view).map(|evidence| RuleHit { rule, evidence }))
    }

    /// Category a bare command word would be filed under.
    pub fn vocabulary_category(&self, word: &str) -> Option<RuleCategory> {
        let word = word.to_lowercase();
        VOCABULARY_ORDER
            .iter()
            .copied()
            .find(|category| vocabulary_words(*category).contains(&word.as_str()))
    }
}

fn vocabulary_words(category: RuleCategory) -> &'static [&'static str] {
    match category {
        RuleCategory::SystemOps => SYSTEM_OPS,
        RuleCategory::DevTools => DEV_TOOLS,
        RuleCategory::FileOps => FILE_OPS,
        RuleCategory::PackageOps => PACKAGE_OPS,
        RuleCategory::TextOps => TEXT_OPS,
        RuleCategory::NetworkOps => NETWORK_OPS,
        RuleCategory::EnvOps => ENV_OPS,
        RuleCategory::ArchiveOps => ARCHIVE_OPS,
        RuleCategory::AiTrigger | RuleCategory::HighPriorityShell | RuleCategory::GenericSyntax => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(s: &str) -> InputView<'_> {
        InputView::parse(s).unwrap()
    }

    #[test]
    fn test_blank_input_has_no_view() {
        assert!(InputView::parse("").is_none());
        assert!(InputView::parse(" \t\n").is_none());
    }

    #[test]
    fn test_leading_word_strips_contractions() {
        assert_eq!(view("What's up").leading_word(), "what");
        assert_eq!(view("hello, there").leading_word(), "hello");
    }

    #[test]
    fn test_phrase_matches_whole_words_only() {
        let rule = Matcher::Phrase(&["help me"]);
        assert!(rule.find(&view("please help me debug this")).is_some());
        assert!(rule.find(&view("helpme debug")).is_none());
    }

    #[test]
    fn test_command_prefix_requires_argument() {
        let rule = Matcher::CommandPrefix(&["git"]);
        assert!(rule.find(&view("git status")).is_some());
        assert!(rule.find(&view("git")).is_none());
    }

    #[test]
    fn test_syntax_matchers() {
        assert!(Matcher::Assignment.find(&view("RUST_LOG=debug ./run")).is_some());
        assert!(Matcher::Assignment.find(&view("=oops")).is_none());
        assert!(Matcher::Redirection.find(&view("foo bar > out.txt")).is_some());
        assert!(Matcher::Redirection.find(&view("build 2>&1")).is_some());
        assert!(Matcher::Operator(CHAIN_OPERATORS).find(&view("foo | bar")).is_some());
        assert!(Matcher::PathPrefix(PATH_PREFIXES).find(&view("~/bin/tool --x")).is_some());
    }

    #[test]
    fn test_vocabulary_follows_lookup_order() {
        let table = RuleTable::standard();
        let categories: Vec<_> = table.vocabulary().iter().map(|r| r.category).collect();
        assert_eq!(categories, VOCABULARY_ORDER.to_vec());
        // "sudo" is listed under system-ops, which is looked up before anything else.
        assert_eq!(table.vocabulary_category("sudo"), Some(RuleCategory::SystemOps));
        assert_eq!(table.vocabulary_category("tar"), Some(RuleCategory::ArchiveOps));
        assert_eq!(table.vocabulary_category("banana"), None);
    }

    #[test]
    fn test_category_priorities_descend_with_lookup_order() {
        let priorities: Vec<u8> = VOCABULARY_ORDER.iter().map(|c| c.priority()).collect();
        assert!(priorities.windows(2).all(|w| w[0] > w[1]));
    }
}
