use intent_router::RoutingDecision;

use crate::session::SessionContext;

/// Context string sent alongside a user message: where the user is, what
/// they ran recently, and why the input was routed to the assistant.
pub fn build_context(ctx: &SessionContext, decision: &RoutingDecision, max_commands: usize) -> String {
    let mut context = String::new();

    context.push_str("Working directory: ");
    context.push_str(&ctx.working_directory.to_string_lossy());
    context.push('\n');

    let commands: Vec<&str> = ctx.last_commands(max_commands).collect();
    if !commands.is_empty() {
        context.push_str(&format!("Recent commands (last {}):\n", commands.len()));
        for (i, cmd) in commands.iter().enumerate() {
            context.push_str(&format!("{}. {}\n", i + 1, cmd));
        }
    }

    context.push_str(&format!(
        "Routing: sent to assistant with confidence {:.2} ({})\n",
        decision.confidence, decision.reason
    ));

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_router::DecisionTier;

    #[test]
    fn test_context_includes_directory_commands_and_reason() {
        let mut ctx = SessionContext::new("/home/dev/project");
        ctx.record_command("cargo build");
        ctx.record_command("cargo test");
        ctx.record_command("git status");
        let decision = RoutingDecision::ai("why did it fail?", 0.95, "question mark '?'", DecisionTier::AiTrigger, None);

        let context = build_context(&ctx, &decision, 2);
        assert!(context.contains("/home/dev/project"));
        assert!(context.contains("1. cargo test"));
        assert!(context.contains("2. git status"));
        assert!(!context.contains("cargo build"));
        assert!(context.contains("confidence 0.95"));
        assert!(context.contains("question mark"));
    }

    #[test]
    fn test_context_without_history() {
        let ctx = SessionContext::new("/");
        let decision = RoutingDecision::ai("hello there", 0.95, "greeting", DecisionTier::AiTrigger, None);
        let context = build_context(&ctx, &decision, 10);
        assert!(!context.contains("Recent commands"));
    }
}
