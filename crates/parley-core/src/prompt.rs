//! Prompt assembly.
//!
//! Turns the per-session history plus the new user message into the single
//! text prompt sent to the daemon's generate endpoint. The format is the
//! plain `Role: content` concatenation that completion-style models expect
//! for multi-turn context.

use crate::history::Turn;

/// Assemble the outbound prompt.
///
/// Layout: optional system prompt followed by a blank line, then the last
/// `window` turns of `history` in chronological order, then the new user
/// line, then a bare `Assistant:` cue so the model continues as the
/// assistant instead of echoing.
///
/// Pure function: identical inputs always produce an identical string.
pub fn assemble(system_prompt: Option<&str>, history: &[Turn], window: usize, user_message: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(system) = system_prompt {
        let system = system.trim();
        if !system.is_empty() {
            parts.push(system.to_owned());
            parts.push(String::new());
        }
    }

    let start = history.len().saturating_sub(window);
    for turn in &history[start..] {
        parts.push(format!("{}: {}", turn.role.label(), turn.content));
    }

    parts.push(format!("User: {user_message}"));
    parts.push("Assistant:".to_owned());

    parts.join("\n")
}

// ── Tests ──────────────────────────────────────────────────────────────────────
