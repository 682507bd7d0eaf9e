//! System prompts for the planning stages.

use super::{Candidate, KitchenContext};

/// Build the kitchen state report fed to the chef stage.
///
/// This is the stage-1 context payload: available produce, forbidden meals
/// from the variety window, and standing preferences, in one block of text.
pub fn build_kitchen_state(ctx: &KitchenContext) -> String {
    let available = if ctx.available.is_empty() {
        "  (none — no vegetables bought recently)".to_string()
    } else {
        ctx.available
            .iter()
            .map(|item| format!("  - {}", item.summary()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let forbidden = if ctx.forbidden.is_empty() {
        "  (none)".to_string()
    } else {
        ctx.forbidden
            .iter()
            .map(|name| format!("  - {}", name))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let preferences = if ctx.preferences.is_empty() {
        "  (none)".to_string()
    } else {
        ctx.preferences
            .iter()
            .map(|(key, value)| format!("  - {}: {}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"## Kitchen State

### Available Vegetables
{available}

### Forbidden Meals (suggested in the last {window} days)
{forbidden}

### Family Preferences
{preferences}
"#,
        available = available,
        window = ctx.window_days,
        forbidden = forbidden,
        preferences = preferences,
    )
}

/// System prompt for the candidate generation stage
pub fn chef_system_prompt() -> String {
    format!(
        r#"You are the Creative Chef for a family kitchen.

You receive a Kitchen State report and must propose exactly {count} distinct lunch options.

## Constraint Checklist
1. Each option MUST use at least one listed Available Vegetable.
2. An option MUST NOT be a Forbidden Meal (recently suggested).
3. Respect every Family Preference (e.g. a "no seafood" preference rules out fish).

## Output Format
Reply with exactly {count} numbered lines and nothing else:
1. [Meal Name] - [Main Vegetable] - [Reason]
2. [Meal Name] - [Main Vegetable] - [Reason]
3. [Meal Name] - [Main Vegetable] - [Reason]
"#,
        count = super::CANDIDATE_COUNT,
    )
}

/// System prompt for the selection stage
pub const DECISION_SYSTEM_PROMPT: &str = r#"You are the Final Decision Maker for a family kitchen.

You receive a short list of lunch candidates. Pick the SINGLE best option:
prefer the one that uses the most perishable ingredient, or a family favorite.

Reply with the meal name only, copied exactly from the list. No commentary."#;

/// Build the user message for the selection stage
pub fn build_decision_prompt(candidates: &[Candidate]) -> String {
    let list = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {} - {} - {}", i + 1, c.name, c.main_ingredient, c.reason))
        .collect::<Vec<_>>()
        .join("\n");

    format!("Today's candidates:\n{}\n\nWhich one should we cook?", list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_kitchen_state_lists_sections() {
        let mut preferences = BTreeMap::new();
        preferences.insert("no_seafood".to_string(), "true".to_string());

        let ctx = KitchenContext {
            available: vec![],
            forbidden: vec!["Lentil Soup".to_string()],
            preferences,
            window_days: 14,
        };

        let state = build_kitchen_state(&ctx);
        assert!(state.contains("no vegetables bought recently"));
        assert!(state.contains("- Lentil Soup"));
        assert!(state.contains("no_seafood: true"));
        assert!(state.contains("last 14 days"));
    }

    #[test]
    fn test_decision_prompt_numbers_candidates() {
        let candidates = vec![
            Candidate {
                name: "Palak Paneer".to_string(),
                main_ingredient: "Spinach".to_string(),
                reason: "spinach is about to wilt".to_string(),
            },
            Candidate {
                name: "Bhindi Masala".to_string(),
                main_ingredient: "Okra".to_string(),
                reason: "family favorite".to_string(),
            },
        ];

        let prompt = build_decision_prompt(&candidates);
        assert!(prompt.contains("1. Palak Paneer"));
        assert!(prompt.contains("2. Bhindi Masala"));
    }
}
