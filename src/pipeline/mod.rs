//! The three-stage suggestion pipeline.
//!
//! Stage 1 merges inventory and memory into a kitchen state report. Stage 2
//! asks the model for candidate meals and enforces the variety constraint on
//! the result. Stage 3 picks one candidate, records it in the memory bank,
//! and hands a formatted message back for notification.
//!
//! Ordering rule: selection and persistence are the last and irrevocable
//! step. Nothing is written unless a non-empty candidate survived filtering.

pub mod prompts;

use crate::error::{Error, PipelineError};
use crate::inventory::{available_produce, InventoryItem};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::memory::{MealRecord, MemoryBank, MemoryStore};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How many candidates the generation stage asks for
pub const CANDIDATE_COUNT: usize = 3;

/// Stage-1 context payload: everything the chef needs to know
#[derive(Debug, Clone)]
pub struct KitchenContext {
    /// Vegetables bought within the variety window
    pub available: Vec<InventoryItem>,
    /// Meal names suggested within the variety window
    pub forbidden: Vec<String>,
    /// Standing family preferences
    pub preferences: BTreeMap<String, String>,
    /// The variety window in days
    pub window_days: i64,
}

/// A meal proposed by the generation stage, not yet selected or persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Meal name
    pub name: String,
    /// The main vegetable it uses
    pub main_ingredient: String,
    /// Why the chef proposed it
    pub reason: String,
}

/// Result of one planner run
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    /// A meal was selected and persisted
    Planned {
        /// The record written to the memory bank
        record: MealRecord,
        /// Formatted notification message
        message: String,
    },
    /// A meal was already recorded for today; the run was a no-op
    AlreadyPlanned {
        /// Today's date
        date: NaiveDate,
        /// The meal already on record
        meal_name: String,
    },
}

/// Sequential orchestrator over the LLM provider and the memory store
pub struct Planner<P: LlmProvider> {
    llm: P,
    store: MemoryStore,
    model: String,
    window_days: i64,
}

impl<P: LlmProvider> Planner<P> {
    /// Create a planner
    pub fn new(llm: P, store: MemoryStore, model: impl Into<String>, window_days: i64) -> Self {
        Self {
            llm,
            store,
            model: model.into(),
            window_days,
        }
    }

    /// Run the full pipeline for `today` against the given inventory.
    ///
    /// Loads the bank, short-circuits if today already has a record, then
    /// runs generation and selection. The memory file is only touched after
    /// a candidate has been selected.
    pub async fn run(
        &self,
        inventory: Vec<InventoryItem>,
        today: NaiveDate,
    ) -> Result<PlanOutcome, Error> {
        let mut bank = self.store.load().await?;

        // A rerun on the same day is harmless; skip before any LLM call.
        if let Some(existing) = bank.records.iter().find(|r| r.date == today) {
            info!(date = %today, meal = %existing.meal_name, "meal already recorded, skipping");
            return Ok(PlanOutcome::AlreadyPlanned {
                date: today,
                meal_name: existing.meal_name.clone(),
            });
        }

        let ctx = self.gather_context(&bank, inventory, today);
        info!(
            available = ctx.available.len(),
            forbidden = ctx.forbidden.len(),
            "kitchen state assembled"
        );

        let candidates = self.generate_candidates(&ctx).await?;
        let selected = self.select_candidate(&candidates).await?;
        info!(meal = %selected.name, "lunch selected");

        let record = MealRecord::new(today, &selected.name).with_tag(&selected.main_ingredient);
        bank.append(record.clone())?;
        self.store.persist(&bank).await?;

        let message = format_notification(&record, &selected.reason);
        Ok(PlanOutcome::Planned { record, message })
    }

    /// Stage 1: combine inventory and memory into the context payload
    fn gather_context(
        &self,
        bank: &MemoryBank,
        inventory: Vec<InventoryItem>,
        today: NaiveDate,
    ) -> KitchenContext {
        let available = available_produce(&inventory, self.window_days, today);
        let forbidden = bank
            .recent_meals(self.window_days, today)
            .into_iter()
            .map(|r| r.meal_name.clone())
            .collect();

        KitchenContext {
            available,
            forbidden,
            preferences: bank.preferences.clone(),
            window_days: self.window_days,
        }
    }

    /// Stage 2: ask the chef for candidates, enforce the variety constraint
    async fn generate_candidates(&self, ctx: &KitchenContext) -> Result<Vec<Candidate>, Error> {
        let request = CompletionRequest::new(&self.model)
            .with_system(prompts::chef_system_prompt())
            .with_message(ChatMessage::user(prompts::build_kitchen_state(ctx)))
            .with_max_tokens(1024)
            .with_temperature(0.7);

        let response = self.llm.complete(request).await?;
        debug!(tokens = response.usage.total(), "chef stage complete");

        let parsed = parse_candidates(&response.text);
        if parsed.is_empty() {
            return Err(PipelineError::EmptyCandidateSet {
                reason: "chef reply contained no parseable candidates".to_string(),
            }
            .into());
        }

        // The constraint is enforced here, not trusted to the model.
        let candidates = filter_candidates(parsed, &ctx.forbidden);
        if candidates.is_empty() {
            return Err(PipelineError::EmptyCandidateSet {
                reason: "every candidate collided with the recent-meal history".to_string(),
            }
            .into());
        }

        Ok(candidates)
    }

    /// Stage 3a: pick exactly one candidate
    async fn select_candidate(&self, candidates: &[Candidate]) -> Result<Candidate, Error> {
        let request = CompletionRequest::new(&self.model)
            .with_system(prompts::DECISION_SYSTEM_PROMPT)
            .with_message(ChatMessage::user(prompts::build_decision_prompt(candidates)))
            .with_max_tokens(128)
            .with_temperature(0.2);

        let response = self.llm.complete(request).await?;
        Ok(match_selection(&response.text, candidates))
    }
}

/// Parse the chef's numbered `name - ingredient - reason` lines.
/// Square brackets around fields are tolerated; the model sees them in the
/// format template and sometimes echoes them.
pub fn parse_candidates(text: &str) -> Vec<Candidate> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let body = line
                .split_once('.')
                .filter(|(n, _)| n.chars().all(|c| c.is_ascii_digit()) && !n.is_empty())
                .map(|(_, rest)| rest)?;

            let mut parts = body.splitn(3, " - ").map(strip_brackets);
            let name = parts.next().filter(|s| !s.is_empty())?;
            let main_ingredient = parts.next().unwrap_or_default();
            let reason = parts.next().unwrap_or_default();

            Some(Candidate {
                name,
                main_ingredient,
                reason,
            })
        })
        .collect()
}

/// Drop candidates whose name matches a forbidden meal (case-insensitive)
pub fn filter_candidates(candidates: Vec<Candidate>, forbidden: &[String]) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| {
            let collides = forbidden
                .iter()
                .any(|f| f.eq_ignore_ascii_case(c.name.trim()));
            if collides {
                warn!(meal = %c.name, "dropping candidate already suggested recently");
            }
            !collides
        })
        .collect()
}

/// Match the decision reply back to a candidate. An unrecognized reply falls
/// back to the first candidate rather than failing the run.
pub fn match_selection(reply: &str, candidates: &[Candidate]) -> Candidate {
    let reply = reply.trim();
    candidates
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(reply))
        .or_else(|| {
            candidates
                .iter()
                .find(|c| reply.to_lowercase().contains(&c.name.to_lowercase()))
        })
        .unwrap_or_else(|| {
            warn!(reply, "decision reply matched no candidate, taking the first");
            &candidates[0]
        })
        .clone()
}

/// Build the Discord-flavored notification message
pub fn format_notification(record: &MealRecord, reason: &str) -> String {
    let mut message = format!(
        "🍽️ **Lunch for {}:** {}",
        record.date.format("%A, %B %-d"),
        record.meal_name
    );
    if !reason.is_empty() {
        message.push_str(&format!("\n💡 {}", reason));
    }
    message
}

fn strip_brackets(s: &str) -> String {
    s.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{CompletionResponse, StopReason, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Provider that replays a scripted sequence of replies
    struct ScriptedProvider {
        replies: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Self {
            let mut replies: Vec<String> = replies.iter().map(|s| s.to_string()).collect();
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let text = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .expect("scripted provider ran out of replies");
            Ok(CompletionResponse {
                model: "scripted".to_string(),
                text,
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn spinach(purchased: NaiveDate) -> InventoryItem {
        InventoryItem {
            name: "Spinach".to_string(),
            quantity: "2".to_string(),
            unit: "bunch".to_string(),
            category: "Vegetables".to_string(),
            purchased: Some(purchased),
        }
    }

    const CHEF_REPLY: &str = "\
1. Palak Paneer - Spinach - the spinach is about to wilt
2. Bhindi Masala - Okra - family favorite
3. Veggie Pulao - Mixed Vegetables - uses up several items";

    #[test]
    fn test_parse_candidates() {
        let candidates = parse_candidates(CHEF_REPLY);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].name, "Palak Paneer");
        assert_eq!(candidates[0].main_ingredient, "Spinach");
        assert_eq!(candidates[2].reason, "uses up several items");
    }

    #[test]
    fn test_parse_candidates_with_brackets_and_noise() {
        let text = "Here are my suggestions:\n1. [Palak Paneer] - [Spinach] - [wilting]\nHope that helps!";
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Palak Paneer");
        assert_eq!(candidates[0].main_ingredient, "Spinach");
    }

    #[test]
    fn test_parse_candidates_empty_reply() {
        assert!(parse_candidates("I could not come up with anything.").is_empty());
    }

    #[test]
    fn test_filter_candidates_is_case_insensitive() {
        let candidates = parse_candidates(CHEF_REPLY);
        let forbidden = vec!["palak paneer".to_string()];
        let kept = filter_candidates(candidates, &forbidden);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|c| c.name != "Palak Paneer"));
    }

    #[test]
    fn test_match_selection_falls_back_to_first() {
        let candidates = parse_candidates(CHEF_REPLY);
        let picked = match_selection("Something else entirely", &candidates);
        assert_eq!(picked.name, "Palak Paneer");
    }

    #[test]
    fn test_match_selection_tolerates_surrounding_text() {
        let candidates = parse_candidates(CHEF_REPLY);
        let picked = match_selection("Let's go with Bhindi Masala today!", &candidates);
        assert_eq!(picked.name, "Bhindi Masala");
    }

    #[tokio::test]
    async fn test_run_selects_and_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path().join("memory_bank.json"));
        let llm = ScriptedProvider::new(&[CHEF_REPLY, "Bhindi Masala"]);
        let planner = Planner::new(llm, store.clone(), "scripted", 14);

        let today = date(2024, 5, 12);
        let outcome = planner.run(vec![spinach(date(2024, 5, 10))], today).await.unwrap();

        match outcome {
            PlanOutcome::Planned { record, message } => {
                assert_eq!(record.meal_name, "Bhindi Masala");
                assert!(record.tags.contains("Okra"));
                assert!(message.contains("Bhindi Masala"));
            }
            other => panic!("expected Planned, got {:?}", other),
        }

        let bank = store.load().await.unwrap();
        assert_eq!(bank.records.len(), 1);
        assert_eq!(bank.records[0].meal_name, "Bhindi Masala");
    }

    #[tokio::test]
    async fn test_run_is_noop_when_today_already_recorded() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path().join("memory_bank.json"));
        let today = date(2024, 5, 12);

        let mut bank = MemoryBank::new();
        bank.append(MealRecord::new(today, "Daal Chawal")).unwrap();
        store.persist(&bank).await.unwrap();

        // No scripted replies: any LLM call would panic the test.
        let llm = ScriptedProvider::new(&[]);
        let planner = Planner::new(llm, store.clone(), "scripted", 14);

        let outcome = planner.run(vec![], today).await.unwrap();
        assert!(matches!(
            outcome,
            PlanOutcome::AlreadyPlanned { meal_name, .. } if meal_name == "Daal Chawal"
        ));

        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded.records.len(), 1);
    }

    #[tokio::test]
    async fn test_run_aborts_without_write_on_empty_candidates() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory_bank.json");
        let store = MemoryStore::new(&path);

        // Every candidate collides with history.
        let today = date(2024, 5, 12);
        let mut bank = MemoryBank::new();
        bank.append(MealRecord::new(date(2024, 5, 10), "Palak Paneer")).unwrap();
        bank.append(MealRecord::new(date(2024, 5, 11), "Bhindi Masala")).unwrap();
        bank.append(MealRecord::new(date(2024, 5, 9), "Veggie Pulao")).unwrap();
        store.persist(&bank).await.unwrap();
        let on_disk_before = std::fs::read_to_string(&path).unwrap();

        let llm = ScriptedProvider::new(&[CHEF_REPLY]);
        let planner = Planner::new(llm, store.clone(), "scripted", 14);

        let err = planner
            .run(vec![spinach(date(2024, 5, 10))], today)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Pipeline(PipelineError::EmptyCandidateSet { .. })
        ));

        // persist was never invoked: the file is byte-identical.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), on_disk_before);
    }

    #[tokio::test]
    async fn test_run_aborts_on_unparseable_chef_reply() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory_bank.json");
        let store = MemoryStore::new(&path);

        let llm = ScriptedProvider::new(&["Sorry, the pantry looks empty to me."]);
        let planner = Planner::new(llm, store, "scripted", 14);

        let err = planner.run(vec![], date(2024, 5, 12)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Pipeline(PipelineError::EmptyCandidateSet { .. })
        ));
        assert!(!path.exists());
    }
}
