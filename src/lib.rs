//! # lunchbot
//!
//! A once-a-day lunch planner. It reads recent grocery purchases from a
//! Google Sheet, cross-references a persistent memory bank of past
//! suggestions and family preferences, asks an LLM for candidate meals,
//! records the chosen one, and posts it to a Discord webhook.
//!
//! ## Core Concepts
//!
//! - **Memory Bank**: the persisted aggregate of meal history and
//!   preference facts, the only cross-run state in the system
//! - **Variety window**: the trailing span (default 14 days) within which a
//!   meal must not repeat
//! - **Pipeline**: three sequential stages — gather context, generate
//!   candidates, select-and-notify
//!
//! ## Example
//!
//! ```rust,ignore
//! use lunchbot::llm::gemini::GeminiProvider;
//! use lunchbot::memory::MemoryStore;
//! use lunchbot::pipeline::Planner;
//!
//! let store = MemoryStore::new("memory_bank.json");
//! let planner = Planner::new(GeminiProvider::from_env()?, store, "gemini-2.5-flash", 14);
//! let outcome = planner.run(inventory, today).await?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod inventory;
pub mod llm;
pub mod memory;
pub mod notify;
pub mod pipeline;

pub use config::Config;
pub use error::{Error, Result};
