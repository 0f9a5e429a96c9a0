//! E2E scenario suite for the Workspaces Management System
//!
//! This crate provides a Rust-controlled E2E scenario runner that:
//! - Parses declarative YAML scenarios (login, registration, workspace flows)
//! - Controls Playwright via generated scripts and JSON step events
//! - Probes the externally running application before a suite starts
//! - Reports per-scenario pass/fail with the failing step and diagnostic
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Scenario Runner (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner                                             │
//! │    ├── wait_for_app() -> readiness probe                    │
//! │    ├── run_all() / run_tagged() / run_scenario()            │
//! │    └── run_one(scenario) -> ScenarioResult                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                            │
//! │    ├── name, description, tags                              │
//! │    ├── clean_session / login preconditions                  │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { path }                              │
//! │          ├── fill { selector, value }                       │
//! │          ├── click { selector | text }                      │
//! │          ├── assert_visible / assert_absent { selector | text } │
//! │          ├── assert_url { equals | contains }               │
//! │          └── assert_attribute { selector | text, name, value } │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session: one browser context per scenario, steps executed  │
//! │  strictly in order, first failure aborts the remainder      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod error;
pub mod flows;
pub mod runner;
pub mod scenario;
pub mod session;

pub use error::{E2eError, E2eResult};
pub use runner::ScenarioRunner;
pub use scenario::{Scenario, Step};
