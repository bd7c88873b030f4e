//! # Core Application Logic
//!
//! This module contains Dalil's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    └───────────┬─────────────┘
//!                                │
//!                  ┌─────────────┴─────────────┐
//!                  ▼                           ▼
//!           ┌────────────┐              ┌────────────┐
//!           │    TUI     │              │   stream   │
//!           │  Adapter   │              │  session   │
//!           │ (ratatui)  │              │ (network)  │
//!           └────────────┘              └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`conversation`]: id-indexed message list
//! - [`config`]: settings and their override hierarchy
//! - [`history`]: persistence and transcript export

pub mod action;
pub mod config;
pub mod conversation;
pub mod history;
pub mod state;
