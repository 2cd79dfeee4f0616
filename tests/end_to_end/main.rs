//! End-to-end tests
//!
//! Producers, document mutations and consumers wired together through the
//! public `annota` facade:
//! - Reconciliation and reference counting
//! - Text-span stability across edits
//! - Diff annotations driven by document changes
//! - Shared selection
//! - Configuration and logging setup

#[path = "../common/mod.rs"]
mod common;

mod config;
mod diff;
mod reconciliation;
mod selection;
mod spans;
