//! Task dependency and hierarchy progress engine.
//!
//! Keeps a task's blocked flag consistent with its dependency references
//! (precedent task, milestone) and propagates completion percentage up
//! the two-level hierarchy: subtask to parent task, root tasks to flow.
//! The module follows hexagonal architecture:
//!
//! - Domain types and pure policies in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The cascade orchestrator in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
