//! Taskflow: task dependency and hierarchy progress engine for a
//! CRM-integrated workflow tracker.
//!
//! This crate implements the one part of the tracker with real
//! invariants and cascading effects: keeping each task's blocked flag
//! consistent with its dependency graph, and propagating completion
//! percentage up the subtask -> parent -> flow hierarchy. Persistence,
//! authentication, HTTP shaping, and CRM synchronisation are external
//! collaborators behind ports.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: pure statuses, progress policy, dependency resolver,
//!   and aggregates, with no infrastructure dependencies
//! - **Ports**: abstract trait interfaces for the task store and
//!   notification sink
//! - **Adapters**: in-memory implementations of the ports for tests and
//!   embedding
//! - **Services**: the cascade engine orchestrating the pipeline

pub mod workflow;
