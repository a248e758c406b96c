//! Port contracts for the engine's external collaborators.
//!
//! Ports define infrastructure-agnostic interfaces for the task store
//! and the notification sink.

pub mod notifier;
pub mod repository;

pub use notifier::{Notification, NotificationError, NotificationKind, NotificationSink};
pub use repository::{
    FlowRepository, FlowRepositoryError, FlowRepositoryResult, TaskRepository,
    TaskRepositoryError, TaskRepositoryResult,
};
