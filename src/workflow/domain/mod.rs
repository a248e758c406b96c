//! Domain model for the task dependency and hierarchy progress engine.
//!
//! Pure types and pure decision functions only: statuses with transition
//! validation, the progress policy, the dependency resolver, and the
//! `Task`/`Flow` aggregates. Store lookups, notification delivery, and
//! cascade orchestration live outside the domain boundary.

pub mod dependency;
mod error;
mod flow;
mod ids;
pub mod progress;
mod status;
mod task;

pub use dependency::{DependencySnapshot, DependencyTarget};
pub use error::{ParseStatusError, TaskDomainError};
pub use flow::{Flow, PersistedFlowData};
pub use ids::{FlowId, TaskId, UserId};
pub use progress::Progress;
pub use status::{FlowStatus, TaskStatus};
pub use task::{PersistedTaskData, Task, TaskDraft};
