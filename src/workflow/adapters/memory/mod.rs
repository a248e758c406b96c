//! In-memory adapter implementations of the workflow ports.

mod flow;
mod notifier;
mod task;

pub use flow::InMemoryFlowRepository;
pub use notifier::RecordingSink;
pub use task::InMemoryTaskRepository;
