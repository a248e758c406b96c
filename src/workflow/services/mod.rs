//! Application services orchestrating the cascade pipeline.

mod cascade;

pub use cascade::{CascadeEngine, CascadeError, CascadeResult};
