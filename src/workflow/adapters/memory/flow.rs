//! In-memory flow repository for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{Flow, FlowId},
    ports::{FlowRepository, FlowRepositoryError, FlowRepositoryResult},
};

/// Thread-safe in-memory flow repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFlowRepository {
    flows: Arc<RwLock<HashMap<FlowId, Flow>>>,
}

impl InMemoryFlowRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowRepository for InMemoryFlowRepository {
    async fn store(&self, flow: &Flow) -> FlowRepositoryResult<()> {
        let mut flows = self.flows.write().map_err(|err| {
            FlowRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if flows.contains_key(&flow.id()) {
            return Err(FlowRepositoryError::DuplicateFlow(flow.id()));
        }
        flows.insert(flow.id(), flow.clone());
        Ok(())
    }

    async fn update(&self, flow: &Flow) -> FlowRepositoryResult<Flow> {
        let mut flows = self.flows.write().map_err(|err| {
            FlowRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let stored = flows
            .get(&flow.id())
            .ok_or(FlowRepositoryError::NotFound(flow.id()))?;
        if stored.version() != flow.version() {
            return Err(FlowRepositoryError::VersionConflict {
                id: flow.id(),
                held: flow.version(),
                stored: stored.version(),
            });
        }
        let updated = flow.clone().with_bumped_version();
        flows.insert(flow.id(), updated.clone());
        Ok(updated)
    }

    async fn find_by_id(&self, id: FlowId) -> FlowRepositoryResult<Option<Flow>> {
        let flows = self.flows.read().map_err(|err| {
            FlowRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(flows.get(&id).cloned())
    }
}
