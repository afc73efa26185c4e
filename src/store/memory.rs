//! In-memory alarm store (no persistence)
//!
//! Default backend when no storage is configured, and the workhorse for
//! tests. All data is lost on restart; the restart sweep then simply finds
//! an empty store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::backend::{AlarmStore, HealthStatus};
use super::error::StoreResult;
use crate::{AlarmDefinition, AlarmRef, Scope};

/// In-memory alarm store
///
/// Definitions are grouped per scope so tenants/regions stay isolated.
#[derive(Debug, Default)]
pub struct MemoryAlarmStore {
    alarms: RwLock<HashMap<Scope, HashMap<AlarmRef, AlarmDefinition>>>,
}

impl MemoryAlarmStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlarmStore for MemoryAlarmStore {
    async fn get(
        &self,
        scope: &Scope,
        alarm_ref: &AlarmRef,
    ) -> StoreResult<Option<AlarmDefinition>> {
        let alarms = self.alarms.read().await;
        Ok(alarms
            .get(scope)
            .and_then(|scoped| scoped.get(alarm_ref))
            .cloned())
    }

    async fn put(&self, scope: &Scope, definition: AlarmDefinition) -> StoreResult<()> {
        trace!("storing alarm {} in {scope}", definition.name);

        let mut alarms = self.alarms.write().await;
        alarms
            .entry(scope.clone())
            .or_default()
            .insert(definition.alarm_ref(), definition);
        Ok(())
    }

    async fn delete(&self, scope: &Scope, alarm_ref: &AlarmRef) -> StoreResult<bool> {
        let mut alarms = self.alarms.write().await;
        let Some(scoped) = alarms.get_mut(scope) else {
            return Ok(false);
        };

        let removed = scoped.remove(alarm_ref).is_some();
        if scoped.is_empty() {
            alarms.remove(scope);
        }
        Ok(removed)
    }

    async fn list_all(&self, scope: &Scope) -> StoreResult<Vec<AlarmDefinition>> {
        let alarms = self.alarms.read().await;
        Ok(alarms
            .get(scope)
            .map(|scoped| scoped.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn scopes(&self) -> StoreResult<Vec<Scope>> {
        let alarms = self.alarms.read().await;
        Ok(alarms.keys().cloned().collect())
    }

    async fn health_check(&self) -> StoreResult<HealthStatus> {
        let alarms = self.alarms.read().await;
        let total: usize = alarms.values().map(|scoped| scoped.len()).sum();

        Ok(HealthStatus {
            healthy: true,
            message: "in-memory store operational".to_string(),
            metadata: std::collections::HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("total_alarms".to_string(), total.to_string()),
            ]),
        })
    }

    async fn close(&self) -> StoreResult<()> {
        debug!("closing in-memory store (no-op)");
        Ok(())
    }
}
