//! Alarm store trait definition
//!
//! The store is the authoritative owner of alarm definitions. The scheduler
//! never caches definitions across ticks; it always re-reads through this
//! trait so API-driven updates are observed by the next evaluation.

use async_trait::async_trait;

use super::error::StoreResult;
use crate::{AlarmDefinition, AlarmRef, Scope};

/// Health status of the store backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// Trait for alarm store backends
///
/// Every operation is scoped by `(tenant, region)`; backends must keep
/// scopes isolated from one another. Implementations must be `Send + Sync`
/// as they are shared across the scheduler's evaluation tasks.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// Fetch one alarm definition. `None` when the ref has no definition in
    /// this scope.
    async fn get(&self, scope: &Scope, alarm_ref: &AlarmRef) -> StoreResult<Option<AlarmDefinition>>;

    /// Insert or overwrite a definition, keyed by its identity.
    async fn put(&self, scope: &Scope, definition: AlarmDefinition) -> StoreResult<()>;

    /// Remove a definition. Returns whether anything was removed; removing
    /// an absent ref is not an error.
    async fn delete(&self, scope: &Scope, alarm_ref: &AlarmRef) -> StoreResult<bool>;

    /// All definitions in one scope, in no particular order.
    async fn list_all(&self, scope: &Scope) -> StoreResult<Vec<AlarmDefinition>>;

    /// Every scope that currently holds at least one definition. Used by the
    /// post-load restart sweep to re-arm alarms across all tenants/regions.
    async fn scopes(&self) -> StoreResult<Vec<Scope>>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend is
    /// operational (e.g., ping database, check file access).
    async fn health_check(&self) -> StoreResult<HealthStatus>;

    /// Close the backend and release resources
    async fn close(&self) -> StoreResult<()>;
}
