//! Alarm store backends
//!
//! Trait-based abstraction over where alarm definitions live. The scheduler
//! and the API surface only ever talk to the [`AlarmStore`] trait; the
//! backend is picked at startup from configuration.
//!
//! ## Backends
//!
//! - **SQLite** (feature `storage-sqlite`): embedded persistence
//! - **In-Memory** (fallback): no persistence, for testing or small setups

pub mod backend;
pub mod error;
pub mod memory;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{AlarmStore, HealthStatus};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryAlarmStore;
#[cfg(feature = "storage-sqlite")]
pub use sqlite::SqliteAlarmStore;
