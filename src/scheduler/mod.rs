//! Alarm lifecycle scheduler
//!
//! Keeps one background evaluation task per persisted alarm, independent of
//! the request-handling path. The scheduler itself is start/stoppable in
//! lock-step with the host's lifecycle (see [`crate::lifecycle`]); while
//! stopped it holds no tasks at all.

mod core;
mod error;
mod task;

pub use self::core::AlarmScheduler;
pub use self::error::{SchedulerError, SchedulerResult};
