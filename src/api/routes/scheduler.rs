//! Scheduler diagnostic endpoint

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::api::{error::ApiResult, state::ApiState};

/// GET /api/v1/scheduler
///
/// Read-only view of the scheduler run state and store health, for
/// operational inspection. Not part of the functional alarm contract.
pub async fn scheduler_state(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let store_health = state.store.health_check().await?;

    let refs: Vec<String> = state
        .scheduler
        .scheduled_refs()
        .into_iter()
        .map(|alarm_ref| alarm_ref.as_str().to_string())
        .collect();

    Ok(Json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "scheduler": {
            "running": state.scheduler.is_running(),
            "active_tasks": state.scheduler.task_count(),
            "scheduled_refs": refs,
        },
        "store": {
            "healthy": store_health.healthy,
            "message": store_health.message,
            "metadata": store_health.metadata,
        },
    })))
}
