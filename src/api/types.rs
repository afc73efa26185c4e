//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Batch delete request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAlarmsRequest {
    pub alarm_names: Vec<String>,
}
