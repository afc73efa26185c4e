//! Alarm CRUD endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::{error::ApiResult, state::ApiState, types::DeleteAlarmsRequest};
use crate::service::{AlarmSpec, DescribeAlarmsFilter};
use crate::{AlarmDefinition, AlarmStateValue, Scope};

/// Query parameters for describe calls
#[derive(Debug, Deserialize)]
pub struct DescribeQuery {
    /// Only alarms whose name starts with this prefix
    alarm_name_prefix: Option<String>,

    /// Only alarms currently in this state (OK, ALARM, INSUFFICIENT_DATA)
    state_value: Option<AlarmStateValue>,
}

/// PUT /api/v1/tenants/:tenant/regions/:region/alarms
///
/// Create or overwrite one alarm. Returns the stored definition, which
/// always starts over in INSUFFICIENT_DATA.
pub async fn put_alarm(
    State(state): State<ApiState>,
    Path((tenant, region)): Path<(String, String)>,
    Json(spec): Json<AlarmSpec>,
) -> ApiResult<Json<AlarmDefinition>> {
    let scope = Scope::new(tenant, region);
    let definition = state.service.put_metric_alarm(&scope, spec).await?;
    Ok(Json(definition))
}

/// POST /api/v1/tenants/:tenant/regions/:region/alarms/delete
///
/// Batch delete by name. Unknown names are skipped silently.
pub async fn delete_alarms(
    State(state): State<ApiState>,
    Path((tenant, region)): Path<(String, String)>,
    Json(request): Json<DeleteAlarmsRequest>,
) -> ApiResult<Json<Value>> {
    let scope = Scope::new(tenant, region);
    state
        .service
        .delete_alarms(&scope, &request.alarm_names)
        .await?;

    Ok(Json(json!({
        "deleted": request.alarm_names.len(),
    })))
}

/// GET /api/v1/tenants/:tenant/regions/:region/alarms
///
/// Describe alarms in one scope, optionally filtered
pub async fn describe_alarms(
    State(state): State<ApiState>,
    Path((tenant, region)): Path<(String, String)>,
    Query(query): Query<DescribeQuery>,
) -> ApiResult<Json<Value>> {
    let scope = Scope::new(tenant, region);
    let filter = DescribeAlarmsFilter {
        alarm_names: vec![],
        alarm_name_prefix: query.alarm_name_prefix,
        state_value: query.state_value,
    };

    let alarms = state.service.describe_alarms(&scope, &filter).await?;
    let count = alarms.len();

    Ok(Json(json!({
        "alarms": alarms,
        "count": count,
    })))
}
