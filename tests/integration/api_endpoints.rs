//! REST API endpoint tests
//!
//! Spins up the real axum server on an ephemeral port and drives it with a
//! plain HTTP client.

use std::sync::Arc;

use alarmhub::api::{ApiConfig, ApiState, spawn_api_server};
use alarmhub::service::AlarmService;

use crate::helpers::*;

async fn spawn_test_api(auth_token: Option<String>) -> (String, Arc<alarmhub::scheduler::AlarmScheduler>) {
    let (store, scheduler) = idle_scheduler();
    let service = Arc::new(AlarmService::new(store.clone(), scheduler.clone(), true));

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        auth_token,
        enable_cors: false,
    };

    let addr = spawn_api_server(
        config,
        ApiState::new(service, scheduler.clone(), store.clone()),
    )
    .await
    .unwrap();

    (format!("http://{addr}"), scheduler)
}

fn alarm_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "comparison_operator": "greater_than_threshold",
        "metric": { "namespace": "system", "metric_name": "cpu_usage" },
        "threshold": 80.0,
        "period_seconds": 60,
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let (base, _scheduler) = spawn_test_api(None).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/api/v1/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_alarm_upsert_describe_delete_flow() {
    let (base, scheduler) = spawn_test_api(None).await;
    let client = reqwest::Client::new();
    let alarms_url = format!("{base}/api/v1/tenants/acct-1/regions/eu-west-1/alarms");

    // upsert
    let response = client
        .put(&alarms_url)
        .json(&alarm_body("high-cpu"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let created: serde_json::Value = response.json().await.unwrap();
    assert_eq!(created["state"], "INSUFFICIENT_DATA");
    assert_eq!(created["state_reason"], "Unchecked: Initial alarm creation");
    assert_eq!(scheduler.task_count(), 1);

    // describe
    let response = client.get(&alarms_url).send().await.unwrap();
    let described: serde_json::Value = response.json().await.unwrap();
    assert_eq!(described["count"], 1);
    assert_eq!(described["alarms"][0]["name"], "high-cpu");

    // describe with a non-matching prefix
    let response = client
        .get(format!("{alarms_url}?alarm_name_prefix=disk-"))
        .send()
        .await
        .unwrap();
    let described: serde_json::Value = response.json().await.unwrap();
    assert_eq!(described["count"], 0);

    // batch delete
    let response = client
        .post(format!("{alarms_url}/delete"))
        .json(&serde_json::json!({ "alarm_names": ["high-cpu"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(scheduler.task_count(), 0);

    let response = client.get(&alarms_url).send().await.unwrap();
    let described: serde_json::Value = response.json().await.unwrap();
    assert_eq!(described["count"], 0);
}

#[tokio::test]
async fn test_scheduler_diagnostic_endpoint() {
    let (base, scheduler) = spawn_test_api(None).await;
    let client = reqwest::Client::new();

    client
        .put(format!(
            "{base}/api/v1/tenants/acct-1/regions/eu-west-1/alarms"
        ))
        .json(&alarm_body("high-cpu"))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("{base}/api/v1/scheduler"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["scheduler"]["running"], true);
    assert_eq!(body["scheduler"]["active_tasks"], 1);
    assert_eq!(body["store"]["healthy"], true);

    let refs = body["scheduler"]["scheduled_refs"].as_array().unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0], "arn:alarmhub:eu-west-1:acct-1:alarm/high-cpu");

    scheduler.shutdown();
}

#[tokio::test]
async fn test_put_on_stopped_scheduler_is_service_unavailable() {
    let (base, scheduler) = spawn_test_api(None).await;
    scheduler.shutdown();

    let client = reqwest::Client::new();
    let response = client
        .put(format!(
            "{base}/api/v1/tenants/acct-1/regions/eu-west-1/alarms"
        ))
        .json(&alarm_body("high-cpu"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn test_auth_middleware_guards_endpoints() {
    let (base, _scheduler) = spawn_test_api(Some("hub-secret".to_string())).await;
    let client = reqwest::Client::new();
    let health_url = format!("{base}/api/v1/health");

    // no token
    let response = client.get(&health_url).send().await.unwrap();
    assert_eq!(response.status(), 401);

    // wrong token
    let response = client
        .get(&health_url)
        .header("Authorization", "Bearer wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // correct token
    let response = client
        .get(&health_url)
        .header("Authorization", "Bearer hub-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
