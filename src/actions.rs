//! Action callbacks fired on alarm state transitions
//!
//! When an evaluation tick moves an alarm into a new state, the action refs
//! configured for that state are dispatched. Delivery is best-effort:
//! failures are logged and never bubble back into the scheduler.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::{AlarmDefinition, AlarmRef, AlarmStateValue};

/// One observed state change of one alarm.
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub alarm_ref: AlarmRef,
    pub previous: AlarmStateValue,
    pub current: AlarmStateValue,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Delivers action callbacks for a state transition.
///
/// The definition passed in is the freshly updated one; implementations pick
/// the action list matching `transition.current`.
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    async fn dispatch(&self, definition: &AlarmDefinition, transition: &StateTransition);
}

/// Webhook-based action dispatcher
///
/// Treats every action ref as an HTTP endpoint and POSTs a JSON payload
/// describing the transition. The client is reused across requests.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionDispatcher for WebhookNotifier {
    #[instrument(skip(self, definition, transition), fields(alarm = %transition.alarm_ref))]
    async fn dispatch(&self, definition: &AlarmDefinition, transition: &StateTransition) {
        let payload = json!({
            "alarm_ref": transition.alarm_ref.as_str(),
            "alarm_name": definition.name,
            "tenant": definition.tenant,
            "region": definition.region,
            "previous_state": transition.previous.as_str(),
            "new_state": transition.current.as_str(),
            "reason": transition.reason,
            "timestamp": transition.at.to_rfc3339(),
        });

        for action in definition.actions_for(transition.current) {
            match self.client.post(action.as_str()).json(&payload).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        info!("delivered action callback to {}", action.as_str());
                    } else {
                        error!(
                            "action callback {} failed with status: {}",
                            action.as_str(),
                            response.status()
                        );
                    }
                }
                Err(e) => {
                    error!("failed to deliver action callback {}: {}", action.as_str(), e);
                }
            }
        }
    }
}
