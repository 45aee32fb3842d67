//! App Endpoint payloads.
//!
//! Activation has no GET endpoint of its own: the POST/DELETE pair switches
//! an endpoint online/offline and the endpoint's own GET carries the
//! observed state. Older API versions report `state`, newer ones a boolean
//! `online` or a `status` string.

use serde::Deserialize;

pub const STATE_ONLINE: &str = "Online";
pub const STATE_OFFLINE: &str = "Offline";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAppEndpointResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
}

impl GetAppEndpointResponse {
    /// Normalized activation state, preferring the most explicit field the
    /// server returned.
    pub fn activation_state(&self) -> Option<&str> {
        if let Some(online) = self.online {
            return Some(if online { STATE_ONLINE } else { STATE_OFFLINE });
        }
        self.state
            .as_deref()
            .or(self.status.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_online_flag_wins_over_state_string() {
        let endpoint: GetAppEndpointResponse =
            serde_json::from_str(r#"{"name":"ep1","online":false,"state":"online"}"#).unwrap();
        assert_eq!(endpoint.activation_state(), Some(STATE_OFFLINE));
    }

    #[test]
    fn state_string_is_passed_through() {
        let endpoint: GetAppEndpointResponse =
            serde_json::from_str(r#"{"name":"ep1","state":"online"}"#).unwrap();
        assert_eq!(endpoint.activation_state(), Some("online"));

        let endpoint: GetAppEndpointResponse =
            serde_json::from_str(r#"{"name":"ep1","status":"Offline"}"#).unwrap();
        assert_eq!(endpoint.activation_state(), Some("Offline"));
    }

    #[test]
    fn missing_fields_yield_none() {
        let endpoint: GetAppEndpointResponse = serde_json::from_str(r#"{"name":"ep1"}"#).unwrap();
        assert_eq!(endpoint.activation_state(), None);
    }
}
