//! Outbound client for the platform's public channel-info endpoint.
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

use crate::error::FetchError;

/// The parts of a channel payload we read. Everything is optional; the
/// endpoint is not ours and its shape moves.
///
/// Each field is read on its own: a field of the wrong type reads as absent
/// and leaves the others alone. Only a body that is not a JSON object is
/// rejected.
#[derive(Debug, Clone, Default)]
pub struct ChannelInfo {
    pub livestream: Option<Livestream>,
    pub user:       Option<ChannelUser>,
}

#[derive(Debug, Clone, Default)]
pub struct Livestream {
    pub viewer_count: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelUser {
    pub profile_pic: Option<String>,
}

impl ChannelInfo {
    fn from_object(obj: &serde_json::Map<String, Value>) -> Self {
        // any non-null livestream means on air, whatever is inside it
        let livestream = obj.get("livestream").filter(|v| !v.is_null()).map(|ls| Livestream {
            viewer_count: ls.get("viewer_count").and_then(count),
        });
        let user = obj.get("user").filter(|v| v.is_object()).map(|u| ChannelUser {
            profile_pic: u.get("profile_pic").and_then(Value::as_str).map(str::to_owned),
        });
        Self { livestream, user }
    }
}

fn count(v: &Value) -> Option<u64> {
    v.as_u64().or_else(|| v.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
}

impl<'de> Deserialize<'de> for ChannelInfo {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        match Value::deserialize(d)? {
            Value::Object(obj) => Ok(Self::from_object(&obj)),
            other => Err(de::Error::custom(format!("expected a channel object, got {other}"))),
        }
    }
}

impl ChannelInfo {
    pub fn is_live(&self) -> bool { self.livestream.is_some() }

    pub fn viewers(&self) -> u64 {
        self.livestream.as_ref().and_then(|l| l.viewer_count).unwrap_or(0)
    }

    /// Profile picture, if the payload carries a non-empty one.
    pub fn profile_pic(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.profile_pic.as_deref())
            .filter(|p| !p.trim().is_empty())
    }
}

#[async_trait]
pub trait ChannelApi: Send + Sync {
    async fn channel(&self, username: &str) -> Result<ChannelInfo, FetchError>;
}

/// `GET {base}/api/v2/channels/{username}`
#[derive(Clone)]
pub struct KickClient {
    http: Client,
    base: String,
}

impl KickClient {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base: base.into() })
    }

    fn url(&self, username: &str) -> String {
        format!(
            "{}/api/v2/channels/{}",
            self.base.trim_end_matches('/'),
            urlencoding::encode(username)
        )
    }
}

#[async_trait]
impl ChannelApi for KickClient {
    async fn channel(&self, username: &str) -> Result<ChannelInfo, FetchError> {
        let resp = self
            .http
            .get(self.url(username))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        // read as text first so a bad body is a payload error, not transport
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_payload() {
        let info: ChannelInfo = serde_json::from_str(
            r#"{"livestream":{"viewer_count":1200},"user":{"profile_pic":"https://img/x.png"}}"#,
        )
        .unwrap();
        assert!(info.is_live());
        assert_eq!(info.viewers(), 1200);
        assert_eq!(info.profile_pic(), Some("https://img/x.png"));
    }

    #[test]
    fn offline_payloads() {
        for raw in [r#"{}"#, r#"{"livestream":null}"#, r#"{"user":{"profile_pic":""}}"#] {
            let info: ChannelInfo = serde_json::from_str(raw).unwrap();
            assert!(!info.is_live());
            assert_eq!(info.viewers(), 0);
            assert_eq!(info.profile_pic(), None);
        }
    }

    #[test]
    fn live_without_count_is_zero_viewers() {
        let info: ChannelInfo = serde_json::from_str(r#"{"livestream":{"viewer_count":null}}"#).unwrap();
        assert!(info.is_live());
        assert_eq!(info.viewers(), 0);
    }

    #[test]
    fn mistyped_fields_do_not_hide_the_live_state() {
        for raw in [
            r#"{"livestream":{"viewer_count":1200},"user":{"profile_pic":123}}"#,
            r#"{"livestream":{"viewer_count":1200},"user":"elmune"}"#,
            r#"{"livestream":{"viewer_count":1200.0},"user":null}"#,
        ] {
            let info: ChannelInfo = serde_json::from_str(raw).unwrap();
            assert!(info.is_live(), "{raw}");
            assert_eq!(info.viewers(), 1200, "{raw}");
            assert_eq!(info.profile_pic(), None, "{raw}");
        }
    }

    #[test]
    fn odd_livestream_values_still_count_as_live() {
        for raw in [r#"{"livestream":{"viewer_count":"lots"}}"#, r#"{"livestream":true}"#] {
            let info: ChannelInfo = serde_json::from_str(raw).unwrap();
            assert!(info.is_live(), "{raw}");
            assert_eq!(info.viewers(), 0, "{raw}");
        }
    }

    #[test]
    fn picture_survives_a_broken_livestream() {
        let info: ChannelInfo =
            serde_json::from_str(r#"{"livestream":{"viewer_count":-3},"user":{"profile_pic":"https://img/x.png"}}"#)
                .unwrap();
        assert_eq!(info.viewers(), 0);
        assert_eq!(info.profile_pic(), Some("https://img/x.png"));
    }

    #[test]
    fn wrong_shape_is_payload_error() {
        for raw in ["[1,2]", "\"elmune\"", "null"] {
            let err: FetchError = serde_json::from_str::<ChannelInfo>(raw).unwrap_err().into();
            assert!(matches!(err, FetchError::Payload(_)), "{raw}");
        }
    }

    #[test]
    fn url_is_built_from_base() {
        let c = KickClient::new("http://localhost:9/", Duration::from_secs(1)).unwrap();
        assert_eq!(c.url("el mune"), "http://localhost:9/api/v2/channels/el%20mune");
    }
}
