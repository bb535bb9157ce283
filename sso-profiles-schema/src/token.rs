use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A bearer token accepted by the SSO portal API.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

/// A token entry of the AWS CLI SSO cache (`~/.aws/sso/cache/*.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToken {
    pub start_url: String,
    pub region: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// True when the token outlives `now` by at least `margin`.
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at > now + margin
    }
}

impl From<CachedToken> for AccessToken {
    fn from(cached: CachedToken) -> Self {
        AccessToken {
            token: cached.access_token,
            expires_at: Some(cached.expires_at),
        }
    }
}

/// A public OIDC client registered through `RegisterClient`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredClient {
    pub client_id: String,
    pub client_secret: String,
    pub client_id_issued_at: i64,
    pub client_secret_expires_at: i64,
}

impl RegisteredClient {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn secret_expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.client_secret_expires_at, 0).single()
    }

    /// True when the client secret outlives `now` by at least `margin`.
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.secret_expires_at()
            .map(|expires_at| expires_at > now + margin)
            .unwrap_or(false)
    }
}
