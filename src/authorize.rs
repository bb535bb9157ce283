use async_trait::async_trait;
use sso_profiles_schema::token::AccessToken;

use crate::directory::SsoDirectory;

pub mod cache;
pub mod device;
pub mod registration;

pub mod defaults {
    /// Tokens and client secrets closer to expiry than this are not reused.
    pub const EXPIRY_MARGIN_MINUTES: i64 = 5;
}

#[async_trait]
pub trait Authorize {
    async fn authorize(&self, directory: &SsoDirectory) -> anyhow::Result<AccessToken>;
}

/// Hands out a token obtained elsewhere, e.g. by `aws sso login`.
pub struct StaticAccessToken {
    token: String,
}

impl<S: Into<String>> From<S> for StaticAccessToken {
    fn from(s: S) -> Self {
        StaticAccessToken { token: s.into() }
    }
}

#[async_trait]
impl Authorize for StaticAccessToken {
    async fn authorize(&self, _directory: &SsoDirectory) -> anyhow::Result<AccessToken> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_at: None,
        })
    }
}
