use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sha1::{Digest, Sha1};
use sso_profiles_schema::token::{AccessToken, CachedToken};
use tracing::{debug, info, warn};

use crate::authorize::registration::open_private;
use crate::authorize::{defaults, Authorize};
use crate::directory::SsoDirectory;

/// Default location of the AWS CLI SSO token cache.
pub fn aws_cli_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".aws").join("sso").join("cache"))
}

/// Cache file name the AWS CLI uses for a session name or a start URL.
fn cache_file_name(key: &str) -> String {
    format!("{}.json", hex::encode(Sha1::digest(key.as_bytes())))
}

/// Reuses tokens from the AWS CLI SSO cache and stores fresh ones there.
pub struct CachedAuthorizer<A> {
    inner: A,
    cache_dir: PathBuf,
    sso_region: String,
    read_cache: bool,
}

impl<A> CachedAuthorizer<A> {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(inner: A, cache_dir: P, sso_region: S) -> Self {
        CachedAuthorizer {
            inner,
            cache_dir: cache_dir.into(),
            sso_region: sso_region.into(),
            read_cache: true,
        }
    }

    /// Always authorize through the inner authorizer; still store what it returns.
    pub fn ignore_cached(mut self, ignore: bool) -> Self {
        self.read_cache = !ignore;
        self
    }

    fn candidates(&self, directory: &SsoDirectory) -> [PathBuf; 2] {
        [
            self.cache_dir.join(cache_file_name(directory.name())),
            self.cache_dir.join(cache_file_name(&directory.start_url())),
        ]
    }

    fn read_cached(&self, directory: &SsoDirectory) -> Option<CachedToken> {
        let start_url = directory.start_url();
        let margin = Duration::minutes(defaults::EXPIRY_MARGIN_MINUTES);
        self.candidates(directory)
            .iter()
            .filter_map(|path| read_token(path))
            .find(|cached| cached.start_url == start_url && cached.is_fresh(Utc::now(), margin))
    }

    fn write_cached(&self, directory: &SsoDirectory, token: &AccessToken) -> anyhow::Result<()> {
        let expires_at = match token.expires_at() {
            Some(expires_at) => expires_at,
            None => return Ok(()),
        };

        let cached = CachedToken {
            start_url: directory.start_url(),
            region: self.sso_region.clone(),
            access_token: token.token().to_string(),
            expires_at,
            client_id: None,
            client_secret: None,
            registration_expires_at: None,
        };

        fs::create_dir_all(&self.cache_dir)?;
        let path = self.cache_dir.join(cache_file_name(directory.name()));
        let mut file = open_private(&path)?;
        file.write_all(serde_json::to_string(&cached)?.as_bytes())?;
        debug!("stored access token. path:{}", path.display());
        Ok(())
    }
}

fn read_token(path: &Path) -> Option<CachedToken> {
    let json = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&json) {
        Ok(cached) => Some(cached),
        Err(e) => {
            warn!("ignoring unreadable token cache. path:{}, {}", path.display(), e);
            None
        }
    }
}

#[async_trait]
impl<A> Authorize for CachedAuthorizer<A>
where
    A: Authorize + Send + Sync,
{
    async fn authorize(&self, directory: &SsoDirectory) -> anyhow::Result<AccessToken> {
        if self.read_cache {
            if let Some(cached) = self.read_cached(directory) {
                info!("Using cached access token for {}", directory);
                return Ok(AccessToken::from(cached));
            }
        }

        let token = self.inner.authorize(directory).await?;
        if let Err(e) = self.write_cached(directory, &token) {
            warn!("failed to store access token for {}. {:?}", directory, e);
        }
        Ok(token)
    }
}
