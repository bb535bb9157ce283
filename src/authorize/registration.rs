use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use sso_profiles_schema::token::RegisteredClient;
use tracing::{debug, info};

use crate::authorize::defaults;

pub const CLIENT_NAME: &str = "sso-config-generator";

/// Keeps the OIDC client registration between runs, so a new client isn't registered every time.
#[derive(Debug, Clone)]
pub struct ClientRegistrationStore {
    path: Option<PathBuf>,
}

impl Default for ClientRegistrationStore {
    fn default() -> Self {
        let path = dirs::cache_dir()
            .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("client.json"));
        ClientRegistrationStore { path }
    }
}

impl ClientRegistrationStore {
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        ClientRegistrationStore {
            path: Some(path.into()),
        }
    }

    /// Returns the stored registration if its secret stays valid for a while longer.
    pub fn load(&self) -> Option<RegisteredClient> {
        let path = self.path.as_ref()?;
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                info!("No cached ID client found. path:{}, {}", path.display(), e);
                return None;
            }
        };

        let client = match serde_json::from_str::<RegisteredClient>(&json) {
            Ok(client) => client,
            Err(e) => {
                info!("Cached ID client missing required keys. {}", e);
                return None;
            }
        };

        if client.is_fresh(Utc::now(), Duration::minutes(defaults::EXPIRY_MARGIN_MINUTES)) {
            Some(client)
        } else {
            info!("Cached ID client is about to expire");
            None
        }
    }

    pub fn save(&self, client: &RegisteredClient) -> anyhow::Result<()> {
        let path = match self.path.as_ref() {
            Some(path) => path,
            None => {
                debug!("no cache directory, ID client will not be stored.");
                return Ok(());
            }
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(client)?;
        let mut file = open_private(path)?;
        file.write_all(json.as_bytes())?;
        debug!("stored ID client. path:{}", path.display());
        Ok(())
    }
}

#[cfg(unix)]
pub(crate) fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
pub(crate) fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}
