use std::fmt;
use std::str::FromStr;

use anyhow::bail;

use crate::template::{dedent, render, Variables, SSO_SESSION_TEMPLATE};

pub mod defaults {
    pub const SSO_REGION: &str = "us-east-1";
}

/// A named AWS SSO instance, reachable at `https://<name>.awsapps.com/start`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct SsoDirectory {
    name: String,
}

impl SsoDirectory {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_url(&self) -> String {
        format!("https://{}.awsapps.com/start", self.name)
    }

    /// Renders the `[sso-session <name>]` block for this directory.
    pub fn session_block(&self, sso_region: &str) -> anyhow::Result<String> {
        let variables = Variables::from([
            ("sso_session_name".to_string(), self.name.clone()),
            ("sso_start_url".to_string(), self.start_url()),
            ("sso_region".to_string(), sso_region.to_string()),
        ]);
        render(&dedent(SSO_SESSION_TEMPLATE), &variables)
    }
}

impl FromStr for SsoDirectory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // the name becomes a DNS label of awsapps.com
        let valid = !s.is_empty()
            && s.len() <= 63
            && !s.starts_with('-')
            && !s.ends_with('-')
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

        if !valid {
            bail!(
                "cannot build an SSO start URL from directory name: '{}'",
                s
            );
        }

        Ok(SsoDirectory {
            name: s.to_string(),
        })
    }
}

impl fmt::Display for SsoDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
