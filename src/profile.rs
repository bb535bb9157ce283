use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use sso_profiles_schema::grant::{AccountGrant, RoleGrant};

use crate::naming::ProfileNamer;
use crate::template::{render, Variables};

/// Placeholders every profile record provides.
pub const STANDARD_PLACEHOLDERS: [&str; 5] = [
    "profile_name",
    "account_name",
    "account_id",
    "role_name",
    "sso_session",
];

/// A `key=value` pair given with `--extra-vars`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExtraVar {
    pub key: String,
    pub value: String,
}

impl FromStr for ExtraVar {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.contains('=') => Ok(ExtraVar {
                key: key.to_string(),
                value: value.to_string(),
            }),
            _ => Err(anyhow!(
                "Expected values in the form 'key=value', got: '{}'",
                s
            )),
        }
    }
}

/// Custom variables available to the profile template.
#[derive(Debug, Clone, Default)]
pub struct ExtraVars {
    vars: BTreeMap<String, String>,
}

impl ExtraVars {
    /// Later occurrences of a key replace earlier ones.
    pub fn new<I: IntoIterator<Item = ExtraVar>>(vars: I) -> anyhow::Result<Self> {
        let mut collected = BTreeMap::new();
        for ExtraVar { key, value } in vars {
            if STANDARD_PLACEHOLDERS.contains(&key.as_str()) {
                bail!(
                    "extra variable `{}` conflicts with a built-in placeholder",
                    key
                );
            }
            collected.insert(key, value);
        }
        Ok(ExtraVars { vars: collected })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProfileRecord {
    pub profile_name: String,
    pub account_name: String,
    pub account_id: String,
    pub role_name: String,
    pub sso_session: String,
}

impl ProfileRecord {
    pub fn new(
        namer: &ProfileNamer,
        sso_session: &str,
        account: &AccountGrant,
        role: &RoleGrant,
    ) -> Self {
        ProfileRecord {
            profile_name: namer.profile_name(account.account_name(), role.role_name()),
            account_name: account.account_name().to_string(),
            account_id: account.account_id().to_string(),
            role_name: role.role_name().to_string(),
            sso_session: sso_session.to_string(),
        }
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn variables(&self, extra_vars: &ExtraVars) -> Variables {
        let mut variables = extra_vars.vars.clone();
        variables.extend([
            ("profile_name".to_string(), self.profile_name.clone()),
            ("account_name".to_string(), self.account_name.clone()),
            ("account_id".to_string(), self.account_id.clone()),
            ("role_name".to_string(), self.role_name.clone()),
            ("sso_session".to_string(), self.sso_session.clone()),
        ]);
        variables
    }

    /// `template` is expected to be dedented already.
    pub fn render(&self, template: &str, extra_vars: &ExtraVars) -> anyhow::Result<String> {
        render(template, &self.variables(extra_vars)).map_err(|e| {
            e.context(format!("failed to render profile: {}", self.profile_name))
        })
    }
}
