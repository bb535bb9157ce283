use anyhow::{bail, Context};
use sso_profiles_schema::grant::{AccountGrant, RoleGrant};
use tracing::{debug, info};

use crate::authorize::Authorize;
use crate::directory::{defaults, SsoDirectory};
use crate::grants::ListGrants;
use crate::naming::{ProfileNamer, Replacement};
use crate::profile::{ExtraVars, ProfileRecord};
use crate::progress;
use crate::template::{dedent, DEFAULT_PROFILE_TEMPLATE};

/// Everything that shapes the generated config, apart from the grants themselves.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    sso_directories: Vec<SsoDirectory>,
    profile_template: String,
    extra_vars: ExtraVars,
    namer: ProfileNamer,
    sso_region: String,
}

impl GenerateRequest {
    pub fn new(sso_directories: Vec<SsoDirectory>) -> anyhow::Result<Self> {
        Ok(GenerateRequest {
            sso_directories,
            profile_template: DEFAULT_PROFILE_TEMPLATE.to_string(),
            extra_vars: ExtraVars::default(),
            namer: ProfileNamer::new(Vec::new())?,
            sso_region: defaults::SSO_REGION.to_string(),
        })
    }

    pub fn profile_template<S: Into<String>>(mut self, template: S) -> Self {
        self.profile_template = template.into();
        self
    }

    pub fn extra_vars(mut self, extra_vars: ExtraVars) -> Self {
        self.extra_vars = extra_vars;
        self
    }

    pub fn regex_replacements(mut self, replacements: Vec<Replacement>) -> anyhow::Result<Self> {
        self.namer = ProfileNamer::new(replacements)?;
        Ok(self)
    }

    pub fn sso_region<S: Into<String>>(mut self, sso_region: S) -> Self {
        self.sso_region = sso_region.into();
        self
    }

    /// Directories in processing order, each one once.
    fn directories(&self) -> Vec<&SsoDirectory> {
        let mut directories = self.sso_directories.iter().collect::<Vec<_>>();
        directories.sort();
        directories.dedup();
        directories
    }

    /// Renders the template against a placeholder record, so a bad template fails before any request.
    fn check_template(&self, template: &str) -> anyhow::Result<()> {
        let record = ProfileRecord::new(
            &self.namer,
            "sso-session",
            &AccountGrant::new("000000000000", "account"),
            &RoleGrant::new("000000000000", "role"),
        );
        record
            .render(template, &self.extra_vars)
            .map(|_| ())
            .context("invalid profile template")
    }
}

pub struct ConfigGenerator<A, L> {
    authorizer: A,
    lister: L,
}

impl<A, L> ConfigGenerator<A, L>
where
    A: Authorize + Send + Sync,
    L: ListGrants + Send + Sync,
{
    pub fn new(authorizer: A, lister: L) -> Self {
        Self { authorizer, lister }
    }

    /// Renders an `sso-session` block per directory, followed by a `profile` block per granted role.
    pub async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<String> {
        if request.sso_directories.is_empty() {
            bail!("at least one SSO directory is required");
        }

        let template = dedent(&request.profile_template);
        request.check_template(&template)?;

        let mut blocks = Vec::new();
        for directory in request.directories() {
            blocks.push(directory.session_block(&request.sso_region)?);
            for record in self.profile_records(request, directory).await? {
                blocks.push(dedent(&record.render(&template, &request.extra_vars)?));
            }
        }

        Ok(blocks.concat())
    }

    /// One record per granted (account, role) pair of `directory`.
    pub async fn profile_records(
        &self,
        request: &GenerateRequest,
        directory: &SsoDirectory,
    ) -> anyhow::Result<Vec<ProfileRecord>> {
        let token = self
            .authorizer
            .authorize(directory)
            .await
            .with_context(|| format!("failed to authorize SSO directory: {}", directory))?;

        let spinner = progress::create_spinner("Listing accounts...");
        let mut accounts = match self.lister.list_accounts(&token).await {
            Ok(accounts) => {
                progress::finish_success(&spinner, "Listed accounts");
                accounts
            }
            Err(e) => {
                progress::finish_error(&spinner, "Failed to list accounts");
                return Err(e.context(format!("failed to list accounts of {}", directory)));
            }
        };
        accounts.sort_by(|a, b| {
            (a.account_name(), a.account_id()).cmp(&(b.account_name(), b.account_id()))
        });
        info!("{} accounts found in {}", accounts.len(), directory);

        let bar = progress::create_progress_bar(
            accounts.len() as u64,
            "Listing roles for accounts...",
        );
        let mut records = Vec::new();
        for account in accounts.iter() {
            let mut roles = match self.lister.list_account_roles(&token, account).await {
                Ok(roles) => roles,
                Err(e) => {
                    progress::finish_error(&bar, "Failed to list roles");
                    return Err(e.context(format!(
                        "failed to list roles of account {} ({})",
                        account.account_name(),
                        account.account_id()
                    )));
                }
            };
            roles.sort_by(|a, b| a.role_name().cmp(b.role_name()));
            bar.inc(1);

            for role in roles.iter() {
                let record = ProfileRecord::new(&request.namer, directory.name(), account, role);
                debug!("profile:{}", record.profile_name());
                records.push(record);
            }
        }

        progress::finish_success(&bar, "Listed roles for accounts");
        Ok(records)
    }
}
