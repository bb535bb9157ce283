use async_trait::async_trait;
use sso_profiles_schema::grant::{AccountGrant, RoleGrant};
use sso_profiles_schema::token::AccessToken;

pub mod aws_sdk;

/// Lists what an SSO access token grants, in the order the service reports it.
#[async_trait]
pub trait ListGrants {
    async fn list_accounts(&self, token: &AccessToken) -> anyhow::Result<Vec<AccountGrant>>;

    async fn list_account_roles(
        &self,
        token: &AccessToken,
        account: &AccountGrant,
    ) -> anyhow::Result<Vec<RoleGrant>>;
}
