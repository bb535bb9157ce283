use anyhow::anyhow;
use async_trait::async_trait;
use aws_types::SdkConfig;
use sso_profiles_schema::grant::{AccountGrant, RoleGrant};
use sso_profiles_schema::token::AccessToken;
use tracing::debug;

use crate::grants::ListGrants;

pub struct AwsSdkGrantLister {
    client: aws_sdk_sso::Client,
}

impl AwsSdkGrantLister {
    pub fn new(config: &SdkConfig) -> Self {
        AwsSdkGrantLister {
            client: aws_sdk_sso::Client::new(config),
        }
    }
}

#[async_trait]
impl ListGrants for AwsSdkGrantLister {
    async fn list_accounts(&self, token: &AccessToken) -> anyhow::Result<Vec<AccountGrant>> {
        let accounts = self
            .client
            .list_accounts()
            .access_token(token.token())
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await?;

        debug!("listed {} accounts", accounts.len());
        accounts
            .into_iter()
            .map(|account| -> anyhow::Result<AccountGrant> {
                let account_id = account
                    .account_id()
                    .ok_or_else(|| anyhow!("list-accounts returned an account without id"))?;
                Ok(AccountGrant::new(
                    account_id,
                    account.account_name().unwrap_or(account_id),
                ))
            })
            .collect()
    }

    async fn list_account_roles(
        &self,
        token: &AccessToken,
        account: &AccountGrant,
    ) -> anyhow::Result<Vec<RoleGrant>> {
        let roles = self
            .client
            .list_account_roles()
            .access_token(token.token())
            .account_id(account.account_id())
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await?;

        debug!(
            "listed {} roles. account:{}",
            roles.len(),
            account.account_name()
        );
        roles
            .into_iter()
            .map(|role| -> anyhow::Result<RoleGrant> {
                let role_name = role.role_name().ok_or_else(|| {
                    anyhow!(
                        "list-account-roles returned a role without name. account:{}",
                        account.account_id()
                    )
                })?;
                Ok(RoleGrant::new(
                    role.account_id().unwrap_or(account.account_id()),
                    role_name,
                ))
            })
            .collect()
    }
}
