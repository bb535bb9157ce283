/// An account the caller's SSO identity can access.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AccountGrant {
    pub account_id: String,
    pub account_name: String,
}

impl AccountGrant {
    pub fn new<S: Into<String>, T: Into<String>>(account_id: S, account_name: T) -> Self {
        AccountGrant {
            account_id: account_id.into(),
            account_name: account_name.into(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }
}

/// A role available on an [`AccountGrant`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RoleGrant {
    pub account_id: String,
    pub role_name: String,
}

impl RoleGrant {
    pub fn new<S: Into<String>, T: Into<String>>(account_id: S, role_name: T) -> Self {
        RoleGrant {
            account_id: account_id.into(),
            role_name: role_name.into(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn role_name(&self) -> &str {
        &self.role_name
    }
}
