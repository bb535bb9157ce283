use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_types::region::Region;
use aws_types::SdkConfig;

pub mod defaults {
    pub const MAX_ATTEMPTS: u32 = 10;
}

/// Loads the SDK configuration shared by the SSO and SSO OIDC clients.
///
/// Both APIs authenticate with bearer tokens or not at all, so no credentials are resolved.
pub async fn load_sdk_config(sso_region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(sso_region.to_string()))
        .retry_config(RetryConfig::standard().with_max_attempts(defaults::MAX_ATTEMPTS))
        .no_credentials()
        .load()
        .await
}
