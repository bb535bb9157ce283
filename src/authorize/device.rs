use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use aws_sdk_ssooidc::operation::create_token::CreateTokenError;
use aws_types::SdkConfig;
use chrono::Utc;
use sso_profiles_schema::token::{AccessToken, RegisteredClient};
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::authorize::registration::{ClientRegistrationStore, CLIENT_NAME};
use crate::authorize::Authorize;
use crate::directory::SsoDirectory;
use crate::progress;
use crate::prompt::{DeviceVerification, PromptVerification};

mod defaults {
    pub const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
    pub const CLIENT_TYPE: &str = "public";
    pub const POLL_INTERVAL_SECONDS: u64 = 5;
    pub const SLOW_DOWN_SECONDS: u64 = 5;
    pub const DEVICE_CODE_LIFETIME_SECONDS: u64 = 600;
}

/// Interval to wait between token polls, honoring what the service asked for.
fn poll_interval(interval_seconds: i32) -> Duration {
    match u64::try_from(interval_seconds) {
        Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
        _ => Duration::from_secs(defaults::POLL_INTERVAL_SECONDS),
    }
}

/// How long the device code stays valid. An unset lifetime gets the default.
fn device_code_lifetime(expires_in_seconds: i32) -> Duration {
    match u64::try_from(expires_in_seconds) {
        Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
        _ => Duration::from_secs(defaults::DEVICE_CODE_LIFETIME_SECONDS),
    }
}

enum PollError {
    Pending,
    SlowDown,
    Failed(anyhow::Error),
}

impl From<anyhow::Error> for PollError {
    fn from(e: anyhow::Error) -> Self {
        PollError::Failed(e)
    }
}

/// Calls `poll` until it yields a token, fails, or the device code runs out.
async fn poll_for_token<F, Fut>(
    interval: Duration,
    lifetime: Duration,
    poll: F,
) -> anyhow::Result<AccessToken>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<AccessToken, PollError>>,
{
    let spinner = progress::create_spinner("Waiting for device authorization...");
    let result = poll_until_approved(interval, lifetime, poll).await;
    match result {
        Ok(_) => progress::finish_success(&spinner, "Device authorized"),
        Err(_) => progress::finish_error(&spinner, "Device authorization failed"),
    }
    result
}

async fn poll_until_approved<F, Fut>(
    mut interval: Duration,
    lifetime: Duration,
    mut poll: F,
) -> anyhow::Result<AccessToken>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<AccessToken, PollError>>,
{
    let deadline = Instant::now() + lifetime;
    loop {
        match poll().await {
            Ok(token) => return Ok(token),
            Err(PollError::Pending) => debug!("authorization pending."),
            Err(PollError::SlowDown) => {
                interval += Duration::from_secs(defaults::SLOW_DOWN_SECONDS);
                debug!("asked to slow down. interval:{:?}", interval);
            }
            Err(PollError::Failed(e)) => return Err(e),
        }

        if Instant::now() + interval > deadline {
            bail!("device code expired before the authorization was approved");
        }
        tokio::time::sleep(interval).await;
    }
}

/// Signs in through the OIDC device authorization flow of IAM Identity Center.
pub struct DeviceAuthorizer<P> {
    client: aws_sdk_ssooidc::Client,
    registrations: ClientRegistrationStore,
    registered: OnceCell<RegisteredClient>,
    prompt: P,
}

impl<P> DeviceAuthorizer<P>
where
    P: PromptVerification + Send + Sync,
{
    pub fn new(config: &SdkConfig, registrations: ClientRegistrationStore, prompt: P) -> Self {
        DeviceAuthorizer {
            client: aws_sdk_ssooidc::Client::new(config),
            registrations,
            registered: OnceCell::new(),
            prompt,
        }
    }

    async fn registered_client(&self) -> anyhow::Result<&RegisteredClient> {
        self.registered.get_or_try_init(|| self.register()).await
    }

    async fn register(&self) -> anyhow::Result<RegisteredClient> {
        if let Some(client) = self.registrations.load() {
            info!("Using cached ID client");
            return Ok(client);
        }

        info!("Registering a new ID client");
        let output = self
            .client
            .register_client()
            .client_name(CLIENT_NAME)
            .client_type(defaults::CLIENT_TYPE)
            .send()
            .await?;

        let client = RegisteredClient {
            client_id: output
                .client_id()
                .ok_or_else(|| anyhow!("register-client didn't return a client id"))?
                .to_string(),
            client_secret: output
                .client_secret()
                .ok_or_else(|| anyhow!("register-client didn't return a client secret"))?
                .to_string(),
            client_id_issued_at: output.client_id_issued_at(),
            client_secret_expires_at: output.client_secret_expires_at(),
        };

        self.registrations.save(&client)?;
        Ok(client)
    }

    async fn create_token(
        &self,
        client: &RegisteredClient,
        device_code: &str,
    ) -> Result<AccessToken, PollError> {
        let issued_at = Utc::now();
        let result = self
            .client
            .create_token()
            .client_id(client.client_id())
            .client_secret(client.client_secret())
            .grant_type(defaults::GRANT_TYPE)
            .device_code(device_code)
            .send()
            .await;

        match result {
            Ok(output) => {
                let token = output
                    .access_token()
                    .ok_or_else(|| anyhow!("create-token didn't return an access token"))?;
                Ok(AccessToken {
                    token: token.to_string(),
                    expires_at: Some(
                        issued_at + chrono::Duration::seconds(i64::from(output.expires_in())),
                    ),
                })
            }
            Err(e) => match e.as_service_error() {
                Some(CreateTokenError::AuthorizationPendingException(_)) => Err(PollError::Pending),
                Some(CreateTokenError::SlowDownException(_)) => Err(PollError::SlowDown),
                _ => Err(PollError::Failed(e.into())),
            },
        }
    }
}

#[async_trait]
impl<P> Authorize for DeviceAuthorizer<P>
where
    P: PromptVerification + Send + Sync,
{
    async fn authorize(&self, directory: &SsoDirectory) -> anyhow::Result<AccessToken> {
        let client = self.registered_client().await?;
        let start_url = directory.start_url();

        let device = self
            .client
            .start_device_authorization()
            .client_id(client.client_id())
            .client_secret(client.client_secret())
            .start_url(&start_url)
            .send()
            .await?;

        let device_code = device
            .device_code()
            .ok_or_else(|| anyhow!("start-device-authorization didn't return a device code"))?;
        let verification_uri = device
            .verification_uri_complete()
            .or_else(|| device.verification_uri())
            .ok_or_else(|| anyhow!("start-device-authorization didn't return a verification URI"))?;

        self.prompt
            .prompt_verification(&DeviceVerification {
                verification_uri: verification_uri.to_string(),
                user_code: device.user_code().unwrap_or_default().to_string(),
            })
            .await?;

        debug!("polling for a token. start_url:{}", start_url);
        poll_for_token(
            poll_interval(device.interval()),
            device_code_lifetime(device.expires_in()),
            || self.create_token(client, device_code),
        )
        .await
        .with_context(|| format!("device authorization for {} failed", directory))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    fn token() -> AccessToken {
        AccessToken {
            token: "approved".to_string(),
            expires_at: None,
        }
    }

    /// Hands out `results` one per poll and records when each poll happened.
    fn scripted(
        results: Vec<Result<AccessToken, PollError>>,
        polled_at: &mut Vec<Instant>,
    ) -> impl FnMut() -> std::future::Ready<Result<AccessToken, PollError>> + '_ {
        let mut results = VecDeque::from(results);
        move || {
            polled_at.push(Instant::now());
            std::future::ready(results.pop_front().unwrap_or(Err(PollError::Pending)))
        }
    }

    fn gaps(polled_at: &[Instant]) -> Vec<Duration> {
        polled_at.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_the_device_is_approved() {
        let mut polled_at = Vec::new();
        let results = vec![Err(PollError::Pending), Err(PollError::Pending), Ok(token())];

        let token = poll_for_token(
            Duration::from_secs(5),
            Duration::from_secs(600),
            scripted(results, &mut polled_at),
        )
        .await
        .unwrap();

        assert_eq!(token.token(), "approved");
        assert_eq!(gaps(&polled_at), vec![Duration::from_secs(5); 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_down_widens_the_interval() {
        let mut polled_at = Vec::new();
        let results = vec![
            Err(PollError::SlowDown),
            Err(PollError::Pending),
            Err(PollError::SlowDown),
            Ok(token()),
        ];

        poll_for_token(
            Duration::from_secs(5),
            Duration::from_secs(600),
            scripted(results, &mut polled_at),
        )
        .await
        .unwrap();

        assert_eq!(
            gaps(&polled_at),
            vec![
                Duration::from_secs(10),
                Duration::from_secs(10),
                Duration::from_secs(15)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_stop_polling() {
        let mut polled_at = Vec::new();
        let results = vec![
            Err(PollError::Pending),
            Err(PollError::Failed(anyhow!("access denied"))),
            Ok(token()),
        ];

        let err = poll_for_token(
            Duration::from_secs(5),
            Duration::from_secs(600),
            scripted(results, &mut polled_at),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("access denied"), "{}", err);
        assert_eq!(polled_at.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_when_the_device_code_expires() {
        let mut polled_at = Vec::new();

        let err = poll_for_token(
            Duration::from_secs(5),
            Duration::from_secs(12),
            scripted(Vec::new(), &mut polled_at),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("expired"), "{}", err);
        assert_eq!(polled_at.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unset_lifetime_still_waits_for_approval() {
        let mut polled_at = Vec::new();
        let results = vec![Err(PollError::Pending), Ok(token())];

        let token = poll_for_token(
            poll_interval(0),
            device_code_lifetime(0),
            scripted(results, &mut polled_at),
        )
        .await
        .unwrap();

        assert_eq!(token.token(), "approved");
    }

    #[test]
    fn device_code_lifetime_falls_back_to_default() {
        assert_eq!(device_code_lifetime(0), Duration::from_secs(600));
        assert_eq!(device_code_lifetime(-1), Duration::from_secs(600));
        assert_eq!(device_code_lifetime(300), Duration::from_secs(300));
    }

    #[test]
    fn poll_interval_falls_back_to_default() {
        assert_eq!(poll_interval(0), Duration::from_secs(5));
        assert_eq!(poll_interval(-1), Duration::from_secs(5));
        assert_eq!(poll_interval(2), Duration::from_secs(2));
    }
}
