use std::io;
use std::io::Write;

use async_trait::async_trait;

/// What the user needs to approve a pending device authorization.
#[derive(Debug, Clone)]
pub struct DeviceVerification {
    pub verification_uri: String,
    pub user_code: String,
}

#[async_trait]
pub trait PromptVerification {
    async fn prompt_verification(&self, verification: &DeviceVerification) -> anyhow::Result<()>;
}

/// Writes the verification link to stderr, leaving stdout to the generated config.
pub struct StderrVerificationPrompt;

#[async_trait]
impl PromptVerification for StderrVerificationPrompt {
    async fn prompt_verification(&self, verification: &DeviceVerification) -> anyhow::Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(
            stderr,
            "Open {} to approve this device (code: {}).",
            verification.verification_uri, verification.user_code
        )?;
        stderr.flush()?;
        Ok(())
    }
}
