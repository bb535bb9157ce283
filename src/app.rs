use async_trait::async_trait;
use clap::Parser;
use sso_profiles_schema::token::AccessToken;
use tracing::{debug, warn};

use crate::authorize::cache::{aws_cli_cache_dir, CachedAuthorizer};
use crate::authorize::device::DeviceAuthorizer;
use crate::authorize::registration::ClientRegistrationStore;
use crate::authorize::{Authorize, StaticAccessToken};
use crate::config::load_sdk_config;
use crate::directory::{defaults, SsoDirectory};
use crate::grants::aws_sdk::AwsSdkGrantLister;
use crate::naming::Replacement;
use crate::profile::{ExtraVar, ExtraVars};
use crate::prompt::StderrVerificationPrompt;
use crate::run::{ConfigGenerator, GenerateRequest};
use crate::template::DEFAULT_PROFILE_TEMPLATE;

/// Generate AWS CLI `sso-session` and `profile` blocks for every account and role granted by AWS SSO.
#[derive(Parser, Debug)]
#[command(name = "generate-sso-profiles", version, arg_required_else_help = true)]
pub struct Args {
    /// SSO directory names, used to define `sso-session` blocks and to build SSO start URLs.
    #[arg(short = 's', long = "sso-directories", value_name = "DIRECTORY", required = true)]
    sso_directories: Vec<SsoDirectory>,

    /// An AWS CLI profile block template with {placeholders} for profile values.
    ///
    /// Supported placeholders: profile_name, account_name, account_id, role_name, sso_session,
    /// and any key given with --extra-vars.
    #[arg(
        short = 't',
        long = "profile-template",
        value_name = "TEMPLATE",
        default_value = DEFAULT_PROFILE_TEMPLATE,
        hide_default_value = true
    )]
    profile_template: String,

    /// Custom variables that can be referenced with {placeholders} in a profile template.
    #[arg(short = 'e', long = "extra-vars", value_name = "KEY=VALUE")]
    extra_vars: Vec<ExtraVar>,

    /// Regex replacements to perform on generated profile names, applied in the given order.
    #[arg(short = 'r', long = "regex-replacements", value_name = "PATTERN,REPLACEMENT")]
    regex_replacements: Vec<Replacement>,

    /// Region of the SSO instance.
    #[arg(long, value_name = "REGION", default_value = defaults::SSO_REGION)]
    sso_region: String,

    /// Use this access token instead of signing in.
    #[arg(long, value_name = "TOKEN")]
    access_token: Option<String>,

    /// Sign in again even if the AWS CLI cache holds a valid token.
    #[arg(long, conflicts_with = "access_token")]
    ignore_cache: bool,
}

type PromptingAuthorizer = DeviceAuthorizer<StderrVerificationPrompt>;

enum Authorizer {
    Static(StaticAccessToken),
    Device(PromptingAuthorizer),
    Cached(CachedAuthorizer<PromptingAuthorizer>),
}

#[async_trait]
impl Authorize for Authorizer {
    async fn authorize(&self, directory: &SsoDirectory) -> anyhow::Result<AccessToken> {
        use Authorizer::*;
        match self {
            Static(a) => a.authorize(directory).await,
            Device(a) => a.authorize(directory).await,
            Cached(a) => a.authorize(directory).await,
        }
    }
}

fn authorizer_from(args: &Args, config: &aws_types::SdkConfig) -> Authorizer {
    if let Some(token) = args.access_token.as_ref() {
        return Authorizer::Static(StaticAccessToken::from(token));
    }

    let device = DeviceAuthorizer::new(
        config,
        ClientRegistrationStore::default(),
        StderrVerificationPrompt,
    );
    match aws_cli_cache_dir() {
        Some(cache_dir) => Authorizer::Cached(
            CachedAuthorizer::new(device, cache_dir, &args.sso_region)
                .ignore_cached(args.ignore_cache),
        ),
        None => {
            warn!("home directory not found, access tokens will not be cached.");
            Authorizer::Device(device)
        }
    }
}

impl Args {
    fn request(&self) -> anyhow::Result<GenerateRequest> {
        let request = GenerateRequest::new(self.sso_directories.clone())?
            .profile_template(self.profile_template.as_str())
            .extra_vars(ExtraVars::new(self.extra_vars.clone())?)
            .regex_replacements(self.regex_replacements.clone())?
            .sso_region(self.sso_region.as_str());
        Ok(request)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let request = self.request()?;
        debug!("request:{:?}", request);

        let config = load_sdk_config(&self.sso_region).await;
        let generator = ConfigGenerator::new(
            authorizer_from(&self, &config),
            AwsSdkGrantLister::new(&config),
        );

        let output = generator.generate(&request).await?;
        println!("{}", output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sso_directories_are_required() {
        let err = Args::try_parse_from(["generate-sso-profiles", "-e", "region=us-west-2"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn no_arguments_shows_help() {
        let err = Args::try_parse_from(["generate-sso-profiles"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn parses_repeated_options() {
        let args = Args::try_parse_from([
            "generate-sso-profiles",
            "-s",
            "acme",
            "--sso-directories",
            "acme-labs",
            "-e",
            "region=us-west-2",
            "-e",
            "output=json",
            "-r",
            "Sandbox-,sbx-",
        ])
        .unwrap();

        let names = args.sso_directories.iter().map(|d| d.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["acme", "acme-labs"]);
        assert_eq!(args.extra_vars.len(), 2);
        assert_eq!(args.regex_replacements[0].pattern(), "Sandbox-");
        assert_eq!(args.profile_template, DEFAULT_PROFILE_TEMPLATE);
        assert_eq!(args.sso_region, "us-east-1");
        assert!(args.request().is_ok());
    }

    #[test]
    fn malformed_values_fail_at_parse_time() {
        for argv in [
            ["generate-sso-profiles", "-s", "acme", "-e", "region"],
            ["generate-sso-profiles", "-s", "acme", "-e", "a=b=c"],
            ["generate-sso-profiles", "-s", "acme", "-r", "no-comma"],
            ["generate-sso-profiles", "-s", "acme", "-r", "a,b,c"],
            ["generate-sso-profiles", "-s", "acme", "-r", "(,x"],
            ["generate-sso-profiles", "-s", "acme.corp", "-e", "a=b"],
        ] {
            let err = Args::try_parse_from(argv).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{:?}", argv);
        }
    }

    #[test]
    fn extra_vars_cannot_shadow_placeholders() {
        let args =
            Args::try_parse_from(["generate-sso-profiles", "-s", "acme", "-e", "role_name=x"])
                .unwrap();
        assert!(args.request().is_err());
    }

    #[test]
    fn access_token_conflicts_with_ignore_cache() {
        let err = Args::try_parse_from([
            "generate-sso-profiles",
            "-s",
            "acme",
            "--access-token",
            "token",
            "--ignore-cache",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
