//! oidc-resolver CLI
//!
//! Decodes OpenID Connect access tokens and resolves them to local users
//! against a directory described in TOML.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod directory_file;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use oidc_resolver::{AuthConfig, IdentityResolver, ResolutionOutcome};
use oidc_resolver_jwt::{JwksTokenValidator, JwtConfig, decode_claims};

use directory_file::DirectoryFile;

/// OpenID Connect identity resolution tool
#[derive(Parser, Debug)]
#[command(name = "oidc-resolver")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file with `[auth]` and `[jwt]` tables
    #[arg(short, long, env = "OIDC_RESOLVER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the claims carried by an access token, without verifying it
    Decode {
        /// Access token
        #[arg(env = "OIDC_ACCESS_TOKEN")]
        token: String,
    },
    /// Verify an access token and resolve it to a local user
    Resolve {
        /// Access token
        #[arg(env = "OIDC_ACCESS_TOKEN")]
        token: String,

        /// Directory file describing domains, users and bindings
        #[arg(short, long)]
        directory: PathBuf,

        /// Verify against keys from a local JWKS document instead of `jwt.jwks_url`
        #[arg(long)]
        jwks_file: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "debug"
    } else {
        "warn,oidc_resolver=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn token_validator(config: Option<&Path>, jwks_file: Option<&Path>) -> Result<JwksTokenValidator> {
    match (config, jwks_file) {
        (config, Some(jwks_file)) => {
            let jwt = match config {
                Some(path) => JwtConfig::load_for_static_keys(path)?,
                None => JwtConfig::default(),
            };
            let document = std::fs::read_to_string(jwks_file)
                .with_context(|| format!("failed to read JWKS file {}", jwks_file.display()))?;
            tracing::debug!(path = %jwks_file.display(), "Using static JWKS keys");
            Ok(JwksTokenValidator::from_jwks_json(&document, jwt)?)
        }
        (Some(path), None) => {
            let jwt = JwtConfig::load(path)?;
            tracing::debug!(jwks_url = %jwt.jwks_url, "Using remote JWKS keys");
            Ok(JwksTokenValidator::new(jwt))
        }
        (None, None) => anyhow::bail!("either --config with a [jwt] table or --jwks-file is required"),
    }
}

fn decode(token: &str) -> Result<ExitCode> {
    let claims = decode_claims(token)?;
    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(ExitCode::SUCCESS)
}

async fn resolve(
    config: Option<&Path>,
    token: &str,
    directory: &Path,
    jwks_file: Option<&Path>,
) -> Result<ResolutionOutcome> {
    let auth = match config {
        Some(path) => AuthConfig::load(path)?,
        None => AuthConfig::default(),
    };
    let validator = token_validator(config, jwks_file)?;
    let dirs = DirectoryFile::load(directory)?.into_directories();

    let resolver = IdentityResolver::new(
        Arc::new(validator),
        Arc::new(dirs.users),
        Arc::new(dirs.domains),
        Arc::new(dirs.binding),
    );

    Ok(resolver
        .resolve_within(token, auth.resolve_timeout())
        .await?)
}

fn report(outcome: ResolutionOutcome) -> (serde_json::Value, ExitCode) {
    match outcome {
        ResolutionOutcome::Authenticated(user) => {
            tracing::info!(user = %user.id, email = %user.email, "Token resolved");
            (json!({ "authenticated": true, "user": user }), ExitCode::SUCCESS)
        }
        ResolutionOutcome::Rejected(rejection) => (
            json!({ "authenticated": false, "reason": rejection.message() }),
            ExitCode::from(2),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Decode { token } => decode(&token),
        Command::Resolve {
            token,
            directory,
            jwks_file,
        } => {
            let outcome = resolve(
                args.config.as_deref(),
                &token,
                &directory,
                jwks_file.as_deref(),
            )
            .await?;
            let (body, code) = report(outcome);
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(code)
        }
    }
}
