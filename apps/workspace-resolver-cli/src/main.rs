use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use workspace_resolver::{Service, WorkspaceResolverConfig, WorkspaceResolverLocalClient};
use workspace_resolver_sdk::{ClaimSet, UserIdentity, WorkspaceResolverClient};

/// Environment variables with this prefix override the configuration file;
/// `__` separates nested keys (`WORKSPACE_RESOLVER__DIRECTORY__ACCESS_TOKEN`).
const ENV_PREFIX: &str = "WORKSPACE_RESOLVER__";

/// Workspace Resolver - list the spawner workspaces a user's groups grant
#[derive(Parser)]
#[command(name = "workspace-resolver")]
#[command(about = "Workspace Resolver - list the spawner workspaces a user's groups grant")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the permitted workspaces and print them as JSON
    Resolve {
        /// User the claims belong to
        #[arg(short, long)]
        user: String,

        /// Group path claim; may be repeated
        #[arg(short, long = "group")]
        groups: Vec<String>,

        /// User-info JSON document to read group claims from
        #[arg(long)]
        userinfo: Option<PathBuf>,
    },
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve {
            user,
            groups,
            userinfo,
        } => resolve(&config, user, groups, userinfo.as_deref()).await,
        Commands::Check => check_config(&config),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Defaults, then the YAML file (if any), then `WORKSPACE_RESOLVER__*` variables.
fn load_config(path: Option<&Path>) -> Result<WorkspaceResolverConfig> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        figment = figment.merge(Yaml::file(path));
    }
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("failed to load configuration")
}

fn read_claims(
    config: &WorkspaceResolverConfig,
    groups: Vec<String>,
    userinfo: Option<&Path>,
) -> Result<ClaimSet> {
    let mut claims = Vec::new();

    if let Some(path) = userinfo {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read user-info file {}", path.display()))?;
        let doc: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("user-info file {} is not JSON", path.display()))?;
        claims.extend(
            ClaimSet::from_userinfo(&doc, &config.groups_claim)
                .paths()
                .map(str::to_owned),
        );
    }
    claims.extend(groups);

    Ok(ClaimSet::new(claims))
}

async fn resolve(
    config: &WorkspaceResolverConfig,
    user: String,
    groups: Vec<String>,
    userinfo: Option<&Path>,
) -> Result<()> {
    let claims = read_claims(config, groups, userinfo)?;
    tracing::info!(user = %user, claims = claims.len(), "resolving workspaces");

    let svc = Service::from_config(config).context("failed to set up the directory client")?;
    let client = WorkspaceResolverLocalClient::new(Arc::new(svc));

    let workspaces = client
        .get_permitted_workspaces(&UserIdentity::new(user, claims))
        .await?;

    println!("{}", serde_json::to_string_pretty(&workspaces)?);
    Ok(())
}

fn check_config(config: &WorkspaceResolverConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    println!("Configuration is valid");
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
