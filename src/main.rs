use std::path::PathBuf;

use clap::Parser;

use upstream_version::config::{ResolverConfig, log_path};
use upstream_version::logging;
use upstream_version::version::types::DEFAULT_VERSION_REGEX;
use upstream_version::version::{ResolutionPolicy, Resolver, VersionPreference};

#[derive(Parser)]
#[command(name = "upstream-version")]
#[command(
    about = "Find the latest upstream release or branch snapshot of a source URL",
    disable_version_flag = true
)]
struct Cli {
    /// Source URL of the package (tarball, archive or repository URL)
    url: String,

    /// Which versions to accept: stable, unstable or branch
    #[arg(long = "version", default_value = "stable")]
    preference: VersionPreference,

    /// Regex with one capture group selecting the version part of a tag
    #[arg(long, default_value = DEFAULT_VERSION_REGEX)]
    version_regex: String,

    /// Branch to track with --version=branch
    #[arg(long, required_if_eq("preference", "branch"))]
    branch: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    /// Write JSON logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write JSON logs to the default log file in the data directory
    #[arg(long, conflicts_with = "log_file")]
    log_to_file: bool,

    /// Print the resolved version as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = match (&cli.log_file, cli.log_to_file) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(log_path()),
        (None, false) => None,
    };
    let _guard = logging::init(cli.log_level.as_deref(), log_file.as_deref())?;

    let config = match &cli.config {
        Some(path) => ResolverConfig::from_file(path)?,
        None => ResolverConfig::default(),
    };
    let policy = ResolutionPolicy {
        preference: cli.preference,
        version_regex: cli.version_regex,
        branch: cli.branch,
    };

    let version = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let resolver = Resolver::from_config(&config)?;
            anyhow::Ok(resolver.fetch_latest_version(&cli.url, &policy).await?)
        })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&version)?);
    } else {
        println!("{}", version.display_number());
        if let Some(rev) = &version.rev {
            println!("{rev}");
        }
    }

    Ok(())
}
