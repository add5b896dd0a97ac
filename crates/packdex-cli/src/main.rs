//! packdex CLI - search Helm chart repositories

use clap::{Parser, Subcommand};
use packdex_repo::settings::{default_cache_dir, default_config_path};
use packdex_repo::{RepoManager, Settings};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod exit_codes;

use commands::OutputFormat;
use error::Result;

#[derive(Parser)]
#[command(name = "packdex")]
#[command(author = "packdex Contributors")]
#[command(version)]
#[command(about = "Search Helm chart repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true, env = "PACKDEX_DEBUG")]
    debug: bool,

    /// Path to the repository configuration file
    #[arg(long, global = true, env = "PACKDEX_REPOSITORY_CONFIG", value_name = "PATH")]
    repository_config: Option<PathBuf>,

    /// Directory holding cached repository indexes
    #[arg(long, global = true, env = "PACKDEX_REPOSITORY_CACHE", value_name = "DIR")]
    repository_cache: Option<PathBuf>,

    /// HTTP timeout in seconds when fetching indexes
    #[arg(long, global = true, default_value_t = 30, value_name = "SECONDS")]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Add, list, remove and update chart repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },

    /// Search cached repository indexes for charts
    Search {
        /// Keyword (or regular expression with --regexp); empty lists everything
        #[arg(default_value = "")]
        keyword: String,

        /// Version constraint, e.g. '>=1.0.0 <2.0.0'
        #[arg(long)]
        version: Option<String>,

        /// Include pre-release versions when no --version is given
        #[arg(long)]
        devel: bool,

        /// Show every matching version instead of the newest
        #[arg(short = 'l', long)]
        versions: bool,

        /// Treat the keyword as a regular expression
        #[arg(short = 'r', long)]
        regexp: bool,

        /// Maximum fuzzy-match score to show (0 = exact only)
        #[arg(long, default_value_t = packdex_repo::DEFAULT_MAX_SCORE)]
        max_score: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum RepoCommands {
    /// Add a chart repository
    Add {
        /// Repository name
        name: String,

        /// Repository URL (http, https or file)
        url: String,

        /// Username for basic authentication
        #[arg(long, requires = "password")]
        username: Option<String>,

        /// Password for basic authentication
        #[arg(long, requires = "username")]
        password: Option<String>,

        /// Bearer token
        #[arg(long, conflicts_with = "username")]
        token: Option<String>,

        /// Skip TLS certificate checks for this repository
        #[arg(long)]
        insecure_skip_tls_verify: bool,
    },

    /// List chart repositories
    #[command(alias = "ls")]
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },

    /// Remove one or more chart repositories
    #[command(alias = "rm")]
    Remove {
        /// Repository names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Fetch the latest index of every chart repository
    #[command(alias = "up")]
    Update,
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "packdex=debug,packdex_repo=debug"
    } else {
        "packdex=warn,packdex_repo=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn settings(cli: &Cli) -> Result<Settings> {
    let config = match &cli.repository_config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let cache = match &cli.repository_cache {
        Some(dir) => dir.clone(),
        None => default_cache_dir()?,
    };

    Ok(Settings::new(config, cache).with_timeout(Duration::from_secs(cli.timeout)))
}

async fn run(cli: Cli) -> Result<()> {
    let settings = settings(&cli)?;
    tracing::debug!(
        config = %settings.repository_config.display(),
        cache = %settings.repository_cache.display(),
        "using settings"
    );
    let manager = RepoManager::new(settings)?;

    match cli.command {
        Commands::Repo { command } => match command {
            RepoCommands::Add {
                name,
                url,
                username,
                password,
                token,
                insecure_skip_tls_verify,
            } => {
                let auth = commands::repo::auth_from_flags(username, password, token)?;
                commands::repo::add(&manager, &name, &url, auth, insecure_skip_tls_verify)
            }
            RepoCommands::List { output } => commands::repo::list(&manager, output),
            RepoCommands::Remove { names } => commands::repo::remove(&manager, &names),
            RepoCommands::Update => commands::repo::update(&manager).await,
        },

        Commands::Search {
            keyword,
            version,
            devel,
            versions,
            regexp,
            max_score,
            output,
        } => {
            let options = packdex_repo::SearchOptions {
                keyword,
                constraint: version,
                include_prerelease: devel,
                keep_all_versions: versions,
                regex: regexp,
                max_score,
            };
            commands::search::run(&manager, &options, output)
        }
    }
}
