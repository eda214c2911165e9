use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quotewire::identity::IdentityResolver;
use quotewire::Config;

/// Quotewire - document-grounded quoting assistant gateway
#[derive(Parser)]
#[command(name = "quotewire", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "QUOTEWIRE_PORT")]
    port: Option<u16>,

    /// Data directory (identity database, uploaded artifacts)
    #[arg(long, env = "QUOTEWIRE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve an account id to its tenant key and exit
    Resolve {
        /// External account identifier
        account_id: String,
    },
    /// Print the assembled context document for a tenant and exit
    Context {
        /// Tenant key (e.g. biz_0011223344556677); omit for the demo
        /// fallback
        tenant: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,quotewire=info",
        1 => "info,quotewire=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.data_dir, cli.port)?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Resolve { account_id } => cmd_resolve(&config, &account_id),
            Command::Context { tenant } => cmd_context(&config, tenant.as_deref()).await,
        };
    }

    tracing::info!(
        port = config.port,
        strategy = ?config.identity_strategy,
        demo_fallback = config.demo_fallback,
        "starting quotewire gateway"
    );

    quotewire::api::serve(config).await?;
    Ok(())
}

/// Resolve an account id using the configured strategy
fn cmd_resolve(config: &Config, account_id: &str) -> anyhow::Result<()> {
    let resolver: Box<dyn IdentityResolver> = match config.identity_strategy {
        quotewire::config::IdentityStrategy::Deterministic => {
            Box::new(quotewire::HashResolver::new())
        }
        quotewire::config::IdentityStrategy::Persisted => {
            let pool = quotewire::db::init(config.db_path())?;
            Box::new(quotewire::MappingResolver::new(pool))
        }
    };

    let key = resolver.resolve(account_id)?;
    println!("{key}");
    Ok(())
}

/// Print the context document a turn for this tenant would see
async fn cmd_context(config: &Config, tenant: Option<&str>) -> anyhow::Result<()> {
    use std::sync::Arc;

    let tenant = tenant.map(quotewire::TenantKey::parse).transpose()?;
    let store = Arc::new(quotewire::catalog::LocalStore::new(config.uploads_dir()));
    let aggregator = quotewire::Aggregator::new(
        Some(store),
        config.demo_fallback,
        config.aggregation.clone(),
    );

    let document = aggregator.aggregate(tenant.as_ref()).await;
    println!("{}", document.render());
    Ok(())
}
