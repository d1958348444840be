use anyhow::Result;
use asset_cdn::cdn::resolver_from_config;
use asset_cdn::{Config, PathResolver};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "asset-cdn")]
#[command(about = "Resolve asset URLs and invalidate CDN caches")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the public URL for an asset path.
    Url {
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Invalidate cached copies of one or more paths.
    Flush {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,
    },
    /// Print the status of a previously submitted invalidation.
    Status {
        #[arg(value_name = "ID")]
        id: String,
    },
}

async fn execute(resolver: &dyn PathResolver, command: Command) -> asset_cdn::Result<String> {
    match command {
        Command::Url { path } => resolver.get_path(&path, false).await,
        Command::Flush { paths } => Ok(match resolver.flush_paths(&paths).await? {
            Some(id) => id,
            None => "nothing to invalidate for this backend".to_string(),
        }),
        Command::Status { id } => Ok(match resolver.get_flush_status(&id).await? {
            Some(status) => status.to_string(),
            None => "unknown".to_string(),
        }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_cdn=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let resolver = match Config::from_env().and_then(resolver_from_config) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("Failed to initialize adapter: {}", e);
            std::process::exit(1);
        }
    };

    match execute(resolver.as_ref(), args.command).await {
        Ok(output) => {
            info!("Command completed");
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            std::process::exit(1);
        }
    }
}
