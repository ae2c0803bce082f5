use std::fs::read_to_string;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use clustermap::catalog::chunk::Timestamp;
use clustermap::catalog::store::FakeChunkStore;
use clustermap::commands::catalog_commands::EnableShardingRequest;
use clustermap::commands::move_chunk::MoveChunkRequest;
use clustermap::commands::shard_commands::GetShardVersionRequest;
use clustermap::commands::CommandRequest;
use clustermap::context::ClusterContext;
use clustermap::host::Host;
use clustermap::key::Key;
use clustermap_config::Config;

/// Coordination-plane engine for a sharded database cluster.
#[derive(Parser, Debug)]
#[command(name = "", version)]
struct Cli {
    /// Path to the configuration file. Default: "clustermap.toml"
    #[arg(short, long, default_value = "clustermap.toml")]
    config: PathBuf,

    /// Emit logs as JSON instead of human-readable text.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Check the configuration file for errors.
    Configcheck,

    /// Run a scripted in-memory moveChunk scenario against a fake store,
    /// printing each step's command response.
    Demo,
}

#[derive(Debug, Error)]
enum ConfigCheckError {
    #[error("I/O error on `{0}`: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("TOML parse error in `{0}`: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}

/// Confirm that the configuration file parses and passes validation.
fn config_check(config_path: &PathBuf) -> Result<(), ConfigCheckError> {
    let contents =
        read_to_string(config_path).map_err(|e| ConfigCheckError::Io(config_path.clone(), e))?;
    toml::from_str::<Config>(&contents).map_err(|e| ConfigCheckError::Parse(config_path.clone(), e))?;
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Walks a single collection through enableSharding, a registered donor and
/// recipient shard, and a full moveChunk, printing the response at each
/// step. There's no server loop here, since no wire transport is modeled:
/// this is the same command surface a real listener would dispatch into.
async fn demo() -> Result<(), clustermap::Error> {
    let store = Arc::new(FakeChunkStore::new());
    let ctx = ClusterContext::new(Config::default(), store);

    ctx.shards.register(
        "shardA".to_string(),
        clustermap::registry::ShardTarget::Standalone(Host::new_test("shardA-host")),
    );
    ctx.shards.register(
        "shardB".to_string(),
        clustermap::registry::ShardTarget::Standalone(Host::new_test("shardB-host")),
    );

    let enable = CommandRequest::EnableSharding(EnableShardingRequest {
        db_name: "demo.coll".to_string(),
        primary_shard: Some("shardA".to_string()),
    });
    info!(command = enable.name(), "dispatching");
    let resp = enable.execute(&ctx).await?;
    println!("enableSharding -> {resp:?}");

    let get = CommandRequest::GetShardVersion(GetShardVersionRequest {
        ns: "demo.coll".to_string(),
        shard: "shardA".to_string(),
    });
    info!(command = get.name(), "dispatching");
    let resp = get.execute(&ctx).await?;
    println!("getShardVersion -> {resp:?}");

    let move_chunk = CommandRequest::MoveChunk(MoveChunkRequest {
        ns: "demo.coll".to_string(),
        min: Key::MinKey,
        max: Key::MaxKey,
        from_shard: "shardA".to_string(),
        to_shard: "shardB".to_string(),
        recipient_host: Host::new_test("shardB-host"),
        valid_after: Timestamp(1),
    });
    info!(command = move_chunk.name(), "dispatching");
    let resp = move_chunk.execute(&ctx).await?;
    println!("moveChunk -> {resp:?}");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        None => Ok(run_server(cli.config).await?),
        Some(Commands::Configcheck) => {
            config_check(&cli.config)?;
            println!("\"{}\" is valid", cli.config.display());
            Ok(())
        }
        Some(Commands::Demo) => Ok(demo().await?),
    }
}

async fn run_server(config_path: PathBuf) -> Result<(), clustermap_config::Error> {
    let config = Config::load(&config_path)?;
    info!(
        scan_interval = ?config.monitor.scan_interval(),
        "clustermap configured; no wire listener is implemented in this build"
    );
    Ok(())
}
