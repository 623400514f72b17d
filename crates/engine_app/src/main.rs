//! # engine_app
//!
//! Runs either side of entity replication.
//!
//! - `--role server` (default): owns the demo entities, simulates them at a
//!   fixed tick rate and publishes their state over NATS.
//! - `--role replica`: joins, rebuilds the entities from replicated state and
//!   logs their persisted fields when it stops.
//!
//! `--dump-fields` prints the demo prefab's field descriptors as JSON and
//! exits without connecting.

mod prefab;
mod tick;
mod world;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_net::NatsConnection;
use engine_replica::{ReplicaConfig, ReplicaRunner};
use tick::{TickConfig, TickLoop};
use world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Role {
    Server,
    Replica,
}

#[derive(Debug, Parser)]
#[command(name = "engine_app", about = "Replicated component simulation over NATS")]
struct Args {
    /// Which side of replication to run.
    #[arg(long, value_enum, default_value_t = Role::Server)]
    role: Role,

    /// Stop after this many ticks (server) or updates (replica). 0 runs forever.
    #[arg(long, default_value_t = 0)]
    ticks: u64,

    /// Server tick rate in ticks per second.
    #[arg(long, default_value_t = 20.0)]
    tick_rate: f64,

    /// Replica name announced on join.
    #[arg(long, default_value = "replica")]
    name: String,

    /// NATS server URL. Falls back to `NATS_URL`, then localhost.
    #[arg(long)]
    nats_url: Option<String>,

    /// Print the prefab field descriptors as JSON and exit.
    #[arg(long)]
    dump_fields: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let args = Args::parse();

    if args.dump_fields {
        println!("{}", serde_json::to_string_pretty(&prefab::mover_fields())?);
        return Ok(());
    }

    match args.role {
        Role::Server => run_server(&args).await,
        Role::Replica => run_replica(&args).await,
    }
}

async fn run_server(args: &Args) -> Result<()> {
    info!("engine server starting");

    let url = engine_net::connection::resolve_url(args.nats_url.as_deref());
    let conn = NatsConnection::connect_to(&url).await?;

    let mut world = World::new();
    let leader = world.spawn("leader", prefab::spawn_mover);
    let follower = world.spawn("follower", prefab::spawn_mover);
    if let Some(entity) = world.entity_mut(follower)
        && let Some(mover) = entity
            .find_component(prefab::MOVER)
            .map(|component| component.id())
            .and_then(|id| entity.component_mut(id))
    {
        mover.set_data_field("target", "leader");
        mover.set_data_field("direction", "0 1 0");
        mover.set_data_field("speed", "0.5");
    }
    info!(%leader, %follower, "demo entities spawned");

    let config = TickConfig {
        tick_rate: args.tick_rate,
        max_ticks: args.ticks,
    };
    let mut tick_loop = TickLoop::new(config, world);
    tick_loop.run_async(&conn).await?;

    info!("engine server shut down");
    Ok(())
}

async fn run_replica(args: &Args) -> Result<()> {
    let mut config = ReplicaConfig::new(args.name.clone());
    if let Some(url) = &args.nats_url {
        config = config.with_nats_url(url.clone());
    }
    if args.ticks > 0 {
        config = config.with_max_updates(args.ticks);
    }

    let runner = ReplicaRunner::new(config);
    let world = runner.run(Box::new(prefab::spawn_mover)).await?;

    for entity in world.entities() {
        if let Some(fields) = world.describe(entity.id()) {
            info!(entity = %entity.id(), "replicated state:\n{fields}");
        }
    }
    Ok(())
}
