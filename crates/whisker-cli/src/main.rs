//! Whisker CLI - headless driver for particle-life worlds.
//!
//! - `whisker run` - tick a world against a stand-in decision-maker
//! - `whisker config` - print the effective configuration

mod responder;

use std::path::{Path, PathBuf};
use std::pin::pin;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use whisker_core::{SimError, StepReport, World, WorldConfig};
use whisker_relay::{ClientId, Relay, RelayError, RelaySink};

use crate::responder::ResponderKind;

/// The single in-process simulation client.
const LOCAL_CLIENT: ClientId = 1;

#[derive(Parser)]
#[command(name = "whisker")]
#[command(about = "Particle-life simulation driver", version)]
struct Cli {
    /// World configuration file (YAML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the world at its configured tick rate
    Run {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// Stand-in decision-maker policy
        #[arg(long, value_enum, default_value = "random")]
        responder: ResponderKind,

        /// Broadcast a new exploration parameter before the first tick
        #[arg(long)]
        exploration: Option<f64>,
    },

    /// Print the effective configuration as YAML
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            ticks,
            seed,
            responder,
            exploration,
        } => {
            let config = WorldConfig {
                seed: seed.unwrap_or(config.seed),
                ..config
            };
            run_world(config, ticks, responder, exploration).await
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<WorldConfig> {
    match path {
        Some(path) => WorldConfig::load(path),
        None => Ok(WorldConfig::default()),
    }
}

#[derive(Debug, Default)]
struct RunStats {
    steps: u64,
    blocked: u64,
    eaten: u64,
    refused: u64,
}

impl RunStats {
    fn record(&mut self, report: &StepReport) {
        self.steps += 1;
        if report.blocked {
            self.blocked += 1;
        }
        if report.eaten.is_some() {
            self.eaten += 1;
        }
    }
}

async fn run_world(
    config: WorldConfig,
    ticks: Option<u64>,
    responder: ResponderKind,
    exploration: Option<f64>,
) -> Result<()> {
    let seed = config.seed;
    let period = config.tick_interval().context("Invalid tick rate")?;
    let mut world = World::new(config).context("Failed to build world")?;

    let mut relay = Relay::new();
    let (decision_tx, decision_rx) = unbounded_channel();
    let (server_tx, mut server_rx) = unbounded_channel();
    let (response_tx, mut response_rx) = unbounded_channel();

    relay.attach_decision_maker(decision_tx);
    world.release_waiting();
    let responder_task = tokio::spawn(responder::run(responder, seed, decision_rx, server_tx));

    {
        let mut sink = RelaySink::new(&mut relay, LOCAL_CLIENT, response_tx.clone());
        world.register_agents(&mut sink);
        if let Some(exploration) = exploration {
            world.set_exploration(exploration, &mut sink);
        }
    }

    info!(
        ?responder,
        seed,
        ticks = ?ticks,
        hz = world.config().tick_hz,
        "Starting run"
    );

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = pin!(tokio::signal::ctrl_c());
    let mut stats = RunStats::default();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if ticks.is_some_and(|limit| world.tick_count() >= limit) {
                    break;
                }
                let mut sink = RelaySink::new(&mut relay, LOCAL_CLIENT, response_tx.clone());
                world.tick(&mut sink);
            }
            Some(data) = server_rx.recv() => {
                match relay.route(data) {
                    Ok(agent) => debug!(%agent, "decision routed"),
                    Err(RelayError::NoAgents) => {}
                    Err(err) => warn!(error = %err, "decision not routed"),
                }
            }
            Some(response) = response_rx.recv() => {
                let mut sink = RelaySink::new(&mut relay, LOCAL_CLIENT, response_tx.clone());
                match world.handle_response(response, &mut sink) {
                    Ok(report) => stats.record(&report),
                    Err(SimError::UnknownAgent(_) | SimError::ActionOutOfRange { .. }) => {
                        stats.refused += 1;
                    }
                    Err(err) => return Err(err).context("Failed to apply decision"),
                }
            }
            result = &mut shutdown => {
                result.context("Failed to listen for ctrl-c")?;
                info!("Interrupted");
                break;
            }
        }
    }

    {
        let mut sink = RelaySink::new(&mut relay, LOCAL_CLIENT, response_tx);
        world.request_snapshot(&mut sink);
    }
    relay.detach_agents_of(LOCAL_CLIENT);
    relay.detach_decision_maker();
    let responder_stats = responder_task
        .await
        .context("Responder task failed")?;

    for agent in world.agents() {
        info!(
            agent = %agent.id,
            name = %agent.name,
            x = agent.position.x,
            y = agent.position.y,
            heading = agent.angle,
            last_reward = agent.last_reward,
            good_food = agent.total_good_food,
            bad_food = agent.total_bad_food,
            "Agent summary"
        );
    }
    info!(
        ticks = world.tick_count(),
        steps = stats.steps,
        blocked = stats.blocked,
        eaten = stats.eaten,
        refused = stats.refused,
        requests = responder_stats.requests,
        transitions = responder_stats.transitions,
        reward_sum = responder_stats.reward_sum,
        snapshots = responder_stats.snapshots,
        "Run finished"
    );
    Ok(())
}
