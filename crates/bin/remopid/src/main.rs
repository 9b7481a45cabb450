//! # remopid — remopi daemon
//!
//! Composition root that wires all adapters together and runs the controller.
//!
//! ## Responsibilities
//! - Load configuration (`remopi.toml`, `REMOPI_*` env vars)
//! - Initialise `tracing` from the configured filter
//! - Open the GPIO backend and register appliances
//! - Construct the cloud client, status bus, timers and command service
//! - Spawn one debouncer and one edge loop per switch, plus the reconciler
//! - Start the optional MQTT bridge and HTTP control and metrics endpoint
//! - Handle graceful shutdown on Ctrl-C / SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use remopi_adapter_gpio::{SysfsGpio, VirtualGpio};
use remopi_adapter_http_axum::state::AppState;
use remopi_adapter_mqtt::MqttBridge;
use remopi_adapter_nature_remo::NatureRemoClient;
use remopi_adapter_peer::{HttpPeerClient, MdnsResolver};
use remopi_app::debouncer::Debouncer;
use remopi_app::edge_queue::{self, edge_queue};
use remopi_app::metrics::InMemoryMetrics;
use remopi_app::ports::{Gpio, StatusPublisher};
use remopi_app::registry::{ApplianceRegistry, SwitchInput};
use remopi_app::services::actuator::Actuator;
use remopi_app::services::control_service::ControlService;
use remopi_app::services::dispatcher::{
    BrokerDispatcher, EdgeHandler, RelayDispatcher, ServerDispatcher, run_edge_loop,
};
use remopi_app::services::mirror::{MirrorClient, PeerTarget};
use remopi_app::services::reconciler::{CloudReconciler, PeerReconciler};
use remopi_app::shutdown::Shutdown;
use remopi_app::status_bus::{InProcessStatusBus, forward_statuses};
use remopi_app::timers::TimerRegistry;
use remopi_domain::error::RemoPiError;
use remopi_domain::status::ApplianceStatus;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, GpioBackend};

const STATUS_BUS_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    let filter = EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match config.gpio.backend {
        GpioBackend::Sysfs => run(config, SysfsGpio).await,
        GpioBackend::Virtual => run(config, VirtualGpio::new()).await,
    }
}

async fn run<G: Gpio>(config: Config, gpio: G) -> Result<(), Box<dyn Error>> {
    let relays_commands = config.mqtt.as_ref().is_some_and(|mqtt| mqtt.relay_commands);
    if config.peer.is_none() && !relays_commands && config.cloud.token.is_empty() {
        tracing::warn!("no cloud token configured, cloud calls will be rejected");
    }

    let metrics = Arc::new(InMemoryMetrics::new());
    let api = Arc::new(NatureRemoClient::new(&config.cloud, Arc::clone(&metrics))?);
    let bus = Arc::new(InProcessStatusBus::new(STATUS_BUS_CAPACITY));

    let (registry, switches) = ApplianceRegistry::load(config.appliances()?, &api, &gpio)?;
    let registry = Arc::new(registry);
    let actuator = Actuator::new(Arc::clone(&registry), TimerRegistry::new(), Arc::clone(&bus));
    let commands = Arc::new(ControlService::new(actuator.clone()));

    let shutdown = Shutdown::new();
    let mut tasks = JoinSet::new();
    let poll_interval = config.gpio.poll_interval();

    tasks.spawn(forward_statuses(bus.subscribe(), LogStatusPublisher, shutdown.signal()));
    tasks.spawn(forward_statuses(bus.subscribe(), Arc::clone(&metrics), shutdown.signal()));

    let mut broker = None;
    if let Some(mqtt) = &config.mqtt {
        let bridge = MqttBridge::new(mqtt);
        tasks.spawn(forward_statuses(bus.subscribe(), bridge.publisher(), shutdown.signal()));
        if mqtt.relay_commands {
            broker = Some(bridge.commands());
        }
        tasks.spawn(bridge.run(Arc::clone(&commands), shutdown.signal()));
    }

    if let Some(broker) = broker {
        tracing::info!(appliances = registry.len(), "broker relay mode");
        let dispatcher = Arc::new(BrokerDispatcher::new(registry, broker));
        spawn_switches(&mut tasks, switches, &dispatcher, poll_interval, &shutdown);
    } else if let Some(peer) = &config.peer {
        tracing::info!(host = %peer.host, port = peer.port, "relay mode");
        let mirror = Arc::new(MirrorClient::new(
            HttpPeerClient::new(peer.timeout())?,
            MdnsResolver::new(),
            PeerTarget::new(peer.host.clone(), peer.port),
        ));
        let dispatcher = Arc::new(RelayDispatcher::new(Arc::clone(&registry), Arc::clone(&mirror)));
        spawn_switches(&mut tasks, switches, &dispatcher, poll_interval, &shutdown);
        tasks.spawn(PeerReconciler::new(registry, mirror).run(peer.poll_interval(), shutdown.signal()));
    } else {
        tracing::info!(appliances = registry.len(), "authoritative mode");
        let dispatcher = Arc::new(ServerDispatcher::new(actuator.clone()));
        spawn_switches(&mut tasks, switches, &dispatcher, poll_interval, &shutdown);
        tasks.spawn(CloudReconciler::new(api, actuator).run(config.check_interval(), shutdown.signal()));
    }

    if let Some(server) = &config.server {
        let state = AppState::from_shared(commands).with_metrics(metrics);
        let app = remopi_adapter_http_axum::router::build(state);
        let listener = tokio::net::TcpListener::bind(server.bind_addr()).await?;
        tracing::info!(addr = %server.bind_addr(), "remopid listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(ctrl_c())
            .await?;
    } else {
        ctrl_c().await;
    }

    tracing::info!("shutting down");
    shutdown.trigger();
    while tasks.join_next().await.is_some() {}
    Ok(())
}

/// Start a debouncer and an edge loop for every switch input.
fn spawn_switches<G: Gpio, H: EdgeHandler>(
    tasks: &mut JoinSet<()>,
    switches: Vec<SwitchInput<G>>,
    handler: &Arc<H>,
    poll_interval: Duration,
    shutdown: &Shutdown,
) {
    for switch in switches {
        let (edges_tx, edges_rx) = edge_queue(switch.id.clone(), edge_queue::DEFAULT_CAPACITY);
        let debouncer = Debouncer::new(switch.id.clone(), switch.pin);
        tasks.spawn(debouncer.run(poll_interval, edges_tx, shutdown.signal()));
        tasks.spawn(run_edge_loop(Arc::clone(handler), switch.id, edges_rx, shutdown.signal()));
    }
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
}

/// Status sink that writes every change to the log.
struct LogStatusPublisher;

impl StatusPublisher for LogStatusPublisher {
    async fn publish(&self, status: ApplianceStatus) -> Result<(), RemoPiError> {
        tracing::info!(
            appliance_id = %status.appliance_id,
            name = %status.appliance_name,
            kind = %status.kind,
            power = %status.power_state,
            "appliance status"
        );
        Ok(())
    }
}
