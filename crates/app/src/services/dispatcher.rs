//! Trigger dispatchers — turn switch edges into commands.
//!
//! [`ServerDispatcher`] acts on the appliance directly through its sender.
//! [`RelayDispatcher`] forwards toggles to a peer controller and only
//! mirrors the outcome on the local status pin. [`BrokerDispatcher`] hands
//! toggles to a message broker and leaves the status pin to status events.

use std::future::Future;
use std::sync::Arc;

use remopi_domain::button::Button;
use remopi_domain::error::{RemoPiError, UnsupportedError};
use remopi_domain::id::ApplianceId;
use remopi_domain::level::{Level, PowerState};
use remopi_domain::trigger::Trigger;

use crate::edge_queue::EdgeReceiver;
use crate::ports::{CommandPublisher, Gpio, PeerClient, PeerResolver, RemoApi, StatusPublisher};
use crate::registry::ApplianceRegistry;
use crate::services::actuator::Actuator;
use crate::services::mirror::MirrorClient;
use crate::shutdown::ShutdownSignal;

/// Reacts to one edge of one appliance's switch.
pub trait EdgeHandler: Send + Sync + 'static {
    fn handle_edge(
        &self,
        id: &ApplianceId,
        level: Level,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send;
}

/// Feed every edge of one appliance to `handler`, in order, until shutdown.
pub async fn run_edge_loop<H: EdgeHandler>(
    handler: Arc<H>,
    id: ApplianceId,
    mut edges: EdgeReceiver,
    mut shutdown: ShutdownSignal,
) {
    loop {
        tokio::select! {
            edge = edges.recv() => {
                let Some(level) = edge else { break };
                if let Err(err) = handler.handle_edge(&id, level).await {
                    tracing::warn!(appliance_id = %id, %level, error = %err, "edge not handled");
                }
            }
            () = shutdown.wait() => break,
        }
    }
    tracing::debug!(appliance_id = %id, "edge loop stopped");
}

/// Dispatcher for the controller that owns the cloud link.
pub struct ServerDispatcher<C, G: Gpio, P> {
    actuator: Actuator<C, G, P>,
}

impl<C, G, P> ServerDispatcher<C, G, P>
where
    C: RemoApi,
    G: Gpio,
    P: StatusPublisher,
{
    #[must_use]
    pub fn new(actuator: Actuator<C, G, P>) -> Self {
        Self { actuator }
    }
}

impl<C, G, P> EdgeHandler for ServerDispatcher<C, G, P>
where
    C: RemoApi,
    G: Gpio,
    P: StatusPublisher,
{
    async fn handle_edge(&self, id: &ApplianceId, level: Level) -> Result<(), RemoPiError> {
        let handle = self.actuator.handle(id)?;
        let trigger = handle.appliance().trigger;
        if !trigger.accepts(level) {
            tracing::trace!(appliance_id = %id, %trigger, %level, "edge ignored");
            return Ok(());
        }
        if !handle.is_enabled() {
            tracing::debug!(appliance_id = %id, "edge blocked by condition pin");
            return Ok(());
        }

        match trigger {
            Trigger::Toggle => {
                self.actuator.toggle(&handle).await?;
            }
            Trigger::Sync => {
                let state = PowerState::from(level.is_high());
                self.actuator.drive(&handle, state).await?;
            }
            Trigger::Timer => self.actuator.activate_timer(&handle).await?,
        }
        Ok(())
    }
}

/// Dispatcher for a relay that forwards to a peer controller.
///
/// Only toggle switches can be relayed.
pub struct RelayDispatcher<C, G: Gpio, K, R> {
    registry: Arc<ApplianceRegistry<C, G>>,
    mirror: Arc<MirrorClient<K, R>>,
}

impl<C, G, K, R> RelayDispatcher<C, G, K, R>
where
    C: RemoApi,
    G: Gpio,
    K: PeerClient,
    R: PeerResolver,
{
    #[must_use]
    pub fn new(registry: Arc<ApplianceRegistry<C, G>>, mirror: Arc<MirrorClient<K, R>>) -> Self {
        Self { registry, mirror }
    }
}

impl<C, G, K, R> EdgeHandler for RelayDispatcher<C, G, K, R>
where
    C: RemoApi,
    G: Gpio,
    K: PeerClient,
    R: PeerResolver,
{
    async fn handle_edge(&self, id: &ApplianceId, level: Level) -> Result<(), RemoPiError> {
        let handle = self.registry.get(id)?;
        let trigger = handle.appliance().trigger;
        if trigger != Trigger::Toggle {
            return Err(UnsupportedError::RelayTrigger { trigger }.into());
        }
        if !trigger.accepts(level) {
            return Ok(());
        }
        if !handle.is_enabled() {
            tracing::debug!(appliance_id = %id, "edge blocked by condition pin");
            return Ok(());
        }

        let next = self.mirror.forward_toggle(handle.appliance()).await?;
        handle.record(next);
        Ok(())
    }
}

/// Dispatcher for a switch-only node that publishes presses as commands.
///
/// Only toggle switches can be relayed. The status pin follows whatever the
/// executing controller publishes back.
pub struct BrokerDispatcher<C, G: Gpio, B> {
    registry: Arc<ApplianceRegistry<C, G>>,
    broker: B,
}

impl<C, G, B> BrokerDispatcher<C, G, B>
where
    C: RemoApi,
    G: Gpio,
    B: CommandPublisher,
{
    #[must_use]
    pub fn new(registry: Arc<ApplianceRegistry<C, G>>, broker: B) -> Self {
        Self { registry, broker }
    }
}

impl<C, G, B> EdgeHandler for BrokerDispatcher<C, G, B>
where
    C: RemoApi,
    G: Gpio,
    B: CommandPublisher,
{
    async fn handle_edge(&self, id: &ApplianceId, level: Level) -> Result<(), RemoPiError> {
        let handle = self.registry.get(id)?;
        let trigger = handle.appliance().trigger;
        if trigger != Trigger::Toggle {
            return Err(UnsupportedError::RelayTrigger { trigger }.into());
        }
        if !trigger.accepts(level) {
            return Ok(());
        }
        if !handle.is_enabled() {
            tracing::debug!(appliance_id = %id, "edge blocked by condition pin");
            return Ok(());
        }

        self.broker.publish_command(id, Button::Toggle).await?;
        tracing::info!(appliance_id = %id, "toggle handed to broker");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use super::*;
    use crate::edge_queue::edge_queue;
    use crate::services::mirror::PeerTarget;
    use crate::shutdown::Shutdown;
    use crate::testing::{
        FakeGpio, FakePeer, FakeRemo, FakeResolver, PeerCall, RecordingPublisher, RemoCall,
        actuator, light_with_pins, signal_appliance, timer_signal,
    };
    use remopi_domain::appliance::Appliance;
    use remopi_domain::status_type::StatusType;

    type Server = ServerDispatcher<FakeRemo, FakeGpio, RecordingPublisher>;
    type Relay = RelayDispatcher<FakeRemo, FakeGpio, FakePeer, FakeResolver>;
    type Broker = BrokerDispatcher<FakeRemo, FakeGpio, Arc<RecordingBroker>>;

    #[derive(Default)]
    struct RecordingBroker {
        sent: std::sync::Mutex<Vec<(String, Button)>>,
    }

    impl CommandPublisher for RecordingBroker {
        async fn publish_command(&self, id: &ApplianceId, button: Button) -> Result<(), RemoPiError> {
            self.sent.lock().unwrap().push((id.to_string(), button));
            Ok(())
        }
    }

    fn broker(appliances: Vec<Appliance>) -> (Broker, FakeGpio, Arc<RecordingBroker>) {
        let (actuator, gpio, _, _) = actuator(appliances);
        let sent = Arc::new(RecordingBroker::default());
        let registry = Arc::clone(actuator.registry());
        (BrokerDispatcher::new(registry, Arc::clone(&sent)), gpio, sent)
    }

    fn server(appliances: Vec<Appliance>) -> (Server, FakeGpio, Arc<FakeRemo>, Arc<RecordingPublisher>) {
        let (actuator, gpio, api, publisher) = actuator(appliances);
        (ServerDispatcher::new(actuator), gpio, api, publisher)
    }

    fn relay(appliances: Vec<Appliance>, host: &str) -> (Relay, FakeGpio, Arc<MirrorClient<FakePeer, FakeResolver>>) {
        let (actuator, gpio, _, _) = actuator(appliances);
        let mirror = Arc::new(MirrorClient::new(
            FakePeer::default(),
            FakeResolver::answering(Ipv4Addr::new(10, 0, 0, 7)),
            PeerTarget::new(host, 8080),
        ));
        let registry = Arc::clone(actuator.registry());
        (RelayDispatcher::new(registry, Arc::clone(&mirror)), gpio, mirror)
    }

    fn id(raw: &str) -> ApplianceId {
        ApplianceId::new(raw).unwrap()
    }

    fn sync_light(id: &str) -> Appliance {
        let mut appliance = light_with_pins(id, 17, 27);
        appliance.trigger = Trigger::Sync;
        appliance
    }

    fn with_condition(mut appliance: Appliance, pin: u32) -> Appliance {
        appliance.condition_pin = Some(pin);
        appliance
    }

    #[tokio::test]
    async fn should_turn_light_on_for_rising_edge_when_off() {
        let (dispatcher, gpio, api, _) = server(vec![light_with_pins("lamp", 17, 27)]);

        dispatcher.handle_edge(&id("lamp"), Level::High).await.unwrap();

        assert_eq!(api.calls(), vec![RemoCall::Light("lamp".into(), "on".into())]);
        assert_eq!(gpio.level(27), Level::High);
    }

    #[tokio::test]
    async fn should_ignore_falling_edge_for_toggle() {
        let (dispatcher, gpio, api, _) = server(vec![light_with_pins("lamp", 17, 27)]);

        dispatcher.handle_edge(&id("lamp"), Level::Low).await.unwrap();

        assert!(api.calls().is_empty());
        assert!(gpio.writes(27).is_empty());
    }

    #[tokio::test]
    async fn should_treat_each_rising_edge_as_independent_toggle() {
        let (dispatcher, gpio, api, _) = server(vec![light_with_pins("lamp", 17, 27)]);

        dispatcher.handle_edge(&id("lamp"), Level::High).await.unwrap();
        dispatcher.handle_edge(&id("lamp"), Level::Low).await.unwrap();
        dispatcher.handle_edge(&id("lamp"), Level::High).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                RemoCall::Light("lamp".into(), "on".into()),
                RemoCall::Light("lamp".into(), "off".into()),
            ]
        );
        assert_eq!(gpio.writes(27), vec![Level::High, Level::Low]);
    }

    #[tokio::test]
    async fn should_drive_low_for_on_with_reverse_polarity() {
        let mut lamp = light_with_pins("lamp", 17, 27);
        lamp.status_type = StatusType::Reverse;
        let (dispatcher, gpio, api, _) = server(vec![lamp]);
        assert_eq!(gpio.level(27), Level::High);

        dispatcher.handle_edge(&id("lamp"), Level::High).await.unwrap();

        assert_eq!(api.calls(), vec![RemoCall::Light("lamp".into(), "on".into())]);
        assert_eq!(gpio.writes(27), vec![Level::High, Level::Low]);
    }

    #[tokio::test]
    async fn should_mirror_switch_level_in_sync_mode() {
        let (dispatcher, gpio, api, _) = server(vec![sync_light("lamp")]);

        dispatcher.handle_edge(&id("lamp"), Level::High).await.unwrap();
        dispatcher.handle_edge(&id("lamp"), Level::Low).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                RemoCall::Light("lamp".into(), "on".into()),
                RemoCall::Light("lamp".into(), "off".into()),
            ]
        );
        assert_eq!(gpio.writes(27), vec![Level::High, Level::Low]);
    }

    #[tokio::test]
    async fn should_not_write_pin_when_command_fails() {
        let (dispatcher, gpio, api, publisher) = server(vec![light_with_pins("lamp", 17, 27)]);
        api.fail_next(1);

        let result = dispatcher.handle_edge(&id("lamp"), Level::High).await;

        assert!(result.is_err());
        assert!(gpio.writes(27).is_empty());
        assert!(publisher.powers().is_empty());
    }

    #[tokio::test]
    async fn should_drop_edges_while_condition_pin_is_low() {
        let mut timer = timer_signal("fan", Some("10s"));
        timer.switch_pin = Some(18);
        timer.status_pin = Some(28);
        let appliances = vec![
            with_condition(light_with_pins("lamp", 17, 27), 5),
            with_condition(
                {
                    let mut sync = sync_light("hall");
                    sync.switch_pin = Some(16);
                    sync.status_pin = Some(26);
                    sync
                },
                5,
            ),
            with_condition(timer, 5),
        ];
        let (dispatcher, gpio, api, _) = server(appliances);
        gpio.set_level(5, Level::Low);

        for appliance in ["lamp", "hall", "fan"] {
            dispatcher.handle_edge(&id(appliance), Level::High).await.unwrap();
            dispatcher.handle_edge(&id(appliance), Level::Low).await.unwrap();
        }

        assert!(api.calls().is_empty());
        assert!(gpio.writes(26).is_empty());
        assert!(gpio.writes(27).is_empty());
        assert!(gpio.writes(28).is_empty());
    }

    #[tokio::test]
    async fn should_act_when_condition_pin_is_high() {
        let (dispatcher, gpio, api, _) =
            server(vec![with_condition(light_with_pins("lamp", 17, 27), 5)]);
        gpio.set_level(5, Level::High);

        dispatcher.handle_edge(&id("lamp"), Level::High).await.unwrap();

        assert_eq!(api.calls().len(), 1);
        assert_eq!(gpio.level(27), Level::High);
    }

    #[tokio::test(start_paused = true)]
    async fn should_restart_timer_and_turn_off_exactly_once() {
        let (dispatcher, _, api, _) = server(vec![timer_signal("fan", Some("10s"))]);
        let off = || {
            api.calls()
                .iter()
                .filter(|call| **call == RemoCall::Signal("fan-off".into()))
                .count()
        };

        dispatcher.handle_edge(&id("fan"), Level::High).await.unwrap();
        assert_eq!(api.calls(), vec![RemoCall::Signal("fan-on".into())]);

        tokio::time::sleep(Duration::from_secs(5)).await;
        dispatcher.handle_edge(&id("fan"), Level::Low).await.unwrap();
        dispatcher.handle_edge(&id("fan"), Level::High).await.unwrap();
        assert_eq!(api.calls().len(), 1);

        tokio::time::sleep(Duration::from_millis(9_900)).await;
        assert_eq!(off(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(off(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(off(), 1);
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn should_report_unknown_appliance() {
        let (dispatcher, _, _, _) = server(vec![]);
        let err = dispatcher.handle_edge(&id("ghost"), Level::High).await.unwrap_err();
        assert!(matches!(err, RemoPiError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_process_queued_edges_until_shutdown() {
        let (dispatcher, gpio, api, _) = server(vec![light_with_pins("lamp", 17, 27)]);
        let shutdown = Shutdown::new();
        let (tx, rx) = edge_queue(id("lamp"), 8);
        let task = tokio::spawn(run_edge_loop(
            Arc::new(dispatcher),
            id("lamp"),
            rx,
            shutdown.signal(),
        ));

        tx.push(Level::High);
        tx.push(Level::Low);
        tx.push(Level::High);
        drop(tx);
        task.await.unwrap();

        assert_eq!(api.calls().len(), 2);
        assert_eq!(gpio.level(27), Level::Low);
        drop(shutdown);
    }

    #[tokio::test]
    async fn should_forward_toggle_and_mirror_on_local_pin() {
        let (dispatcher, gpio, mirror) = relay(vec![light_with_pins("lamp", 17, 27)], "remo.local");

        dispatcher.handle_edge(&id("lamp"), Level::High).await.unwrap();

        assert_eq!(gpio.level(27), Level::High);
        assert_eq!(mirror.cached_address().as_deref(), Some("10.0.0.7"));
        assert!(matches!(
            mirror_calls(&mirror).last(),
            Some(PeerCall::Send { button, .. }) if button == "on"
        ));
    }

    #[tokio::test]
    async fn should_not_write_pin_when_peer_unreachable() {
        let (dispatcher, gpio, mirror) = relay(vec![light_with_pins("lamp", 17, 27)], "remo.local");
        peer(&mirror).unreachable_for(2);

        let result = dispatcher.handle_edge(&id("lamp"), Level::High).await;

        assert!(result.is_err());
        assert_eq!(mirror_calls(&mirror).len(), 2);
        assert_eq!(mirror.cached_address(), None);
        assert!(gpio.writes(27).is_empty());
    }

    #[tokio::test]
    async fn should_reject_sync_and_timer_in_relay_mode() {
        let mut fan = signal_appliance("fan");
        fan.trigger = Trigger::Timer;
        let (dispatcher, gpio, mirror) = relay(vec![sync_light("lamp"), fan], "192.168.1.2");

        for appliance in ["lamp", "fan"] {
            let err = dispatcher.handle_edge(&id(appliance), Level::High).await.unwrap_err();
            assert!(matches!(
                err,
                RemoPiError::Unsupported(UnsupportedError::RelayTrigger { .. })
            ));
        }
        assert!(mirror_calls(&mirror).is_empty());
        assert!(gpio.writes(27).is_empty());
    }

    fn peer(mirror: &MirrorClient<FakePeer, FakeResolver>) -> &FakePeer {
        mirror.client()
    }

    fn mirror_calls(mirror: &MirrorClient<FakePeer, FakeResolver>) -> Vec<PeerCall> {
        peer(mirror).calls()
    }

    #[tokio::test]
    async fn should_publish_toggle_command_on_press() {
        let (dispatcher, gpio, sent) = broker(vec![light_with_pins("lamp", 17, 27)]);

        dispatcher.handle_edge(&id("lamp"), Level::High).await.unwrap();
        dispatcher.handle_edge(&id("lamp"), Level::Low).await.unwrap();

        assert_eq!(
            *sent.sent.lock().unwrap(),
            vec![("lamp".to_string(), Button::Toggle)]
        );
        assert!(gpio.writes(27).is_empty());
    }

    #[tokio::test]
    async fn should_not_publish_when_condition_pin_is_low() {
        let (dispatcher, gpio, sent) = broker(vec![with_condition(light_with_pins("lamp", 17, 27), 5)]);
        gpio.set_level(5, Level::Low);

        dispatcher.handle_edge(&id("lamp"), Level::High).await.unwrap();

        assert!(sent.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_refuse_to_publish_non_toggle_triggers() {
        let (dispatcher, _, sent) = broker(vec![sync_light("lamp")]);

        let result = dispatcher.handle_edge(&id("lamp"), Level::High).await;

        assert!(matches!(result, Err(RemoPiError::Unsupported(_))));
        assert!(sent.sent.lock().unwrap().is_empty());
    }
}
