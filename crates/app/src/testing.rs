//! In-memory fakes implementing the ports, shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use remopi_domain::appliance::{Appliance, ApplianceVariant, PinNumber};
use remopi_domain::error::RemoPiError;
use remopi_domain::id::{ApplianceId, SignalId};
use remopi_domain::ir::IrSignal;
use remopi_domain::level::{Level, PowerState};
use remopi_domain::status::ApplianceStatus;
use remopi_domain::trigger::Trigger;

use crate::ports::{
    CloudAppliance, Gpio, InputPin, OutputPin, PeerClient, PeerError, PeerResolver, RemoApi,
    StatusPublisher,
};
use crate::registry::ApplianceRegistry;
use crate::services::actuator::Actuator;
use crate::timers::TimerRegistry;

// ---------------------------------------------------------------- appliances

pub(crate) fn appliance(id: &str, variant: ApplianceVariant) -> Appliance {
    Appliance::builder()
        .id(ApplianceId::new(id).unwrap())
        .name(id)
        .variant(variant)
        .build()
        .unwrap()
}

pub(crate) fn light(id: &str) -> Appliance {
    appliance(
        id,
        ApplianceVariant::Light {
            on_button: None,
            off_button: None,
        },
    )
}

pub(crate) fn light_with_pins(id: &str, switch: PinNumber, status: PinNumber) -> Appliance {
    let mut appliance = light(id);
    appliance.switch_pin = Some(switch);
    appliance.status_pin = Some(status);
    appliance
}

/// Cloud IR appliance with signals `{id}-on` / `{id}-off`.
pub(crate) fn signal_appliance(id: &str) -> Appliance {
    appliance(
        id,
        ApplianceVariant::InfraredSignal {
            on_signal: SignalId::new(format!("{id}-on")).unwrap(),
            off_signal: SignalId::new(format!("{id}-off")).unwrap(),
        },
    )
}

pub(crate) fn timer_signal(id: &str, timer: Option<&str>) -> Appliance {
    let mut appliance = signal_appliance(id);
    appliance.trigger = Trigger::Timer;
    appliance.timer = timer.map(str::to_string);
    appliance
}

// ---------------------------------------------------------------------- gpio

#[derive(Debug, Default)]
struct PinState {
    high: bool,
    fail_reads: bool,
    writes: Vec<Level>,
}

/// GPIO backend whose pins share state with the test.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeGpio {
    pins: Arc<Mutex<HashMap<PinNumber, PinState>>>,
    denied: Arc<Mutex<HashSet<PinNumber>>>,
}

impl FakeGpio {
    pub(crate) fn deny(&self, pin: PinNumber) {
        self.denied.lock().unwrap().insert(pin);
    }

    pub(crate) fn set_level(&self, pin: PinNumber, level: Level) {
        self.pins.lock().unwrap().entry(pin).or_default().high = level.is_high();
    }

    pub(crate) fn level(&self, pin: PinNumber) -> Level {
        let pins = self.pins.lock().unwrap();
        Level::from(pins.get(&pin).is_some_and(|state| state.high))
    }

    pub(crate) fn fail_reads(&self, pin: PinNumber, fail: bool) {
        self.pins.lock().unwrap().entry(pin).or_default().fail_reads = fail;
    }

    pub(crate) fn writes(&self, pin: PinNumber) -> Vec<Level> {
        let pins = self.pins.lock().unwrap();
        pins.get(&pin).map(|state| state.writes.clone()).unwrap_or_default()
    }

    fn open(&self, pin: PinNumber) -> Result<FakePin, RemoPiError> {
        if self.denied.lock().unwrap().contains(&pin) {
            return Err(RemoPiError::hardware(std::io::Error::other("pin busy")));
        }
        self.pins.lock().unwrap().entry(pin).or_default();
        Ok(FakePin {
            number: pin,
            pins: Arc::clone(&self.pins),
        })
    }
}

#[derive(Debug)]
pub(crate) struct FakePin {
    number: PinNumber,
    pins: Arc<Mutex<HashMap<PinNumber, PinState>>>,
}

impl FakePin {
    fn read_level(&self) -> Result<Level, RemoPiError> {
        let pins = self.pins.lock().unwrap();
        let state = &pins[&self.number];
        if state.fail_reads {
            return Err(RemoPiError::hardware(std::io::Error::other("read failed")));
        }
        Ok(Level::from(state.high))
    }
}

impl InputPin for FakePin {
    fn read(&self) -> Result<Level, RemoPiError> {
        self.read_level()
    }
}

impl OutputPin for FakePin {
    fn read(&self) -> Result<Level, RemoPiError> {
        self.read_level()
    }

    fn write(&self, level: Level) -> Result<(), RemoPiError> {
        let mut pins = self.pins.lock().unwrap();
        let state = pins.entry(self.number).or_default();
        state.high = level.is_high();
        state.writes.push(level);
        Ok(())
    }
}

impl Gpio for FakeGpio {
    type Input = FakePin;
    type Output = FakePin;

    fn input(&self, pin: PinNumber) -> Result<FakePin, RemoPiError> {
        self.open(pin)
    }

    fn output(&self, pin: PinNumber) -> Result<FakePin, RemoPiError> {
        self.open(pin)
    }
}

// ------------------------------------------------------------------ cloud api

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RemoCall {
    Light(String, String),
    Tv(String, String),
    Signal(String),
    Local(String, Vec<u32>),
}

/// Cloud API recording every call; lights answer with the pressed button.
#[derive(Debug, Default)]
pub(crate) struct FakeRemo {
    calls: Mutex<Vec<RemoCall>>,
    failures: AtomicUsize,
    latency: Mutex<Duration>,
    cloud: Mutex<Vec<CloudAppliance>>,
}

impl FakeRemo {
    pub(crate) fn calls(&self) -> Vec<RemoCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Make the next `count` calls fail.
    pub(crate) fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Make every call take `latency` before answering.
    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub(crate) fn set_cloud(&self, appliances: Vec<CloudAppliance>) {
        *self.cloud.lock().unwrap() = appliances;
    }

    async fn call(&self, call: Option<RemoCall>) -> Result<(), RemoPiError> {
        if let Some(call) = call {
            self.calls.lock().unwrap().push(call);
        }
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RemoPiError::upstream(std::io::Error::other("cloud unavailable")));
        }
        Ok(())
    }
}

impl RemoApi for FakeRemo {
    async fn send_light(&self, appliance: &ApplianceId, button: &str) -> Result<PowerState, RemoPiError> {
        self.call(Some(RemoCall::Light(appliance.to_string(), button.to_string()))).await?;
        Ok(PowerState::from_power_field(button))
    }

    async fn send_tv(&self, appliance: &ApplianceId, button: &str) -> Result<(), RemoPiError> {
        self.call(Some(RemoCall::Tv(appliance.to_string(), button.to_string()))).await
    }

    async fn send_signal(&self, signal: &SignalId) -> Result<(), RemoPiError> {
        self.call(Some(RemoCall::Signal(signal.to_string()))).await
    }

    async fn list_appliances(&self) -> Result<Vec<CloudAppliance>, RemoPiError> {
        self.call(None).await?;
        Ok(self.cloud.lock().unwrap().clone())
    }

    async fn emit_local(&self, ip: &str, signal: &IrSignal) -> Result<(), RemoPiError> {
        self.call(Some(RemoCall::Local(ip.to_string(), signal.data.clone()))).await
    }
}

// ------------------------------------------------------------------ publisher

#[derive(Debug, Default)]
pub(crate) struct RecordingPublisher {
    statuses: Mutex<Vec<ApplianceStatus>>,
}

impl RecordingPublisher {
    pub(crate) fn powers(&self) -> Vec<(String, PowerState)> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .map(|status| (status.appliance_id.to_string(), status.power_state))
            .collect()
    }
}

impl StatusPublisher for RecordingPublisher {
    async fn publish(&self, status: ApplianceStatus) -> Result<(), RemoPiError> {
        self.statuses.lock().unwrap().push(status);
        Ok(())
    }
}

// ---------------------------------------------------------------------- peer

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PeerCall {
    Status { addr: String, id: String },
    Send { addr: String, id: String, button: String },
}

/// Peer controller holding one power state per appliance.
#[derive(Debug, Default)]
pub(crate) struct FakePeer {
    calls: Mutex<Vec<PeerCall>>,
    powers: Mutex<HashMap<String, PowerState>>,
    transport_failures: AtomicUsize,
    reject_with: Mutex<Option<u16>>,
}

impl FakePeer {
    pub(crate) fn calls(&self) -> Vec<PeerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn set_power(&self, id: &str, power: PowerState) {
        self.powers.lock().unwrap().insert(id.to_string(), power);
    }

    pub(crate) fn power(&self, id: &str) -> Option<PowerState> {
        self.powers.lock().unwrap().get(id).copied()
    }

    /// Make the next `count` requests fail at the transport level.
    pub(crate) fn unreachable_for(&self, count: usize) {
        self.transport_failures.store(count, Ordering::SeqCst);
    }

    pub(crate) fn reject_with(&self, status: u16) {
        *self.reject_with.lock().unwrap() = Some(status);
    }

    fn check(&self, addr: &str) -> Result<(), PeerError> {
        let unreachable = self
            .transport_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if unreachable {
            return Err(PeerError::Transport {
                addr: addr.to_string(),
                source: Box::new(std::io::Error::other("connection refused")),
            });
        }
        if let Some(status) = *self.reject_with.lock().unwrap() {
            return Err(PeerError::Rejected(status));
        }
        Ok(())
    }
}

impl PeerClient for FakePeer {
    async fn status(&self, addr: &str, _port: u16, id: &ApplianceId) -> Result<PowerState, PeerError> {
        self.calls.lock().unwrap().push(PeerCall::Status {
            addr: addr.to_string(),
            id: id.to_string(),
        });
        self.check(addr)?;
        Ok(self.power(id.as_str()).unwrap_or(PowerState::Off))
    }

    async fn send(&self, addr: &str, _port: u16, id: &ApplianceId, button: &str) -> Result<(), PeerError> {
        self.calls.lock().unwrap().push(PeerCall::Send {
            addr: addr.to_string(),
            id: id.to_string(),
            button: button.to_string(),
        });
        self.check(addr)?;
        self.set_power(id.as_str(), PowerState::from_power_field(button));
        Ok(())
    }
}

/// Resolver answering with a fixed address, or never answering at all.
#[derive(Debug, Default)]
pub(crate) struct FakeResolver {
    answer: Option<Ipv4Addr>,
    silent: bool,
    lookups: AtomicUsize,
}

impl FakeResolver {
    pub(crate) fn answering(addr: Ipv4Addr) -> Self {
        Self {
            answer: Some(addr),
            ..Self::default()
        }
    }

    pub(crate) fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl PeerResolver for FakeResolver {
    async fn lookup(&self, _host: &str, _timeout: Duration) -> Option<Ipv4Addr> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.silent {
            std::future::pending::<()>().await;
        }
        self.answer
    }
}

// ------------------------------------------------------------------ assembly

pub(crate) type TestActuator = Actuator<FakeRemo, FakeGpio, RecordingPublisher>;

pub(crate) fn actuator(
    appliances: Vec<Appliance>,
) -> (TestActuator, FakeGpio, Arc<FakeRemo>, Arc<RecordingPublisher>) {
    let gpio = FakeGpio::default();
    let api = Arc::new(FakeRemo::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let (registry, _) = ApplianceRegistry::load(appliances, &api, &gpio).unwrap();
    let actuator = Actuator::new(Arc::new(registry), TimerRegistry::new(), Arc::clone(&publisher));
    (actuator, gpio, api, publisher)
}
