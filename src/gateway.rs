//! Frame dispatch: integrity pipeline, profile hooks and the transmit
//! allowlist wired together.

use crate::arbiter::{ControlsArbiter, StandardArbiter};
use crate::config::GatewayConfig;
use crate::frame::{Bus, CanFrame};
use crate::rx_check::{IntegrityState, RxChecker};
use crate::state::VehicleState;
use crate::{RxStatus, SafetyProfile, SafetyResult};
use tracing::{debug, trace, warn};

/// One active safety profile and all state it owns.
///
/// Construction corresponds to profile activation: every flag starts cleared
/// and nothing is authorized.
#[derive(Debug, Clone)]
pub struct Gateway<P: SafetyProfile, A: ControlsArbiter = StandardArbiter> {
    config: GatewayConfig,
    profile: P,
    arbiter: A,
    rx_checker: RxChecker,
    state: VehicleState,
}

impl<P: SafetyProfile> Gateway<P, StandardArbiter> {
    /// Activate `P` with the standard arbitration policy.
    ///
    /// # Errors
    /// Returns `SafetyError::InvalidConfiguration` if the profile's tables are
    /// inconsistent.
    pub fn new(config: GatewayConfig) -> SafetyResult<Self> {
        Self::with_arbiter(config, StandardArbiter::new(&config))
    }
}

impl<P: SafetyProfile, A: ControlsArbiter> Gateway<P, A> {
    /// Activate `P` with a custom arbitration policy.
    ///
    /// # Errors
    /// Returns `SafetyError::InvalidConfiguration` if the profile's tables are
    /// inconsistent.
    pub fn with_arbiter(config: GatewayConfig, arbiter: A) -> SafetyResult<Self> {
        let profile = P::new(config)?;
        let rx_checker = RxChecker::new(profile.rx_checks())?;
        debug!(longitudinal = config.longitudinal, "safety profile activated");
        Ok(Self {
            config,
            profile,
            arbiter,
            rx_checker,
            state: VehicleState::new(),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn integrity(&self, bus: Bus, addr: u32) -> Option<&IntegrityState> {
        self.rx_checker.integrity(bus, addr)
    }

    /// Some monitored message is lagging or was never received
    pub fn rx_checks_invalid(&self) -> bool {
        self.rx_checker.rx_checks_invalid()
    }

    /// Process one inbound frame.
    ///
    /// Frames failing the integrity checks do not reach the profile and clear
    /// authorization.
    pub fn rx(&mut self, frame: &CanFrame, now_us: u64) -> RxStatus {
        let status = self.rx_checker.check(&self.profile, frame, now_us);
        if status.is_valid() {
            self.profile.rx(frame, &mut self.state, &self.arbiter);
        } else {
            if self.state.controls_allowed || self.state.controls_allowed_long {
                debug!(addr = frame.addr(), ?status, "invalid frame, leaving controls");
            }
            self.state.clear_controls();
        }
        status
    }

    /// Decide whether an outbound frame may be put on the bus.
    ///
    /// The profile's gate always sees the frame so its memory stays current,
    /// even when the allowlist or a relay malfunction blocks it anyway.
    pub fn tx(&mut self, frame: &CanFrame) -> bool {
        let allowlisted = self.profile.tx_allowlist().iter().any(|msg| msg.matches(frame));
        let gate_allowed = self.profile.tx(frame, &self.state);
        let allowed = allowlisted && gate_allowed && !self.state.relay_malfunction;
        if !allowed {
            trace!(
                addr = frame.addr(),
                bus = frame.bus(),
                allowlisted,
                gate_allowed,
                relay_malfunction = self.state.relay_malfunction,
                "transmit blocked"
            );
        }
        allowed
    }

    /// Destination bus for a frame seen on `bus`, `None` to drop it
    pub fn fwd(&self, bus: Bus, addr: u32) -> Option<Bus> {
        self.profile.fwd(bus, addr)
    }

    /// Periodic staleness check of the monitored messages.
    pub fn tick(&mut self, now_us: u64) {
        let lagging = self.rx_checker.tick(now_us);
        let faulty = self.rx_checker.counters_faulty();
        let authorized = self.state.controls_allowed || self.state.controls_allowed_long;
        if (lagging || faulty) && authorized {
            warn!(lagging, faulty, "rx checks invalid, leaving controls");
        }
        if lagging || faulty {
            self.state.clear_controls();
        }
    }
}
