//! Gateway handle for hosts that run the inbound and outbound paths on
//! different execution units.
//!
//! All vehicle state sits behind one lock, so a gate never observes a
//! half-applied inbound frame (for example a new speed with a stale
//! curvature).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::arbiter::{ControlsArbiter, StandardArbiter};
use crate::config::GatewayConfig;
use crate::frame::{Bus, CanFrame};
use crate::gateway::Gateway;
use crate::state::VehicleState;
use crate::{RxStatus, SafetyProfile, SafetyResult};

pub struct SharedGateway<P: SafetyProfile, A: ControlsArbiter = StandardArbiter> {
    inner: Arc<Mutex<Gateway<P, A>>>,
}

impl<P: SafetyProfile, A: ControlsArbiter> Clone for SharedGateway<P, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: SafetyProfile> SharedGateway<P, StandardArbiter> {
    /// # Errors
    /// Returns `SafetyError::InvalidConfiguration` if the profile's tables are
    /// inconsistent.
    pub fn new(config: GatewayConfig) -> SafetyResult<Self> {
        Ok(Self::from_gateway(Gateway::new(config)?))
    }
}

impl<P: SafetyProfile, A: ControlsArbiter> SharedGateway<P, A> {
    pub fn from_gateway(gateway: Gateway<P, A>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gateway)),
        }
    }

    pub fn rx(&self, frame: &CanFrame, now_us: u64) -> RxStatus {
        self.inner.lock().rx(frame, now_us)
    }

    pub fn tx(&self, frame: &CanFrame) -> bool {
        self.inner.lock().tx(frame)
    }

    pub fn fwd(&self, bus: Bus, addr: u32) -> Option<Bus> {
        self.inner.lock().fwd(bus, addr)
    }

    pub fn tick(&self, now_us: u64) {
        self.inner.lock().tick(now_us)
    }

    /// Consistent copy of the vehicle state
    pub fn snapshot(&self) -> VehicleState {
        self.inner.lock().state().clone()
    }
}
