//! # CAN Safety Gateway
//!
//! This library implements the safety layer that sits between a driver-assist
//! controller and the actuators of a vehicle's CAN network.
//!
//! ## Overview
//!
//! Every frame is judged against a per-vehicle safety profile that:
//! - verifies the integrity of trusted inbound frames (salted CRC-8 and a
//!   rolling counter)
//! - tracks the vehicle state derived from those frames (speed, measured
//!   curvature, pedals, cruise state)
//! - owns the authorization state machine driven by cruise engagement and
//!   driver buttons
//! - gates outbound steering and acceleration commands against fixed limits
//! - decides which frames are forwarded between the buses it bridges
//!
//! Per-frame decisions never fail with an error: a blocked or dropped frame is
//! the only failure signal. Errors are reserved for invalid configuration.
//!
//! ## Example
//!
//! ```rust
//! use can_safety_gateway::{CanFrame, Gateway, GatewayConfig, SafetyResult};
//! use can_safety_gateway::volkswagen_meb::{VolkswagenMeb, MSG_HCA_03};
//!
//! # fn main() -> SafetyResult<()> {
//! let mut gateway = Gateway::<VolkswagenMeb>::new(GatewayConfig::default())?;
//!
//! // Nothing is authorized right after activation, so an active steering
//! // request is blocked.
//! let mut hca = [0u8; 24];
//! hca[1] = 0x40; // steering request
//! hca[2] = 50; // steering power
//! hca[3] = 10; // curvature
//! let frame = CanFrame::new(0, MSG_HCA_03, &hca)?;
//! assert!(!gateway.tx(&frame));
//!
//! // Primary bus traffic is forwarded to the camera bus.
//! assert_eq!(gateway.fwd(0, 0x0FC), Some(2));
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod arbiter;
pub mod common;
pub mod config;
pub mod frame;
pub mod gateway;
mod profiles;
pub mod rx_check;
pub mod shared;
pub mod state;

pub use arbiter::{ControlsArbiter, StandardArbiter};
pub use config::GatewayConfig;
pub use frame::{Bus, CanFrame};
pub use gateway::Gateway;
pub use profiles::volkswagen_meb;
pub use rx_check::{RxCheckSpec, TxMsg};
pub use shared::SharedGateway;
pub use state::VehicleState;

/// Result type for gateway construction and configuration
pub type SafetyResult<T> = Result<T, SafetyError>;

/// Outcome of the integrity check of one inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxStatus {
    /// All checks of this frame passed
    Ok,
    /// The address is not monitored; no integrity checks apply
    Unmonitored,
    /// Length differs from the one registered for the address
    LengthError,
    /// Embedded checksum differs from the computed one
    ChecksumError,
    /// Same counter as the previous frame
    Repeated,
    /// Counter did not advance by exactly one
    WrongSequence,
}

impl RxStatus {
    /// Whether the frame may update vehicle state
    pub fn is_valid(self) -> bool {
        matches!(self, RxStatus::Ok | RxStatus::Unmonitored)
    }
}

/// Gateway error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SafetyError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Frame cannot be represented
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

/// Main trait for vehicle safety profiles
///
/// A profile provides the protocol knowledge for one vehicle platform:
/// - which inbound messages are monitored and how their integrity is checked
/// - how trusted frames update [`VehicleState`]
/// - which outbound frames may reach the vehicle
/// - how frames are forwarded between buses
///
/// The [`Gateway`] composes a profile with a [`ControlsArbiter`] and the
/// integrity pipeline.
pub trait SafetyProfile {
    /// Create a new instance for the given configuration
    ///
    /// # Errors
    /// Returns `SafetyError::InvalidConfiguration` if the profile's constant
    /// tables are inconsistent
    fn new(config: GatewayConfig) -> SafetyResult<Self>
    where
        Self: Sized;

    /// Monitored inbound messages
    fn rx_checks(&self) -> &'static [RxCheckSpec];

    /// Outbound messages the upstream controller may attempt to send
    fn tx_allowlist(&self) -> &'static [TxMsg];

    /// Checksum embedded in the frame
    fn get_checksum(&self, frame: &CanFrame) -> u8;

    /// Rolling counter embedded in the frame
    fn get_counter(&self, frame: &CanFrame) -> u8;

    /// Checksum the frame should carry
    fn compute_checksum(&self, frame: &CanFrame) -> u8;

    /// Apply a trusted inbound frame that passed integrity checks
    fn rx<A: ControlsArbiter>(&mut self, frame: &CanFrame, state: &mut VehicleState, arbiter: &A);

    /// Decide whether an outbound frame may be transmitted
    fn tx(&mut self, frame: &CanFrame, state: &VehicleState) -> bool;

    /// Destination bus for a frame seen on `bus`, `None` to drop it
    fn fwd(&self, bus: Bus, addr: u32) -> Option<Bus>;
}
