//! Authorization arbitration shared by all vehicle profiles.

use crate::config::GatewayConfig;
use crate::state::VehicleState;
use tracing::{debug, warn};

/// Generic authorization policies invoked by a profile's inbound hook.
pub trait ControlsArbiter {
    /// Follow the vehicle's own cruise engagement: enter on its rising edge,
    /// leave whenever it is not engaged. Reads `cruise_engaged_prev` for edge
    /// detection and leaves updating it to the caller.
    fn pcm_cruise_check(&self, state: &mut VehicleState, cruise_engaged: bool);

    /// Gate authorization on the cruise main switch.
    fn acc_main_check(&self, state: &mut VehicleState, main_on: bool);

    /// Pedal disengagement and relay-malfunction detection, run after every
    /// trusted frame. `stock_ecu_detected` reports that the stock ECU is
    /// transmitting a message this stack is supposed to own.
    fn generic_rx_checks(&self, state: &mut VehicleState, stock_ecu_detected: bool);
}

/// Arbitration policy used by every profile in this crate
#[derive(Debug, Clone, Copy)]
pub struct StandardArbiter {
    disengage_on_gas: bool,
}

impl StandardArbiter {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            disengage_on_gas: config.disengage_on_gas,
        }
    }
}

impl ControlsArbiter for StandardArbiter {
    fn pcm_cruise_check(&self, state: &mut VehicleState, cruise_engaged: bool) {
        if !cruise_engaged && state.controls_allowed {
            debug!("cruise disengaged, leaving controls");
            state.controls_allowed = false;
        }
        if cruise_engaged && !state.cruise_engaged_prev {
            debug!("cruise engaged, entering controls");
            state.controls_allowed = true;
        }
    }

    fn acc_main_check(&self, state: &mut VehicleState, main_on: bool) {
        if main_on && !state.acc_main_on_prev {
            debug!("main switch on");
        }
        if !main_on && (state.controls_allowed || state.controls_allowed_long) {
            debug!("main switch off, leaving controls");
            state.clear_controls();
        }
        state.acc_main_on_prev = main_on;
    }

    fn generic_rx_checks(&self, state: &mut VehicleState, stock_ecu_detected: bool) {
        if self.disengage_on_gas
            && state.gas_pressed
            && !state.gas_pressed_prev
            && state.controls_allowed
        {
            debug!("gas pressed, leaving controls");
            state.controls_allowed = false;
        }
        state.gas_pressed_prev = state.gas_pressed;

        if state.brake_pressed
            && (!state.brake_pressed_prev || state.vehicle_moving)
            && state.controls_allowed
        {
            debug!(moving = state.vehicle_moving, "brake pressed, leaving controls");
            state.controls_allowed = false;
        }
        state.brake_pressed_prev = state.brake_pressed;

        if stock_ecu_detected && !state.relay_malfunction {
            warn!("stock ECU detected on the vehicle bus, latching relay malfunction");
            state.relay_malfunction = true;
        }
    }
}
