//! Vehicle state shared by the tracker, the engagement state machine and the
//! actuation gates.
//!
//! Only the inbound path writes these fields; the outbound gates receive a
//! shared reference.

use crate::common::sample::SampleWindow;

/// Vehicle speed samples are stored in m/s scaled by this factor
pub const VEHICLE_SPEED_FACTOR: f32 = 1000.0;

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleState {
    pub(crate) vehicle_moving: bool,
    /// m/s * VEHICLE_SPEED_FACTOR
    pub(crate) vehicle_speed: SampleWindow,
    /// Measured curvature, steering wire units
    pub(crate) angle_meas: SampleWindow,
    pub(crate) esp_hold_confirmation: bool,
    pub(crate) brake_pressed: bool,
    pub(crate) brake_pressed_prev: bool,
    pub(crate) gas_pressed: bool,
    pub(crate) gas_pressed_prev: bool,
    pub(crate) cruise_engaged_prev: bool,
    pub(crate) acc_main_on: bool,
    pub(crate) acc_main_on_prev: bool,
    pub(crate) set_button_prev: bool,
    pub(crate) resume_button_prev: bool,
    pub(crate) controls_allowed: bool,
    pub(crate) controls_allowed_long: bool,
    pub(crate) relay_malfunction: bool,
}

impl VehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vehicle_moving(&self) -> bool {
        self.vehicle_moving
    }

    /// Latest filtered speed in m/s
    pub fn vehicle_speed(&self) -> f32 {
        self.vehicle_speed.latest() as f32 / VEHICLE_SPEED_FACTOR
    }

    pub fn speed_samples(&self) -> &SampleWindow {
        &self.vehicle_speed
    }

    pub fn curvature_samples(&self) -> &SampleWindow {
        &self.angle_meas
    }

    pub fn esp_hold_confirmation(&self) -> bool {
        self.esp_hold_confirmation
    }

    pub fn brake_pressed(&self) -> bool {
        self.brake_pressed
    }

    pub fn gas_pressed(&self) -> bool {
        self.gas_pressed
    }

    pub fn gas_pressed_prev(&self) -> bool {
        self.gas_pressed_prev
    }

    /// Cruise engagement reported by the most recent cruise status frame
    pub fn cruise_engaged(&self) -> bool {
        self.cruise_engaged_prev
    }

    pub fn acc_main_on(&self) -> bool {
        self.acc_main_on
    }

    /// Steering commands are authorized
    pub fn controls_allowed(&self) -> bool {
        self.controls_allowed
    }

    /// Longitudinal authorization flag on its own
    pub fn controls_allowed_long(&self) -> bool {
        self.controls_allowed_long
    }

    pub fn relay_malfunction(&self) -> bool {
        self.relay_malfunction
    }

    /// Acceleration requests within limits are authorized
    pub fn longitudinal_allowed(&self) -> bool {
        self.controls_allowed && self.controls_allowed_long && !self.gas_pressed_prev
    }

    /// The driver is overriding with the accelerator while authorized
    pub fn longitudinal_override_allowed(&self) -> bool {
        self.controls_allowed && self.controls_allowed_long && self.gas_pressed_prev
    }

    pub(crate) fn clear_controls(&mut self) {
        self.controls_allowed = false;
        self.controls_allowed_long = false;
    }
}
