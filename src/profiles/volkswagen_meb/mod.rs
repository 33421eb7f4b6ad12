//! # Volkswagen MEB Profile
//!
//! Safety profile for the MEB platform. Steering is commanded as path
//! curvature through HCA_03; acceleration through ACC_02 when the stack owns
//! longitudinal control.
//!
//! # Integrity
//! Monitored messages carry a CRC-8/AUTOSAR in byte 0 and a 4-bit rolling
//! counter in the low nibble of byte 1. The CRC covers bytes 1.. and is salted
//! with a per-address byte selected by the counter.
//!
//! # Buses
//! - 0: vehicle side (J533 gateway)
//! - 2: camera / extended CAN side

mod engagement;
mod forwarding;
mod longitudinal;
mod steering;
mod tracker;

use crate::arbiter::ControlsArbiter;
use crate::common::crc_ops::{compute_crc8_autosar_salted, SaltTable};
use crate::common::field_ops::{read_low_nibble_at, read_u8_at};
use crate::common::limits::{LongitudinalLimits, LookupTable, SteeringLimits};
use crate::config::GatewayConfig;
use crate::frame::{Bus, CanFrame};
use crate::rx_check::{RxCheckSpec, TxMsg};
use crate::state::VehicleState;
use crate::{SafetyProfile, SafetyResult};

pub use engagement::CruiseStatus;
pub use longitudinal::{decode_accel, encode_accel};
pub use steering::{decode_curvature_request, CurvatureRequest};

pub const MSG_LH_EPS_03: u32 = 0x09F; // RX, EPS status; TX to camera bus
pub const MSG_MEB_ESP_01: u32 = 0x0FC; // RX, wheel speeds
pub const MSG_MEB_ESP_04: u32 = 0x102; // RX, yaw rate
pub const MSG_MEB_MOTOR_01: u32 = 0x10B; // RX, TSK state
pub const MSG_GRA_ACC_01: u32 = 0x12B; // RX/TX, ACC buttons
pub const MSG_MEB_ESP_05: u32 = 0x139; // RX, ESP hold
pub const MSG_MEB_EPS_01: u32 = 0x13D; // RX, steering angle
pub const MSG_MEB_ESP_03: u32 = 0x14C; // RX, accelerator pedal
pub const MSG_MEB_ACC_02: u32 = 0x14D; // TX in long mode, acceleration request
pub const MSG_MEB_ABS_01: u32 = 0x20A; // RX
pub const MSG_MEB_TRAVEL_ASSIST_01: u32 = 0x26B; // TX in long mode, Travel Assist status
pub const MSG_MEB_ACC_01: u32 = 0x300; // TX in long mode, ACC status
pub const MSG_HCA_03: u32 = 0x303; // TX, curvature command
pub const MSG_LDW_02: u32 = 0x397; // TX, lane warning HUD
pub const MSG_MOTOR_14: u32 = 0x3BE; // RX, brake switch

/// Vehicle-side bus
pub const BUS_MAIN: Bus = 0;
/// Camera / extended bus
pub const BUS_CAM: Bus = 2;

pub const STEERING_LIMITS: SteeringLimits = SteeringLimits {
    max_steer: 31036, // ~0.195 rad/m
    angle_deg_to_can: 2777.7777,
    angle_rate_up_lookup: LookupTable {
        x: &[0., 5., 15.],
        y: &[0.3, 0.086, 0.0086],
    },
    angle_rate_down_lookup: LookupTable {
        x: &[0., 5., 15.],
        y: &[0.3, 0.2, 0.02],
    },
    inactive_angle_is_zero: true,
};

pub const LONG_LIMITS: LongitudinalLimits = LongitudinalLimits {
    max_accel: 2000,
    min_accel: -3500,
    inactive_accel: 3010, // one step above the range
};

// GRA_ACC_01 button bits
const GRA_CANCEL_BIT: usize = 13;
const GRA_SET_BIT: usize = 16;
const GRA_ACCEL_BIT: usize = 17;
const GRA_DECEL_BIT: usize = 18;
const GRA_RESUME_BIT: usize = 19;

/// Only acceleration accepted while the driver overrides with the pedal
pub const ACCEL_OVERRIDE: i32 = 0;

const SALTS_LH_EPS_03: SaltTable = [0xF5; 16];
const SALTS_GRA_ACC_01: SaltTable = [
    0x6A, 0x38, 0xB4, 0x27, 0x22, 0xEF, 0xE1, 0xBB, 0xF8, 0x80, 0x84, 0x49, 0xC7, 0x9E, 0x1E, 0x2B,
];
const SALTS_MEB_EPS_01: SaltTable = [
    0x20, 0xCA, 0x68, 0xD5, 0x1B, 0x31, 0xE2, 0xDA, 0x08, 0x0A, 0xD4, 0xDE, 0x9C, 0xE4, 0x35, 0x5B,
];
const SALTS_MEB_ESP_01: SaltTable = [
    0x77, 0x5C, 0xA0, 0x89, 0x4B, 0x7C, 0xBB, 0xD6, 0x1F, 0x6C, 0x4F, 0xF6, 0x20, 0x2B, 0x43, 0xDD,
];
const SALTS_MEB_ESP_03: SaltTable = [
    0x16, 0x35, 0x59, 0x15, 0x9A, 0x2A, 0x97, 0xB8, 0x0E, 0x4E, 0x30, 0xCC, 0xB3, 0x07, 0x01, 0xAD,
];
const SALTS_MEB_ESP_04: SaltTable = [
    0xD7, 0x12, 0x85, 0x7E, 0x0B, 0x34, 0xFA, 0x16, 0x7A, 0x25, 0x2D, 0x8F, 0x04, 0x8E, 0x5D, 0x35,
];
const SALTS_MEB_ESP_05: SaltTable = [
    0xED, 0x03, 0x1C, 0x13, 0xC6, 0x23, 0x78, 0x7A, 0x8B, 0x40, 0x14, 0x51, 0xBF, 0x68, 0x32, 0xBA,
];
// Same table as ESP_01
const SALTS_MEB_MOTOR_01: SaltTable = SALTS_MEB_ESP_01;
const SALTS_MOTOR_14: SaltTable = [
    0x1F, 0x28, 0xC6, 0x85, 0xE6, 0xF8, 0xB0, 0x19, 0x5B, 0x64, 0x35, 0x21, 0xE4, 0xF7, 0x9C, 0x24,
];
const SALTS_MEB_ABS_01: SaltTable = [
    0x9D, 0xE8, 0x36, 0xA1, 0xCA, 0x3B, 0x1D, 0x33, 0xE0, 0xD5, 0xBB, 0x5F, 0xAE, 0x3C, 0x31, 0x9F,
];

const fn monitored(addr: u32, len: usize, frequency_hz: u32, salts: SaltTable) -> RxCheckSpec {
    RxCheckSpec {
        addr,
        bus: BUS_MAIN,
        len,
        check_checksum: true,
        max_counter: 15,
        frequency_hz,
        salts: Some(salts),
    }
}

pub static RX_CHECKS: [RxCheckSpec; 10] = [
    monitored(MSG_LH_EPS_03, 8, 100, SALTS_LH_EPS_03),
    monitored(MSG_MOTOR_14, 8, 10, SALTS_MOTOR_14),
    monitored(MSG_MEB_MOTOR_01, 32, 50, SALTS_MEB_MOTOR_01),
    monitored(MSG_GRA_ACC_01, 8, 33, SALTS_GRA_ACC_01),
    monitored(MSG_MEB_EPS_01, 32, 100, SALTS_MEB_EPS_01),
    monitored(MSG_MEB_ESP_01, 48, 100, SALTS_MEB_ESP_01),
    monitored(MSG_MEB_ESP_03, 32, 10, SALTS_MEB_ESP_03),
    monitored(MSG_MEB_ESP_04, 48, 50, SALTS_MEB_ESP_04),
    monitored(MSG_MEB_ESP_05, 32, 50, SALTS_MEB_ESP_05),
    monitored(MSG_MEB_ABS_01, 64, 50, SALTS_MEB_ABS_01),
];

// GRA_ACC_01 may go to both buses to work with gateway and camera integration
pub static STOCK_TX_MSGS: [TxMsg; 5] = [
    TxMsg { addr: MSG_HCA_03, bus: BUS_MAIN, len: 24 },
    TxMsg { addr: MSG_GRA_ACC_01, bus: BUS_MAIN, len: 8 },
    TxMsg { addr: MSG_GRA_ACC_01, bus: BUS_CAM, len: 8 },
    TxMsg { addr: MSG_LDW_02, bus: BUS_MAIN, len: 8 },
    TxMsg { addr: MSG_LH_EPS_03, bus: BUS_CAM, len: 8 },
];

pub static LONG_TX_MSGS: [TxMsg; 6] = [
    TxMsg { addr: MSG_MEB_ACC_01, bus: BUS_MAIN, len: 48 },
    TxMsg { addr: MSG_MEB_ACC_02, bus: BUS_MAIN, len: 32 },
    TxMsg { addr: MSG_HCA_03, bus: BUS_MAIN, len: 24 },
    TxMsg { addr: MSG_LDW_02, bus: BUS_MAIN, len: 8 },
    TxMsg { addr: MSG_LH_EPS_03, bus: BUS_CAM, len: 8 },
    TxMsg { addr: MSG_MEB_TRAVEL_ASSIST_01, bus: BUS_MAIN, len: 8 },
];

/// Salt table registered for `addr`
pub fn salt_table(addr: u32) -> Option<&'static SaltTable> {
    RX_CHECKS
        .iter()
        .find(|spec| spec.addr == addr)
        .and_then(|spec| spec.salts.as_ref())
}

/// Checksum byte of an MEB frame
pub fn meb_checksum(payload: &[u8]) -> u8 {
    read_u8_at(payload, 0)
}

/// Rolling counter, low nibble of byte 1
pub fn meb_counter(payload: &[u8]) -> u8 {
    read_low_nibble_at(payload, 1)
}

/// Salted CRC over bytes 1.. of an MEB frame on `addr`
pub fn meb_compute_crc(addr: u32, payload: &[u8]) -> u8 {
    let covered = payload.get(1..).unwrap_or(&[]);
    compute_crc8_autosar_salted(covered, salt_table(addr), meb_counter(payload))
}

/// Volkswagen MEB safety profile
#[derive(Debug, Clone)]
pub struct VolkswagenMeb {
    longitudinal: bool,
    steering: steering::SteeringGate,
}

impl VolkswagenMeb {
    pub fn longitudinal(&self) -> bool {
        self.longitudinal
    }

    /// Steering power of the last evaluated HCA_03 frame
    pub fn steer_power_prev(&self) -> u8 {
        self.steering.steer_power_prev()
    }
}

impl SafetyProfile for VolkswagenMeb {
    fn new(config: GatewayConfig) -> SafetyResult<Self> {
        STEERING_LIMITS.validate()?;
        LONG_LIMITS.validate()?;
        for spec in RX_CHECKS.iter() {
            spec.validate()?;
        }
        Ok(Self {
            longitudinal: config.longitudinal,
            steering: steering::SteeringGate::new(),
        })
    }

    fn rx_checks(&self) -> &'static [RxCheckSpec] {
        &RX_CHECKS
    }

    fn tx_allowlist(&self) -> &'static [TxMsg] {
        if self.longitudinal {
            &LONG_TX_MSGS
        } else {
            &STOCK_TX_MSGS
        }
    }

    fn get_checksum(&self, frame: &CanFrame) -> u8 {
        meb_checksum(frame.payload())
    }

    fn get_counter(&self, frame: &CanFrame) -> u8 {
        meb_counter(frame.payload())
    }

    fn compute_checksum(&self, frame: &CanFrame) -> u8 {
        meb_compute_crc(frame.addr(), frame.payload())
    }

    fn rx<A: ControlsArbiter>(&mut self, frame: &CanFrame, state: &mut VehicleState, arbiter: &A) {
        if frame.bus() != BUS_MAIN {
            return;
        }
        let data = frame.payload();
        match frame.addr() {
            MSG_MEB_ESP_01 => tracker::update_wheel_speeds(data, state),
            MSG_MEB_ESP_05 => tracker::update_esp_hold(data, state),
            MSG_MEB_ESP_04 => tracker::update_yaw_rate(data, state, &STEERING_LIMITS),
            MSG_MEB_MOTOR_01 => {
                engagement::update_cruise_status(data, state, arbiter, self.longitudinal)
            }
            MSG_GRA_ACC_01 => engagement::update_buttons(data, state, self.longitudinal),
            MSG_MOTOR_14 => tracker::update_brake(data, state),
            MSG_MEB_ESP_03 => tracker::update_gas(data, state),
            _ => {}
        }
        arbiter.generic_rx_checks(state, frame.addr() == MSG_HCA_03);
    }

    fn tx(&mut self, frame: &CanFrame, state: &VehicleState) -> bool {
        let data = frame.payload();
        match frame.addr() {
            MSG_HCA_03 => self.steering.check(data, state, &STEERING_LIMITS),
            MSG_MEB_ACC_02 => longitudinal::accel_allowed(decode_accel(data), state, &LONG_LIMITS),
            MSG_GRA_ACC_01 => longitudinal::buttons_allowed(data, state),
            _ => true,
        }
    }

    fn fwd(&self, bus: Bus, addr: u32) -> Option<Bus> {
        forwarding::forward(bus, addr, self.longitudinal)
    }
}
