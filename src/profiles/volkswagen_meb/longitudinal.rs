//! ACC_02 acceleration gate and GRA_ACC_01 button gate.
//!
//! Acceleration is compared in m/s^2 * 1000 so no floating point is involved
//! in the decision.

use super::{
    ACCEL_OVERRIDE, GRA_ACCEL_BIT, GRA_CANCEL_BIT, GRA_DECEL_BIT, GRA_RESUME_BIT, GRA_SET_BIT,
};
use crate::common::field_ops::{read_bit_at, read_u8_at, write_u8_at};
use crate::common::limits::{max_limit_check, LongitudinalLimits};
use crate::state::VehicleState;
use tracing::trace;

const ACC_02_ACCEL_LO: usize = 3;
const ACC_02_ACCEL_HI: usize = 4;
const ACC_02_ACCEL_HI_MASK: u8 = 0x07;
const ACCEL_RAW_MAX: i32 = 0x7FF;
/// One raw count in m/s^2 * 1000
const ACCEL_SCALE: i32 = 5;
const ACCEL_OFFSET: i32 = -7220;

/// Requested acceleration in m/s^2 * 1000
pub fn decode_accel(data: &[u8]) -> i32 {
    let raw = (i32::from(read_u8_at(data, ACC_02_ACCEL_HI) & ACC_02_ACCEL_HI_MASK) << 8)
        | i32::from(read_u8_at(data, ACC_02_ACCEL_LO));
    raw * ACCEL_SCALE + ACCEL_OFFSET
}

/// Write an acceleration in m/s^2 into an ACC_02 payload, rounded to the
/// nearest count and clamped to the field's range.
pub fn encode_accel(accel_mps2: f32, data: &mut [u8]) {
    let scaled = (accel_mps2 * 1000.0 - ACCEL_OFFSET as f32) / ACCEL_SCALE as f32;
    let raw = (scaled.round() as i32).clamp(0, ACCEL_RAW_MAX) as u16;
    let [lo, hi] = raw.to_le_bytes();
    write_u8_at(data, ACC_02_ACCEL_LO, lo);
    let other = read_u8_at(data, ACC_02_ACCEL_HI) & !ACC_02_ACCEL_HI_MASK;
    write_u8_at(data, ACC_02_ACCEL_HI, other | (hi & ACC_02_ACCEL_HI_MASK));
}

pub(super) fn accel_allowed(
    desired_accel: i32,
    state: &VehicleState,
    limits: &LongitudinalLimits,
) -> bool {
    let accel_valid = state.longitudinal_allowed()
        && !max_limit_check(desired_accel, limits.max_accel, limits.min_accel);
    let accel_override = state.longitudinal_override_allowed() && desired_accel == ACCEL_OVERRIDE;
    let accel_inactive = desired_accel == limits.inactive_accel;

    let allowed = accel_valid || accel_override || accel_inactive;
    if !allowed {
        trace!(desired_accel, "ACC_02 blocked");
    }
    allowed
}

/// Cancel passes while cruise is engaged; anything else needs full authorization.
pub(super) fn buttons_allowed(data: &[u8], state: &VehicleState) -> bool {
    let is_cancel = read_bit_at(data, GRA_CANCEL_BIT);
    let is_set = read_bit_at(data, GRA_SET_BIT);
    let is_resume = read_bit_at(data, GRA_RESUME_BIT);
    let is_accel = read_bit_at(data, GRA_ACCEL_BIT);
    let is_decel = read_bit_at(data, GRA_DECEL_BIT);

    let adjusting = is_set || is_resume || is_accel || is_decel;
    let allowed = (is_cancel && state.cruise_engaged_prev)
        || (adjusting && state.controls_allowed && state.controls_allowed_long);
    if !allowed {
        trace!(is_cancel, is_set, is_resume, "GRA_ACC_01 blocked");
    }
    allowed
}
