//! Cruise engagement state machine.
//!
//! In stock-longitudinal mode authorization follows the vehicle's own cruise
//! engagement. When the stack owns longitudinal control, authorization is
//! entered on the release of Set or Resume with the main switch on. Cancel
//! always drops longitudinal authorization, and main switch off drops
//! everything.

use super::{GRA_CANCEL_BIT, GRA_RESUME_BIT, GRA_SET_BIT};
use crate::arbiter::ControlsArbiter;
use crate::common::field_ops::{read_bit_at, read_u8_at};
use crate::state::VehicleState;
use tracing::debug;

const TSK_STATUS_BYTE: usize = 11;
const TSK_STATUS_MASK: u8 = 0x07;

/// Cruise availability decoded from TSK_06.TSK_Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CruiseStatus {
    Off,
    /// Main switch on, not engaged
    Standby,
    /// Engaged, authorizing
    Engaged,
}

impl CruiseStatus {
    pub fn from_tsk(status: u8) -> Self {
        match status {
            3..=5 => CruiseStatus::Engaged,
            2 => CruiseStatus::Standby,
            _ => CruiseStatus::Off,
        }
    }

    pub fn engaged(self) -> bool {
        self == CruiseStatus::Engaged
    }

    pub fn main_on(self) -> bool {
        self != CruiseStatus::Off
    }
}

pub(super) fn decode_cruise_status(data: &[u8]) -> CruiseStatus {
    CruiseStatus::from_tsk(read_u8_at(data, TSK_STATUS_BYTE) & TSK_STATUS_MASK)
}

pub(super) fn update_cruise_status<A: ControlsArbiter>(
    data: &[u8],
    state: &mut VehicleState,
    arbiter: &A,
    longitudinal: bool,
) {
    let status = decode_cruise_status(data);
    let cruise_engaged = status.engaged();
    let main_on = status.main_on();
    state.acc_main_on = main_on;

    if !longitudinal {
        arbiter.pcm_cruise_check(state, cruise_engaged);
    }
    state.cruise_engaged_prev = cruise_engaged;

    arbiter.acc_main_check(state, main_on);
}

pub(super) fn update_buttons(data: &[u8], state: &mut VehicleState, longitudinal: bool) {
    if longitudinal {
        let set_button = read_bit_at(data, GRA_SET_BIT);
        let resume_button = read_bit_at(data, GRA_RESUME_BIT);
        let released = (state.set_button_prev && !set_button)
            || (state.resume_button_prev && !resume_button);
        if released {
            debug!(main_on = state.acc_main_on, "set/resume released");
            state.controls_allowed = state.acc_main_on;
            state.controls_allowed_long = state.acc_main_on;
        }
        state.set_button_prev = set_button;
        state.resume_button_prev = resume_button;
    }

    // Evaluated after the set/resume edge, so cancel wins within one frame
    if read_bit_at(data, GRA_CANCEL_BIT) {
        if state.controls_allowed_long {
            debug!("cancel pressed, leaving longitudinal controls");
        }
        state.controls_allowed_long = false;
    }
}
