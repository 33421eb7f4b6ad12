//! HCA_03 curvature command gate.

use crate::common::field_ops::{read_bit_at, read_u8_at, write_bit_at, write_u8_at};
use crate::common::limits::{steer_angle_cmd_checks, SteerCommand, SteeringLimits};
use crate::state::VehicleState;
use tracing::trace;

const HCA_POWER_BYTE: usize = 2;
const HCA_POWER_MASK: u8 = 0x7F;
const HCA_CURVATURE_LO: usize = 3;
const HCA_CURVATURE_HI: usize = 4;
const HCA_CURVATURE_HI_MASK: u8 = 0x7F;
const HCA_CURVATURE_SIGN_BIT: usize = 39;
const HCA_REQUEST_BIT: usize = 14;

/// Decoded HCA_03 request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurvatureRequest {
    /// Signed curvature, wire units
    pub curvature: i32,
    pub steer_req: bool,
    /// Steering power, 0..=127
    pub power: u8,
}

impl CurvatureRequest {
    /// Write the request fields into an HCA_03 payload.
    pub fn encode(&self, data: &mut [u8]) {
        let magnitude = self.curvature.unsigned_abs().min(0x7FFF) as u16;
        let [lo, hi] = magnitude.to_le_bytes();
        write_u8_at(data, HCA_CURVATURE_LO, lo);
        let sign = read_u8_at(data, HCA_CURVATURE_HI) & !HCA_CURVATURE_HI_MASK;
        write_u8_at(data, HCA_CURVATURE_HI, sign | (hi & HCA_CURVATURE_HI_MASK));
        write_bit_at(data, HCA_CURVATURE_SIGN_BIT, self.curvature >= 0);
        write_bit_at(data, HCA_REQUEST_BIT, self.steer_req);
        let other = read_u8_at(data, HCA_POWER_BYTE) & !HCA_POWER_MASK;
        write_u8_at(data, HCA_POWER_BYTE, other | (self.power & HCA_POWER_MASK));
    }
}

/// Decode HCA_03. The sign bit set means a non-negative curvature.
pub fn decode_curvature_request(data: &[u8]) -> CurvatureRequest {
    let magnitude = i32::from(read_u8_at(data, HCA_CURVATURE_LO))
        | (i32::from(read_u8_at(data, HCA_CURVATURE_HI) & HCA_CURVATURE_HI_MASK) << 8);
    let curvature = if read_bit_at(data, HCA_CURVATURE_SIGN_BIT) {
        magnitude
    } else {
        -magnitude
    };
    CurvatureRequest {
        curvature,
        steer_req: read_bit_at(data, HCA_REQUEST_BIT),
        power: read_u8_at(data, HCA_POWER_BYTE) & HCA_POWER_MASK,
    }
}

/// Memory the steering gate keeps between commands
#[derive(Debug, Clone, Default)]
pub(super) struct SteeringGate {
    desired_curvature_last: i32,
    steer_power_prev: u8,
}

impl SteeringGate {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn steer_power_prev(&self) -> u8 {
        self.steer_power_prev
    }

    pub(super) fn check(
        &mut self,
        data: &[u8],
        state: &VehicleState,
        limits: &SteeringLimits,
    ) -> bool {
        let request = decode_curvature_request(data);
        let command = SteerCommand {
            desired: request.curvature,
            steer_req: request.steer_req,
        };
        let violation = steer_angle_cmd_checks(
            command,
            &mut self.desired_curvature_last,
            state.controls_allowed,
            &state.angle_meas,
            limits,
        );

        let mut tx = true;
        if violation {
            tx = false;
            // Power may still fall monotonically to zero once controls are gone
            if request.steer_req && request.power != 0 && request.power < self.steer_power_prev {
                tx = true;
            }
        }

        if request.curvature.unsigned_abs() > limits.max_steer.unsigned_abs() {
            tx = false;
        }

        if !request.steer_req && request.power != 0 {
            tx = false;
        }

        if !tx {
            trace!(?request, prev_power = self.steer_power_prev, "HCA_03 blocked");
        }
        self.steer_power_prev = request.power;
        tx
    }
}
