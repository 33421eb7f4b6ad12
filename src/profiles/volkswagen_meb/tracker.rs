//! Vehicle state decoded from trusted MEB frames.

use crate::common::field_ops::{read_bit_at, read_le_u16_at, read_u8_at};
use crate::common::limits::SteeringLimits;
use crate::state::{VehicleState, VEHICLE_SPEED_FACTOR};

/// Wheel speed counts to km/h
const WHEEL_SPEED_SCALE: f32 = 0.0075;
const KPH_TO_MPS: f32 = 1.0 / 3.6;

/// Yaw rate counts to deg/s
const YAW_RATE_SCALE: f32 = 0.01;
/// Speed floor for the curvature estimate, m/s
const MIN_CURVATURE_SPEED: f32 = 0.1;

/// Accelerator pedal reads this value at rest
const GAS_PEDAL_OFFSET: i32 = 37;

const ESP_01_WHEEL_FL: usize = 8;
const ESP_01_WHEEL_FR: usize = 10;
const ESP_01_WHEEL_RL: usize = 12;
const ESP_01_WHEEL_RR: usize = 14;
const ESP_05_HOLD_BIT: usize = 35;
const ESP_04_YAW_LO: usize = 5;
const ESP_04_YAW_HI: usize = 6;
const ESP_04_YAW_SIGN_BIT: usize = 54;
const MOTOR_14_BRAKE_BIT: usize = 28;
const ESP_03_GAS_BYTE: usize = 21;

pub(super) fn update_wheel_speeds(data: &[u8], state: &mut VehicleState) {
    let corners = [
        read_le_u16_at(data, ESP_01_WHEEL_FL),
        read_le_u16_at(data, ESP_01_WHEEL_FR),
        read_le_u16_at(data, ESP_01_WHEEL_RL),
        read_le_u16_at(data, ESP_01_WHEEL_RR),
    ];
    state.vehicle_moving = corners.iter().any(|&speed| speed > 0);

    let average = corners.iter().map(|&speed| u32::from(speed)).sum::<u32>() / 4;
    let speed_mps = average as f32 * WHEEL_SPEED_SCALE * KPH_TO_MPS;
    state.vehicle_speed.update((speed_mps * VEHICLE_SPEED_FACTOR).round() as i32);
}

pub(super) fn update_esp_hold(data: &[u8], state: &mut VehicleState) {
    state.esp_hold_confirmation = read_bit_at(data, ESP_05_HOLD_BIT);
}

/// Yaw rate in deg/s, positive to the left
pub(super) fn decode_yaw_rate(data: &[u8]) -> f32 {
    let magnitude = u16::from(read_u8_at(data, ESP_04_YAW_LO))
        | (u16::from(read_u8_at(data, ESP_04_YAW_HI) & 0x3F) << 8);
    let yaw_rate = f32::from(magnitude) * YAW_RATE_SCALE;
    if read_bit_at(data, ESP_04_YAW_SIGN_BIT) {
        -yaw_rate
    } else {
        yaw_rate
    }
}

/// Measured curvature (deg/m) from yaw rate over speed, pushed in wire units
pub(super) fn update_yaw_rate(data: &[u8], state: &mut VehicleState, limits: &SteeringLimits) {
    let speed =
        (state.vehicle_speed.latest() as f32 / VEHICLE_SPEED_FACTOR).max(MIN_CURVATURE_SPEED);
    let curvature = decode_yaw_rate(data) / speed;
    state.angle_meas.update(limits.to_can(curvature));
}

pub(super) fn update_brake(data: &[u8], state: &mut VehicleState) {
    state.brake_pressed = read_bit_at(data, MOTOR_14_BRAKE_BIT);
}

pub(super) fn update_gas(data: &[u8], state: &mut VehicleState) {
    let pedal = i32::from(read_u8_at(data, ESP_03_GAS_BYTE)) - GAS_PEDAL_OFFSET;
    state.gas_pressed = pedal != 0;
}
