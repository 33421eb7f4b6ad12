mod common;

use can_safety_gateway::volkswagen_meb::{
    LONG_LIMITS, MSG_GRA_ACC_01, MSG_HCA_03, MSG_LDW_02, MSG_MEB_ACC_01, MSG_MEB_ESP_04,
    MSG_MOTOR_14,
};
use can_safety_gateway::{CanFrame, RxStatus};
use common::*;

#[test]
fn test_stock_engagement_follows_cruise() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();

    assert!(!gateway.tx(&hca(100, true, 50)));

    engage_stock(&mut vehicle, &mut gateway);
    assert!(gateway.tx(&hca(100, true, 50)));

    vehicle.tsk_status(&mut gateway, 2);
    assert!(!gateway.state().controls_allowed());
    assert!(gateway.state().acc_main_on());
}

#[test]
fn test_tsk_status_cycle() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    let mut main_on = Vec::new();
    let mut engaged = Vec::new();

    for status in [0, 2, 3, 0] {
        assert_eq!(vehicle.tsk_status(&mut gateway, status), RxStatus::Ok);
        main_on.push(gateway.state().acc_main_on());
        engaged.push(gateway.state().cruise_engaged());
    }

    assert_eq!(main_on, [false, true, true, false]);
    assert_eq!(engaged, [false, false, true, false]);
}

#[test]
fn test_corrupted_frame_is_not_applied() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    engage_stock(&mut vehicle, &mut gateway);

    let mut data = vec![0u8; 8];
    set_bit(&mut data, 28);
    let frame = vehicle.frame(MSG_MOTOR_14, data);
    let mut payload = frame.payload().to_vec();
    payload[5] ^= 0x01;
    let corrupted = CanFrame::new(0, MSG_MOTOR_14, &payload).unwrap();

    assert_eq!(gateway.rx(&corrupted, 0), RxStatus::ChecksumError);
    assert!(!gateway.state().brake_pressed());
    // Integrity failures leave controls
    assert!(!gateway.state().controls_allowed());
}

#[test]
fn test_sequence_survives_corrupted_frame() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    assert_eq!(vehicle.brake(&mut gateway, false), RxStatus::Ok);

    let frame = vehicle.frame(MSG_MOTOR_14, vec![0u8; 8]);
    let mut payload = frame.payload().to_vec();
    payload[5] ^= 0x01;
    let corrupted = CanFrame::new(0, MSG_MOTOR_14, &payload).unwrap();
    assert_eq!(gateway.rx(&corrupted, 0), RxStatus::ChecksumError);

    // The next genuine frame is in sequence with the corrupted one
    assert_eq!(vehicle.brake(&mut gateway, true), RxStatus::Ok);
    assert!(gateway.state().brake_pressed());
}

#[test]
fn test_counter_must_advance_by_one() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();

    assert_eq!(vehicle.brake(&mut gateway, false), RxStatus::Ok);

    // Replaying the same frame is rejected
    let frame = vehicle.frame(MSG_MOTOR_14, vec![0u8; 8]);
    assert_eq!(gateway.rx(&frame, 0), RxStatus::Ok);
    assert_eq!(gateway.rx(&frame, 0), RxStatus::Repeated);

    // Skipping a counter value is rejected and the frame is not applied
    vehicle.frame(MSG_MOTOR_14, vec![0u8; 8]);
    assert_eq!(vehicle.brake(&mut gateway, true), RxStatus::WrongSequence);
    assert!(!gateway.state().brake_pressed());

    // The sequence resynchronizes on the next frame
    assert_eq!(vehicle.brake(&mut gateway, true), RxStatus::Ok);
    assert!(gateway.state().brake_pressed());
}

#[test]
fn test_wrong_length_rejected() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    let frame = vehicle.frame(MSG_MOTOR_14, vec![0u8; 16]);
    assert_eq!(gateway.rx(&frame, 0), RxStatus::LengthError);
}

#[test]
fn test_frames_from_camera_bus_do_not_update_state() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    let frame = vehicle.frame(MSG_MOTOR_14, {
        let mut data = vec![0u8; 8];
        set_bit(&mut data, 28);
        data
    });
    let camera = CanFrame::new(2, MSG_MOTOR_14, frame.payload()).unwrap();
    assert_eq!(gateway.rx(&camera, 0), RxStatus::Unmonitored);
    assert!(!gateway.state().brake_pressed());
}

#[test]
fn test_wheel_speeds() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();

    vehicle.wheel_speeds(&mut gateway, [0, 0, 0, 0]);
    assert!(!gateway.state().vehicle_moving());
    assert_eq!(gateway.state().speed_samples().latest(), 0);

    vehicle.wheel_speeds(&mut gateway, [0, 0, 7, 0]);
    assert!(gateway.state().vehicle_moving());
}

#[test]
fn test_brake_while_moving_disengages() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    vehicle.wheel_speeds(&mut gateway, [1000, 1000, 1000, 1000]);
    engage_stock(&mut vehicle, &mut gateway);

    vehicle.brake(&mut gateway, true);
    assert!(!gateway.state().controls_allowed());
}

#[test]
fn test_gas_press_disengages_steering() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    vehicle.gas(&mut gateway, false);
    engage_stock(&mut vehicle, &mut gateway);

    vehicle.gas(&mut gateway, true);
    assert!(!gateway.state().controls_allowed());
}

#[test]
fn test_measured_curvature_tightens_rate_limit() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    vehicle.wheel_speeds(&mut gateway, [4800, 4800, 4800, 4800]); // 10 m/s
    engage_stock(&mut vehicle, &mut gateway);

    // Straight road: a step of 800 wire units is within 0.3 deg/m per frame
    assert!(gateway.tx(&hca(800, true, 50)));
    assert!(gateway.tx(&hca(0, true, 50)));

    // 100 deg/s at 10 m/s is 10 deg/m of measured curvature
    let mut data = vec![0u8; 48];
    data[5] = 0x10;
    data[6] = 0x27; // 10000 counts
    vehicle.send(&mut gateway, MSG_MEB_ESP_04, data);
    assert!(gateway.state().curvature_samples().max_abs() > 27_000);

    // The same 800 unit step is now too fast; a 300 unit step still fits
    assert!(gateway.tx(&hca(300, true, 50)));
    assert!(!gateway.tx(&hca(1100, true, 50)));
}

#[test]
fn test_rate_limit_relaxes_when_leaving_curve() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    vehicle.wheel_speeds(&mut gateway, [4800, 4800, 4800, 4800]); // 10 m/s
    engage_stock(&mut vehicle, &mut gateway);

    let mut curve = vec![0u8; 48];
    curve[5] = 0x10;
    curve[6] = 0x27; // 10 deg/m
    vehicle.send(&mut gateway, MSG_MEB_ESP_04, curve);
    vehicle.send(&mut gateway, MSG_MEB_ESP_04, vec![0u8; 48]);

    let samples = gateway.state().curvature_samples();
    assert_eq!(samples.latest(), 0);
    assert!(samples.max_abs() > 27_000);

    // Straight-road window applies again right away
    assert!(gateway.tx(&hca(800, true, 50)));
}

#[test]
fn test_steering_power_decays_after_disengage() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    engage_stock(&mut vehicle, &mut gateway);
    assert!(gateway.tx(&hca(200, true, 100)));

    vehicle.tsk_status(&mut gateway, 0);
    assert!(!gateway.state().controls_allowed());

    for power in [90, 60, 30, 1] {
        assert!(gateway.tx(&hca(200, true, power)), "power {}", power);
    }
    assert!(!gateway.tx(&hca(200, true, 1)));
    assert!(!gateway.tx(&hca(0, false, 1)));
    assert!(gateway.tx(&hca(0, false, 0)));
    assert_eq!(gateway.profile().steer_power_prev(), 0);
}

#[test]
fn test_relay_malfunction_blocks_everything() {
    let mut gateway = stock_gateway();
    let stock_hca = CanFrame::new(0, MSG_HCA_03, &[0u8; 24]).unwrap();
    gateway.rx(&stock_hca, 0);
    assert!(gateway.state().relay_malfunction());
    assert!(!gateway.tx(&hca(0, false, 0)));
}

#[test]
fn test_long_engagement_and_acceleration() {
    let mut vehicle = Vehicle::new();
    let mut gateway = long_gateway();
    vehicle.gas(&mut gateway, false);

    // Stock cruise engagement does not authorize in long mode
    vehicle.tsk_status(&mut gateway, 3);
    assert!(!gateway.state().controls_allowed());
    assert!(!gateway.tx(&acc_02(1.0)));

    engage_long(&mut vehicle, &mut gateway);
    assert!(gateway.tx(&acc_02(1.0)));
    assert!(gateway.tx(&acc_02(-3.5)));
    assert!(!gateway.tx(&acc_02(2.5)));
    assert!(!gateway.tx(&acc_02(-4.0)));

    vehicle.buttons(&mut gateway, &[GRA_CANCEL_BIT]);
    assert!(gateway.state().controls_allowed());
    assert!(!gateway.state().controls_allowed_long());
    assert!(!gateway.tx(&acc_02(1.0)));
}

#[test]
fn test_resume_release_requires_main_switch() {
    let mut vehicle = Vehicle::new();
    let mut gateway = long_gateway();
    vehicle.tsk_status(&mut gateway, 0);
    vehicle.buttons(&mut gateway, &[GRA_RESUME_BIT]);
    vehicle.buttons(&mut gateway, &[]);
    assert!(!gateway.state().controls_allowed());
}

#[test]
fn test_main_switch_off_clears_long_authorization() {
    let mut vehicle = Vehicle::new();
    let mut gateway = long_gateway();
    engage_long(&mut vehicle, &mut gateway);

    vehicle.tsk_status(&mut gateway, 0);
    assert!(!gateway.state().controls_allowed());
    assert!(!gateway.state().controls_allowed_long());
}

#[test]
fn test_gas_override_sentinel() {
    let mut vehicle = Vehicle::new();
    let config = can_safety_gateway::GatewayConfig {
        longitudinal: true,
        disengage_on_gas: false,
    };
    let mut gateway = can_safety_gateway::Gateway::new(config).unwrap();
    engage_long(&mut vehicle, &mut gateway);

    vehicle.gas(&mut gateway, true);
    assert!(gateway.state().controls_allowed());
    assert!(!gateway.tx(&acc_02(1.0)));
    assert!(gateway.tx(&acc_02(0.0)));
}

#[test]
fn test_inactive_acceleration_always_passes() {
    let raw = ((LONG_LIMITS.inactive_accel + 7220) / 5) as u16;
    let mut gateway = long_gateway();
    assert!(gateway.tx(&acc_02_raw(raw)));

    let mut vehicle = Vehicle::new();
    engage_long(&mut vehicle, &mut gateway);
    assert!(gateway.tx(&acc_02_raw(raw)));
}

#[test]
fn test_button_spoofing_rules() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();

    assert!(!gateway.tx(&gra(0, &[GRA_CANCEL_BIT])));
    assert!(!gateway.tx(&gra(2, &[GRA_RESUME_BIT])));

    engage_stock(&mut vehicle, &mut gateway);
    assert!(gateway.tx(&gra(0, &[GRA_CANCEL_BIT])));
    assert!(gateway.tx(&gra(2, &[GRA_CANCEL_BIT])));
    // Stock mode never holds longitudinal authorization
    assert!(!gateway.tx(&gra(0, &[GRA_RESUME_BIT])));
}

#[test]
fn test_allowlist_depends_on_mode() {
    let mut stock = stock_gateway();
    let mut long = long_gateway();
    let acc_01 = CanFrame::new(0, MSG_MEB_ACC_01, &[0u8; 48]).unwrap();
    let ldw = CanFrame::new(0, MSG_LDW_02, &[0u8; 8]).unwrap();
    let gra_frame = CanFrame::new(0, MSG_GRA_ACC_01, &[0u8; 8]).unwrap();

    assert!(!stock.config().longitudinal);
    assert!(!stock.profile().longitudinal());
    assert!(long.config().longitudinal);
    assert!(long.profile().longitudinal());

    assert!(!stock.tx(&acc_01));
    assert!(long.tx(&acc_01));
    assert!(stock.tx(&ldw));
    assert!(long.tx(&ldw));
    // Not on the long-mode allowlist even with a cancel bit
    let mut cancel = [0u8; 8];
    set_bit(&mut cancel, GRA_CANCEL_BIT);
    assert!(!long.tx(&CanFrame::new(0, MSG_GRA_ACC_01, &cancel).unwrap()));
    assert!(!long.tx(&gra_frame));
}

#[test]
fn test_forwarding() {
    let stock = stock_gateway();
    let long = long_gateway();
    assert_eq!(stock.fwd(0, MSG_HCA_03), Some(2));
    assert_eq!(stock.fwd(2, MSG_HCA_03), None);
    assert_eq!(stock.fwd(2, MSG_LDW_02), None);
    assert_eq!(stock.fwd(2, MSG_MEB_ACC_01), Some(0));
    assert_eq!(long.fwd(2, MSG_MEB_ACC_01), None);
    assert_eq!(long.fwd(1, MSG_MEB_ACC_01), None);
}

#[test]
fn test_stale_messages_leave_controls() {
    let mut vehicle = Vehicle::new();
    let mut gateway = stock_gateway();
    vehicle.all_monitored(&mut gateway);
    engage_stock(&mut vehicle, &mut gateway);

    gateway.tick(500_000);
    assert!(!gateway.rx_checks_invalid());
    assert!(gateway.state().controls_allowed());

    gateway.tick(2_000_000);
    assert!(gateway.rx_checks_invalid());
    assert!(!gateway.state().controls_allowed());
    let integrity = gateway.integrity(0, MSG_MOTOR_14).unwrap();
    assert!(integrity.lagging);
}
