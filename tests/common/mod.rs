//! Frame builders shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use can_safety_gateway::volkswagen_meb::{
    encode_accel, meb_compute_crc, CurvatureRequest, VolkswagenMeb, MSG_GRA_ACC_01, MSG_HCA_03,
    MSG_MEB_ACC_02, MSG_MEB_ESP_01, MSG_MEB_ESP_03, MSG_MEB_MOTOR_01, MSG_MOTOR_14, RX_CHECKS,
};
use can_safety_gateway::{CanFrame, Gateway, GatewayConfig, RxStatus};

pub const GRA_CANCEL_BIT: usize = 13;
pub const GRA_SET_BIT: usize = 16;
pub const GRA_RESUME_BIT: usize = 19;

pub fn set_bit(data: &mut [u8], bit: usize) {
    data[bit / 8] |= 1 << (bit % 8);
}

/// Plays the vehicle side: numbers and signs every frame it builds
#[derive(Default)]
pub struct Vehicle {
    counters: HashMap<u32, u8>,
    pub now_us: u64,
}

impl Vehicle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next correctly sequenced and checksummed frame on the main bus
    pub fn frame(&mut self, addr: u32, mut payload: Vec<u8>) -> CanFrame {
        let counter = self.counters.entry(addr).or_insert(15);
        *counter = (*counter + 1) % 16;
        payload[1] = (payload[1] & 0xF0) | *counter;
        payload[0] = meb_compute_crc(addr, &payload);
        CanFrame::new(0, addr, &payload).unwrap()
    }

    pub fn send(
        &mut self,
        gateway: &mut Gateway<VolkswagenMeb>,
        addr: u32,
        payload: Vec<u8>,
    ) -> RxStatus {
        let frame = self.frame(addr, payload);
        gateway.rx(&frame, self.now_us)
    }

    pub fn tsk_status(&mut self, gateway: &mut Gateway<VolkswagenMeb>, status: u8) -> RxStatus {
        let mut data = vec![0u8; 32];
        data[11] = status;
        self.send(gateway, MSG_MEB_MOTOR_01, data)
    }

    pub fn buttons(&mut self, gateway: &mut Gateway<VolkswagenMeb>, bits: &[usize]) -> RxStatus {
        let mut data = vec![0u8; 8];
        for &bit in bits {
            set_bit(&mut data, bit);
        }
        self.send(gateway, MSG_GRA_ACC_01, data)
    }

    pub fn wheel_speeds(
        &mut self,
        gateway: &mut Gateway<VolkswagenMeb>,
        corners: [u16; 4],
    ) -> RxStatus {
        let mut data = vec![0u8; 48];
        for (index, speed) in corners.iter().enumerate() {
            let offset = 8 + index * 2;
            data[offset..offset + 2].copy_from_slice(&speed.to_le_bytes());
        }
        self.send(gateway, MSG_MEB_ESP_01, data)
    }

    pub fn brake(&mut self, gateway: &mut Gateway<VolkswagenMeb>, pressed: bool) -> RxStatus {
        let mut data = vec![0u8; 8];
        if pressed {
            set_bit(&mut data, 28);
        }
        self.send(gateway, MSG_MOTOR_14, data)
    }

    pub fn gas(&mut self, gateway: &mut Gateway<VolkswagenMeb>, pressed: bool) -> RxStatus {
        let mut data = vec![0u8; 32];
        data[21] = if pressed { 80 } else { 37 };
        self.send(gateway, MSG_MEB_ESP_03, data)
    }

    /// One idle frame of every monitored message
    pub fn all_monitored(&mut self, gateway: &mut Gateway<VolkswagenMeb>) {
        for spec in RX_CHECKS.iter() {
            let mut data = vec![0u8; spec.len];
            if spec.addr == MSG_MEB_ESP_03 {
                data[21] = 37; // pedal at rest
            }
            let status = self.send(gateway, spec.addr, data);
            assert_eq!(status, RxStatus::Ok, "address {:#05x}", spec.addr);
        }
    }
}

pub fn stock_gateway() -> Gateway<VolkswagenMeb> {
    Gateway::new(GatewayConfig::default()).unwrap()
}

pub fn long_gateway() -> Gateway<VolkswagenMeb> {
    Gateway::new(GatewayConfig {
        longitudinal: true,
        ..Default::default()
    })
    .unwrap()
}

/// Stock mode: cruise engaged by the vehicle
pub fn engage_stock(vehicle: &mut Vehicle, gateway: &mut Gateway<VolkswagenMeb>) {
    vehicle.tsk_status(gateway, 3);
    assert!(gateway.state().controls_allowed());
}

/// Long mode: main switch on, then Set pressed and released
pub fn engage_long(vehicle: &mut Vehicle, gateway: &mut Gateway<VolkswagenMeb>) {
    vehicle.tsk_status(gateway, 2);
    vehicle.buttons(gateway, &[GRA_SET_BIT]);
    vehicle.buttons(gateway, &[]);
    assert!(gateway.state().controls_allowed());
    assert!(gateway.state().controls_allowed_long());
}

pub fn hca(curvature: i32, steer_req: bool, power: u8) -> CanFrame {
    let mut data = [0u8; 24];
    CurvatureRequest {
        curvature,
        steer_req,
        power,
    }
    .encode(&mut data);
    CanFrame::new(0, MSG_HCA_03, &data).unwrap()
}

pub fn acc_02(accel_mps2: f32) -> CanFrame {
    let mut data = [0u8; 32];
    encode_accel(accel_mps2, &mut data);
    CanFrame::new(0, MSG_MEB_ACC_02, &data).unwrap()
}

pub fn acc_02_raw(raw: u16) -> CanFrame {
    let mut data = [0u8; 32];
    let [lo, hi] = raw.to_le_bytes();
    data[3] = lo;
    data[4] = hi & 0x07;
    CanFrame::new(0, MSG_MEB_ACC_02, &data).unwrap()
}

pub fn gra(bus: u8, bits: &[usize]) -> CanFrame {
    let mut data = [0u8; 8];
    for &bit in bits {
        set_bit(&mut data, bit);
    }
    CanFrame::new(bus, MSG_GRA_ACC_01, &data).unwrap()
}
