use super::{
    BUS_CAM, BUS_MAIN, MSG_HCA_03, MSG_LDW_02, MSG_MEB_ACC_01, MSG_MEB_ACC_02,
    MSG_MEB_TRAVEL_ASSIST_01,
};
use crate::frame::Bus;

/// Route a frame between the vehicle and camera buses.
///
/// The stack replaces the camera's steering and lane-warning messages, and in
/// longitudinal mode the radar's ACC and Travel Assist messages, so those are
/// never passed on to the vehicle.
pub(super) fn forward(bus: Bus, addr: u32, longitudinal: bool) -> Option<Bus> {
    match bus {
        BUS_MAIN => Some(BUS_CAM),
        BUS_CAM => {
            let lateral = matches!(addr, MSG_HCA_03 | MSG_LDW_02);
            let long = longitudinal
                && matches!(addr, MSG_MEB_ACC_01 | MSG_MEB_ACC_02 | MSG_MEB_TRAVEL_ASSIST_01);
            if lateral || long {
                None
            } else {
                Some(BUS_MAIN)
            }
        }
        _ => None,
    }
}
