use crate::RxStatus;

/// Distance from `current` to `received`, modulo `max_counter + 1`
pub fn check_counter_delta(current: u8, received: u8, max_counter: u8) -> u8 {
    let modulo = u16::from(max_counter) + 1;
    let delta = (modulo + u16::from(received) - u16::from(current) % modulo) % modulo;
    delta as u8
}

/// Sequence check for a rolling counter that must advance by exactly one.
///
/// `last` is `None` until a first frame for the address has been seen;
/// that first frame always passes. Counters above `max_counter` never pass.
pub fn validate_counter(last: Option<u8>, received: u8, max_counter: u8) -> RxStatus {
    if received > max_counter {
        return RxStatus::WrongSequence;
    }
    let Some(current) = last else {
        return RxStatus::Ok;
    };

    match check_counter_delta(current, received, max_counter) {
        0 => RxStatus::Repeated,
        1 => RxStatus::Ok,
        _ => RxStatus::WrongSequence,
    }
}
