//! Integrity pipeline for monitored inbound messages.
//!
//! Each monitored address is described by an [`RxCheckSpec`]. The checker
//! keeps one [`IntegrityState`] per address and decides, frame by frame,
//! whether the frame may update vehicle state.

use std::collections::BTreeMap;

use crate::common::counter::validate_counter;
use crate::common::crc_ops::SaltTable;
use crate::common::validation::{validate_counter_config, validate_frame_length, validate_frequency};
use crate::frame::{Bus, CanFrame};
use crate::{RxStatus, SafetyError, SafetyProfile, SafetyResult};
use tracing::{debug, warn};

/// Consecutive counter errors tolerated before an address is reported as faulty
pub const MAX_WRONG_COUNTERS: u8 = 5;

/// Missed periods before an address counts as lagging
pub const MAX_MISSED_MSGS: u64 = 10;

/// Lower bound of the staleness window, microseconds
pub const MIN_STALE_WINDOW_US: u64 = 1_000_000;

/// Contract one monitored inbound address must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxCheckSpec {
    pub addr: u32,
    pub bus: Bus,
    /// Frame length in bytes
    pub len: usize,
    pub check_checksum: bool,
    /// Largest counter value before wraparound
    pub max_counter: u8,
    /// Expected arrival rate
    pub frequency_hz: u32,
    /// Checksum salt, one entry per counter value
    pub salts: Option<SaltTable>,
}

impl RxCheckSpec {
    pub fn validate(&self) -> SafetyResult<()> {
        validate_frame_length(self.len)?;
        validate_counter_config(self.max_counter)?;
        validate_frequency(self.frequency_hz)?;
        if self.check_checksum && self.salts.is_none() {
            return Err(SafetyError::InvalidConfiguration(format!(
                "Address {:#05x} checks its checksum but has no salt table",
                self.addr
            )));
        }
        Ok(())
    }

    /// Longest silence tolerated before the address counts as lagging
    pub fn stale_after_us(&self) -> u64 {
        let period_us = 1_000_000 / u64::from(self.frequency_hz.max(1));
        (period_us * MAX_MISSED_MSGS).max(MIN_STALE_WINDOW_US)
    }
}

/// Outbound message the upstream controller may send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxMsg {
    pub addr: u32,
    pub bus: Bus,
    pub len: usize,
}

impl TxMsg {
    pub fn matches(&self, frame: &CanFrame) -> bool {
        self.addr == frame.addr() && self.bus == frame.bus() && self.len == frame.len()
    }
}

/// Per-address integrity bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityState {
    /// Counter of the last frame seen, valid or not
    pub last_counter: Option<u8>,
    /// Consecutive counter errors, saturating at MAX_WRONG_COUNTERS
    pub wrong_counters: u8,
    pub valid_checksum: bool,
    /// Timestamp of the last accepted frame, microseconds
    pub last_valid_us: Option<u64>,
    pub lagging: bool,
}

#[derive(Debug, Clone)]
pub struct RxChecker {
    specs: BTreeMap<(Bus, u32), RxCheckSpec>,
    states: BTreeMap<(Bus, u32), IntegrityState>,
    rx_checks_invalid: bool,
}

impl RxChecker {
    /// Build a checker for the given monitored messages.
    ///
    /// # Errors
    /// Returns `SafetyError::InvalidConfiguration` if a spec is invalid or an
    /// address is registered twice on the same bus.
    pub fn new(specs: &[RxCheckSpec]) -> SafetyResult<Self> {
        let mut by_addr = BTreeMap::new();
        for spec in specs {
            spec.validate()?;
            if by_addr.insert((spec.bus, spec.addr), *spec).is_some() {
                return Err(SafetyError::InvalidConfiguration(format!(
                    "Address {:#05x} registered twice on bus {}",
                    spec.addr, spec.bus
                )));
            }
        }
        let states = by_addr.keys().map(|key| (*key, IntegrityState::default())).collect();
        Ok(Self {
            specs: by_addr,
            states,
            rx_checks_invalid: false,
        })
    }

    pub fn spec(&self, bus: Bus, addr: u32) -> Option<&RxCheckSpec> {
        self.specs.get(&(bus, addr))
    }

    pub fn integrity(&self, bus: Bus, addr: u32) -> Option<&IntegrityState> {
        self.states.get(&(bus, addr))
    }

    /// Any monitored address is lagging or was never seen
    pub fn rx_checks_invalid(&self) -> bool {
        self.rx_checks_invalid
    }

    /// Run length, checksum and counter checks on one inbound frame.
    pub fn check<P: SafetyProfile>(
        &mut self,
        profile: &P,
        frame: &CanFrame,
        now_us: u64,
    ) -> RxStatus {
        let key = (frame.bus(), frame.addr());
        let (Some(spec), Some(integrity)) = (self.specs.get(&key), self.states.get_mut(&key))
        else {
            return RxStatus::Unmonitored;
        };

        if frame.len() != spec.len {
            debug!(
                addr = frame.addr(),
                len = frame.len(),
                expected = spec.len,
                "length mismatch"
            );
            return RxStatus::LengthError;
        }

        integrity.valid_checksum =
            !spec.check_checksum || profile.get_checksum(frame) == profile.compute_checksum(frame);

        // The sequence is tracked even when the checksum fails
        let counter = profile.get_counter(frame);
        let counter_status = validate_counter(integrity.last_counter, counter, spec.max_counter);
        integrity.last_counter = Some(counter);
        if counter_status == RxStatus::Ok {
            integrity.wrong_counters = integrity.wrong_counters.saturating_sub(1);
        } else {
            integrity.wrong_counters = (integrity.wrong_counters + 1).min(MAX_WRONG_COUNTERS);
            debug!(addr = frame.addr(), counter, ?counter_status, "counter out of sequence");
        }

        if !integrity.valid_checksum {
            debug!(addr = frame.addr(), "checksum mismatch");
            return RxStatus::ChecksumError;
        }
        if counter_status == RxStatus::Ok {
            integrity.last_valid_us = Some(now_us);
            integrity.lagging = false;
        }
        counter_status
    }

    /// Re-evaluate staleness of every monitored address.
    ///
    /// Returns `true` when at least one address is lagging or was never seen.
    pub fn tick(&mut self, now_us: u64) -> bool {
        let mut invalid = false;
        for (key, integrity) in self.states.iter_mut() {
            let Some(spec) = self.specs.get(key) else {
                continue;
            };
            let lagging = match integrity.last_valid_us {
                Some(last) => now_us.saturating_sub(last) > spec.stale_after_us(),
                None => true,
            };
            if lagging && !integrity.lagging && integrity.last_valid_us.is_some() {
                warn!(addr = spec.addr, bus = spec.bus, "monitored message lagging");
            }
            integrity.lagging = lagging;
            invalid |= lagging;
        }
        self.rx_checks_invalid = invalid;
        invalid
    }

    /// Any address has accumulated too many counter errors
    pub fn counters_faulty(&self) -> bool {
        self.states.values().any(|state| state.wrong_counters >= MAX_WRONG_COUNTERS)
    }
}
