use crate::common::limits::LookupTable;
use crate::frame::MAX_FRAME_LEN;
use crate::{SafetyError, SafetyResult};

pub fn validate_lookup_table(name: &str, table: &LookupTable) -> SafetyResult<()> {
    if table.x.is_empty() || table.x.len() != table.y.len() {
        return Err(SafetyError::InvalidConfiguration(format!(
            "{}: expected matching non-empty breakpoints and values, got {} and {}",
            name,
            table.x.len(),
            table.y.len()
        )));
    }
    if table.x.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(SafetyError::InvalidConfiguration(format!(
            "{}: breakpoints must be strictly increasing",
            name
        )));
    }
    Ok(())
}

pub fn validate_frame_length(len: usize) -> SafetyResult<()> {
    if len == 0 || len > MAX_FRAME_LEN {
        return Err(SafetyError::InvalidConfiguration(format!(
            "Frame length must be between 1 and {} bytes, got {} bytes",
            MAX_FRAME_LEN, len
        )));
    }
    Ok(())
}

pub fn validate_counter_config(max_counter: u8) -> SafetyResult<()> {
    if max_counter != 15 {
        return Err(SafetyError::InvalidConfiguration(format!(
            "Rolling counters wrap at 16, got max counter {}",
            max_counter
        )));
    }
    Ok(())
}

pub fn validate_frequency(frequency_hz: u32) -> SafetyResult<()> {
    if frequency_hz == 0 || frequency_hz > 1_000_000 {
        return Err(SafetyError::InvalidConfiguration(format!(
            "Expected frequency must be between 1 Hz and 1 MHz, got {} Hz",
            frequency_hz
        )));
    }
    Ok(())
}
