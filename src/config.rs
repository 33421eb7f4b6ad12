//! Runtime configuration of the gateway.

use crate::{SafetyError, SafetyResult};

/// Safety-param bit selecting stack-owned longitudinal control
pub const FLAG_LONG_CONTROL: u16 = 1;

/// Selects the active transmit allowlist and the mode-dependent branches of
/// the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GatewayConfig {
    /// The stack commands acceleration itself instead of passing stock ACC through
    pub longitudinal: bool,
    /// Leave authorization on a rising edge of the accelerator pedal
    pub disengage_on_gas: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            longitudinal: false,
            disengage_on_gas: true,
        }
    }
}

impl GatewayConfig {
    /// Decode the host's 16-bit safety param.
    ///
    /// # Errors
    /// Returns `SafetyError::InvalidConfiguration` if an unknown flag is set.
    pub fn from_param(param: u16) -> SafetyResult<Self> {
        let unknown = param & !FLAG_LONG_CONTROL;
        if unknown != 0 {
            return Err(SafetyError::InvalidConfiguration(format!(
                "Unknown safety param flags: {:#06x}",
                unknown
            )));
        }
        Ok(Self {
            longitudinal: param & FLAG_LONG_CONTROL != 0,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_param() {
        assert!(!GatewayConfig::from_param(0).unwrap().longitudinal);
        assert!(GatewayConfig::from_param(FLAG_LONG_CONTROL).unwrap().longitudinal);
        assert!(GatewayConfig::from_param(0x0100).is_err());
    }

    #[test]
    fn test_default_is_stock_longitudinal() {
        let config = GatewayConfig::default();
        assert!(!config.longitudinal);
        assert!(config.disengage_on_gas);
    }
}
