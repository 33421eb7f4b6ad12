//! Actuation limits and the generic checks evaluated against them.

use crate::common::sample::SampleWindow;
use crate::common::validation::validate_lookup_table;
use crate::SafetyResult;

/// Piecewise-linear lookup, `x` breakpoints strictly increasing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTable {
    pub x: &'static [f32],
    pub y: &'static [f32],
}

impl LookupTable {
    /// Linear interpolation, clamped to the first and last points.
    pub fn interpolate(&self, x: f32) -> f32 {
        let (Some(&x_first), Some(&y_first), Some(&y_last)) =
            (self.x.first(), self.y.first(), self.y.last())
        else {
            return 0.0;
        };
        if x <= x_first {
            return y_first;
        }
        for (xs, ys) in self.x.windows(2).zip(self.y.windows(2)) {
            let (x0, x1, y0, y1) = (xs[0], xs[1], ys[0], ys[1]);
            if x < x1 {
                return (y1 - y0) * (x - x0) / (x1 - x0) + y0;
            }
        }
        y_last
    }
}

/// Curvature-command limits in the protocol's wire units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringLimits {
    /// Largest commandable curvature magnitude, wire units
    pub max_steer: i32,
    /// Physical curvature (deg/m) to wire units
    pub angle_deg_to_can: f32,
    /// Allowed per-frame step away from zero, indexed by measured curvature (deg/m)
    pub angle_rate_up_lookup: LookupTable,
    /// Allowed per-frame step toward zero, indexed by measured curvature (deg/m)
    pub angle_rate_down_lookup: LookupTable,
    /// Inactive requests must encode exactly zero
    pub inactive_angle_is_zero: bool,
}

impl SteeringLimits {
    pub fn validate(&self) -> SafetyResult<()> {
        validate_lookup_table("angle_rate_up_lookup", &self.angle_rate_up_lookup)?;
        validate_lookup_table("angle_rate_down_lookup", &self.angle_rate_down_lookup)?;
        if self.max_steer <= 0 || !(self.angle_deg_to_can > 0.0) {
            return Err(crate::SafetyError::InvalidConfiguration(
                "Steering limits must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Convert a physical curvature to wire units, rounding half away from zero
    pub fn to_can(&self, curvature: f32) -> i32 {
        (curvature * self.angle_deg_to_can).round() as i32
    }

    /// Inclusive `(lowest, highest)` request allowed after `last`.
    ///
    /// Moving away from zero uses the up table, moving toward zero the down
    /// table. At `last == 0` both directions use the down table. One wire
    /// unit of slack absorbs the rounding of the upstream controller.
    pub fn rate_window(&self, last: i32, measured_curvature: f32) -> (i32, i32) {
        let delta = |table: &LookupTable| {
            (table.interpolate(measured_curvature) * self.angle_deg_to_can + 1.0) as i32
        };
        let delta_up = delta(&self.angle_rate_up_lookup);
        let delta_down = delta(&self.angle_rate_down_lookup);

        let highest = last.saturating_add(if last > 0 { delta_up } else { delta_down });
        let lowest = last.saturating_sub(if last >= 0 { delta_down } else { delta_up });
        (lowest, highest)
    }
}

/// Acceleration limits in m/s^2 * 1000
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongitudinalLimits {
    pub max_accel: i32,
    pub min_accel: i32,
    /// Value sent when no acceleration is requested
    pub inactive_accel: i32,
}

impl LongitudinalLimits {
    pub fn validate(&self) -> SafetyResult<()> {
        if self.min_accel >= self.max_accel {
            return Err(crate::SafetyError::InvalidConfiguration(
                "min_accel must be below max_accel".into(),
            ));
        }
        Ok(())
    }
}

/// True when `value` lies outside `[min, max]`
pub fn max_limit_check(value: i32, max: i32, min: i32) -> bool {
    value > max || value < min
}

/// Inputs of one curvature-command evaluation
#[derive(Debug, Clone, Copy)]
pub struct SteerCommand {
    pub desired: i32,
    pub steer_req: bool,
}

/// Generic curvature-command validity check. Returns `true` on violation.
///
/// Rate limits apply only while steering is authorized and requested. The
/// tables are indexed by the most recent measured curvature magnitude.
/// `desired_last` is updated on every call.
pub fn steer_angle_cmd_checks(
    cmd: SteerCommand,
    desired_last: &mut i32,
    controls_allowed: bool,
    angle_meas: &SampleWindow,
    limits: &SteeringLimits,
) -> bool {
    let mut violation = false;

    if controls_allowed && cmd.steer_req {
        let measured = angle_meas.latest().unsigned_abs() as f32 / limits.angle_deg_to_can;
        let (lowest, highest) = limits.rate_window(*desired_last, measured);
        violation |= max_limit_check(cmd.desired, highest, lowest);
    }
    *desired_last = cmd.desired;

    if !cmd.steer_req {
        violation |= if limits.inactive_angle_is_zero {
            cmd.desired != 0
        } else {
            max_limit_check(cmd.desired, angle_meas.max() + 1, angle_meas.min() - 1)
        };
    }

    violation |= !controls_allowed && cmd.steer_req;

    violation
}
