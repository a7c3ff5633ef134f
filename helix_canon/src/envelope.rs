//! Kinematic envelope derivation.
//!
//! For a straight move the envelope is, per quantity (velocity,
//! acceleration, jerk), the minimum of the limits of every axis that
//! actually moves; a stationary axis contributes a `1e9` sentinel.
//! Linear axes (X/Y/Z/U/V/W) fold in length units, rotary axes (A/B/C) in
//! angle units, and a combined move takes the minimum of the two folds.
//! This is deliberately conservative.
//!
//! Classification side effects (cartesian/angular flags) are returned to
//! the caller, which installs them on the canonical state; later unit
//! conversion of velocities depends on them.

use helix_common::axis::{ANGULAR_AXES, LINEAR_AXES};
use helix_common::config::MachineLimits;
use helix_common::consts::{AXIS_COUNT, STATIONARY, TINY};
use helix_common::pose::Pose;
use tracing::trace;

use crate::state::CanonState;
use crate::xform::{from_ext_ang, from_ext_len};

/// What a proposed move touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Only linear axes move.
    Linear,
    /// Only rotary axes move.
    Angular,
    /// Both linear and rotary axes move.
    Combined,
    /// Nothing moves (below threshold or masked out).
    Degenerate,
}

/// Envelope of a proposed straight move, in internal units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightEnvelope {
    /// Per-axis absolute travel, zeroed for masked or sub-threshold axes.
    pub deltas: [f64; AXIS_COUNT],
    /// Whether any linear axis moves.
    pub cartesian: bool,
    /// Whether any rotary axis moves.
    pub angular: bool,
    /// Largest velocity no moving axis exceeds. For a degenerate move this
    /// is the linear feed rate: the intended price of going nowhere.
    pub max_velocity: f64,
    /// Largest acceleration no moving axis exceeds; zero when degenerate.
    pub max_acceleration: f64,
    /// Largest jerk no moving axis exceeds; zero when degenerate.
    pub max_jerk: f64,
}

impl StraightEnvelope {
    #[inline]
    pub fn kind(&self) -> MoveKind {
        match (self.cartesian, self.angular) {
            (true, false) => MoveKind::Linear,
            (false, true) => MoveKind::Angular,
            (true, true) => MoveKind::Combined,
            (false, false) => MoveKind::Degenerate,
        }
    }
}

/// Per-axis travel from the current end point, with masked and
/// sub-threshold axes zeroed.
pub fn masked_deltas(from: &Pose, to: &Pose, limits: &MachineLimits) -> [f64; AXIS_COUNT] {
    let mut deltas = from.abs_deltas(to);
    for (axis, delta) in deltas.iter_mut().enumerate() {
        if !limits.axis_mask.has_axis(axis) || *delta < TINY {
            *delta = 0.0;
        }
    }
    deltas
}

#[inline]
fn fold_min(deltas: &[f64; AXIS_COUNT], values: &[f64; AXIS_COUNT], axes: &[usize]) -> f64 {
    axes.iter().fold(STATIONARY, |acc, &axis| {
        if deltas[axis] > 0.0 {
            acc.min(values[axis])
        } else {
            acc
        }
    })
}

/// Min-of-maxima for one kinematic quantity given the move classification.
/// `values` are per-axis limits in external units; the result is internal.
fn envelope_quantity(
    deltas: &[f64; AXIS_COUNT],
    values: &[f64; AXIS_COUNT],
    cartesian: bool,
    angular: bool,
    limits: &MachineLimits,
    what: &str,
) -> f64 {
    let result = match (cartesian, angular) {
        (true, false) => from_ext_len(
            fold_min(deltas, values, &LINEAR_AXES),
            limits.external_length_units,
        ),
        (false, true) => from_ext_ang(
            fold_min(deltas, values, &ANGULAR_AXES),
            limits.external_angle_units,
        ),
        (true, true) => {
            let linear = from_ext_len(
                fold_min(deltas, values, &LINEAR_AXES),
                limits.external_length_units,
            );
            let rotary = from_ext_ang(
                fold_min(deltas, values, &ANGULAR_AXES),
                limits.external_angle_units,
            );
            linear.min(rotary)
        }
        (false, false) => return 0.0,
    };
    assert!(
        result > 0.0,
        "straight {what} envelope must be positive when an axis moves"
    );
    result
}

/// Derive the full envelope of a straight move from the current end point
/// to `target` (both internal units).
pub fn straight_envelope(
    target: &Pose,
    state: &CanonState,
    limits: &MachineLimits,
) -> StraightEnvelope {
    let deltas = masked_deltas(&state.end_point, target, limits);

    let cartesian = LINEAR_AXES.iter().any(|&axis| deltas[axis] > 0.0);
    let angular = ANGULAR_AXES.iter().any(|&axis| deltas[axis] > 0.0);

    trace!(
        dx = deltas[0],
        dy = deltas[1],
        dz = deltas[2],
        da = deltas[3],
        db = deltas[4],
        dc = deltas[5],
        du = deltas[6],
        dv = deltas[7],
        dw = deltas[8],
        cartesian,
        angular,
        "straight envelope deltas"
    );

    let max_velocity = if !cartesian && !angular {
        // A move to nowhere is priced at the linear feed rate.
        state.linear_feed_rate
    } else {
        envelope_quantity(
            &deltas,
            &limits.max_velocity,
            cartesian,
            angular,
            limits,
            "velocity",
        )
    };
    let max_acceleration = envelope_quantity(
        &deltas,
        &limits.max_acceleration,
        cartesian,
        angular,
        limits,
        "acceleration",
    );
    let max_jerk = envelope_quantity(
        &deltas,
        &limits.max_jerk,
        cartesian,
        angular,
        limits,
        "jerk",
    );

    StraightEnvelope {
        deltas,
        cartesian,
        angular,
        max_velocity,
        max_acceleration,
        max_jerk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_common::config::MachineLimits;

    fn limits() -> MachineLimits {
        MachineLimits::three_axis(100.0, 1000.0, 10000.0)
    }

    fn state() -> CanonState {
        CanonState {
            linear_feed_rate: 10.0,
            angular_feed_rate: 30.0,
            ..CanonState::new()
        }
    }

    #[test]
    fn pure_linear_move() {
        let env = straight_envelope(
            &Pose::new(10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            &state(),
            &limits(),
        );
        assert_eq!(env.kind(), MoveKind::Linear);
        assert_eq!(env.max_velocity, 100.0);
        assert_eq!(env.max_acceleration, 1000.0);
        assert_eq!(env.max_jerk, 10000.0);
    }

    #[test]
    fn slowest_moving_axis_wins() {
        let mut lim = limits();
        lim.max_velocity[1] = 40.0;
        // Y does not move: its lower limit must not constrain the move.
        let env = straight_envelope(
            &Pose::new(10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            &state(),
            &lim,
        );
        assert_eq!(env.max_velocity, 100.0);
        // Y moves: 40 wins.
        let env = straight_envelope(
            &Pose::new(10.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            &state(),
            &lim,
        );
        assert_eq!(env.max_velocity, 40.0);
    }

    #[test]
    fn masked_axis_is_ignored() {
        // W is not in the XYZ mask; motion there contributes nothing.
        let env = straight_envelope(
            &Pose::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 7.0),
            &state(),
            &limits(),
        );
        assert_eq!(env.kind(), MoveKind::Degenerate);
        assert_eq!(env.max_velocity, 10.0); // linear feed rate
        assert_eq!(env.max_acceleration, 0.0);
    }

    #[test]
    fn sub_threshold_delta_is_no_motion() {
        let env = straight_envelope(
            &Pose::new(1e-9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            &state(),
            &limits(),
        );
        assert_eq!(env.kind(), MoveKind::Degenerate);
    }

    #[test]
    fn pure_angular_move_uses_angle_units() {
        let lim = limits().with_axis(3, 360.0, 3600.0, 36000.0);
        let env = straight_envelope(
            &Pose::new(0.0, 0.0, 0.0, 90.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            &state(),
            &lim,
        );
        assert_eq!(env.kind(), MoveKind::Angular);
        assert_eq!(env.max_velocity, 360.0);
    }

    #[test]
    fn combined_move_takes_conservative_min() {
        let lim = limits().with_axis(3, 60.0, 600.0, 6000.0);
        let env = straight_envelope(
            &Pose::new(10.0, 0.0, 0.0, 90.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            &state(),
            &lim,
        );
        assert_eq!(env.kind(), MoveKind::Combined);
        assert_eq!(env.max_velocity, 60.0);
        assert_eq!(env.max_acceleration, 600.0);
    }

    #[test]
    fn external_units_are_unscaled_on_the_way_in() {
        let mut lim = limits();
        // An inch machine: limits are expressed in inches.
        lim.external_length_units = 1.0 / 25.4;
        for v in lim.max_velocity.iter_mut() {
            *v = 4.0; // 4 in/s
        }
        let env = straight_envelope(
            &Pose::new(10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            &state(),
            &lim,
        );
        assert!((env.max_velocity - 4.0 * 25.4).abs() < 1e-9);
    }

    #[test]
    fn envelope_monotone_in_limits() {
        let target = Pose::new(10.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let base = straight_envelope(&target, &state(), &limits());
        for axis in 0..3 {
            let mut lim = limits();
            lim.max_velocity[axis] *= 0.5;
            let tightened = straight_envelope(&target, &state(), &lim);
            assert!(tightened.max_velocity <= base.max_velocity);
        }
    }

    #[test]
    #[should_panic(expected = "envelope must be positive")]
    fn zero_limit_on_moving_axis_is_a_bug() {
        let mut lim = limits();
        lim.max_velocity[0] = 0.0;
        straight_envelope(
            &Pose::new(10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            &state(),
            &lim,
        );
    }
}
