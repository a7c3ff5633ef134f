//! Unit conversions and coordinate transforms.
//!
//! Three unit systems meet here and nowhere else:
//!
//! - **program units** — whatever the part program is written in
//!   (inch/mm/cm lengths, degrees)
//! - **internal units** — mm and degrees, the canonical frame every state
//!   field lives in
//! - **external units** — the executor's units, scaled by the configured
//!   `external_length_units` / `external_angle_units`
//!
//! Every dispatch converts program → internal on entry and internal →
//! external when building a message.

use helix_common::canon::LengthUnits;
use helix_common::pose::Pose;

use crate::state::CanonState;

/// Program length → internal mm.
#[inline]
pub fn from_prog_len(value: f64, units: LengthUnits) -> f64 {
    value * units.mm_per_unit()
}

/// Internal mm → program length.
#[inline]
pub fn to_prog_len(value: f64, units: LengthUnits) -> f64 {
    value / units.mm_per_unit()
}

/// Program pose → internal pose (angles pass through).
pub fn from_prog(pose: Pose, units: LengthUnits) -> Pose {
    let scale = units.mm_per_unit();
    pose.map(|axis, v| {
        if helix_common::axis::is_linear_axis(axis) {
            v * scale
        } else {
            v
        }
    })
}

/// Internal pose → program pose.
pub fn to_prog(pose: Pose, units: LengthUnits) -> Pose {
    let scale = units.mm_per_unit();
    pose.map(|axis, v| {
        if helix_common::axis::is_linear_axis(axis) {
            v / scale
        } else {
            v
        }
    })
}

/// Internal pose → external pose.
pub fn to_ext(pose: Pose, length_units: f64, angle_units: f64) -> Pose {
    pose.map(|axis, v| {
        if helix_common::axis::is_linear_axis(axis) {
            v * length_units
        } else {
            v * angle_units
        }
    })
}

/// External pose → internal pose.
pub fn from_ext(pose: Pose, length_units: f64, angle_units: f64) -> Pose {
    pose.map(|axis, v| {
        if helix_common::axis::is_linear_axis(axis) {
            v / length_units
        } else {
            v / angle_units
        }
    })
}

/// Internal length → external length.
#[inline]
pub fn to_ext_len(value: f64, length_units: f64) -> f64 {
    value * length_units
}

/// Internal angle → external angle.
#[inline]
pub fn to_ext_ang(value: f64, angle_units: f64) -> f64 {
    value * angle_units
}

/// External length → internal length.
#[inline]
pub fn from_ext_len(value: f64, length_units: f64) -> f64 {
    value / length_units
}

/// External angle → internal angle.
#[inline]
pub fn from_ext_ang(value: f64, angle_units: f64) -> f64 {
    value / angle_units
}

/// Planar rotation of `(x, y)` by `theta` degrees about the origin.
#[inline]
pub fn rotate(x: f64, y: f64, theta: f64) -> (f64, f64) {
    let t = theta.to_radians();
    let (sin, cos) = t.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

impl CanonState {
    /// Apply the XY rotation, then add program origin and tool offset.
    /// Input and output are internal units.
    pub fn rotate_and_offset(&self, pose: Pose) -> Pose {
        let (x, y) = rotate(pose.x, pose.y, self.xy_rotation);
        let rotated = Pose { x, y, ..pose };
        rotated.map(|axis, v| v + self.program_origin.coord(axis) + self.tool_offset.coord(axis))
    }

    /// Inverse of [`rotate_and_offset`](Self::rotate_and_offset).
    pub fn unoffset_and_unrotate(&self, pose: Pose) -> Pose {
        let shifted =
            pose.map(|axis, v| v - self.program_origin.coord(axis) - self.tool_offset.coord(axis));
        let (x, y) = rotate(shifted.x, shifted.y, -self.xy_rotation);
        Pose { x, y, ..shifted }
    }
}
