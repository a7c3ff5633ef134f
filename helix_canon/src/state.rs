//! Canonical world state.
//!
//! A single instance lives on the engine. Every field is in internal
//! units (mm, degrees, per-second rates); dispatch converts at the edges.

use helix_common::canon::{FeedMode, LengthUnits, MotionMode, Plane};
use helix_common::pose::Pose;

/// The world state the interpreter mutates through dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonState {
    /// Last commanded end position after rotation and offsets.
    pub end_point: Pose,
    /// Work-coordinate origin.
    pub program_origin: Pose,
    /// Active tool-length offset.
    pub tool_offset: Pose,
    /// Rotation about Z applied to programmed X/Y, degrees.
    pub xy_rotation: f64,
    /// Program-side length unit.
    pub length_units: LengthUnits,
    /// Active arc plane.
    pub active_plane: Plane,
    /// Blend vs. exact-stop at segment ends.
    pub motion_mode: MotionMode,
    /// Blend tolerance surfaced to the executor.
    pub motion_tolerance: f64,
    /// Fusion tolerance; zero disables collinear fusion.
    pub naivecam_tolerance: f64,
    /// Feed interpretation mode; non-zero encodings are synchronized.
    pub feed_mode: FeedMode,
    /// Programmed linear feed, mm/s.
    pub linear_feed_rate: f64,
    /// Programmed angular feed, deg/s.
    pub angular_feed_rate: f64,
    /// Programmed spindle speed, rpm.
    pub spindle_speed: f64,
    /// Constant-surface-speed cap, rpm; zero when CSS is inactive.
    pub css_maximum: f64,
    /// CSS numerator; non-zero iff CSS is active.
    pub css_numerator: f64,
    /// Last move touched a linear axis (set by envelope classification).
    pub cartesian_move: bool,
    /// Last move touched a rotary axis (set by envelope classification).
    pub angular_move: bool,
    /// Spindle-synchronized feed currently armed.
    pub synched: bool,
    /// Skip lines starting with the block-delete character.
    pub block_delete: bool,
    /// Honor optional-stop commands.
    pub optional_program_stop: bool,
}

impl CanonState {
    /// The state canonical init installs. Block delete and optional stop
    /// default on, matching long-standing controller behavior.
    pub fn new() -> Self {
        Self {
            end_point: Pose::ZERO,
            program_origin: Pose::ZERO,
            tool_offset: Pose::ZERO,
            xy_rotation: 0.0,
            length_units: LengthUnits::Mm,
            active_plane: Plane::Xy,
            motion_mode: MotionMode::Continuous,
            motion_tolerance: 0.0,
            naivecam_tolerance: 0.0,
            feed_mode: FeedMode::InverseTime,
            linear_feed_rate: 0.0,
            angular_feed_rate: 0.0,
            spindle_speed: 0.0,
            css_maximum: 0.0,
            css_numerator: 0.0,
            cartesian_move: false,
            angular_move: false,
            synched: false,
            block_delete: true,
            optional_program_stop: true,
        }
    }
}

impl Default for CanonState {
    fn default() -> Self {
        Self::new()
    }
}
