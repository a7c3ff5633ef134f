//! World-state mutators.
//!
//! Mutators that change how subsequent moves are computed flush the
//! segment chain first. `select_plane`, `set_naivecam_tolerance`, and
//! `set_spindle_mode` only take effect on the next dispatch and do not
//! flush. Origin and tool-offset changes additionally append a message so
//! the executor observes the change in dispatch order, not at read-ahead
//! time.

use helix_common::canon::{FeedMode, MotionMode, Plane, TermCond};
use helix_common::messages::TrajMessage;
use helix_common::pose::Pose;
use helix_common::status::StatusSource;

use crate::engine::CanonEngine;
use crate::xform::{from_prog, from_prog_len, to_ext, to_ext_len};

impl<S: StatusSource> CanonEngine<S> {
    /// Install new work-coordinate origin offsets (program units) and
    /// notify the executor.
    pub fn set_origin_offsets(&mut self, origin: Pose) {
        self.flush_segments();
        self.state.program_origin = from_prog(origin, self.state.length_units);
        self.send_origin_message();
    }

    pub(crate) fn send_origin_message(&mut self) {
        if self.state.css_maximum != 0.0 {
            let msg = self.css_speed_message();
            self.list.append(msg);
        }
        let origin = to_ext(
            self.state.program_origin,
            self.limits.external_length_units,
            self.limits.external_angle_units,
        );
        self.list.append(TrajMessage::SetOrigin { origin });
    }

    /// Set the XY rotation (degrees) applied to programmed coordinates.
    pub fn set_xy_rotation(&mut self, rotation: f64) {
        self.flush_segments();
        self.list.append(TrajMessage::SetRotation { rotation });
        self.state.xy_rotation = rotation;
    }

    /// Select the program-side length unit.
    pub fn use_length_units(&mut self, units: helix_common::canon::LengthUnits) {
        self.flush_segments();
        self.state.length_units = units;
    }

    /// Set the feed interpretation mode. Leaving a synchronized mode
    /// stops speed-feed synch.
    pub fn set_feed_mode(&mut self, mode: FeedMode) {
        self.flush_segments();
        self.state.feed_mode = mode;
        if !mode.is_synched() {
            self.stop_speed_feed_synch();
        }
    }

    /// Set the programmed feed. In a synchronized mode the rate is length
    /// per spindle revolution and re-arms the synch; otherwise it is
    /// program units per minute, converted to internal per-second rates.
    pub fn set_feed_rate(&mut self, rate: f64) {
        if self.state.feed_mode.is_synched() {
            self.start_speed_feed_synch(rate, true);
            self.state.linear_feed_rate = rate;
        } else {
            let per_second = rate / 60.0;
            let linear = from_prog_len(per_second, self.state.length_units);
            let angular = per_second;
            if linear != self.state.linear_feed_rate || angular != self.state.angular_feed_rate {
                self.flush_segments();
            }
            self.state.linear_feed_rate = linear;
            self.state.angular_feed_rate = angular;
        }
    }

    /// Select the arc plane; effective from the next arc dispatch.
    pub fn select_plane(&mut self, plane: Plane) {
        self.state.active_plane = plane;
    }

    /// Set blend vs. exact-stop behavior and the blend tolerance
    /// (program units); notifies the executor.
    pub fn set_motion_control_mode(&mut self, mode: MotionMode, tolerance: f64) {
        self.flush_segments();
        self.state.motion_mode = mode;
        self.state.motion_tolerance = from_prog_len(tolerance, self.state.length_units);

        let msg = match mode {
            MotionMode::Continuous => TrajMessage::SetTermCond {
                cond: TermCond::Blend,
                tolerance: to_ext_len(
                    self.state.motion_tolerance,
                    self.limits.external_length_units,
                ),
            },
            MotionMode::ExactStop => TrajMessage::SetTermCond {
                cond: TermCond::Stop,
                tolerance: 0.0,
            },
        };
        self.list.append(msg);
    }

    /// Set the collinear fusion tolerance (program units). Zero disables
    /// fusion. No message is emitted; this only alters fusion behavior.
    pub fn set_naivecam_tolerance(&mut self, tolerance: f64) {
        self.state.naivecam_tolerance = from_prog_len(tolerance, self.state.length_units);
    }

    /// Enable or disable block-delete line skipping.
    pub fn set_block_delete(&mut self, enabled: bool) {
        self.state.block_delete = enabled;
    }

    /// Whether block-delete line skipping is active.
    pub fn block_delete(&self) -> bool {
        self.state.block_delete
    }

    /// Enable or disable optional program stops.
    pub fn set_optional_program_stop(&mut self, enabled: bool) {
        self.state.optional_program_stop = enabled;
    }

    /// Whether optional program stops are honored.
    pub fn optional_program_stop_enabled(&self) -> bool {
        self.state.optional_program_stop
    }
}
