//! Read-only accessors of external state.
//!
//! These answer the interpreter's questions about where the machine is
//! and what the executor believes, converted back to program units.

use helix_common::canon::{LengthUnits, MotionMode, Plane, SpindleDirection};
use helix_common::consts::{MAX_ANALOG_IO, MAX_DIGITAL_IO};
use helix_common::messages::ToolTableEntry;
use helix_common::pose::Pose;
use helix_common::status::StatusSource;

use crate::engine::CanonEngine;
use crate::xform::{from_ext, to_prog, to_prog_len};

impl<S: StatusSource> CanonEngine<S> {
    /// Current machine position in program coordinates.
    ///
    /// Pending fused points are discarded (not emitted): the caller is
    /// asking where the machine is, and the chain describes motion that
    /// never happened yet. The canonical end point is resynchronized to
    /// the reported position.
    pub fn external_position(&mut self) -> Pose {
        self.chain.clear();

        let pos = from_ext(
            self.status.position(),
            self.limits.external_length_units,
            self.limits.external_angle_units,
        );
        self.state.end_point = pos;
        to_prog(
            self.state.unoffset_and_unrotate(pos),
            self.state.length_units,
        )
    }

    /// Last probed position in program coordinates. Logs the sample to
    /// the probe file when one is open and the value changed.
    pub fn external_probe_position(&mut self) -> Pose {
        self.flush_segments();

        let pos = from_ext(
            self.status.probed_position(),
            self.limits.external_length_units,
            self.limits.external_angle_units,
        );
        let position = to_prog(
            self.state.unoffset_and_unrotate(pos),
            self.state.length_units,
        );
        self.probe_log.record(&position);
        position
    }

    /// Whether the probe tripped during the last probing move.
    pub fn external_probe_tripped(&self) -> bool {
        self.status.probe_tripped()
    }

    /// Analog probe readout; only contact probes are supported.
    pub fn external_probe_value(&self) -> f64 {
        0.0
    }

    /// Programmed feed in program units per minute.
    pub fn external_feed_rate(&self) -> f64 {
        to_prog_len(self.state.linear_feed_rate, self.state.length_units) * 60.0
    }

    /// Fastest configured linear-axis rapid in program units per minute.
    pub fn external_traverse_rate(&self) -> f64 {
        let fastest = helix_common::axis::LINEAR_AXES
            .iter()
            .filter(|&&axis| self.limits.axis_mask.has_axis(axis))
            .map(|&axis| self.limits.max_velocity[axis])
            .fold(0.0, f64::max);
        to_prog_len(
            crate::xform::from_ext_len(fastest, self.limits.external_length_units),
            self.state.length_units,
        ) * 60.0
    }

    /// Active motion control mode.
    pub fn external_motion_control_mode(&self) -> MotionMode {
        self.state.motion_mode
    }

    /// Blend tolerance in program units.
    pub fn external_motion_control_tolerance(&self) -> f64 {
        to_prog_len(self.state.motion_tolerance, self.state.length_units)
    }

    /// Program-side length unit.
    pub fn external_length_unit_type(&self) -> LengthUnits {
        self.state.length_units
    }

    /// Active arc plane.
    pub fn external_plane(&self) -> Plane {
        self.state.active_plane
    }

    /// Tool table entry for `pocket`; a zeroed entry with `toolno = -1`
    /// when the pocket is out of range.
    pub fn external_tool_table(&self, pocket: i32) -> ToolTableEntry {
        if pocket < 0 || pocket as usize >= self.limits.pockets_max {
            return ToolTableEntry::missing();
        }
        self.status
            .tool_table(pocket as usize)
            .unwrap_or_else(ToolTableEntry::missing)
    }

    /// Tool table capacity.
    pub fn external_pockets_max(&self) -> usize {
        self.limits.pockets_max
    }

    /// Tool currently in the spindle.
    pub fn external_tool_slot(&self) -> i32 {
        self.status.tool_in_spindle()
    }

    /// Pocket staged by the last tool-prepare.
    pub fn external_selected_tool_slot(&self) -> i32 {
        self.status.pocket_prepped()
    }

    /// Whether the executor's motion queue is empty. Flushes first so a
    /// pending fused segment counts as queued work.
    pub fn external_queue_empty(&mut self) -> bool {
        self.flush_segments();
        self.status.queue_depth() == 0
    }

    /// The axis-enable mask.
    pub fn external_axis_mask(&self) -> helix_common::axis::AxisMask {
        self.limits.axis_mask
    }

    pub fn external_mist(&self) -> bool {
        self.status.mist_on()
    }

    pub fn external_flood(&self) -> bool {
        self.status.flood_on()
    }

    /// Spindle speed in rpm, unsigned.
    pub fn external_speed(&self) -> f64 {
        self.status.spindle_speed()
    }

    /// Spindle rotation direction from the signed status speed.
    pub fn external_spindle(&self) -> SpindleDirection {
        let speed = self.status.spindle_speed();
        if speed == 0.0 {
            SpindleDirection::Stopped
        } else if speed > 0.0 {
            SpindleDirection::Clockwise
        } else {
            SpindleDirection::CounterClockwise
        }
    }

    pub fn external_feed_override_enable(&self) -> bool {
        self.status.feed_override_enabled()
    }

    pub fn external_spindle_override_enable(&self) -> bool {
        self.status.spindle_override_enabled()
    }

    pub fn external_adaptive_feed_enable(&self) -> bool {
        self.status.adaptive_feed_enabled()
    }

    pub fn external_feed_hold_enable(&self) -> bool {
        self.status.feed_hold_enabled()
    }

    /// Digital input state: `1`/`0`, or `-1` for a bad index or a timed
    /// out wait. Bounds rejection is silent by contract.
    pub fn external_digital_input(&self, index: usize) -> i32 {
        if index >= MAX_DIGITAL_IO || self.status.input_timed_out() {
            return -1;
        }
        i32::from(self.status.digital_input(index))
    }

    /// Analog input value, or `-1.0` for a bad index or a timed out
    /// wait.
    pub fn external_analog_input(&self, index: usize) -> f64 {
        if index >= MAX_ANALOG_IO || self.status.input_timed_out() {
            return -1.0;
        }
        self.status.analog_input(index)
    }

    // ─── Per-axis convenience getters ───────────────────────────────

    pub fn external_position_x(&mut self) -> f64 {
        self.external_position().x
    }

    pub fn external_position_y(&mut self) -> f64 {
        self.external_position().y
    }

    pub fn external_position_z(&mut self) -> f64 {
        self.external_position().z
    }

    pub fn external_position_a(&mut self) -> f64 {
        self.external_position().a
    }

    pub fn external_position_b(&mut self) -> f64 {
        self.external_position().b
    }

    pub fn external_position_c(&mut self) -> f64 {
        self.external_position().c
    }

    pub fn external_position_u(&mut self) -> f64 {
        self.external_position().u
    }

    pub fn external_position_v(&mut self) -> f64 {
        self.external_position().v
    }

    pub fn external_position_w(&mut self) -> f64 {
        self.external_position().w
    }

    pub fn external_probe_position_x(&mut self) -> f64 {
        self.external_probe_position().x
    }

    pub fn external_probe_position_y(&mut self) -> f64 {
        self.external_probe_position().y
    }

    pub fn external_probe_position_z(&mut self) -> f64 {
        self.external_probe_position().z
    }

    pub fn external_probe_position_a(&mut self) -> f64 {
        self.external_probe_position().a
    }

    pub fn external_probe_position_b(&mut self) -> f64 {
        self.external_probe_position().b
    }

    pub fn external_probe_position_c(&mut self) -> f64 {
        self.external_probe_position().c
    }

    pub fn external_probe_position_u(&mut self) -> f64 {
        self.external_probe_position().u
    }

    pub fn external_probe_position_v(&mut self) -> f64 {
        self.external_probe_position().v
    }

    pub fn external_probe_position_w(&mut self) -> f64 {
        self.external_probe_position().w
    }

    /// Active tool length offset components, program units.
    pub fn external_tool_length_offset(&self) -> Pose {
        to_prog(self.state.tool_offset, self.state.length_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_common::config::MachineLimits;
    use helix_common::status::StatusSnapshot;

    fn engine() -> CanonEngine<StatusSnapshot> {
        CanonEngine::new(
            MachineLimits::three_axis(100.0, 1000.0, 10000.0),
            StatusSnapshot::default(),
        )
    }

    #[test]
    fn position_resynchronizes_end_point_and_discards_chain() {
        let mut eng = engine();
        eng.set_feed_rate(600.0);
        eng.straight_feed(
            1,
            Pose {
                x: 5.0,
                ..Pose::ZERO
            },
        );
        eng.status_mut().position = Pose {
            x: 2.0,
            ..Pose::ZERO
        };
        let pos = eng.external_position();
        // chain discarded without emission
        assert!(eng.interp_list().is_empty());
        assert_eq!(eng.pending_segments(), 0);
        assert_eq!(pos.x, 2.0);
        assert_eq!(eng.state().end_point.x, 2.0);
    }

    #[test]
    fn position_reports_program_coordinates() {
        let mut eng = engine();
        eng.set_origin_offsets(Pose {
            x: 10.0,
            ..Pose::ZERO
        });
        eng.status_mut().position = Pose {
            x: 12.0,
            ..Pose::ZERO
        };
        let pos = eng.external_position();
        assert!((pos.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn probe_position_unoffsets_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.txt");
        let mut eng = engine();
        eng.comment(&format!("PROBEOPEN {}", path.display()));

        eng.status_mut().probed_position = Pose {
            z: -3.25,
            ..Pose::ZERO
        };
        let first = eng.external_probe_position();
        assert_eq!(first.z, -3.25);
        // unchanged sample, not logged twice
        eng.external_probe_position();
        eng.comment("PROBECLOSE");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn tool_table_bounds_are_silent() {
        let mut eng = engine();
        eng.status_mut().tool_table = vec![
            ToolTableEntry {
                toolno: 5,
                ..ToolTableEntry::default()
            };
            3
        ];
        assert_eq!(eng.external_tool_table(0).toolno, 5);
        assert_eq!(eng.external_tool_table(-1).toolno, -1);
        assert_eq!(eng.external_tool_table(10_000).toolno, -1);
    }

    #[test]
    fn digital_input_sentinel_contract() {
        let mut eng = engine();
        eng.status_mut().digital_inputs = vec![true, false];
        assert_eq!(eng.external_digital_input(0), 1);
        assert_eq!(eng.external_digital_input(1), 0);
        assert_eq!(eng.external_digital_input(MAX_DIGITAL_IO), -1);
        eng.status_mut().input_timed_out = true;
        assert_eq!(eng.external_digital_input(0), -1);
    }

    #[test]
    fn analog_input_sentinel_contract() {
        let mut eng = engine();
        eng.status_mut().analog_inputs = vec![2.5];
        assert_eq!(eng.external_analog_input(0), 2.5);
        assert_eq!(eng.external_analog_input(MAX_ANALOG_IO), -1.0);
    }

    #[test]
    fn spindle_direction_from_signed_speed() {
        let mut eng = engine();
        assert_eq!(eng.external_spindle(), SpindleDirection::Stopped);
        eng.status_mut().spindle_speed = 500.0;
        assert_eq!(eng.external_spindle(), SpindleDirection::Clockwise);
        eng.status_mut().spindle_speed = -500.0;
        assert_eq!(eng.external_spindle(), SpindleDirection::CounterClockwise);
    }

    #[test]
    fn feed_rate_readback_roundtrips() {
        let mut eng = engine();
        eng.set_feed_rate(600.0);
        assert!((eng.external_feed_rate() - 600.0).abs() < 1e-9);
        eng.use_length_units(LengthUnits::Inches);
        eng.set_feed_rate(20.0);
        assert!((eng.external_feed_rate() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn queue_empty_flushes_pending_chain() {
        let mut eng = engine();
        eng.set_feed_rate(600.0);
        eng.straight_feed(
            1,
            Pose {
                x: 5.0,
                ..Pose::ZERO
            },
        );
        assert!(eng.external_queue_empty());
        assert_eq!(eng.interp_list().len(), 1);
    }
}
