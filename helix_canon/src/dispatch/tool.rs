//! Tooling dispatch: tool table, length offsets, change, and pocket
//! selection.

use helix_common::canon::{FeedMode, MotionType};
use helix_common::messages::{LinearMove, ToolTableEntry, TrajMessage};
use helix_common::pose::Pose;
use helix_common::status::StatusSource;

use crate::engine::CanonEngine;
use crate::xform::{from_ext, from_prog, to_ext, to_ext_len};

impl<S: StatusSource> CanonEngine<S> {
    /// Update one tool table entry. Distances arrive in machine
    /// (external) units and pass through unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn set_tool_table_entry(
        &mut self,
        pocket: i32,
        toolno: i32,
        offset: Pose,
        diameter: f64,
        frontangle: f64,
        backangle: f64,
        orientation: i32,
    ) {
        self.flush_segments();
        self.list.append(TrajMessage::ToolSetOffset {
            pocket,
            entry: ToolTableEntry {
                toolno,
                offset,
                diameter,
                frontangle,
                backangle,
                orientation,
            },
        });
    }

    /// Apply a tool length offset (program units) to all subsequent
    /// moves, and append the externalized offset so the executor observes
    /// the change in order rather than at read-ahead time.
    pub fn use_tool_length_offset(&mut self, offset: Pose) {
        self.flush_segments();
        self.state.tool_offset = from_prog(offset, self.state.length_units);

        if self.state.css_maximum != 0.0 {
            let msg = self.css_speed_message();
            self.list.append(msg);
        }
        let offset = to_ext(
            self.state.tool_offset,
            self.limits.external_length_units,
            self.limits.external_angle_units,
        );
        self.list.append(TrajMessage::SetToolOffset { offset });
    }

    /// Load the tool in `_pocket` into the spindle. When the
    /// configuration carries a tool-change position, a positioning move
    /// there (machine coordinates, feed mode forced off around it)
    /// precedes the load message.
    pub fn change_tool(&mut self, _pocket: i32) {
        self.flush_segments();

        if let Some(position) = self.limits.tool_change_position {
            let target = from_ext(
                position,
                self.limits.external_length_units,
                self.limits.external_angle_units,
            );
            let env = self.classify_straight(&target);
            let vel = env.max_velocity;
            let acc = env.max_acceleration;

            let msg = LinearMove {
                end: self.to_ext_pose(target),
                vel: self.to_ext_vel(vel),
                ini_maxvel: self.to_ext_vel(vel),
                acc: self.to_ext_acc(acc),
                ini_maxjerk: to_ext_len(env.max_jerk, self.limits.external_length_units),
                feed_mode: FeedMode::InverseTime,
                motion_type: MotionType::ToolChange,
            };

            let synched_mode = self.state.feed_mode.is_synched();
            if synched_mode {
                self.stop_speed_feed_synch();
            }
            if vel != 0.0 && acc != 0.0 {
                self.list.append(TrajMessage::Linear(msg));
            }
            if synched_mode {
                let rate = self.state.linear_feed_rate;
                self.start_speed_feed_synch(rate, true);
            }
            self.state.end_point = target;
        }

        self.list.append(TrajMessage::ToolLoad);
    }

    /// Ask the changer to stage the tool in `pocket`.
    pub fn select_pocket(&mut self, pocket: i32) {
        self.list.append(TrajMessage::ToolPrepare { pocket });
    }

    /// Record a bare tool-number change (no motion, no load cycle).
    pub fn change_tool_number(&mut self, tool: i32) {
        self.list.append(TrajMessage::ToolSetNumber { tool });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_common::canon::LengthUnits;
    use helix_common::config::MachineLimits;
    use helix_common::status::StatusSnapshot;

    fn engine() -> CanonEngine<StatusSnapshot> {
        CanonEngine::new(
            MachineLimits::three_axis(100.0, 1000.0, 10000.0),
            StatusSnapshot::default(),
        )
    }

    #[test]
    fn tool_length_offset_shifts_subsequent_moves() {
        let mut eng = engine();
        eng.use_tool_length_offset(Pose {
            z: -50.0,
            ..Pose::ZERO
        });
        assert_eq!(eng.state().tool_offset.z, -50.0);
        assert!(matches!(
            eng.interp_list().back().unwrap().message,
            TrajMessage::SetToolOffset { offset } if offset.z == -50.0
        ));

        eng.set_feed_rate(600.0);
        eng.straight_feed(1, Pose::ZERO);
        eng.finish();
        assert_eq!(eng.state().end_point.z, -50.0);
    }

    #[test]
    fn tool_length_offset_converts_program_units() {
        let mut eng = engine();
        eng.use_length_units(LengthUnits::Inches);
        eng.use_tool_length_offset(Pose {
            z: -2.0,
            ..Pose::ZERO
        });
        assert!((eng.state().tool_offset.z + 50.8).abs() < 1e-12);
    }

    #[test]
    fn css_active_offset_change_reports_speed_first() {
        let mut eng = engine();
        eng.state.css_maximum = 2000.0;
        eng.state.css_numerator = 42.0;
        eng.use_tool_length_offset(Pose {
            x: 1.0,
            ..Pose::ZERO
        });
        let kinds: Vec<_> = eng.interp_list().iter().map(|e| &e.message).collect();
        assert!(
            matches!(kinds[0], TrajMessage::SpindleSpeed { x_offset, .. } if *x_offset == 1.0)
        );
        assert!(matches!(kinds[1], TrajMessage::SetToolOffset { .. }));
    }

    #[test]
    fn change_tool_without_position_just_loads() {
        let mut eng = engine();
        eng.change_tool(3);
        assert_eq!(eng.interp_list().len(), 1);
        assert!(matches!(
            eng.interp_list().back().unwrap().message,
            TrajMessage::ToolLoad
        ));
    }

    #[test]
    fn change_tool_with_position_moves_first() {
        let mut limits = MachineLimits::three_axis(100.0, 1000.0, 10000.0);
        limits.tool_change_position = Some(Pose {
            z: 120.0,
            ..Pose::ZERO
        });
        let mut eng = CanonEngine::new(limits, StatusSnapshot::default());
        eng.change_tool(3);
        let kinds: Vec<_> = eng.interp_list().iter().map(|e| &e.message).collect();
        assert_eq!(kinds.len(), 2);
        match kinds[0] {
            TrajMessage::Linear(m) => {
                assert_eq!(m.motion_type, MotionType::ToolChange);
                assert_eq!(m.end.z, 120.0);
            }
            other => panic!("expected Linear, got {other:?}"),
        }
        assert!(matches!(kinds[1], TrajMessage::ToolLoad));
        assert_eq!(eng.state().end_point.z, 120.0);
    }

    #[test]
    fn select_pocket_and_tool_number_do_not_flush() {
        let mut eng = engine();
        eng.set_feed_rate(600.0);
        eng.straight_feed(
            1,
            Pose {
                x: 5.0,
                ..Pose::ZERO
            },
        );
        eng.select_pocket(4);
        eng.change_tool_number(9);
        assert_eq!(eng.pending_segments(), 1);
        assert!(matches!(
            eng.interp_list().iter().next().unwrap().message,
            TrajMessage::ToolPrepare { pocket: 4 }
        ));
    }

    #[test]
    fn tool_table_entry_passes_through_machine_units() {
        let mut eng = engine();
        eng.set_tool_table_entry(
            2,
            7,
            Pose {
                z: -10.0,
                ..Pose::ZERO
            },
            6.35,
            0.0,
            0.0,
            0,
        );
        match &eng.interp_list().back().unwrap().message {
            TrajMessage::ToolSetOffset { pocket, entry } => {
                assert_eq!(*pocket, 2);
                assert_eq!(entry.toolno, 7);
                assert_eq!(entry.offset.z, -10.0);
                assert_eq!(entry.diameter, 6.35);
            }
            other => panic!("expected ToolSetOffset, got {other:?}"),
        }
    }
}
