//! Positional dispatch: traverse, feed, rigid tap, probe, and arcs.

use std::f64::consts::PI;

use helix_common::canon::{FeedMode, MotionMode, MotionType, Plane, ProbeType};
use helix_common::consts::{STATIONARY, TINY};
use helix_common::messages::{
    CircularMove, LinearMove, ProbeMove, RigidTap, TrajMessage,
};
use helix_common::pose::{Point3, Pose};
use helix_common::status::StatusSource;
use tracing::{debug, trace};

use crate::engine::CanonEngine;
use crate::xform::{from_ext_ang, from_ext_len, from_prog, rotate, to_ext_len};

/// Deviation of an arc from its chord, and the arc midpoint.
///
/// `theta2` is first normalized into the winding direction indicated by
/// `rotation`; two passes absorb the `atan2` branch cut at ±π.
pub(crate) fn chord_deviation(
    sx: f64,
    sy: f64,
    ex: f64,
    ey: f64,
    cx: f64,
    cy: f64,
    rotation: i32,
) -> (f64, f64, f64) {
    let th1 = (sy - cy).atan2(sx - cx);
    let mut th2 = (ey - cy).atan2(ex - cx);
    let r = (sy - cy).hypot(sx - cx);

    if rotation < 0 {
        if th2 - th1 >= -1e-5 {
            th2 -= 2.0 * PI;
        }
        if th2 - th1 >= -1e-5 {
            th2 -= 2.0 * PI;
        }
    } else {
        if th2 - th1 <= 1e-5 {
            th2 += 2.0 * PI;
        }
        if th2 - th1 <= 1e-5 {
            th2 += 2.0 * PI;
        }
    }

    let included = (th2 - th1).abs();
    let mid = (th2 + th1) / 2.0;
    let mx = cx + r * mid.cos();
    let my = cy + r * mid.sin();
    let deviation = r * (1.0 - (included / 2.0).cos());
    (deviation, mx, my)
}

impl<S: StatusSource> CanonEngine<S> {
    /// Non-cutting rapid to a program-unit pose. Rapids run at the
    /// envelope speed; the programmed feed does not apply. An armed
    /// speed-feed synch is suspended around the move.
    pub fn straight_traverse(&mut self, line_number: i32, pos: Pose) {
        self.flush_segments();

        let target = self.program_to_internal(pos);
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
            motion_type: MotionType::Traverse,
        };

        let synched_mode = self.state.feed_mode.is_synched();
        if synched_mode {
            self.stop_speed_feed_synch();
        }

        if vel != 0.0 && acc != 0.0 {
            self.list.set_line_number(line_number);
            self.list.append(TrajMessage::Linear(msg));
        }

        if synched_mode {
            let rate = self.state.linear_feed_rate;
            self.start_speed_feed_synch(rate, true);
        }

        self.state.end_point = target;
    }

    /// Cutting feed to a program-unit pose. Not emitted eagerly: the
    /// target is offered to the fusion chain.
    pub fn straight_feed(&mut self, line_number: i32, pos: Pose) {
        let target = self.program_to_internal(pos);
        self.see_segment(line_number, target);
    }

    /// Spindle-synchronized tapping cycle to a program-unit XYZ. Rotary
    /// and auxiliary axes hold their current positions, and the canonical
    /// end point is not advanced: the executor returns to the start.
    pub fn rigid_tap(&mut self, line_number: i32, x: f64, y: f64, z: f64) {
        self.flush_segments();

        let tip = self.program_to_internal(Pose {
            x,
            y,
            z,
            ..Pose::ZERO
        });
        let target = Pose {
            x: tip.x,
            y: tip.y,
            z: tip.z,
            ..self.state.end_point
        };

        let env = self.classify_straight(&target);
        let vel = env.max_velocity;
        let acc = env.max_acceleration;

        let msg = RigidTap {
            pos: self.to_ext_pose(target),
            vel: self.to_ext_vel(vel),
            ini_maxvel: self.to_ext_vel(vel),
            acc: self.to_ext_acc(acc),
        };

        if vel != 0.0 && acc != 0.0 {
            self.list.set_line_number(line_number);
            self.list.append(TrajMessage::RigidTap(msg));
        }
        // end point intentionally unchanged
    }

    /// Probing move to a program-unit pose; stops on probe trip.
    pub fn straight_probe(&mut self, line_number: i32, pos: Pose, probe_type: ProbeType) {
        let target = self.program_to_internal(pos);
        self.flush_segments();

        let env = self.classify_straight(&target);
        let ini_maxvel = env.max_velocity;
        let vel = self.feed_clamped(&env);
        let acc = env.max_acceleration;

        let msg = ProbeMove {
            pos: self.to_ext_pose(target),
            vel: self.to_ext_vel(vel),
            ini_maxvel: self.to_ext_vel(ini_maxvel),
            acc: self.to_ext_acc(acc),
            probe_type,
        };

        if vel != 0.0 && acc != 0.0 {
            self.list.set_line_number(line_number);
            self.list.append(TrajMessage::Probe(msg));
        }
        self.state.end_point = target;
    }

    /// Arc (or helix) in the active plane.
    ///
    /// `first_end`/`second_end` are the in-plane end coordinates,
    /// `first_axis`/`second_axis` the in-plane center, `axis_end_point`
    /// the out-of-plane end, all in program units. `rotation` counts
    /// turns: 0 commands a straight line, ±1 a single arc, ±2 adds a full
    /// revolution, with sign selecting the winding.
    ///
    /// A nearly straight XY arc in continuous mode — chord deviation
    /// under the naive-cam tolerance — degrades into two linked straight
    /// feeds through the arc midpoint, keeping it eligible for fusion.
    #[allow(clippy::too_many_arguments)]
    pub fn arc_feed(
        &mut self,
        line_number: i32,
        first_end: f64,
        second_end: f64,
        first_axis: f64,
        second_axis: f64,
        rotation: i32,
        axis_end_point: f64,
        a: f64,
        b: f64,
        c: f64,
        u: f64,
        v: f64,
        w: f64,
    ) {
        // Program-frame translation per plane: the two plane coordinates,
        // then the out-of-plane coordinate.
        let plane = self.state.active_plane;
        let prog_end = match plane {
            Plane::Xy => Pose {
                x: first_end,
                y: second_end,
                z: axis_end_point,
                a,
                b,
                c,
                u,
                v,
                w,
            },
            Plane::Yz => Pose {
                y: first_end,
                z: second_end,
                x: axis_end_point,
                a,
                b,
                c,
                u,
                v,
                w,
            },
            Plane::Xz => Pose {
                z: first_end,
                x: second_end,
                y: axis_end_point,
                a,
                b,
                c,
                u,
                v,
                w,
            },
        };
        let target = self.program_to_internal(prog_end);

        // Center: in-plane coordinates from the axis words, out-of-plane
        // from the end, transformed exactly once.
        let prog_center = match plane {
            Plane::Xy => Pose {
                x: first_axis,
                y: second_axis,
                z: axis_end_point,
                ..Pose::ZERO
            },
            Plane::Yz => Pose {
                y: first_axis,
                z: second_axis,
                x: axis_end_point,
                ..Pose::ZERO
            },
            Plane::Xz => Pose {
                z: first_axis,
                x: second_axis,
                y: axis_end_point,
                ..Pose::ZERO
            },
        };
        let center_pose = self
            .state
            .rotate_and_offset(from_prog(prog_center, self.state.length_units));
        let center = Point3::new(center_pose.x, center_pose.y, center_pose.z);

        // Degrade a nearly straight XY arc into two linked feeds.
        if plane == Plane::Xy && self.state.motion_mode == MotionMode::Continuous {
            let (lx, ly, lz) = self.chain.last_xyz(&self.state.end_point);
            let (deviation, mx, my) =
                chord_deviation(lx, ly, target.x, target.y, center.x, center.y, rotation);
            if deviation < self.state.naivecam_tolerance {
                debug!(line = line_number, deviation, "degrading arc to chord");
                let end = self.state.end_point;
                let mid = Pose {
                    x: mx,
                    y: my,
                    z: (lz + target.z) / 2.0,
                    a: (end.a + target.a) / 2.0,
                    b: (end.b + target.b) / 2.0,
                    c: (end.c + target.c) / 2.0,
                    u: (end.u + target.u) / 2.0,
                    v: (end.v + target.v) / 2.0,
                    w: (end.w + target.w) / 2.0,
                };
                self.see_segment(line_number, mid);
                self.see_segment(line_number, target);
                return;
            }
        }

        self.flush_segments();

        // In-plane geometry against the (now flushed) end point.
        let end = self.state.end_point;
        let (theta1, theta2, radius, axis_len, plane_axes, axial_axis) = match plane {
            Plane::Xy => (
                (end.y - center.y).atan2(end.x - center.x),
                (target.y - center.y).atan2(target.x - center.x),
                (end.x - center.x).hypot(end.y - center.y),
                (target.z - end.z).abs(),
                (0usize, 1usize),
                2usize,
            ),
            Plane::Yz => (
                (end.z - center.z).atan2(end.y - center.y),
                (target.z - center.z).atan2(target.y - center.y),
                (end.y - center.y).hypot(end.z - center.z),
                (target.x - end.x).abs(),
                (1, 2),
                0,
            ),
            Plane::Xz => (
                (end.x - center.x).atan2(end.z - center.z),
                (target.x - center.x).atan2(target.z - center.z),
                (end.z - center.z).hypot(end.x - center.x),
                (target.y - end.y).abs(),
                (0, 2),
                1,
            ),
        };
        trace!(theta1, theta2, radius, axis_len, "arc in-plane geometry");

        let normal = match plane {
            Plane::Xy => Point3::new(0.0, 0.0, 1.0),
            Plane::Yz => {
                let (nx, ny) = rotate(1.0, 0.0, self.state.xy_rotation);
                Point3::new(nx, ny, 0.0)
            }
            Plane::Xz => {
                let (nx, ny) = rotate(0.0, 1.0, self.state.xy_rotation);
                Point3::new(nx, ny, 0.0)
            }
        };

        // Envelope base: the two in-plane axes, internal units.
        let len_units = self.limits.external_length_units;
        let ang_units = self.limits.external_angle_units;
        let (p1, p2) = plane_axes;
        let mut ini_maxvel = from_ext_len(
            self.limits.max_velocity[p1].min(self.limits.max_velocity[p2]),
            len_units,
        );
        let mut acc = from_ext_len(
            self.limits.max_acceleration[p1].min(self.limits.max_acceleration[p2]),
            len_units,
        );
        let mut ini_maxjerk = from_ext_len(
            self.limits.max_jerk[p1].min(self.limits.max_jerk[p2]),
            len_units,
        );

        // Fold in the helical axis when it actually travels.
        if self.axis_valid(axial_axis) && axis_len > 0.001 {
            ini_maxvel = ini_maxvel.min(from_ext_len(self.limits.max_velocity[axial_axis], len_units));
            acc = acc.min(from_ext_len(self.limits.max_acceleration[axial_axis], len_units));
            ini_maxjerk =
                ini_maxjerk.min(from_ext_len(self.limits.max_jerk[axial_axis], len_units));
        }

        // Fold in any moving rotary or auxiliary axis.
        let mut deltas = [0.0f64; 9];
        for axis in [3usize, 4, 5, 6, 7, 8] {
            let d = (target.coord(axis) - end.coord(axis)).abs();
            deltas[axis] = if self.axis_valid(axis) && d >= TINY { d } else { 0.0 };
        }

        let fold = |values: &[f64; 9], axes: [usize; 3]| -> f64 {
            axes.iter().fold(STATIONARY, |m, &axis| {
                if deltas[axis] > 0.0 {
                    m.min(values[axis])
                } else {
                    m
                }
            })
        };

        ini_maxjerk = ini_maxjerk
            .min(from_ext_len(fold(&self.limits.max_jerk, [6, 7, 8]), len_units))
            .min(from_ext_ang(fold(&self.limits.max_jerk, [3, 4, 5]), ang_units));
        acc = acc
            .min(from_ext_len(fold(&self.limits.max_acceleration, [6, 7, 8]), len_units))
            .min(from_ext_ang(fold(&self.limits.max_acceleration, [3, 4, 5]), ang_units));
        ini_maxvel = ini_maxvel
            .min(from_ext_len(fold(&self.limits.max_velocity, [6, 7, 8]), len_units))
            .min(from_ext_ang(fold(&self.limits.max_velocity, [3, 4, 5]), ang_units));

        assert!(ini_maxvel > 0.0, "arc velocity envelope must be positive");
        assert!(acc > 0.0, "arc acceleration envelope must be positive");
        assert!(ini_maxjerk > 0.0, "arc jerk envelope must be positive");

        // Arcs are linear-class motion; there is no arc of rotary axes
        // alone.
        self.state.cartesian_move = true;
        self.state.angular_move = deltas[3] > 0.0 || deltas[4] > 0.0 || deltas[5] > 0.0;

        let vel = ini_maxvel.min(self.state.linear_feed_rate);

        if rotation == 0 {
            let msg = LinearMove {
                end: self.to_ext_pose(target),
                vel: self.to_ext_vel(vel),
                ini_maxvel: self.to_ext_vel(ini_maxvel),
                acc: self.to_ext_acc(acc),
                ini_maxjerk: to_ext_len(ini_maxjerk, len_units),
                feed_mode: self.state.feed_mode,
                motion_type: MotionType::Arc,
            };
            if vel != 0.0 && acc != 0.0 {
                self.list.set_line_number(line_number);
                self.list.append(TrajMessage::Linear(msg));
            }
        } else {
            let turn = if rotation > 0 {
                rotation - 1
            } else {
                // reverse winding
                rotation
            };
            let msg = CircularMove {
                end: self.to_ext_pose(target),
                center: Point3::new(
                    to_ext_len(center.x, len_units),
                    to_ext_len(center.y, len_units),
                    to_ext_len(center.z, len_units),
                ),
                normal,
                turn,
                vel: self.to_ext_vel(vel),
                ini_maxvel: self.to_ext_vel(ini_maxvel),
                acc: self.to_ext_acc(acc),
                ini_maxjerk: to_ext_len(ini_maxjerk, len_units),
                feed_mode: self.state.feed_mode,
            };
            if vel != 0.0 && acc != 0.0 {
                self.list.set_line_number(line_number);
                self.list.append(TrajMessage::Circular(msg));
            }
        }

        self.state.end_point = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_common::config::MachineLimits;
    use helix_common::status::StatusSnapshot;

    fn engine() -> CanonEngine<StatusSnapshot> {
        let mut eng = CanonEngine::new(
            MachineLimits::three_axis(100.0, 1000.0, 10000.0),
            StatusSnapshot::default(),
        );
        eng.set_feed_rate(600.0); // 10 mm/s
        eng
    }

    fn xyz(x: f64, y: f64, z: f64) -> Pose {
        Pose {
            x,
            y,
            z,
            ..Pose::ZERO
        }
    }

    #[test]
    fn traverse_runs_at_envelope_speed() {
        let mut eng = engine();
        eng.straight_traverse(10, xyz(10.0, 0.0, 0.0));
        let entry = eng.interp_list().back().unwrap();
        assert_eq!(entry.line_number, 10);
        match &entry.message {
            TrajMessage::Linear(m) => {
                assert_eq!(m.motion_type, MotionType::Traverse);
                assert_eq!(m.vel, 100.0);
                assert_eq!(m.ini_maxvel, 100.0);
                assert_eq!(m.feed_mode, FeedMode::InverseTime);
                assert_eq!(m.end.x, 10.0);
            }
            other => panic!("expected Linear, got {other:?}"),
        }
        assert_eq!(eng.state().end_point.x, 10.0);
    }

    #[test]
    fn degenerate_traverse_is_dropped() {
        let mut eng = engine();
        eng.straight_traverse(1, Pose::ZERO);
        assert!(eng.interp_list().is_empty());
    }

    #[test]
    fn rigid_tap_keeps_end_point() {
        let mut eng = engine();
        eng.rigid_tap(7, 0.0, 0.0, -20.0);
        match &eng.interp_list().back().unwrap().message {
            TrajMessage::RigidTap(m) => {
                assert_eq!(m.pos.z, -20.0);
                assert_eq!(m.vel, 100.0);
            }
            other => panic!("expected RigidTap, got {other:?}"),
        }
        assert_eq!(eng.state().end_point.z, 0.0);
    }

    #[test]
    fn probe_clamps_velocity_by_feed() {
        let mut eng = engine();
        eng.straight_probe(3, xyz(0.0, 0.0, -5.0), ProbeType::Toward);
        match &eng.interp_list().back().unwrap().message {
            TrajMessage::Probe(m) => {
                assert_eq!(m.vel, 10.0);
                assert_eq!(m.ini_maxvel, 100.0);
                assert_eq!(m.probe_type, ProbeType::Toward);
            }
            other => panic!("expected Probe, got {other:?}"),
        }
        assert_eq!(eng.state().end_point.z, -5.0);
    }

    #[test]
    fn simple_arc_in_xy_plane() {
        // From (0,0,0), end (10,0,0), center (5,0): a single half turn.
        let mut eng = engine();
        eng.arc_feed(20, 10.0, 0.0, 5.0, 0.0, 1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        match &eng.interp_list().back().unwrap().message {
            TrajMessage::Circular(m) => {
                assert_eq!(m.center, Point3::new(5.0, 0.0, 0.0));
                assert_eq!(m.normal, Point3::new(0.0, 0.0, 1.0));
                assert_eq!(m.turn, 0);
                assert_eq!(m.end.x, 10.0);
                assert_eq!(m.vel, 10.0);
                assert_eq!(m.ini_maxvel, 100.0);
            }
            other => panic!("expected Circular, got {other:?}"),
        }
        assert_eq!(eng.state().end_point.x, 10.0);
    }

    #[test]
    fn negative_rotation_keeps_reverse_turn_count() {
        let mut eng = engine();
        eng.arc_feed(20, 10.0, 0.0, 5.0, 0.0, -2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        match &eng.interp_list().back().unwrap().message {
            TrajMessage::Circular(m) => assert_eq!(m.turn, -2),
            other => panic!("expected Circular, got {other:?}"),
        }
    }

    #[test]
    fn rotation_zero_is_a_linear_move_tagged_arc() {
        let mut eng = engine();
        eng.arc_feed(21, 10.0, 0.0, 5.0, 0.0, 0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        match &eng.interp_list().back().unwrap().message {
            TrajMessage::Linear(m) => assert_eq!(m.motion_type, MotionType::Arc),
            other => panic!("expected Linear, got {other:?}"),
        }
    }

    #[test]
    fn nearly_straight_arc_degrades_into_chained_feeds() {
        let mut eng = engine();
        eng.set_naivecam_tolerance(10.0); // generous: shallow arcs degrade
        // Center far above the chord: deviation ~0.25 mm.
        eng.arc_feed(22, 10.0, 0.0, 5.0, 50.0, 1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        // No arc emitted; two points pending in the chain instead.
        assert!(eng.interp_list().is_empty());
        assert_eq!(eng.pending_segments(), 2);
        eng.finish();
        assert_eq!(eng.interp_list().len(), 1);
        assert_eq!(eng.state().end_point.x, 10.0);
    }

    #[test]
    fn chord_deviation_of_semicircle() {
        // Semicircle radius 5: deviation = r(1 - cos(π/2)) = 5. Starting
        // at the leftmost point, the positive winding sweeps the lower
        // half, so the midpoint sits below the chord.
        let (dev, mx, my) = chord_deviation(0.0, 0.0, 10.0, 0.0, 5.0, 0.0, 1);
        assert!((dev - 5.0).abs() < 1e-9);
        assert!((mx - 5.0).abs() < 1e-9);
        assert!((my + 5.0).abs() < 1e-9);
    }

    #[test]
    fn chord_deviation_respects_winding() {
        // Reversed winding sweeps the upper half instead.
        let (dev, _mx, my) = chord_deviation(0.0, 0.0, 10.0, 0.0, 5.0, 0.0, -1);
        assert!((dev - 5.0).abs() < 1e-9);
        assert!((my - 5.0).abs() < 1e-9);
    }

    #[test]
    fn shallow_arc_has_small_deviation() {
        // Center far below, short winding: the arc is nearly its chord.
        let (dev, _mx, _my) = chord_deviation(0.0, 0.0, 30.0, 0.0, 15.0, -500.0, -1);
        assert!(dev < 0.3, "deviation {dev}");
        assert!(dev > 0.0);
    }

    #[test]
    fn helical_arc_folds_axial_axis_limit() {
        let mut limits = MachineLimits::three_axis(100.0, 1000.0, 10000.0);
        limits.max_velocity[2] = 20.0; // slow Z
        let mut eng = CanonEngine::new(limits, StatusSnapshot::default());
        eng.set_feed_rate(6000.0); // 100 mm/s, above envelope
        eng.arc_feed(23, 10.0, 0.0, 5.0, 0.0, 1, -8.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        match &eng.interp_list().back().unwrap().message {
            TrajMessage::Circular(m) => {
                assert_eq!(m.ini_maxvel, 20.0);
                assert_eq!(m.end.z, -8.0);
            }
            other => panic!("expected Circular, got {other:?}"),
        }
    }

    #[test]
    fn synched_traverse_suspends_and_resumes_synch() {
        let mut eng = engine();
        eng.set_feed_mode(FeedMode::PerRevSynched);
        eng.set_feed_rate(0.25); // per-rev
        assert!(eng.state().synched);
        let before = eng.interp_list().len();
        eng.straight_traverse(30, xyz(10.0, 0.0, 0.0));
        let msgs: Vec<_> = eng
            .interp_list()
            .iter()
            .skip(before)
            .map(|e| &e.message)
            .collect();
        // stop-synch, traverse, start-synch
        assert!(matches!(
            msgs[0],
            TrajMessage::SetSpindleSync {
                feed_per_revolution,
                ..
            } if *feed_per_revolution == 0.0
        ));
        assert!(matches!(msgs[1], TrajMessage::Linear(_)));
        assert!(
            matches!(msgs[2], TrajMessage::SetSpindleSync { feed_per_revolution, .. } if *feed_per_revolution != 0.0)
        );
        assert!(eng.state().synched);
    }
}
