//! Spline and NURBS dispatch.
//!
//! Planar splines and NURBS curves are approximated by biarcs: pairs of
//! tangent-continuous circular arcs fitted between sampled curve points,
//! each emitted through the ordinary arc path (and thus eligible for
//! chord degradation and fusion). Fully 3D NURBS curves are not
//! approximated here; the control points and knots stream to the
//! executor as block-annotated messages.
//!
//! All curve math runs in program units; emission re-enters `arc_feed`
//! and `straight_feed`, which own the transforms.

use std::f64::consts::PI;

use helix_common::axis::{ANGULAR_AXES, LINEAR_AXES};
use helix_common::consts::{BIARC_MAX_RETRIES, STATIONARY, TINY};
use helix_common::messages::{
    NurbsBlock, NurbsControlPoint, NurbsMove, PlaneControlPoint, TrajMessage, UoflBlock,
};
use helix_common::pose::Pose;
use helix_common::status::StatusSource;
use tracing::{debug, warn};

use crate::engine::CanonEngine;
use crate::xform::{from_ext_ang, from_ext_len, from_prog_len, to_ext_len, to_prog};

const BIARC_EPSILON: f64 = 1e-6;

fn normalized(x: f64, y: f64) -> (f64, f64) {
    let h = x.hypot(y);
    if h != 0.0 {
        (x / h, y / h)
    } else {
        (x, y)
    }
}

/// Clamped uniform knot vector for `n + 1` control points of order `k`.
fn knot_vector(n: usize, k: u32) -> Vec<u32> {
    let k = k as usize;
    (0..=n + k)
        .map(|i| {
            if i < k {
                0
            } else if i <= n {
                (i - k + 1) as u32
            } else {
                (n + 2 - k) as u32
            }
        })
        .collect()
}

/// Cox–de Boor basis function `N_{i,k}(u)` over an integer knot vector.
fn basis(i: usize, k: u32, u: f64, knots: &[u32]) -> f64 {
    if k == 1 {
        let lo = knots[i] as f64;
        let hi = knots[i + 1] as f64;
        return if u >= lo && u < hi { 1.0 } else { 0.0 };
    }
    let k = k as usize;
    let mut value = 0.0;
    let denom1 = (knots[i + k - 1] - knots[i]) as f64;
    if denom1 != 0.0 {
        value += (u - knots[i] as f64) / denom1 * basis(i, (k - 1) as u32, u, knots);
    }
    let denom2 = (knots[i + k] - knots[i + 1]) as f64;
    if denom2 != 0.0 {
        value += (knots[i + k] as f64 - u) / denom2 * basis(i + 1, (k - 1) as u32, u, knots);
    }
    value
}

/// Rational curve point at parameter `u`.
fn nurbs_point(u: f64, k: u32, control_points: &[PlaneControlPoint], knots: &[u32]) -> (f64, f64) {
    let mut x = 0.0;
    let mut y = 0.0;
    let mut den = 0.0;
    for (i, cp) in control_points.iter().enumerate() {
        let b = basis(i, k, u, knots) * cp.weight;
        x += b * cp.x;
        y += b * cp.y;
        den += b;
    }
    if den != 0.0 {
        (x / den, y / den)
    } else {
        let last = control_points[control_points.len() - 1];
        (last.x, last.y)
    }
}

impl<S: StatusSource> CanonEngine<S> {
    /// Current position expressed in program coordinates.
    fn program_position(&self) -> Pose {
        to_prog(
            self.state.unoffset_and_unrotate(self.state.end_point),
            self.state.length_units,
        )
    }

    /// Emit one arc of a biarc pair: endpoints and the start tangent
    /// determine the circle. A degenerate (straight) span falls back to a
    /// plain feed. Program-unit planar coordinates.
    fn tangent_arc(&mut self, line_number: i32, x0: f64, y0: f64, x1: f64, y1: f64, dx: f64, dy: f64) {
        let rest = self.program_position();
        let x = x1 - x0;
        let y = y1 - y0;
        let den = 2.0 * (y * dx - x * dy);
        if den.abs() > BIARC_EPSILON {
            let r = -(x * x + y * y) / den;
            let cx = x1 + dy * r;
            let cy = y1 - dx * r;
            let rotation = if r < 0.0 { 1 } else { -1 };
            self.arc_feed(
                line_number,
                x1,
                y1,
                cx,
                cy,
                rotation,
                rest.z,
                rest.a,
                rest.b,
                rest.c,
                rest.u,
                rest.v,
                rest.w,
            );
        } else {
            self.straight_feed(
                line_number,
                Pose {
                    x: x1,
                    y: y1,
                    ..rest
                },
            );
        }
    }

    /// Fit a biarc between `(p0, ts)` and `(p4, te)` and emit both arcs.
    /// Returns false when no admissible junction exists (negative
    /// discriminant, both roots positive, or parallel tangents), in which
    /// case nothing is emitted.
    #[allow(clippy::too_many_arguments)]
    fn biarc(
        &mut self,
        line_number: i32,
        p0x: f64,
        p0y: f64,
        tsx: f64,
        tsy: f64,
        p4x: f64,
        p4y: f64,
        tex: f64,
        tey: f64,
    ) -> bool {
        let r = 1.0;
        let (tsx, tsy) = normalized(tsx, tsy);
        let (tex, tey) = normalized(tex, tey);

        let vx = p0x - p4x;
        let vy = p0y - p4y;
        let c = vx * vx + vy * vy;
        let b = 2.0 * (vx * (r * tsx + tex) + vy * (r * tsy + tey));
        let a = 2.0 * r * (tsx * tex + tsy * tey - 1.0);
        if a.abs() < BIARC_EPSILON {
            return false;
        }

        let discr = b * b - 4.0 * a * c;
        if discr < 0.0 {
            return false;
        }

        let disq = discr.sqrt();
        let beta1 = (-b - disq) / 2.0 / a;
        let beta2 = (-b + disq) / 2.0 / a;
        if beta1 > 0.0 && beta2 > 0.0 {
            return false;
        }
        let beta = beta1.max(beta2);
        let alpha = beta * r;
        let ab = alpha + beta;
        let p1x = p0x + alpha * tsx;
        let p1y = p0y + alpha * tsy;
        let p3x = p4x - beta * tex;
        let p3y = p4y - beta * tey;
        let p2x = (p1x * beta + p3x * alpha) / ab;
        let p2y = (p1y * beta + p3y * alpha) / ab;
        let (tmx, tmy) = normalized(p3x - p2x, p3y - p2y);

        self.tangent_arc(line_number, p0x, p0y, p2x, p2y, tsx, tsy);
        self.tangent_arc(line_number, p2x, p2y, p4x, p4y, tmx, tmy);
        true
    }

    /// Sample a parametric planar curve at `steps` uniform parameter
    /// values and emit a biarc per span, perturbing the parameter with a
    /// bounded halving retry when a fit is rejected. On retry exhaustion
    /// the span closes with a straight feed.
    fn biarc_spans(
        &mut self,
        line_number: i32,
        steps: u32,
        start: (f64, f64),
        start_tangent: (f64, f64),
        eval: impl Fn(f64) -> (f64, f64, f64, f64),
    ) {
        let (mut ox, mut oy) = start;
        let (mut odx, mut ody) = start_tangent;

        for i in 1..=steps {
            let nominal = i as f64 / steps as f64;
            let mut t = nominal;
            let mut u = 1.0 / steps as f64;
            let mut fitted = false;
            for _ in 0..BIARC_MAX_RETRIES {
                let (x, y, dx, dy) = eval(t);
                if self.biarc(line_number, ox, oy, odx, ody, x, y, dx, dy) {
                    ox = x;
                    oy = y;
                    odx = dx;
                    ody = dy;
                    fitted = true;
                    break;
                }
                t -= u;
                u /= -2.0;
            }
            if !fitted {
                let (x, y, dx, dy) = eval(nominal);
                warn!(line = line_number, t = nominal, "biarc fit exhausted, using straight span");
                let rest = self.program_position();
                self.straight_feed(line_number, Pose { x, y, ..rest });
                ox = x;
                oy = y;
                odx = dx;
                ody = dy;
            }
        }
    }

    /// Quadratic Bézier feed through two program-unit control points,
    /// starting at the current position.
    pub fn spline_feed_quadratic(&mut self, line_number: i32, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.flush_segments();

        let start = self.program_position();
        let (x0, y0) = (start.x, start.y);
        let (xx0, xx1) = (2.0 * (x1 - x0), 2.0 * (x2 - x1));
        let (yy0, yy1) = (2.0 * (y1 - y0), 2.0 * (y2 - y1));

        self.biarc_spans(line_number, 2, (x0, y0), (xx0, yy0), |t| {
            let t0 = (1.0 - t) * (1.0 - t);
            let t1 = 2.0 * t * (1.0 - t);
            let t2 = t * t;
            let q0 = 1.0 - t;
            let q1 = t;
            (
                x0 * t0 + x1 * t1 + x2 * t2,
                y0 * t0 + y1 * t1 + y2 * t2,
                xx0 * q0 + xx1 * q1,
                yy0 * q0 + yy1 * q1,
            )
        });
    }

    /// Cubic Bézier feed through three program-unit control points,
    /// starting at the current position.
    #[allow(clippy::too_many_arguments)]
    pub fn spline_feed_cubic(
        &mut self,
        line_number: i32,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    ) {
        self.flush_segments();

        let start = self.program_position();
        let (x0, y0) = (start.x, start.y);
        let (xx0, xx1, xx2) = (3.0 * (x1 - x0), 3.0 * (x2 - x1), 3.0 * (x3 - x2));
        let (yy0, yy1, yy2) = (3.0 * (y1 - y0), 3.0 * (y2 - y1), 3.0 * (y3 - y2));

        self.biarc_spans(line_number, 4, (x0, y0), (xx0, yy0), |t| {
            let s = 1.0 - t;
            let t0 = s * s * s;
            let t1 = 3.0 * t * s * s;
            let t2 = 3.0 * t * t * s;
            let t3 = t * t * t;
            let q0 = s * s;
            let q1 = 2.0 * t * s;
            let q2 = t * t;
            (
                x0 * t0 + x1 * t1 + x2 * t2 + x3 * t3,
                y0 * t0 + y1 * t1 + y2 * t2 + y3 * t3,
                xx0 * q0 + xx1 * q1 + xx2 * q2,
                yy0 * q0 + yy1 * q1 + yy2 * q2,
            )
        });
    }

    /// Planar NURBS feed: walk the curve at a uniform parameter step and
    /// fit biarcs between successive samples, steering the junction
    /// tangent by the average heading (flipped across quadrant
    /// crossings).
    pub fn nurbs_feed(&mut self, line_number: i32, control_points: &[PlaneControlPoint], k: u32) {
        if control_points.len() < 2 {
            debug!(line = line_number, "nurbs feed needs at least two control points");
            return;
        }
        let n = control_points.len() - 1;
        let umax = n as f64 - k as f64 + 2.0;
        let du = umax / (control_points.len() * 4) as f64;
        let knots = knot_vector(n, k);

        let mut p0 = nurbs_point(0.0, k, control_points, &knots);
        let mut p1 = nurbs_point(du, k, control_points, &knots);

        let (mut dxs, mut dys) = normalized(
            control_points[1].x - control_points[0].x,
            control_points[1].y - control_points[0].y,
        );

        let mut u = du;
        while u + du <= umax {
            let p2 = nurbs_point(u + du, k, control_points, &knots);
            let alpha1 = (p1.1 - p0.1).atan2(p1.0 - p0.0); // starting direction
            let alpha2 = (p2.1 - p1.1).atan2(p2.0 - p1.0); // ending direction
            let alpha3 = (p2.1 - p0.1).atan2(p2.0 - p0.0); // chord direction

            // Desired heading at the junction; contrary to the chord it
            // means a quadrant crossing, so flip it.
            let mut alpha_m = (alpha1 + alpha2) / 2.0;
            if (alpha3.abs() - alpha_m.abs()).abs() > PI / 4.0 {
                alpha_m += PI;
            }
            let (dxe, dye) = (alpha_m.cos(), alpha_m.sin());
            self.biarc(line_number, p0.0, p0.1, dxs, dys, p1.0, p1.1, dxe, dye);
            dxs = dxe;
            dys = dye;
            p0 = p1;
            p1 = p2;
            u += du;
        }

        let last = control_points[n];
        let prev = control_points[n - 1];
        let (dxe, dye) = normalized(last.x - prev.x, last.y - prev.y);
        self.biarc(line_number, p0.0, p0.1, dxs, dys, last.x, last.y, dxe, dye);
    }

    /// Fully 3D NURBS feed: no approximation; one block-annotated message
    /// per control point, one per trailing knot, one per trailing U(L)
    /// knot.
    #[allow(clippy::too_many_arguments)]
    pub fn nurbs_feed_3d(
        &mut self,
        line_number: i32,
        control_points: &[NurbsControlPoint],
        knot_vector: &[f64],
        uofl: &[UoflBlock],
        order: u32,
        curve_length: f64,
        axis_mask: u32,
    ) {
        assert!(
            control_points.len() > 1,
            "a NURBS curve needs at least two control points"
        );
        // A NURBS stream is nothing like a point-to-point move; never fuse
        // across it.
        self.flush_segments();

        // Accumulated per-axis travel across the control polygon decides
        // the move class and which limits bound the curve.
        let mut deltas = [0.0f64; 9];
        for pair in control_points.windows(2) {
            for (axis, slot) in deltas.iter_mut().enumerate() {
                *slot += (pair[1].pos.coord(axis) - pair[0].pos.coord(axis)).abs();
            }
        }
        for (axis, slot) in deltas.iter_mut().enumerate() {
            if !self.axis_valid(axis) || *slot < TINY {
                *slot = 0.0;
            }
        }
        let cartesian = LINEAR_AXES.iter().any(|&axis| deltas[axis] > 0.0);
        let angular = ANGULAR_AXES.iter().any(|&axis| deltas[axis] > 0.0);
        assert!(
            cartesian || angular,
            "NURBS control polygon commands no motion"
        );
        self.state.cartesian_move = cartesian;
        self.state.angular_move = angular;

        let len_units = self.limits.external_length_units;
        let ang_units = self.limits.external_angle_units;
        let fold = |values: &[f64; 9], axes: &[usize]| -> f64 {
            axes.iter().fold(STATIONARY, |m, &axis| {
                if deltas[axis] > 0.0 {
                    m.min(values[axis])
                } else {
                    m
                }
            })
        };

        let mut ini_maxvel = STATIONARY;
        let mut ini_maxacc = STATIONARY;
        let mut ini_maxjerk = STATIONARY;
        if cartesian {
            ini_maxvel = ini_maxvel.min(from_ext_len(fold(&self.limits.max_velocity, &LINEAR_AXES), len_units));
            ini_maxacc =
                ini_maxacc.min(from_ext_len(fold(&self.limits.max_acceleration, &LINEAR_AXES), len_units));
            ini_maxjerk = ini_maxjerk.min(from_ext_len(fold(&self.limits.max_jerk, &LINEAR_AXES), len_units));
        }
        if angular {
            ini_maxvel = ini_maxvel.min(from_ext_ang(fold(&self.limits.max_velocity, &ANGULAR_AXES), ang_units));
            ini_maxacc =
                ini_maxacc.min(from_ext_ang(fold(&self.limits.max_acceleration, &ANGULAR_AXES), ang_units));
            ini_maxjerk = ini_maxjerk.min(from_ext_ang(fold(&self.limits.max_jerk, &ANGULAR_AXES), ang_units));
        }

        let feed = if cartesian {
            self.state.linear_feed_rate
        } else {
            self.state.angular_feed_rate
        };
        let mut vel = ini_maxvel.min(feed);

        let nr_of_ctrl_pts = control_points.len() as u32;
        let nr_of_knots = knot_vector.len() as u32;
        let nr_uofl_cp = uofl.iter().filter(|b| b.has_ctrl_pt).count();
        let nr_uofl_knots = uofl.len();

        let base_block = NurbsBlock {
            nr_of_ctrl_pts,
            nr_of_knots,
            order,
            curve_len: curve_length,
            axis_mask,
            uofl_order: 2,
            nr_of_uofl_ctrl_pts: nr_uofl_cp as u32,
            nr_of_uofl_knots: nr_uofl_knots as u32,
            ..NurbsBlock::default()
        };
        let overlay = |block: &mut NurbsBlock, i: usize| {
            if i < nr_uofl_cp {
                block.uofl_cp = uofl[i].ctrl_pt;
                block.uofl_knot = uofl[i].knot;
                block.uofl_weight = uofl[i].weight;
            } else if i < nr_uofl_knots {
                block.uofl_knot = uofl[i].knot;
            }
        };

        // Homogeneous end coordinates: the executor divides by the weight
        // when reconstructing the curve.
        let last_scaled = {
            let cp = control_points[control_points.len() - 1];
            self.program_to_internal(cp.pos).map(|_, v| v * cp.weight)
        };

        for (i, cp) in control_points.iter().enumerate() {
            let scaled = self.program_to_internal(cp.pos).map(|_, v| v * cp.weight);
            if cp.feed != -1.0 {
                vel = from_prog_len(cp.feed, self.state.length_units) / 60.0;
            }
            let mut block = NurbsBlock {
                knot: knot_vector.get(i).copied().unwrap_or(0.0),
                weight: cp.weight,
                ..base_block
            };
            overlay(&mut block, i);

            self.list.set_line_number(line_number);
            self.list.append(TrajMessage::Nurbs(NurbsMove {
                end: self.to_ext_pose(scaled),
                vel: self.to_ext_vel(vel),
                ini_maxvel: self.to_ext_vel(ini_maxvel),
                ini_maxacc: self.to_ext_acc(ini_maxacc),
                ini_maxjerk: to_ext_len(ini_maxjerk, len_units),
                feed_mode: self.state.feed_mode,
                block,
            }));
            self.state.end_point = scaled;
        }

        // Knots beyond the control points ride on the final point.
        for i in control_points.len()..knot_vector.len() {
            let mut block = NurbsBlock {
                knot: knot_vector[i],
                weight: 0.0,
                ..base_block
            };
            overlay(&mut block, i);
            self.list.set_line_number(line_number);
            self.list.append(TrajMessage::Nurbs(NurbsMove {
                end: self.to_ext_pose(last_scaled),
                vel: self.to_ext_vel(self.state.linear_feed_rate),
                ini_maxvel: self.to_ext_vel(ini_maxvel),
                ini_maxacc: self.to_ext_acc(ini_maxacc),
                ini_maxjerk: to_ext_len(ini_maxjerk, len_units),
                feed_mode: self.state.feed_mode,
                block,
            }));
            self.state.end_point = last_scaled;
        }

        // Trailing U(L) overlay knots, if the overlay outruns the curve.
        for i in knot_vector.len()..nr_uofl_knots {
            let mut block = NurbsBlock {
                knot: knot_vector.last().copied().unwrap_or(0.0),
                weight: 1.0,
                ..base_block
            };
            overlay(&mut block, i);
            self.list.set_line_number(line_number);
            self.list.append(TrajMessage::Nurbs(NurbsMove {
                end: self.to_ext_pose(last_scaled),
                vel: self.to_ext_vel(self.state.linear_feed_rate),
                ini_maxvel: self.to_ext_vel(ini_maxvel),
                ini_maxacc: self.to_ext_acc(ini_maxacc),
                ini_maxjerk: to_ext_len(ini_maxjerk, len_units),
                feed_mode: self.state.feed_mode,
                block,
            }));
            self.state.end_point = last_scaled;
        }
    }
}
