//! The canonical engine.
//!
//! One `CanonEngine` owns the world state, the segment fusion chain, the
//! interpreter list, the cached axis limits, the external status view,
//! and the probe log. All dispatch entry points are methods; everything
//! runs synchronously on the caller.

use helix_common::canon::{LengthUnits, MotionMode, MotionType};
use helix_common::config::MachineLimits;
use helix_common::consts::MM_PER_INCH;
use helix_common::messages::{LinearMove, TrajMessage};
use helix_common::pose::Pose;
use helix_common::status::StatusSource;
use tracing::debug;

use crate::envelope::{straight_envelope, MoveKind, StraightEnvelope};
use crate::list::InterpList;
use crate::probe_log::ProbeLog;
use crate::segments::{SegmentChain, SegmentPoint};
use crate::state::CanonState;
use crate::xform::{from_prog, to_ext, to_ext_ang, to_ext_len};

/// The canonical motion front-end.
///
/// Generic over the status seam so hosts plug in their live status and
/// tests use [`helix_common::status::StatusSnapshot`].
pub struct CanonEngine<S: StatusSource> {
    pub(crate) state: CanonState,
    pub(crate) chain: SegmentChain,
    pub(crate) list: InterpList,
    pub(crate) limits: MachineLimits,
    pub(crate) status: S,
    pub(crate) probe_log: ProbeLog,
}

impl<S: StatusSource> CanonEngine<S> {
    /// Build an engine over validated machine limits and a status view.
    /// The canonical state starts at defaults; call
    /// [`init_canon`](Self::init_canon) before interpreting a program.
    pub fn new(limits: MachineLimits, status: S) -> Self {
        Self {
            state: CanonState::new(),
            chain: SegmentChain::new(),
            list: InterpList::new(),
            limits,
            status,
            probe_log: ProbeLog::new(),
        }
    }

    /// Read access to the canonical state.
    pub fn state(&self) -> &CanonState {
        &self.state
    }

    /// Read access to the interpreter list.
    pub fn interp_list(&self) -> &InterpList {
        &self.list
    }

    /// Consumer access to the interpreter list.
    pub fn interp_list_mut(&mut self) -> &mut InterpList {
        &mut self.list
    }

    /// The status view.
    pub fn status(&self) -> &S {
        &self.status
    }

    /// Mutable status view (simulation hosts and tests).
    pub fn status_mut(&mut self) -> &mut S {
        &mut self.status
    }

    /// The cached limit table.
    pub fn limits(&self) -> &MachineLimits {
        &self.limits
    }

    /// Install a new limit table. Takes full effect with the next
    /// dispatch; pair with [`init_canon`](Self::init_canon) on
    /// configuration reload.
    pub fn set_machine_limits(&mut self, limits: MachineLimits) {
        self.limits = limits;
    }

    /// Number of points pending in the fusion chain.
    pub fn pending_segments(&self) -> usize {
        self.chain.len()
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Reset the canonical state and clear the segment chain.
    ///
    /// Installs the XY plane, continuous motion with zero tolerance
    /// (which appends a term-cond message, as the executor must observe
    /// the reset in order), zero naive-cam tolerance, and a program unit
    /// derived from the external length units: an external scale near
    /// 1/25.4 selects inches, near 1.0 selects mm, and anything else is
    /// reported to the operator and coerced to mm.
    pub fn init_canon(&mut self) {
        self.chain.clear();
        self.state = CanonState::new();

        self.set_motion_control_mode(MotionMode::Continuous, 0.0);
        self.set_naivecam_tolerance(0.0);

        let units = self.limits.external_length_units;
        self.state.length_units = if (units - 1.0 / MM_PER_INCH).abs() < 1.0e-3 {
            LengthUnits::Inches
        } else if (units - 1.0).abs() < 1.0e-3 {
            LengthUnits::Mm
        } else {
            self.operator_error("non-standard length units, setting interpreter to mm");
            LengthUnits::Mm
        };
    }

    /// Flush any pending fused segment; called at program end.
    pub fn finish(&mut self) {
        self.flush_segments();
    }

    /// Force the canonical end point from program-unit coordinates
    /// (run-from-line skipping).
    pub fn update_end_point(&mut self, pose: Pose) {
        self.state.end_point = from_prog(pose, self.state.length_units);
    }

    // ─── Shared helpers ─────────────────────────────────────────────

    /// Program-unit pose → fully transformed internal target.
    pub(crate) fn program_to_internal(&self, pose: Pose) -> Pose {
        self.state
            .rotate_and_offset(from_prog(pose, self.state.length_units))
    }

    /// Internal pose → external message pose.
    pub(crate) fn to_ext_pose(&self, pose: Pose) -> Pose {
        to_ext(
            pose,
            self.limits.external_length_units,
            self.limits.external_angle_units,
        )
    }

    /// Internal velocity → external, in the units of the last-classified
    /// move (angle units only for a pure rotary move).
    pub(crate) fn to_ext_vel(&self, vel: f64) -> f64 {
        if !self.state.cartesian_move && self.state.angular_move {
            to_ext_ang(vel, self.limits.external_angle_units)
        } else {
            to_ext_len(vel, self.limits.external_length_units)
        }
    }

    /// Internal acceleration → external; same unit rules as velocity.
    #[inline]
    pub(crate) fn to_ext_acc(&self, acc: f64) -> f64 {
        self.to_ext_vel(acc)
    }

    /// Derive the straight envelope to `target` and install the move
    /// classification flags.
    pub(crate) fn classify_straight(&mut self, target: &Pose) -> StraightEnvelope {
        let env = straight_envelope(target, &self.state, &self.limits);
        self.state.cartesian_move = env.cartesian;
        self.state.angular_move = env.angular;
        env
    }

    /// Clamp an envelope velocity by the programmed feed of the move
    /// category.
    pub(crate) fn feed_clamped(&self, env: &StraightEnvelope) -> f64 {
        match env.kind() {
            MoveKind::Linear | MoveKind::Combined => {
                env.max_velocity.min(self.state.linear_feed_rate)
            }
            MoveKind::Angular => env.max_velocity.min(self.state.angular_feed_rate),
            MoveKind::Degenerate => env.max_velocity,
        }
    }

    // ─── Segment fusion ─────────────────────────────────────────────

    /// Offer a feed end point (internal units) to the fusion chain,
    /// flushing first when it cannot link. A point that changes any
    /// rotary or auxiliary coordinate is pushed and flushed immediately:
    /// fusion is a pure XYZ optimization.
    pub(crate) fn see_segment(&mut self, line_number: i32, pos: Pose) {
        let end = self.state.end_point;
        let changed_abc = pos.a != end.a || pos.b != end.b || pos.c != end.c;
        let changed_uvw = pos.u != end.u || pos.v != end.v || pos.w != end.w;

        let fusion_enabled = self.state.motion_mode == MotionMode::Continuous
            && self.state.naivecam_tolerance > 0.0;
        if !self.chain.is_empty()
            && !self
                .chain
                .linkable(&end, &pos, fusion_enabled, self.state.naivecam_tolerance)
        {
            self.flush_segments();
        }

        self.chain.push(SegmentPoint { pos, line_number });
        if changed_abc || changed_uvw {
            self.flush_segments();
        }
    }

    /// Emit a single feed move to the last chained point and clear the
    /// chain. Idempotent: an empty chain flushes to nothing.
    pub(crate) fn flush_segments(&mut self) {
        let Some(back) = self.chain.last().copied() else {
            return;
        };
        let target = back.pos;

        debug!(
            line = back.line_number,
            points = self.chain.len(),
            "flushing fused segment chain"
        );

        let env = self.classify_straight(&target);
        let ini_maxvel = env.max_velocity;
        let vel = self.feed_clamped(&env);
        let acc = env.max_acceleration;

        let msg = LinearMove {
            end: self.to_ext_pose(target),
            vel: self.to_ext_vel(vel),
            ini_maxvel: self.to_ext_vel(ini_maxvel),
            acc: self.to_ext_acc(acc),
            ini_maxjerk: to_ext_len(env.max_jerk, self.limits.external_length_units),
            feed_mode: self.state.feed_mode,
            motion_type: MotionType::Feed,
        };

        if (vel != 0.0 && acc != 0.0) || self.state.synched {
            self.list.set_line_number(back.line_number);
            self.list.append(TrajMessage::Linear(msg));
        }
        self.state.end_point = target;
        self.chain.clear();
    }

    /// Whether the axis participates in envelope computation.
    #[inline]
    pub(crate) fn axis_valid(&self, axis: usize) -> bool {
        self.limits.axis_mask.has_axis(axis)
    }
}
