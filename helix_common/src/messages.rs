//! Trajectory messages appended to the interpreter list.
//!
//! Every message is a tagged variant with its payload; the executor
//! consumes them strictly in append order. Poses, velocities, and
//! accelerations in messages are in external units.

use serde::{Deserialize, Serialize};

use crate::canon::{FeedMode, InputType, MotionType, ProbeType, TermCond, WaitType};
use crate::pose::{Point3, Pose};

/// Straight move with fully resolved kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearMove {
    pub end: Pose,
    pub vel: f64,
    pub ini_maxvel: f64,
    pub acc: f64,
    pub ini_maxjerk: f64,
    pub feed_mode: FeedMode,
    pub motion_type: MotionType,
}

/// Circular or helical move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularMove {
    pub end: Pose,
    pub center: Point3,
    pub normal: Point3,
    /// Extra full revolutions; negative winding for reversed arcs.
    pub turn: i32,
    pub vel: f64,
    pub ini_maxvel: f64,
    pub acc: f64,
    pub ini_maxjerk: f64,
    pub feed_mode: FeedMode,
}

/// Spindle-synchronized reciprocating move; the executor returns to the
/// start point, so the canonical end point is not advanced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTap {
    pub pos: Pose,
    pub vel: f64,
    pub ini_maxvel: f64,
    pub acc: f64,
}

/// Probing move; stops on probe trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeMove {
    pub pos: Pose,
    pub vel: f64,
    pub ini_maxvel: f64,
    pub acc: f64,
    pub probe_type: ProbeType,
}

/// Ordered NURBS block metadata carried by every NURBS message of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NurbsBlock {
    pub nr_of_ctrl_pts: u32,
    pub nr_of_knots: u32,
    pub order: u32,
    pub curve_len: f64,
    pub knot: f64,
    pub weight: f64,
    pub axis_mask: u32,
    pub uofl_order: u32,
    pub nr_of_uofl_ctrl_pts: u32,
    pub nr_of_uofl_knots: u32,
    pub uofl_cp: f64,
    pub uofl_knot: f64,
    pub uofl_weight: f64,
}

/// One NURBS message: a control point or trailing knot with block metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NurbsMove {
    pub end: Pose,
    pub vel: f64,
    pub ini_maxvel: f64,
    pub ini_maxacc: f64,
    pub ini_maxjerk: f64,
    pub feed_mode: FeedMode,
    pub block: NurbsBlock,
}

/// Tool table entry (machine units throughout).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolTableEntry {
    pub toolno: i32,
    pub offset: Pose,
    pub diameter: f64,
    pub frontangle: f64,
    pub backangle: f64,
    pub orientation: i32,
}

impl ToolTableEntry {
    /// The zeroed entry returned for out-of-range pockets.
    pub fn missing() -> Self {
        Self {
            toolno: -1,
            ..Self::default()
        }
    }
}

/// Digital output request; `now` selects immediate vs. motion-synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalOut {
    pub index: usize,
    pub start: bool,
    pub end: bool,
    pub now: bool,
}

/// Analog output request; `now` selects immediate vs. motion-synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalogOut {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub now: bool,
}

/// Blocking input wait honored by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputWait {
    pub index: usize,
    pub input_type: InputType,
    pub wait_type: WaitType,
    pub timeout: f64,
}

/// Everything the canonical layer can append to the interpreter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrajMessage {
    Linear(LinearMove),
    Circular(CircularMove),
    RigidTap(RigidTap),
    Probe(ProbeMove),
    Nurbs(NurbsMove),
    SetTermCond { cond: TermCond, tolerance: f64 },
    SetOrigin { origin: Pose },
    SetRotation { rotation: f64 },
    SetToolOffset { offset: Pose },
    SetSpindleSync { feed_per_revolution: f64, velocity_mode: bool },
    SpindleOn { speed: f64, css_factor: f64, x_offset: f64 },
    SpindleSpeed { speed: f64, css_factor: f64, x_offset: f64 },
    SpindleOff,
    FloodOn,
    FloodOff,
    MistOn,
    MistOff,
    ToolLoad,
    ToolPrepare { pocket: i32 },
    ToolSetNumber { tool: i32 },
    ToolSetOffset { pocket: i32, entry: ToolTableEntry },
    Delay { seconds: f64 },
    TaskPause,
    TaskOptionalStop,
    TaskEnd,
    OperatorDisplay { text: String },
    OperatorError { text: String },
    SetFeedOverrideEnable { enable: bool },
    SetSpindleOverrideEnable { enable: bool },
    SetAdaptiveFeed { enable: bool },
    SetFeedHoldEnable { enable: bool },
    SetDigitalOut(DigitalOut),
    SetAnalogOut(AnalogOut),
    SetSyncInput { index: usize, wait_type: WaitType, timeout: f64, now: bool },
    WaitInput(InputWait),
    ClearProbeTripped,
}

// ─── Upstream curve argument types ──────────────────────────────────

/// Planar NURBS/spline control point (program units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneControlPoint {
    pub x: f64,
    pub y: f64,
    /// Rational weight.
    pub weight: f64,
}

/// Full 3D NURBS control point (program units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NurbsControlPoint {
    pub pos: Pose,
    /// Rational weight.
    pub weight: f64,
    /// Per-point feed word in program units/minute, `-1.0` to inherit.
    pub feed: f64,
}

/// U(L) overlay block accompanying a 3D NURBS curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UoflBlock {
    pub has_ctrl_pt: bool,
    pub has_knot: bool,
    pub ctrl_pt: f64,
    pub knot: f64,
    pub weight: f64,
}
