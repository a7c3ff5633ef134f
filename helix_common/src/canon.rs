//! Canonical mode enums.
//!
//! All enums use `#[repr(u8)]` for a compact, wire-friendly representation
//! and provide `from_u8` round-trips. Defaults match the state installed by
//! canonical init.

use serde::{Deserialize, Serialize};

// ─── Units & Geometry ───────────────────────────────────────────────

/// Program-side length unit. The canonical frame is always mm/degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LengthUnits {
    /// 25.4 mm per program unit.
    Inches = 0,
    /// 1 mm per program unit.
    Mm = 1,
    /// 10 mm per program unit.
    Cm = 2,
}

impl LengthUnits {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Inches),
            1 => Some(Self::Mm),
            2 => Some(Self::Cm),
            _ => None,
        }
    }

    /// Millimeters per program length unit.
    #[inline]
    pub const fn mm_per_unit(&self) -> f64 {
        match self {
            Self::Inches => crate::consts::MM_PER_INCH,
            Self::Mm => 1.0,
            Self::Cm => crate::consts::MM_PER_CM,
        }
    }
}

impl Default for LengthUnits {
    fn default() -> Self {
        Self::Mm
    }
}

/// Active arc plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Plane {
    /// Arcs in X/Y, axial motion along Z.
    Xy = 0,
    /// Arcs in Y/Z, axial motion along X.
    Yz = 1,
    /// Arcs in X/Z, axial motion along Y.
    Xz = 2,
}

impl Plane {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Xy),
            1 => Some(Self::Yz),
            2 => Some(Self::Xz),
            _ => None,
        }
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::Xy
    }
}

// ─── Motion Control ─────────────────────────────────────────────────

/// Segment termination behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotionMode {
    /// Blend through segment ends within the motion tolerance.
    Continuous = 0,
    /// Come to a full stop at every segment end.
    ExactStop = 1,
}

impl MotionMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Continuous),
            1 => Some(Self::ExactStop),
            _ => None,
        }
    }
}

impl Default for MotionMode {
    fn default() -> Self {
        Self::Continuous
    }
}

/// Feed interpretation mode. Any non-zero encoding is spindle-synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FeedMode {
    /// Feed word is 1/minutes for the whole move.
    InverseTime = 0,
    /// Feed word is length or degrees per minute, spindle-synchronized.
    UnitsPerMinute = 1,
    /// Feed word is length per spindle revolution.
    PerRevSynched = 2,
}

impl FeedMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::InverseTime),
            1 => Some(Self::UnitsPerMinute),
            2 => Some(Self::PerRevSynched),
            _ => None,
        }
    }

    /// Non-zero feed modes require spindle synchronization.
    #[inline]
    pub const fn is_synched(&self) -> bool {
        !matches!(self, Self::InverseTime)
    }
}

impl Default for FeedMode {
    fn default() -> Self {
        Self::InverseTime
    }
}

/// Termination condition carried to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TermCond {
    /// Stop at segment end.
    Stop = 0,
    /// Blend within the reported tolerance.
    Blend = 1,
}

impl TermCond {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Stop),
            1 => Some(Self::Blend),
            _ => None,
        }
    }
}

impl Default for TermCond {
    fn default() -> Self {
        Self::Blend
    }
}

/// What kind of motion a linear trajectory message represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotionType {
    /// Non-cutting rapid.
    Traverse = 0,
    /// Cutting feed.
    Feed = 1,
    /// Arc or degraded arc.
    Arc = 2,
    /// Tool-change positioning move.
    ToolChange = 3,
    /// Probing move.
    Probing = 4,
}

impl MotionType {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Traverse),
            1 => Some(Self::Feed),
            2 => Some(Self::Arc),
            3 => Some(Self::ToolChange),
            4 => Some(Self::Probing),
            _ => None,
        }
    }
}

impl Default for MotionType {
    fn default() -> Self {
        Self::Feed
    }
}

// ─── Probing & I/O ──────────────────────────────────────────────────

/// Probe move flavor (direction of approach × error requirement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProbeType {
    /// Move toward the workpiece, error if no contact.
    Toward = 0,
    /// Move toward the workpiece, no error on miss.
    TowardNoError = 1,
    /// Move away from the workpiece, error if contact never breaks.
    Away = 2,
    /// Move away from the workpiece, no error on miss.
    AwayNoError = 3,
}

impl ProbeType {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Toward),
            1 => Some(Self::TowardNoError),
            2 => Some(Self::Away),
            3 => Some(Self::AwayNoError),
            _ => None,
        }
    }
}

impl Default for ProbeType {
    fn default() -> Self {
        Self::Toward
    }
}

/// Input channel class for waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InputType {
    Digital = 0,
    Analog = 1,
}

impl InputType {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Digital),
            1 => Some(Self::Analog),
            _ => None,
        }
    }
}

impl Default for InputType {
    fn default() -> Self {
        Self::Digital
    }
}

/// Condition an input wait resolves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WaitType {
    /// Low-to-high edge.
    Rise = 0,
    /// High-to-low edge.
    Fall = 1,
    /// Level high.
    High = 2,
    /// Level low.
    Low = 3,
}

impl WaitType {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Rise),
            1 => Some(Self::Fall),
            2 => Some(Self::High),
            3 => Some(Self::Low),
            _ => None,
        }
    }
}

impl Default for WaitType {
    fn default() -> Self {
        Self::Rise
    }
}

// ─── Spindle ────────────────────────────────────────────────────────

/// Spindle rotation state as reported by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpindleDirection {
    Stopped = 0,
    Clockwise = 1,
    CounterClockwise = 2,
}

impl SpindleDirection {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Stopped),
            1 => Some(Self::Clockwise),
            2 => Some(Self::CounterClockwise),
            _ => None,
        }
    }
}

impl Default for SpindleDirection {
    fn default() -> Self {
        Self::Stopped
    }
}
