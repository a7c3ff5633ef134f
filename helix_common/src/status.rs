//! External status snapshot abstraction.
//!
//! The canonical layer reads live machine state (position, probed
//! position, tool table, coolant, overrides, I/O) from whoever hosts it.
//! `StatusSource` is that seam; `StatusSnapshot` is a plain-struct
//! implementation suitable for simulation hosts and tests.
//!
//! Positions are reported in external units; the engine converts.

use crate::messages::ToolTableEntry;
use crate::pose::Pose;

/// Read-only view of the executor-side machine status.
pub trait StatusSource {
    /// Current commanded position, external units.
    fn position(&self) -> Pose;

    /// Last probed position, external units.
    fn probed_position(&self) -> Pose;

    /// Whether the probe tripped during the last probing move.
    fn probe_tripped(&self) -> bool;

    /// Depth of the executor's motion queue.
    fn queue_depth(&self) -> usize;

    /// Tool currently in the spindle.
    fn tool_in_spindle(&self) -> i32;

    /// Pocket selected by the last tool-prepare.
    fn pocket_prepped(&self) -> i32;

    /// Tool table entry for `pocket`, if in range.
    fn tool_table(&self, pocket: usize) -> Option<ToolTableEntry>;

    fn mist_on(&self) -> bool;
    fn flood_on(&self) -> bool;

    /// Signed spindle speed in rpm (negative = counter-clockwise).
    fn spindle_speed(&self) -> f64;

    fn feed_override_enabled(&self) -> bool;
    fn spindle_override_enabled(&self) -> bool;
    fn adaptive_feed_enabled(&self) -> bool;
    fn feed_hold_enabled(&self) -> bool;

    /// State of a motion-synchronized digital input.
    fn digital_input(&self, index: usize) -> bool;

    /// Value of a motion-synchronized analog input.
    fn analog_input(&self, index: usize) -> f64;

    /// Whether the last input wait timed out.
    fn input_timed_out(&self) -> bool;
}

/// Owned snapshot implementing [`StatusSource`]; hosts update the fields,
/// tests construct them directly.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub position: Pose,
    pub probed_position: Pose,
    pub probe_tripped: bool,
    pub queue_depth: usize,
    pub tool_in_spindle: i32,
    pub pocket_prepped: i32,
    pub tool_table: Vec<ToolTableEntry>,
    pub mist_on: bool,
    pub flood_on: bool,
    pub spindle_speed: f64,
    pub feed_override_enabled: bool,
    pub spindle_override_enabled: bool,
    pub adaptive_feed_enabled: bool,
    pub feed_hold_enabled: bool,
    pub digital_inputs: Vec<bool>,
    pub analog_inputs: Vec<f64>,
    pub input_timed_out: bool,
}

impl StatusSource for StatusSnapshot {
    fn position(&self) -> Pose {
        self.position
    }

    fn probed_position(&self) -> Pose {
        self.probed_position
    }

    fn probe_tripped(&self) -> bool {
        self.probe_tripped
    }

    fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    fn tool_in_spindle(&self) -> i32 {
        self.tool_in_spindle
    }

    fn pocket_prepped(&self) -> i32 {
        self.pocket_prepped
    }

    fn tool_table(&self, pocket: usize) -> Option<ToolTableEntry> {
        self.tool_table.get(pocket).copied()
    }

    fn mist_on(&self) -> bool {
        self.mist_on
    }

    fn flood_on(&self) -> bool {
        self.flood_on
    }

    fn spindle_speed(&self) -> f64 {
        self.spindle_speed
    }

    fn feed_override_enabled(&self) -> bool {
        self.feed_override_enabled
    }

    fn spindle_override_enabled(&self) -> bool {
        self.spindle_override_enabled
    }

    fn adaptive_feed_enabled(&self) -> bool {
        self.adaptive_feed_enabled
    }

    fn feed_hold_enabled(&self) -> bool {
        self.feed_hold_enabled
    }

    fn digital_input(&self, index: usize) -> bool {
        self.digital_inputs.get(index).copied().unwrap_or(false)
    }

    fn analog_input(&self, index: usize) -> f64 {
        self.analog_inputs.get(index).copied().unwrap_or(0.0)
    }

    fn input_timed_out(&self) -> bool {
        self.input_timed_out
    }
}
