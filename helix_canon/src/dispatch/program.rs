//! Program flow, coolant, overrides, operator messages, and hot
//! comments.

use std::path::Path;

use helix_common::messages::TrajMessage;
use helix_common::status::StatusSource;
use tracing::debug;

use crate::engine::CanonEngine;

impl<S: StatusSource> CanonEngine<S> {
    /// Pause motion for `seconds`.
    pub fn dwell(&mut self, seconds: f64) {
        self.flush_segments();
        self.list.append(TrajMessage::Delay { seconds });
    }

    /// Pause the program; a resume continues motion.
    pub fn program_stop(&mut self) {
        self.flush_segments();
        self.list.append(TrajMessage::TaskPause);
    }

    /// Pause only when the operator has optional stops enabled.
    pub fn optional_program_stop(&mut self) {
        self.flush_segments();
        self.list.append(TrajMessage::TaskOptionalStop);
    }

    /// End the program.
    pub fn program_end(&mut self) {
        self.flush_segments();
        self.list.append(TrajMessage::TaskEnd);
    }

    // ─── Coolant ────────────────────────────────────────────────────

    pub fn flood_on(&mut self) {
        self.flush_segments();
        self.list.append(TrajMessage::FloodOn);
    }

    pub fn flood_off(&mut self) {
        self.flush_segments();
        self.list.append(TrajMessage::FloodOff);
    }

    pub fn mist_on(&mut self) {
        self.flush_segments();
        self.list.append(TrajMessage::MistOn);
    }

    pub fn mist_off(&mut self) {
        self.flush_segments();
        self.list.append(TrajMessage::MistOff);
    }

    // ─── Overrides ──────────────────────────────────────────────────

    pub fn enable_feed_override(&mut self) {
        self.flush_segments();
        self.list
            .append(TrajMessage::SetFeedOverrideEnable { enable: true });
    }

    pub fn disable_feed_override(&mut self) {
        self.flush_segments();
        self.list
            .append(TrajMessage::SetFeedOverrideEnable { enable: false });
    }

    pub fn enable_speed_override(&mut self) {
        self.flush_segments();
        self.list
            .append(TrajMessage::SetSpindleOverrideEnable { enable: true });
    }

    pub fn disable_speed_override(&mut self) {
        self.flush_segments();
        self.list
            .append(TrajMessage::SetSpindleOverrideEnable { enable: false });
    }

    /// Adaptive feed follows an executor-side input (EDM and similar).
    pub fn enable_adaptive_feed(&mut self) {
        self.flush_segments();
        self.list
            .append(TrajMessage::SetAdaptiveFeed { enable: true });
    }

    pub fn disable_adaptive_feed(&mut self) {
        self.flush_segments();
        self.list
            .append(TrajMessage::SetAdaptiveFeed { enable: false });
    }

    pub fn enable_feed_hold(&mut self) {
        self.flush_segments();
        self.list
            .append(TrajMessage::SetFeedHoldEnable { enable: true });
    }

    pub fn disable_feed_hold(&mut self) {
        self.flush_segments();
        self.list
            .append(TrajMessage::SetFeedHoldEnable { enable: false });
    }

    // ─── Probe arming ───────────────────────────────────────────────

    /// Clear the executor's probe-tripped flag ahead of a probing move.
    pub fn turn_probe_on(&mut self) {
        self.list.append(TrajMessage::ClearProbeTripped);
    }

    // ─── Operator messages & comments ───────────────────────────────

    /// Show a message to the operator, in stream order.
    pub fn message(&mut self, text: impl Into<String>) {
        self.flush_segments();
        self.list
            .append(TrajMessage::OperatorDisplay { text: text.into() });
    }

    /// Report an error to the operator, in stream order.
    pub fn operator_error(&mut self, text: impl Into<String>) {
        self.flush_segments();
        self.list
            .append(TrajMessage::OperatorError { text: text.into() });
    }

    /// Handle a program comment. Most are ignored; three hot comments
    /// act:
    ///
    /// - `RPY <r> <p> <y>` — log an orientation for subsequent moves
    /// - `PROBEOPEN <path>` — open the probe sample file
    /// - `PROBECLOSE` — close it
    pub fn comment(&mut self, text: &str) {
        if let Some(rest) = text.strip_prefix("RPY") {
            let values: Vec<f64> = rest
                .split_whitespace()
                .filter_map(|tok| tok.parse().ok())
                .collect();
            if let [r, p, y] = values.as_slice() {
                debug!(r, p, y, "orientation comment");
            } else {
                debug!(comment = text, "malformed orientation comment");
            }
            return;
        }
        if let Some(rest) = text.strip_prefix("PROBEOPEN") {
            let path = rest.trim();
            if self.probe_log.open(Path::new(path)).is_err() {
                self.message(format!("can't open probe file {path}"));
            }
            return;
        }
        if text.starts_with("PROBECLOSE") {
            self.probe_log.close();
        }
    }
}
