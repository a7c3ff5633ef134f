//! Spindle dispatch: on/off/speed, constant surface speed, and
//! speed-feed synchronization.
//!
//! With CSS active (`css_maximum > 0`) every spindle command carries the
//! CSS cap, the surface-speed numerator, and the work-origin-adjusted X
//! offset so the executor can servo rpm against tool radius. The
//! numerator is `±25.4·12/(2π)·S` for inch programs and `±1000/(2π)·S`
//! for mm programs; direction selects the sign.

use std::f64::consts::PI;

use helix_common::canon::LengthUnits;
use helix_common::consts::MM_PER_INCH;
use helix_common::messages::TrajMessage;
use helix_common::status::StatusSource;

use crate::engine::CanonEngine;
use crate::xform::{from_prog_len, to_ext_len};

fn css_numerator(spindle_speed: f64, units: LengthUnits, clockwise: bool) -> f64 {
    let magnitude = match units {
        LengthUnits::Inches => MM_PER_INCH * 12.0 / (2.0 * PI) * spindle_speed,
        _ => 1000.0 / (2.0 * PI) * spindle_speed,
    };
    if clockwise {
        magnitude
    } else {
        -magnitude
    }
}

impl<S: StatusSource> CanonEngine<S> {
    /// Arm constant-surface-speed mode with the given rpm cap; zero
    /// disarms. Takes effect on the next spindle command.
    pub fn set_spindle_mode(&mut self, css_maximum: f64) {
        self.state.css_maximum = css_maximum;
    }

    /// Work-origin-adjusted X offset for CSS messages, external units.
    fn css_x_offset(&self) -> f64 {
        to_ext_len(
            self.state.program_origin.x + self.state.tool_offset.x,
            self.limits.external_length_units,
        )
    }

    /// The speed message reflecting current CSS bookkeeping; used by
    /// origin and tool-offset changes while CSS is active.
    pub(crate) fn css_speed_message(&self) -> TrajMessage {
        TrajMessage::SpindleSpeed {
            speed: self.state.css_maximum,
            css_factor: self.state.css_numerator,
            x_offset: self.css_x_offset(),
        }
    }

    fn spindle_start(&mut self, clockwise: bool) {
        self.flush_segments();

        let msg = if self.state.css_maximum != 0.0 {
            self.state.css_numerator =
                css_numerator(self.state.spindle_speed, self.state.length_units, clockwise);
            TrajMessage::SpindleOn {
                speed: self.state.css_maximum,
                css_factor: self.state.css_numerator,
                x_offset: self.css_x_offset(),
            }
        } else {
            self.state.css_numerator = 0.0;
            TrajMessage::SpindleOn {
                speed: if clockwise {
                    self.state.spindle_speed
                } else {
                    -self.state.spindle_speed
                },
                css_factor: 0.0,
                x_offset: 0.0,
            }
        };
        self.list.append(msg);
    }

    /// Start the spindle clockwise at the programmed speed.
    pub fn start_spindle_clockwise(&mut self) {
        self.spindle_start(true);
    }

    /// Start the spindle counter-clockwise at the programmed speed.
    pub fn start_spindle_counterclockwise(&mut self) {
        self.spindle_start(false);
    }

    /// Program a new spindle speed (rpm) and notify the executor.
    pub fn set_spindle_speed(&mut self, rpm: f64) {
        self.state.spindle_speed = rpm;
        self.flush_segments();

        let msg = if self.state.css_maximum != 0.0 {
            self.state.css_numerator =
                css_numerator(self.state.spindle_speed, self.state.length_units, true);
            self.css_speed_message()
        } else {
            self.state.css_numerator = 0.0;
            TrajMessage::SpindleSpeed {
                speed: self.state.spindle_speed,
                css_factor: 0.0,
                x_offset: 0.0,
            }
        };
        self.list.append(msg);
    }

    /// Stop spindle rotation.
    pub fn stop_spindle_turning(&mut self) {
        self.flush_segments();
        self.list.append(TrajMessage::SpindleOff);
    }

    /// Arm spindle-synchronized feed at `feed_per_revolution` program
    /// length units per spindle revolution.
    pub fn start_speed_feed_synch(&mut self, feed_per_revolution: f64, velocity_mode: bool) {
        self.flush_segments();
        let per_rev = to_ext_len(
            from_prog_len(feed_per_revolution, self.state.length_units),
            self.limits.external_length_units,
        );
        self.list.append(TrajMessage::SetSpindleSync {
            feed_per_revolution: per_rev,
            velocity_mode,
        });
        self.state.synched = true;
    }

    /// Disarm spindle-synchronized feed.
    pub fn stop_speed_feed_synch(&mut self) {
        self.flush_segments();
        self.list.append(TrajMessage::SetSpindleSync {
            feed_per_revolution: 0.0,
            velocity_mode: false,
        });
        self.state.synched = false;
    }
}
