//! Synchronized and immediate I/O dispatch.
//!
//! Motion-synchronized outputs (`now = false`) take effect when the next
//! motion starts, so they flush the segment chain to pin their place in
//! the stream. Immediate (aux) outputs act right away and leave any
//! pending fused segment undisturbed.

use helix_common::canon::{InputType, WaitType};
use helix_common::consts::{MAX_ANALOG_IO, MAX_DIGITAL_IO};
use helix_common::messages::{AnalogOut, DigitalOut, InputWait, TrajMessage};
use helix_common::status::StatusSource;

use crate::engine::CanonEngine;
use crate::error::CanonError;

impl<S: StatusSource> CanonEngine<S> {
    /// Raise a digital output when the next motion starts. Only one
    /// motion-synchronized output is honored per segment downstream.
    pub fn set_motion_output_bit(&mut self, index: usize) {
        self.flush_segments();
        self.list.append(TrajMessage::SetDigitalOut(DigitalOut {
            index,
            start: true,
            end: true,
            now: false,
        }));
    }

    /// Clear a digital output when the next motion starts.
    pub fn clear_motion_output_bit(&mut self, index: usize) {
        self.flush_segments();
        self.list.append(TrajMessage::SetDigitalOut(DigitalOut {
            index,
            start: false,
            end: false,
            now: false,
        }));
    }

    /// Raise a digital output immediately.
    pub fn set_aux_output_bit(&mut self, index: usize) {
        self.list.append(TrajMessage::SetDigitalOut(DigitalOut {
            index,
            start: true,
            end: true,
            now: true,
        }));
    }

    /// Clear a digital output immediately.
    pub fn clear_aux_output_bit(&mut self, index: usize) {
        self.list.append(TrajMessage::SetDigitalOut(DigitalOut {
            index,
            start: false,
            end: false,
            now: true,
        }));
    }

    /// Drive an analog output when the next motion starts.
    pub fn set_motion_output_value(&mut self, index: usize, value: f64) {
        self.flush_segments();
        self.list.append(TrajMessage::SetAnalogOut(AnalogOut {
            index,
            start: value,
            end: value,
            now: false,
        }));
    }

    /// Drive an analog output immediately.
    pub fn set_aux_output_value(&mut self, index: usize, value: f64) {
        self.list.append(TrajMessage::SetAnalogOut(AnalogOut {
            index,
            start: value,
            end: value,
            now: true,
        }));
    }

    /// Suspend execution until the selected input satisfies `wait_type`
    /// or `timeout` seconds elapse; the wait itself is honored by the
    /// executor.
    pub fn wait(
        &mut self,
        index: usize,
        input_type: InputType,
        wait_type: WaitType,
        timeout: f64,
    ) -> Result<(), CanonError> {
        let max = match input_type {
            InputType::Digital => MAX_DIGITAL_IO,
            InputType::Analog => MAX_ANALOG_IO,
        };
        if index >= max {
            return Err(CanonError::IndexOutOfRange {
                kind: match input_type {
                    InputType::Digital => "digital input",
                    InputType::Analog => "analog input",
                },
                index,
                max,
            });
        }

        self.flush_segments();
        self.list.append(TrajMessage::WaitInput(InputWait {
            index,
            input_type,
            wait_type,
            timeout,
        }));
        Ok(())
    }

    /// Arm an input condition checked in sync with the next motion.
    pub fn set_motion_sync_input_bit(
        &mut self,
        index: usize,
        wait_type: WaitType,
        timeout: f64,
        now: bool,
    ) {
        self.flush_segments();
        self.list.append(TrajMessage::SetSyncInput {
            index,
            wait_type,
            timeout,
            now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_common::config::MachineLimits;
    use helix_common::pose::Pose;
    use helix_common::status::StatusSnapshot;

    fn engine() -> CanonEngine<StatusSnapshot> {
        CanonEngine::new(
            MachineLimits::three_axis(100.0, 1000.0, 10000.0),
            StatusSnapshot::default(),
        )
    }

    fn engine_with_pending_feed() -> CanonEngine<StatusSnapshot> {
        let mut eng = engine();
        eng.set_feed_rate(600.0);
        eng.straight_feed(
            1,
            Pose {
                x: 5.0,
                ..Pose::ZERO
            },
        );
        assert_eq!(eng.pending_segments(), 1);
        eng
    }

    #[test]
    fn motion_output_flushes_and_synchronizes() {
        let mut eng = engine_with_pending_feed();
        eng.set_motion_output_bit(2);
        assert_eq!(eng.pending_segments(), 0);
        let kinds: Vec<_> = eng.interp_list().iter().map(|e| &e.message).collect();
        assert!(matches!(kinds[0], TrajMessage::Linear(_)));
        match kinds[1] {
            TrajMessage::SetDigitalOut(d) => {
                assert_eq!(d.index, 2);
                assert!(d.start && d.end);
                assert!(!d.now);
            }
            other => panic!("expected SetDigitalOut, got {other:?}"),
        }
    }

    #[test]
    fn aux_output_is_immediate_and_does_not_flush() {
        let mut eng = engine_with_pending_feed();
        eng.set_aux_output_bit(2);
        assert_eq!(eng.pending_segments(), 1);
        match &eng.interp_list().back().unwrap().message {
            TrajMessage::SetDigitalOut(d) => assert!(d.now),
            other => panic!("expected SetDigitalOut, got {other:?}"),
        }
    }

    #[test]
    fn clear_bits_encode_zero_levels() {
        let mut eng = engine();
        eng.clear_motion_output_bit(1);
        eng.clear_aux_output_bit(1);
        let douts: Vec<_> = eng
            .interp_list()
            .iter()
            .filter_map(|e| match &e.message {
                TrajMessage::SetDigitalOut(d) => Some(*d),
                _ => None,
            })
            .collect();
        assert!(!douts[0].start && !douts[0].end && !douts[0].now);
        assert!(!douts[1].start && !douts[1].end && douts[1].now);
    }

    #[test]
    fn analog_outputs_carry_value_on_both_edges() {
        let mut eng = engine();
        eng.set_motion_output_value(0, 3.5);
        eng.set_aux_output_value(1, -2.0);
        let aouts: Vec<_> = eng
            .interp_list()
            .iter()
            .filter_map(|e| match &e.message {
                TrajMessage::SetAnalogOut(a) => Some(*a),
                _ => None,
            })
            .collect();
        assert_eq!(aouts[0].start, 3.5);
        assert_eq!(aouts[0].end, 3.5);
        assert!(!aouts[0].now);
        assert!(aouts[1].now);
    }

    #[test]
    fn wait_appends_message_and_flushes() {
        let mut eng = engine_with_pending_feed();
        eng.wait(3, InputType::Digital, WaitType::High, 2.5).unwrap();
        assert_eq!(eng.pending_segments(), 0);
        match &eng.interp_list().back().unwrap().message {
            TrajMessage::WaitInput(w) => {
                assert_eq!(w.index, 3);
                assert_eq!(w.input_type, InputType::Digital);
                assert_eq!(w.wait_type, WaitType::High);
                assert_eq!(w.timeout, 2.5);
            }
            other => panic!("expected WaitInput, got {other:?}"),
        }
    }

    #[test]
    fn wait_rejects_out_of_range_indices() {
        let mut eng = engine();
        let err = eng
            .wait(MAX_DIGITAL_IO, InputType::Digital, WaitType::Rise, 1.0)
            .unwrap_err();
        assert!(matches!(err, CanonError::IndexOutOfRange { .. }));
        let err = eng
            .wait(MAX_ANALOG_IO, InputType::Analog, WaitType::Rise, 1.0)
            .unwrap_err();
        assert!(matches!(err, CanonError::IndexOutOfRange { .. }));
        assert!(eng.interp_list().is_empty());
    }

    #[test]
    fn sync_input_message_carries_condition() {
        let mut eng = engine();
        eng.set_motion_sync_input_bit(5, WaitType::Fall, 0.5, false);
        assert!(matches!(
            eng.interp_list().back().unwrap().message,
            TrajMessage::SetSyncInput {
                index: 5,
                wait_type: WaitType::Fall,
                ..
            }
        ));
    }
}
