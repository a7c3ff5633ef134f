//! Probe sample log file.
//!
//! Opened by the `PROBEOPEN <path>` hot comment, closed by `PROBECLOSE`.
//! Each *changed* probed sample appends one line of nine space-separated
//! program-unit coordinates.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use helix_common::pose::Pose;
use tracing::warn;

/// File sink for probed positions.
#[derive(Debug, Default)]
pub struct ProbeLog {
    writer: Option<BufWriter<File>>,
    last_logged: Option<Pose>,
}

impl ProbeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a probe file is currently open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Open (truncating) the probe file. Replaces any open file.
    pub fn open(&mut self, path: &Path) -> io::Result<()> {
        self.close();
        match File::create(path) {
            Ok(file) => {
                self.writer = Some(BufWriter::new(file));
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open probe file");
                Err(e)
            }
        }
    }

    /// Close the probe file if open.
    pub fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
        self.last_logged = None;
    }

    /// Record one probed sample (program units). Repeated identical samples
    /// are logged once.
    pub fn record(&mut self, position: &Pose) {
        if self.last_logged.as_ref() == Some(position) {
            return;
        }
        if let Some(writer) = self.writer.as_mut() {
            let result = writeln!(
                writer,
                "{:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
                position.x,
                position.y,
                position.z,
                position.a,
                position.b,
                position.c,
                position.u,
                position.v,
                position.w
            )
            .and_then(|_| writer.flush());
            if let Err(e) = result {
                warn!(error = %e, "probe file write failed");
            }
            self.last_logged = Some(*position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn records_changed_samples_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probe.txt");
        let mut log = ProbeLog::new();
        log.open(&path).unwrap();

        let p1 = Pose {
            x: 1.5,
            ..Pose::ZERO
        };
        let p2 = Pose {
            x: 2.5,
            ..Pose::ZERO
        };
        log.record(&p1);
        log.record(&p1); // duplicate, skipped
        log.record(&p2);
        log.close();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1.500000 "));
        assert!(lines[1].starts_with("2.500000 "));
        assert_eq!(lines[0].split_whitespace().count(), 9);
    }

    #[test]
    fn record_without_open_is_a_noop() {
        let mut log = ProbeLog::new();
        log.record(&Pose::ZERO);
        assert!(!log.is_open());
    }

    #[test]
    fn open_failure_reports() {
        let mut log = ProbeLog::new();
        let result = log.open(Path::new("/nonexistent-dir/probe.txt"));
        assert!(result.is_err());
        assert!(!log.is_open());
    }

    #[test]
    fn reopen_resets_change_tracking() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probe.txt");
        let mut log = ProbeLog::new();
        let p = Pose {
            y: 4.0,
            ..Pose::ZERO
        };

        log.open(&path).unwrap();
        log.record(&p);
        log.close();

        log.open(&path).unwrap();
        log.record(&p); // same pose, fresh file: logged again
        log.close();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
