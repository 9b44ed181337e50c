//! Elapsed-time reporting for statements and dispatched units.

use std::time::Instant;

use chrono::{DateTime, Local};

use crate::log::LogSink;

/// Measures one statement or dispatch and writes an execution-statistics block
/// to the log sink. Reported regardless of outcome.
pub(crate) struct StopWatch {
    started: Instant,
    started_at: DateTime<Local>,
}

impl StopWatch {
    pub(crate) fn start() -> Self {
        Self {
            started: Instant::now(),
            started_at: Local::now(),
        }
    }

    pub(crate) fn report(&self, log: &mut dyn LogSink) {
        let ended_at = Local::now();
        let mut seconds = self.started.elapsed().as_secs();
        let hours = seconds / 3600;
        seconds %= 3600;
        let minutes = seconds / 60;
        seconds %= 60;
        log.info("");
        log.info("|| Execution Statistics: ");
        log.info(&format!("|| Start: {}", self.started_at.format("%Y-%m-%d %H:%M:%S")));
        log.info(&format!("|| End: {}", ended_at.format("%Y-%m-%d %H:%M:%S")));
        log.info(&format!(
            "|| Execution time: {}h {}m {}s",
            hours, minutes, seconds
        ));
        log.info("|| ---------------------------------------------------------------------");
        log.info("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::BufferLog;

    #[test]
    fn report_emits_statistics_block() {
        let watch = StopWatch::start();
        let mut log = BufferLog::new();
        watch.report(&mut log);
        assert_eq!(log.infos.len(), 7);
        assert_eq!(log.infos[1], "|| Execution Statistics: ");
        assert!(log.infos[2].starts_with("|| Start: "));
        assert!(log.infos[3].starts_with("|| End: "));
        assert_eq!(log.infos[4], "|| Execution time: 0h 0m 0s");
    }
}
