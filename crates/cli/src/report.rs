use std::fmt;

use engine::{DecodeReport, Stop};
use partition::Cursors;

fn timestamp(ts: Option<u32>) -> String {
    match ts {
        Some(ts) => format!("{ts} (0x{ts:08X})"),
        None => "-".to_string(),
    }
}

pub fn cursors(cursors: &Cursors) -> String {
    format!(
        "write cursor: 0x{:08X}\nread cursor:  0x{:08X}\n",
        cursors.write, cursors.read
    )
}

pub fn summary(report: &DecodeReport) -> String {
    SummaryView(report).to_string()
}

struct SummaryView<'a>(&'a DecodeReport);

impl fmt::Display for SummaryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let s = &report.summary;
        writeln!(f, "records:      {}", s.record_count)?;
        writeln!(f, "first:        {}", timestamp(s.first_timestamp))?;
        writeln!(f, "last:         {}", timestamp(s.last_timestamp))?;
        writeln!(f, "duration:     {} ms", s.duration_ms())?;
        writeln!(f, "anomalies:    {}", report.anomalies.len())?;
        for (offset, anomaly) in &report.anomalies {
            writeln!(f, "  @{offset}: {anomaly}")?;
        }
        match &report.stop {
            Stop::Completed => writeln!(f, "stop:         completed"),
            Stop::Halted { offset, reason } => {
                writeln!(f, "stop:         halted at {offset}: {reason}")
            }
        }
    }
}
