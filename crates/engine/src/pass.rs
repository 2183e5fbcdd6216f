use anyhow::{Context, Result};
use record::{decode_full, decode_paired, Anomaly, ElementWalker, Record, SampleClock};
use sink::{RecordSink, Summary};
use tracing::{trace, warn};

use crate::Stop;

pub(crate) struct PassOutcome {
    pub summary: Summary,
    pub anomalies: Vec<(usize, Anomaly)>,
    pub stop: Stop,
}

/// Walks `live` and feeds both row streams of every record into `sink`.
///
/// Only sink failures are returned as errors.
pub(crate) fn run<S: RecordSink>(
    live: &[u8],
    payload_size: usize,
    clock: &SampleClock,
    sink: &mut S,
) -> Result<PassOutcome> {
    let mut summary = Summary::default();
    let mut anomalies = Vec::new();
    let mut stop = Stop::Completed;

    let mut walker = ElementWalker::new(live, payload_size);
    while let Some(item) = walker.next() {
        let element = match item {
            Ok(element) => element,
            Err(reason) => {
                let offset = walker.offset();
                warn!(offset, %reason, "element walk stopped");
                stop = Stop::Halted { offset, reason };
                break;
            }
        };

        let decoded = Record::parse(element.payload).and_then(|record| {
            let full = decode_full(&record)?;
            let paired = decode_paired(&record, clock)?;
            Ok((full, paired))
        });
        let (full, paired) = match decoded {
            Ok(parts) => parts,
            Err(reason) => {
                warn!(offset = element.offset, %reason, "dropping record, stopping pass");
                stop = Stop::Halted {
                    offset: element.offset,
                    reason,
                };
                break;
            }
        };

        trace!(
            offset = element.offset,
            timestamp = element.timestamp,
            full_rows = full.rows.len(),
            paired_rows = paired.rows.len(),
            "record decoded"
        );
        for row in &full.rows {
            sink.full_row(row).context("writing full-fidelity row")?;
        }
        for row in &paired.rows {
            sink.paired_row(row).context("writing paired row")?;
        }
        summary.observe(element.timestamp);
        anomalies.extend(
            full.anomalies
                .into_iter()
                .chain(paired.anomalies)
                .map(|a| (element.offset, a)),
        );
    }

    sink.finish().context("flushing sink")?;
    Ok(PassOutcome {
        summary,
        anomalies,
        stop,
    })
}
