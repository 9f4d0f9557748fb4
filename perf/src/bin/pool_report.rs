//! Runs balanced vendor/customer contention at a few thread counts. Prints
//! one summary line per run on stderr and the full report as JSON on stdout.

use turnstile_perf::{ContentionReport, Latency, contend};

const TICKETS_PER_THREAD: u32 = 5_000;

fn cell(lat: Option<Latency>) -> String {
    match lat {
        Some(l) => format!("{:>7}/{:>7}/{:>9}", l.median_ns, l.p99_ns, l.worst_ns),
        None => "-".to_string(),
    }
}

fn main() {
    let mut reports = Vec::new();
    for pairs in [1u32, 2, 4, 8] {
        let report = ContentionReport::from(&contend(pairs, TICKETS_PER_THREAD));
        eprintln!(
            "{pairs}x{pairs}  release p50/p99/max {}  purchase p50/p99/max {}  {:>12.0} tickets/s",
            cell(report.release),
            cell(report.purchase),
            report.tickets_per_sec,
        );
        if report.refused > 0 {
            eprintln!("  {} purchases refused in a balanced run", report.refused);
        }
        reports.push(report);
    }

    match serde_json::to_string_pretty(&reports) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to encode report: {e}"),
    }
}
