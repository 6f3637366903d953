use bhavscan_core::RunReport;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(report: &RunReport, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(report)?
            } else {
                serde_json::to_string(report)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(report)),
    }

    Ok(())
}

fn render_table(report: &RunReport) -> String {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push('\n');
    };

    line(format!("run_id      : {}", report.run_id));
    line(format!("started_at  : {}", report.started_at));
    if !report.data_found {
        line(String::from("data        : DATA folder not found"));
        return out;
    }

    line(format!(
        "ingested    : {}/{} raw files",
        report.ingest.produced.len(),
        report.ingest.scanned
    ));
    line(format!(
        "routed      : {} files ({} pruned)",
        report.routing.routed_files,
        report.routing.pruned.len()
    ));

    line(String::from("buckets:"));
    for outcome in &report.buckets {
        if !outcome.present {
            line(format!("  {:<9} missing", outcome.bucket.as_str()));
            continue;
        }

        let ledger = outcome.aggregate.as_ref().map_or_else(
            || String::from("-"),
            |aggregate| format!("{} rows", aggregate.ledger_rows),
        );
        let watchlists = outcome.watchlists.as_ref().map_or_else(
            || String::from("skipped"),
            |watchlists| {
                watchlists
                    .written
                    .iter()
                    .map(|written| {
                        format!("{}/{}={}", written.order, written.condition, written.rows)
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            },
        );
        line(format!(
            "  {:<9} ledger {ledger}; watchlists {watchlists}",
            outcome.bucket.as_str()
        ));
        for error in &outcome.errors {
            line(format!("    ! {error}"));
        }
    }

    let failures: Vec<_> = report
        .ingest
        .failures
        .iter()
        .chain(&report.routing.failures)
        .chain(
            report
                .buckets
                .iter()
                .filter_map(|outcome| outcome.aggregate.as_ref())
                .flat_map(|aggregate| &aggregate.failures),
        )
        .collect();
    if !failures.is_empty() {
        line(String::from("failures:"));
        for failure in failures {
            line(format!("  - {} [{}]: {}", failure.file, failure.code, failure.message));
        }
    }

    out
}
