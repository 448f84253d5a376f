//! C8 solution CSV writer (Section 6): a summary block followed by
//! three named, blank-line-terminated breakdown blocks. Deliberately
//! independent of `co2net-algo`'s [`MilpSolution`] type — the CLI
//! assembles these plain row structs from a solved model so this
//! crate never needs a dependency on the solver stage.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use co2net_core::units::{DollarsM, MtCo2, MtCo2PerYear};
use co2net_core::{PlannerError, PlannerResult};
use csv::WriterBuilder;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolutionSummary {
    pub duration_years: f64,
    pub capital_recovery_factor: f64,
    pub target: MtCo2PerYear,
    pub actual_capture: MtCo2PerYear,
    pub actual_storage: MtCo2,
    pub capture_cost: DollarsM,
    pub transport_cost: DollarsM,
    pub storage_cost: DollarsM,
}

#[derive(Debug, Clone)]
pub struct SourceRow {
    pub id: String,
    pub captured: MtCo2PerYear,
    pub cost: DollarsM,
}

#[derive(Debug, Clone)]
pub struct SinkRow {
    pub id: String,
    pub injected: MtCo2,
    pub cost: DollarsM,
}

#[derive(Debug, Clone)]
pub struct PipelineRow {
    pub from: String,
    pub to: String,
    pub flow: MtCo2PerYear,
    pub cost: DollarsM,
}

/// Convenience wrapper that opens `path` and writes the full solution.
pub fn write_solution_file(
    path: &Path,
    summary: &SolutionSummary,
    sources: &[SourceRow],
    sinks: &[SinkRow],
    pipelines: &[PipelineRow],
) -> PlannerResult<()> {
    let file = File::create(path)?;
    write_solution_csv(file, summary, sources, sinks, pipelines)
}

pub fn write_solution_csv<W: Write>(
    writer: W,
    summary: &SolutionSummary,
    sources: &[SourceRow],
    sinks: &[SinkRow],
    pipelines: &[PipelineRow],
) -> PlannerResult<()> {
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);

    record(&mut wtr, &["Duration (years)", &summary.duration_years.to_string()])?;
    record(&mut wtr, &["Capital Recovery Factor", &summary.capital_recovery_factor.to_string()])?;
    record(&mut wtr, &["Annual Capture Target (MtCO2/yr)", &fmt(summary.target.value())])?;
    record(&mut wtr, &["Actual Annual Capture (MtCO2/yr)", &fmt(summary.actual_capture.value())])?;
    record(&mut wtr, &["Total Storage (MtCO2)", &fmt(summary.actual_storage.value())])?;
    record(&mut wtr, &["Capture Cost ($M)", &fmt(summary.capture_cost.value())])?;
    record(&mut wtr, &["Transport Cost ($M)", &fmt(summary.transport_cost.value())])?;
    record(&mut wtr, &["Storage Cost ($M)", &fmt(summary.storage_cost.value())])?;
    blank(&mut wtr)?;

    record(&mut wtr, &["CO2 CAPTURE SOURCES SOLUTION BREAKDOWN"])?;
    record(&mut wtr, &["Source ID", "Captured (MtCO2/yr)", "Cost ($M)"])?;
    for row in sources {
        record(&mut wtr, &[row.id.as_str(), &fmt(row.captured.value()), &fmt(row.cost.value())])?;
    }
    blank(&mut wtr)?;

    record(&mut wtr, &["CO2 STORAGE SINKS SOLUTION BREAKDOWN"])?;
    record(&mut wtr, &["Sink ID", "Injected (MtCO2)", "Cost ($M)"])?;
    for row in sinks {
        record(&mut wtr, &[row.id.as_str(), &fmt(row.injected.value()), &fmt(row.cost.value())])?;
    }
    blank(&mut wtr)?;

    record(&mut wtr, &["CO2 TRANSPORT PIPELINES SOLUTION BREAKDOWN"])?;
    record(&mut wtr, &["From", "To", "Flow (MtCO2/yr)", "Cost ($M)"])?;
    for row in pipelines {
        record(&mut wtr, &[row.from.as_str(), row.to.as_str(), &fmt(row.flow.value()), &fmt(row.cost.value())])?;
    }
    blank(&mut wtr)?;

    wtr.flush()?;
    info!(sources = sources.len(), sinks = sinks.len(), pipelines = pipelines.len(), "wrote solution CSV");
    Ok(())
}

fn fmt(value: f64) -> String {
    format!("{value:.4}")
}

fn record<W: Write>(wtr: &mut csv::Writer<W>, fields: &[&str]) -> PlannerResult<()> {
    wtr.write_record(fields)
        .map_err(|e| PlannerError::Parse(e.to_string()))
}

fn blank<W: Write>(wtr: &mut csv::Writer<W>) -> PlannerResult<()> {
    wtr.write_record([""]).map_err(|e| PlannerError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_summary_and_named_blocks() {
        let summary = SolutionSummary {
            duration_years: 10.0,
            capital_recovery_factor: 0.1,
            target: MtCo2PerYear(1.0),
            actual_capture: MtCo2PerYear(1.0),
            actual_storage: MtCo2(10.0),
            capture_cost: DollarsM(1.0),
            transport_cost: DollarsM(0.5),
            storage_cost: DollarsM(0.2),
        };
        let sources = vec![SourceRow { id: "source_s1".into(), captured: MtCo2PerYear(1.0), cost: DollarsM(1.0) }];
        let sinks = vec![SinkRow { id: "sink_k1".into(), injected: MtCo2(10.0), cost: DollarsM(0.2) }];
        let pipelines = vec![PipelineRow {
            from: "source_s1".into(),
            to: "sink_k1".into(),
            flow: MtCo2PerYear(1.0),
            cost: DollarsM(0.5),
        }];

        let mut buf = Vec::new();
        write_solution_csv(&mut buf, &summary, &sources, &sinks, &pipelines).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("CO2 CAPTURE SOURCES SOLUTION BREAKDOWN"));
        assert!(text.contains("CO2 STORAGE SINKS SOLUTION BREAKDOWN"));
        assert!(text.contains("CO2 TRANSPORT PIPELINES SOLUTION BREAKDOWN"));
        assert!(text.contains("source_s1"));
        assert!(text.contains("sink_k1"));
    }
}
