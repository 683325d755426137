//! Toolkit-neutral view model of the dashboard.
//!
//! [`build_view`] is the single place where a snapshot and a facet selection
//! turn into everything a front end draws: selector options, table rows and
//! one stacked chart per facet. It holds no state and can be called for
//! every update.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::jobs::palette::{cell_rgb, status_rgb, Rgb};
use crate::jobs::{aggregate_all, Facet, FacetSelection, JobRecord, JobStatus, JobTable, StatusBreakdown};
use crate::source::Snapshot;

/// Columns shown in the job table, in display order.
pub const TABLE_COLUMNS: [&str; 5] = ["LABEL", "STATUS", "LASTMOD", "WALLTIME", "JOBID"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetOptions {
    pub projects: Vec<String>,
    pub proctypes: Vec<String>,
    pub users: Vec<String>,
}

impl FacetOptions {
    pub fn from_table(table: &JobTable) -> Self {
        Self {
            projects: table.distinct_values(Facet::Project),
            proctypes: table.distinct_values(Facet::Proctype),
            users: table.distinct_values(Facet::User),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRow {
    #[serde(flatten)]
    pub record: JobRecord,
    /// Hex background of the STATUS cell.
    pub background: String,
}

impl From<&JobRecord> for JobRow {
    fn from(record: &JobRecord) -> Self {
        Self {
            record: record.clone(),
            background: cell_rgb(record.status).hex(),
        }
    }
}

pub fn job_rows(table: &JobTable) -> Vec<JobRow> {
    table.iter().map(JobRow::from).collect()
}

/// One stacked segment across all categories of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesView {
    pub status: JobStatus,
    /// `"RUNNING (12)"`
    pub label: String,
    pub rgb: Rgb,
    pub hex: String,
    pub values: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartView {
    pub facet: Facet,
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<SeriesView>,
}

impl From<&StatusBreakdown> for ChartView {
    fn from(breakdown: &StatusBreakdown) -> Self {
        let series = JobStatus::ALL
            .into_iter()
            .map(|status| {
                let rgb = status_rgb(status);
                SeriesView {
                    status,
                    label: breakdown.legend_label(status),
                    rgb,
                    hex: rgb.hex(),
                    values: breakdown.series(status),
                }
            })
            .collect();

        Self {
            facet: breakdown.facet,
            title: format!("By {}", breakdown.facet),
            categories: breakdown.categories().map(str::to_string).collect(),
            series,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub status: JobStatus,
    pub description: &'static str,
    pub rgb: Rgb,
    pub hex: String,
}

pub fn legend() -> Vec<LegendEntry> {
    JobStatus::ALL
        .into_iter()
        .map(|status| {
            let rgb = status_rgb(status);
            LegendEntry {
                status,
                description: status.description(),
                rgb,
                hex: rgb.hex(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub fetched_at: DateTime<Utc>,
    /// Rows in the snapshot before filtering.
    pub total_rows: usize,
    pub selection: FacetSelection,
    pub options: FacetOptions,
    pub columns: [&'static str; 5],
    pub rows: Vec<JobRow>,
    pub charts: Vec<ChartView>,
    pub legend: Vec<LegendEntry>,
}

/// Selector options come from the whole snapshot so a selection never hides
/// the values needed to widen it again; rows and charts use the filtered rows.
pub fn build_view(snapshot: &Snapshot, selection: &FacetSelection) -> DashboardView {
    let options = FacetOptions::from_table(&snapshot.table);

    tracing::debug!("applying data filters");
    let filtered = snapshot.table.filter(selection);

    tracing::debug!(rows = filtered.len(), "getting job graph content");
    let charts = aggregate_all(&filtered).iter().map(ChartView::from).collect();

    DashboardView {
        fetched_at: snapshot.fetched_at,
        total_rows: snapshot.table.len(),
        selection: selection.clone(),
        options,
        columns: TABLE_COLUMNS,
        rows: job_rows(&filtered),
        charts,
        legend: legend(),
    }
}
