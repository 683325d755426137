//! Pivot a job table into per-group status counts.
//!
//! Groups are sorted ascending and every status is present for every group,
//! zero included, so stacked charts line up across groups.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::jobs::record::{Facet, JobStatus};
use crate::jobs::table::JobTable;

/// Counts per status in canonical order, plus rows with no status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    counts: [usize; JobStatus::ALL.len()],
    unset: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: Option<JobStatus>) {
        match status {
            Some(status) => self.counts[status.index()] += 1,
            None => self.unset += 1,
        }
    }

    pub fn get(&self, status: JobStatus) -> usize {
        self.counts[status.index()]
    }

    /// Rows whose STATUS cell was empty.
    pub fn unset(&self) -> usize {
        self.unset
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.unset
    }

    /// `(status, count)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (JobStatus, usize)> + '_ {
        JobStatus::ALL.into_iter().map(|status| (status, self.get(status)))
    }

    fn merge(&mut self, other: &StatusCounts) {
        for (total, count) in self.counts.iter_mut().zip(other.counts) {
            *total += count;
        }
        self.unset += other.unset;
    }
}

impl Serialize for StatusCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(JobStatus::ALL.len() + 1))?;
        for (status, count) in self.iter() {
            map.serialize_entry(status.as_str(), &count)?;
        }
        map.serialize_entry("unset", &self.unset)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCounts {
    pub group: String,
    pub counts: StatusCounts,
}

/// Status counts of one facet, one entry per distinct group value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub facet: Facet,
    pub groups: Vec<GroupCounts>,
    pub totals: StatusCounts,
}

impl StatusBreakdown {
    pub fn group(&self, group: &str) -> Option<&StatusCounts> {
        self.groups
            .binary_search_by(|g| g.group.as_str().cmp(group))
            .ok()
            .map(|i| &self.groups[i].counts)
    }

    pub fn get(&self, group: &str, status: JobStatus) -> Option<usize> {
        self.group(group).map(|counts| counts.get(status))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.group.as_str())
    }

    /// Counts of one status across all groups, in group order.
    pub fn series(&self, status: JobStatus) -> Vec<usize> {
        self.groups.iter().map(|g| g.counts.get(status)).collect()
    }

    /// Legend entry: the status followed by its total across groups.
    pub fn legend_label(&self, status: JobStatus) -> String {
        format!("{} ({})", status, self.totals.get(status))
    }

    pub fn to_map(&self) -> BTreeMap<String, BTreeMap<JobStatus, usize>> {
        self.groups
            .iter()
            .map(|g| (g.group.clone(), g.counts.iter().collect()))
            .collect()
    }
}

pub fn aggregate_by_status(table: &JobTable, facet: Facet) -> StatusBreakdown {
    let mut by_group: BTreeMap<&str, StatusCounts> = BTreeMap::new();
    for record in table {
        by_group
            .entry(record.facet_value(facet))
            .or_default()
            .add(record.status);
    }

    let mut totals = StatusCounts::default();
    let groups = by_group
        .into_iter()
        .map(|(group, counts)| {
            totals.merge(&counts);
            GroupCounts {
                group: group.to_string(),
                counts,
            }
        })
        .collect();

    StatusBreakdown {
        facet,
        groups,
        totals,
    }
}

/// Breakdowns for every facet in chart order.
pub fn aggregate_all(table: &JobTable) -> Vec<StatusBreakdown> {
    Facet::ALL
        .into_iter()
        .map(|facet| aggregate_by_status(table, facet))
        .collect()
}
