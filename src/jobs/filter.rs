use std::collections::BTreeSet;

use serde::Serialize;

use crate::jobs::record::{Facet, JobRecord};
use crate::jobs::table::JobTable;

/// Values selected per facet. An empty set places no constraint on its facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetSelection {
    pub projects: BTreeSet<String>,
    pub proctypes: BTreeSet<String>,
    pub users: BTreeSet<String>,
}

impl FacetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projects.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_proctypes<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proctypes.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_users<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn values(&self, facet: Facet) -> &BTreeSet<String> {
        match facet {
            Facet::Project => &self.projects,
            Facet::Proctype => &self.proctypes,
            Facet::User => &self.users,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.proctypes.is_empty() && self.users.is_empty()
    }

    /// True if the record passes every facet that has a selection.
    pub fn matches(&self, record: &JobRecord) -> bool {
        [Facet::Project, Facet::Proctype, Facet::User]
            .into_iter()
            .all(|facet| {
                let selected = self.values(facet);
                selected.is_empty() || selected.contains(record.facet_value(facet))
            })
    }
}

impl JobTable {
    /// Rows passing `selection`, in their original order.
    pub fn filter(&self, selection: &FacetSelection) -> JobTable {
        if selection.is_empty() {
            return self.clone();
        }
        self.iter()
            .filter(|record| selection.matches(record))
            .cloned()
            .collect()
    }
}

/// Filter with one optional selection per facet; `None` and empty both mean
/// "no constraint".
pub fn filter_jobs(
    table: &JobTable,
    projects: Option<&[String]>,
    proctypes: Option<&[String]>,
    users: Option<&[String]>,
) -> JobTable {
    let selection = FacetSelection::new()
        .with_projects(projects.unwrap_or_default().iter().cloned())
        .with_proctypes(proctypes.unwrap_or_default().iter().cloned())
        .with_users(users.unwrap_or_default().iter().cloned());

    let filtered = table.filter(&selection);
    tracing::debug!(
        rows_in = table.len(),
        rows_out = filtered.len(),
        "applied job filters"
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::record::JobStatus;

    fn record(project: &str, proctype: &str, user: &str) -> JobRecord {
        JobRecord::new(
            format!("{project}-{proctype}-{user}"),
            project,
            proctype,
            user,
            Some(JobStatus::Running),
        )
    }

    #[test]
    fn empty_selection_matches_everything() {
        let selection = FacetSelection::new();
        assert!(selection.is_empty());
        assert!(selection.matches(&record("A", "fs", "amy")));
    }

    #[test]
    fn facets_combine_with_and() {
        let selection = FacetSelection::new()
            .with_projects(["A"])
            .with_users(["amy", "bob"]);

        assert!(selection.matches(&record("A", "fs", "amy")));
        assert!(selection.matches(&record("A", "dti", "bob")));
        assert!(!selection.matches(&record("B", "fs", "amy")));
        assert!(!selection.matches(&record("A", "fs", "cat")));
    }

    #[test]
    fn filter_jobs_treats_empty_slices_as_absent() {
        let table = JobTable::new(vec![record("A", "fs", "amy"), record("B", "fs", "bob")]);
        let empty: Vec<String> = Vec::new();
        assert_eq!(filter_jobs(&table, Some(empty.as_slice()), None, Some(empty.as_slice())), table);
    }
}
