use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::DashError;

/// Lifecycle stage of a cluster job.
///
/// Declaration order is the canonical stacking order used by every chart,
/// so the derived `Ord` sorts statuses the way they are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobStatus {
    Unknown,
    Failed,
    Complete,
    Running,
    Pending,
    Waiting,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Unknown,
        JobStatus::Failed,
        JobStatus::Complete,
        JobStatus::Running,
        JobStatus::Pending,
        JobStatus::Waiting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Unknown => "UNKNOWN",
            JobStatus::Failed => "FAILED",
            JobStatus::Complete => "COMPLETE",
            JobStatus::Running => "RUNNING",
            JobStatus::Pending => "PENDING",
            JobStatus::Waiting => "WAITING",
        }
    }

    /// Position in [`JobStatus::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Legend text shown under the charts.
    pub fn description(&self) -> &'static str {
        match self {
            JobStatus::Unknown => "status is ambiguous or incomplete",
            JobStatus::Failed => "job has failed, but has not yet been uploaded",
            JobStatus::Complete => "job has finished, but not yet been uploaded",
            JobStatus::Running => "job is currently running on the cluster",
            JobStatus::Pending => "job has been submitted, but is not yet running",
            JobStatus::Waiting => "job has been built, but is not yet submitted",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Parse the STATUS cell of table row `row`. The empty string means the job
/// has no status yet; anything but the six exact names is rejected.
pub fn parse_status(row: usize, value: &str) -> Result<Option<JobStatus>, DashError> {
    if value.is_empty() {
        return Ok(None);
    }
    JobStatus::ALL
        .into_iter()
        .find(|status| status.as_str() == value)
        .map(Some)
        .ok_or_else(|| DashError::InvalidStatus {
            row,
            value: value.to_string(),
        })
}

// STATUS column: `None` is written as `""`.
fn serialize_status_cell<S: Serializer>(
    status: &Option<JobStatus>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.map(|s| s.as_str()).unwrap_or(""))
}

/// One row of the job queue snapshot. Rows are only built from source data
/// by [`JobTable::from_json_value`](crate::jobs::JobTable::from_json_value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct JobRecord {
    pub label: String,
    pub project: String,
    pub proctype: String,
    pub user: String,
    #[serde(serialize_with = "serialize_status_cell")]
    pub status: Option<JobStatus>,
    pub lastmod: String,
    pub walltime: String,
    pub jobid: String,
}

impl JobRecord {
    pub fn new(
        label: impl Into<String>,
        project: impl Into<String>,
        proctype: impl Into<String>,
        user: impl Into<String>,
        status: Option<JobStatus>,
    ) -> Self {
        Self {
            label: label.into(),
            project: project.into(),
            proctype: proctype.into(),
            user: user.into(),
            status,
            lastmod: String::new(),
            walltime: String::new(),
            jobid: String::new(),
        }
    }

    pub fn with_times(mut self, lastmod: impl Into<String>, walltime: impl Into<String>) -> Self {
        self.lastmod = lastmod.into();
        self.walltime = walltime.into();
        self
    }

    pub fn with_jobid(mut self, jobid: impl Into<String>) -> Self {
        self.jobid = jobid.into();
        self
    }

    pub fn facet_value(&self, facet: Facet) -> &str {
        match facet {
            Facet::Project => &self.project,
            Facet::Proctype => &self.proctype,
            Facet::User => &self.user,
        }
    }
}

/// A filterable dimension of the job table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Project,
    Proctype,
    User,
}

impl Facet {
    /// Chart order of the per-facet summaries.
    pub const ALL: [Facet; 3] = [Facet::User, Facet::Project, Facet::Proctype];

    pub fn column(&self) -> &'static str {
        match self {
            Facet::Project => "PROJECT",
            Facet::Proctype => "PROCTYPE",
            Facet::User => "USER",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Facet {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "project" | "proj" => Ok(Facet::Project),
            "proctype" | "proc" => Ok(Facet::Proctype),
            "user" => Ok(Facet::User),
            _ => Err(DashError::UnknownFacet(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_order_is_canonical_not_alphabetical() {
        let mut statuses = vec![JobStatus::Waiting, JobStatus::Complete, JobStatus::Unknown];
        statuses.sort();
        assert_eq!(
            statuses,
            vec![JobStatus::Unknown, JobStatus::Complete, JobStatus::Waiting]
        );
        for (i, status) in JobStatus::ALL.iter().enumerate() {
            assert_eq!(status.index(), i);
        }
    }

    #[test]
    fn status_parse() {
        assert_eq!(parse_status(0, "RUNNING").unwrap(), Some(JobStatus::Running));
        assert_eq!(parse_status(0, "").unwrap(), None);
        assert_eq!(parse_status(3, "FAILED").unwrap(), Some(JobStatus::Failed));
    }

    #[test]
    fn status_parse_error_names_the_row() {
        match parse_status(7, "running") {
            Err(DashError::InvalidStatus { row, value }) => {
                assert_eq!(row, 7);
                assert_eq!(value, "running");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn record_json_uses_column_names() {
        let record = JobRecord::new("s1-fs", "A", "FS7_v1", "alice", None).with_jobid("123");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["LABEL"], "s1-fs");
        assert_eq!(json["PROCTYPE"], "FS7_v1");
        assert_eq!(json["STATUS"], "");
        assert_eq!(json["JOBID"], "123");
    }

    #[test]
    fn facet_parse() {
        assert_eq!("project".parse::<Facet>().unwrap(), Facet::Project);
        assert_eq!("PROCTYPE".parse::<Facet>().unwrap(), Facet::Proctype);
        assert_eq!("User".parse::<Facet>().unwrap(), Facet::User);
        assert!(matches!(
            "status".parse::<Facet>(),
            Err(DashError::UnknownFacet(_))
        ));
    }
}
