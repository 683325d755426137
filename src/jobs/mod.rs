pub mod aggregate;
pub mod filter;
pub mod palette;
pub mod record;
pub mod table;

pub use aggregate::{aggregate_all, aggregate_by_status, StatusBreakdown, StatusCounts};
pub use filter::{filter_jobs, FacetSelection};
pub use record::{Facet, JobRecord, JobStatus};
pub use table::JobTable;
