//! Status colors shared by chart series and table rows.
//!
//! There is exactly one color entry per status. The hex form is derived
//! from the RGB triple so the two renderings cannot disagree.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::jobs::record::JobStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// `#rrggbb`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// CSS `rgb(r,g,b)` form.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn status_rgb(status: JobStatus) -> Rgb {
    match status {
        JobStatus::Unknown => Rgb(160, 160, 160),
        JobStatus::Failed => Rgb(217, 83, 79),
        JobStatus::Complete => Rgb(92, 184, 92),
        JobStatus::Running => Rgb(66, 139, 202),
        JobStatus::Pending => Rgb(240, 173, 78),
        JobStatus::Waiting => Rgb(153, 102, 204),
    }
}

/// Row background for a STATUS cell; rows without a status stay white.
pub fn cell_rgb(status: Option<JobStatus>) -> Rgb {
    status.map(status_rgb).unwrap_or(Rgb::WHITE)
}
