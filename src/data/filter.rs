use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::upload::UploadDescriptor;
use crate::error::{EngineError, Result};

/// Query value meaning "do not constrain this column".
pub const ALL: &str = "all";

// ---------------------------------------------------------------------------
// Upload filter: which uploads a dashboard view draws its records from
// ---------------------------------------------------------------------------

/// Filter over upload descriptors. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadFilter {
    pub uploader: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl UploadFilter {
    /// Build a filter from the raw query form: `"all"` or an empty string
    /// leaves a column unconstrained; dates are `YYYY-MM-DD`.
    pub fn from_query(
        uploader: &str,
        location: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Self> {
        Ok(UploadFilter {
            uploader: choice(uploader),
            location: choice(location),
            start_date: date(start_date)?,
            end_date: date(end_date)?,
        })
    }

    pub fn is_unrestricted(&self) -> bool {
        *self == UploadFilter::default()
    }

    /// Whether an upload passes every active constraint.
    ///
    /// * uploader / location – exact match
    /// * start date – the upload starts at or after 00:00:00 UTC that day
    /// * end date – the upload ends at or before 23:59:59 UTC that day
    ///
    /// An upload without a start (end) time fails an active start (end) bound.
    pub fn matches(&self, upload: &UploadDescriptor) -> bool {
        if let Some(uploader) = &self.uploader {
            if upload.uploader != *uploader {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if upload.location != *location {
                return false;
            }
        }
        if let Some(day) = self.start_date {
            let bound = day_at(day, NaiveTime::MIN);
            if !upload.start_time.is_some_and(|t| t >= bound) {
                return false;
            }
        }
        if let Some(day) = self.end_date {
            let bound = day_at(day, last_second());
            if !upload.end_time.is_some_and(|t| t <= bound) {
                return false;
            }
        }
        true
    }
}

/// Return indices of uploads that pass the filter.
pub fn filtered_indices(uploads: &[UploadDescriptor], filter: &UploadFilter) -> Vec<usize> {
    uploads
        .iter()
        .enumerate()
        .filter(|(_, upload)| filter.matches(upload))
        .map(|(i, _)| i)
        .collect()
}

fn choice(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(ALL) {
        None
    } else {
        Some(raw.to_string())
    }
}

fn date(raw: &str) -> Result<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| EngineError::InvalidInput(format!("bad date '{raw}': {e}")))
}

fn last_second() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

fn day_at(day: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    day.and_time(time).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn upload(
        uploader: &str,
        location: &str,
        start: (u32, u32),
        end: (u32, u32),
    ) -> UploadDescriptor {
        UploadDescriptor {
            file_name: "walk.csv".into(),
            uploader: uploader.into(),
            data_count: 10,
            location: location.into(),
            start_time: Some(Utc.with_ymd_and_hms(2025, 3, start.0, start.1, 0, 0).unwrap()),
            end_time: Some(Utc.with_ymd_and_hms(2025, 3, end.0, end.1, 0, 0).unwrap()),
        }
    }

    #[test]
    fn all_and_empty_mean_unconstrained() {
        let f = UploadFilter::from_query("all", "", "", " ").unwrap();
        assert!(f.is_unrestricted());
        assert!(f.matches(&upload("kim", "4F", (1, 9), (1, 10))));
    }

    #[test]
    fn uploader_and_location_match_exactly() {
        let f = UploadFilter::from_query("kim", "B1", "", "").unwrap();
        assert!(f.matches(&upload("kim", "B1", (1, 9), (1, 10))));
        assert!(!f.matches(&upload("lee", "B1", (1, 9), (1, 10))));
        assert!(!f.matches(&upload("kim", "4F", (1, 9), (1, 10))));
    }

    #[test]
    fn date_bounds_cover_whole_days() {
        let f = UploadFilter::from_query("all", "all", "2025-03-02", "2025-03-03").unwrap();
        assert!(f.matches(&upload("kim", "4F", (2, 0), (3, 23))));
        assert!(!f.matches(&upload("kim", "4F", (1, 23), (2, 1))));
        assert!(!f.matches(&upload("kim", "4F", (3, 1), (4, 0))));
    }

    #[test]
    fn missing_times_fail_active_bounds() {
        let mut u = upload("kim", "4F", (2, 0), (2, 1));
        u.start_time = None;
        let f = UploadFilter::from_query("all", "all", "2025-03-01", "").unwrap();
        assert!(!f.matches(&u));
    }

    #[test]
    fn malformed_date_is_invalid_input() {
        assert!(matches!(
            UploadFilter::from_query("all", "all", "03/02/2025", ""),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn filtered_indices_keeps_order() {
        let uploads = vec![
            upload("kim", "4F", (1, 0), (1, 1)),
            upload("lee", "4F", (1, 0), (1, 1)),
            upload("kim", "B1", (1, 0), (1, 1)),
        ];
        let f = UploadFilter::from_query("kim", "all", "", "").unwrap();
        assert_eq!(filtered_indices(&uploads, &f), vec![0, 2]);
    }
}
