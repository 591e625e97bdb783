//! Soil service
//!
//! Sequences validation, storage and advice for one user interaction and
//! reports the outcome as a [`Notice`] value.

use advisory::{Advisory, AdvisoryEngine, Measurements};
use data_validator::{ValidationError, Validator};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use storage::{BatchSize, NewSoilRecord, SoilRecord, SoilRepository, StorageError};
use tracing::{error, info, warn};

/// Largest number of records accepted in one bulk request
pub const MAX_BULK_RECORDS: usize = 100_000;

const MISSING_LOCATION: &str = "Farm Location field must be filled!";

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

/// User-facing outcome of one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }

    /// Convert a storage failure; `action` names what was attempted
    fn from_storage(err: &StorageError, action: &str) -> Self {
        match err {
            StorageError::Validation(ValidationError::MissingField(_)) => {
                Notice::warning(MISSING_LOCATION)
            }
            StorageError::Validation(e) => Notice::warning(e.to_string()),
            StorageError::Connection(_) | StorageError::Schema(_) => {
                Notice::error(err.to_string())
            }
            StorageError::Database(msg) => Notice::error(format!("Error {}: {}", action, msg)),
        }
    }
}

/// Result of a single-record submission
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub notice: Notice,
    pub record_no: Option<i64>,
    /// Only populated after a successful insert
    pub advisories: Vec<Advisory>,
}

/// Result of a bulk submission
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub notice: Notice,
    pub inserted: u64,
}

/// Result of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub notice: Option<Notice>,
    pub title: String,
    pub records: Vec<SoilRecord>,
}

/// Row cap offered by the records table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLimit {
    Unlimited,
    Rows(u32),
}

impl RowLimit {
    pub const CHOICES: [u32; 6] = [10, 50, 100, 200, 300, 500];

    pub fn as_option(&self) -> Option<u32> {
        match self {
            RowLimit::Unlimited => None,
            RowLimit::Rows(n) => Some(*n),
        }
    }

    /// Table heading, e.g. "Last 100 Records"
    pub fn title(&self) -> String {
        match self {
            RowLimit::Unlimited => "All Records".to_string(),
            RowLimit::Rows(n) => format!("Last {} Records", n),
        }
    }
}

impl Default for RowLimit {
    fn default() -> Self {
        RowLimit::Rows(100)
    }
}

impl FromStr for RowLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(RowLimit::Unlimited);
        }
        match s.parse::<u32>() {
            Ok(n) if Self::CHOICES.contains(&n) => Ok(RowLimit::Rows(n)),
            _ => Err(format!(
                "limit must be \"all\" or one of {:?}, got {:?}",
                Self::CHOICES,
                s
            )),
        }
    }
}

impl fmt::Display for RowLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLimit::Unlimited => write!(f, "all"),
            RowLimit::Rows(n) => write!(f, "{}", n),
        }
    }
}

fn measurements_of(record: &NewSoilRecord) -> Measurements {
    Measurements {
        nitrogen: record.nitrogen_level,
        phosphorus: record.phosphorus_level,
        potassium: record.potassium_level,
        ph: record.ph_level,
        moisture: record.moisture_content,
    }
}

/// Form workflow over the repository and advisory engine
pub struct SoilService {
    repository: SoilRepository,
    engine: AdvisoryEngine,
    validator: Validator,
    default_batch: BatchSize,
}

impl SoilService {
    pub fn new(
        repository: SoilRepository,
        engine: AdvisoryEngine,
        default_batch: BatchSize,
    ) -> Self {
        Self {
            repository,
            engine,
            validator: Validator::default(),
            default_batch,
        }
    }

    pub fn repository(&self) -> &SoilRepository {
        &self.repository
    }

    /// Store one record and advise on it
    pub async fn submit(&self, record: NewSoilRecord) -> Submission {
        match self.repository.insert(&record).await {
            Ok(record_no) => {
                self.log_out_of_range(&record);
                let advisories = self.engine.recommend(&measurements_of(&record));
                counter!("soil_records_inserted_total").increment(1);
                counter!("soil_advisories_total").increment(advisories.len() as u64);
                info!(
                    record_no,
                    location = %record.farm_location,
                    advisories = advisories.len(),
                    "Soil record stored"
                );
                Submission {
                    notice: Notice::success("Soil record inserted successfully!"),
                    record_no: Some(record_no),
                    advisories,
                }
            }
            Err(e) => {
                counter!("soil_insert_rejections_total").increment(1);
                if !matches!(e, StorageError::Validation(_)) {
                    error!("Insert failed: {}", e);
                }
                Submission {
                    notice: Notice::from_storage(&e, "inserting record"),
                    record_no: None,
                    advisories: Vec::new(),
                }
            }
        }
    }

    /// Store many records; `batch_size` overrides the configured default
    pub async fn submit_batch(
        &self,
        records: Vec<NewSoilRecord>,
        batch_size: Option<usize>,
    ) -> BatchOutcome {
        if records.is_empty() || records.len() > MAX_BULK_RECORDS {
            warn!("Rejected bulk request of {} records", records.len());
            return BatchOutcome {
                notice: Notice::warning(format!(
                    "Bulk quantity must be between 1 and {} records",
                    MAX_BULK_RECORDS
                )),
                inserted: 0,
            };
        }

        let batch = batch_size.map(BatchSize::new).unwrap_or(self.default_batch);
        match self.repository.insert_batch(&records, batch).await {
            Ok(inserted) => {
                counter!("soil_records_inserted_total").increment(inserted);
                BatchOutcome {
                    notice: Notice::success(format!("{} records inserted successfully!", inserted)),
                    inserted,
                }
            }
            Err(e) => {
                counter!("soil_insert_rejections_total").increment(1);
                BatchOutcome {
                    notice: Notice::from_storage(&e, "inserting records"),
                    inserted: 0,
                }
            }
        }
    }

    /// Most recent records, newest first
    pub async fn recent(&self, limit: RowLimit) -> Listing {
        let title = limit.title();
        match self.repository.list_recent(limit.as_option()).await {
            Ok(records) => Listing {
                notice: None,
                title,
                records,
            },
            Err(e) => {
                error!("Listing failed: {}", e);
                Listing {
                    notice: Some(Notice::from_storage(&e, "loading records")),
                    title,
                    records: Vec::new(),
                }
            }
        }
    }

    /// Advice without storing anything
    pub fn advise(&self, measurements: &Measurements) -> Vec<Advisory> {
        self.engine.recommend(measurements)
    }

    fn log_out_of_range(&self, record: &NewSoilRecord) {
        let result = self.validator.check_nominal(
            record.nitrogen_level,
            record.phosphorus_level,
            record.potassium_level,
            record.ph_level,
            record.moisture_content,
        );
        for finding in &result.errors {
            warn!(location = %record.farm_location, "Unusual reading: {}", finding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisory::{Attribute, Level};
    use chrono::NaiveDate;

    async fn service() -> SoilService {
        let repository = SoilRepository::in_memory().await.unwrap();
        SoilService::new(repository, AdvisoryEngine::default(), BatchSize::new(10))
    }

    fn record(location: &str) -> NewSoilRecord {
        NewSoilRecord {
            farm_location: location.to_string(),
            test_date: NaiveDate::from_ymd_opt(2024, 3, 2),
            nitrogen_level: 0.5,
            phosphorus_level: 2.0,
            potassium_level: 3.0,
            ph_level: 8.0,
            moisture_content: 15.0,
        }
    }

    #[tokio::test]
    async fn test_submit_returns_advice() {
        let service = service().await;
        let submission = service.submit(record("North Field")).await;

        assert!(submission.notice.is_success());
        assert_eq!(submission.notice.message, "Soil record inserted successfully!");
        assert_eq!(submission.record_no, Some(1));
        let attrs: Vec<_> = submission
            .advisories
            .iter()
            .map(|a| (a.attribute, a.level))
            .collect();
        assert_eq!(
            attrs,
            vec![
                (Attribute::Nitrogen, Level::Low),
                (Attribute::Ph, Level::High),
                (Attribute::Moisture, Level::Low),
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_without_location_warns() {
        let service = service().await;
        let submission = service.submit(record("")).await;

        assert_eq!(submission.notice, Notice::warning(MISSING_LOCATION));
        assert_eq!(submission.record_no, None);
        assert!(submission.advisories.is_empty());
        assert_eq!(service.repository().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_submit_non_finite_reading_warns() {
        let service = service().await;
        let mut sample = record("Lowland");
        sample.ph_level = f64::NAN;
        let submission = service.submit(sample).await;

        assert_eq!(submission.notice.kind, NoticeKind::Warning);
        assert_eq!(
            submission.notice.message,
            "Invalid data format: pH_level is not a finite number"
        );
        assert_eq!(submission.record_no, None);
        assert!(submission.advisories.is_empty());
        assert_eq!(service.repository().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_submit_after_close_reports_error() {
        let service = service().await;
        service.repository().close().await;

        let submission = service.submit(record("South Field")).await;
        assert_eq!(submission.notice.kind, NoticeKind::Error);
        assert!(submission
            .notice
            .message
            .starts_with("Error connecting to database"));
    }

    #[tokio::test]
    async fn test_batch_uses_default_chunking() {
        let service = service().await;
        let records: Vec<_> = (0..25).map(|i| record(&format!("Plot {}", i))).collect();

        let outcome = service.submit_batch(records, None).await;
        assert_eq!(outcome.inserted, 25);
        assert_eq!(outcome.notice.message, "25 records inserted successfully!");
        assert_eq!(service.repository().count().await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let service = service().await;
        let outcome = service.submit_batch(Vec::new(), Some(10)).await;
        assert_eq!(outcome.notice.kind, NoticeKind::Warning);
        assert_eq!(outcome.inserted, 0);
    }

    #[tokio::test]
    async fn test_recent_titles_and_order() {
        let service = service().await;
        for i in 0..12 {
            service.submit(record(&format!("Plot {}", i))).await;
        }

        let listing = service.recent(RowLimit::Rows(10)).await;
        assert_eq!(listing.title, "Last 10 Records");
        assert_eq!(listing.records.len(), 10);
        assert_eq!(listing.records[0].record_no, 12);
        assert!(listing.notice.is_none());

        let all = service.recent(RowLimit::Unlimited).await;
        assert_eq!(all.title, "All Records");
        assert_eq!(all.records.len(), 12);
    }

    #[test]
    fn test_row_limit_parsing() {
        assert_eq!("all".parse::<RowLimit>(), Ok(RowLimit::Unlimited));
        assert_eq!("50".parse::<RowLimit>(), Ok(RowLimit::Rows(50)));
        assert_eq!(" 500 ".parse::<RowLimit>(), Ok(RowLimit::Rows(500)));
        assert!("7".parse::<RowLimit>().is_err());
        assert!("lots".parse::<RowLimit>().is_err());
        assert_eq!(RowLimit::default(), RowLimit::Rows(100));
        assert_eq!(RowLimit::Rows(200).to_string(), "200");
    }
}
