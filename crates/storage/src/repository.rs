//! Repository Implementation

use crate::{StorageConfig, StorageError};
use chrono::NaiveDate;
use data_validator::{ValidationError, Validator};
use serde::{Deserialize, Serialize};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS soil_health (
        record_no        INTEGER PRIMARY KEY AUTOINCREMENT,
        farm_location    TEXT NOT NULL,
        test_date        DATE,
        nitrogen_level   REAL NOT NULL,
        phosphorus_level REAL NOT NULL,
        potassium_level  REAL NOT NULL,
        pH_level         REAL NOT NULL,
        moisture_content REAL NOT NULL
    )
"#;

const INSERT_SQL: &str = "INSERT INTO soil_health \
    (farm_location, test_date, nitrogen_level, phosphorus_level, \
    potassium_level, pH_level, moisture_content) \
    VALUES (?, ?, ?, ?, ?, ?, ?)";

const SELECT_SQL: &str = "SELECT record_no, farm_location, test_date, nitrogen_level, \
    phosphorus_level, potassium_level, pH_level, moisture_content \
    FROM soil_health ORDER BY record_no DESC";

/// Persisted soil test record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SoilRecord {
    pub record_no: i64,
    pub farm_location: String,
    pub test_date: Option<NaiveDate>,
    pub nitrogen_level: f64,
    pub phosphorus_level: f64,
    pub potassium_level: f64,
    #[sqlx(rename = "pH_level")]
    #[serde(rename = "pH_level", alias = "ph_level")]
    pub ph_level: f64,
    pub moisture_content: f64,
}

/// Soil test record as submitted, before the store assigns `record_no`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSoilRecord {
    pub farm_location: String,
    pub test_date: Option<NaiveDate>,
    pub nitrogen_level: f64,
    pub phosphorus_level: f64,
    pub potassium_level: f64,
    #[serde(rename = "pH_level", alias = "ph_level")]
    pub ph_level: f64,
    pub moisture_content: f64,
}

/// Rows written per transaction during batch inserts, in `1..=MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(usize);

impl BatchSize {
    pub const MAX: usize = 10_000;

    /// Clamp a requested size into the allowed range
    pub fn new(requested: usize) -> Self {
        Self(requested.clamp(1, Self::MAX))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

fn bind_record<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    record: &'q NewSoilRecord,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(record.farm_location.as_str())
        .bind(record.test_date)
        .bind(record.nitrogen_level)
        .bind(record.phosphorus_level)
        .bind(record.potassium_level)
        .bind(record.ph_level)
        .bind(record.moisture_content)
}

/// Repository for soil records
pub struct SoilRepository {
    pool: SqlitePool,
    validator: Validator,
}

impl SoilRepository {
    /// Open a connection pool for the configured database
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));

        // Every connection to `:memory:` is its own database, so keep exactly one alive
        pool_options = if config.is_in_memory() {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        info!("Connected to database {}", config.database_url);
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            validator: Validator::default(),
        }
    }

    /// Fresh in-memory repository with the schema in place
    pub async fn in_memory() -> Result<Self, StorageError> {
        let repo = Self::connect(&StorageConfig::in_memory()).await?;
        repo.ensure_schema().await?;
        Ok(repo)
    }

    /// Create the `soil_health` table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| match StorageError::from(e) {
                StorageError::Database(msg) => StorageError::Schema(msg),
                other => other,
            })?;
        debug!("soil_health table ready");
        Ok(())
    }

    /// Insert one record, returning the assigned `record_no`
    pub async fn insert(&self, record: &NewSoilRecord) -> Result<i64, StorageError> {
        if let Err(e) = self.validate(record) {
            warn!("Rejected soil record: {}", e);
            return Err(e.into());
        }

        let result = bind_record(sqlx::query(INSERT_SQL), record)
            .execute(&self.pool)
            .await?;

        let record_no = result.last_insert_rowid();
        debug!("Inserted soil record {}", record_no);
        Ok(record_no)
    }

    /// Insert many records, one transaction per chunk of `batch_size` rows.
    ///
    /// Every record is validated before anything is written. A failing chunk
    /// is rolled back; chunks committed before it stay committed.
    pub async fn insert_batch(
        &self,
        records: &[NewSoilRecord],
        batch_size: BatchSize,
    ) -> Result<u64, StorageError> {
        for (index, record) in records.iter().enumerate() {
            if let Err(e) = self.validate(record) {
                warn!("Rejected batch: record {} invalid: {}", index, e);
                return Err(e.into());
            }
        }

        let mut inserted = 0u64;
        for chunk in records.chunks(batch_size.get()) {
            match self.insert_chunk(chunk).await {
                Ok(n) => inserted += n,
                Err(e) => {
                    error!(
                        committed = inserted,
                        requested = records.len(),
                        "Batch insert aborted: {}",
                        e
                    );
                    return Err(e);
                }
            }
        }

        info!(
            "Inserted {} soil records in chunks of {}",
            inserted,
            batch_size.get()
        );
        Ok(inserted)
    }

    /// Location must be non-blank and every reading finite
    fn validate(&self, record: &NewSoilRecord) -> Result<(), ValidationError> {
        self.validator
            .validate_required("farm_location", &record.farm_location)?;
        for (field, value) in [
            ("nitrogen_level", record.nitrogen_level),
            ("phosphorus_level", record.phosphorus_level),
            ("potassium_level", record.potassium_level),
            ("pH_level", record.ph_level),
            ("moisture_content", record.moisture_content),
        ] {
            self.validator.validate_finite(field, value)?;
        }
        Ok(())
    }

    async fn insert_chunk(&self, chunk: &[NewSoilRecord]) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await?;
        for record in chunk {
            bind_record(sqlx::query(INSERT_SQL), record)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!("Committed chunk of {} records", chunk.len());
        Ok(chunk.len() as u64)
    }

    /// Most recent records first; `None` returns every row
    pub async fn list_recent(&self, limit: Option<u32>) -> Result<Vec<SoilRecord>, StorageError> {
        let records = match limit {
            Some(limit) => {
                let sql = format!("{} LIMIT ?", SELECT_SQL);
                sqlx::query_as::<_, SoilRecord>(&sql)
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, SoilRecord>(SELECT_SQL)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!("Fetched {} soil records (limit {:?})", records.len(), limit);
        Ok(records)
    }

    /// Total number of stored records
    pub async fn count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM soil_health")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close the pool; later operations fail with a connection error
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
