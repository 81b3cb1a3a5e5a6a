use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::error::ProjectionError;
use super::types::{FundAllocationRow, FundSummary};

/// Read-only source of fund composition rows.
pub trait FundRepository {
    /// All composition rows for `fund_id`, in source order. An unknown fund
    /// yields an empty vector; deciding that this is an error is left to the
    /// caller.
    fn composition(&self, fund_id: i64) -> Result<Vec<FundAllocationRow>, ProjectionError>;

    /// Distinct funds in first-seen order.
    fn funds(&self) -> Result<Vec<FundSummary>, ProjectionError>;
}

/// Composition table held fully in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFundRepository {
    rows: Vec<FundAllocationRow>,
}

impl InMemoryFundRepository {
    pub fn new(rows: Vec<FundAllocationRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FundAllocationRow] {
        &self.rows
    }
}

impl FundRepository for InMemoryFundRepository {
    fn composition(&self, fund_id: i64) -> Result<Vec<FundAllocationRow>, ProjectionError> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.fund_id == fund_id)
            .cloned()
            .collect())
    }

    fn funds(&self) -> Result<Vec<FundSummary>, ProjectionError> {
        let mut seen = HashSet::new();
        Ok(self
            .rows
            .iter()
            .filter(|row| seen.insert(row.fund_id))
            .map(|row| FundSummary {
                fund_id: row.fund_id,
                fund_name: row.fund_name.clone(),
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct CsvAllocationRecord {
    #[serde(rename = "FUND_ID")]
    fund_id: i64,
    #[serde(rename = "FUND_NAME")]
    fund_name: String,
    #[serde(rename = "ASSET_CLASS", default)]
    asset_class: String,
    #[serde(rename = "PERCENT_OF_FUND")]
    percent_of_fund: f64,
    #[serde(rename = "AVG_RETURN_10Y")]
    avg_return_10y: f64,
    #[serde(rename = "STD_DEV_10Y")]
    std_dev_10y: f64,
}

/// Loads a `fund_allocation.csv` style table once and serves it from memory.
///
/// Every numeric field is checked here so the engine never sees a NaN or an
/// out-of-range weight.
#[derive(Debug, Clone)]
pub struct CsvFundRepository {
    inner: InMemoryFundRepository,
}

impl CsvFundRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProjectionError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ProjectionError::DataSource(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ProjectionError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut rows = Vec::new();
        for (idx, record) in csv_reader.deserialize::<CsvAllocationRecord>().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            rows.push(normalize_record(record?, line)?);
        }
        Ok(Self {
            inner: InMemoryFundRepository::new(rows),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rows().is_empty()
    }
}

impl FundRepository for CsvFundRepository {
    fn composition(&self, fund_id: i64) -> Result<Vec<FundAllocationRow>, ProjectionError> {
        self.inner.composition(fund_id)
    }

    fn funds(&self) -> Result<Vec<FundSummary>, ProjectionError> {
        self.inner.funds()
    }
}

fn normalize_record(
    record: CsvAllocationRecord,
    line: usize,
) -> Result<FundAllocationRow, ProjectionError> {
    for (column, value) in [
        ("PERCENT_OF_FUND", record.percent_of_fund),
        ("AVG_RETURN_10Y", record.avg_return_10y),
        ("STD_DEV_10Y", record.std_dev_10y),
    ] {
        if !value.is_finite() {
            return Err(ProjectionError::DataSource(format!(
                "line {line}: {column} must be a finite number"
            )));
        }
    }

    if !(0.0..=100.0).contains(&record.percent_of_fund) {
        return Err(ProjectionError::DataSource(format!(
            "line {line}: PERCENT_OF_FUND must be between 0 and 100"
        )));
    }

    Ok(FundAllocationRow {
        fund_id: record.fund_id,
        fund_name: record.fund_name,
        asset_class: record.asset_class,
        percent_of_fund: record.percent_of_fund,
        avg_return_10y: record.avg_return_10y,
        std_dev_10y: record.std_dev_10y,
    })
}
