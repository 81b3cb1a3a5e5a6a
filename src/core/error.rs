use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Fund {fund_id} not found in fund allocation data")]
    FundNotFound { fund_id: i64 },

    #[error("Invalid amount {amount}: must be a finite number greater than 0")]
    InvalidAmount { amount: f64 },

    #[error("Invalid parameter {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Fund data source error: {0}")]
    DataSource(String),
}

impl ProjectionError {
    pub(crate) fn invalid_parameter(field: &str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidParameter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for ProjectionError {
    fn from(e: csv::Error) -> Self {
        ProjectionError::DataSource(e.to_string())
    }
}
