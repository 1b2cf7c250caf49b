use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}
