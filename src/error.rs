use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unrecognized import file: expected `meta` + `data.years` or a top-level `years` map")]
    UnrecognizedImportShape,

    #[error("Structure violation for {user} in {year}: {details}")]
    StructureViolation {
        year: i32,
        user: String,
        details: String,
    },

    #[error("Category {0} does not hold plain amounts")]
    CategoryMismatch(String),

    #[error("Year {0} is outside the supported range")]
    YearOutOfRange(i32),

    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
