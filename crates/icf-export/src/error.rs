use icf_db::error::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV buffer error: {0}")]
    Buffer(String),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("file is empty")]
    Empty,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
