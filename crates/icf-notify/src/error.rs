use icf_db::error::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("{0} delivery is not configured")]
    NotConfigured(&'static str),
}
