//! Service layer over [`IcfDb`]. All repo methods are implemented as
//! `impl IcfService` blocks in [`crate::repos`].

use crate::IcfDb;
use crate::error::DatabaseError;

pub struct IcfService {
    db: IcfDb,
}

impl IcfService {
    /// Open a local database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            db: IcfDb::open_local(db_path).await?,
        })
    }

    /// Connect to a remote libSQL database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection fails.
    pub async fn new_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            db: IcfDb::open_remote(url, auth_token).await?,
        })
    }

    #[must_use]
    pub const fn from_db(db: IcfDb) -> Self {
        Self { db }
    }

    #[must_use]
    pub const fn db(&self) -> &IcfDb {
        &self.db
    }
}
