//! Store configuration and collection resolution.
//!
//! Configuration is resolved once, up front, into an explicit [`StoreConfig`]
//! that is handed to a backend builder; operations never read ambient
//! process state. Explicit arguments win over environment variables, and the
//! collection name falls back to a hardcoded default.

use std::env;

use crate::error::{DataError, DataResult};

/// Environment variable holding the MongoDB connection string.
pub const ENV_CONNECTION_STRING: &str = "MONGO_CONNECTION_STRING";
/// Environment variable holding the database name.
pub const ENV_DATABASE_NAME: &str = "MONGO_DATABASE_NAME";
/// Accepted alias for [`ENV_DATABASE_NAME`].
pub const ENV_DB_NAME: &str = "MONGO_DB_NAME";
/// Environment variable holding the default collection name.
pub const ENV_COLLECTION_NAME: &str = "MONGO_COLLECTION_NAME";

/// Collection name used when none is supplied anywhere.
pub const DEFAULT_COLLECTION: &str = "data";

/// Connection parameters for a document store.
///
/// A config names a connection, a database, and a default collection.
/// Building a backend from it performs no I/O; the first operation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// MongoDB connection string (DSN).
    pub connection_string: String,
    /// Database name.
    pub database: String,
    /// Default collection name for operations that do not name one.
    pub collection: String,
}

impl StoreConfig {
    /// Creates a config with the default collection name.
    pub fn new(connection_string: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            database: database.into(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    /// Overrides the default collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Resolves a config entirely from the environment.
    ///
    /// Equivalent to [`StoreConfig::resolve`] with no explicit arguments.
    pub fn from_env() -> DataResult<Self> {
        Self::resolve(None, None, None)
    }

    /// Resolves a config from explicit arguments with environment fallback.
    ///
    /// Each absent argument falls back to its environment variable; the
    /// database name accepts two aliases and the collection name falls back
    /// to [`DEFAULT_COLLECTION`]. A missing connection string or database
    /// name is a configuration error.
    pub fn resolve(
        connection_string: Option<String>,
        database: Option<String>,
        collection: Option<String>,
    ) -> DataResult<Self> {
        let connection_string = connection_string
            .or_else(|| env_value(ENV_CONNECTION_STRING))
            .ok_or_else(|| {
                DataError::Configuration(format!("{ENV_CONNECTION_STRING} is not set"))
            })?;

        let database = database
            .or_else(|| env_value(ENV_DB_NAME))
            .or_else(|| env_value(ENV_DATABASE_NAME))
            .ok_or_else(|| {
                DataError::Configuration(format!(
                    "neither {ENV_DB_NAME} nor {ENV_DATABASE_NAME} is set"
                ))
            })?;

        let collection = collection
            .or_else(|| env_value(ENV_COLLECTION_NAME))
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        Ok(Self { connection_string, database, collection })
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    // The environment is process-wide state and cargo runs tests on
    // parallel threads; every test that reads or writes the fallback
    // variables takes this lock first.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn explicit_arguments_win() {
        let config = StoreConfig::resolve(
            Some("mongodb://localhost:27017".to_string()),
            Some("db".to_string()),
            Some("testcollection".to_string()),
        )
        .unwrap();

        assert_eq!(config.connection_string, "mongodb://localhost:27017");
        assert_eq!(config.database, "db");
        assert_eq!(config.collection, "testcollection");
    }

    #[test]
    fn collection_defaults_when_unset() {
        let _guard = env_lock();
        unsafe {
            env::remove_var(ENV_COLLECTION_NAME);
        }

        let config = StoreConfig::resolve(
            Some("mongodb://localhost:27017".to_string()),
            Some("db".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(config.collection, DEFAULT_COLLECTION);
    }

    #[test]
    fn builder_style_construction() {
        let config =
            StoreConfig::new("mongodb://localhost:27017", "db").with_collection("users");
        assert_eq!(config.collection, "users");
    }

    // Environment fallback cases share mutable process state, so they run
    // inside a single test function.
    #[test]
    fn environment_fallback_and_validation() {
        let _guard = env_lock();
        unsafe {
            env::remove_var(ENV_CONNECTION_STRING);
            env::remove_var(ENV_DB_NAME);
            env::remove_var(ENV_DATABASE_NAME);
            env::remove_var(ENV_COLLECTION_NAME);
        }

        let err = StoreConfig::from_env().unwrap_err();
        assert!(matches!(err, DataError::Configuration(_)));

        unsafe {
            env::set_var(ENV_CONNECTION_STRING, "mongodb://localhost:27017");
        }
        // Connection string alone is not enough: the database name is
        // validated symmetrically.
        let err = StoreConfig::from_env().unwrap_err();
        assert!(matches!(err, DataError::Configuration(_)));

        unsafe {
            env::set_var(ENV_DB_NAME, "db");
            env::set_var(ENV_COLLECTION_NAME, "testcollection");
        }
        let config = StoreConfig::from_env().unwrap();
        assert_eq!(config.database, "db");
        assert_eq!(config.collection, "testcollection");

        unsafe {
            env::remove_var(ENV_CONNECTION_STRING);
            env::remove_var(ENV_DB_NAME);
            env::remove_var(ENV_COLLECTION_NAME);
        }
    }
}
