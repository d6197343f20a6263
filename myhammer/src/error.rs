use thiserror::Error;

#[derive(Debug, Error)]
pub enum HammerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Schema setup failed: {0}")]
    SchemaSetup(#[source] StoreError),

    #[error("Result aggregator failed: {0}")]
    Aggregator(#[from] tokio::task::JoinError),
}

/// Failure of a single store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unable to connect: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Statement `{statement}` failed: {source}")]
    Statement {
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Insert did not generate a key")]
    MissingKey,

    #[error("Generated key {0} does not fit in a signed 64-bit integer")]
    KeyOutOfRange(u64),
}

impl StoreError {
    pub(crate) fn statement(statement: &str, source: sqlx::Error) -> Self {
        Self::Statement {
            statement: statement.to_string(),
            source,
        }
    }
}
