//! MySQL implementation of [`Store`]
use crate::error::StoreError;
use crate::store::{Store, StoreWriter};
use myhammer_core::WorkerId;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};
#[allow(unused)]
use tracing::{debug, info, instrument, trace, warn};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USER: &str = "root";

const RESET_DATABASE: &str = "drop database if exists myhammer";
const CREATE_DATABASE: &str = "create database if not exists myhammer";
const CREATE_TABLE: &str = "create table if not exists myhammer.t1 \
    (k BIGINT AUTO_INCREMENT PRIMARY KEY, worker BIGINT, value BIGINT)";
const INSERT_ROW: &str = "insert into myhammer.t1 (worker, value) values (?, ?)";

/// Where and how to connect.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Prepended verbatim to every statement.
    pub prefix: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: String::new(),
            prefix: String::new(),
        }
    }
}

// NOTE: Hand-written so the password never ends up in logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl ConnectionConfig {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
    }

    /// `statement` with the configured prefix (and a separating space) in front.
    pub fn statement(&self, statement: &str) -> String {
        if self.prefix.is_empty() {
            statement.to_string()
        } else {
            format!("{} {statement}", self.prefix)
        }
    }
}

pub struct MySqlStore {
    config: ConnectionConfig,
    options: MySqlConnectOptions,
}

impl MySqlStore {
    pub fn new(config: ConnectionConfig) -> Self {
        let options = config.connect_options();
        Self { config, options }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn open(&self) -> Result<MySqlConnection, StoreError> {
        MySqlConnection::connect_with(&self.options)
            .await
            .map_err(StoreError::Connect)
    }

    /// Run each statement in order on a short-lived setup connection.
    async fn setup(&self, statements: &[&str]) -> Result<(), StoreError> {
        let mut conn = self.open().await?;
        for statement in statements {
            let statement = self.config.statement(statement);
            debug!("Executing `{statement}`");
            Executor::execute(&mut conn, statement.as_str())
                .await
                .map_err(|err| StoreError::statement(&statement, err))?;
        }

        if let Err(err) = conn.close().await {
            warn!("Error closing setup connection: {err}");
        }
        Ok(())
    }
}

impl Store for MySqlStore {
    type Writer = MySqlWriter;

    #[instrument(skip_all, fields(host = %self.config.host, port = self.config.port))]
    async fn reset_schema(&self) -> Result<(), StoreError> {
        self.setup(&[RESET_DATABASE]).await
    }

    #[instrument(skip_all, fields(host = %self.config.host, port = self.config.port))]
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.setup(&[CREATE_DATABASE, CREATE_TABLE]).await
    }

    async fn connect(&self, worker: WorkerId) -> Result<MySqlWriter, StoreError> {
        trace!("Opening connection for worker {worker}");
        Ok(MySqlWriter {
            conn: self.open().await?,
            insert: self.config.statement(INSERT_ROW),
        })
    }
}

/// One worker's dedicated connection.
pub struct MySqlWriter {
    conn: MySqlConnection,
    insert: String,
}

impl StoreWriter for MySqlWriter {
    async fn insert_row(&mut self, worker: WorkerId, value: i64) -> Result<i64, StoreError> {
        // sqlx prepares the statement once per connection and reuses it from its cache.
        let result = sqlx::query(&self.insert)
            .bind(worker.as_i64())
            .bind(value)
            .execute(&mut self.conn)
            .await
            .map_err(|err| StoreError::statement(&self.insert, err))?;

        match result.last_insert_id() {
            0 => Err(StoreError::MissingKey),
            key => i64::try_from(key).map_err(|_| StoreError::KeyOutOfRange(key)),
        }
    }
}
