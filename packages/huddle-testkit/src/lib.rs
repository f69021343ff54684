//! Scratch Postgres databases for the `HUDDLE_PG_DSN`-gated storage tests.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use uuid::Uuid;

const DSN_VAR: &str = "HUDDLE_PG_DSN";

/// A uniquely named database on the server behind `HUDDLE_PG_DSN`. Call
/// [`TestDatabase::cleanup`] at the end of the test; nothing drops it implicitly.
pub struct TestDatabase {
	name: String,
	dsn: String,
	server: PgConnectOptions,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Dsn(format!("{DSN_VAR} is not a Postgres DSN: {err}.")))?;
		let server = base.clone().database("postgres");
		let name = format!("huddle_test_{}", Uuid::new_v4().simple());
		let mut conn = PgConnection::connect_with(&server).await?;

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;
		conn.close().await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, server })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	/// Drops the database, disconnecting any pool the test left open.
	pub async fn cleanup(self) -> Result<()> {
		let mut conn = PgConnection::connect_with(&self.server).await?;

		conn.execute(format!(r#"DROP DATABASE IF EXISTS "{}" WITH (FORCE)"#, self.name).as_str())
			.await?;
		conn.close().await?;

		Ok(())
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_VAR).ok().filter(|dsn| !dsn.trim().is_empty())
}
