pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Dsn(String),

	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
}
