#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	Provider(#[from] huddle_providers::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
}
