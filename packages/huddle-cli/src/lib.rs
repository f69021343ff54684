use std::path::PathBuf;

use clap::{
	Args,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use tracing_subscriber::EnvFilter;

pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

/// Flags shared by every Huddle binary.
#[derive(Debug, Args)]
pub struct ConfigArgs {
	/// Path to the Huddle TOML configuration file.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Magenta.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Falls back to `info` when the configured directive does not parse.
pub fn log_filter(log_level: &str) -> EnvFilter {
	EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_tracing(log_level: &str) {
	tracing_subscriber::fmt().with_env_filter(log_filter(log_level)).with_target(false).init();
}
