use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	huddle_api::run(huddle_api::Args::parse()).await
}
