use clap::Parser;

use braid_search::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	braid_search::run(args).await
}
