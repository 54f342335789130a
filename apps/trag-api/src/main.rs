use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = trag_api::Args::parse();

	trag_api::run(args).await
}
