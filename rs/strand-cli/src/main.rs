mod fetch;
mod log;
mod probe;

use clap::{Parser, Subcommand};
use url::Url;

#[derive(Parser, Clone)]
#[command(name = "strand", about = "HTTP Live Streaming playback engine")]
pub struct Cli {
	#[command(flatten)]
	log: log::Log,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
	/// Fetch a playlist and print what it offers.
	Probe {
		/// The master or media playlist URL.
		url: Url,
	},

	/// Download one rendition's segments into assembled local files.
	Fetch {
		/// The master or media playlist URL.
		url: Url,

		/// Pick the rendition closest to this height.
		#[arg(long, default_value_t = 720)]
		height: u32,

		/// Start at this time, in seconds.
		#[arg(long, default_value_t = 0.0)]
		seek: f64,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	cli.log.init();

	match cli.command {
		Command::Probe { url } => probe::run(url).await,
		Command::Fetch { url, height, seek } => fetch::run(url, height, seek).await,
	}
}
