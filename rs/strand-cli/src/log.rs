use clap::Args;

#[derive(Args, Clone, Debug)]
pub struct Log {
	/// Increase logging verbosity; repeat for more.
	#[arg(long, short, action = clap::ArgAction::Count)]
	verbose: u8,
}

impl Log {
	/// Install the global subscriber. `RUST_LOG` wins over `--verbose`.
	pub fn init(&self) {
		let default = match self.verbose {
			0 => "info",
			1 => "debug",
			_ => "trace",
		};

		let filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

		tracing_subscriber::fmt().with_env_filter(filter).init();
	}
}
