#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "blendframes", about = "Frame range extraction and inspection for .blend files")]
struct Cli {
	/// Log decoding progress to stderr.
	#[arg(short, long, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the main scene's frame range for each file.
	Frames(cmd::frames::Args),
	/// Print header and block statistics.
	Info(cmd::info::Args),
	/// List catalogued blocks.
	Blocks(cmd::blocks::Args),
	/// Read a field path from the first block with a code.
	Get(cmd::get::Args),
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> blendframes::blend::Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match cli.command {
		Commands::Frames(args) => cmd::frames::run(args),
		Commands::Info(args) => cmd::info::run(args),
		Commands::Blocks(args) => cmd::blocks::run(args),
		Commands::Get(args) => cmd::get::run(args),
	}
}

fn init_tracing(verbose: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).try_init();
}
