use std::path::PathBuf;

use blendframes::blend::{Result, frame_range};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	#[arg(required = true)]
	pub paths: Vec<PathBuf>,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct FramesJson {
	path: String,
	start: i64,
	end: i64,
	current: i64,
	fps: Option<f64>,
}

/// Print the main scene's frame range for every input file.
///
/// Stops at the first file that fails; earlier files are already printed in text mode.
pub fn run(args: Args) -> Result<()> {
	let Args { paths, json } = args;

	let mut rows = Vec::with_capacity(paths.len());
	for path in &paths {
		let range = frame_range(path)?;
		if json {
			rows.push(FramesJson {
				path: path.display().to_string(),
				start: range.start,
				end: range.end,
				current: range.current,
				fps: range.fps,
			});
			continue;
		}

		println!("{}", path.display());
		println!("Start frame: {}", range.start);
		println!("End frame: {}", range.end);
		println!("Current frame: {}", range.current);
		if let Some(fps) = range.fps {
			println!("FPS: {fps:.3}");
		}
	}

	if json {
		emit_json(&rows)?;
	}
	Ok(())
}
