use std::path::PathBuf;

use blendframes::blend::{BlendFile, Result};

use crate::cmd::util::{emit_json, render_code};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	compression: &'static str,
	header_size: usize,
	format_version: u16,
	version: u16,
	block_layout: &'static str,
	endianness: &'static str,
	pointer_size: usize,
	pointer_storage: &'static str,
	duplicate_addresses: usize,
	block_count: u32,
	has_dna1: bool,
	has_endb: bool,
	last_code: String,
	top_codes: Vec<CodeCountJson>,
}

#[derive(serde::Serialize)]
struct CodeCountJson {
	code: String,
	count: u32,
}

/// Print high-level file and block statistics.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let blend = BlendFile::open(&path)?;
	let stats = blend.scan_block_stats();

	let mut entries: Vec<_> = stats.codes.into_iter().collect();
	entries.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));

	if json {
		let payload = InfoJson {
			path: path.display().to_string(),
			compression: blend.compression.as_str(),
			header_size: blend.header.header_size,
			format_version: blend.header.format_version,
			version: blend.header.version,
			block_layout: blend.header.block_layout.as_str(),
			endianness: blend.header.endianness.as_str(),
			pointer_size: blend.header.pointer_size,
			pointer_storage: blend.pointer_storage().as_str(),
			duplicate_addresses: blend.duplicate_addresses(),
			block_count: stats.block_count,
			has_dna1: stats.has_dna1,
			has_endb: stats.has_endb,
			last_code: render_code(stats.last_code),
			top_codes: entries
				.iter()
				.take(12)
				.map(|(code, count)| CodeCountJson {
					code: render_code(*code),
					count: *count,
				})
				.collect(),
		};
		emit_json(&payload)?;
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("compression: {}", blend.compression.as_str());
	println!("header_size: {}", blend.header.header_size);
	println!("format_version: {}", blend.header.format_version);
	println!("version: {}", blend.header.version);
	println!("block_layout: {}", blend.header.block_layout.as_str());
	println!("endianness: {}", blend.header.endianness.as_str());
	println!("pointer_size: {}", blend.header.pointer_size);
	println!("pointer_storage: {}", blend.pointer_storage().as_str());
	println!("duplicate_addresses: {}", blend.duplicate_addresses());
	println!("blocks: {}", stats.block_count);
	println!("has_dna1: {}", stats.has_dna1);
	println!("has_endb: {}", stats.has_endb);
	println!("last_code: {}", render_code(stats.last_code));
	println!("top_codes:");
	for (code, count) in entries.iter().take(12) {
		println!("  {:>4} {count}", render_code(*code));
	}
	Ok(())
}
