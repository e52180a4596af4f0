use std::path::PathBuf;

use blendframes::blend::{BlendFile, Result};

use crate::cmd::util::{emit_json, parse_block_code, ptr_hex, render_code};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Only list blocks with this code.
	#[arg(long)]
	pub code: Option<String>,
	#[arg(long)]
	pub limit: Option<usize>,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct BlockJson {
	index: usize,
	code: String,
	address: String,
	sdna_nr: u32,
	struct_name: Option<String>,
	count: u64,
	len: u64,
	offset: usize,
}

/// List catalogued blocks in file order.
pub fn run(args: Args) -> Result<()> {
	let Args { path, code, limit, json } = args;

	let filter = code.as_deref().map(parse_block_code).transpose()?;
	let blend = BlendFile::open(&path)?;

	let rows: Vec<BlockJson> = blend
		.blocks()
		.filter(|block| filter.is_none_or(|code| block.code() == code))
		.take(limit.unwrap_or(usize::MAX))
		.map(|block| BlockJson {
			index: block.index(),
			code: render_code(block.code()),
			address: ptr_hex(block.address()),
			sdna_nr: block.sdna_nr(),
			struct_name: block.struct_name().map(str::to_owned),
			count: block.count(),
			len: block.head().len,
			offset: block.offset(),
		})
		.collect();

	if json {
		emit_json(&rows)?;
		return Ok(());
	}

	for row in &rows {
		println!(
			"#{:<5} {:>4} {:>18} sdna={:<4} nr={:<6} len={:<8} {}",
			row.index,
			row.code,
			row.address,
			row.sdna_nr,
			row.count,
			row.len,
			row.struct_name.as_deref().unwrap_or("-")
		);
	}
	Ok(())
}
