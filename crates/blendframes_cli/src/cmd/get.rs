use std::path::PathBuf;

use blendframes::blend::{BlendError, BlendFile, FieldPath, Result};

use crate::cmd::util::{emit_json, parse_block_code, render_code, value_json};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub code: String,
	/// Dotted field path, e.g. `r.sfra` or `verts[2].co`.
	#[arg(long = "path")]
	pub field_path: String,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct GetJson {
	path: String,
	code: String,
	field: String,
	value: serde_json::Value,
}

/// Read one field path from the first block carrying a code.
pub fn run(args: Args) -> Result<()> {
	let Args { path, code, field_path, json } = args;

	let code = parse_block_code(&code)?;
	let field = field_path.parse::<FieldPath>()?;
	let blend = BlendFile::open(&path)?;
	let block = blend.find_first(&code).ok_or_else(|| BlendError::BlockNotFound { code: render_code(code) })?;
	let value = block.get(&field)?;
	let rendered = value.as_ref().map_or(serde_json::Value::Null, value_json);

	if json {
		emit_json(&GetJson {
			path: path.display().to_string(),
			code: render_code(code),
			field: field.to_string(),
			value: rendered,
		})?;
		return Ok(());
	}

	println!("{field}: {rendered}");
	Ok(())
}
