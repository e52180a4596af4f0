use std::path::Path;

use crate::blend::{BlendError, BlendFile, Block, Result, Value};

/// Locate the scene the file was saved with.
///
/// Follows `WM -> winactive -> screen -> scene`. Windows without a `screen` field carry the
/// scene pointer themselves. Files with no window manager fall back to the first `Scene` block.
pub fn main_scene(file: &BlendFile) -> Result<Option<Block<'_>>> {
	if let Some(window) = file.find_first(b"WM").map(|wm| wm.get_pointer("winactive")).transpose()?.flatten() {
		let scene = if window.struct_def()?.field("screen").is_some() {
			match window.get_pointer("screen")? {
				Some(screen) => screen.get_pointer("scene")?,
				None => None,
			}
		} else {
			window.get_pointer("scene")?
		};

		if scene.is_some() {
			return Ok(scene);
		}
		tracing::debug!("active window has no scene; scanning for a Scene block");
	}

	Ok(file.blocks().find(|block| block.struct_name() == Some("Scene")))
}

/// Frame settings of a scene's render data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRange {
	/// `r.sfra`.
	pub start: i64,
	/// `r.efra`.
	pub end: i64,
	/// `r.cfra`.
	pub current: i64,
	/// `r.frs_sec / r.frs_sec_base`, when the render data carries them.
	pub fps: Option<f64>,
}

impl FrameRange {
	/// Read the frame range from a `Scene` block.
	pub fn read(scene: &Block<'_>) -> Result<Self> {
		let start = read_int(scene, "r.sfra")?;
		let end = read_int(scene, "r.efra")?;
		let current = read_int(scene, "r.cfra")?;

		Ok(Self {
			start,
			end,
			current,
			fps: read_fps(scene)?,
		})
	}

	/// Number of frames from start to end, inclusive.
	pub fn len(&self) -> i64 {
		self.end.saturating_sub(self.start).saturating_add(1).max(0)
	}

	/// Return whether the range covers no frames.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Open a file and read the frame range of its main scene.
pub fn frame_range(path: impl AsRef<Path>) -> Result<FrameRange> {
	let file = BlendFile::open(path)?;
	let scene = main_scene(&file)?.ok_or(BlendError::SceneNotFound)?;
	FrameRange::read(&scene)
}

fn read_int(scene: &Block<'_>, path: &str) -> Result<i64> {
	let value = scene.get_path(path)?;
	value.as_ref().and_then(Value::as_i64).ok_or_else(|| BlendError::TypeMismatch {
		path: path.to_owned(),
		expected: "integer",
		got: value.as_ref().map_or("none", Value::kind),
	})
}

fn read_fps(scene: &Block<'_>) -> Result<Option<f64>> {
	let optional = |path: &str| match scene.get_path(path) {
		Ok(value) => Ok(value.as_ref().and_then(Value::as_f64)),
		Err(BlendError::UnknownField { .. }) => Ok(None),
		Err(err) => Err(err),
	};

	let (Some(fps), Some(base)) = (optional("r.frs_sec")?, optional("r.frs_sec_base")?) else {
		return Ok(None);
	};
	Ok((base != 0.0).then(|| fps / base))
}
