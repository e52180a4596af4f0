use crate::blend::{BlendError, Result};

/// Leading signature shared by every header layout.
pub const BLEND_MAGIC: &[u8; 7] = b"BLENDER";

/// Byte order of every multi-byte number in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
	/// `v` marker.
	Little,
	/// `V` marker.
	Big,
}

impl Endianness {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Little => "little",
			Self::Big => "big",
		}
	}

	fn from_marker(byte: u8) -> Option<Self> {
		match byte {
			b'v' => Some(Self::Little),
			b'V' => Some(Self::Big),
			_ => None,
		}
	}
}

/// Shape of the per-block record header that follows the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLayout {
	/// `code, i32 len, ptr old, u32 sdna, i32 nr`; pointer width from the header.
	Legacy,
	/// `code, u32 sdna, u64 old, i64 len, i64 nr`.
	Large,
}

impl BlockLayout {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Legacy => "legacy",
			Self::Large => "large",
		}
	}
}

/// Parsed global file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendHeader {
	/// Total header size in bytes; blocks start right after it.
	pub header_size: usize,
	/// Container format version (`0` for legacy, `1` for the 17-byte layout).
	pub format_version: u16,
	/// Application version as decimal digits (for example `279` or `500`).
	pub version: u16,
	/// Pointer width in bytes, used for block addresses and pointer fields.
	pub pointer_size: usize,
	/// File byte order.
	pub endianness: Endianness,
	/// Block record layout implied by the header.
	pub block_layout: BlockLayout,
}

impl BlendHeader {
	/// Size of `BLENDER_V248`-style headers.
	pub const LEGACY_SIZE: usize = 12;
	/// Size of `BLENDER17-01v0500`-style headers.
	pub const LARGE_SIZE: usize = 17;

	/// Parse a header from the start of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		if !bytes.starts_with(BLEND_MAGIC) {
			return Err(BlendError::UnknownMagic { magic: first4(bytes) });
		}

		match bytes.get(7) {
			Some(byte) if byte.is_ascii_digit() => Self::parse_large(bytes),
			Some(_) => Self::parse_legacy(bytes),
			None => Err(BlendError::InvalidHeader),
		}
	}

	/// Size in bytes of each block record header in this file.
	pub fn block_header_size(&self) -> usize {
		match self.block_layout {
			BlockLayout::Legacy => 16 + self.pointer_size,
			BlockLayout::Large => 32,
		}
	}

	fn parse_legacy(bytes: &[u8]) -> Result<Self> {
		let header = bytes.get(..Self::LEGACY_SIZE).ok_or(BlendError::InvalidHeader)?;
		let pointer_size = match header[7] {
			b'_' => 4,
			b'-' => 8,
			_ => return Err(BlendError::InvalidHeader),
		};

		Ok(Self {
			header_size: Self::LEGACY_SIZE,
			format_version: 0,
			version: parse_digits(&header[9..12]).ok_or(BlendError::InvalidHeader)?,
			pointer_size,
			endianness: Endianness::from_marker(header[8]).ok_or(BlendError::InvalidHeader)?,
			block_layout: BlockLayout::Legacy,
		})
	}

	fn parse_large(bytes: &[u8]) -> Result<Self> {
		let header = bytes.get(..Self::LARGE_SIZE).ok_or(BlendError::InvalidHeader)?;

		let header_size = usize::from(parse_digits(&header[7..9]).ok_or(BlendError::InvalidHeader)?);
		if header[9] != b'-' {
			return Err(BlendError::InvalidHeader);
		}

		let format_version = parse_digits(&header[10..12]).ok_or(BlendError::InvalidHeader)?;
		if format_version != 1 {
			return Err(BlendError::UnsupportedFormatVersion { version: format_version });
		}

		// The two-digit size marker doubles as the pointer-width marker.
		if header_size != Self::LARGE_SIZE {
			return Err(BlendError::UnsupportedPointerSize { pointer_size: header_size });
		}

		Ok(Self {
			header_size,
			format_version,
			version: parse_digits(&header[13..17]).ok_or(BlendError::InvalidHeader)?,
			pointer_size: 8,
			endianness: Endianness::from_marker(header[12]).ok_or(BlendError::InvalidHeader)?,
			block_layout: BlockLayout::Large,
		})
	}
}

pub(crate) fn first4(bytes: &[u8]) -> [u8; 4] {
	let mut magic = [0_u8; 4];
	let take = bytes.len().min(4);
	magic[..take].copy_from_slice(&bytes[..take]);
	magic
}

fn parse_digits(bytes: &[u8]) -> Option<u16> {
	if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
		return None;
	}
	bytes.iter().try_fold(0_u16, |acc, byte| acc.checked_mul(10)?.checked_add(u16::from(byte - b'0')))
}
