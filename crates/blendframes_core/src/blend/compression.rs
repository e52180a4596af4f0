use std::io::Read;

use crate::blend::header::{BLEND_MAGIC, first4};
use crate::blend::{BlendError, Result};

/// zstd frame magic used by compressed `.blend` files.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compression mode detected for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Raw uncompressed stream.
	None,
	/// zstd-compressed stream.
	Zstd,
}

impl Compression {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}
}

/// Detect compression from the leading magic and return `(mode, decoded_bytes)`.
///
/// Anything that is neither raw `BLENDER` nor a zstd frame fails here, before any block is scanned.
pub fn decode_bytes(raw: Vec<u8>, limit: usize) -> Result<(Compression, Vec<u8>)> {
	if raw.starts_with(BLEND_MAGIC) {
		return Ok((Compression::None, raw));
	}

	if raw.starts_with(&ZSTD_MAGIC) {
		let out = decode_zstd(&raw, limit)?;
		return Ok((Compression::Zstd, out));
	}

	Err(BlendError::UnknownMagic { magic: first4(&raw) })
}

fn decode_zstd(raw: &[u8], limit: usize) -> Result<Vec<u8>> {
	let decoder = zstd::stream::read::Decoder::new(raw).map_err(corrupt)?;
	let mut out = Vec::new();
	// One extra byte distinguishes "exactly at the limit" from "over it".
	let read = decoder.take((limit as u64).saturating_add(1)).read_to_end(&mut out).map_err(corrupt)?;
	if read > limit {
		return Err(BlendError::DecompressedTooLarge { limit });
	}

	if !out.starts_with(BLEND_MAGIC) {
		return Err(BlendError::NotBlendAfterDecompress);
	}

	tracing::debug!(compressed = raw.len(), decompressed = out.len(), "decompressed zstd stream");
	Ok(out)
}

fn corrupt(err: std::io::Error) -> BlendError {
	BlendError::Decompress { reason: err.to_string() }
}

#[cfg(test)]
mod tests {
	use super::{Compression, decode_bytes};
	use crate::blend::{BlendError, ErrorKind};

	#[test]
	fn raw_blend_passes_through() {
		let (mode, bytes) = decode_bytes(b"BLENDER-v279rest".to_vec(), 1024).expect("raw passes");
		assert_eq!(mode, Compression::None);
		assert_eq!(bytes, b"BLENDER-v279rest");
	}

	#[test]
	fn zstd_stream_is_decompressed() {
		let packed = zstd::encode_all(&b"BLENDER-v279rest"[..], 3).expect("encode");
		let (mode, bytes) = decode_bytes(packed, 1024).expect("zstd decodes");
		assert_eq!(mode, Compression::Zstd);
		assert_eq!(bytes, b"BLENDER-v279rest");
	}

	#[test]
	fn zstd_output_limit_is_enforced() {
		let packed = zstd::encode_all(&[b'B'; 64][..], 3).expect("encode");
		let err = decode_bytes(packed, 16).expect_err("limit exceeded");
		assert!(matches!(err, BlendError::DecompressedTooLarge { limit: 16 }));
	}

	#[test]
	fn zstd_payload_must_be_blend() {
		let packed = zstd::encode_all(&b"PNG stuff"[..], 3).expect("encode");
		let err = decode_bytes(packed, 1024).expect_err("not blend");
		assert!(matches!(err, BlendError::NotBlendAfterDecompress));
	}

	#[test]
	fn corrupt_zstd_frame_is_format_error() {
		let mut garbage = super::ZSTD_MAGIC.to_vec();
		garbage.extend_from_slice(b"garbage after a valid magic");
		let err = decode_bytes(garbage, 1024).expect_err("corrupt frame");
		assert!(matches!(err, BlendError::Decompress { .. }), "{err:?}");
		assert_eq!(err.kind(), ErrorKind::Format);
	}

	#[test]
	fn truncated_zstd_frame_is_format_error() {
		let body: Vec<u8> = b"BLENDER-v279".iter().copied().chain((0..4096_u32).map(|idx| (idx * 7 % 251) as u8)).collect();
		let mut packed = zstd::encode_all(body.as_slice(), 3).expect("encode");
		packed.truncate(packed.len() / 2);
		let err = decode_bytes(packed, 1 << 20).expect_err("truncated frame");
		assert!(matches!(err, BlendError::Decompress { .. }), "{err:?}");
		assert_eq!(err.kind(), ErrorKind::Format);
	}

	#[test]
	fn unknown_magic_is_rejected() {
		let err = decode_bytes(b"GIF89a".to_vec(), 1024).expect_err("unknown magic");
		assert!(matches!(err, BlendError::UnknownMagic { magic } if magic == *b"GIF8"));
	}
}
