use crate::blend::bytes::Cursor;
use crate::blend::{BlendError, BlendHeader, BlockLayout, Result};

/// Sentinel code terminating the block sequence.
pub const ENDB: [u8; 4] = *b"ENDB";

/// One block record header, read without touching the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BHead {
	/// Four-byte block code, zero padded.
	pub code: [u8; 4],
	/// Struct descriptor index for payload interpretation.
	pub sdna_nr: u32,
	/// Address identity other blocks use to point at this one.
	pub old: u64,
	/// Payload byte length.
	pub len: u64,
	/// Number of struct elements in the payload.
	pub nr: u64,
}

impl BHead {
	/// Parse a block header at the cursor using the file's layout, width and byte order.
	pub fn parse(cursor: &mut Cursor<'_>, header: &BlendHeader) -> Result<Self> {
		let order = header.endianness;
		let code = cursor.read_code4()?;

		let (sdna_nr, old, len, nr) = match header.block_layout {
			BlockLayout::Legacy => {
				let len = i64::from(cursor.read_i32(order)?);
				let old = cursor.read_ptr(header.pointer_size, order)?;
				let sdna_nr = cursor.read_u32(order)?;
				let nr = i64::from(cursor.read_i32(order)?);
				(sdna_nr, old, len, nr)
			}
			BlockLayout::Large => {
				let sdna_nr = cursor.read_u32(order)?;
				let old = cursor.read_u64(order)?;
				let len = cursor.read_i64(order)?;
				let nr = cursor.read_i64(order)?;
				(sdna_nr, old, len, nr)
			}
		};

		let len = u64::try_from(len).map_err(|_| BlendError::NegativeBlockLength { len })?;
		let nr = u64::try_from(nr).map_err(|_| BlendError::NegativeBlockCount { nr })?;

		Ok(Self { code, sdna_nr, old, len, nr })
	}

	/// Return `true` for the terminal `ENDB` record.
	pub fn is_endb(&self) -> bool {
		self.code == ENDB
	}
}
