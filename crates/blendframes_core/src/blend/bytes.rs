use crate::blend::{BlendError, Endianness, Result};

/// Bounded cursor over an immutable byte slice.
///
/// Every multi-byte read takes the file's [`Endianness`]; nothing here assumes a host byte order.
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Read exactly `n` bytes and advance.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(BlendError::UnexpectedEof {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let raw = self.read_exact(N)?;
		let mut out = [0_u8; N];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read a four-byte block or section code.
	pub fn read_code4(&mut self) -> Result<[u8; 4]> {
		self.read_array()
	}

	/// Read a `u16`.
	pub fn read_u16(&mut self, endianness: Endianness) -> Result<u16> {
		let raw = self.read_array()?;
		Ok(match endianness {
			Endianness::Little => u16::from_le_bytes(raw),
			Endianness::Big => u16::from_be_bytes(raw),
		})
	}

	/// Read a `u32`.
	pub fn read_u32(&mut self, endianness: Endianness) -> Result<u32> {
		let raw = self.read_array()?;
		Ok(match endianness {
			Endianness::Little => u32::from_le_bytes(raw),
			Endianness::Big => u32::from_be_bytes(raw),
		})
	}

	/// Read an `i32`.
	pub fn read_i32(&mut self, endianness: Endianness) -> Result<i32> {
		Ok(self.read_u32(endianness)? as i32)
	}

	/// Read a `u64`.
	pub fn read_u64(&mut self, endianness: Endianness) -> Result<u64> {
		let raw = self.read_array()?;
		Ok(match endianness {
			Endianness::Little => u64::from_le_bytes(raw),
			Endianness::Big => u64::from_be_bytes(raw),
		})
	}

	/// Read an `i64`.
	pub fn read_i64(&mut self, endianness: Endianness) -> Result<i64> {
		Ok(self.read_u64(endianness)? as i64)
	}

	/// Read a pointer-sized unsigned integer and widen to `u64`.
	pub fn read_ptr(&mut self, pointer_size: usize, endianness: Endianness) -> Result<u64> {
		match pointer_size {
			4 => Ok(u64::from(self.read_u32(endianness)?)),
			8 => self.read_u64(endianness),
			_ => Err(BlendError::UnsupportedPointerSize { pointer_size }),
		}
	}

	/// Advance to the next 4-byte aligned position.
	pub fn align4(&mut self) -> Result<()> {
		let skip = self.pos.next_multiple_of(4) - self.pos;
		self.read_exact(skip)?;
		Ok(())
	}

	/// Read a zero-terminated byte string without the terminator.
	pub fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
		let rem = &self.bytes[self.pos.min(self.bytes.len())..];
		let Some(len) = rem.iter().position(|byte| *byte == 0) else {
			return Err(BlendError::UnexpectedEof {
				at: self.pos,
				need: 1,
				rem: self.remaining(),
			});
		};

		let out = self.read_exact(len)?;
		self.pos += 1;
		Ok(out)
	}
}

/// Decode an unsigned integer of 1, 2, 4, or 8 bytes.
pub(crate) fn uint_from_bytes(bytes: &[u8], endianness: Endianness) -> Option<u64> {
	if !matches!(bytes.len(), 1 | 2 | 4 | 8) {
		return None;
	}

	let fold = |acc: u64, byte: &u8| (acc << 8) | u64::from(*byte);
	Some(match endianness {
		Endianness::Big => bytes.iter().fold(0, fold),
		Endianness::Little => bytes.iter().rev().fold(0, fold),
	})
}
