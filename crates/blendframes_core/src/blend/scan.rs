use std::ops::Range;

use crate::blend::bytes::Cursor;
use crate::blend::{BHead, BlendError, BlendHeader, Result};

/// Catalogue entry for one block record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
	/// Parsed record header.
	pub head: BHead,
	/// File offset of the record header.
	pub offset: usize,
	/// Payload span inside the (decompressed) file bytes.
	pub payload: Range<usize>,
}

/// Sequential block-record reader; stops after `ENDB` or on the first error.
pub struct BlockScanner<'a> {
	cursor: Cursor<'a>,
	header: BlendHeader,
	base: usize,
	done: bool,
}

impl<'a> BlockScanner<'a> {
	/// Start scanning right after the file header.
	pub fn new(bytes: &'a [u8], header: BlendHeader) -> Self {
		let base = header.header_size;
		Self {
			cursor: Cursor::new(bytes.get(base..).unwrap_or(&[])),
			header,
			base,
			done: false,
		}
	}

	fn read_entry(&mut self) -> Result<BlockEntry> {
		let offset = self.base + self.cursor.pos();
		let head = BHead::parse(&mut self.cursor, &self.header)?;

		let rem = self.cursor.remaining();
		let len = usize::try_from(head.len).ok().filter(|len| *len <= rem).ok_or(BlendError::BlockLenOutOfRange {
			at: offset,
			len: head.len,
			rem,
		})?;

		let start = self.base + self.cursor.pos();
		self.cursor.read_exact(len)?;
		Ok(BlockEntry {
			head,
			offset,
			payload: start..start + len,
		})
	}
}

impl Iterator for BlockScanner<'_> {
	type Item = Result<BlockEntry>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done || self.cursor.remaining() == 0 {
			self.done = true;
			return None;
		}

		let entry = self.read_entry();
		match &entry {
			Ok(entry) if !entry.head.is_endb() => {}
			_ => self.done = true,
		}
		Some(entry)
	}
}
