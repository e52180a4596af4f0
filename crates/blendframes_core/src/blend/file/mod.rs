use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::blend::compression::decode_bytes;
use crate::blend::value::StructValue;
use crate::blend::{
	AddressIndex, BlendError, BlendHeader, Block, BlockEntry, BlockScanner, Compression, DecodeOptions, Dna, PointerStorage, Result, Schema,
	decode_block,
};

/// Default ceiling for zstd output.
pub const DEFAULT_MAX_DECOMPRESSED_BYTES: usize = 512 * 1024 * 1024;

/// Settings used when opening a file.
#[derive(Debug, Clone)]
pub struct OpenOptions {
	schema: Option<Arc<Schema>>,
	max_decompressed_bytes: usize,
	decode: DecodeOptions,
}

impl Default for OpenOptions {
	fn default() -> Self {
		Self {
			schema: None,
			max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
			decode: DecodeOptions::default(),
		}
	}
}

impl OpenOptions {
	/// Options with defaults: embedded `DNA1` schema, 512 MiB decompression cap.
	pub fn new() -> Self {
		Self::default()
	}

	/// Use this struct table instead of the file's `DNA1` block.
	pub fn schema(mut self, schema: Arc<Schema>) -> Self {
		self.schema = Some(schema);
		self
	}

	/// Cap decompressed size for zstd input.
	pub fn max_decompressed_bytes(mut self, limit: usize) -> Self {
		self.max_decompressed_bytes = limit;
		self
	}

	/// Decoder limits used by the per-block cache.
	pub fn decode(mut self, decode: DecodeOptions) -> Self {
		self.decode = decode;
		self
	}

	/// Read and index a file from disk.
	pub fn open(&self, path: impl AsRef<Path>) -> Result<BlendFile> {
		let path = path.as_ref();
		tracing::debug!(path = %path.display(), "opening blend file");
		let raw = fs::read(path)?;
		self.open_bytes(raw)
	}

	/// Index an in-memory file image (raw or zstd-compressed).
	pub fn open_bytes(&self, raw: Vec<u8>) -> Result<BlendFile> {
		let (compression, bytes) = decode_bytes(raw, self.max_decompressed_bytes)?;
		let header = BlendHeader::parse(&bytes)?;

		let entries = BlockScanner::new(&bytes, header).collect::<Result<Vec<_>>>()?;
		if !entries.last().is_some_and(|entry| entry.head.is_endb()) {
			tracing::warn!(blocks = entries.len(), "block sequence ended without ENDB");
		}

		let schema = match &self.schema {
			Some(schema) => {
				if schema.pointer_size() != header.pointer_size {
					return Err(BlendError::UnsupportedPointerSize {
						pointer_size: schema.pointer_size(),
					});
				}
				Some(Arc::clone(schema))
			}
			None => embedded_schema(&bytes, &entries, &header)?.map(Arc::new),
		};

		let addresses = AddressIndex::build(&entries, schema.as_deref());
		let decoded = entries.iter().map(|_| OnceLock::new()).collect();

		tracing::debug!(
			blocks = entries.len(),
			version = header.version,
			pointer_size = header.pointer_size,
			endianness = header.endianness.as_str(),
			compression = compression.as_str(),
			has_schema = schema.is_some(),
			"indexed blend file"
		);

		Ok(BlendFile {
			header,
			compression,
			bytes,
			entries,
			schema,
			addresses,
			decoded,
			decode: self.decode.clone(),
		})
	}
}

fn embedded_schema(bytes: &[u8], entries: &[BlockEntry], header: &BlendHeader) -> Result<Option<Schema>> {
	let Some(entry) = entries.iter().find(|entry| entry.head.code == *b"DNA1") else {
		tracing::debug!("no DNA1 block; field access will need a supplied schema");
		return Ok(None);
	};

	let dna = Dna::parse(&bytes[entry.payload.clone()], header.endianness)?;
	Schema::from_dna(&dna, header.pointer_size).map(Some)
}

/// An opened file: decoded bytes, block catalogue, struct table, and decode cache.
///
/// Everything is read at open time; dropping the handle releases it all.
pub struct BlendFile {
	/// Parsed file header.
	pub header: BlendHeader,
	/// Compression the file was stored with.
	pub compression: Compression,
	bytes: Vec<u8>,
	entries: Vec<BlockEntry>,
	schema: Option<Arc<Schema>>,
	addresses: AddressIndex,
	decoded: Vec<OnceLock<Vec<StructValue>>>,
	decode: DecodeOptions,
}

impl BlendFile {
	/// Open with default [`OpenOptions`].
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		OpenOptions::default().open(path)
	}

	/// Index an in-memory image with default [`OpenOptions`].
	pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
		OpenOptions::default().open_bytes(raw)
	}

	/// Decompressed file bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// All blocks in file order, `ENDB` included when present.
	pub fn blocks(&self) -> Blocks<'_> {
		Blocks { file: self, next: 0 }
	}

	/// Number of catalogued blocks.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Return whether the file holds no blocks.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Block by catalogue position.
	pub fn block(&self, index: usize) -> Option<Block<'_>> {
		(index < self.entries.len()).then(|| Block::new(self, index, 0))
	}

	/// First block whose code matches; codes shorter than four bytes are zero padded.
	pub fn find_first(&self, code: &[u8]) -> Option<Block<'_>> {
		let code = code4(code)?;
		let index = self.entries.iter().position(|entry| entry.head.code == code)?;
		Some(Block::new(self, index, 0))
	}

	/// Block whose address is exactly `address`.
	pub fn block_by_address(&self, address: u64) -> Option<Block<'_>> {
		self.addresses.block_at(address).map(|index| Block::new(self, index, 0))
	}

	/// Resolve a stored pointer: `0` is no value, an address no block owns is an error.
	pub fn resolve(&self, ptr: u64) -> Result<Option<Block<'_>>> {
		if ptr == 0 {
			return Ok(None);
		}
		let target = self.addresses.resolve(ptr).ok_or(BlendError::DanglingPointer { ptr })?;
		Ok(Some(Block::new(self, target.block, target.element)))
	}

	/// Blocks whose address was already claimed by an earlier block.
	pub fn duplicate_addresses(&self) -> usize {
		self.addresses.duplicates()
	}

	/// How this file's pointers map to block addresses.
	pub fn pointer_storage(&self) -> PointerStorage {
		self.addresses.storage()
	}

	/// Struct table, from `DNA1` or [`OpenOptions::schema`].
	pub fn schema(&self) -> Result<&Schema> {
		self.schema.as_deref().ok_or(BlendError::DnaNotFound)
	}

	/// Decoder limits in effect.
	pub fn decode_options(&self) -> &DecodeOptions {
		&self.decode
	}

	/// Count blocks per code and note the structural markers.
	pub fn scan_block_stats(&self) -> BlockStats {
		let mut stats = BlockStats::default();
		for entry in &self.entries {
			stats.block_count += 1;
			stats.last_code = entry.head.code;
			*stats.codes.entry(entry.head.code).or_insert(0) += 1;
			stats.has_dna1 |= entry.head.code == *b"DNA1";
			stats.has_endb |= entry.head.is_endb();
		}
		stats
	}

	pub(crate) fn entry(&self, index: usize) -> &BlockEntry {
		&self.entries[index]
	}

	pub(crate) fn elements(&self, index: usize) -> Result<&[StructValue]> {
		let cell = &self.decoded[index];
		if let Some(values) = cell.get() {
			return Ok(values.as_slice());
		}

		let entry = &self.entries[index];
		tracing::trace!(index, code = ?entry.head.code, nr = entry.head.nr, "decoding block");
		let values = decode_block(self.schema()?, &entry.head, &self.bytes[entry.payload.clone()], self.header.endianness, &self.decode)?;
		Ok(cell.get_or_init(|| values).as_slice())
	}
}

fn code4(code: &[u8]) -> Option<[u8; 4]> {
	if code.is_empty() || code.len() > 4 {
		return None;
	}
	let mut out = [0_u8; 4];
	out[..code.len()].copy_from_slice(code);
	Some(out)
}

/// File-ordered block iterator; call [`BlendFile::blocks`] again to restart.
#[derive(Debug, Clone)]
pub struct Blocks<'f> {
	file: &'f BlendFile,
	next: usize,
}

impl<'f> Iterator for Blocks<'f> {
	type Item = Block<'f>;

	fn next(&mut self) -> Option<Self::Item> {
		let block = self.file.block(self.next)?;
		self.next += 1;
		Some(block)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let left = self.file.len().saturating_sub(self.next);
		(left, Some(left))
	}
}

impl ExactSizeIterator for Blocks<'_> {}

impl std::fmt::Debug for BlendFile {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BlendFile")
			.field("header", &self.header)
			.field("compression", &self.compression)
			.field("blocks", &self.entries.len())
			.field("pointer_storage", &self.addresses.storage())
			.finish_non_exhaustive()
	}
}

/// Per-code block counts and structural markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockStats {
	/// Total number of blocks.
	pub block_count: u32,
	/// Whether a `DNA1` block is present.
	pub has_dna1: bool,
	/// Whether the sequence is terminated by `ENDB`.
	pub has_endb: bool,
	/// Code of the last block.
	pub last_code: [u8; 4],
	/// Count per block code.
	pub codes: HashMap<[u8; 4], u32>,
}

#[cfg(test)]
mod tests;
