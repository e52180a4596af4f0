use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::blend::{BlockEntry, Schema};

/// How stored pointer values relate to block addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerStorage {
	/// Addresses look like memory: block ranges never overlap, and a pointer may land inside a
	/// multi-element block on an element boundary.
	AddressRanges,
	/// Addresses are opaque identifiers whose implied ranges overlap; only exact matches resolve.
	StableIds,
}

impl PointerStorage {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::AddressRanges => "address_ranges",
			Self::StableIds => "stable_ids",
		}
	}
}

/// Where a pointer landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
	/// Catalogue index of the owning block.
	pub block: usize,
	/// Struct element inside that block.
	pub element: usize,
}

#[derive(Debug, Clone, Copy)]
struct AddrRange {
	start: u64,
	end: u64,
	block: usize,
	stride: usize,
	nr: u64,
}

/// Address lookup built once per file.
#[derive(Debug, Clone)]
pub struct AddressIndex {
	exact: HashMap<u64, usize>,
	ranges: Vec<AddrRange>,
	storage: PointerStorage,
	duplicates: usize,
}

impl AddressIndex {
	/// Index every block with a non-zero address.
	///
	/// When several blocks share an address the first one in file order owns it; later ones stay
	/// in the catalogue but are not reachable through pointers.
	pub fn build(entries: &[BlockEntry], schema: Option<&Schema>) -> Self {
		let mut exact = HashMap::with_capacity(entries.len());
		let mut ranges = Vec::with_capacity(entries.len());
		let mut duplicates = 0_usize;

		for (idx, entry) in entries.iter().enumerate() {
			let head = &entry.head;
			if head.old == 0 || head.is_endb() {
				continue;
			}

			match exact.entry(head.old) {
				Entry::Occupied(slot) => {
					tracing::warn!(address = format_args!("0x{:x}", head.old), first = *slot.get(), second = idx, "duplicate block address; keeping the first");
					duplicates += 1;
					continue;
				}
				Entry::Vacant(slot) => {
					slot.insert(idx);
				}
			}

			let len = entry.payload.len() as u64;
			if len == 0 {
				continue;
			}
			let stride = schema.and_then(|schema| schema.struct_by_index(head.sdna_nr)).map_or(0, |item| item.size);
			ranges.push(AddrRange {
				start: head.old,
				end: head.old.saturating_add(len),
				block: idx,
				stride,
				nr: head.nr,
			});
		}

		ranges.sort_by_key(|range| range.start);
		let overlapping = ranges.windows(2).any(|pair| pair[1].start < pair[0].end);
		let storage = if overlapping {
			PointerStorage::StableIds
		} else {
			PointerStorage::AddressRanges
		};

		tracing::debug!(addresses = exact.len(), duplicates, storage = storage.as_str(), "built address index");
		Self {
			exact,
			ranges,
			storage,
			duplicates,
		}
	}

	/// Detected pointer storage mode.
	pub fn storage(&self) -> PointerStorage {
		self.storage
	}

	/// Blocks skipped because an earlier block already owned their address.
	pub fn duplicates(&self) -> usize {
		self.duplicates
	}

	/// Catalogue index of the block whose address is exactly `ptr`.
	pub fn block_at(&self, ptr: u64) -> Option<usize> {
		self.exact.get(&ptr).copied()
	}

	/// Map a non-zero pointer to its block and element.
	///
	/// Returns `None` for `0` and for addresses no block owns, including pointers that land
	/// between element boundaries.
	pub fn resolve(&self, ptr: u64) -> Option<Target> {
		if ptr == 0 {
			return None;
		}
		if let Some(block) = self.block_at(ptr) {
			return Some(Target { block, element: 0 });
		}
		if self.storage == PointerStorage::StableIds {
			return None;
		}

		let idx = self.ranges.partition_point(|range| range.start <= ptr);
		let range = self.ranges.get(idx.checked_sub(1)?)?;
		if ptr >= range.end || range.stride == 0 {
			return None;
		}

		let offset = usize::try_from(ptr - range.start).ok()?;
		if offset % range.stride != 0 {
			return None;
		}
		let element = offset / range.stride;
		(u64::try_from(element).ok()? < range.nr).then_some(Target { block: range.block, element })
	}

	/// Number of indexed addresses.
	pub fn len(&self) -> usize {
		self.exact.len()
	}

	/// Return whether no block has a non-zero address.
	pub fn is_empty(&self) -> bool {
		self.exact.is_empty()
	}
}
