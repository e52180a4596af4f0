use crate::blend::bytes::Cursor;
use crate::blend::{BlendError, Endianness, Result};

/// Raw struct-descriptor tables embedded in the `DNA1` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dna {
	/// Field declarators from `NAME` (`*next`, `name[64]`, ...).
	pub names: Vec<Box<str>>,
	/// Type names from `TYPE`.
	pub types: Vec<Box<str>>,
	/// Per-type byte sizes from `TLEN`.
	pub tlen: Vec<u16>,
	/// Struct declarations from `STRC`; the position is the block `sdna_nr`.
	pub structs: Vec<DnaStruct>,
	/// `type_idx -> struct index` for types that are structs.
	pub struct_for_type: Vec<Option<u32>>,
}

/// One `STRC` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaStruct {
	/// Type index of the struct name.
	pub type_idx: u16,
	/// Fields in declaration order.
	pub fields: Vec<DnaField>,
}

/// One `(type, name)` pair inside a `STRC` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnaField {
	/// Index into [`Dna::types`].
	pub type_idx: u16,
	/// Index into [`Dna::names`].
	pub name_idx: u16,
}

impl Dna {
	/// Parse a `DNA1` payload, reading counts and indices in the file's byte order.
	pub fn parse(payload: &[u8], order: Endianness) -> Result<Self> {
		let mut cursor = Cursor::new(payload);
		expect_tag(&mut cursor, *b"SDNA")?;

		let names = read_string_table(&mut cursor, *b"NAME", order)?;
		let types = read_string_table(&mut cursor, *b"TYPE", order)?;

		expect_tag(&mut cursor, *b"TLEN")?;
		let tlen = (0..types.len()).map(|_| cursor.read_u16(order)).collect::<Result<Vec<_>>>()?;
		cursor.align4()?;

		expect_tag(&mut cursor, *b"STRC")?;
		let struct_count = cursor.read_u32(order)? as usize;
		let mut structs = Vec::with_capacity(struct_count.min(payload.len()));
		for _ in 0..struct_count {
			let type_idx = cursor.read_u16(order)?;
			check_index("struct.type_idx", type_idx, types.len())?;

			let field_count = usize::from(cursor.read_u16(order)?);
			let mut fields = Vec::with_capacity(field_count);
			for _ in 0..field_count {
				let field = DnaField {
					type_idx: cursor.read_u16(order)?,
					name_idx: cursor.read_u16(order)?,
				};
				check_index("field.type_idx", field.type_idx, types.len())?;
				check_index("field.name_idx", field.name_idx, names.len())?;
				fields.push(field);
			}
			structs.push(DnaStruct { type_idx, fields });
		}

		let mut struct_for_type = vec![None; types.len()];
		for (idx, item) in structs.iter().enumerate() {
			let idx = idx as u32;
			if let Some(first) = struct_for_type[usize::from(item.type_idx)].replace(idx) {
				return Err(BlendError::DnaDuplicateStructType {
					type_idx: item.type_idx,
					first,
					second: idx,
				});
			}
		}

		Ok(Self {
			names,
			types,
			tlen,
			structs,
			struct_for_type,
		})
	}

	/// Type name by type index.
	pub fn type_name(&self, type_idx: u16) -> &str {
		&self.types[usize::from(type_idx)]
	}

	/// Field declarator by name index.
	pub fn field_name(&self, name_idx: u16) -> &str {
		&self.names[usize::from(name_idx)]
	}

	/// Byte size of a type.
	pub fn type_size(&self, type_idx: u16) -> usize {
		usize::from(self.tlen[usize::from(type_idx)])
	}
}

fn read_string_table(cursor: &mut Cursor<'_>, tag: [u8; 4], order: Endianness) -> Result<Vec<Box<str>>> {
	expect_tag(cursor, tag)?;
	let count = cursor.read_u32(order)? as usize;
	let mut out = Vec::with_capacity(count.min(cursor.remaining()));
	for _ in 0..count {
		let raw = cursor.read_cstring_bytes()?;
		out.push(String::from_utf8_lossy(raw).into());
	}
	cursor.align4()?;
	Ok(out)
}

fn expect_tag(cursor: &mut Cursor<'_>, expected: [u8; 4]) -> Result<()> {
	let at = cursor.pos();
	let got = cursor.read_code4()?;
	if got != expected {
		return Err(BlendError::DnaBadTag { expected, got, at });
	}
	Ok(())
}

fn check_index(kind: &'static str, idx: u16, len: usize) -> Result<()> {
	if usize::from(idx) >= len {
		return Err(BlendError::DnaIndexOutOfRange {
			kind,
			idx: u32::from(idx),
			max: len.saturating_sub(1) as u32,
		});
	}
	Ok(())
}
