use std::collections::HashMap;

use crate::blend::decl::parse_declarator;
use crate::blend::{BlendError, Dna, Result};

/// Primitive field storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
	/// `char`; arrays of it decode as strings.
	Char,
	/// `int8_t`.
	I8,
	/// `uchar`, `uint8_t`.
	U8,
	/// `short`, `int16_t`.
	I16,
	/// `ushort`, `uint16_t`.
	U16,
	/// `int`, `int32_t`.
	I32,
	/// `uint`, `uint32_t`.
	U32,
	/// `int64_t`.
	I64,
	/// `uint64_t`.
	U64,
	/// `float`.
	F32,
	/// `double`.
	F64,
	/// `bool`.
	Bool,
}

impl ScalarType {
	/// Storage size in bytes.
	pub fn size(self) -> usize {
		match self {
			Self::Char | Self::I8 | Self::U8 | Self::Bool => 1,
			Self::I16 | Self::U16 => 2,
			Self::I32 | Self::U32 | Self::F32 => 4,
			Self::I64 | Self::U64 | Self::F64 => 8,
		}
	}

	/// Map a DNA primitive type name (with its declared size) to a scalar kind.
	pub fn from_dna(type_name: &str, size: usize) -> Option<Self> {
		let scalar = match (type_name, size) {
			("char", 1) => Self::Char,
			("float", 4) => Self::F32,
			("double", 8) => Self::F64,
			("bool", 1) => Self::Bool,
			(name, size) => {
				let unsigned = name.starts_with('u');
				match (size, unsigned) {
					(1, false) => Self::I8,
					(1, true) => Self::U8,
					(2, false) => Self::I16,
					(2, true) => Self::U16,
					(4, false) => Self::I32,
					(4, true) => Self::U32,
					(8, false) => Self::I64,
					(8, true) => Self::U64,
					_ => return None,
				}
			}
		};
		Some(scalar)
	}
}

/// How a field's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
	/// Primitive value(s).
	Scalar(ScalarType),
	/// Inline nested struct, by struct index.
	Struct(u32),
	/// Stored address; `target` is the pointee struct when it is a single-level pointer to a known struct.
	Pointer {
		/// Pointee struct index.
		target: Option<u32>,
	},
	/// Bytes the schema cannot interpret (`void`, unknown primitives).
	Opaque,
}

/// One field in a struct layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
	/// Field identifier.
	pub name: Box<str>,
	/// Declared type name.
	pub type_name: Box<str>,
	/// Byte offset from the start of the struct.
	pub offset: usize,
	/// Size of one element.
	pub elem_size: usize,
	/// Inline array length; `1` for plain fields.
	pub array_len: usize,
	/// Interpretation.
	pub kind: FieldKind,
}

impl FieldDef {
	/// Total storage size of the field.
	pub fn size(&self) -> usize {
		self.elem_size.saturating_mul(self.array_len)
	}

	/// Whether this field stores an address.
	pub fn is_pointer(&self) -> bool {
		matches!(self.kind, FieldKind::Pointer { .. })
	}
}

/// Layout of one struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
	/// Struct type name.
	pub name: Box<str>,
	/// Size of one instance in bytes.
	pub size: usize,
	/// Fields in declaration order.
	pub fields: Vec<FieldDef>,
}

impl StructDef {
	/// Find a field by identifier.
	pub fn field(&self, name: &str) -> Option<&FieldDef> {
		self.fields.iter().find(|field| field.name.as_ref() == name)
	}
}

/// Struct descriptor table: how to read the payload of a block with a given struct index.
///
/// Usually derived from the file's own `DNA1` block, but can be built by hand with
/// [`SchemaBuilder`] and handed to [`OpenOptions::schema`](crate::blend::OpenOptions::schema).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
	pointer_size: usize,
	structs: Vec<StructDef>,
	by_name: HashMap<Box<str>, u32>,
}

impl Schema {
	/// Derive field offsets and kinds from parsed DNA tables.
	pub fn from_dna(dna: &Dna, pointer_size: usize) -> Result<Self> {
		if !matches!(pointer_size, 4 | 8) {
			return Err(BlendError::UnsupportedPointerSize { pointer_size });
		}

		let mut structs = Vec::with_capacity(dna.structs.len());

		for item in &dna.structs {
			let mut offset = 0_usize;
			let mut fields = Vec::with_capacity(item.fields.len());

			for field in &item.fields {
				let type_name = dna.type_name(field.type_idx);
				let decl = parse_declarator(dna.field_name(field.name_idx));
				let struct_idx = dna.struct_for_type[usize::from(field.type_idx)];

				let (kind, elem_size) = if decl.is_pointer() {
					let target = if decl.ptr_depth == 1 && !decl.is_func_ptr { struct_idx } else { None };
					(FieldKind::Pointer { target }, pointer_size)
				} else if let Some(idx) = struct_idx {
					(FieldKind::Struct(idx), dna.type_size(field.type_idx))
				} else {
					let size = dna.type_size(field.type_idx);
					match ScalarType::from_dna(type_name, size) {
						Some(scalar) => (FieldKind::Scalar(scalar), size),
						None => (FieldKind::Opaque, size),
					}
				};

				fields.push(FieldDef {
					name: decl.ident.into(),
					type_name: type_name.into(),
					offset,
					elem_size,
					array_len: decl.array_len,
					kind,
				});
				offset = offset.saturating_add(elem_size.saturating_mul(decl.array_len));
			}

			structs.push(StructDef {
				name: dna.type_name(item.type_idx).into(),
				size: dna.type_size(item.type_idx),
				fields,
			});
		}

		Ok(Self::from_structs(pointer_size, structs))
	}

	/// Start a hand-written schema.
	pub fn builder(pointer_size: usize) -> SchemaBuilder {
		SchemaBuilder {
			pointer_size,
			structs: Vec::new(),
		}
	}

	fn from_structs(pointer_size: usize, structs: Vec<StructDef>) -> Self {
		let by_name = structs.iter().enumerate().map(|(idx, item)| (item.name.clone(), idx as u32)).collect();
		Self {
			pointer_size,
			structs,
			by_name,
		}
	}

	/// Pointer width the layouts were computed for.
	pub fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	/// All structs, indexed by block `sdna_nr`.
	pub fn structs(&self) -> &[StructDef] {
		&self.structs
	}

	/// Struct by block `sdna_nr`.
	pub fn struct_by_index(&self, sdna_nr: u32) -> Option<&StructDef> {
		self.structs.get(sdna_nr as usize)
	}

	/// Struct index by type name.
	pub fn index_of(&self, name: &str) -> Option<u32> {
		self.by_name.get(name).copied()
	}

	/// Struct by type name.
	pub fn struct_by_name(&self, name: &str) -> Option<&StructDef> {
		self.index_of(name).and_then(|idx| self.struct_by_index(idx))
	}
}

/// Declared type of a [`FieldSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
	/// Primitive value.
	Scalar(ScalarType),
	/// Inline struct, by name; must be declared earlier.
	Struct(String),
	/// Pointer to a named struct.
	Pointer(String),
	/// Untyped pointer.
	VoidPointer,
}

/// Field declaration for [`SchemaBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
	name: String,
	ty: FieldType,
	array_len: usize,
}

impl FieldSpec {
	/// Primitive field.
	pub fn scalar(name: &str, scalar: ScalarType) -> Self {
		Self::new(name, FieldType::Scalar(scalar))
	}

	/// Pointer to a struct type.
	pub fn pointer(name: &str, target: &str) -> Self {
		Self::new(name, FieldType::Pointer(target.to_owned()))
	}

	/// `void *` field.
	pub fn void_pointer(name: &str) -> Self {
		Self::new(name, FieldType::VoidPointer)
	}

	/// Inline nested struct.
	pub fn inline(name: &str, struct_name: &str) -> Self {
		Self::new(name, FieldType::Struct(struct_name.to_owned()))
	}

	/// Make this an inline array of `len` elements.
	pub fn array(mut self, len: usize) -> Self {
		self.array_len = len;
		self
	}

	fn new(name: &str, ty: FieldType) -> Self {
		Self {
			name: name.to_owned(),
			ty,
			array_len: 1,
		}
	}
}

/// Builder for a hand-written [`Schema`]; structs get indices in declaration order.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
	pointer_size: usize,
	structs: Vec<(String, Vec<FieldSpec>)>,
}

impl SchemaBuilder {
	/// Declare a struct with packed sequential fields.
	pub fn add_struct(mut self, name: &str, fields: Vec<FieldSpec>) -> Self {
		self.structs.push((name.to_owned(), fields));
		self
	}

	/// Resolve type names and compute layouts.
	pub fn build(self) -> Result<Schema> {
		let mut index = HashMap::with_capacity(self.structs.len());
		for (idx, (name, _)) in self.structs.iter().enumerate() {
			if index.insert(name.as_str(), idx as u32).is_some() {
				return Err(BlendError::DuplicateStruct { name: name.clone() });
			}
		}
		let lookup = |name: &str| index.get(name).copied().ok_or_else(|| BlendError::UnknownType { name: name.to_owned() });

		let mut structs: Vec<StructDef> = Vec::with_capacity(self.structs.len());
		for (name, specs) in &self.structs {
			let mut offset = 0_usize;
			let mut fields = Vec::with_capacity(specs.len());
			for spec in specs {
				let (kind, elem_size, type_name) = match &spec.ty {
					FieldType::Scalar(scalar) => (FieldKind::Scalar(*scalar), scalar.size(), scalar_name(*scalar).to_owned()),
					FieldType::Pointer(target) => (FieldKind::Pointer { target: Some(lookup(target)?) }, self.pointer_size, target.clone()),
					FieldType::VoidPointer => (FieldKind::Pointer { target: None }, self.pointer_size, "void".to_owned()),
					FieldType::Struct(inner) => {
						let idx = lookup(inner)?;
						let size = structs
							.get(idx as usize)
							.map(|item| item.size)
							.ok_or_else(|| BlendError::UnknownType { name: inner.clone() })?;
						(FieldKind::Struct(idx), size, inner.clone())
					}
				};

				fields.push(FieldDef {
					name: spec.name.as_str().into(),
					type_name: type_name.into(),
					offset,
					elem_size,
					array_len: spec.array_len,
					kind,
				});
				offset = offset.saturating_add(elem_size.saturating_mul(spec.array_len));
			}

			structs.push(StructDef {
				name: name.as_str().into(),
				size: offset,
				fields,
			});
		}

		Ok(Schema::from_structs(self.pointer_size, structs))
	}
}

fn scalar_name(scalar: ScalarType) -> &'static str {
	match scalar {
		ScalarType::Char => "char",
		ScalarType::I8 => "int8_t",
		ScalarType::U8 => "uchar",
		ScalarType::I16 => "short",
		ScalarType::U16 => "ushort",
		ScalarType::I32 => "int",
		ScalarType::U32 => "uint",
		ScalarType::I64 => "int64_t",
		ScalarType::U64 => "uint64_t",
		ScalarType::F32 => "float",
		ScalarType::F64 => "double",
		ScalarType::Bool => "bool",
	}
}

#[cfg(test)]
mod tests;
