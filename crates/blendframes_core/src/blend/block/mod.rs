use std::fmt;
use std::ops::Range;

use crate::blend::value::{StructValue, Value};
use crate::blend::{BHead, BlendError, BlendFile, FieldDef, FieldKind, FieldPath, PathStep, Result, ScalarType, Schema, StructDef};

/// Borrowed view of one catalogued block.
///
/// `element` is non-zero only when a pointer landed inside a multi-element block.
#[derive(Clone, Copy)]
pub struct Block<'f> {
	file: &'f BlendFile,
	index: usize,
	element: usize,
}

impl<'f> Block<'f> {
	pub(crate) fn new(file: &'f BlendFile, index: usize, element: usize) -> Self {
		Self { file, index, element }
	}

	/// Owning file.
	pub fn file(&self) -> &'f BlendFile {
		self.file
	}

	/// Catalogue position.
	pub fn index(&self) -> usize {
		self.index
	}

	/// Parsed record header.
	pub fn head(&self) -> &'f BHead {
		&self.file.entry(self.index).head
	}

	/// Four-byte code, zero padded.
	pub fn code(&self) -> [u8; 4] {
		self.head().code
	}

	/// Address other blocks use to point here.
	pub fn address(&self) -> u64 {
		self.head().old
	}

	/// Struct descriptor index.
	pub fn sdna_nr(&self) -> u32 {
		self.head().sdna_nr
	}

	/// Number of struct elements in the payload.
	pub fn count(&self) -> u64 {
		self.head().nr
	}

	/// Selected element.
	pub fn element(&self) -> usize {
		self.element
	}

	/// File offset of the block record header.
	pub fn offset(&self) -> usize {
		self.file.entry(self.index).offset
	}

	/// Payload span within [`BlendFile::bytes`].
	pub fn byte_range(&self) -> Range<usize> {
		self.file.entry(self.index).payload.clone()
	}

	/// Raw payload bytes.
	pub fn payload(&self) -> &'f [u8] {
		&self.file.bytes()[self.byte_range()]
	}

	/// Struct layout for this block's `sdna_nr`.
	pub fn struct_def(&self) -> Result<&'f StructDef> {
		let sdna_nr = self.sdna_nr();
		self.file.schema()?.struct_by_index(sdna_nr).ok_or(BlendError::MissingStruct { sdna_nr })
	}

	/// Struct type name, when the schema knows it.
	pub fn struct_name(&self) -> Option<&'f str> {
		self.struct_def().ok().map(|item| item.name.as_ref())
	}

	/// Every decoded element; decoded once per block and cached on the file.
	pub fn elements(&self) -> Result<&'f [StructValue]> {
		self.file.elements(self.index)
	}

	/// Decoded fields of the selected element.
	pub fn fields(&self) -> Result<&'f StructValue> {
		let elements = self.elements()?;
		elements.get(self.element).ok_or(BlendError::IndexOutOfRange {
			index: self.element,
			len: elements.len(),
		})
	}

	/// Follow a single pointer field.
	///
	/// `Ok(None)` for a null pointer; [`BlendError::DanglingPointer`] when no block owns the address.
	pub fn get_pointer(&self, name: &str) -> Result<Option<Block<'f>>> {
		let item = self.struct_def()?;
		let field = item.field(name).ok_or_else(|| unknown_field(item, name))?;
		let expected = || BlendError::ExpectedPointer {
			struct_name: item.name.to_string(),
			field: name.to_owned(),
		};
		if !field.is_pointer() || field.array_len != 1 {
			return Err(expected());
		}

		let ptr = self.fields()?.field(name).and_then(Value::as_ptr).ok_or_else(expected)?;
		self.file.resolve(ptr)
	}

	/// Read a value by path, following pointer fields between blocks.
	///
	/// A null pointer part-way through yields `Ok(None)` once the remaining steps are checked
	/// against the pointer's declared target struct.
	pub fn get(&self, path: &FieldPath) -> Result<Option<Value>> {
		let schema = self.file.schema()?;
		let steps = path.steps();
		let mut at = Node::Struct(self.fields()?);

		for (pos, step) in steps.iter().enumerate() {
			let next = match (at, step) {
				(Node::Field(Value::Ptr(ptr), def), step) => match self.file.resolve(*ptr)? {
					None => {
						check_steps(schema, Declared::of(schema, def, true), &steps[pos..])?;
						None
					}
					Some(block) => match step {
						PathStep::Field(name) => field_node(schema, block.fields()?, name, &steps[pos + 1..])?,
						PathStep::Index(index) => Some(Node::Struct(block.nth(*index)?.fields()?)),
					},
				},
				(Node::Struct(value), PathStep::Field(name)) => field_node(schema, value, name, &steps[pos + 1..])?,
				(Node::Field(Value::Struct(value), _), PathStep::Field(name)) => field_node(schema, value, name, &steps[pos + 1..])?,
				(Node::Field(Value::Array(items), def), PathStep::Index(index)) => {
					let item = items.get(*index).ok_or(BlendError::IndexOutOfRange {
						index: *index,
						len: items.len(),
					})?;
					Some(Node::Field(item, def))
				}
				(node, PathStep::Field(name)) => {
					return Err(BlendError::ExpectedStruct {
						step: name.to_string(),
						got: node.kind(),
					});
				}
				(_, PathStep::Index(index)) => return Err(BlendError::IndexOutOfRange { index: *index, len: 0 }),
			};

			let Some(next) = next else {
				return Ok(None);
			};
			at = next;
		}

		Ok(Some(match at {
			Node::Struct(value) => Value::Struct(value.clone()),
			Node::Field(value, _) => value.clone(),
		}))
	}

	/// [`Block::get`] with a dotted path string such as `r.sfra`.
	pub fn get_path(&self, path: &str) -> Result<Option<Value>> {
		self.get(&FieldPath::parse(path)?)
	}

	fn nth(&self, index: usize) -> Result<Block<'f>> {
		let count = usize::try_from(self.count()).unwrap_or(usize::MAX);
		let element = self.element.checked_add(index).filter(|element| *element < count);
		let element = element.ok_or(BlendError::IndexOutOfRange {
			index,
			len: count.saturating_sub(self.element),
		})?;
		Ok(Block::new(self.file, self.index, element))
	}
}

#[derive(Clone, Copy)]
enum Node<'v> {
	Struct(&'v StructValue),
	Field(&'v Value, &'v FieldDef),
}

impl Node<'_> {
	fn kind(&self) -> &'static str {
		match self {
			Self::Struct(_) => "struct",
			Self::Field(value, _) => value.kind(),
		}
	}
}

/// `None` when the field is declared but was dropped by the decoder as padding; the steps
/// after it are still checked against its declared type.
fn field_node<'v>(schema: &'v Schema, value: &'v StructValue, name: &str, rest: &[PathStep]) -> Result<Option<Node<'v>>> {
	let item = schema.struct_by_name(&value.type_name).ok_or_else(|| BlendError::UnknownType {
		name: value.type_name.to_string(),
	})?;
	let def = item.field(name).ok_or_else(|| unknown_field(item, name))?;
	match value.field(name) {
		Some(found) => Ok(Some(Node::Field(found, def))),
		None => {
			check_steps(schema, Declared::of(schema, def, false), rest)?;
			Ok(None)
		}
	}
}

/// What a path step can statically reach through a declared field.
#[derive(Clone, Copy)]
enum Declared<'s> {
	Struct(&'s StructDef),
	Leaf(&'static str),
	Unknown,
}

impl<'s> Declared<'s> {
	/// `through_pointer` follows a pointer field to its target struct.
	fn of(schema: &'s Schema, def: &FieldDef, through_pointer: bool) -> Self {
		match def.kind {
			FieldKind::Struct(idx) => schema.struct_by_index(idx).map_or(Self::Unknown, Self::Struct),
			FieldKind::Pointer { target: Some(idx) } if through_pointer => schema.struct_by_index(idx).map_or(Self::Unknown, Self::Struct),
			FieldKind::Pointer { target: None } if through_pointer => Self::Unknown,
			FieldKind::Scalar(ScalarType::Char) if def.array_len > 1 => Self::Leaf("string"),
			_ if def.array_len != 1 => Self::Leaf("array"),
			FieldKind::Pointer { .. } => Self::Leaf("ptr"),
			FieldKind::Scalar(scalar) => Self::Leaf(scalar_kind(scalar)),
			FieldKind::Opaque => Self::Leaf("bytes"),
		}
	}
}

fn scalar_kind(scalar: ScalarType) -> &'static str {
	match scalar {
		ScalarType::Bool => "bool",
		ScalarType::F32 => "f32",
		ScalarType::F64 => "f64",
		ScalarType::U8 | ScalarType::U16 | ScalarType::U32 | ScalarType::U64 => "u64",
		_ => "i64",
	}
}

fn unknown_field(item: &StructDef, name: &str) -> BlendError {
	BlendError::UnknownField {
		struct_name: item.name.to_string(),
		field: name.to_owned(),
	}
}

/// Check field names that no decoded value backs against declared layouts.
///
/// Index steps are skipped. Stops at the first step whose container type is not statically known.
fn check_steps(schema: &Schema, start: Declared<'_>, steps: &[PathStep]) -> Result<()> {
	let mut current = start;
	for step in steps {
		let PathStep::Field(name) = step else {
			continue;
		};
		let item = match current {
			Declared::Struct(item) => item,
			Declared::Leaf(got) => {
				return Err(BlendError::ExpectedStruct {
					step: name.to_string(),
					got,
				});
			}
			Declared::Unknown => return Ok(()),
		};
		let def = item.field(name).ok_or_else(|| unknown_field(item, name))?;
		current = Declared::of(schema, def, true);
	}
	Ok(())
}

impl fmt::Debug for Block<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Block")
			.field("index", &self.index)
			.field("code", &String::from_utf8_lossy(&self.code()).trim_end_matches('\0'))
			.field("address", &format_args!("0x{:x}", self.address()))
			.field("sdna_nr", &self.sdna_nr())
			.field("count", &self.count())
			.field("element", &self.element)
			.finish()
	}
}

impl PartialEq for Block<'_> {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self.file, other.file) && self.index == other.index && self.element == other.element
	}
}

impl Eq for Block<'_> {}

#[cfg(test)]
mod tests;
