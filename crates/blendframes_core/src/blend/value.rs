/// Decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// `bool` field.
	Bool(bool),
	/// Signed integer of any width.
	I64(i64),
	/// Unsigned integer of any width.
	U64(u64),
	/// `float` field.
	F32(f32),
	/// `double` field.
	F64(f64),
	/// Opaque bytes for types the schema cannot interpret.
	Bytes(Vec<u8>),
	/// `char[N]` decoded up to the first NUL.
	String(Box<str>),
	/// Raw stored address of a pointer field.
	Ptr(u64),
	/// Inline array elements.
	Array(Vec<Value>),
	/// Inline nested struct.
	Struct(StructValue),
}

/// One decoded struct instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
	/// Struct type name from the schema.
	pub type_name: Box<str>,
	/// Fields in declaration order.
	pub fields: Vec<FieldValue>,
}

/// Named field inside a [`StructValue`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
	/// Field identifier (declarator stripped of `*` and `[N]`).
	pub name: Box<str>,
	/// Decoded value.
	pub value: Value,
}

impl StructValue {
	/// Find a field by name.
	pub fn field(&self, name: &str) -> Option<&Value> {
		self.fields.iter().find(|field| field.name.as_ref() == name).map(|field| &field.value)
	}
}

impl Value {
	/// Short label for the value variant.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Bool(_) => "bool",
			Self::I64(_) => "i64",
			Self::U64(_) => "u64",
			Self::F32(_) => "f32",
			Self::F64(_) => "f64",
			Self::Bytes(_) => "bytes",
			Self::String(_) => "string",
			Self::Ptr(_) => "ptr",
			Self::Array(_) => "array",
			Self::Struct(_) => "struct",
		}
	}

	/// Integer view; unsigned values must fit in `i64`.
	pub fn as_i64(&self) -> Option<i64> {
		match *self {
			Self::I64(value) => Some(value),
			Self::U64(value) => i64::try_from(value).ok(),
			Self::Bool(value) => Some(i64::from(value)),
			_ => None,
		}
	}

	/// Numeric view widened to `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		match *self {
			Self::F32(value) => Some(f64::from(value)),
			Self::F64(value) => Some(value),
			Self::I64(value) => Some(value as f64),
			Self::U64(value) => Some(value as f64),
			_ => None,
		}
	}

	/// Stored pointer address.
	pub fn as_ptr(&self) -> Option<u64> {
		match *self {
			Self::Ptr(value) => Some(value),
			_ => None,
		}
	}

	/// String contents for decoded `char` arrays.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(value) => Some(value),
			_ => None,
		}
	}

	/// Nested struct view.
	pub fn as_struct(&self) -> Option<&StructValue> {
		match self {
			Self::Struct(value) => Some(value),
			_ => None,
		}
	}
}
