use crate::blend::bytes::{Cursor, uint_from_bytes};
use crate::blend::value::{FieldValue, StructValue, Value};
use crate::blend::{BHead, BlendError, Endianness, FieldDef, FieldKind, Result, ScalarType, Schema};

/// Runtime limits and behavior switches for struct decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
	/// Maximum recursive struct nesting depth.
	pub max_depth: u32,
	/// Maximum allowed inline array element count.
	pub max_array_elems: usize,
	/// Keep padding-like fields instead of skipping them.
	pub include_padding: bool,
	/// Convert `char[N]` fields to strings.
	pub decode_char_arrays_as_string: bool,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			max_depth: 16,
			max_array_elems: 4096,
			include_padding: false,
			decode_char_arrays_as_string: true,
		}
	}
}

/// Decode every struct element stored in one block payload.
pub fn decode_block(schema: &Schema, head: &BHead, payload: &[u8], order: Endianness, opt: &DecodeOptions) -> Result<Vec<StructValue>> {
	let item = schema.struct_by_index(head.sdna_nr).ok_or(BlendError::MissingStruct { sdna_nr: head.sdna_nr })?;
	let size = item.size;

	let count = usize::try_from(head.nr).map_err(|_| BlendError::ArrayTooLarge {
		count: usize::MAX,
		max: opt.max_array_elems,
	})?;
	if size == 0 && count > opt.max_array_elems {
		return Err(BlendError::ArrayTooLarge {
			count,
			max: opt.max_array_elems,
		});
	}

	let need = size.checked_mul(count).ok_or(BlendError::ArrayTooLarge {
		count,
		max: opt.max_array_elems,
	})?;
	if need > payload.len() {
		return Err(BlendError::PayloadTooSmall { need, have: payload.len() });
	}

	let mut cursor = Cursor::new(payload);
	let mut out = Vec::with_capacity(count);
	for _ in 0..count {
		let bytes = cursor.read_exact(size)?;
		out.push(decode_struct_impl(schema, head.sdna_nr, bytes, order, opt, 0)?);
	}
	Ok(out)
}

/// Decode one struct instance from raw bytes by struct index.
pub fn decode_struct(schema: &Schema, sdna_nr: u32, bytes: &[u8], order: Endianness, opt: &DecodeOptions) -> Result<StructValue> {
	decode_struct_impl(schema, sdna_nr, bytes, order, opt, 0)
}

fn decode_struct_impl(schema: &Schema, sdna_nr: u32, bytes: &[u8], order: Endianness, opt: &DecodeOptions, depth: u32) -> Result<StructValue> {
	if depth >= opt.max_depth {
		return Err(BlendError::DecodeDepthExceeded { max_depth: opt.max_depth });
	}

	let item = schema.struct_by_index(sdna_nr).ok_or(BlendError::MissingStruct { sdna_nr })?;
	if item.size > bytes.len() {
		return Err(BlendError::PayloadTooSmall {
			need: item.size,
			have: bytes.len(),
		});
	}

	let mut fields = Vec::with_capacity(item.fields.len());
	for field in &item.fields {
		if !opt.include_padding && is_padding_field(field) {
			continue;
		}

		let end = field.offset.saturating_add(field.size());
		let raw = bytes.get(field.offset..end).ok_or(BlendError::PayloadTooSmall { need: end, have: bytes.len() })?;
		let value = decode_field(schema, field, raw, order, opt, depth + 1)?;
		fields.push(FieldValue {
			name: field.name.clone(),
			value,
		});
	}

	Ok(StructValue {
		type_name: item.name.clone(),
		fields,
	})
}

fn decode_field(schema: &Schema, field: &FieldDef, raw: &[u8], order: Endianness, opt: &DecodeOptions, depth: u32) -> Result<Value> {
	let count = field.array_len;
	if count == 0 {
		return Ok(Value::Array(Vec::new()));
	}
	if count > opt.max_array_elems {
		return Err(BlendError::ArrayTooLarge {
			count,
			max: opt.max_array_elems,
		});
	}

	if opt.decode_char_arrays_as_string && field.kind == FieldKind::Scalar(ScalarType::Char) && count > 1 {
		let end = raw.iter().position(|byte| *byte == 0).unwrap_or(raw.len());
		return Ok(Value::String(String::from_utf8_lossy(&raw[..end]).into()));
	}

	let mut values = Vec::with_capacity(count);
	for elem in raw.chunks_exact(field.elem_size.max(1)).take(count) {
		let value = match field.kind {
			FieldKind::Pointer { .. } => Value::Ptr(uint_from_bytes(elem, order).ok_or(BlendError::UnsupportedPointerSize { pointer_size: elem.len() })?),
			FieldKind::Struct(idx) => Value::Struct(decode_struct_impl(schema, idx, elem, order, opt, depth)?),
			FieldKind::Scalar(scalar) => decode_scalar(scalar, elem, order),
			FieldKind::Opaque => Value::Bytes(elem.to_vec()),
		};
		values.push(value);
	}

	if count == 1 && values.len() == 1 {
		return Ok(values.swap_remove(0));
	}
	Ok(Value::Array(values))
}

fn decode_scalar(scalar: ScalarType, bytes: &[u8], order: Endianness) -> Value {
	let Some(bits) = uint_from_bytes(bytes, order) else {
		return Value::Bytes(bytes.to_vec());
	};

	match scalar {
		ScalarType::Bool => Value::Bool(bits != 0),
		ScalarType::F32 => Value::F32(f32::from_bits(bits as u32)),
		ScalarType::F64 => Value::F64(f64::from_bits(bits)),
		ScalarType::Char | ScalarType::I8 => Value::I64(i64::from(bits as u8 as i8)),
		ScalarType::I16 => Value::I64(i64::from(bits as u16 as i16)),
		ScalarType::I32 => Value::I64(i64::from(bits as u32 as i32)),
		ScalarType::I64 => Value::I64(bits as i64),
		ScalarType::U8 | ScalarType::U16 | ScalarType::U32 | ScalarType::U64 => Value::U64(bits),
	}
}

fn is_padding_field(field: &FieldDef) -> bool {
	(field.name.starts_with("_pad") || field.name.starts_with("pad")) && matches!(field.type_name.as_ref(), "char" | "uchar" | "uint8_t")
}
