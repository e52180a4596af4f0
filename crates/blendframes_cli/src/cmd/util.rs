use blendframes::blend::{BlendError, Result, Value};
use serde_json::json;

/// Parse up-to-4 ASCII block code into padded `[u8; 4]`.
pub(crate) fn parse_block_code(code: &str) -> Result<[u8; 4]> {
	if code.is_empty() || code.len() > 4 || !code.is_ascii() {
		return Err(BlendError::InvalidBlockCode { code: code.to_owned() });
	}

	let mut out = [0_u8; 4];
	out[..code.len()].copy_from_slice(code.as_bytes());
	Ok(out)
}

/// Render block code bytes as printable label.
pub(crate) fn render_code(code: [u8; 4]) -> String {
	let mut out = String::new();
	for byte in code {
		if byte == 0 {
			continue;
		}
		if byte.is_ascii_graphic() || byte == b' ' {
			out.push(char::from(byte));
		} else {
			out.push('.');
		}
	}
	if out.is_empty() { "....".to_owned() } else { out }
}

pub(crate) fn ptr_hex(value: u64) -> String {
	format!("0x{value:x}")
}

/// Convert a decoded value into JSON; pointers become hex strings.
pub(crate) fn value_json(value: &Value) -> serde_json::Value {
	match value {
		Value::Bool(item) => json!(item),
		Value::I64(item) => json!(item),
		Value::U64(item) => json!(item),
		Value::F32(item) => json!(item),
		Value::F64(item) => json!(item),
		Value::Bytes(bytes) => json!(bytes),
		Value::String(text) => json!(text.as_ref()),
		Value::Ptr(ptr) => json!(ptr_hex(*ptr)),
		Value::Array(items) => serde_json::Value::Array(items.iter().map(value_json).collect()),
		Value::Struct(item) => {
			let fields = item.fields.iter().map(|field| (field.name.to_string(), value_json(&field.value))).collect();
			serde_json::Value::Object(fields)
		}
	}
}

/// Pretty-print a serializable payload to stdout.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) -> Result<()> {
	let text = serde_json::to_string_pretty(payload).map_err(|err| BlendError::Encode { reason: err.to_string() })?;
	println!("{text}");
	Ok(())
}
