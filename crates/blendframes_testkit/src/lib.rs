//! Synthetic `.blend` writers shared by workspace tests.
//!
//! Everything here panics on misuse; it only ever runs inside tests.

use std::io::Write;

use tempfile::NamedTempFile;

/// Header and block-record shape of a synthetic file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
	/// Pointer width in bytes (4 or 8).
	pub pointer_size: usize,
	/// Write numbers big-endian.
	pub big_endian: bool,
	/// Use the 17-byte header and 64-bit block records.
	pub large: bool,
}

impl Layout {
	/// `BLENDER17-01v0500`, little-endian, 8-byte pointers.
	pub const LARGE: Self = Self {
		pointer_size: 8,
		big_endian: false,
		large: true,
	};
	/// `BLENDER-v279`, little-endian, 8-byte pointers.
	pub const LEGACY_LE64: Self = Self {
		pointer_size: 8,
		big_endian: false,
		large: false,
	};
	/// `BLENDER_V279`, big-endian, 4-byte pointers.
	pub const LEGACY_BE32: Self = Self {
		pointer_size: 4,
		big_endian: true,
		large: false,
	};

	/// Encoded file header.
	pub fn header(&self) -> Vec<u8> {
		let order = if self.big_endian { b'V' } else { b'v' };
		if self.large {
			let mut out = b"BLENDER17-01".to_vec();
			out.push(order);
			out.extend_from_slice(b"0500");
			return out;
		}

		let mut out = b"BLENDER".to_vec();
		out.push(if self.pointer_size == 4 { b'_' } else { b'-' });
		out.push(order);
		out.extend_from_slice(b"279");
		out
	}

	fn put_u16(&self, out: &mut Vec<u8>, value: u16) {
		out.extend_from_slice(&if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() });
	}

	fn put_u32(&self, out: &mut Vec<u8>, value: u32) {
		out.extend_from_slice(&if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() });
	}

	fn put_u64(&self, out: &mut Vec<u8>, value: u64) {
		out.extend_from_slice(&if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() });
	}

	fn put_ptr(&self, out: &mut Vec<u8>, value: u64) {
		match self.pointer_size {
			4 => self.put_u32(out, u32::try_from(value).expect("address fits 4-byte pointer")),
			8 => self.put_u64(out, value),
			other => panic!("unsupported pointer size {other}"),
		}
	}
}

/// Struct payload encoder following a [`Layout`]'s byte order and pointer width.
#[derive(Debug, Clone)]
pub struct Payload {
	layout: Layout,
	bytes: Vec<u8>,
}

impl Payload {
	/// Start an empty payload.
	pub fn new(layout: Layout) -> Self {
		Self { layout, bytes: Vec::new() }
	}

	/// Append one byte.
	pub fn u8(mut self, value: u8) -> Self {
		self.bytes.push(value);
		self
	}

	/// Append a `short`.
	pub fn i16(mut self, value: i16) -> Self {
		self.layout.put_u16(&mut self.bytes, value as u16);
		self
	}

	/// Append an `int`.
	pub fn i32(mut self, value: i32) -> Self {
		self.layout.put_u32(&mut self.bytes, value as u32);
		self
	}

	/// Append an `int64_t`.
	pub fn i64(mut self, value: i64) -> Self {
		self.layout.put_u64(&mut self.bytes, value as u64);
		self
	}

	/// Append a `float`.
	pub fn f32(mut self, value: f32) -> Self {
		self.layout.put_u32(&mut self.bytes, value.to_bits());
		self
	}

	/// Append a `double`.
	pub fn f64(mut self, value: f64) -> Self {
		self.layout.put_u64(&mut self.bytes, value.to_bits());
		self
	}

	/// Append a pointer-width address.
	pub fn ptr(mut self, value: u64) -> Self {
		self.layout.put_ptr(&mut self.bytes, value);
		self
	}

	/// Append `char[len]`, NUL padded (and truncated to fit).
	pub fn chars(mut self, text: &str, len: usize) -> Self {
		let take = text.len().min(len);
		self.bytes.extend_from_slice(&text.as_bytes()[..take]);
		self.bytes.resize(self.bytes.len() + (len - take), 0);
		self
	}

	/// Append `n` zero bytes.
	pub fn zeros(mut self, n: usize) -> Self {
		self.bytes.resize(self.bytes.len() + n, 0);
		self
	}

	/// Return the encoded bytes.
	pub fn finish(self) -> Vec<u8> {
		self.bytes
	}
}

const PRIMITIVES: &[(&str, u16)] = &[
	("char", 1),
	("uchar", 1),
	("short", 2),
	("ushort", 2),
	("int", 4),
	("uint", 4),
	("float", 4),
	("double", 8),
	("int64_t", 8),
	("uint64_t", 8),
	("bool", 1),
	("void", 0),
];

/// Builder for `DNA1` struct-descriptor payloads.
#[derive(Debug, Clone)]
pub struct DnaBuilder {
	pointer_size: usize,
	names: Vec<String>,
	types: Vec<String>,
	tlen: Vec<u16>,
	structs: Vec<(u16, Vec<(u16, u16)>)>,
}

impl DnaBuilder {
	/// Start a table with the primitive types pre-registered.
	pub fn new(pointer_size: usize) -> Self {
		Self {
			pointer_size,
			names: Vec::new(),
			types: PRIMITIVES.iter().map(|(name, _)| (*name).to_owned()).collect(),
			tlen: PRIMITIVES.iter().map(|(_, size)| *size).collect(),
			structs: Vec::new(),
		}
	}

	/// Declare a struct from `(type, declarator)` pairs and return its struct index.
	///
	/// Pointer fields may name structs declared later; inline fields may not.
	pub fn add_struct(&mut self, name: &str, fields: &[(&str, &str)]) -> u32 {
		let type_idx = self.type_idx(name).unwrap_or_else(|| self.push_type(name));

		let mut size = 0_usize;
		let mut encoded = Vec::with_capacity(fields.len());
		for (ty, decl) in fields {
			let is_ptr = decl.starts_with('*') || decl.starts_with('(');
			let field_type = match self.type_idx(ty) {
				Some(idx) => idx,
				None if is_ptr => self.push_type(ty),
				None => panic!("inline field {decl} uses undeclared type {ty}"),
			};
			let elem = if is_ptr {
				self.pointer_size
			} else {
				usize::from(self.tlen[usize::from(field_type)])
			};
			size += elem * array_len(decl);
			encoded.push((field_type, self.name_idx(decl)));
		}

		self.tlen[usize::from(type_idx)] = u16::try_from(size).expect("struct size fits u16");
		self.structs.push((type_idx, encoded));
		(self.structs.len() - 1) as u32
	}

	/// Byte size of a declared type.
	pub fn size_of(&self, name: &str) -> usize {
		let idx = self.type_idx(name).unwrap_or_else(|| panic!("unknown type {name}"));
		usize::from(self.tlen[usize::from(idx)])
	}

	/// Encode the `SDNA` payload.
	pub fn encode(&self, layout: Layout) -> Vec<u8> {
		let mut out = b"SDNA".to_vec();

		for (tag, table) in [(b"NAME", &self.names), (b"TYPE", &self.types)] {
			out.extend_from_slice(tag);
			layout.put_u32(&mut out, table.len() as u32);
			for item in table {
				out.extend_from_slice(item.as_bytes());
				out.push(0);
			}
			pad4(&mut out);
		}

		out.extend_from_slice(b"TLEN");
		for size in &self.tlen {
			layout.put_u16(&mut out, *size);
		}
		pad4(&mut out);

		out.extend_from_slice(b"STRC");
		layout.put_u32(&mut out, self.structs.len() as u32);
		for (type_idx, fields) in &self.structs {
			layout.put_u16(&mut out, *type_idx);
			layout.put_u16(&mut out, fields.len() as u16);
			for (field_type, name) in fields {
				layout.put_u16(&mut out, *field_type);
				layout.put_u16(&mut out, *name);
			}
		}
		out
	}

	fn type_idx(&self, name: &str) -> Option<u16> {
		self.types.iter().position(|item| item == name).map(|idx| idx as u16)
	}

	fn push_type(&mut self, name: &str) -> u16 {
		self.types.push(name.to_owned());
		self.tlen.push(0);
		(self.types.len() - 1) as u16
	}

	fn name_idx(&mut self, decl: &str) -> u16 {
		if let Some(idx) = self.names.iter().position(|item| item == decl) {
			return idx as u16;
		}
		self.names.push(decl.to_owned());
		(self.names.len() - 1) as u16
	}
}

fn array_len(decl: &str) -> usize {
	decl.split('[')
		.skip(1)
		.map(|dim| dim.trim_end_matches(']').parse::<usize>().expect("numeric array dimension"))
		.product()
}

fn pad4(out: &mut Vec<u8>) {
	out.resize(out.len().next_multiple_of(4), 0);
}

/// Writer for whole synthetic files: header, block records, optional `DNA1`, `ENDB`.
#[derive(Debug, Clone)]
pub struct BlendWriter {
	layout: Layout,
	bytes: Vec<u8>,
}

impl BlendWriter {
	/// Start a file with the layout's header.
	pub fn new(layout: Layout) -> Self {
		Self {
			layout,
			bytes: layout.header(),
		}
	}

	/// Payload encoder matching this file's layout.
	pub fn payload(&self) -> Payload {
		Payload::new(self.layout)
	}

	/// Append one block record with its payload.
	pub fn block(&mut self, code: &[u8], old: u64, sdna_nr: u32, nr: u64, payload: &[u8]) -> &mut Self {
		let layout = self.layout;
		let out = &mut self.bytes;
		out.extend_from_slice(&code4(code));
		if layout.large {
			layout.put_u32(out, sdna_nr);
			layout.put_u64(out, old);
			layout.put_u64(out, payload.len() as u64);
			layout.put_u64(out, nr);
		} else {
			layout.put_u32(out, payload.len() as u32);
			layout.put_ptr(out, old);
			layout.put_u32(out, sdna_nr);
			layout.put_u32(out, nr as u32);
		}
		out.extend_from_slice(payload);
		self
	}

	/// Append a `DNA1` block.
	pub fn dna(&mut self, dna: &DnaBuilder) -> &mut Self {
		let payload = dna.encode(self.layout);
		self.block(b"DNA1", 0, 0, 1, &payload)
	}

	/// Append raw bytes (for corrupt-file cases).
	pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
		self.bytes.extend_from_slice(bytes);
		self
	}

	/// Append `ENDB` and return the file bytes.
	pub fn finish(&mut self) -> Vec<u8> {
		self.block(b"ENDB", 0, 0, 0, &[]);
		std::mem::take(&mut self.bytes)
	}

	/// Return the bytes written so far without a terminator.
	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes
	}
}

fn code4(code: &[u8]) -> [u8; 4] {
	assert!(code.len() <= 4, "block code longer than 4 bytes");
	let mut out = [0_u8; 4];
	out[..code.len()].copy_from_slice(code);
	out
}

/// Write bytes to a fresh temporary file.
pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
	let mut file = NamedTempFile::new().expect("temp file created");
	file.write_all(bytes).expect("temp file written");
	file.flush().expect("temp file flushed");
	file
}

/// zstd-compress bytes into a fresh temporary file.
pub fn write_temp_zstd(bytes: &[u8]) -> NamedTempFile {
	let packed = zstd::encode_all(bytes, 3).expect("zstd encodes");
	write_temp(&packed)
}

/// Addresses used by [`scene_chain_file`].
pub mod addr {
	/// Window manager block.
	pub const WM: u64 = 0x1000;
	/// Active window block.
	pub const WINDOW: u64 = 0x2000;
	/// Screen block.
	pub const SCREEN: u64 = 0x3000;
	/// Scene block.
	pub const SCENE: u64 = 0x4000;
}

/// Struct indices declared by [`scene_chain_dna`].
pub mod sdna {
	/// `RenderData`.
	pub const RENDER_DATA: u32 = 0;
	/// `Scene`.
	pub const SCENE: u32 = 1;
	/// `bScreen`.
	pub const SCREEN: u32 = 2;
	/// `wmWindow`.
	pub const WINDOW: u32 = 3;
	/// `wmWindowManager`.
	pub const WINDOW_MANAGER: u32 = 4;
}

/// Frame settings written into the synthetic scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneChain {
	/// `r.sfra`.
	pub start: i32,
	/// `r.efra`.
	pub end: i32,
	/// `r.cfra`.
	pub current: i32,
	/// `r.frs_sec`.
	pub fps: i16,
	/// `r.frs_sec_base`.
	pub fps_base: f32,
}

impl Default for SceneChain {
	fn default() -> Self {
		Self {
			start: 1,
			end: 250,
			current: 42,
			fps: 24,
			fps_base: 1.0,
		}
	}
}

/// Struct table for the window manager -> window -> screen -> scene chain.
pub fn scene_chain_dna(pointer_size: usize) -> DnaBuilder {
	let mut dna = DnaBuilder::new(pointer_size);
	dna.add_struct(
		"RenderData",
		&[
			("int", "cfra"),
			("int", "sfra"),
			("int", "efra"),
			("short", "frs_sec"),
			("char", "_pad[2]"),
			("float", "frs_sec_base"),
		],
	);
	dna.add_struct("Scene", &[("char", "name[24]"), ("Scene", "*set"), ("RenderData", "r")]);
	dna.add_struct("bScreen", &[("char", "name[24]"), ("Scene", "*scene")]);
	dna.add_struct(
		"wmWindow",
		&[
			("wmWindow", "*next"),
			("wmWindow", "*prev"),
			("bScreen", "*screen"),
			("int", "winid"),
			("int", "sizex"),
		],
	);
	dna.add_struct(
		"wmWindowManager",
		&[("wmWindow", "*winactive"), ("wmWindow", "*windrawable"), ("int", "file_saved"), ("int", "_pad")],
	);
	dna
}

/// `Scene` payload for [`scene_chain_dna`].
pub fn scene_payload(layout: Layout, name: &str, chain: &SceneChain) -> Vec<u8> {
	Payload::new(layout)
		.chars(name, 24)
		.ptr(0)
		.i32(chain.current)
		.i32(chain.start)
		.i32(chain.end)
		.i16(chain.fps)
		.zeros(2)
		.f32(chain.fps_base)
		.finish()
}

/// `bScreen` payload for [`scene_chain_dna`].
pub fn screen_payload(layout: Layout, scene: u64) -> Vec<u8> {
	Payload::new(layout).chars("Layout", 24).ptr(scene).finish()
}

/// `wmWindow` payload for [`scene_chain_dna`].
pub fn window_payload(layout: Layout, screen: u64) -> Vec<u8> {
	Payload::new(layout).ptr(0).ptr(0).ptr(screen).i32(1).i32(1920).finish()
}

/// `wmWindowManager` payload for [`scene_chain_dna`].
pub fn window_manager_payload(layout: Layout, winactive: u64) -> Vec<u8> {
	Payload::new(layout).ptr(winactive).ptr(winactive).i32(1).i32(0).finish()
}

/// Complete file: `WM` -> `WI` -> `SC` (screen) -> `SN` (scene), then `DNA1` and `ENDB`.
pub fn scene_chain_file(layout: Layout, chain: &SceneChain) -> Vec<u8> {
	let dna = scene_chain_dna(layout.pointer_size);
	let mut writer = BlendWriter::new(layout);
	writer
		.block(b"WM", addr::WM, sdna::WINDOW_MANAGER, 1, &window_manager_payload(layout, addr::WINDOW))
		.block(b"WI", addr::WINDOW, sdna::WINDOW, 1, &window_payload(layout, addr::SCREEN))
		.block(b"SC", addr::SCREEN, sdna::SCREEN, 1, &screen_payload(layout, addr::SCENE))
		.block(b"SN", addr::SCENE, sdna::SCENE, 1, &scene_payload(layout, "Scene", chain))
		.dna(&dna);
	writer.finish()
}
