use std::sync::Arc;

use blendframes_testkit::{
	BlendWriter, Layout, Payload, SceneChain, addr, scene_chain_dna, scene_chain_file, scene_payload, screen_payload, sdna, window_manager_payload,
	window_payload,
};

use crate::blend::{BlendError, BlendFile, DecodeOptions, ErrorKind, FieldSpec, OpenOptions, ScalarType, Schema, Value};

fn scene_chain() -> BlendFile {
	BlendFile::from_bytes(scene_chain_file(Layout::LARGE, &SceneChain::default())).expect("file opens")
}

fn mesh_schema() -> Arc<Schema> {
	let schema = Schema::builder(8)
		.add_struct("Vert", vec![FieldSpec::scalar("co", ScalarType::F32).array(3)])
		.add_struct(
			"Mesh",
			vec![
				FieldSpec::scalar("name", ScalarType::Char).array(16),
				FieldSpec::pointer("verts", "Vert"),
				FieldSpec::scalar("totvert", ScalarType::I32),
				FieldSpec::scalar("_pad", ScalarType::U8).array(4),
			],
		)
		.build()
		.expect("schema builds");
	Arc::new(schema)
}

/// Two meshes sharing one three-element vertex block; the second points at its middle element.
fn mesh_file(options: OpenOptions) -> BlendFile {
	let layout = Layout::LARGE;
	let mesh = |name: &str, verts: u64| Payload::new(layout).chars(name, 16).ptr(verts).i32(3).u8(1).u8(2).u8(3).u8(4).finish();
	let mut verts = Payload::new(layout);
	for idx in 0..9 {
		verts = verts.f32(idx as f32);
	}

	let mut writer = BlendWriter::new(layout);
	writer
		.block(b"ME", 0x100, 1, 1, &mesh("Cube", 0x200))
		.block(b"ME", 0x140, 1, 1, &mesh("Half", 0x200 + 12))
		.block(b"DATA", 0x200, 0, 3, &verts.finish());
	options.schema(mesh_schema()).open_bytes(writer.finish()).expect("file opens")
}

#[test]
fn pointer_chain_reads_frame_fields() {
	let blend = scene_chain();
	let wm = blend.find_first(b"WM").expect("WM block");
	let window = wm.get_pointer("winactive").expect("resolves").expect("non-null");
	let screen = window.get_pointer("screen").expect("resolves").expect("non-null");
	let scene = screen.get_pointer("scene").expect("resolves").expect("non-null");

	assert_eq!(window.code(), *b"WI\0\0");
	assert_eq!(scene.address(), addr::SCENE);
	assert_eq!(scene.get_path("r.sfra").expect("reads"), Some(Value::I64(1)));
	assert_eq!(scene.get_path("r.efra").expect("reads"), Some(Value::I64(250)));
	assert_eq!(scene.get_path("r.cfra").expect("reads"), Some(Value::I64(42)));
}

#[test]
fn path_crosses_pointer_fields() {
	let blend = scene_chain();
	let wm = blend.find_first(b"WM").expect("WM block");
	assert_eq!(wm.get_path("winactive.screen.scene.r.efra").expect("reads"), Some(Value::I64(250)));
	assert_eq!(wm.get_path("winactive.screen.name").expect("reads"), Some(Value::String("Layout".into())));
	assert_eq!(wm.get_path("winactive.screen").expect("reads"), Some(Value::Ptr(addr::SCREEN)));
}

#[test]
fn null_pointer_is_none() {
	let blend = scene_chain();
	let scene = blend.find_first(b"SN").expect("SN block");
	assert_eq!(scene.get_pointer("set").expect("null resolves"), None);
	assert_eq!(scene.get_path("set.r.sfra").expect("null intermediate"), None);
}

#[test]
fn unknown_segment_fails_after_any_prefix() {
	let blend = scene_chain();
	let wm = blend.find_first(b"WM").expect("WM block");
	let scene = blend.find_first(b"SN").expect("SN block");

	for (block, path) in [(wm, "bogus"), (wm, "winactive.screen.bogus"), (wm, "winactive.screen.scene.r.bogus"), (scene, "set.r.bogus")] {
		let err = block.get_path(path).expect_err(path);
		assert!(matches!(err, BlendError::UnknownField { ref field, .. } if field == "bogus"), "{path}: {err}");
		assert_eq!(err.kind(), ErrorKind::Schema);
	}
}

#[test]
fn null_pointer_tail_rejects_fields_on_scalars() {
	let blend = scene_chain();
	let scene = blend.find_first(b"SN").expect("SN block");
	let err = scene.get_path("set.r.sfra.more").expect_err("int has no fields");
	assert!(matches!(err, BlendError::ExpectedStruct { ref step, got: "i64" } if step == "more"), "{err}");
	assert_eq!(scene.get_path("set.name").expect("declared field"), None);
}

#[test]
fn get_pointer_checks_field_kind() {
	let blend = scene_chain();
	let window = blend.find_first(b"WI").expect("WI block");

	let err = window.get_pointer("winid").expect_err("int field");
	assert!(matches!(err, BlendError::ExpectedPointer { ref struct_name, ref field } if struct_name == "wmWindow" && field == "winid"));
	assert_eq!(err.kind(), ErrorKind::Schema);

	let err = window.get_pointer("missing").expect_err("absent field");
	assert!(matches!(err, BlendError::UnknownField { .. }));
}

#[test]
fn dangling_pointer_is_distinct_error() {
	let layout = Layout::LARGE;
	let mut writer = BlendWriter::new(layout);
	writer
		.block(b"WM", addr::WM, sdna::WINDOW_MANAGER, 1, &window_manager_payload(layout, 0x9999_0000))
		.dna(&scene_chain_dna(8));
	let blend = BlendFile::from_bytes(writer.finish()).expect("file opens");
	let wm = blend.find_first(b"WM").expect("WM block");

	let err = wm.get_pointer("winactive").expect_err("nothing at that address");
	assert!(matches!(err, BlendError::DanglingPointer { ptr: 0x9999_0000 }));
	assert_eq!(err.kind(), ErrorKind::DanglingPointer);

	let err = wm.get_path("winactive.winid").expect_err("dangling intermediate");
	assert_eq!(err.kind(), ErrorKind::DanglingPointer);
}

#[test]
fn wrong_value_kinds_are_schema_errors() {
	let blend = scene_chain();
	let scene = blend.find_first(b"SN").expect("SN block");

	let err = scene.get_path("r.sfra.more").expect_err("scalar has no fields");
	assert!(matches!(err, BlendError::ExpectedStruct { ref step, got: "i64" } if step == "more"));

	let err = scene.get_path("r[0]").expect_err("struct is not an array");
	assert!(matches!(err, BlendError::IndexOutOfRange { index: 0, len: 0 }));
	assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn decoded_fields_are_cached() {
	let blend = scene_chain();
	let scene = blend.find_first(b"SN").expect("SN block");

	let first = scene.fields().expect("decodes");
	let second = scene.fields().expect("cached");
	assert!(std::ptr::eq(first, second));
	assert_eq!(scene.get_path("r.cfra").expect("reads"), scene.get_path("r.cfra").expect("reads again"));
}

#[test]
fn blocks_are_listed_in_file_order_every_time() {
	let blend = scene_chain();
	let codes: Vec<_> = blend.blocks().map(|block| block.code()).collect();
	assert_eq!(codes, [*b"WM\0\0", *b"WI\0\0", *b"SC\0\0", *b"SN\0\0", *b"DNA1", *b"ENDB"]);
	assert_eq!(blend.blocks().collect::<Vec<_>>(), blend.blocks().collect::<Vec<_>>());
	assert_eq!(blend.blocks().len(), 6);
}

#[test]
fn find_first_returns_first_match_or_none() {
	let blend = mesh_file(OpenOptions::new());
	let first = blend.find_first(b"ME").expect("ME block");
	assert_eq!(first.address(), 0x100);
	assert_eq!(blend.find_first(b"DATA").map(|block| block.index()), Some(2));
	assert!(blend.find_first(b"XX").is_none());
	assert!(blend.find_first(b"").is_none());
	assert!(blend.find_first(b"TOOLONG").is_none());
}

#[test]
fn supplied_schema_reads_file_without_dna() {
	let blend = mesh_file(OpenOptions::new());
	let mesh = blend.find_first(b"ME").expect("ME block");
	assert_eq!(mesh.struct_name(), Some("Mesh"));
	assert_eq!(mesh.get_path("name").expect("reads"), Some(Value::String("Cube".into())));
	assert_eq!(mesh.get_path("verts[2].co[1]").expect("reads"), Some(Value::F32(7.0)));

	let err = mesh.get_path("verts[3]").expect_err("past the vertex block");
	assert!(matches!(err, BlendError::IndexOutOfRange { index: 3, len: 3 }));
}

#[test]
fn interior_pointer_selects_element() {
	let blend = mesh_file(OpenOptions::new());
	let half = blend.blocks().nth(1).expect("second mesh");

	let verts = half.get_pointer("verts").expect("resolves").expect("non-null");
	assert_eq!(verts.element(), 1);
	assert_eq!(verts.get_path("co[0]").expect("reads"), Some(Value::F32(3.0)));
	assert_eq!(half.get_path("verts[1].co[2]").expect("reads"), Some(Value::F32(8.0)));
}

#[test]
fn padding_reads_depend_on_decode_options() {
	let blend = mesh_file(OpenOptions::new());
	let mesh = blend.find_first(b"ME").expect("ME block");
	assert_eq!(mesh.get_path("_pad").expect("declared field"), None);

	let err = mesh.get_path("_pad.bogus").expect_err("padding has no fields");
	assert!(matches!(err, BlendError::ExpectedStruct { ref step, got: "array" } if step == "bogus"), "{err}");
	assert_eq!(err.kind(), ErrorKind::Schema);

	let padded = mesh_file(OpenOptions::new().decode(DecodeOptions {
		include_padding: true,
		..DecodeOptions::default()
	}));
	let mesh = padded.find_first(b"ME").expect("ME block");
	let expected = Value::Array((1..=4).map(Value::U64).collect());
	assert_eq!(mesh.get_path("_pad").expect("declared field"), Some(expected));
}

#[test]
fn legacy_big_endian_chain_matches() {
	let layout = Layout::LEGACY_BE32;
	let chain = SceneChain::default();
	let mut writer = BlendWriter::new(layout);
	writer
		.block(b"WM", addr::WM, sdna::WINDOW_MANAGER, 1, &window_manager_payload(layout, addr::WINDOW))
		.block(b"WI", addr::WINDOW, sdna::WINDOW, 1, &window_payload(layout, addr::SCREEN))
		.block(b"SC", addr::SCREEN, sdna::SCREEN, 1, &screen_payload(layout, addr::SCENE))
		.block(b"SN", addr::SCENE, sdna::SCENE, 1, &scene_payload(layout, "Scene", &chain))
		.dna(&scene_chain_dna(4));
	let blend = BlendFile::from_bytes(writer.finish()).expect("file opens");
	let wm = blend.find_first(b"WM").expect("WM block");

	for (path, frame) in [("sfra", 1), ("efra", 250), ("cfra", 42)] {
		let path = format!("winactive.screen.scene.r.{path}");
		assert_eq!(wm.get_path(&path).expect("reads"), Some(Value::I64(frame)));
	}
}

#[test]
fn debug_output_names_the_block() {
	let blend = scene_chain();
	let text = format!("{:?}", blend.find_first(b"SN").expect("SN block"));
	assert!(text.contains("\"SN\""), "{text}");
	assert!(text.contains("0x4000"), "{text}");
}
