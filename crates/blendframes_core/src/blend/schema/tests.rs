use blendframes_testkit::{DnaBuilder, Layout, scene_chain_dna, sdna};

use crate::blend::{BlendError, Dna, Endianness, FieldKind, FieldSpec, ScalarType, Schema};

fn scene_chain_schema(pointer_size: usize) -> Schema {
	let layout = if pointer_size == 4 { Layout::LEGACY_BE32 } else { Layout::LARGE };
	let order = if layout.big_endian { Endianness::Big } else { Endianness::Little };
	let dna = Dna::parse(&scene_chain_dna(pointer_size).encode(layout), order).expect("dna parses");
	Schema::from_dna(&dna, pointer_size).expect("schema builds")
}

#[test]
fn offsets_follow_declaration_order() {
	let schema = scene_chain_schema(8);
	let render = schema.struct_by_name("RenderData").expect("RenderData");
	let offsets: Vec<_> = render.fields.iter().map(|field| (field.name.as_ref(), field.offset)).collect();
	assert_eq!(offsets, [("cfra", 0), ("sfra", 4), ("efra", 8), ("frs_sec", 12), ("_pad", 14), ("frs_sec_base", 16)]);
	assert_eq!(render.size, 20);

	let scene = schema.struct_by_index(sdna::SCENE).expect("Scene");
	assert_eq!(scene.name.as_ref(), "Scene");
	let r = scene.field("r").expect("r");
	assert_eq!(r.offset, 32);
	assert_eq!(r.kind, FieldKind::Struct(sdna::RENDER_DATA));
}

#[test]
fn pointer_fields_take_pointer_width() {
	let wide = scene_chain_schema(8);
	let narrow = scene_chain_schema(4);

	let wide_winid = wide.struct_by_name("wmWindow").and_then(|item| item.field("winid")).expect("winid");
	let narrow_winid = narrow.struct_by_name("wmWindow").and_then(|item| item.field("winid")).expect("winid");
	assert_eq!(wide_winid.offset, 24);
	assert_eq!(narrow_winid.offset, 12);

	let screen = narrow.struct_by_name("wmWindow").and_then(|item| item.field("screen")).expect("screen");
	assert_eq!(screen.elem_size, 4);
	assert_eq!(screen.kind, FieldKind::Pointer { target: Some(sdna::SCREEN) });
}

#[test]
fn char_arrays_and_scalars_are_classified() {
	let schema = scene_chain_schema(8);
	let scene = schema.struct_by_name("Scene").expect("Scene");
	let name = scene.field("name").expect("name");
	assert_eq!(name.kind, FieldKind::Scalar(ScalarType::Char));
	assert_eq!(name.array_len, 24);
	assert_eq!(name.size(), 24);

	let render = schema.struct_by_name("RenderData").expect("RenderData");
	assert_eq!(render.field("frs_sec").map(|field| field.kind), Some(FieldKind::Scalar(ScalarType::I16)));
	assert_eq!(render.field("frs_sec_base").map(|field| field.kind), Some(FieldKind::Scalar(ScalarType::F32)));
}

#[test]
fn void_and_double_pointers_have_no_target() {
	let mut dna = DnaBuilder::new(8);
	dna.add_struct("Link", &[("void", "*data"), ("Link", "**handles"), ("void", "(*cb)()")]);
	let parsed = Dna::parse(&dna.encode(Layout::LARGE), Endianness::Little).expect("dna parses");
	let schema = Schema::from_dna(&parsed, 8).expect("schema builds");

	let link = schema.struct_by_name("Link").expect("Link");
	for field in &link.fields {
		assert_eq!(field.kind, FieldKind::Pointer { target: None }, "{}", field.name);
		assert_eq!(field.elem_size, 8);
	}
}

#[test]
fn rejects_unknown_pointer_width() {
	let parsed = Dna::parse(&scene_chain_dna(8).encode(Layout::LARGE), Endianness::Little).expect("dna parses");
	let err = Schema::from_dna(&parsed, 2).expect_err("width 2");
	assert!(matches!(err, BlendError::UnsupportedPointerSize { pointer_size: 2 }));
}

#[test]
fn builder_lays_out_packed_fields() {
	let schema = Schema::builder(4)
		.add_struct("Range", vec![FieldSpec::scalar("lo", ScalarType::I32), FieldSpec::scalar("hi", ScalarType::I32)])
		.add_struct(
			"Track",
			vec![
				FieldSpec::pointer("next", "Track"),
				FieldSpec::inline("range", "Range"),
				FieldSpec::scalar("label", ScalarType::Char).array(8),
				FieldSpec::void_pointer("user"),
			],
		)
		.build()
		.expect("schema builds");

	let track = schema.struct_by_name("Track").expect("Track");
	let layout: Vec<_> = track.fields.iter().map(|field| (field.name.as_ref(), field.offset)).collect();
	assert_eq!(layout, [("next", 0), ("range", 4), ("label", 12), ("user", 20)]);
	assert_eq!(track.size, 24);
	assert_eq!(track.field("next").map(|field| field.kind), Some(FieldKind::Pointer { target: Some(1) }));
	assert_eq!(schema.index_of("Range"), Some(0));
}

#[test]
fn builder_rejects_forward_inline_and_duplicates() {
	let forward = Schema::builder(8)
		.add_struct("Outer", vec![FieldSpec::inline("inner", "Inner")])
		.add_struct("Inner", vec![FieldSpec::scalar("x", ScalarType::F32)])
		.build()
		.expect_err("inline before declaration");
	assert!(matches!(forward, BlendError::UnknownType { ref name } if name == "Inner"));

	let missing = Schema::builder(8)
		.add_struct("Node", vec![FieldSpec::pointer("parent", "Nowhere")])
		.build()
		.expect_err("unknown pointer target");
	assert!(matches!(missing, BlendError::UnknownType { ref name } if name == "Nowhere"));

	let duplicate = Schema::builder(8)
		.add_struct("Node", Vec::new())
		.add_struct("Node", Vec::new())
		.build()
		.expect_err("duplicate");
	assert!(matches!(duplicate, BlendError::DuplicateStruct { ref name } if name == "Node"));
}

#[test]
fn builder_offsets_saturate_like_dna_layouts() {
	let schema = Schema::builder(8)
		.add_struct(
			"Huge",
			vec![FieldSpec::scalar("data", ScalarType::U64).array(usize::MAX / 2), FieldSpec::scalar("tail", ScalarType::I32)],
		)
		.build()
		.expect("schema builds");
	let huge = schema.struct_by_name("Huge").expect("Huge");
	assert_eq!(huge.field("tail").map(|field| field.offset), Some(usize::MAX));
	assert_eq!(huge.size, usize::MAX);
}
