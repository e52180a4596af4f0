#![allow(missing_docs)]

use blendframes::blend::{BlendFile, ErrorKind, FrameRange, Value, frame_range, main_scene};
use blendframes_testkit::{Layout, SceneChain, scene_chain_file, write_temp, write_temp_zstd};

const LAYOUTS: [Layout; 3] = [Layout::LARGE, Layout::LEGACY_LE64, Layout::LEGACY_BE32];

#[test]
fn frame_range_is_layout_independent() {
	let chain = SceneChain {
		start: 1001,
		end: 1240,
		current: 1100,
		..SceneChain::default()
	};

	for layout in LAYOUTS {
		let temp = write_temp(&scene_chain_file(layout, &chain));
		let range = frame_range(temp.path()).expect("frame range reads");
		assert_eq!((range.start, range.end, range.current), (1001, 1240, 1100), "{layout:?}");
	}
}

#[test]
fn compressed_files_read_like_raw_ones() {
	let bytes = scene_chain_file(Layout::LARGE, &SceneChain::default());
	let raw = frame_range(write_temp(&bytes).path()).expect("raw reads");
	let packed = frame_range(write_temp_zstd(&bytes).path()).expect("zstd reads");
	assert_eq!(raw, packed);
}

#[test]
fn driver_style_walk_matches_scene_query() {
	let temp = write_temp(&scene_chain_file(Layout::LARGE, &SceneChain::default()));
	let blend = BlendFile::open(temp.path()).expect("file opens");

	let scene = blend
		.find_first(b"WM")
		.and_then(|wm| wm.get_pointer("winactive").expect("winactive resolves"))
		.and_then(|window| window.get_pointer("screen").expect("screen resolves"))
		.and_then(|screen| screen.get_pointer("scene").expect("scene resolves"))
		.expect("scene reachable");

	assert_eq!(Some(scene), main_scene(&blend).expect("main scene lookup"));
	let frames: Vec<_> = ["r.sfra", "r.efra", "r.cfra"]
		.iter()
		.map(|path| scene.get_path(path).expect("field reads").and_then(|value| value.as_i64()))
		.collect();
	assert_eq!(frames, [Some(1), Some(250), Some(42)]);
	assert_eq!(FrameRange::read(&scene).expect("frames read").current, 42);
}

#[test]
fn shared_handle_decodes_once_across_threads() {
	let blend = BlendFile::from_bytes(scene_chain_file(Layout::LARGE, &SceneChain::default())).expect("file opens");

	let values: Vec<_> = std::thread::scope(|scope| {
		let handles: Vec<_> = (0..4)
			.map(|_| scope.spawn(|| blend.find_first(b"SN").and_then(|scene| scene.get_path("r.efra").expect("reads"))))
			.collect();
		handles.into_iter().map(|handle| handle.join().expect("thread joins")).collect()
	});

	assert!(values.iter().all(|value| *value == Some(Value::I64(250))));
}

#[test]
fn non_blend_input_is_format_error() {
	let temp = write_temp(b"PK\x03\x04 definitely a zip");
	let err = BlendFile::open(temp.path()).expect_err("not a blend file");
	assert_eq!(err.kind(), ErrorKind::Format);
}
