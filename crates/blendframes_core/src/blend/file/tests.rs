use std::sync::Arc;

use blendframes_testkit::{BlendWriter, Layout, SceneChain, addr, scene_chain_file, write_temp, write_temp_zstd};

use crate::blend::{
	BlendError, BlendFile, BlockLayout, Compression, DecodeOptions, Endianness, ErrorKind, FieldSpec, OpenOptions, PointerStorage, ScalarType, Schema,
};

#[test]
fn opens_raw_file_from_disk() {
	let temp = write_temp(&scene_chain_file(Layout::LARGE, &SceneChain::default()));
	let blend = BlendFile::open(temp.path()).expect("file opens");

	assert_eq!(blend.compression, Compression::None);
	assert_eq!(blend.header.header_size, 17);
	assert_eq!(blend.header.block_layout, BlockLayout::Large);
	assert_eq!(blend.pointer_storage(), PointerStorage::AddressRanges);
	assert_eq!(blend.len(), 6);

	let stats = blend.scan_block_stats();
	assert_eq!(stats.block_count, 6);
	assert!(stats.has_dna1);
	assert!(stats.has_endb);
	assert_eq!(stats.last_code, *b"ENDB");
	assert_eq!(stats.codes.get(b"WM\0\0"), Some(&1));
}

#[test]
fn opens_zstd_file_transparently() {
	let bytes = scene_chain_file(Layout::LARGE, &SceneChain::default());
	let temp = write_temp_zstd(&bytes);
	let blend = BlendFile::open(temp.path()).expect("compressed file opens");

	assert_eq!(blend.compression, Compression::Zstd);
	assert_eq!(blend.bytes(), bytes.as_slice());
}

#[test]
fn decompression_limit_is_enforced() {
	let bytes = scene_chain_file(Layout::LARGE, &SceneChain::default());
	let packed = zstd::encode_all(bytes.as_slice(), 3).expect("zstd encodes");
	let err = OpenOptions::new().max_decompressed_bytes(64).open_bytes(packed).expect_err("over the limit");
	assert!(matches!(err, BlendError::DecompressedTooLarge { limit: 64 }));
}

#[test]
fn big_endian_header_is_honoured() {
	let blend = BlendFile::from_bytes(scene_chain_file(Layout::LEGACY_BE32, &SceneChain::default())).expect("file opens");
	assert_eq!(blend.header.endianness, Endianness::Big);
	assert_eq!(blend.header.pointer_size, 4);
	assert_eq!(blend.block_by_address(addr::SCENE).map(|block| block.code()), Some(*b"SN\0\0"));
}

#[test]
fn missing_file_is_io_error() {
	let dir = tempfile::tempdir().expect("temp dir");
	let err = BlendFile::open(dir.path().join("absent.blend")).expect_err("missing file");
	assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn bad_magic_fails_before_scanning() {
	let err = BlendFile::from_bytes(b"NOTBLEND and then some bytes".to_vec()).expect_err("bad magic");
	assert!(matches!(err, BlendError::UnknownMagic { magic } if magic == *b"NOTB"));
	assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn truncated_block_is_format_error() {
	let mut bytes = scene_chain_file(Layout::LARGE, &SceneChain::default());
	bytes.truncate(17 + 32 + 4);
	let err = BlendFile::from_bytes(bytes).expect_err("truncated payload");
	assert!(matches!(err, BlendError::BlockLenOutOfRange { at: 17, .. }));
	assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn missing_endb_is_tolerated() {
	let mut writer = BlendWriter::new(Layout::LARGE);
	writer.block(b"AA", 0x10, 0, 1, &[0; 4]);
	let blend = BlendFile::from_bytes(writer.into_bytes()).expect("file opens");
	assert_eq!(blend.len(), 1);
	assert!(!blend.scan_block_stats().has_endb);
	assert!(matches!(blend.schema(), Err(BlendError::DnaNotFound)));
}

#[test]
fn duplicate_address_resolves_to_first_block() {
	let mut writer = BlendWriter::new(Layout::LARGE);
	writer.block(b"AA", 0x10, 0, 1, &[0; 4]).block(b"BB", 0x10, 0, 1, &[0; 4]);
	let blend = BlendFile::from_bytes(writer.finish()).expect("duplicates tolerated");

	assert_eq!(blend.len(), 3);
	assert_eq!(blend.duplicate_addresses(), 1);
	assert_eq!(blend.block_by_address(0x10).map(|block| block.code()), Some(*b"AA\0\0"));
	assert_eq!(blend.resolve(0x10).expect("resolves").map(|block| block.index()), Some(0));
}

#[test]
fn corrupt_compressed_stream_is_format_error() {
	let mut garbage = vec![0x28, 0xB5, 0x2F, 0xFD];
	garbage.extend_from_slice(b"garbage where a frame should be");
	let err = BlendFile::from_bytes(garbage).expect_err("corrupt frame");
	assert!(matches!(err, BlendError::Decompress { .. }), "{err:?}");
	assert_eq!(err.kind(), ErrorKind::Format);

	let packed = zstd::encode_all(scene_chain_file(Layout::LARGE, &SceneChain::default()).as_slice(), 3).expect("zstd encodes");
	let err = BlendFile::from_bytes(packed[..packed.len() / 2].to_vec()).expect_err("truncated frame");
	assert_eq!(err.kind(), ErrorKind::Format, "{err:?}");
}

#[test]
fn supplied_schema_must_match_pointer_width() {
	let schema = Schema::builder(4)
		.add_struct("Only", vec![FieldSpec::scalar("x", ScalarType::I32)])
		.build()
		.expect("schema builds");
	let err = OpenOptions::new()
		.schema(Arc::new(schema))
		.open_bytes(scene_chain_file(Layout::LARGE, &SceneChain::default()))
		.expect_err("4-byte schema on 8-byte file");
	assert!(matches!(err, BlendError::UnsupportedPointerSize { pointer_size: 4 }));
}

#[test]
fn decode_options_are_kept() {
	let decode = DecodeOptions {
		include_padding: true,
		..DecodeOptions::default()
	};
	let blend = OpenOptions::new()
		.decode(decode.clone())
		.open_bytes(scene_chain_file(Layout::LARGE, &SceneChain::default()))
		.expect("file opens");
	assert_eq!(blend.decode_options(), &decode);
}

#[test]
fn handle_is_shareable_across_threads() {
	fn assert_send_sync<T: Send + Sync>() {}
	assert_send_sync::<BlendFile>();
}
