use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, BlendError>;

/// Coarse failure category used by callers that only need to report what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// File missing or unreadable.
	Io,
	/// Bad magic, corrupt header, or malformed block/DNA records.
	Format,
	/// Unknown struct, field, or wrong field kind requested by the caller.
	Schema,
	/// A non-null pointer that no block in the catalogue owns.
	DanglingPointer,
}

impl ErrorKind {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Io => "io",
			Self::Format => "format",
			Self::Schema => "schema",
			Self::DanglingPointer => "dangling_pointer",
		}
	}
}

/// Errors produced while reading, decoding, and traversing `.blend` data.
#[derive(Debug, Error)]
pub enum BlendError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Unknown leading file magic.
	#[error("unsupported compression or not a .blend (magic={magic:?})")]
	UnknownMagic {
		/// First up-to-4 bytes of the stream.
		magic: [u8; 4],
	},
	/// Compressed stream is corrupt or truncated.
	#[error("decompress failed: {reason}")]
	Decompress {
		/// Decoder message.
		reason: String,
	},
	/// Decompressed stream did not start with `BLENDER`.
	#[error("decompressed data does not start with BLENDER magic")]
	NotBlendAfterDecompress,
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Invalid or malformed file header.
	#[error("invalid header")]
	InvalidHeader,
	/// Unsupported container format version.
	#[error("unsupported file format version {version} (expected 1)")]
	UnsupportedFormatVersion {
		/// Parsed format version.
		version: u16,
	},
	/// Header declares a pointer width this reader cannot decode.
	#[error("unsupported pointer size {pointer_size}")]
	UnsupportedPointerSize {
		/// Declared pointer width or header size marker.
		pointer_size: usize,
	},
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Block payload length was negative.
	#[error("negative block length {len}")]
	NegativeBlockLength {
		/// Parsed signed length.
		len: i64,
	},
	/// Block element count was negative.
	#[error("negative block count {nr}")]
	NegativeBlockCount {
		/// Parsed signed element count.
		nr: i64,
	},
	/// Block payload would exceed remaining file data.
	#[error("block length {len} at offset {at} exceeds remaining {rem}")]
	BlockLenOutOfRange {
		/// Block header file offset.
		at: usize,
		/// Declared payload length.
		len: u64,
		/// Remaining bytes in cursor.
		rem: usize,
	},
	/// No DNA1 block was found and no schema was supplied.
	#[error("DNA1 block not found")]
	DnaNotFound,
	/// Unexpected DNA section tag.
	#[error("DNA tag mismatch at {at}: expected {expected:?}, got {got:?}")]
	DnaBadTag {
		/// Expected section tag.
		expected: [u8; 4],
		/// Actual section tag.
		got: [u8; 4],
		/// Cursor offset of the tag read.
		at: usize,
	},
	/// Out-of-range index inside DNA tables.
	#[error("DNA index out of range for {kind}: idx={idx}, max={max}")]
	DnaIndexOutOfRange {
		/// Logical index kind being validated.
		kind: &'static str,
		/// Offending index value.
		idx: u32,
		/// Maximum valid index.
		max: u32,
	},
	/// Duplicate type->struct mapping in DNA `STRC` section.
	#[error("DNA duplicate struct type index {type_idx}: first={first}, second={second}")]
	DnaDuplicateStructType {
		/// Duplicate type index.
		type_idx: u16,
		/// First struct index observed.
		first: u32,
		/// Second struct index observed.
		second: u32,
	},
	/// Block payload was too short for its declared struct layout.
	#[error("decode payload too small: need={need}, have={have}")]
	PayloadTooSmall {
		/// Required number of bytes.
		need: usize,
		/// Available bytes.
		have: usize,
	},
	/// Requested decode array length exceeded configured limit.
	#[error("decode array too large: count={count}, max={max}")]
	ArrayTooLarge {
		/// Requested array length.
		count: usize,
		/// Maximum permitted array length.
		max: usize,
	},
	/// Nested struct decoding went deeper than the configured limit.
	#[error("decode depth exceeded (max={max_depth})")]
	DecodeDepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// The main scene could not be located.
	#[error("no scene found in file")]
	SceneNotFound,
	/// Block references a struct index the schema does not define.
	#[error("schema has no struct with index {sdna_nr}")]
	MissingStruct {
		/// Missing struct index.
		sdna_nr: u32,
	},
	/// Schema builder referenced a type that was never declared.
	#[error("schema references unknown type {name}")]
	UnknownType {
		/// Referenced type name.
		name: String,
	},
	/// Schema builder declared the same struct twice.
	#[error("schema declares struct {name} twice")]
	DuplicateStruct {
		/// Struct name.
		name: String,
	},
	/// Requested field is not part of the struct descriptor.
	#[error("unknown field {field} on {struct_name}")]
	UnknownField {
		/// Struct type name.
		struct_name: String,
		/// Missing field name.
		field: String,
	},
	/// Field exists but is not pointer-typed.
	#[error("field {field} on {struct_name} is not a pointer")]
	ExpectedPointer {
		/// Struct type name.
		struct_name: String,
		/// Non-pointer field name.
		field: String,
	},
	/// Path step needs a struct but the current value is something else.
	#[error("path step {step} expected a struct, got {got}")]
	ExpectedStruct {
		/// Offending step text.
		step: String,
		/// Actual value kind.
		got: &'static str,
	},
	/// Path index step applied to a non-array or past its end.
	#[error("index {index} out of range (len={len})")]
	IndexOutOfRange {
		/// Requested index.
		index: usize,
		/// Available length (0 for non-arrays).
		len: usize,
	},
	/// Path resolved to a value of a different kind than requested.
	#[error("{path}: expected {expected}, got {got}")]
	TypeMismatch {
		/// Path that was read.
		path: String,
		/// Requested value kind.
		expected: &'static str,
		/// Actual value kind.
		got: &'static str,
	},
	/// Path expression syntax is invalid.
	#[error("invalid field path: {path}")]
	InvalidFieldPath {
		/// Original user-provided path string.
		path: String,
	},
	/// Block code argument was invalid.
	#[error("invalid block code: {code}")]
	InvalidBlockCode {
		/// User-provided code string.
		code: String,
	},
	/// No block carries the requested code.
	#[error("no block with code {code}")]
	BlockNotFound {
		/// Requested code label.
		code: String,
	},
	/// Report output could not be encoded.
	#[error("encode failed: {reason}")]
	Encode {
		/// Encoder message.
		reason: String,
	},
	/// Pointer resolver could not map a non-zero pointer.
	#[error("dangling pointer: 0x{ptr:016x}")]
	DanglingPointer {
		/// Pointer value that failed to resolve.
		ptr: u64,
	},
}

impl BlendError {
	/// Group this error into one of the coarse failure categories.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) | Self::Encode { .. } => ErrorKind::Io,
			Self::UnknownMagic { .. }
			| Self::NotBlendAfterDecompress
			| Self::Decompress { .. }
			| Self::DecompressedTooLarge { .. }
			| Self::InvalidHeader
			| Self::UnsupportedFormatVersion { .. }
			| Self::UnsupportedPointerSize { .. }
			| Self::UnexpectedEof { .. }
			| Self::NegativeBlockLength { .. }
			| Self::NegativeBlockCount { .. }
			| Self::BlockLenOutOfRange { .. }
			| Self::DnaNotFound
			| Self::DnaBadTag { .. }
			| Self::DnaIndexOutOfRange { .. }
			| Self::DnaDuplicateStructType { .. }
			| Self::PayloadTooSmall { .. }
			| Self::ArrayTooLarge { .. }
			| Self::DecodeDepthExceeded { .. }
			| Self::SceneNotFound => ErrorKind::Format,
			Self::MissingStruct { .. }
			| Self::UnknownType { .. }
			| Self::DuplicateStruct { .. }
			| Self::UnknownField { .. }
			| Self::ExpectedPointer { .. }
			| Self::ExpectedStruct { .. }
			| Self::IndexOutOfRange { .. }
			| Self::TypeMismatch { .. }
			| Self::InvalidFieldPath { .. }
			| Self::InvalidBlockCode { .. }
			| Self::BlockNotFound { .. } => ErrorKind::Schema,
			Self::DanglingPointer { .. } => ErrorKind::DanglingPointer,
		}
	}
}
