mod bhead;
mod block;
mod bytes;
mod compression;
mod decl;
mod decode;
mod dna;
mod error;
mod file;
mod header;
mod path;
mod pointer;
mod scan;
mod scene;
mod schema;
mod value;

/// Parsed block record header and the terminating code.
pub use bhead::{BHead, ENDB};
/// Borrowed block view with pointer and path access.
pub use block::Block;
/// Compression detection result.
pub use compression::Compression;
/// Struct decoding entry points and options.
pub use decode::{DecodeOptions, decode_block, decode_struct};
/// Raw `DNA1` tables.
pub use dna::{Dna, DnaField, DnaStruct};
/// Error, category, and result aliases.
pub use error::{BlendError, ErrorKind, Result};
/// File handle, open settings, and block statistics.
pub use file::{BlendFile, BlockStats, Blocks, DEFAULT_MAX_DECOMPRESSED_BYTES, OpenOptions};
/// File header representation.
pub use header::{BLEND_MAGIC, BlendHeader, BlockLayout, Endianness};
/// Field path parser types.
pub use path::{FieldPath, PathStep};
/// Address lookup and resolution types.
pub use pointer::{AddressIndex, PointerStorage, Target};
/// Sequential block-record scanner.
pub use scan::{BlockEntry, BlockScanner};
/// Main-scene lookup and frame range query.
pub use scene::{FrameRange, frame_range, main_scene};
/// Struct descriptor tables.
pub use schema::{FieldDef, FieldKind, FieldSpec, FieldType, ScalarType, Schema, SchemaBuilder, StructDef};
/// Decoded runtime value types.
pub use value::{FieldValue, StructValue, Value};
