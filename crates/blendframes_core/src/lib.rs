//! Read-only access to block-structured `.blend` files: block catalogue, pointer resolution,
//! schema-driven field reads, and scene frame ranges.

/// File parsing, struct decoding, pointer resolution, and scene queries.
pub mod blend;
