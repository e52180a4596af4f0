/// Block catalogue listing.
pub mod blocks;
/// Main-scene frame range extraction.
pub mod frames;
/// Generic field path reads.
pub mod get;
/// Header and block statistics.
pub mod info;
/// Shared CLI helpers.
pub mod util;
