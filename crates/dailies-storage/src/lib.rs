//! Dailies Storage Library
//!
//! Sharded path derivation, atomic streaming writes, and the managed local
//! store built on both.

pub mod paths;
pub mod store;
pub mod writer;

pub use paths::StoragePaths;
pub use store::MediaStore;
