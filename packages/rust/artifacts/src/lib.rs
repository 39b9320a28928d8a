//! Output artifacts: content-addressed naming and scoped filesystem writes.
//!
//! Production bundles are named by a fingerprint of their final bytes
//! ([`name_for`]); every emitted file goes through [`write_output`].

mod hash;
mod writer;

pub use hash::{HASH_LEN, content_hash, name_for};
pub use writer::{Removal, remove_output, write_output};
