//! Streaming hash contexts for checksum manifests.
//!
//! A [`HashContext`] computes any combination of the supported digests in a
//! single pass over the data. Contexts can be reset and reused, and can
//! accumulate several files into one aggregate digest (batch mode).
//!
//! # Example
//!
//! ```
//! use rsum_hash::{HashContext, HashKind, HashMask};
//!
//! let mut ctx = HashContext::new(HashMask::from(HashKind::Crc32) | HashKind::Sha1);
//! ctx.update(b"hello world");
//! ctx.finalize();
//!
//! assert_eq!(ctx.crc32(), Some(0x0D4A1185));
//! assert_eq!(ctx.msg_size(), 11);
//! ```

pub use self::context::{BatchFile, HashContext};
pub use self::error::{HashError, Result};
pub use self::hasher::{Blake3Hasher, Crc32Hasher, DigestHasher, Hasher};
pub use self::kind::{HashKind, HashMask};
pub use self::reader::update_from_reader;

mod context;
mod error;
mod hasher;
mod kind;
mod reader;
