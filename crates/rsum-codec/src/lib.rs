//! Line grammar for checksum manifests.
//!
//! Three grammars are understood when reading, whatever format is selected:
//!
//! | format   | line                         |
//! |----------|------------------------------|
//! | `Sfv`    | `path/to/file 1A2B3C4D`      |
//! | `Simple` | `<hex> [<hex> ...]  path`    |
//! | `Bsd`    | `SHA256 (path) = <hex>`      |
//!
//! The selected [`ManifestFormat`] decides what [`LineCodec::encode`] writes.

pub use self::codec::{LineCodec, ManifestCodec, ManifestFormat, implied_kind};
pub use self::error::{CodecError, Result};
pub use self::record::ChecksumRecord;
pub use self::text::{is_binary_line, is_blank_line, is_comment_line, strip_bom, text_line};

mod codec;
mod error;
mod record;
mod text;
