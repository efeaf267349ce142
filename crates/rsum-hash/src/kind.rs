use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use crate::HashError;

/// Digest algorithms a [`HashContext`](crate::HashContext) can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashKind {
    Crc32,
    Sha1,
    Sha256,
    Sha512,
    Blake3,
}

impl HashKind {
    pub const ALL: [HashKind; 5] = [
        HashKind::Crc32,
        HashKind::Sha1,
        HashKind::Sha256,
        HashKind::Sha512,
        HashKind::Blake3,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            HashKind::Crc32 => 1 << 0,
            HashKind::Sha1 => 1 << 1,
            HashKind::Sha256 => 1 << 2,
            HashKind::Sha512 => 1 << 3,
            HashKind::Blake3 => 1 << 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            HashKind::Crc32 => "CRC32",
            HashKind::Sha1 => "SHA1",
            HashKind::Sha256 => "SHA256",
            HashKind::Sha512 => "SHA512",
            HashKind::Blake3 => "BLAKE3",
        }
    }

    /// Digest length in bytes.
    pub const fn digest_len(self) -> usize {
        match self {
            HashKind::Crc32 => 4,
            HashKind::Sha1 => 20,
            HashKind::Sha256 | HashKind::Blake3 => 32,
            HashKind::Sha512 => 64,
        }
    }

    /// Kinds whose hex rendering is `hex_len` characters long, in bit order.
    pub fn by_hex_len(hex_len: usize) -> impl Iterator<Item = HashKind> {
        Self::ALL
            .into_iter()
            .filter(move |kind| kind.digest_len() * 2 == hex_len)
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for HashKind {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| HashError::UnknownKind(s.to_string()))
    }
}

/// A set of [`HashKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HashMask(u32);

impl HashMask {
    pub const fn empty() -> Self { Self(0) }

    pub const fn bits(self) -> u32 { self.0 }

    pub const fn is_empty(self) -> bool { self.0 == 0 }

    pub const fn contains(self, kind: HashKind) -> bool { self.0 & kind.bit() != 0 }

    pub fn insert(&mut self, kind: HashKind) { self.0 |= kind.bit(); }

    pub fn with(mut self, kind: HashKind) -> Self {
        self.insert(kind);
        self
    }

    pub fn len(self) -> usize { self.0.count_ones() as usize }

    pub fn iter(self) -> impl Iterator<Item = HashKind> {
        HashKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl From<HashKind> for HashMask {
    fn from(kind: HashKind) -> Self { Self(kind.bit()) }
}

impl BitOr for HashMask {
    type Output = HashMask;

    fn bitor(self, rhs: Self) -> Self::Output { Self(self.0 | rhs.0) }
}

impl BitOr<HashKind> for HashMask {
    type Output = HashMask;

    fn bitor(self, rhs: HashKind) -> Self::Output { self.with(rhs) }
}

impl FromIterator<HashKind> for HashMask {
    fn from_iter<T: IntoIterator<Item = HashKind>>(iter: T) -> Self {
        iter.into_iter().fold(HashMask::empty(), HashMask::with)
    }
}

impl fmt::Display for HashMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(HashKind::name).collect();
        f.write_str(&names.join("+"))
    }
}
