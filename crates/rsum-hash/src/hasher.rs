use digest::Digest;

use crate::HashKind;

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    /// Produce the digest and return the hasher to its initial state.
    fn finalize_reset(&mut self) -> Vec<u8>;
}

#[derive(Default)]
pub struct Crc32Hasher(crc32fast::Hasher);

impl Crc32Hasher {
    pub fn new() -> Self { Self(crc32fast::Hasher::new()) }

    pub fn checksum(data: &[u8]) -> u32 { crc32fast::hash(data) }
}

impl Hasher for Crc32Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }

    fn finalize_reset(&mut self) -> Vec<u8> {
        let hasher = std::mem::take(&mut self.0);
        hasher.finalize().to_be_bytes().to_vec()
    }
}

/// Adapter for any RustCrypto [`Digest`].
#[derive(Default)]
pub struct DigestHasher<D: Digest + Default + Send>(D);

impl<D: Digest + Default + Send> DigestHasher<D> {
    pub fn new() -> Self { Self(D::new()) }
}

impl<D: Digest + Default + Send> Hasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) { Digest::update(&mut self.0, data); }

    fn finalize_reset(&mut self) -> Vec<u8> {
        let hasher = std::mem::take(&mut self.0);
        hasher.finalize().to_vec()
    }
}

#[derive(Default)]
pub struct Blake3Hasher(blake3::Hasher);

impl Blake3Hasher {
    pub fn new() -> Self { Self(blake3::Hasher::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { blake3::hash(data).as_bytes().to_vec() }
}

impl Hasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }

    fn finalize_reset(&mut self) -> Vec<u8> {
        let out = self.0.finalize().as_bytes().to_vec();
        self.0.reset();
        out
    }
}

pub(crate) fn for_kind(kind: HashKind) -> Box<dyn Hasher> {
    match kind {
        HashKind::Crc32 => Box::new(Crc32Hasher::new()),
        HashKind::Sha1 => Box::new(DigestHasher::<sha1::Sha1>::new()),
        HashKind::Sha256 => Box::new(DigestHasher::<sha2::Sha256>::new()),
        HashKind::Sha512 => Box::new(DigestHasher::<sha2::Sha512>::new()),
        HashKind::Blake3 => Box::new(Blake3Hasher::new()),
    }
}
