use std::fmt;

use crate::hasher::{self, Hasher};
use crate::{HashKind, HashMask};

type Callback = Box<dyn FnMut(u64) + Send>;

/// One file registered with a batch context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub name: String,
    pub size: u64,
}

/// Computes every requested digest simultaneously over one byte stream.
///
/// Digests become readable through [`HashContext::digest`] once
/// [`HashContext::finalize`] has run. `msg_size` keeps counting across files
/// when the context is reused for a batch.
pub struct HashContext {
    mask:        HashMask,
    hashers:     Vec<(HashKind, Box<dyn Hasher>)>,
    digests:     Vec<(HashKind, Vec<u8>)>,
    msg_size:    u64,
    finalized:   bool,
    callback:    Option<Callback>,
    batch_files: Vec<BatchFile>,
}

impl HashContext {
    pub fn new(mask: HashMask) -> Self {
        Self {
            mask,
            hashers: mask.iter().map(|kind| (kind, hasher::for_kind(kind))).collect(),
            digests: Vec::new(),
            msg_size: 0,
            finalized: false,
            callback: None,
            batch_files: Vec::new(),
        }
    }

    pub fn mask(&self) -> HashMask { self.mask }

    pub fn msg_size(&self) -> u64 { self.msg_size }

    pub fn is_finalized(&self) -> bool { self.finalized }

    pub fn update(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        for (_, hasher) in &mut self.hashers {
            hasher.update(data);
        }
        self.msg_size += data.len() as u64;
        if let Some(callback) = self.callback.as_mut() {
            callback(self.msg_size);
        }
    }

    /// Compute all digests. A second call without an intervening
    /// [`reset`](Self::reset) is a no-op.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.digests = self
            .hashers
            .iter_mut()
            .map(|(kind, hasher)| (*kind, hasher.finalize_reset()))
            .collect();
        self.finalized = true;
    }

    /// Return to the freshly created state, keeping the requested kinds.
    pub fn reset(&mut self) {
        if !self.finalized {
            for (_, hasher) in &mut self.hashers {
                let _ = hasher.finalize_reset();
            }
        }
        self.digests.clear();
        self.msg_size = 0;
        self.finalized = false;
        self.batch_files.clear();
    }

    pub fn digest(&self, kind: HashKind) -> Option<&[u8]> {
        self.digests
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, bytes)| bytes.as_slice())
    }

    pub fn hex_digest(&self, kind: HashKind) -> Option<String> { self.digest(kind).map(hex::encode) }

    /// Finalized CRC32 as a big-endian integer.
    pub fn crc32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.digest(HashKind::Crc32)?.try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    /// Install a hook invoked after every update with the cumulative byte count.
    pub fn set_callback(&mut self, callback: impl FnMut(u64) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) { self.callback = None; }

    /// Notify the context that another file joins the running batch.
    pub fn add_batch_file(&mut self, name: impl Into<String>, size: u64) {
        self.batch_files.push(BatchFile {
            name: name.into(),
            size,
        });
    }

    pub fn batch_files(&self) -> &[BatchFile] { &self.batch_files }
}

impl fmt::Debug for HashContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashContext")
            .field("mask", &self.mask)
            .field("msg_size", &self.msg_size)
            .field("finalized", &self.finalized)
            .field("batch_files", &self.batch_files.len())
            .finish()
    }
}
