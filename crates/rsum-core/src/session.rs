use std::io::{self, Read};

use rsum_hash::{HashContext, HashMask, update_from_reader};

use crate::{InterruptHandle, RunStatistics};

/// Lifecycle of the run's hash context.
///
/// ```text
/// Idle ──start──▶ ActiveSingle ──finish──▶ Finalized ──start──▶ ActiveSingle
///   └──start(batch)──▶ ActiveBatch ──start(same kinds)──▶ ActiveBatch
///                          └──finish(last)──▶ Finalized
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    ActiveSingle,
    ActiveBatch,
    Finalized,
}

/// The single hash context of a run, reused across files in batch mode.
#[derive(Debug, Default)]
pub struct DigestSession {
    ctx:   Option<HashContext>,
    state: SessionState,
    batch: bool,
}

impl DigestSession {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self) -> SessionState { self.state }

    pub fn is_batch(&self) -> bool { self.batch }

    pub fn context(&self) -> Option<&HashContext> { self.ctx.as_ref() }

    pub(crate) fn context_mut(&mut self) -> Option<&mut HashContext> { self.ctx.as_mut() }

    /// Drop the current context and choose between single and batch mode.
    pub fn reset(&mut self, batch: bool) {
        self.ctx = None;
        self.state = SessionState::Idle;
        self.batch = batch;
    }

    /// A running batch accepts another file only while it hashes the same kinds.
    fn continues_batch(&self, mask: HashMask) -> bool {
        self.batch
            && self.state == SessionState::ActiveBatch
            && self.ctx.as_ref().is_some_and(|ctx| ctx.mask() == mask)
    }

    /// Prepare a context for the next file.
    ///
    /// Outside a compatible batch the previous context is discarded and a
    /// fresh one created. Inside one, the file is announced to the running
    /// context instead.
    pub fn start(&mut self, mask: HashMask, name: &str, size: u64) -> &mut HashContext {
        if !self.continues_batch(mask) {
            self.ctx = Some(HashContext::new(mask));
            self.state = if self.batch {
                SessionState::ActiveBatch
            } else {
                SessionState::ActiveSingle
            };
        }
        let batch = self.batch;
        let ctx = self.ctx.get_or_insert_with(|| HashContext::new(mask));
        if batch {
            ctx.add_batch_file(name, size);
        }
        ctx
    }

    /// Hash `reader` to exhaustion and return the bytes added by this call.
    ///
    /// `stats.total_bytes` grows by the context's message-length delta even
    /// when the read fails part way.
    pub fn feed<R: Read>(
        &mut self,
        reader: R,
        stats: &mut RunStatistics,
        interrupt: &InterruptHandle,
    ) -> io::Result<u64> {
        let Some(ctx) = self.ctx.as_mut() else {
            return Err(io::Error::other("no active hash context"));
        };
        let before = ctx.msg_size();
        let result = update_from_reader(ctx, reader, || interrupt.is_interrupted());
        let delta = ctx.msg_size() - before;
        stats.total_bytes += delta;
        result.map(|_| delta)
    }

    /// Finalize the digests, unless a batch still expects more files.
    pub fn finish(&mut self, is_last_of_batch: bool) {
        if self.state == SessionState::ActiveBatch && !is_last_of_batch {
            return;
        }
        if let Some(ctx) = self.ctx.as_mut() {
            ctx.clear_callback();
            ctx.finalize();
            self.state = SessionState::Finalized;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rsum_hash::HashKind;

    use super::*;

    fn feed(session: &mut DigestSession, data: &[u8], stats: &mut RunStatistics) -> u64 {
        session
            .feed(Cursor::new(data.to_vec()), stats, &InterruptHandle::new())
            .unwrap()
    }

    #[test]
    fn test_single_mode_recreates_context() {
        let mut session = DigestSession::new();
        let mut stats = RunStatistics::default();

        session.start(HashKind::Crc32.into(), "a", 3);
        assert_eq!(session.state(), SessionState::ActiveSingle);
        feed(&mut session, b"abc", &mut stats);
        session.finish(false);
        assert_eq!(session.state(), SessionState::Finalized);
        assert_eq!(session.context().unwrap().crc32(), Some(0x352441C2));

        let ctx = session.start(HashKind::Crc32.into(), "b", 0);
        assert_eq!(ctx.msg_size(), 0);
        assert!(ctx.batch_files().is_empty());
        assert_eq!(stats.total_bytes, 3);
    }

    #[test]
    fn test_batch_mode_accumulates_files() {
        let mut session = DigestSession::new();
        session.reset(true);
        let mut stats = RunStatistics::default();

        session.start(HashKind::Sha256.into(), "a", 3);
        assert_eq!(feed(&mut session, b"abc", &mut stats), 3);
        session.finish(false);
        assert_eq!(session.state(), SessionState::ActiveBatch);

        session.start(HashKind::Sha256.into(), "b", 3);
        assert_eq!(feed(&mut session, b"def", &mut stats), 3);
        session.finish(true);

        let ctx = session.context().unwrap();
        assert_eq!(ctx.batch_files().len(), 2);
        assert_eq!(stats.total_bytes, 6);

        let mut whole = HashContext::new(HashKind::Sha256.into());
        whole.update(b"abcdef");
        whole.finalize();
        assert_eq!(ctx.digest(HashKind::Sha256), whole.digest(HashKind::Sha256));
    }

    #[test]
    fn test_batch_restarts_when_kinds_change() {
        let mut session = DigestSession::new();
        session.reset(true);
        let mut stats = RunStatistics::default();

        session.start(HashKind::Sha256.into(), "a", 3);
        feed(&mut session, b"abc", &mut stats);
        let ctx = session.start(HashKind::Sha1.into(), "b", 3);
        assert_eq!(ctx.msg_size(), 0);
        assert_eq!(ctx.batch_files().len(), 1);
    }

    #[test]
    fn test_feed_without_start_fails() {
        let mut session = DigestSession::new();
        let mut stats = RunStatistics::default();
        let err = session
            .feed(Cursor::new(b"x".to_vec()), &mut stats, &InterruptHandle::new())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
