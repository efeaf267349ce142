use std::io::{self, Read};

use crate::HashContext;

const CHUNK_SIZE: usize = 64 * 1024;

/// Feed `reader` into `ctx` until EOF, checking `should_stop` between chunks.
///
/// Returns the number of bytes consumed. Bytes fed before a read error stay
/// accounted in the context.
pub fn update_from_reader<R: Read>(
    ctx: &mut HashContext,
    mut reader: R,
    mut should_stop: impl FnMut() -> bool,
) -> io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut consumed = 0u64;
    loop {
        if should_stop() {
            break;
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        ctx.update(&buf[..n]);
        consumed += n as u64;
    }
    Ok(consumed)
}
