use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::mpsc,
};
use tracing::debug;

/// Splits an arbitrary sequence of output chunks into complete, trimmed,
/// non-empty records.
///
/// The accumulator carries the unterminated tail of the stream between calls
/// to [`feed`](RecordSplitter::feed), so chunk boundaries never have to align
/// with record boundaries. A tail still buffered when the stream closes is
/// discarded, never emitted as a record.
#[derive(Debug, Clone, Default)]
pub struct RecordSplitter {
    pending: Vec<u8>,
}

impl RecordSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every record it completes, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut records = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let line = String::from_utf8_lossy(&self.pending[start..start + offset]);
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                records.push(trimmed.to_string());
            }
            start += offset + 1;
        }
        // Invariant: no newline remains buffered between calls.
        self.pending.drain(..start);
        records
    }
}

/// Splits a complete buffered string the same way the streaming path does:
/// one record per line, trimmed, blank lines skipped, and any text after the
/// final newline dropped.
pub fn split_records(text: &str) -> Vec<String> {
    RecordSplitter::new().feed(text.as_bytes())
}

/// Reads `reader` to EOF, forwarding each completed record over `sender`.
///
/// Stops early without error if the receiving side is gone (the consumer
/// aborted the run).
pub(crate) async fn forward_records<R>(
    mut reader: R,
    sender: mpsc::UnboundedSender<String>,
    mirror: bool,
) -> Result<(), std::io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut splitter = RecordSplitter::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if mirror {
            debug!(chunk = %String::from_utf8_lossy(&chunk[..n]), "stdout chunk");
        }
        for record in splitter.feed(&chunk[..n]) {
            if sender.send(record).is_err() {
                return Ok(());
            }
        }
    }
    Ok(())
}
