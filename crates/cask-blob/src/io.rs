use crate::blob::Blob;
use crate::error::{BlobError, BlobResult};

/// Largest size a blob may reach through writes.
pub const MAX_BLOB_SIZE: u64 = i64::MAX as u64;

/// Result of a positional read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes written into the caller's buffer.
    pub n: usize,
    /// The read stopped at the end of the blob.
    pub eof: bool,
}

/// Positional reader/writer borrowing a [`Blob`].
///
/// Offsets are signed so that a negative one can be reported instead of
/// wrapping; any negative offset is an error.
pub struct BlobIo<'a> {
    blob: &'a mut Blob,
}

impl Blob {
    pub fn io(&mut self) -> BlobIo<'_> {
        BlobIo { blob: self }
    }
}

impl BlobIo<'_> {
    /// Read into `buf` starting at `off`.
    ///
    /// Holes and trimmed chunk tails read as zeroes. `eof` is set only when
    /// the read hit the end of the blob; a buffer that ends exactly at the
    /// end of the blob reports `eof: false`, and the next read reports
    /// `n: 0, eof: true`.
    pub async fn read_at(&self, buf: &mut [u8], off: i64) -> BlobResult<ReadOutcome> {
        let mut off = u64::try_from(off).map_err(|_| BlobError::NegativeOffset(off))?;
        let size = self.blob.size();
        let cs = self.blob.chunk_size();
        let mut pos = 0usize;

        loop {
            if off >= size {
                return Ok(ReadOutcome { n: pos, eof: true });
            }
            let avail = ((buf.len() - pos) as u64).min(size - off);
            if avail == 0 {
                break;
            }

            let loff = (off % cs) as usize;
            let want = avail.min(cs - loff as u64) as usize;
            let chunk = self.blob.lookup(off).await?;
            let data = chunk.buf.get(loff..).unwrap_or_default();
            let copied = want.min(data.len());
            buf[pos..pos + copied].copy_from_slice(&data[..copied]);
            buf[pos + copied..pos + want].fill(0);

            pos += want;
            off += want as u64;
        }
        Ok(ReadOutcome { n: pos, eof: false })
    }

    /// Write `buf` at `off`, growing the blob as needed. Returns the number
    /// of bytes written, which is all of `buf` on success.
    ///
    /// The size is bumped after each chunk, so a failed write leaves the
    /// blob covering whatever was written before the error.
    pub async fn write_at(&mut self, buf: &[u8], off: i64) -> BlobResult<usize> {
        let mut off = u64::try_from(off).map_err(|_| BlobError::NegativeOffset(off))?;
        match off.checked_add(buf.len() as u64) {
            Some(end) if end <= MAX_BLOB_SIZE => {}
            _ => return Err(BlobError::SizeOverflow { max: MAX_BLOB_SIZE }),
        }

        let cs = self.blob.chunk_size();
        let mut pos = 0usize;
        while pos < buf.len() {
            let loff = (off % cs) as usize;
            let n = (buf.len() - pos).min(cs as usize - loff);
            let chunk = self.blob.lookup_for_write(off).await?;
            chunk.buf[loff..loff + n].copy_from_slice(&buf[pos..pos + n]);

            pos += n;
            off += n as u64;
            if off > self.blob.size() {
                self.blob.set_size(off);
            }
        }
        Ok(pos)
    }
}
