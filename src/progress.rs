//! Byte counting for dump input.
//!
//! `ProgressReader` sits between the file and the decompressor, so the
//! count reflects bytes of the file on disk. That matches the total shown
//! by the progress bar even for compressed dumps.

use std::cell::Cell;
use std::io::Read;
use std::rc::Rc;

/// Shared handle to the number of bytes read so far
pub type ByteCounter = Rc<Cell<u64>>;

/// A reader wrapper that counts bytes and optionally reports them.
pub struct ProgressReader<R: Read> {
    reader: R,
    callback: Option<Box<dyn Fn(u64)>>,
    bytes_read: ByteCounter,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            callback: None,
            bytes_read: Rc::new(Cell::new(0)),
        }
    }

    /// Call `callback` with the running total after every read
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64) + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Counter that stays readable after the reader is boxed away
    pub fn counter(&self) -> ByteCounter {
        Rc::clone(&self.bytes_read)
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        let total = self.bytes_read.get() + n as u64;
        self.bytes_read.set(total);
        if let Some(cb) = &self.callback {
            cb(total);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_bytes_and_reports() {
        let reported = Rc::new(Cell::new(0u64));
        let reported_clone = Rc::clone(&reported);

        let data = vec![7u8; 10_000];
        let mut reader =
            ProgressReader::new(&data[..]).with_callback(move |n| reported_clone.set(n));
        let counter = reader.counter();

        let mut sink = Vec::new();
        reader.read_to_end(&mut sink).unwrap();

        assert_eq!(sink.len(), 10_000);
        assert_eq!(counter.get(), 10_000);
        assert_eq!(reported.get(), 10_000);
    }
}
