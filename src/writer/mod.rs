use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;
pub const RECORD_FLUSH_COUNT: usize = 10_000;

/// Destination for extracted records
pub trait RecordSink {
    /// Write one record made of already-selected field texts
    fn write_record(&mut self, fields: &[&[u8]]) -> io::Result<()>;
}

/// Tab-separated record writer, one record per line
pub struct TsvWriter<W: Write> {
    writer: W,
    write_count: usize,
    max_record_buffer: usize,
}

impl<W: Write> TsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            write_count: 0,
            max_record_buffer: RECORD_FLUSH_COUNT,
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.write_count = 0;
        self.writer.flush()
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for TsvWriter<W> {
    fn write_record(&mut self, fields: &[&[u8]]) -> io::Result<()> {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b"\t")?;
            }
            self.writer.write_all(field)?;
        }
        self.writer.write_all(b"\n")?;

        self.write_count += 1;
        if self.write_count >= self.max_record_buffer {
            self.write_count = 0;
            self.writer.flush()?;
        }

        Ok(())
    }
}

/// Output file, gzip file or stdout
pub enum Output {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Stdout(BufWriter<Stdout>),
}

impl Output {
    /// Open `path` for writing; `-` is stdout and a `.gz` suffix compresses
    pub fn create(path: &Path) -> io::Result<Self> {
        if path.as_os_str() == "-" {
            return Ok(Output::Stdout(BufWriter::with_capacity(
                WRITER_BUFFER_SIZE,
                io::stdout(),
            )));
        }

        let file = BufWriter::with_capacity(WRITER_BUFFER_SIZE, File::create(path)?);
        let gzip = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

        if gzip {
            Ok(Output::Gzip(GzEncoder::new(file, flate2::Compression::default())))
        } else {
            Ok(Output::Plain(file))
        }
    }

    /// Flush everything, writing the gzip trailer when compressing
    pub fn finish(self) -> io::Result<()> {
        match self {
            Output::Plain(mut w) => w.flush(),
            Output::Gzip(enc) => enc.finish()?.flush(),
            Output::Stdout(mut w) => w.flush(),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Plain(w) => w.write(buf),
            Output::Gzip(w) => w.write(buf),
            Output::Stdout(w) => w.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Output::Plain(w) => w.write_all(buf),
            Output::Gzip(w) => w.write_all(buf),
            Output::Stdout(w) => w.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Plain(w) => w.flush(),
            Output::Gzip(w) => w.flush(),
            Output::Stdout(w) => w.flush(),
        }
    }
}
