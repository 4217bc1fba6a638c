//! Gzip pass-through writer.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

/// Compresses everything written through it into `W`.
///
/// The gzip trailer is only written by [`CompressingWriter::finish`]; a writer
/// dropped without it leaves a truncated archive behind.
pub struct CompressingWriter<W: Write> {
    encoder: GzEncoder<W>,
}

impl<W: Write> CompressingWriter<W> {
    pub fn new(sink: W) -> Self {
        // Default GzBuilder header: no file name, mtime 0.
        Self {
            encoder: GzEncoder::new(sink, Compression::default()),
        }
    }

    /// Finalize the compressed stream and hand back the underlying sink.
    pub fn finish(self) -> io::Result<W> {
        self.encoder.finish()
    }
}

impl<W: Write> Write for CompressingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}
