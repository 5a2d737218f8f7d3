//! Stream compression shared by the tar and single-stream backends.

use std::cell::Cell;
use std::io::{self, Read, Write};
use std::rc::Rc;

use bzip2::read::MultiBzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use xz2::read::XzDecoder;
use xz2::stream::{LzmaOptions, Stream};
use xz2::write::XzEncoder;

use crate::format::ArchiveFormat;
use crate::level::CompressionLevel;

/// Compression applied around a tar stream or a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Plain,
    Gzip,
    Bzip2,
    Xz,
    /// Legacy `.lzma` (lzma-alone) stream.
    Lzma,
}

impl Codec {
    /// The codec a tar-family or single-stream format uses.
    pub fn for_format(format: ArchiveFormat) -> Option<Self> {
        match format {
            ArchiveFormat::Tar => Some(Self::Plain),
            ArchiveFormat::TarGz | ArchiveFormat::Gz => Some(Self::Gzip),
            ArchiveFormat::TarBz2 | ArchiveFormat::Bz2 => Some(Self::Bzip2),
            ArchiveFormat::TarXz | ArchiveFormat::Xz => Some(Self::Xz),
            ArchiveFormat::TarLzma => Some(Self::Lzma),
            _ => None,
        }
    }

    /// Wrap `writer` in this codec's encoder. `gzip_name` is stored in the
    /// gzip header when given.
    pub fn encoder<W: Write>(
        self,
        writer: W,
        level: CompressionLevel,
        gzip_name: Option<&str>,
    ) -> io::Result<Encoder<W>> {
        Ok(match self {
            Self::Plain => Encoder::Plain(writer),
            Self::Gzip => {
                let compression = Compression::new(level.deflate().unwrap_or(0));
                let mut builder = GzBuilder::new();
                if let Some(name) = gzip_name {
                    builder = builder.filename(name);
                }
                Encoder::Gzip(builder.write(writer, compression))
            }
            Self::Bzip2 => Encoder::Bzip2(BzEncoder::new(
                writer,
                bzip2::Compression::new(level.bzip2()),
            )),
            Self::Xz => Encoder::Xz(XzEncoder::new(writer, level.xz_preset())),
            Self::Lzma => {
                let options = LzmaOptions::new_preset(level.xz_preset()).map_err(io::Error::other)?;
                let stream = Stream::new_lzma_encoder(&options).map_err(io::Error::other)?;
                Encoder::Xz(XzEncoder::new_stream(writer, stream))
            }
        })
    }

    /// Wrap `reader` in this codec's decoder.
    pub fn decoder<'a, R: Read + 'a>(self, reader: R) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Self::Plain => Box::new(reader),
            Self::Gzip => Box::new(MultiGzDecoder::new(reader)),
            Self::Bzip2 => Box::new(MultiBzDecoder::new(reader)),
            Self::Xz => Box::new(XzDecoder::new_multi_decoder(reader)),
            Self::Lzma => {
                let stream = Stream::new_lzma_decoder(u64::MAX).map_err(io::Error::other)?;
                Box::new(XzDecoder::new_stream(reader, stream))
            }
        })
    }
}

/// An encoder that must be finished explicitly so trailer errors surface.
pub enum Encoder<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Bzip2(BzEncoder<W>),
    Xz(XzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    /// Write the stream trailer and return the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Plain(mut w) => {
                w.flush()?;
                Ok(w)
            }
            Self::Gzip(e) => e.finish(),
            Self::Bzip2(e) => e.finish(),
            Self::Xz(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(e) => e.write(buf),
            Self::Bzip2(e) => e.write(buf),
            Self::Xz(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(e) => e.flush(),
            Self::Bzip2(e) => e.flush(),
            Self::Xz(e) => e.flush(),
        }
    }
}

/// Reader that counts the raw bytes pulled through it, for progress over a
/// compressed stream of unknown member count.
pub struct CountingReader<R> {
    inner: R,
    count: Rc<Cell<u64>>,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> (Self, Rc<Cell<u64>>) {
        let count = Rc::new(Cell::new(0));
        (
            Self {
                inner,
                count: Rc::clone(&count),
            },
            count,
        )
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.set(self.count.get() + n as u64);
        Ok(n)
    }
}
