use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use fileworks_core::{TaskError, TaskReporter};

use super::{ArchiveBackend, Completion, CompressJob, ExtractJob};
use crate::codec::{Codec, CountingReader};
use crate::format::{ArchiveFormat, single_stream_output_name};

const CHUNK: usize = 256 * 1024;

/// Raw gzip, bzip2 and xz streams holding a single file.
#[derive(Debug, Default)]
pub struct StreamBackend;

impl ArchiveBackend for StreamBackend {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn formats(&self) -> &'static [ArchiveFormat] {
        &[ArchiveFormat::Gz, ArchiveFormat::Bz2, ArchiveFormat::Xz]
    }

    fn compress(
        &self,
        job: &CompressJob<'_>,
        reporter: &mut TaskReporter,
    ) -> Result<Completion, TaskError> {
        let spec = job.spec;
        let target = spec.target.as_path();
        let codec = codec_for(spec.format, target)?;

        let member = match job.members {
            [member] if !member.is_dir() => member,
            _ => {
                return Err(TaskError::invalid_input(format!(
                    "{} compresses exactly one file",
                    spec.format
                )));
            }
        };

        let source = File::open(&member.source).map_err(|e| TaskError::io(&member.source, e))?;
        let out = job.create_target()?;
        let mut encoder = codec
            .encoder(BufWriter::new(out), spec.level, Some(&member.name))
            .map_err(|e| TaskError::archive(target, e))?;

        let copied = copy_with_progress(
            BufReader::new(source),
            &mut encoder,
            member.size,
            reporter,
            |n| n,
        )
        .map_err(|e| TaskError::io(&member.source, e))?;
        if copied.is_none() {
            return Ok(Completion::Cancelled(0));
        }

        encoder
            .finish()
            .and_then(|mut file| file.flush())
            .map_err(|e| TaskError::io(target, e))?;

        Ok(Completion::Finished(1))
    }

    fn extract(
        &self,
        job: &ExtractJob<'_>,
        reporter: &mut TaskReporter,
    ) -> Result<Completion, TaskError> {
        let codec = codec_for(job.format, job.archive)?;
        let file = File::open(job.archive).map_err(|e| TaskError::io(job.archive, e))?;
        let archive_len = file.metadata().map(|m| m.len()).unwrap_or(0);

        let (reader, consumed) = CountingReader::new(BufReader::new(file));
        let decoder = codec
            .decoder(reader)
            .map_err(|e| TaskError::archive(job.archive, e))?;

        let out_path = job.destination.join(single_stream_output_name(job.archive));
        let out = File::create(&out_path).map_err(|e| TaskError::io(&out_path, e))?;
        let mut out = BufWriter::new(out);

        let copied = copy_with_progress(decoder, &mut out, archive_len, reporter, |_| {
            consumed.get()
        })
        .map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof => {
                TaskError::archive(job.archive, e)
            }
            _ => TaskError::io(&out_path, e),
        })?;
        if copied.is_none() {
            return Ok(Completion::Cancelled(0));
        }
        out.flush().map_err(|e| TaskError::io(&out_path, e))?;

        Ok(Completion::Finished(1))
    }
}

/// Copy `reader` to `writer` in chunks, checking for cancellation between
/// chunks. `position` maps bytes copied so far to progress against `total`.
/// Returns `None` if cancelled.
fn copy_with_progress<R: Read, W: Write>(
    mut reader: R,
    writer: &mut W,
    total: u64,
    reporter: &mut TaskReporter,
    position: impl Fn(u64) -> u64,
) -> io::Result<Option<u64>> {
    let mut buf = vec![0u8; CHUNK];
    let mut copied = 0u64;

    loop {
        if reporter.is_cancelled() {
            return Ok(None);
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        copied += n as u64;

        let done = position(copied).min(total.saturating_sub(1));
        reporter.progress_fraction(done as usize, total as usize);
    }

    Ok(Some(copied))
}

fn codec_for(format: ArchiveFormat, path: &std::path::Path) -> Result<Codec, TaskError> {
    match Codec::for_format(format) {
        Some(codec) if format.is_single_stream() => Ok(codec),
        _ => Err(TaskError::archive(
            path,
            format!("{format} is not a single-stream format"),
        )),
    }
}
