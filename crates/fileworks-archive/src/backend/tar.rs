use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ::tar::{Archive, Builder};

use fileworks_core::{TaskError, TaskReporter};

use super::{ArchiveBackend, Completion, CompressJob, ExtractJob};
use crate::codec::{Codec, CountingReader};
use crate::format::ArchiveFormat;

/// Plain and compressed tar archives.
#[derive(Debug, Default)]
pub struct TarBackend;

impl ArchiveBackend for TarBackend {
    fn name(&self) -> &'static str {
        "tar"
    }

    fn formats(&self) -> &'static [ArchiveFormat] {
        &[
            ArchiveFormat::Tar,
            ArchiveFormat::TarGz,
            ArchiveFormat::TarBz2,
            ArchiveFormat::TarXz,
            ArchiveFormat::TarLzma,
        ]
    }

    fn compress(
        &self,
        job: &CompressJob<'_>,
        reporter: &mut TaskReporter,
    ) -> Result<Completion, TaskError> {
        let spec = job.spec;
        let target = spec.target.as_path();
        let codec = codec_for(spec.format, target)?;

        let file = job.create_target()?;
        let encoder = codec
            .encoder(BufWriter::new(file), spec.level, None)
            .map_err(|e| TaskError::archive(target, e))?;
        let mut builder = Builder::new(encoder);
        builder.follow_symlinks(false);

        let total = job.members.len();
        for (i, member) in job.members.iter().enumerate() {
            if reporter.is_cancelled() {
                return Ok(Completion::Cancelled(i));
            }

            let result = if member.is_dir() {
                builder.append_dir(&member.name, &member.source)
            } else {
                builder.append_path_with_name(&member.source, &member.name)
            };
            result.map_err(|e| TaskError::io(&member.source, e))?;

            reporter.progress_fraction(i + 1, total);
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| TaskError::io(target, e))?;
        encoder
            .finish()
            .and_then(|mut file| file.flush())
            .map_err(|e| TaskError::io(target, e))?;

        Ok(Completion::Finished(total))
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
        let mut archive = Archive::new(decoder);
        archive.set_preserve_mtime(true);
        archive.set_preserve_permissions(true);
        archive.set_overwrite(true);

        let entries = archive
            .entries()
            .map_err(|e| TaskError::archive(job.archive, e))?;

        let mut extracted = 0;
        for entry in entries {
            if reporter.is_cancelled() {
                return Ok(Completion::Cancelled(extracted));
            }

            let mut entry = entry.map_err(|e| TaskError::archive(job.archive, e))?;
            let unpacked = entry
                .unpack_in(job.destination)
                .map_err(|e| TaskError::archive(job.archive, e))?;
            if unpacked {
                extracted += 1;
            } else {
                let name = entry
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                tracing::warn!(
                    archive = %job.archive.display(),
                    member = name,
                    "refusing member outside the destination"
                );
            }

            // Stays below 100 until the stream is exhausted.
            let read = consumed.get().min(archive_len.saturating_sub(1));
            reporter.progress_fraction(read as usize, archive_len as usize);
        }

        Ok(Completion::Finished(extracted))
    }
}

fn codec_for(format: ArchiveFormat, path: &Path) -> Result<Codec, TaskError> {
    match Codec::for_format(format) {
        Some(codec) if format.is_tar() => Ok(codec),
        _ => Err(TaskError::archive(path, format!("{format} is not a tar format"))),
    }
}
