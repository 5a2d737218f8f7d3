use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use ::zip::result::ZipError;
use ::zip::write::{FileOptions, SimpleFileOptions};
use ::zip::{AesMode, CompressionMethod, ZipArchive, ZipWriter};

use fileworks_core::{TaskError, TaskReporter};

use super::{ArchiveBackend, Completion, CompressJob, ExtractJob};
use crate::format::ArchiveFormat;

/// Zip archives, with AES-256 encryption, comments and appending.
#[derive(Debug, Default)]
pub struct ZipBackend;

impl ArchiveBackend for ZipBackend {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn formats(&self) -> &'static [ArchiveFormat] {
        &[ArchiveFormat::Zip]
    }

    fn compress(
        &self,
        job: &CompressJob<'_>,
        reporter: &mut TaskReporter,
    ) -> Result<Completion, TaskError> {
        let spec = job.spec;
        let target = spec.target.as_path();

        let mut zip = if job.append {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(target)
                .map_err(|e| TaskError::io(target, e))?;
            ZipWriter::new_append(file).map_err(|e| zip_error(target, e))?
        } else {
            let file = job.create_target()?;
            ZipWriter::new(file)
        };

        let (method, level) = match spec.level.deflate() {
            None => (CompressionMethod::Stored, None),
            Some(level) => (CompressionMethod::Deflated, Some(i64::from(level))),
        };
        let mut file_options: FileOptions<'_, ()> = SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(level);
        if let Some(password) = spec.password.as_deref() {
            file_options = file_options.with_aes_encryption(AesMode::Aes256, password);
        }
        let dir_options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let total = job.members.len();
        for (i, member) in job.members.iter().enumerate() {
            if reporter.is_cancelled() {
                zip.finish().map_err(|e| zip_error(target, e))?;
                return Ok(Completion::Cancelled(i));
            }

            if member.is_dir() {
                zip.add_directory(member.name.as_str(), dir_options.clone())
                    .map_err(|e| zip_error(target, e))?;
            } else {
                let options = file_options
                    .clone()
                    .large_file(member.size >= u64::from(u32::MAX))
                    .unix_permissions(unix_mode(&member.source));
                zip.start_file(member.name.as_str(), options)
                    .map_err(|e| zip_error(target, e))?;
                let mut source = BufReader::new(
                    File::open(&member.source).map_err(|e| TaskError::io(&member.source, e))?,
                );
                io::copy(&mut source, &mut zip).map_err(|e| TaskError::io(&member.source, e))?;
            }

            reporter.progress_fraction(i + 1, total);
        }

        if let Some(comment) = spec.comment.as_deref() {
            zip.set_comment(comment);
        }
        zip.finish().map_err(|e| zip_error(target, e))?;

        Ok(Completion::Finished(total))
    }

    fn extract(
        &self,
        job: &ExtractJob<'_>,
        reporter: &mut TaskReporter,
    ) -> Result<Completion, TaskError> {
        let file = File::open(job.archive).map_err(|e| TaskError::io(job.archive, e))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| zip_error(job.archive, e))?;

        let total = archive.len();
        for i in 0..total {
            if reporter.is_cancelled() {
                return Ok(Completion::Cancelled(i));
            }

            let mut entry = match job.password {
                Some(password) => archive.by_index_decrypt(i, password.as_bytes()),
                None => archive.by_index(i),
            }
            .map_err(|e| zip_error(job.archive, e))?;

            let relative = entry.enclosed_name().ok_or_else(|| {
                TaskError::archive(
                    job.archive,
                    format!("member '{}' escapes the destination", entry.name()),
                )
            })?;
            let out_path = job.destination.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path).map_err(|e| TaskError::io(&out_path, e))?;
            } else {
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
                }
                let out = File::create(&out_path).map_err(|e| TaskError::io(&out_path, e))?;
                let mut out = BufWriter::new(out);
                io::copy(&mut entry, &mut out).map_err(|e| match e.kind() {
                    io::ErrorKind::InvalidData => TaskError::archive(job.archive, e),
                    _ => TaskError::io(&out_path, e),
                })?;
                out.flush().map_err(|e| TaskError::io(&out_path, e))?;
                set_unix_mode(&out_path, entry.unix_mode());
            }

            reporter.progress_fraction(i + 1, total);
        }

        Ok(Completion::Finished(total))
    }
}

fn zip_error(path: &Path, err: ZipError) -> TaskError {
    match err {
        ZipError::InvalidPassword => TaskError::PasswordRejected {
            path: path.to_path_buf(),
        },
        ZipError::UnsupportedArchive(msg) if msg == ZipError::PASSWORD_REQUIRED => {
            TaskError::PasswordRejected {
                path: path.to_path_buf(),
            }
        }
        ZipError::Io(e) => TaskError::io(path, e),
        other => TaskError::archive(path, other),
    }
}

#[cfg(unix)]
fn unix_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o777)
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn unix_mode(_path: &Path) -> u32 {
    0o644
}

#[cfg(unix)]
fn set_unix_mode(path: &Path, mode: Option<u32>) {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777)) {
            tracing::debug!(path = %path.display(), "could not restore permissions: {err}");
        }
    }
}

#[cfg(not(unix))]
fn set_unix_mode(_path: &Path, _mode: Option<u32>) {}
