use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fileworks_archive::{
    ArchiveBackend, ArchiveEngine, ArchiveFormat, ArchiveSpec, BackendRegistry, Completion,
    CompressJob, CompressionLevel, ExtractJob, ExtractSpec, PathStorage,
};
use fileworks_core::{
    EngineConfig, ErrorClass, TaskError, TaskId, TaskKind, TaskOutcome, TaskOutput, TaskReporter,
    task_channel,
};

fn reporter(kind: TaskKind) -> TaskReporter {
    let (_handle, reporter) = task_channel(TaskId(1), kind);
    reporter
}

fn compress(spec: &ArchiveSpec) -> TaskOutcome {
    ArchiveEngine::default().compress(spec, &mut reporter(TaskKind::Compress))
}

fn extract(spec: &ExtractSpec) -> TaskOutcome {
    ArchiveEngine::default().extract(spec, &mut reporter(TaskKind::Extract))
}

fn zip_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}

fn failure(outcome: TaskOutcome) -> TaskError {
    match outcome {
        TaskOutcome::Failed(err) => err,
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_zip_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    let content: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    fs::write(docs.join("notes.bin"), &content).unwrap();

    let target = dir.path().join("docs.zip");
    let spec = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Zip)
        .sources(vec![docs.join("notes.bin")])
        .level(CompressionLevel::Store)
        .build()
        .unwrap();
    let outcome = compress(&spec);
    assert!(matches!(outcome, TaskOutcome::Completed(TaskOutput::Archive { members: 1, .. })));

    let out = dir.path().join("out");
    let outcome = extract(&ExtractSpec::new(&target).destination(&out));
    assert!(matches!(outcome, TaskOutcome::Completed(_)));
    assert_eq!(fs::read(out.join("notes.bin")).unwrap(), content);
}

#[test]
fn test_zip_keeps_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    fs::create_dir_all(project.join("src")).unwrap();
    fs::write(project.join("README"), b"readme").unwrap();
    fs::write(project.join("src/main.rs"), b"fn main() {}").unwrap();

    let target = dir.path().join("project.zip");
    let spec = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Zip)
        .sources(vec![project.clone()])
        .build()
        .unwrap();
    assert!(matches!(compress(&spec), TaskOutcome::Completed(_)));

    let names = zip_names(&target);
    assert!(names.contains(&"project/README".to_string()));
    assert!(names.contains(&"project/src/main.rs".to_string()));

    let out = dir.path().join("out");
    assert!(matches!(
        extract(&ExtractSpec::new(&target).destination(&out)),
        TaskOutcome::Completed(_)
    ));
    assert_eq!(fs::read(out.join("project/src/main.rs")).unwrap(), b"fn main() {}");
}

#[test]
fn test_password_on_tar_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"a").unwrap();

    let target = dir.path().join("out.tar");
    let spec = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Tar)
        .sources(vec![dir.path().join("a.txt")])
        .password("secret")
        .build()
        .unwrap();

    let err = failure(compress(&spec));
    assert!(matches!(err, TaskError::PasswordNotSupported { .. }));
    assert_eq!(err.class(), ErrorClass::Scope);
    assert!(!target.exists());
}

#[test]
fn test_exclude_tmp_from_archive() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), b"keep").unwrap();
    fs::write(src.join("a.tmp"), b"drop").unwrap();

    let target = dir.path().join("src.zip");
    let spec = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Zip)
        .sources(vec![src])
        .exclude_patterns(vec!["*.tmp".to_string()])
        .build()
        .unwrap();
    assert!(matches!(compress(&spec), TaskOutcome::Completed(_)));

    let files: Vec<String> = zip_names(&target)
        .into_iter()
        .filter(|n| !n.ends_with('/'))
        .collect();
    assert_eq!(files, vec!["src/a.txt"]);
}

#[test]
fn test_missing_backend_is_reported_distinctly() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"a").unwrap();

    let target = dir.path().join("a.7z");
    let spec = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::SevenZ)
        .sources(vec![dir.path().join("a.txt")])
        .build()
        .unwrap();
    let err = failure(compress(&spec));
    assert_eq!(err.class(), ErrorClass::BackendUnavailable);
    assert!(!target.exists());

    fs::write(dir.path().join("b.rar"), b"Rar!").unwrap();
    let err = failure(extract(
        &ExtractSpec::new(dir.path().join("b.rar")).destination(dir.path()),
    ));
    assert!(err.is_backend_unavailable());
}

#[test]
fn test_single_stream_rejects_many_sources_and_folders() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"a").unwrap();
    fs::write(dir.path().join("b.txt"), b"b").unwrap();
    fs::create_dir(dir.path().join("folder")).unwrap();

    let many = ArchiveSpec::builder()
        .target(dir.path().join("out.gz"))
        .format(ArchiveFormat::Gz)
        .sources(vec![dir.path().join("a.txt"), dir.path().join("b.txt")])
        .build()
        .unwrap();
    let err = failure(compress(&many));
    assert!(matches!(err, TaskError::InvalidInput { .. }));
    assert!(err.to_string().contains("single file"));

    let folder = ArchiveSpec::builder()
        .target(dir.path().join("out.xz"))
        .format(ArchiveFormat::Xz)
        .sources(vec![dir.path().join("folder")])
        .build()
        .unwrap();
    assert!(matches!(failure(compress(&folder)), TaskError::InvalidInput { .. }));
    assert!(!dir.path().join("out.gz").exists());
}

#[test]
fn test_gz_round_trip_strips_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, b"line one\nline two\n").unwrap();

    let target = dir.path().join("notes.txt.gz");
    let spec = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Gz)
        .sources(vec![notes])
        .level(CompressionLevel::Best)
        .build()
        .unwrap();
    assert!(matches!(compress(&spec), TaskOutcome::Completed(_)));

    let out = dir.path().join("out");
    let outcome = extract(&ExtractSpec::new(&target).destination(&out));
    assert!(matches!(outcome, TaskOutcome::Completed(TaskOutput::Extracted { members: 1, .. })));
    assert_eq!(fs::read(out.join("notes.txt")).unwrap(), b"line one\nline two\n");
}

#[test]
fn test_tar_family_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("nested")).unwrap();
    fs::write(src.join("a.txt"), b"alpha").unwrap();
    fs::write(src.join("nested/b.txt"), b"beta").unwrap();

    for format in [
        ArchiveFormat::Tar,
        ArchiveFormat::TarGz,
        ArchiveFormat::TarBz2,
        ArchiveFormat::TarXz,
        ArchiveFormat::TarLzma,
    ] {
        let target = dir.path().join(format!("src.{}", format.extension()));
        let spec = ArchiveSpec::builder()
            .target(&target)
            .format(format)
            .sources(vec![src.clone()])
            .build()
            .unwrap();
        assert!(matches!(compress(&spec), TaskOutcome::Completed(_)), "{format}");

        let out = dir.path().join(format!("out-{}", format.extension()));
        let outcome = extract(&ExtractSpec::new(&target).destination(&out));
        assert!(matches!(outcome, TaskOutcome::Completed(_)), "{format}");
        assert_eq!(fs::read(out.join("src/nested/b.txt")).unwrap(), b"beta", "{format}");
    }
}

#[test]
fn test_zip_password_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("secret.txt"), b"top secret").unwrap();

    let target = dir.path().join("secret.zip");
    let spec = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Zip)
        .sources(vec![dir.path().join("secret.txt")])
        .password("hunter2")
        .build()
        .unwrap();
    assert!(matches!(compress(&spec), TaskOutcome::Completed(_)));

    let wrong = failure(extract(
        &ExtractSpec::new(&target)
            .destination(dir.path().join("wrong"))
            .password("nope"),
    ));
    assert!(matches!(wrong, TaskError::PasswordRejected { .. }));

    let missing = failure(extract(
        &ExtractSpec::new(&target).destination(dir.path().join("missing")),
    ));
    assert!(matches!(missing, TaskError::PasswordRejected { .. }));

    let out = dir.path().join("right");
    let outcome = extract(&ExtractSpec::new(&target).destination(&out).password("hunter2"));
    assert!(matches!(outcome, TaskOutcome::Completed(_)));
    assert_eq!(fs::read(out.join("secret.txt")).unwrap(), b"top secret");
}

#[test]
fn test_zip_append_and_comment() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("one.txt"), b"1").unwrap();
    fs::write(dir.path().join("two.txt"), b"2").unwrap();
    let target = dir.path().join("both.zip");

    let first = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Zip)
        .sources(vec![dir.path().join("one.txt")])
        .comment("weekly backup")
        .build()
        .unwrap();
    assert!(matches!(compress(&first), TaskOutcome::Completed(_)));
    let archive = zip::ZipArchive::new(File::open(&target).unwrap()).unwrap();
    assert_eq!(archive.comment(), b"weekly backup");

    let second = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Zip)
        .sources(vec![dir.path().join("two.txt")])
        .append(true)
        .build()
        .unwrap();
    assert!(matches!(compress(&second), TaskOutcome::Completed(_)));

    let mut names = zip_names(&target);
    names.sort();
    assert_eq!(names, vec!["one.txt", "two.txt"]);
}

#[test]
fn test_basename_only_storage() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("deep/er");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("leaf.txt"), b"leaf").unwrap();

    let target = dir.path().join("flat.zip");
    let spec = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Zip)
        .sources(vec![dir.path().join("deep")])
        .path_storage(PathStorage::BasenameOnly)
        .build()
        .unwrap();
    assert!(matches!(compress(&spec), TaskOutcome::Completed(_)));
    assert_eq!(zip_names(&target), vec!["leaf.txt"]);
}

#[test]
fn test_cancelled_compress_stops_before_members() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"a").unwrap();

    let (handle, mut reporter) = task_channel(TaskId(3), TaskKind::Compress);
    handle.cancel();

    let spec = ArchiveSpec::builder()
        .target(dir.path().join("a.zip"))
        .format(ArchiveFormat::Zip)
        .sources(vec![dir.path().join("a.txt")])
        .build()
        .unwrap();
    let outcome = ArchiveEngine::default().compress(&spec, &mut reporter);
    assert!(matches!(outcome, TaskOutcome::Cancelled(TaskOutput::Archive { members: 0, .. })));
    assert!(reporter.current_progress() < 100);
}

#[test]
fn test_extract_needs_destination_and_known_format() {
    let dir = tempfile::tempdir().unwrap();
    let blob = dir.path().join("blob.dat");
    fs::write(&blob, b"???").unwrap();

    let err = failure(extract(&ExtractSpec::new(&blob).destination(dir.path())));
    assert!(matches!(err, TaskError::UnsupportedFormat { .. }));

    let zip_path = dir.path().join("empty.zip");
    zip::ZipWriter::new(File::create(&zip_path).unwrap()).finish().unwrap();
    let err = failure(extract(&ExtractSpec::new(&zip_path)));
    assert!(matches!(err, TaskError::NoDestination));
}

#[test]
fn test_corrupt_archive_fails_whole_task() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.tar.gz");
    fs::write(&bogus, b"definitely not gzip").unwrap();

    let outcome = extract(&ExtractSpec::new(&bogus).destination(dir.path().join("out")));
    assert!(matches!(outcome, TaskOutcome::Failed(_)));
}

#[test]
fn test_zip_member_escaping_destination_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let evil = dir.path().join("evil.zip");
    {
        let mut writer = zip::ZipWriter::new(File::create(&evil).unwrap());
        writer
            .start_file("../escaped.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"gotcha").unwrap();
        writer.finish().unwrap();
    }

    let out: PathBuf = dir.path().join("out");
    let outcome = extract(&ExtractSpec::new(&evil).destination(&out));
    assert!(matches!(outcome, TaskOutcome::Failed(TaskError::Archive { .. })));
    assert!(!dir.path().join("escaped.txt").exists());
}

#[test]
fn test_target_equal_to_source_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, b"precious data").unwrap();

    for format in [ArchiveFormat::Gz, ArchiveFormat::Zip, ArchiveFormat::Tar] {
        let spec = ArchiveSpec::builder()
            .target(&notes)
            .format(format)
            .sources(vec![notes.clone()])
            .build()
            .unwrap();

        let err = failure(compress(&spec));
        assert_eq!(err.class(), ErrorClass::Scope, "{format}");
        assert_eq!(fs::read(&notes).unwrap(), b"precious data", "{format}");
    }
}

#[test]
fn test_failed_compress_keeps_unopened_target() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("old.gz");
    fs::write(&old, b"older archive").unwrap();
    fs::write(dir.path().join("a.tmp"), b"t").unwrap();

    let spec = ArchiveSpec::builder()
        .target(&old)
        .format(ArchiveFormat::Gz)
        .sources(vec![dir.path().join("a.tmp")])
        .exclude_patterns(vec!["*.tmp".to_string()])
        .build()
        .unwrap();

    let err = failure(compress(&spec));
    assert!(matches!(err, TaskError::InvalidInput { .. }));
    assert_eq!(fs::read(&old).unwrap(), b"older archive");
}

/// Creates the target, then fails.
struct BrokenBackend;

impl ArchiveBackend for BrokenBackend {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn formats(&self) -> &'static [ArchiveFormat] {
        &[ArchiveFormat::Zip]
    }

    fn compress(
        &self,
        job: &CompressJob<'_>,
        _reporter: &mut TaskReporter,
    ) -> Result<Completion, TaskError> {
        let mut file = job.create_target()?;
        file.write_all(b"partial").unwrap();
        Err(TaskError::invalid_input("disk full"))
    }

    fn extract(
        &self,
        _job: &ExtractJob<'_>,
        _reporter: &mut TaskReporter,
    ) -> Result<Completion, TaskError> {
        unreachable!()
    }
}

#[test]
fn test_failed_compress_removes_created_target() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("a.txt");
    fs::write(&source, b"a").unwrap();
    let target = dir.path().join("a.zip");

    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(BrokenBackend));
    let engine = ArchiveEngine::new(registry, EngineConfig::default());

    let spec = ArchiveSpec::builder()
        .target(&target)
        .format(ArchiveFormat::Zip)
        .sources(vec![source.clone()])
        .build()
        .unwrap();
    let outcome = engine.compress(&spec, &mut reporter(TaskKind::Compress));

    assert!(matches!(outcome, TaskOutcome::Failed(_)));
    assert!(!target.exists());
    assert!(source.exists());
}
