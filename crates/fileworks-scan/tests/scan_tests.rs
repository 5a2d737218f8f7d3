use std::fs;
use std::path::{Path, PathBuf};

use fileworks_core::{
    EngineConfig, MatchMode, SearchMatches, TaskId, TaskKind, TaskOutcome, TaskOutput,
    TaskReporter, task_channel,
};
use fileworks_scan::{ExcludeSet, SearchEngine, SearchRequest, Walker, folder_size, measure};

fn search_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("report.txt"), b"q1").unwrap();
    fs::write(dir.path().join("report_final.txt"), b"q1 final").unwrap();
    fs::write(dir.path().join("image.png"), b"png").unwrap();
    dir
}

fn reporter(kind: TaskKind) -> TaskReporter {
    let (_handle, reporter) = task_channel(TaskId(1), kind);
    reporter
}

fn matches(outcome: &TaskOutcome) -> &SearchMatches {
    outcome.output().and_then(TaskOutput::as_search).unwrap()
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_exact_search_keeps_walk_order() {
    let dir = search_fixture();
    let engine = SearchEngine::default();
    let mut reporter = reporter(TaskKind::Search);

    let outcome = engine.run(&SearchRequest::new(dir.path(), "report"), &mut reporter);
    assert!(matches!(outcome, TaskOutcome::Completed(_)));

    let found = matches(&outcome);
    assert_eq!(found.mode, MatchMode::Exact);
    assert_eq!(names(&found.paths), vec!["report.txt", "report_final.txt"]);
    assert_eq!(reporter.current_progress(), 100);
}

#[test]
fn test_search_is_case_insensitive() {
    let dir = search_fixture();
    let outcome =
        SearchEngine::default().run(&SearchRequest::new(dir.path(), "IMAGE"), &mut reporter(TaskKind::Search));
    assert_eq!(names(&matches(&outcome).paths), vec!["image.png"]);
}

#[test]
fn test_fuzzy_fallback_on_typo() {
    let dir = search_fixture();
    let outcome = SearchEngine::default()
        .run(&SearchRequest::new(dir.path(), "reprot"), &mut reporter(TaskKind::Search));

    let found = matches(&outcome);
    assert_eq!(found.mode, MatchMode::Fuzzy);
    assert_eq!(names(&found.paths), vec!["report.txt", "report_final.txt"]);
    assert!(found.message().contains("similar"));
}

#[test]
fn test_no_matches() {
    let dir = search_fixture();
    let outcome = SearchEngine::default()
        .run(&SearchRequest::new(dir.path(), "zzzzzz"), &mut reporter(TaskKind::Search));

    let found = matches(&outcome);
    assert_eq!(found.mode, MatchMode::NoMatches);
    assert!(found.is_empty());
}

#[test]
fn test_search_respects_excludes_and_recursion() {
    let dir = search_fixture();
    fs::create_dir(dir.path().join("old")).unwrap();
    fs::write(dir.path().join("old/report_2019.txt"), b"x").unwrap();
    fs::write(dir.path().join("report.tmp"), b"x").unwrap();

    let engine = SearchEngine::default();
    let request = SearchRequest::new(dir.path(), "report").exclude(vec!["*.tmp".into()]);
    let outcome = engine.run(&request, &mut reporter(TaskKind::Search));
    assert_eq!(
        names(&matches(&outcome).paths),
        vec!["report_2019.txt", "report.txt", "report_final.txt"]
    );

    let shallow = engine.run(&request.clone().recursive(false), &mut reporter(TaskKind::Search));
    assert_eq!(
        names(&matches(&shallow).paths),
        vec!["report.txt", "report_final.txt"]
    );
}

#[test]
fn test_empty_query_fails_before_walking() {
    let dir = search_fixture();
    let mut reporter = reporter(TaskKind::Search);
    let outcome = SearchEngine::default().run(&SearchRequest::new(dir.path(), "  "), &mut reporter);

    assert!(matches!(outcome, TaskOutcome::Failed(_)));
    assert_eq!(reporter.current_progress(), 0);
}

#[test]
fn test_missing_root_fails() {
    let dir = tempfile::tempdir().unwrap();
    let request = SearchRequest::new(dir.path().join("gone"), "x");
    assert!(request.validate().is_err());
}

#[test]
fn test_cancelled_search_stops_early() {
    let dir = search_fixture();
    let (handle, mut reporter) = task_channel(TaskId(7), TaskKind::Search);
    handle.cancel();

    let outcome = SearchEngine::default().run(&SearchRequest::new(dir.path(), "report"), &mut reporter);
    assert!(matches!(outcome, TaskOutcome::Cancelled(_)));
    assert!(matches(&outcome).is_empty());
    assert!(reporter.current_progress() < 100);
}

#[test]
fn test_fuzzy_threshold_from_config() {
    let dir = search_fixture();
    let strict = EngineConfig::builder().fuzzy_threshold(0.95).build().unwrap();
    let outcome = SearchEngine::new(strict)
        .run(&SearchRequest::new(dir.path(), "reprot"), &mut reporter(TaskKind::Search));
    assert_eq!(matches(&outcome).mode, MatchMode::NoMatches);
}

#[test]
fn test_walk_excludes_tmp_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("keep.txt"), b"k").unwrap();
    fs::write(dir.path().join("drop.tmp"), b"d").unwrap();

    let excludes = ExcludeSet::new(&["*.tmp"], Default::default()).unwrap();
    let found: Vec<String> = Walker::new(dir.path())
        .excludes(excludes)
        .walk()
        .map(|e| e.name())
        .collect();
    assert_eq!(found, vec!["keep.txt"]);
}

#[test]
fn test_measure_reports_sizes_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    fs::write(dir.path().join("a"), vec![0u8; 100]).unwrap();
    fs::write(dir.path().join("b"), vec![0u8; 250]).unwrap();
    fs::write(nested.join("c"), vec![0u8; 1024]).unwrap();
    assert_eq!(folder_size(dir.path()), 1374);

    let paths = vec![dir.path().to_path_buf(), nested.clone(), dir.path().join("b")];
    let mut reporter = reporter(TaskKind::Measure);
    let outcome = measure(&paths, &EngineConfig::default(), &mut reporter);

    match outcome {
        TaskOutcome::Completed(TaskOutput::Sizes(sizes)) => {
            let values: Vec<u64> = sizes.iter().map(|(_, s)| *s).collect();
            assert_eq!(values, vec![1374, 1024, 250]);
            assert_eq!(sizes[1].0, nested);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_walk_root_is_not_yielded() {
    let dir = search_fixture();
    let root = dir.path();
    assert!(Walker::new(root).walk().all(|e| e.path.as_path() != Path::new(root)));
}
