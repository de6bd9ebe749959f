// tests/resolve_patterns.rs

use std::error::Error;
use std::path::{Path, PathBuf};

use assetpipe::errors::AssetpipeError;
use assetpipe::fs::RealFileSystem;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::resolve::{PatternList, resolve};
use assetpipe_test_utils::{init_tracing, write_file};

type TestResult = Result<(), Box<dyn Error>>;

fn pats(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/lib/a.js", "a");
    fs.add_file("/proj/lib/sub/b.js", "b");
    fs.add_file("/proj/lib/sub/c.css", "c");
    fs.add_file("/proj/lib/vendor/v.js", "v");
    fs.add_file("/proj/temp/t.js", "t");
    fs.add_file("/proj/src/s.js", "s");
    fs
}

fn paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(PathBuf::from).collect()
}

#[test]
fn recursive_glob_matches_nested_files_in_sorted_order() -> TestResult {
    init_tracing();
    let fs = project();

    let files = resolve(&fs, Path::new("/proj"), &pats(&["lib/**/*.js"]))?;

    assert_eq!(
        files.into_vec(),
        paths(&["/proj/lib/a.js", "/proj/lib/sub/b.js", "/proj/lib/vendor/v.js"])
    );
    Ok(())
}

#[test]
fn negation_removes_previously_matched_files() -> TestResult {
    let fs = project();

    let files = resolve(&fs, Path::new("/proj"), &pats(&["**/*.js", "!temp/**"]))?;

    assert!(!files.contains(Path::new("/proj/temp/t.js")));
    assert!(files.contains(Path::new("/proj/src/s.js")));
    assert!(files.contains(Path::new("/proj/lib/a.js")));
    Ok(())
}

#[test]
fn later_include_re_adds_a_negated_file() -> TestResult {
    let fs = project();

    let files = resolve(
        &fs,
        Path::new("/proj"),
        &pats(&["lib/**/*.js", "!lib/vendor/**", "lib/vendor/v.js"]),
    )?;

    assert!(files.contains(Path::new("/proj/lib/vendor/v.js")));
    assert_eq!(files.len(), 3);
    Ok(())
}

#[test]
fn negation_only_affects_files_collected_before_it() -> TestResult {
    let fs = project();

    let files = resolve(&fs, Path::new("/proj"), &pats(&["!temp/**", "temp/*.js"]))?;

    assert_eq!(files.into_vec(), paths(&["/proj/temp/t.js"]));
    Ok(())
}

#[test]
fn single_star_does_not_cross_directories() -> TestResult {
    let fs = project();

    let files = resolve(&fs, Path::new("/proj"), &pats(&["lib/*.js"]))?;

    assert_eq!(files.into_vec(), paths(&["/proj/lib/a.js"]));
    Ok(())
}

#[test]
fn directory_pattern_selects_everything_beneath_it() -> TestResult {
    let fs = project();

    let files = resolve(&fs, Path::new("/proj"), &pats(&["lib/sub"]))?;

    assert_eq!(
        files.into_vec(),
        paths(&["/proj/lib/sub/b.js", "/proj/lib/sub/c.css"])
    );
    Ok(())
}

#[test]
fn overlapping_includes_do_not_duplicate() -> TestResult {
    let fs = project();

    let files = resolve(&fs, Path::new("/proj"), &pats(&["lib/**/*.js", "lib/*.js", "lib/a.js"]))?;

    assert_eq!(files.len(), 3);
    Ok(())
}

#[test]
fn zero_matches_is_an_empty_set_not_an_error() -> TestResult {
    let fs = project();

    let files = resolve(&fs, Path::new("/proj"), &pats(&["assets/**/*.png"]))?;

    assert!(files.is_empty());
    Ok(())
}

#[test]
fn resolution_is_deterministic() -> TestResult {
    let fs = project();
    let patterns = pats(&["**/*", "!**/*.css"]);

    let first = resolve(&fs, Path::new("/proj"), &patterns)?;
    let second = resolve(&fs, Path::new("/proj"), &patterns)?;

    assert_eq!(first.as_slice(), second.as_slice());
    Ok(())
}

#[test]
fn empty_pattern_is_rejected() {
    let fs = project();

    for bad in ["", "!", "  "] {
        let err = resolve(&fs, Path::new("/proj"), &pats(&[bad])).unwrap_err();
        assert!(
            matches!(err, AssetpipeError::Pattern { .. }),
            "expected pattern error for {bad:?}, got {err:?}"
        );
    }
}

#[test]
fn malformed_pattern_is_rejected_before_walking() {
    let fs = project();

    let err = resolve(&fs, Path::new("/proj"), &pats(&["lib/**/*.js", "lib/[abc.js"])).unwrap_err();

    match err {
        AssetpipeError::Pattern { pattern, .. } => assert_eq!(pattern, "lib/[abc.js"),
        other => panic!("expected pattern error, got {other:?}"),
    }
}

#[test]
fn symlinks_are_not_followed() -> TestResult {
    let fs = project();
    fs.add_symlink("/proj/lib/link", "/proj/src");
    fs.add_symlink("/proj/lib/loop", "/proj/lib");

    let files = resolve(&fs, Path::new("/proj"), &pats(&["lib/**/*.js"]))?;

    assert!(files.iter().all(|p| !p.starts_with("/proj/lib/link")));
    assert_eq!(files.len(), 3);
    Ok(())
}

#[test]
fn pattern_list_matches_single_paths_with_last_match_winning() -> TestResult {
    let list = PatternList::compile(
        Path::new("/proj"),
        &pats(&["lib/**/*.js", "!lib/vendor/**", "lib/vendor/keep.js"]),
    )?;

    assert!(list.matches(Path::new("/proj/lib/a.js")));
    assert!(!list.matches(Path::new("/proj/lib/vendor/v.js")));
    assert!(list.matches(Path::new("/proj/lib/vendor/keep.js")));
    assert!(!list.matches(Path::new("/proj/src/s.js")));
    Ok(())
}

#[test]
fn source_root_is_the_common_base_of_includes() -> TestResult {
    let list = PatternList::compile(
        Path::new("/proj"),
        &pats(&["lib/js/**/*.js", "lib/css/*.css", "!lib/js/vendor/**"]),
    )?;
    assert_eq!(list.source_root(), PathBuf::from("/proj/lib"));

    let literal = PatternList::compile(Path::new("/proj"), &pats(&["lib/a.js"]))?;
    assert_eq!(literal.source_root(), PathBuf::from("/proj/lib"));
    Ok(())
}

#[test]
fn resolves_against_the_real_filesystem() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_file(dir.path(), "lib/a.js", "a");
    write_file(dir.path(), "lib/nested/b.js", "b");
    write_file(dir.path(), "lib/nested/readme.md", "r");

    let files = resolve(&RealFileSystem, dir.path(), &pats(&["lib/**/*.js"]))?;

    let names: Vec<String> = files
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(names, vec!["a.js", "b.js"]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn real_symlinked_directories_are_skipped() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_file(dir.path(), "lib/a.js", "a");
    write_file(dir.path(), "other/b.js", "b");
    std::os::unix::fs::symlink(dir.path().join("other"), dir.path().join("lib/linked"))?;
    std::os::unix::fs::symlink(dir.path().join("lib"), dir.path().join("lib/cycle"))?;

    let files = resolve(&RealFileSystem, dir.path(), &pats(&["lib/**/*.js"]))?;

    assert_eq!(files.len(), 1);
    Ok(())
}
