// tests/transforms.rs

use std::error::Error;
use std::sync::Arc;

use assetpipe::config::Target;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::fs::{FileSystem, RealFileSystem};
use assetpipe::mapping::AssetMapping;
use assetpipe::pipeline::copy::copy_if_changed;
use assetpipe::pipeline::{
    CommandTransform, CopyTransform, Transform, TransformOutcome, transform_for_target,
};
use assetpipe::types::TransformKind;
use assetpipe_test_utils::with_timeout;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn copy_creates_parent_directories() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/lib/a.js", "console.log(1)");
    let mapping = AssetMapping::new("/proj/lib/a.js", "/proj/dist/deep/a.js");

    let outcome = copy_if_changed(&fs, &mapping)?;

    assert_eq!(outcome, TransformOutcome::Written);
    assert!(fs.is_dir(std::path::Path::new("/proj/dist/deep")));
    assert_eq!(fs.contents("/proj/dist/deep/a.js"), Some(b"console.log(1)".to_vec()));
    Ok(())
}

#[test]
fn copy_skips_identical_content_and_rewrites_changed_content() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/lib/a.js", "same");
    fs.add_file("/proj/dist/a.js", "same");
    let mapping = AssetMapping::new("/proj/lib/a.js", "/proj/dist/a.js");

    assert_eq!(copy_if_changed(&fs, &mapping)?, TransformOutcome::Skipped);

    fs.add_file("/proj/lib/a.js", "changed");
    assert_eq!(copy_if_changed(&fs, &mapping)?, TransformOutcome::Written);
    assert_eq!(fs.contents("/proj/dist/a.js"), Some(b"changed".to_vec()));
    Ok(())
}

#[test]
fn copy_of_a_missing_source_fails() {
    let fs = MockFileSystem::new();
    let mapping = AssetMapping::new("/proj/lib/gone.js", "/proj/dist/gone.js");

    assert!(copy_if_changed(&fs, &mapping).is_err());
}

#[tokio::test]
async fn copy_transform_writes_through_the_real_filesystem() -> TestResult {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("lib/a.css");
    std::fs::create_dir_all(source.parent().unwrap())?;
    std::fs::write(&source, "body {}")?;
    let mapping = AssetMapping::new(&source, dir.path().join("dist/a.css"));

    let transform = CopyTransform::new(Arc::new(RealFileSystem));
    let outcome = with_timeout(transform.apply(&mapping)).await?;

    assert_eq!(outcome, TransformOutcome::Written);
    assert_eq!(std::fs::read_to_string(dir.path().join("dist/a.css"))?, "body {}");
    Ok(())
}

#[test]
fn command_template_substitutes_quoted_paths() {
    let transform = CommandTransform::new("minify {src} -o {dest} # {name}", "/proj");
    let mapping = AssetMapping::new("/proj/lib/my file.js", "/proj/dist/my file.js");

    let rendered = transform.render(&mapping);

    if cfg!(windows) {
        assert!(rendered.contains("\"/proj/lib/my file.js\""));
    } else {
        assert_eq!(
            rendered,
            "minify '/proj/lib/my file.js' -o '/proj/dist/my file.js' # 'my file.js'"
        );
    }
}

#[test]
fn target_transform_kind_selects_the_implementation() {
    let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());

    let copy = Target::new("t", "/proj", vec!["lib/**".into()], "dist");
    assert!(transform_for_target(&copy, fs.clone()).is_ok());

    let command = Target::new("t", "/proj", vec!["lib/**".into()], "dist")
        .with_transform(TransformKind::Command, Some("cp {src} {dest}".into()));
    assert!(transform_for_target(&command, fs.clone()).is_ok());

    let missing_cmd = Target::new("t", "/proj", vec!["lib/**".into()], "dist")
        .with_transform(TransformKind::Command, None);
    assert!(transform_for_target(&missing_cmd, fs).is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn command_transform_runs_per_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("lib/a.txt");
    std::fs::create_dir_all(source.parent().unwrap())?;
    std::fs::write(&source, "hello")?;
    let mapping = AssetMapping::new(&source, dir.path().join("out/nested/a.txt"));

    let transform = CommandTransform::new("cp {src} {dest}", dir.path());
    let outcome = with_timeout(transform.apply(&mapping)).await?;

    assert_eq!(outcome, TransformOutcome::Written);
    assert_eq!(std::fs::read_to_string(dir.path().join("out/nested/a.txt"))?, "hello");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn failing_command_reports_exit_code_and_stderr() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mapping = AssetMapping::new(dir.path().join("a.txt"), dir.path().join("out/a.txt"));

    let transform = CommandTransform::new("echo broken input >&2; exit 3", dir.path());
    let err = with_timeout(transform.apply(&mapping)).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("code 3"), "{message}");
    assert!(message.contains("broken input"), "{message}");
    Ok(())
}
