use std::fs;

use seed_scanner_export::{ExportError, ExportSink, FileSink};

#[test]
fn rows_are_written_into_the_export_folder() {
    let root = tempfile::tempdir().expect("tempdir");
    let sink = FileSink::new(root.path(), "SeedScan");

    let rows = vec!["Seed,abc".to_owned(), String::new(), "1,Salad,1,100%".to_owned()];
    let path = sink
        .write_rows("abc_Country_Salad_15.csv", &rows)
        .expect("export succeeds");

    assert_eq!(path, root.path().join("SeedScan").join("abc_Country_Salad_15.csv"));
    let contents = fs::read_to_string(&path).expect("readable");
    assert_eq!(contents, "Seed,abc\n\n1,Salad,1,100%\n");
}

#[test]
fn successful_write_leaves_no_temporary_file() {
    let root = tempfile::tempdir().expect("tempdir");
    let sink = FileSink::new(root.path(), "SeedScan");
    let _ = sink
        .write_rows("report.csv", &["a".to_owned()])
        .expect("export succeeds");

    let names: Vec<String> = fs::read_dir(sink.directory())
        .expect("folder exists")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["report.csv".to_owned()]);
}

#[test]
fn rewriting_replaces_previous_contents() {
    let root = tempfile::tempdir().expect("tempdir");
    let sink = FileSink::new(root.path(), "SeedScan");
    let _ = sink.write_rows("r.csv", &["old".to_owned()]).expect("first");
    let path = sink.write_rows("r.csv", &["new".to_owned()]).expect("second");
    assert_eq!(fs::read_to_string(path).expect("readable"), "new\n");
}

#[test]
fn unsafe_hints_are_sanitised() {
    let root = tempfile::tempdir().expect("tempdir");
    let sink = FileSink::new(root.path(), "SeedScan");
    let path = sink
        .write_image("../Fish: Deluxe?.png", &[0x89, b'P', b'N', b'G'])
        .expect("image written");

    assert_eq!(path.file_name().and_then(|name| name.to_str()), Some(".._Fish_ Deluxe_.png"));
    assert_eq!(path.parent(), Some(sink.directory().as_path()));
    assert_eq!(fs::read(&path).expect("readable"), vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn nested_sinks_write_below_the_parent_folder() {
    let root = tempfile::tempdir().expect("tempdir");
    let sink = FileSink::new(root.path(), "SeedScan").nested("abc_Country_Salad");
    let path = sink.write_image("Pies.png", b"img").expect("image written");
    assert_eq!(
        path,
        root.path()
            .join("SeedScan")
            .join("abc_Country_Salad")
            .join("Pies.png")
    );
}

#[test]
fn empty_names_are_rejected() {
    let root = tempfile::tempdir().expect("tempdir");
    let sink = FileSink::new(root.path(), "SeedScan");
    let error = sink.write_rows("", &[]).expect_err("empty name");
    assert!(matches!(error, ExportError::EmptyName(_)));
}

#[test]
fn io_failures_report_the_path() {
    let root = tempfile::tempdir().expect("tempdir");
    let blocker = root.path().join("SeedScan");
    fs::write(&blocker, b"not a directory").expect("blocker written");

    let sink = FileSink::new(root.path(), "SeedScan");
    let error = sink.write_rows("r.csv", &["a".to_owned()]).expect_err("folder is a file");
    match error {
        ExportError::Io { path, .. } => assert_eq!(path, blocker),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dot_only_names_are_rejected() {
    let root = tempfile::tempdir().expect("tempdir");
    let sink = FileSink::new(root.path(), "SeedScan");
    for hint in [".", "..", " .. "] {
        let error = sink.write_rows(hint, &["a".to_owned()]).expect_err("dot-only name");
        assert!(matches!(error, ExportError::EmptyName(_)), "{hint:?}: {error}");
    }
}

#[test]
fn failed_rename_removes_the_temporary_file() {
    let root = tempfile::tempdir().expect("tempdir");
    let sink = FileSink::new(root.path(), "SeedScan");
    let target = sink.directory().join("r.csv");
    fs::create_dir_all(&target).expect("target directory");
    fs::write(target.join("keep.txt"), b"occupied").expect("occupant written");

    let error = sink
        .write_rows("r.csv", &["a".to_owned()])
        .expect_err("target is a non-empty directory");
    match error {
        ExportError::Io { path, .. } => assert_eq!(path, target),
        other => panic!("unexpected error: {other}"),
    }

    let names: Vec<String> = fs::read_dir(sink.directory())
        .expect("folder exists")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["r.csv".to_owned()]);
    assert!(target.join("keep.txt").exists());
}
