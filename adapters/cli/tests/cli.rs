use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn catalog_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/catalog.toml")
}

fn scanner(workdir: &Path, args: &[&str]) -> Output {
    let config = workdir.join("scanner.toml");
    if !config.exists() {
        let export_dir = workdir.join("out");
        fs::write(
            &config,
            format!("export_dir = {:?}\n", export_dir.to_string_lossy()),
        )
        .expect("config written");
    }

    Command::new(env!("CARGO_BIN_EXE_seed-scanner"))
        .current_dir(workdir)
        .env("RUST_LOG", "error")
        .arg("--catalog")
        .arg(catalog_path())
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("failed to run seed-scanner")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "seed-scanner failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("utf8 output")
}

const RUN: [&str; 6] = ["--seed", "abc", "--setting", "Country", "--dish", "Salad"];

#[test]
fn listings_come_from_the_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");

    let settings = stdout(&scanner(dir.path(), &["settings"]));
    assert!(settings.contains("1\tCountry\tDefault\n"), "{settings}");
    assert!(settings.contains("3\tAlpine\tAlpine\n"), "{settings}");

    let dishes = stdout(&scanner(dir.path(), &["dishes"]));
    assert!(dishes.contains("1\tSalad\n"));
    assert!(!dishes.contains("Fish"));
}

#[test]
fn export_writes_the_csv_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut args = vec!["export"];
    args.extend(RUN);
    let text = stdout(&scanner(dir.path(), &args));
    assert!(text.starts_with("Exported "), "{text}");

    let path = dir
        .path()
        .join("out")
        .join("SeedScan")
        .join("abc_Country_Salad_15.csv");
    let contents = fs::read_to_string(&path).expect("export exists");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(&lines[..4], &["Seed,abc", "Setting,Country", "Starting Dish,Salad", ""]);
    assert!(lines[4].starts_with("No.,Start,"), "{}", lines[4]);
    assert!(lines[4].ends_with(",Courses,Customer Multiplier"));
    for (index, line) in lines[5..].iter().enumerate() {
        assert!(line.starts_with(&format!("{},Salad", index + 1)), "{line}");
    }
}

#[test]
fn repeated_exports_are_identical() {
    let first = tempfile::tempdir().expect("tempdir");
    let second = tempfile::tempdir().expect("tempdir");
    let mut args = vec!["export", "--day", "9"];
    args.extend(RUN);
    let _ = stdout(&scanner(first.path(), &args));
    let _ = stdout(&scanner(second.path(), &args));

    let read = |root: &Path| {
        fs::read_to_string(root.join("out/SeedScan/abc_Country_Salad_9.csv")).expect("export")
    };
    assert_eq!(read(first.path()), read(second.path()));
}

#[test]
fn cards_copy_available_art() {
    let dir = tempfile::tempdir().expect("tempdir");
    let art = dir.path().join("art");
    fs::create_dir(&art).expect("art dir");
    fs::write(art.join("1.png"), b"salad art").expect("art written");

    let art_arg = art.to_string_lossy().into_owned();
    let mut args = vec!["cards", "--art-dir", art_arg.as_str()];
    args.extend(RUN);
    let text = stdout(&scanner(dir.path(), &args));
    assert!(text.contains("Copied 1 card images"), "{text}");

    let folder = dir.path().join("out/SeedScan/abc_Country_Salad");
    let list = fs::read_to_string(folder.join("cards_15.csv")).expect("card list");
    assert!(list.starts_with("Id,Name\n"));
    assert!(list.contains("\n1,Salad\n"));
    assert_eq!(fs::read(folder.join("Salad.png")).expect("copied art"), b"salad art");
}

#[test]
fn shop_reports_theme_filtering() {
    let dir = tempfile::tempdir().expect("tempdir");

    let plain = stdout(&scanner(dir.path(), &["shop", "--day", "5"]));
    assert!(plain.contains("Chandelier (step 5, FilterByTheme)"), "{plain}");
    assert!(plain.contains("  Slot 11 (decor): -\n"), "{plain}");

    let formal = stdout(&scanner(dir.path(), &["shop", "--day", "5", "--themes", "8"]));
    assert!(formal.contains("  Slot 1 (decoration): Potted Plant, Chandelier\n"), "{formal}");
}

#[test]
fn unknown_settings_fail_with_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = scanner(
        dir.path(),
        &["tree", "--seed", "abc", "--setting", "Nowhere", "--dish", "Salad"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown setting `Nowhere`"), "{stderr}");
}
