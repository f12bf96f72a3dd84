use assert_cmd::cargo::cargo_bin_cmd;
use regex::Regex;
use std::{
    collections::BTreeMap,
    fs::{create_dir_all, read_dir, read_to_string, write},
    path::Path,
};
use tempfile::TempDir;

const BUILD_DIR: &str = "build/web";

fn copy_fixture() -> TempDir {
    let tempdir = tempfile::tempdir().unwrap();
    let build_dir = tempdir.path().join(BUILD_DIR);
    create_dir_all(&build_dir).unwrap();
    for result in read_dir(Path::new("fixtures/flutter-web").join(BUILD_DIR)).unwrap() {
        let entry = result.unwrap();
        std::fs::copy(entry.path(), build_dir.join(entry.file_name())).unwrap();
    }
    tempdir
}

fn snapshot(dir: &Path) -> BTreeMap<String, String> {
    read_dir(dir)
        .unwrap()
        .map(|result| {
            let entry = result.unwrap();
            (
                entry.file_name().into_string().unwrap(),
                read_to_string(entry.path()).unwrap(),
            )
        })
        .collect()
}

#[test]
fn rehash_fixture() {
    let tempdir = copy_fixture();
    let build_dir = tempdir.path().join(BUILD_DIR);
    let before = snapshot(&build_dir);

    let mut command = cargo_bin_cmd!(env!("CARGO_PKG_NAME"));
    command.current_dir(&tempdir);
    let assert = command.assert().success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let re = Regex::new(r"^Renamed main\.dart\.js to (main\.[0-9a-f]{8}\.dart\.js)$").unwrap();
    let hashed = stdout
        .lines()
        .find_map(|line| re.captures(line))
        .map(|captures| captures[1].to_owned())
        .unwrap_or_else(|| panic!("no rename reported:\n{stdout}"));
    let hashed_map = format!("{hashed}.map");

    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        [
            format!("Renamed main.dart.js to {hashed}"),
            String::from("Updated flutter_bootstrap.js"),
            String::from("Updated flutter_service_worker.js"),
            format!("Renamed main.dart.js.map to {hashed_map}"),
            format!("Updated {hashed}"),
            String::from("Content hashing completed successfully."),
        ]
    );

    let after = snapshot(&build_dir);
    assert_eq!(
        after.keys().collect::<Vec<_>>(),
        [
            "flutter_bootstrap.js",
            "flutter_service_worker.js",
            "index.html",
            hashed.as_str(),
            hashed_map.as_str(),
        ]
    );

    // Not referencing the bundle, so byte-identical.
    assert_eq!(after["index.html"], before["index.html"]);

    // Not present before, so not created.
    assert!(!build_dir.join("manifest.json").exists());

    for name in ["flutter_bootstrap.js", "flutter_service_worker.js"] {
        let expected = before[name].replace("main.dart.js", &hashed);
        assert_eq!(after[name], expected, "{name}");
        assert!(
            !after[name].replace(&hashed, "").contains("main.dart.js"),
            "{name}"
        );
    }

    assert!(after[&hashed].ends_with(&format!("//# sourceMappingURL={hashed_map}\n")));
    assert_eq!(after[&hashed_map], before["main.dart.js.map"]);
}

#[test]
fn missing_bundle() {
    let tempdir = tempfile::tempdir().unwrap();
    let build_dir = tempdir.path().join(BUILD_DIR);
    create_dir_all(&build_dir).unwrap();
    write(build_dir.join("index.html"), "main.dart.js").unwrap();

    let mut command = cargo_bin_cmd!(env!("CARGO_PKG_NAME"));
    command.current_dir(&tempdir);
    let assert = command.assert().failure().code(1);

    let output = assert.get_output();
    let stderr = String::from_utf8(output.stderr.clone()).unwrap();
    assert!(
        stderr.contains("main.dart.js not found in build/web"),
        "{stderr}"
    );
    assert!(stderr.contains("flutter build web"), "{stderr}");
    assert!(output.stdout.is_empty());

    assert_eq!(
        snapshot(&build_dir),
        BTreeMap::from([(String::from("index.html"), String::from("main.dart.js"))])
    );
}

#[test]
fn second_run_fails() {
    let tempdir = copy_fixture();

    let mut command = cargo_bin_cmd!(env!("CARGO_PKG_NAME"));
    command.current_dir(&tempdir);
    command.assert().success();

    let before = snapshot(&tempdir.path().join(BUILD_DIR));

    let mut command = cargo_bin_cmd!(env!("CARGO_PKG_NAME"));
    command.current_dir(&tempdir);
    let assert = command.assert().failure().code(1);

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    let re = Regex::new(r"Found main\.[0-9a-f]{8}\.dart\.js; was the build directory").unwrap();
    assert!(re.is_match(&stderr), "{stderr}");

    assert_eq!(snapshot(&tempdir.path().join(BUILD_DIR)), before);
}

#[test]
fn dry_run() {
    let tempdir = copy_fixture();
    let build_dir = tempdir.path().join(BUILD_DIR);
    let before = snapshot(&build_dir);

    let mut command = cargo_bin_cmd!(env!("CARGO_PKG_NAME"));
    command.arg("--dry-run");
    command.current_dir(&tempdir);
    let assert = command.assert().success();

    let output = assert.get_output();
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let stderr = String::from_utf8(output.stderr.clone()).unwrap();
    assert!(stdout.contains("Would rename main.dart.js to main."), "{stdout}");
    assert!(stdout.contains("Would update flutter_bootstrap.js"), "{stdout}");
    assert!(
        stdout.ends_with("Dry run completed; no files were changed.\n"),
        "{stdout}"
    );
    assert!(stderr.contains("Skipping manifest.json: not found"), "{stderr}");
    assert!(
        stderr.contains("Leaving index.html unchanged: no reference to main.dart.js"),
        "{stderr}"
    );
    assert!(
        stderr.contains("3 updated, 1 unchanged, 1 not found"),
        "{stderr}"
    );

    assert_eq!(snapshot(&build_dir), before);
}
