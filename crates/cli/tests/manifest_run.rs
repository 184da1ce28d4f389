//! End-to-end runs of manifests against a temporary directory.

use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

use engine::{BlockLevel, EngineError, Record};
use propagator_cli::{report, Manifest};

const ABC: &str = r#"{
    "resources": [
        { "id": "A", "path": "a.txt" },
        { "id": "B", "path": "b.txt" },
        { "id": "C", "path": "c.txt", "update": { "action": "copy", "from": "A" } }
    ],
    "dependencies": [
        { "requirement": "A", "target": "C" },
        { "requirement": "B", "target": "C" }
    ]
}"#;

fn write_at(path: &Path, content: &str, secs: u64) {
    fs::write(path, content).expect("write");
    File::options()
        .write(true)
        .open(path)
        .expect("open")
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .expect("set mtime");
}

fn names(history: &engine::History) -> Vec<String> {
    history.records().map(Record::name).collect()
}

#[test]
fn abc_manifest_copies_a_into_stale_c() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_at(&tmp.path().join("a.txt"), "from A", 3_000);
    write_at(&tmp.path().join("b.txt"), "from B", 1_000);
    write_at(&tmp.path().join("c.txt"), "stale", 2_000);

    let manifest_path = tmp.path().join("manifest.json");
    fs::write(&manifest_path, ABC).unwrap();

    let mut propagator = Manifest::load(&manifest_path)
        .unwrap()
        .into_propagator(tmp.path())
        .unwrap();
    propagator.run(BlockLevel::Never).expect("clean run");

    assert_eq!(names(propagator.history()), vec!["LaunchedUpdate", "PerformedUpdate"]);
    assert_eq!(fs::read_to_string(tmp.path().join("c.txt")).unwrap(), "from A");
    assert_eq!(
        report::render_text(propagator.history()),
        "\t1) LaunchedUpdate: update of 'C' launched\n\
         \t2) PerformedUpdate: update of 'C' performed -> Written A in C\n"
    );
}

#[test]
fn abc_manifest_without_c_reports_a_build_that_did_nothing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_at(&tmp.path().join("a.txt"), "a", 1_000);
    write_at(&tmp.path().join("b.txt"), "b", 1_000);

    let mut propagator = Manifest::parse(ABC)
        .unwrap()
        .into_propagator(tmp.path())
        .unwrap();
    let err = propagator.run(BlockLevel::Never).unwrap_err();

    assert_eq!(err, EngineError::Propagation { count: 1 });
    assert_eq!(names(propagator.history()), vec!["LaunchedBuild", "NotPerformedBuild"]);
}

#[test]
fn touch_builder_creates_a_chain_of_files() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_at(&tmp.path().join("src.txt"), "src", 1_000);

    let manifest = Manifest::parse(
        r#"{
            "resources": [
                { "id": "src", "path": "src.txt" },
                { "id": "obj", "path": "build/obj.txt", "build": { "action": "touch" } },
                { "id": "bin", "path": "build/bin.txt", "build": { "action": "copy", "from": "obj" } }
            ],
            "dependencies": [
                { "requirement": "src", "target": "obj" },
                { "requirement": "obj", "target": "bin" }
            ]
        }"#,
    )
    .unwrap();
    let mut propagator = manifest.into_propagator(tmp.path()).unwrap();
    propagator.run(BlockLevel::OnAnyError).expect("clean run");

    assert_eq!(
        names(propagator.history()),
        vec!["LaunchedBuild", "PerformedBuild", "LaunchedBuild", "PerformedBuild"]
    );
    assert!(tmp.path().join("build/bin.txt").exists());
}

#[test]
fn failing_action_is_chained_into_the_history() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_at(&tmp.path().join("in.txt"), "in", 1_000);

    let manifest = Manifest::parse(
        r#"{
            "resources": [
                { "id": "in", "path": "in.txt" },
                { "id": "out", "path": "out.txt", "build": { "action": "fail", "message": "no compiler" } }
            ],
            "dependencies": [ { "requirement": "in", "target": "out" } ]
        }"#,
    )
    .unwrap();
    let mut propagator = manifest.into_propagator(tmp.path()).unwrap();
    assert!(propagator.run(BlockLevel::OnFailure).is_err());

    let errors = propagator.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "build of 'out' failed, build callback returned an error -> no compiler"
    );
}
