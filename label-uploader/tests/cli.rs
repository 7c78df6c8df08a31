use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

fn write_tree(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, file.as_bytes()).unwrap();
    }
}

fn upload_cmd(input: &Path, bucket: &Path) -> Command {
    let mut cmd = Command::cargo_bin("label-uploader").expect("Binary exists");
    cmd.arg("upload")
        .arg("--input")
        .arg(input)
        .arg("--provider")
        .arg("local")
        .arg("--bucket")
        .arg(bucket)
        .arg("--prefix")
        .arg("/out")
        .arg("--type")
        .arg("jpg,png");
    cmd
}

#[test]
fn upload_to_local_bucket_then_skip_on_second_run() {
    let input = tempdir().unwrap();
    let bucket = tempdir().unwrap();
    write_tree(input.path(), &["a.jpg", "sub/b.png", "sub/c.txt"]);

    upload_cmd(input.path(), bucket.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("uploaded: 2"));

    assert!(bucket.path().join("out/a.jpg").is_file());
    assert!(bucket.path().join("out/sub/b.png").is_file());
    assert!(!bucket.path().join("out/sub/c.txt").exists());

    upload_cmd(input.path(), bucket.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("uploaded: 0").and(predicate::str::contains("skipped: 2")));
}

#[test]
fn json_report_lists_every_file() {
    let input = tempdir().unwrap();
    let bucket = tempdir().unwrap();
    write_tree(input.path(), &["a.jpg", "x/y/b.jpg"]);

    let output = upload_cmd(input.path(), bucket.path())
        .arg("--json")
        .output()
        .expect("command runs");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is the JSON report");
    let mut destinations: Vec<String> = report["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["destination"].as_str().unwrap().to_string())
        .collect();
    destinations.sort();
    assert_eq!(destinations, vec!["out/a.jpg", "out/x/y/b.jpg"]);
}

#[test]
fn missing_local_bucket_fails_the_run() {
    let input = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    write_tree(input.path(), &["a.jpg"]);

    upload_cmd(input.path(), &scratch.path().join("no-such-bucket"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not reachable"));
}

#[test]
fn unknown_provider_is_rejected() {
    let input = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("label-uploader").expect("Binary exists");
    cmd.arg("upload")
        .arg("-i")
        .arg(input.path())
        .arg("-c")
        .arg("azure")
        .arg("-b")
        .arg("bucket");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown provider 'azure'"));
}

#[test]
fn zero_parallelism_is_rejected() {
    let input = tempdir().unwrap();
    let bucket = tempdir().unwrap();

    upload_cmd(input.path(), bucket.path())
        .arg("-m")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parallel must be a positive integer"));
}

#[test]
fn label_file_is_uploaded_with_include_all() {
    let input = tempdir().unwrap();
    let bucket = tempdir().unwrap();
    write_tree(input.path(), &["labels/train.csv", "a.jpg", "notes"]);

    upload_cmd(input.path(), bucket.path())
        .arg("--all")
        .arg("--label")
        .arg(input.path().join("labels/train.csv"))
        .assert()
        .success();

    assert!(bucket.path().join("out/labels/train.csv").is_file());
    assert!(bucket.path().join("out/notes").is_file());
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use label_uploader::cli::{run, Cli, Commands, UploadArgs};

    let cli = Cli {
        command: Commands::Upload(UploadArgs {
            config: Some(std::path::PathBuf::from("dummy.yaml")),
            ..UploadArgs::default()
        }),
    };

    let result = run(cli).await;
    assert!(result.is_err(), "a missing config file must fail the run");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
