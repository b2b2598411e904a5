use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn smartdoc(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("smartdoc").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("HOME", home)
        .current_dir(home);
    cmd
}

fn write_documents(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("inv_a.txt"), "Invoice No: INV-1040\nAmount Paid: $1528.61\n").unwrap();
    fs::write(dir.join("inv_b.txt"), "Invoice No: INV-2077\nDate: 31 May 2025\n").unwrap();
    fs::write(dir.join("blank.txt"), "nothing to see\n").unwrap();
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    smartdoc(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("prepare"))
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("predict"));
}

#[test]
fn test_config_init_get_set() {
    let home = TempDir::new().unwrap();

    smartdoc(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));

    smartdoc(home.path()).args(["config", "init"]).assert().success();
    assert!(home.path().join("config/smartdoc/config.json").exists());

    smartdoc(home.path())
        .args(["config", "set", "training.epochs", "7"])
        .assert()
        .success();
    smartdoc(home.path())
        .args(["config", "get", "training.epochs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7"));

    smartdoc(home.path())
        .args(["config", "set", "training.dropout", "1.5"])
        .assert()
        .failure();
    smartdoc(home.path())
        .args(["config", "get", "training.nope"])
        .assert()
        .failure();
}

#[test]
fn test_extract_writes_records_and_summary() {
    let home = TempDir::new().unwrap();
    let docs = home.path().join("texts");
    write_documents(&docs);

    smartdoc(home.path())
        .args(["extract", docs.join("*.txt").to_str().unwrap()])
        .args(["-o", "records.json", "--summary", "summary.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 records"));

    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(home.path().join("records.json")).unwrap()).unwrap();
    let a = records
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["Filename"] == "inv_a.txt")
        .unwrap();
    assert_eq!(a["Invoice Number"], "INV-1040");
    assert!(a["Text"].as_str().unwrap().contains("Amount Paid"));

    let summary = fs::read_to_string(home.path().join("summary.csv")).unwrap();
    assert!(summary.lines().next().unwrap().ends_with("Filename"));
    assert_eq!(summary.lines().count(), 4);
}

#[test]
fn test_prepare_train_predict_pipeline() {
    let home = TempDir::new().unwrap();
    let docs = home.path().join("texts");
    write_documents(&docs);

    smartdoc(home.path())
        .args(["extract", docs.join("*.txt").to_str().unwrap(), "-o", "records.json", "--no-text"])
        .assert()
        .success();

    smartdoc(home.path())
        .args(["prepare", "--records", "records.json", "-o", "corpus.json", "-j", "2"])
        .arg("--text-dir")
        .arg(&docs)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_seen\": 3"))
        .stdout(predicate::str::contains("\"examples\": 2"));

    let corpus = fs::read_to_string(home.path().join("corpus.json")).unwrap();
    assert!(corpus.contains("INVOICE_NUMBER"));

    smartdoc(home.path())
        .args(["train", "--corpus", "corpus.json", "-m", "model", "--json"])
        .args(["--epochs", "30", "--dropout", "0", "--learn-rate", "0.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"epochs\": 30"));

    smartdoc(home.path())
        .args(["labels", "-m", "model"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INVOICE_NUMBER"));

    smartdoc(home.path())
        .args(["predict", "Invoice No: INV-1040\nAmount Paid: $1528.61\n", "-m", "model"])
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"labels\""))
        .stdout(predicate::str::contains("INV-1040"));
}

#[test]
fn test_prepare_from_documents_matches_any_job_count() {
    let home = TempDir::new().unwrap();
    let docs = home.path().join("texts");
    write_documents(&docs);
    let pattern = docs.join("*.txt");

    for (jobs, out) in [("1", "one.json"), ("4", "four.json")] {
        smartdoc(home.path())
            .args(["prepare", "--input", pattern.to_str().unwrap(), "-o", out, "-j", jobs])
            .assert()
            .success();
    }

    assert_eq!(
        fs::read_to_string(home.path().join("one.json")).unwrap(),
        fs::read_to_string(home.path().join("four.json")).unwrap()
    );
}

#[test]
fn test_train_reports_interrupt_keys() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("corpus.json"),
        r#"[["Invoice No: INV-1040", {"entities": [[12, 20, "INVOICE_NUMBER"]]}]]"#,
    )
    .unwrap();

    smartdoc(home.path())
        .args(["train", "--corpus", "corpus.json", "-m", "model", "--epochs", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("twice aborts"))
        .stdout(predicate::str::contains("Model saved to"));
    assert!(home.path().join("model/meta.json").exists());
}

#[test]
fn test_prepare_requires_one_source() {
    let home = TempDir::new().unwrap();
    smartdoc(home.path())
        .arg("prepare")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--records or --input"));
}

#[test]
fn test_predict_without_model_fails() {
    let home = TempDir::new().unwrap();
    smartdoc(home.path())
        .args(["predict", "some text", "-m", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
