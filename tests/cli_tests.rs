use assert_cmd::Command;
use enron_prep::{Dataset, Label};
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::{Builder, Header};
use tempfile::TempDir;

const START_MESSAGE: &str = "Downloading Enron emails in the Downloads folder...";
const DONE_MESSAGE: &str = "Download, unzip, and save to pickle done!";

fn enron_prep(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("enron-prep").unwrap();
    cmd.current_dir(home).env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn archive_dir(home: &Path) -> PathBuf {
    home.join("Downloads").join("Enron emails")
}

fn write_archive(path: &Path, files: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

    for (name, data) in files {
        let mut header = Header::new_gnu();
        header.set_mode(0o644);
        header.set_size(data.len() as u64);
        builder.append_data(&mut header, name, *data).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
}

fn write_corpus(home: &Path) {
    let dir = archive_dir(home);
    fs::create_dir_all(&dir).unwrap();

    for i in 1..=6 {
        let ham = format!("enron{}/ham/0001.txt", i);
        let spam = format!("enron{}/spam/0002.txt", i);
        write_archive(
            &dir.join(format!("enron{}.tar.gz", i)),
            &[(&ham, b"meeting at noon"), (&spam, b"cheap pills")],
        );
    }
}

#[test]
fn test_completed_run_touches_nothing() {
    let home = TempDir::new().unwrap();
    let dir = archive_dir(home.path());
    fs::create_dir_all(&dir).unwrap();
    for i in 1..=6 {
        File::create(dir.join(format!("enron{}.tar.gz", i))).unwrap();
    }
    let dataset_path = home.path().join("Downloads").join("emails.pickle");
    fs::write(&dataset_path, b"previous run").unwrap();

    enron_prep(home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(START_MESSAGE))
        .stdout(predicate::str::contains(DONE_MESSAGE));

    assert_eq!(fs::read(&dataset_path).unwrap(), b"previous run");
    assert_eq!(fs::metadata(dir.join("enron1.tar.gz")).unwrap().len(), 0);
}

#[test]
fn test_builds_dataset_from_local_archives() {
    let home = TempDir::new().unwrap();
    write_corpus(home.path());

    enron_prep(home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(DONE_MESSAGE));

    let dataset =
        Dataset::load_from_file(home.path().join("Downloads").join("emails.pickle")).unwrap();
    assert_eq!(dataset.len(), 12);
    assert_eq!(dataset.count(Label::Ham), 6);
    assert_eq!(dataset.count(Label::Spam), 6);
    assert_eq!(dataset.records()[0].message, b"meeting at noon");
    assert_eq!(dataset.records()[0].class, Label::Ham);
}

#[test]
fn test_json_report() {
    let home = TempDir::new().unwrap();
    write_corpus(home.path());

    enron_prep(home.path())
        .args(["--output-format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"report\""))
        .stdout(predicate::str::contains("\"total_records\": 12"));
}

#[test]
fn test_ambiguous_entry_fails_without_output() {
    let home = TempDir::new().unwrap();
    write_corpus(home.path());
    write_archive(
        &archive_dir(home.path()).join("enron3.tar.gz"),
        &[("enron3/ham/spam/0001.txt", b"which one")],
    );

    enron_prep(home.path())
        .assert()
        .code(6)
        .stderr(predicate::str::contains("--on-ambiguous"));

    assert!(!home.path().join("Downloads").join("emails.pickle").exists());
}

#[test]
fn test_ambiguous_entry_with_both_policy() {
    let home = TempDir::new().unwrap();
    write_corpus(home.path());
    write_archive(
        &archive_dir(home.path()).join("enron3.tar.gz"),
        &[("enron3/ham/spam/0001.txt", b"which one")],
    );

    enron_prep(home.path())
        .args(["--on-ambiguous", "both"])
        .assert()
        .success();

    let dataset =
        Dataset::load_from_file(home.path().join("Downloads").join("emails.pickle")).unwrap();
    assert_eq!(dataset.len(), 12);
}

#[test]
fn test_dry_run_downloads_nothing() {
    let home = TempDir::new().unwrap();

    enron_prep(home.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Would download: enron1.tar.gz"))
        .stdout(predicate::str::contains("Would download: enron6.tar.gz"));

    assert!(!home.path().join("Downloads").exists());
}

#[test]
fn test_generate_config() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("custom.toml");

    enron_prep(home.path())
        .args(["--generate-config", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated sample configuration file"));

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("base_url"));
    assert!(content.contains("enron1.tar.gz"));
}

#[test]
fn test_downloads_dir_override_uses_config_file_in_working_directory() {
    let home = TempDir::new().unwrap();
    let corpora = TempDir::new().unwrap();
    write_corpus(corpora.path());
    fs::write(
        home.path().join("enron-prep.toml"),
        format!(
            "[paths]\ndownloads_dir = {:?}\n",
            corpora.path().join("Downloads").display().to_string()
        ),
    )
    .unwrap();

    enron_prep(home.path()).assert().success();

    assert!(corpora.path().join("Downloads").join("emails.pickle").exists());
    assert!(!home.path().join("Downloads").exists());
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let home = TempDir::new().unwrap();

    enron_prep(home.path())
        .args(["--base-url", "ftp://example.com/enron/"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_missing_home_is_reported() {
    let home = TempDir::new().unwrap();

    enron_prep(home.path())
        .env_remove("HOME")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("HOME"));
}
