use std::fs;

use monitor_engine::{ensure_artifact_dir, ArtifactWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_artifact_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("downloads");
    assert!(!new_dir.exists());
    ensure_artifact_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(temp.path().join("downloads"));

    let first = writer.write("success.csv", b"a").unwrap();
    assert_eq!(first.file_name().unwrap(), "success.csv");
    let second = writer.write("success.csv", b"b,c").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"b,c");
}

#[test]
fn rejects_names_escaping_the_directory() {
    let temp = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(temp.path().to_path_buf());

    for name in ["../evil.csv", "sub/file.csv", "..\\x", "", "."] {
        let err = writer.write(name, b"x").unwrap_err();
        assert!(matches!(err, PersistError::InvalidName(_)), "{name:?}");
    }
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn file_in_place_of_dir_is_an_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = ArtifactWriter::new(file_path.clone());
    let result = writer.write("doc.csv", b"data");
    assert!(matches!(result, Err(PersistError::ArtifactDir(_))));
}
