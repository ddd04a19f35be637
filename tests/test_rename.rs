//! Tests for exhibit filename normalization on disk.

use exhibit_anchor::{normalize_filename, rename_files_in_folder};
use std::fs;
use tempfile::TempDir;

fn folder_with(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        fs::write(dir.path().join(name), name.as_bytes()).unwrap();
    }
    dir
}

fn names_in(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_normalized_names() {
    assert_eq!(normalize_filename("Ex. 7 Deposition Transcript.pdf"), "Ex_7_Deposition_Transcript.pdf");
    assert_eq!(normalize_filename("EXHIBIT 4.pdf"), "EXHIBIT_4.pdf");
    assert_eq!(normalize_filename("Notes.txt"), "Notes.txt");
}

#[test]
fn test_dry_run_touches_nothing() {
    let dir = folder_with(&["Ex. A Letter.pdf", "Ex_B.pdf"]);

    let summary = rename_files_in_folder(dir.path(), true).unwrap();

    assert_eq!(
        summary.renamed,
        vec![("Ex. A Letter.pdf".to_string(), "Ex_A_Letter.pdf".to_string())]
    );
    assert_eq!(summary.unchanged, vec!["Ex_B.pdf".to_string()]);
    assert_eq!(names_in(&dir), vec!["Ex. A Letter.pdf", "Ex_B.pdf"]);
}

#[test]
fn test_rename_on_disk() {
    let dir = folder_with(&["Ex. 55 Email.docx", "Exhibit 12 Memo.pdf", "cover.pdf"]);

    let summary = rename_files_in_folder(dir.path(), false).unwrap();

    assert_eq!(summary.renamed.len(), 2);
    assert!(summary.failed.is_empty());
    assert_eq!(
        names_in(&dir),
        vec!["Ex_55_Email.docx", "Exhibit_12_Memo.pdf", "cover.pdf"]
    );
    let content = fs::read_to_string(dir.path().join("Ex_55_Email.docx")).unwrap();
    assert_eq!(content, "Ex. 55 Email.docx");
}

#[test]
fn test_conflict_is_reported_not_overwritten() {
    let dir = folder_with(&["Ex. 3.pdf", "Ex_3.pdf"]);

    let summary = rename_files_in_folder(dir.path(), false).unwrap();

    assert!(summary.renamed.is_empty());
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].from, "Ex. 3.pdf");
    assert_eq!(summary.failed[0].to, "Ex_3.pdf");
    assert!(summary.failed[0].reason.contains("already exists"));
    assert_eq!(
        fs::read_to_string(dir.path().join("Ex_3.pdf")).unwrap(),
        "Ex_3.pdf"
    );
}

#[test]
fn test_two_names_claiming_one_target() {
    let dir = folder_with(&["Ex 9.pdf", "Ex. 9.pdf"]);

    let summary = rename_files_in_folder(dir.path(), true).unwrap();

    assert_eq!(summary.renamed.len(), 1);
    assert_eq!(summary.failed.len(), 1);
}

#[test]
fn test_subdirectories_skipped() {
    let dir = folder_with(&["Ex. 1.pdf"]);
    fs::create_dir(dir.path().join("Ex. 2 folder")).unwrap();

    let summary = rename_files_in_folder(dir.path(), true).unwrap();

    assert_eq!(summary.renamed.len(), 1);
    assert_eq!(summary.renamed[0].0, "Ex. 1.pdf");
}

#[test]
fn test_missing_folder_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(rename_files_in_folder(&dir.path().join("missing"), true).is_err());
}
