/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use gpt_po::file_utils::FileManager;

use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "fr.po", "")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.po"));
}

/// Test that dir_exists distinguishes files from directories
#[test]
fn test_dir_exists_withFileAndDir_shouldOnlyAcceptDir() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "fr.po", "")?;

    assert!(FileManager::dir_exists(temp_dir.path()));
    assert!(!FileManager::dir_exists(&test_file));
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));

    Ok(())
}

/// Test that ensure_dir creates nested directories
#[test]
fn test_ensure_dir_withNestedPath_shouldCreateDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    FileManager::ensure_dir(&nested)?;

    assert!(nested.is_dir());

    Ok(())
}

/// Test that write_to_file creates missing parents
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("locale").join("de.po");

    FileManager::write_to_file(&path, "msgid \"\"\nmsgstr \"\"\n")?;

    assert_eq!(FileManager::read_to_string(&path)?, "msgid \"\"\nmsgstr \"\"\n");

    Ok(())
}

/// Test that read_to_string fails on missing files
#[test]
fn test_read_to_string_withMissingFile_shouldFail() {
    assert!(FileManager::read_to_string("does_not_exist.po").is_err());
}

/// Test that only top-level catalogs are listed, in name order
#[test]
fn test_find_po_files_withNestedFolders_shouldListTopLevelOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "de.po", "")?;
    common::create_test_file(temp_dir.path(), "fr.po", "")?;
    common::create_test_file(temp_dir.path(), "messages.pot", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    fs::create_dir(temp_dir.path().join("old"))?;
    common::create_test_file(&temp_dir.path().join("old"), "es.po", "")?;

    let files = FileManager::find_po_files(temp_dir.path())?;

    assert_eq!(files, vec![temp_dir.path().join("de.po"), temp_dir.path().join("fr.po")]);

    Ok(())
}

/// Test that find_files accepts an extension with a leading dot
#[test]
fn test_find_files_withDottedExtension_shouldMatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "messages.pot", "")?;

    let files = FileManager::find_files(temp_dir.path(), ".pot")?;

    assert_eq!(files.len(), 1);

    Ok(())
}

/// Test that the project root is the closest ancestor with `.git`
#[test]
fn test_find_project_root_withGitFolder_shouldReturnIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    fs::create_dir(temp_dir.path().join(".git"))?;
    let nested = temp_dir.path().join("app").join("locale");
    fs::create_dir_all(&nested)?;

    assert_eq!(FileManager::find_project_root(&nested), Some(temp_dir.path().to_path_buf()));

    Ok(())
}

/// Test that write_if_missing never overwrites content
#[test]
fn test_write_if_missing_withExistingContent_shouldKeepIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("dictionary.json");

    assert!(FileManager::write_if_missing(&path, "{}")?);
    fs::write(&path, "{\"commit\": \"commit\"}")?;
    assert!(!FileManager::write_if_missing(&path, "{}")?);

    assert_eq!(fs::read_to_string(&path)?, "{\"commit\": \"commit\"}");

    Ok(())
}
