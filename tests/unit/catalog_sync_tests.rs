/*!
 * Tests for updating catalogs from templates
 */

use anyhow::Result;
use gpt_po::catalog::{Catalog, CompileOptions, Entry, SyncSummary, read_catalog, sync, sync_catalogs};

use crate::common;

const TEMPLATE_POT: &str = r#"msgid ""
msgstr ""
"Project-Id-Version: demo 1.1\n"
"Language: \n"
"Content-Type: text/plain; charset=UTF-8\n"

#: src/app.rs:14
msgid "Hello"
msgstr ""

#: src/app.rs:22
msgid "Save"
msgstr ""

#: src/help.rs:1
msgid "Help"
msgstr ""

#: src/menu.rs:4
msgctxt "menu"
msgid "File"
msgstr ""
"#;

/// Test the basic merge: translated prior entries win, stale ones disappear
#[test]
fn test_sync_catalogs_withTranslatedPriorEntry_shouldKeepTranslation() {
    let mut prior = Catalog::new();
    prior.insert(Entry::new("Hello").with_msgstr("Bonjour"));
    prior.insert(Entry::new("Only in prior").with_msgstr("Seulement avant"));

    let mut template = Catalog::new();
    template.insert(Entry::new("Hello"));

    let (merged, summary) = sync_catalogs(prior, &template);

    assert_eq!(merged.get("", "Hello").map(Entry::translation), Some("Bonjour"));
    assert!(merged.get("", "Only in prior").is_none());
    assert_eq!(
        summary,
        SyncSummary {
            adopted: 1,
            untranslated: 0,
            dropped: 1,
        }
    );
}

/// Test that an untranslated prior entry does not override the template
#[test]
fn test_sync_catalogs_withUntranslatedPriorEntry_shouldTakeTemplateEntry() {
    let mut prior = Catalog::new();
    prior.insert(Entry::new("Save").with_reference("old.rs:1"));

    let mut template = Catalog::new();
    template.insert(Entry::new("Save").with_reference("new.rs:9"));

    let (merged, summary) = sync_catalogs(prior, &template);

    assert_eq!(
        merged.get("", "Save").map(|entry| entry.comments.reference.as_str()),
        Some("new.rs:9")
    );
    assert_eq!(summary.untranslated, 1);
}

/// Test the file-level merge with an explicit output path
#[test]
fn test_sync_withOutputPath_shouldWriteMergedCatalog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let po = common::create_sample_po(temp_dir.path(), "fr.po")?;
    let pot = common::create_test_file(temp_dir.path(), "messages.pot", TEMPLATE_POT)?;
    let output = temp_dir.path().join("merged.po");

    let summary = sync(&po, &pot, Some(output.as_path()), &CompileOptions::default())?;
    assert_eq!(
        summary,
        SyncSummary {
            adopted: 1,
            untranslated: 3,
            dropped: 3,
        }
    );

    // The input stays untouched
    assert_eq!(std::fs::read_to_string(&po)?, common::SAMPLE_PO);

    let merged = read_catalog(&output)?;
    assert_eq!(merged.language(), Some("fr"));
    assert_eq!(merged.header("Project-Id-Version"), Some("demo 1.0"));

    let hello = merged.get("", "Hello").expect("Hello entry");
    assert_eq!(hello.translation(), "Bonjour");
    assert_eq!(hello.comments.reference, "src/app.rs:12");

    assert!(merged.get("", "Help").is_some());
    assert!(merged.get("menu", "File").is_some());
    assert!(merged.get("", "Open").is_none());
    assert!(merged.get("", "Old").is_none());

    let msgids: Vec<&str> = merged.entries().map(|entry| entry.msgid.as_str()).collect();
    assert_eq!(msgids, vec!["Hello", "Save", "Help", "File"]);

    Ok(())
}

/// Test that a `#~` entry whose msgid returns to the template comes back untranslated
#[test]
fn test_sync_withObsoletePriorEntryBackInTemplate_shouldTakeTemplateEntry() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let po = common::create_test_file(
        temp_dir.path(),
        "fr.po",
        r#"msgid ""
msgstr ""
"Language: fr\n"
"Content-Type: text/plain; charset=UTF-8\n"

msgid "Hello"
msgstr "Bonjour"

#~ msgid "Help"
#~ msgstr "Aide"
"#,
    )?;
    let pot = common::create_test_file(temp_dir.path(), "messages.pot", TEMPLATE_POT)?;

    let summary = sync(&po, &pot, None, &CompileOptions::default())?;
    assert_eq!(summary.adopted, 1);
    assert_eq!(summary.untranslated, 3);

    let merged = read_catalog(&po)?;
    let help = merged.get("", "Help").expect("Help entry");
    assert!(!help.obsolete);
    assert_eq!(help.translation(), "");
    assert_eq!(help.comments.reference, "src/help.rs:1");
    assert!(!std::fs::read_to_string(&po)?.contains("#~"));

    Ok(())
}

/// Test that the catalog is overwritten when no output is given
#[test]
fn test_sync_withoutOutputPath_shouldOverwriteCatalog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let po = common::create_sample_po(temp_dir.path(), "fr.po")?;
    let pot = common::create_test_file(temp_dir.path(), "messages.pot", TEMPLATE_POT)?;

    sync(&po, &pot, None, &CompileOptions::default())?;

    let merged = read_catalog(&po)?;
    assert!(merged.get("", "Help").is_some());
    assert!(merged.get("", "Quit").is_none());

    Ok(())
}

/// Test that a missing template is an error and leaves the catalog alone
#[test]
fn test_sync_withMissingTemplate_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let po = common::create_sample_po(temp_dir.path(), "fr.po")?;

    let result = sync(&po, temp_dir.path().join("missing.pot"), None, &CompileOptions::default());

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&po)?, common::SAMPLE_PO);

    Ok(())
}
