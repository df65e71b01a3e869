/*!
 * Integration tests for catalog translation.
 *
 * A scripted provider stands in for the backend and a recording checkpoint
 * captures every save, so each run can be checked batch by batch.
 */

use anyhow::Result;
use std::cell::RefCell;
use std::time::Duration;
use gpt_po::catalog::{Catalog, CompileOptions, Entry, read_catalog};
use gpt_po::errors::TranslationError;
use gpt_po::providers::mock::{ECHO_PREFIX, MockProvider};
use gpt_po::translation::core::tool_identity;
use gpt_po::translation::{
    FileCheckpoint, Glossary, RetryPolicy, SessionOptions, TranslationReport, TranslationSession,
};

use crate::common::{self, RecordingCheckpoint};

fn fast_options() -> SessionOptions {
    SessionOptions {
        retry: RetryPolicy::fixed(Duration::from_millis(10)),
        ..Default::default()
    }
}

fn french_catalog(entries: Vec<Entry>) -> Catalog {
    let mut catalog = Catalog::new();
    catalog.set_header("Language", "fr");
    catalog.insert(Entry::new("").with_msgstr("Language: fr\n"));
    for entry in entries {
        catalog.insert(entry);
    }
    catalog
}

fn echoed(text: &str) -> String {
    format!("{}{}", ECHO_PREFIX, text)
}

async fn run(
    session: &TranslationSession<MockProvider>,
    catalog: &mut Catalog,
    target: Option<&str>,
    checkpoint: &mut RecordingCheckpoint,
) -> Result<(TranslationReport, Vec<(usize, usize)>), TranslationError> {
    let progress = RefCell::new(Vec::new());
    let report = session
        .translate_catalog(catalog, target, checkpoint, |done, total| {
            progress.borrow_mut().push((done, total))
        })
        .await?;
    Ok((report, progress.into_inner()))
}

/// Two small pending entries go out in one request and are both filled
#[tokio::test]
async fn test_translate_catalog_withTwoPendingEntries_shouldUseOneBatch() -> Result<()> {
    let provider = MockProvider::echo();
    let session = TranslationSession::new(provider.clone(), fast_options());
    let mut catalog = french_catalog(vec![
        Entry::new("Hello").with_msgstr("Bonjour"),
        Entry::new("Save"),
        Entry::new("Quit"),
    ]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, progress) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    assert_eq!(provider.request_count(), 1);
    assert_eq!(report.pending, 2);
    assert_eq!(report.batches, 1);
    assert_eq!(report.translated, 2);
    assert_eq!(catalog.get("", "Hello").map(Entry::translation), Some("Bonjour"));
    assert_eq!(catalog.get("", "Save").map(Entry::translation), Some(echoed("Save").as_str()));
    assert_eq!(catalog.get("", "Quit").map(Entry::translation), Some(echoed("Quit").as_str()));
    assert_eq!(catalog.header("Last-Translator"), Some(tool_identity().as_str()));
    assert_eq!(checkpoint.count(), 1);
    assert_eq!(progress, vec![(0, 1), (1, 1)]);

    Ok(())
}

/// A rate-limited batch is replayed unchanged and saved once
#[tokio::test]
async fn test_translate_catalog_withOneRateLimit_shouldRetryAndPersistOnce() -> Result<()> {
    let provider = MockProvider::rate_limited(1);
    let session = TranslationSession::new(provider.clone(), fast_options());
    let mut catalog = french_catalog(vec![Entry::new("Save")]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, _) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    assert_eq!(provider.request_count(), 2);
    assert_eq!(report.rate_limit_retries, 1);
    assert_eq!(report.completed_batches, 1);
    assert_eq!(report.abandoned_batches, 0);
    assert_eq!(checkpoint.count(), 1);

    let requests = provider.requests();
    assert_eq!(requests[0], requests[1]);
    assert_eq!(catalog.get("", "Save").map(Entry::translation), Some(echoed("Save").as_str()));

    Ok(())
}

/// A capped retry policy gives up on the batch and carries on
#[tokio::test]
async fn test_translate_catalog_withRetryCap_shouldAbandonBatch() -> Result<()> {
    let provider = MockProvider::rate_limited(10);
    let options = SessionOptions {
        retry: RetryPolicy::exponential(Duration::from_millis(1), 2.0, 2),
        ..Default::default()
    };
    let session = TranslationSession::new(provider.clone(), options);
    let mut catalog = french_catalog(vec![Entry::new("Save")]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, _) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    assert_eq!(provider.request_count(), 2);
    assert_eq!(report.abandoned_batches, 1);
    assert_eq!(report.rate_limit_retries, 1);
    assert_eq!(checkpoint.count(), 0);
    assert_eq!(catalog.get("", "Save").map(Entry::translation), Some(""));

    Ok(())
}

/// An entry the response does not address stays untranslated
#[tokio::test]
async fn test_translate_catalog_withMissingTag_shouldLeaveEntryEmpty() -> Result<()> {
    let provider = MockProvider::dropping(vec![2]);
    let session = TranslationSession::new(provider, fast_options());
    let mut catalog = french_catalog(vec![Entry::new("Save"), Entry::new("Quit")]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, _) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    assert_eq!(report.translated, 1);
    assert_eq!(report.missing_tags, 1);
    assert_eq!(report.completed_batches, 1);
    assert_eq!(catalog.get("", "Save").map(Entry::translation), Some(echoed("Save").as_str()));
    assert_eq!(catalog.get("", "Quit").map(Entry::translation), Some(""));
    assert_eq!(checkpoint.count(), 1);

    Ok(())
}

/// A failing batch is abandoned without aborting the run
#[tokio::test]
async fn test_translate_catalog_withIntermittentFailure_shouldKeepOtherBatches() -> Result<()> {
    let provider = MockProvider::intermittent(2);
    let options = SessionOptions {
        batch_char_limit: 5,
        ..fast_options()
    };
    let session = TranslationSession::new(provider.clone(), options);
    let mut catalog = french_catalog(vec![Entry::new("Alpha"), Entry::new("Bravo"), Entry::new("Charlie")]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, progress) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    assert_eq!(provider.request_count(), 3);
    assert_eq!(report.batches, 3);
    assert_eq!(report.completed_batches, 2);
    assert_eq!(report.abandoned_batches, 1);
    assert_eq!(catalog.get("", "Alpha").map(Entry::translation), Some(echoed("Alpha").as_str()));
    assert_eq!(catalog.get("", "Bravo").map(Entry::translation), Some(""));
    assert_eq!(catalog.get("", "Charlie").map(Entry::translation), Some(echoed("Charlie").as_str()));
    assert_eq!(checkpoint.count(), 2);
    assert_eq!(progress, vec![(0, 3), (1, 3), (2, 3), (3, 3)]);

    // Every save holds a prefix of the completed work
    assert_eq!(
        checkpoint.saves[0].get("", "Charlie").map(Entry::translation),
        Some("")
    );

    Ok(())
}

/// A lost connection abandons the batch and the run still returns a report
#[tokio::test]
async fn test_translate_catalog_withConnectionAbort_shouldReportAbandonedBatch() -> Result<()> {
    let session = TranslationSession::new(MockProvider::connection_abort(), fast_options());
    let mut catalog = french_catalog(vec![Entry::new("Save")]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, _) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    assert_eq!(report.abandoned_batches, 1);
    assert_eq!(report.translated, 0);
    assert_eq!(checkpoint.count(), 0);

    Ok(())
}

/// Whitespace around existing translations is trimmed and saved even with nothing to send
#[tokio::test]
async fn test_translate_catalog_withOnlyPaddedTranslations_shouldTrimAndPersist() -> Result<()> {
    let provider = MockProvider::echo();
    let session = TranslationSession::new(provider.clone(), fast_options());
    let mut catalog = french_catalog(vec![
        Entry::new("Hello").with_msgstr(" Bonjour\n"),
        Entry::new("Quit").with_msgstr("Quitter"),
    ]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, progress) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    assert_eq!(report.pending, 0);
    assert_eq!(report.trimmed, 1);
    assert_eq!(provider.request_count(), 0);
    assert_eq!(checkpoint.count(), 1);
    assert_eq!(catalog.get("", "Hello").map(Entry::translation), Some("Bonjour"));
    assert_eq!(catalog.header("Last-Translator"), None);
    assert!(progress.is_empty());

    Ok(())
}

/// Without a target language the run stops before contacting the backend
#[tokio::test]
async fn test_translate_catalog_withoutTargetLanguage_shouldFail() {
    let provider = MockProvider::echo();
    let session = TranslationSession::new(provider.clone(), fast_options());
    let mut catalog = Catalog::new();
    catalog.insert(Entry::new("Save"));
    let mut checkpoint = RecordingCheckpoint::new();

    let result = run(&session, &mut catalog, None, &mut checkpoint).await;

    assert!(matches!(result, Err(TranslationError::Config(_))));
    assert_eq!(provider.request_count(), 0);
}

/// An explicit target language wins over the Language header
#[tokio::test]
async fn test_translate_catalog_withExplicitTarget_shouldNameItInPrompt() -> Result<()> {
    let provider = MockProvider::echo();
    let session = TranslationSession::new(provider.clone(), fast_options());
    let mut catalog = french_catalog(vec![Entry::new("Save")]);
    let mut checkpoint = RecordingCheckpoint::new();

    run(&session, &mut catalog, Some("de"), &mut checkpoint).await?;

    let request = &provider.requests()[0];
    assert!(request.messages[1].content.contains("English"));
    assert!(request.messages[1].content.contains("German"));
    assert!(!request.messages[1].content.contains("French"));

    Ok(())
}

/// Glossary terms found in the batch are sent ahead of the payload
#[tokio::test]
async fn test_translate_catalog_withGlossary_shouldSendTermsFirst() -> Result<()> {
    let provider = MockProvider::echo();
    let mut glossary = Glossary::new();
    glossary.add("Save", "Enregistrer");
    glossary.add("Undo", "Annuler");
    let session = TranslationSession::new(provider.clone(), fast_options()).with_glossary(glossary);
    let mut catalog = french_catalog(vec![Entry::new("Save"), Entry::new("Save as")]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, _) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    let request = &provider.requests()[0];
    assert_eq!(request.messages.len(), 6);
    assert_eq!(request.messages[3].content, "<translate i=\"1\">save</translate>");
    assert_eq!(request.messages[4].content, "<translate i=\"1\">Enregistrer</translate>");
    assert_eq!(
        request.last_content(),
        "<translate i=\"2\">Save</translate>\n<translate i=\"3\">Save as</translate>"
    );
    assert_eq!(report.translated, 2);
    assert_eq!(catalog.get("", "Save as").map(Entry::translation), Some(echoed("Save as").as_str()));

    Ok(())
}

/// Extracted comments of pending entries reach the system message
#[tokio::test]
async fn test_translate_catalog_withExtractedComments_shouldAddDeveloperNotes() -> Result<()> {
    let provider = MockProvider::echo();
    let session = TranslationSession::new(provider.clone(), fast_options());
    let mut catalog = french_catalog(vec![
        Entry::new("Hello").with_msgstr("Bonjour").with_extracted_comment("Already done"),
        Entry::new("Save").with_extracted_comment("Toolbar button, keep it short"),
    ]);
    let mut checkpoint = RecordingCheckpoint::new();

    run(&session, &mut catalog, None, &mut checkpoint).await?;

    let system = &provider.requests()[0].messages[0].content;
    assert!(system.contains("Toolbar button, keep it short"));
    assert!(!system.contains("Already done"));

    Ok(())
}

/// The same msgid under two contexts is translated in both
#[tokio::test]
async fn test_translate_catalog_withContexts_shouldFillEachContext() -> Result<()> {
    let session = TranslationSession::new(MockProvider::echo(), fast_options());
    let mut catalog = french_catalog(vec![Entry::new("Open"), Entry::new("Open").with_context("verb")]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, _) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    assert_eq!(report.translated, 2);
    assert_eq!(catalog.get("", "Open").map(Entry::translation), Some(echoed("Open").as_str()));
    assert_eq!(catalog.get("verb", "Open").map(Entry::translation), Some(echoed("Open").as_str()));

    Ok(())
}

/// Obsolete entries are never sent
#[tokio::test]
async fn test_translate_catalog_withObsoleteEntry_shouldSkipIt() -> Result<()> {
    let provider = MockProvider::echo();
    let session = TranslationSession::new(provider.clone(), fast_options());
    let mut old = Entry::new("Old");
    old.obsolete = true;
    let mut catalog = french_catalog(vec![old, Entry::new("Save")]);
    let mut checkpoint = RecordingCheckpoint::new();

    let (report, _) = run(&session, &mut catalog, None, &mut checkpoint).await?;

    assert_eq!(report.pending, 1);
    assert!(!provider.requests()[0].last_content().contains("Old"));
    assert_eq!(catalog.get("", "Old").map(Entry::translation), Some(""));

    Ok(())
}

/// The file checkpoint leaves the translated catalog on disk
#[tokio::test]
async fn test_translate_catalog_withFileCheckpoint_shouldWriteCatalog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let po = common::create_sample_po(temp_dir.path(), "fr.po")?;
    let output = temp_dir.path().join("fr.out.po");

    let session = TranslationSession::new(MockProvider::echo(), fast_options());
    let mut catalog = read_catalog(&po)?;
    let mut checkpoint = FileCheckpoint::new(&output, CompileOptions::default());

    let report = session
        .translate_catalog(&mut catalog, None, &mut checkpoint, |_, _| {})
        .await?;
    assert_eq!(report.translated, 2);

    let written = read_catalog(&output)?;
    assert_eq!(written.get("", "Save").map(Entry::translation), Some(echoed("Save").as_str()));
    assert_eq!(written.get("menu", "File").map(Entry::translation), Some(echoed("File").as_str()));
    assert_eq!(written.get("", "Quit").map(Entry::translation), Some("Quitter"));
    assert_eq!(written.header("Last-Translator"), Some(tool_identity().as_str()));
    assert!(written.get("", "Old").is_some_and(|entry| entry.obsolete));

    Ok(())
}
