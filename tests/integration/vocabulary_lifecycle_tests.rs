/*!
 * Integration tests for the vocabulary lifecycle: import, translate, export
 */

use anyhow::Result;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;
use bilinguo::app_controller::TranslateSummary;
use bilinguo::database::{EntryFilter, SortKey, WordStore};
use bilinguo::errors::{AppError, ImportError};
use bilinguo::providers::MockProvider;
use crate::common;

const WORD_LIST: &str = r#"[
    {"word": "Hello", "translation": "سلام"},
    {"word": "cat"},
    42
]"#;

const NOTES: &str = "The cat and the dog. zzqxnotaword!";

fn dictionary() -> MockProvider {
    MockProvider::dictionary([("the", "آن"), ("cat", "گربه"), ("and", "و"), ("dog", "سگ")])
}

/// Import, translate and export twice, then reopen the store from disk
#[tokio::test]
async fn test_fullLifecycle_shouldExportEachWordExactlyOnce() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let inbox = dir.path().join("inbox");
    std::fs::create_dir(&inbox)?;
    common::create_test_file(&inbox, "notes.txt", NOTES)?;
    common::create_test_file(&inbox, "words.json", WORD_LIST)?;

    let controller = common::test_controller(dir.path(), dictionary())?;

    let imported = controller.import_path(&inbox).await?;
    assert_eq!(imported.inserted, 6);
    assert_eq!(imported.merged, 1);
    assert_eq!(imported.rejected, 1);

    let translated = controller
        .translate_pending(None, &CancellationToken::new(), false)
        .await?;
    assert_eq!(
        translated,
        TranslateSummary { translated: 4, not_found: 1, failed: 0, skipped: 0 }
    );

    let first = controller.export(Some(3), &dir.path().join("first.csv")).await?;
    let second = controller.export(Some(3), &dir.path().join("second.csv")).await?;
    let third = controller.export(Some(3), &dir.path().join("third.csv")).await?;

    let first_words: BTreeSet<String> = first.words().map(str::to_string).collect();
    let second_words: BTreeSet<String> = second.words().map(str::to_string).collect();
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 2);
    assert!(first_words.is_disjoint(&second_words));
    assert!(third.is_empty());
    assert!(!dir.path().join("third.csv").exists());

    let all_exported: BTreeSet<String> = first_words.union(&second_words).cloned().collect();
    let expected: BTreeSet<String> = ["and", "cat", "dog", "hello", "the"]
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(all_exported, expected);

    let first_csv = std::fs::read_to_string(dir.path().join("first.csv"))?;
    assert_eq!(first_csv.lines().count(), 3);
    drop(controller);

    // Everything above must survive a reopen
    let store = WordStore::open(common::test_config(dir.path()).resolve_database_path()?)?;
    let stats = store.stats().await?;
    assert_eq!(stats.total, 6);
    assert_eq!(stats.translated, 5);
    assert_eq!(stats.exported, 5);
    assert_eq!(stats.pending_export, 0);

    let untranslated = store.untranslated_words(None).await?;
    assert_eq!(untranslated, vec!["zzqxnotaword".to_string()]);
    Ok(())
}

/// Words translated after an export are the only ones in the next export
#[tokio::test]
async fn test_export_afterManualTranslation_shouldContainOnlyNewWord() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let controller = common::test_controller(dir.path(), MockProvider::empty())?;
    controller.add_word("apple", Some("سیب")).await?;
    controller.add_word("bread", None).await?;
    controller.export(None, &dir.path().join("one.csv")).await?;

    controller.set_translation("bread", "نان").await?;
    let next = controller.export(None, &dir.path().join("two.csv")).await?;

    assert_eq!(next.words().collect::<Vec<_>>(), vec!["bread"]);
    assert_eq!(std::fs::read_to_string(dir.path().join("two.csv"))?, "bread,نان\n");
    Ok(())
}

/// A cancelled run sends nothing and leaves every word untranslated
#[tokio::test]
async fn test_translatePending_withCancelledToken_shouldSkipEverything() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let provider = dictionary();
    let controller = common::test_controller(dir.path(), provider.clone())?;
    for word in ["cat", "dog"] {
        controller.add_word(word, None).await?;
    }
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = controller.translate_pending(None, &cancel, false).await?;

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.translated, 0);
    assert_eq!(provider.request_count(), 0);
    assert_eq!(controller.stats().await?.translated, 0);
    Ok(())
}

/// Transient failures are retried before a word is given up
#[tokio::test]
async fn test_translatePending_withRecoveringProvider_shouldTranslateAll() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let provider = dictionary().with_failures(
        "dog",
        vec![bilinguo::errors::ProviderError::Timeout("slow".to_string())],
    );
    let controller = common::test_controller(dir.path(), provider.clone())?;
    controller.add_word("cat", None).await?;
    controller.add_word("dog", None).await?;

    let summary = controller
        .translate_pending(None, &CancellationToken::new(), false)
        .await?;

    assert_eq!(summary.translated, 2);
    assert_eq!(provider.requests_for("dog"), 2);
    Ok(())
}

/// A malformed word list is rejected without touching the store
#[test]
fn test_importPath_withMalformedJson_shouldLeaveStoreUnchanged() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let file = common::create_test_file(dir.path(), "broken.json", r#"{"word": "cat"}"#)?;

    tokio_test::block_on(async {
        let controller = common::test_controller(dir.path(), MockProvider::working())?;

        let result = controller.import_path(&file).await;

        assert!(matches!(result, Err(AppError::Import(ImportError::InvalidFormat(_)))));
        assert_eq!(controller.stats().await?.total, 0);
        Ok::<(), anyhow::Error>(())
    })
}

/// Listing honours the exported filter and search
#[tokio::test]
async fn test_list_withFilters_shouldNarrowResults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let controller = common::test_controller(dir.path(), MockProvider::working())?;
    controller.add_word("sunrise", Some("طلوع")).await?;
    controller.add_word("sunset", Some("غروب")).await?;
    controller.add_word("moon", None).await?;
    controller.export(Some(1), &dir.path().join("cards.csv")).await?;

    let pending = controller
        .list(EntryFilter::default().exported(false), SortKey::Word, None)
        .await?;
    let sun = controller
        .list(EntryFilter::default().search("sun"), SortKey::Word, Some(1))
        .await?;

    assert_eq!(pending.len(), 2);
    assert_eq!(sun.len(), 1);
    assert_eq!(sun[0].word, "sunrise");
    Ok(())
}
