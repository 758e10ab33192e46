// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! End-to-end organize runs against a scripted oracle

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_test::{assert_err, assert_ok};

use corral::oracle::{FailureKind, OracleError, ScriptedOracle, TextOracle};
use corral::{AppConfig, CancelToken, CorralError, Organizer, Strategy};

const INVOICE_REPLY: &str = "invoice_march.pdf -> Invoices\n\
                             invoice_april.pdf -> Invoices\n\
                             random_file.txt -> (root)";

fn touch(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), format!("contents of {}", name)).unwrap();
    }
}

fn organizer_with(oracle: Arc<dyn TextOracle>) -> Organizer {
    Organizer::with_oracle(AppConfig::default(), oracle).unwrap()
}

/// Every regular file below `dir`, as sorted relative paths
fn tree(dir: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap();
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

/// Flips the cancel switch from inside the first oracle call
struct CancellingOracle {
    switch: watch::Sender<bool>,
}

#[async_trait]
impl TextOracle for CancellingOracle {
    fn name(&self) -> &'static str {
        "cancelling"
    }

    async fn generate(&self, _prompt: &str, _cancel: &CancelToken) -> Result<String, OracleError> {
        let _ = self.switch.send(true);
        Err(OracleError::Cancelled)
    }
}

#[tokio::test]
async fn test_semantic_invoices_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["invoice_march.pdf", "invoice_april.pdf", "random_file.txt"]);

    let organizer = organizer_with(Arc::new(ScriptedOracle::replying(INVOICE_REPLY)));
    let report = assert_ok!(
        organizer
            .run(Strategy::Semantic, dir.path(), false, &CancelToken::never())
            .await
    );

    assert_eq!(report.scanned, 3);
    assert_eq!(report.moves.len(), 3);
    assert!(report.failed.is_empty());
    assert_eq!(
        tree(dir.path()),
        vec![
            "Invoices/invoice_april.pdf",
            "Invoices/invoice_march.pdf",
            "Miscellaneous/random_file.txt",
        ]
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("Invoices/invoice_march.pdf")).unwrap(),
        "contents of invoice_march.pdf"
    );
}

#[tokio::test]
async fn test_empty_reply_sends_everything_to_misc() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.txt", "b.pdf"]);

    let organizer = organizer_with(Arc::new(ScriptedOracle::failing(FailureKind::EmptyResponse)));
    organizer
        .run(Strategy::Semantic, dir.path(), false, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(tree(dir.path()), vec!["Miscellaneous/a.txt", "Miscellaneous/b.pdf"]);
}

#[tokio::test]
async fn test_unknown_names_in_reply_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["notes.txt"]);

    let reply = "ghost.pdf -> Phantoms\nnotes.txt -> Notes\nthis line has no arrow";
    let organizer = organizer_with(Arc::new(ScriptedOracle::replying(reply)));
    let report = organizer
        .run(Strategy::Semantic, dir.path(), false, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(report.moves.len(), 1);
    assert!(!dir.path().join("Phantoms").exists());
    assert_eq!(tree(dir.path()), vec!["Notes/notes.txt"]);
}

#[tokio::test]
async fn test_existing_destination_gets_suffix() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["invoice_march.pdf", "invoice_april.pdf", "random_file.txt"]);
    fs::create_dir(dir.path().join("Invoices")).unwrap();
    fs::write(dir.path().join("Invoices/invoice_march.pdf"), "older").unwrap();

    let organizer = organizer_with(Arc::new(ScriptedOracle::replying(INVOICE_REPLY)));
    organizer
        .run(Strategy::Semantic, dir.path(), false, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(
        tree(dir.path()),
        vec![
            "Invoices/invoice_april.pdf",
            "Invoices/invoice_march.pdf",
            "Invoices/invoice_march_1.pdf",
            "Miscellaneous/random_file.txt",
        ]
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("Invoices/invoice_march.pdf")).unwrap(),
        "older"
    );
}

#[tokio::test]
async fn test_plain_file_named_miscellaneous_does_not_fail_moves() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["Miscellaneous", "a.txt", "b.txt"]);

    let reply = "a.txt -> (root)\nb.txt -> Notes";
    let organizer = organizer_with(Arc::new(ScriptedOracle::replying(reply)));
    let report = organizer
        .run(Strategy::Semantic, dir.path(), false, &CancelToken::never())
        .await
        .unwrap();

    assert!(report.failed.is_empty());
    assert_eq!(report.moves.len(), 3);
    assert_eq!(
        tree(dir.path()),
        vec!["Miscellaneous_1/Miscellaneous", "Miscellaneous_1/a.txt", "Notes/b.txt"]
    );
}

#[tokio::test]
async fn test_dry_run_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["invoice_march.pdf", "invoice_april.pdf", "random_file.txt"]);
    let before = tree(dir.path());

    let oracle = Arc::new(ScriptedOracle::replying(INVOICE_REPLY));
    let organizer = organizer_with(oracle.clone());
    let report = organizer
        .run(Strategy::Semantic, dir.path(), true, &CancelToken::never())
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(oracle.calls(), 1);
    assert_eq!(report.moves.len(), 3);
    assert_eq!(
        report.moves[0].destination(),
        dir.path().join("Invoices").join("invoice_march.pdf")
    );
    assert_eq!(tree(dir.path()), before);
    assert!(!dir.path().join("Invoices").exists());
}

#[tokio::test]
async fn test_intent_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("contract.txt"), "Please sign below and return").unwrap();
    fs::write(dir.path().join("blank.txt"), "   ").unwrap();

    let oracle = Arc::new(ScriptedOracle::replying("To_Sign"));
    let organizer = organizer_with(oracle.clone());
    let report = organizer
        .run(Strategy::Intent, dir.path(), false, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(oracle.calls(), 1);
    assert_eq!(report.moves.len(), 2);
    assert_eq!(
        tree(dir.path()),
        vec!["Intent_To_Sign/contract.txt", "Intent_Unknown_Intent/blank.txt"]
    );
}

#[tokio::test]
async fn test_already_cancelled_run_moves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.txt", "b.txt"]);
    let before = tree(dir.path());

    let (switch, cancel) = CancelToken::new();
    switch.send(true).unwrap();

    let oracle = Arc::new(ScriptedOracle::replying("To_Read"));
    let organizer = organizer_with(oracle.clone());
    let report = organizer.run(Strategy::Intent, dir.path(), false, &cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(oracle.calls(), 0);
    assert_eq!(report.left_in_place.len(), 2);
    assert_eq!(tree(dir.path()), before);
}

#[tokio::test]
async fn test_cancel_during_oracle_call_stops_run() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.txt", "b.txt", "c.txt"]);
    let before = tree(dir.path());

    let (switch, cancel) = CancelToken::new();
    let organizer = organizer_with(Arc::new(CancellingOracle { switch }));

    let report = organizer.run(Strategy::Intent, dir.path(), false, &cancel).await.unwrap();
    assert!(report.cancelled);
    assert!(report.moves.is_empty());
    assert_eq!(report.left_in_place.len(), 3);
    assert_eq!(tree(dir.path()), before);

    let (switch, cancel) = CancelToken::new();
    let organizer = organizer_with(Arc::new(CancellingOracle { switch }));
    let report = organizer.run(Strategy::Semantic, dir.path(), false, &cancel).await.unwrap();
    assert!(report.cancelled);
    assert!(report.moves.is_empty());
    assert_eq!(tree(dir.path()), before);
}

#[tokio::test]
async fn test_target_must_be_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["file.txt"]);

    let organizer = organizer_with(Arc::new(ScriptedOracle::replying("")));
    let result = organizer
        .run(Strategy::Extension, &dir.path().join("file.txt"), false, &CancelToken::never())
        .await;

    let err = assert_err!(result);
    assert!(matches!(err, CorralError::NotADirectory(_)));
}

#[tokio::test]
async fn test_report_serializes() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["photo.png"]);

    let organizer = organizer_with(Arc::new(ScriptedOracle::replying("")));
    let report = organizer
        .run(Strategy::Extension, dir.path(), true, &CancelToken::never())
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["strategy"], "extension");
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["moves"][0]["destination_filename"], "photo.png");
}
