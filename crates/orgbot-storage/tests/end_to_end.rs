//! Flow-to-sink scenarios over the real SQLite sink

use std::sync::Arc;

use orgbot_core::IntakeFlow;
use orgbot_storage::{RecordSink, SinkWriter, SqliteSink};

fn flow() -> IntakeFlow {
    IntakeFlow::new("https://t.me/+orgkom")
}

#[tokio::test]
async fn test_completed_conversation_is_appended_exactly_once() {
    let sink: Arc<dyn RecordSink> = Arc::new(SqliteSink::in_memory().await.unwrap());
    let (handle, worker) = SinkWriter::spawn(sink.clone());
    let flow = flow();

    flow.start(7);
    assert!(flow.handle_text(7, Some("ann_un"), "Ann").record.is_none());
    assert!(flow.handle_text(7, Some("ann_un"), "3").record.is_none());
    let turn = flow.handle_text(7, Some("ann_un"), "because");
    handle.submit(turn.record.expect("motivation answer finalizes"));

    // A stray message after finalization must not produce another record.
    assert!(flow.handle_text(7, Some("ann_un"), "ещё раз").is_ignored());

    drop(handle);
    worker.await.unwrap();

    let stored = sink.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].user_id, 7);
    assert_eq!(stored[0].username.as_deref(), Some("ann_un"));
    assert_eq!(stored[0].name, "Ann");
    assert_eq!(stored[0].course, "3");
    assert_eq!(stored[0].motivation.as_deref(), Some("because"));
}

#[tokio::test]
async fn test_early_exit_is_appended_without_motivation() {
    let sink: Arc<dyn RecordSink> = Arc::new(SqliteSink::in_memory().await.unwrap());
    let (handle, worker) = SinkWriter::spawn(sink.clone());
    let flow = flow();

    flow.start(8);
    flow.handle_text(8, Some("bo_un"), "Bo");
    let turn = flow.handle_text(8, Some("bo_un"), "6+");
    handle.submit(turn.record.expect("sentinel finalizes"));

    drop(handle);
    worker.await.unwrap();

    let stored = sink.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].course, "6+");
    assert_eq!(stored[0].motivation, None);
}
