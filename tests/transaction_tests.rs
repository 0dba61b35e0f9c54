//! Scope logging scenarios across threads, tasks and nesting.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use log::Level;
use log_transactions::{
    async_transaction, transaction, AsyncTransaction, IdentifierSource, LogRecord, LogSink,
    RecordingSink, Transaction, TransactionIdGenerator,
};
use regex::Regex;
use serde::Serialize;
use serde_json::json;

fn local_source() -> Arc<dyn IdentifierSource> {
    Arc::new(TransactionIdGenerator::local())
}

fn between<'a>(message: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = message.find(open)? + open.len();
    let end = message[start..].find(close)? + start;
    Some(&message[start..end])
}

fn txn_id(message: &str) -> Option<&str> {
    between(message, "Transaction[", "]:")
}

fn txn_marker(message: &str) -> Option<&str> {
    between(message, "marker[", "]")
}

/// Every (id, marker) pair must own exactly one Enter and one Exit line, in
/// that order, with any Exception line in between.
fn check_scopes_pair_up(records: &[LogRecord]) -> usize {
    let mut scopes: HashMap<(String, String), Vec<(usize, &str)>> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        let (Some(id), Some(marker)) = (txn_id(&record.message), txn_marker(&record.message)) else {
            continue;
        };
        let kind = if record.message.contains(": Enter[") {
            "enter"
        } else if record.message.contains(": Exception[") {
            "exception"
        } else {
            "exit"
        };
        scopes
            .entry((id.to_string(), marker.to_string()))
            .or_default()
            .push((index, kind));
    }

    for (key, lines) in &scopes {
        let kinds: Vec<&str> = lines.iter().map(|(_, kind)| *kind).collect();
        assert!(
            kinds == ["enter", "exit"] || kinds == ["enter", "exception", "exit"],
            "scope {:?} logged {:?}",
            key,
            kinds
        );
    }
    scopes.len()
}

#[test]
fn test_command_example_with_local_id() {
    let sink = Arc::new(RecordingSink::new());
    let id = transaction("Command", &json!({}))
        .unwrap()
        .with_logger(sink.clone())
        .with_id_source(local_source())
        .run(|id| Ok::<_, ()>(id.clone()))
        .unwrap();

    let today = Utc::now().format("%Y%m%d").to_string();
    let id_pattern = Regex::new(&format!(r"^txn-local-{}-\d{{9}}$", today)).unwrap();
    assert!(id_pattern.is_match(id.as_str()), "unexpected id {}", id);

    let messages = sink.messages();
    assert_eq!(messages.len(), 2);
    let enter = Regex::new(r"^Transaction\[(.+)\]: Enter\[Command\] with parameters \[\{\}\] marker\[(\d{5})\]$").unwrap();
    let exit = Regex::new(r"^Transaction\[(.+)\]: Exit\[Command\] marker\[(\d{5})\]$").unwrap();

    let entered = enter.captures(&messages[0]).expect("entry line");
    let exited = exit.captures(&messages[1]).expect("exit line");
    assert_eq!(&entered[1], id.as_str());
    assert_eq!(&exited[1], id.as_str());
    assert_eq!(&entered[2], &exited[2]);
}

#[test]
fn test_structured_params_in_entry_line() {
    #[derive(Serialize)]
    struct Configure {
        subarray: u32,
        receptors: Vec<&'static str>,
    }

    let sink = Arc::new(RecordingSink::new());
    let params = Configure {
        subarray: 1,
        receptors: vec!["SKA001", "SKA036"],
    };
    Transaction::new("Configure", &params)
        .unwrap()
        .with_logger(sink.clone())
        .with_transaction_id("abc1234")
        .run(|_| Ok::<_, ()>(()))
        .unwrap();

    assert!(sink.messages()[0]
        .contains(r#"with parameters [{"subarray":1,"receptors":["SKA001","SKA036"]}]"#));
}

#[test]
fn test_failure_logs_three_lines_sharing_id_and_marker() {
    let sink = Arc::new(RecordingSink::new());
    let err = Transaction::named("name")
        .with_logger(sink.clone())
        .with_id_source(local_source())
        .run(|_| -> Result<(), anyhow::Error> {
            Err(anyhow::anyhow!("disk unavailable").context("RuntimeError: Something went wrong"))
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "RuntimeError: Something went wrong");

    let records = sink.records();
    assert_eq!(records.len(), 3);
    let levels: Vec<Level> = records.iter().map(|r| r.level).collect();
    assert_eq!(levels, vec![Level::Info, Level::Error, Level::Info]);

    let id = txn_id(&records[0].message).unwrap();
    let marker = txn_marker(&records[0].message).unwrap();
    for record in &records {
        assert_eq!(txn_id(&record.message), Some(id));
        assert_eq!(txn_marker(&record.message), Some(marker));
    }
    let rendered = records[1].rendered();
    assert!(rendered.contains("RuntimeError: Something went wrong"));
    assert!(rendered.contains("disk unavailable"));
    assert_eq!(check_scopes_pair_up(&records), 1);
}

#[test]
fn test_panic_logs_exception_and_exit_then_unwinds() {
    let sink = Arc::new(RecordingSink::new());
    let logger = sink.clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
        Transaction::named("name")
            .with_logger(logger)
            .with_transaction_id("abc1234")
            .run(|_| -> Result<(), ()> { panic!("boom") })
    }));
    assert!(outcome.is_err());

    let records = sink.records();
    assert_eq!(records.len(), 3);
    assert!(records[1].message.contains("Exception[name]"));
    assert_eq!(
        records[1].cause.as_deref(),
        Some("panicked inside transaction scope: boom")
    );
    assert!(records[2].message.contains("Exit[name]"));
}

#[test]
fn test_nested_scopes_stay_independent() {
    let sink = Arc::new(RecordingSink::new());
    let inner_sink = sink.clone();
    let (outer_id, inner_id) = Transaction::named("Outer")
        .with_logger(sink.clone())
        .with_id_source(local_source())
        .run(|outer| {
            let inner = Transaction::named("Inner")
                .with_logger(inner_sink.clone())
                .with_id_source(local_source())
                .run(|inner| Ok::<_, ()>(inner.clone()))?;
            Ok::<_, ()>((outer.clone(), inner))
        })
        .unwrap();
    assert_ne!(outer_id, inner_id);

    let messages = sink.messages();
    assert_eq!(messages.len(), 4);
    assert!(messages[0].contains("Enter[Outer]"));
    assert!(messages[1].contains("Enter[Inner]"));
    assert!(messages[2].contains("Exit[Inner]"));
    assert!(messages[3].contains("Exit[Outer]"));
    assert_eq!(txn_id(&messages[0]), Some(outer_id.as_str()));
    assert_eq!(txn_id(&messages[3]), Some(outer_id.as_str()));
    assert_eq!(txn_id(&messages[1]), Some(inner_id.as_str()));
    assert_eq!(txn_marker(&messages[0]), txn_marker(&messages[3]));
    assert_eq!(txn_marker(&messages[1]), txn_marker(&messages[2]));
}

#[test]
fn test_nested_scope_propagates_identifier() {
    let sink = Arc::new(RecordingSink::new());
    let inner_sink = sink.clone();
    Transaction::named("Outer")
        .with_logger(sink.clone())
        .with_id_source(local_source())
        .run(|outer| {
            let params = json!({"transaction_id": outer.as_str(), "scan": 3});
            transaction("Inner", &params)
                .map_err(|e| e.to_string())?
                .with_logger(inner_sink.clone())
                .run(|inner| {
                    assert_eq!(inner, outer);
                    Ok::<_, String>(())
                })
        })
        .unwrap();

    let ids: Vec<String> = sink
        .messages()
        .iter()
        .filter_map(|m| txn_id(m).map(str::to_string))
        .collect();
    assert_eq!(ids.len(), 4);
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_threaded_scopes_pair_up() {
    let sink = Arc::new(RecordingSink::new());

    std::thread::scope(|s| {
        for index in 0..10 {
            let logger = sink.clone();
            s.spawn(move || {
                let _ = Transaction::named(&format!("Transaction thread [{}]", index))
                    .with_logger(logger.clone())
                    .with_id_source(local_source())
                    .run(|_| {
                        logger.info(&format!("Transaction thread [{}], in transaction", index));
                        Err::<(), _>("RuntimeError: An exception has occurred")
                    });
            });

            let logger = sink.clone();
            s.spawn(move || {
                Transaction::named(&format!("Transaction thread [{}]", index))
                    .with_logger(logger.clone())
                    .with_id_source(local_source())
                    .run(|_| {
                        logger.info(&format!("Transaction thread [{}], in transaction", index));
                        Ok::<_, ()>(())
                    })
                    .unwrap();
                logger.info(&format!("Thread log [{}], no transaction", index));
            });

            let logger = sink.clone();
            s.spawn(move || logger.info(&format!("Thread log [{}], no transaction", index)));
        }
    });

    let records = sink.records();
    assert_eq!(check_scopes_pair_up(&records), 20);
    for record in &records {
        if record.message.contains("in transaction") || record.message.contains("no transaction") {
            assert!(!record.message.contains("Transaction["), "{}", record.message);
        }
    }
    let exceptions = records.iter().filter(|r| r.level == Level::Error).count();
    assert_eq!(exceptions, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_scopes_pair_up() {
    let sink = Arc::new(RecordingSink::new());
    let mut tasks = Vec::new();

    for index in 0..10 {
        let logger = sink.clone();
        tasks.push(tokio::spawn(async move {
            let _ = AsyncTransaction::named(&format!("Transaction thread [{}]", index))
                .with_logger(logger.clone())
                .with_id_source(local_source())
                .run(|_| async move {
                    tokio::task::yield_now().await;
                    logger.info(&format!("Transaction thread [{}], in transaction", index));
                    Err::<(), _>("RuntimeError: An exception has occurred")
                })
                .await;
        }));

        let logger = sink.clone();
        tasks.push(tokio::spawn(async move {
            let inner = logger.clone();
            async_transaction(&format!("Transaction thread [{}]", index), &json!({}))
                .unwrap()
                .with_logger(logger.clone())
                .with_id_source(local_source())
                .run(|_| async move {
                    tokio::task::yield_now().await;
                    inner.info(&format!("Transaction thread [{}], in transaction", index));
                    Ok::<_, ()>(())
                })
                .await
                .unwrap();
            logger.info(&format!("Thread log [{}], no transaction", index));
        }));

        let logger = sink.clone();
        tasks.push(tokio::spawn(async move {
            logger.info(&format!("Thread log [{}], no transaction", index));
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    let records = sink.records();
    assert_eq!(check_scopes_pair_up(&records), 20);
    let exceptions = records.iter().filter(|r| r.level == Level::Error).count();
    assert_eq!(exceptions, 10);
}

#[tokio::test]
async fn test_async_nesting_inside_suspending_body() {
    let sink = Arc::new(RecordingSink::new());
    let inner_sink = sink.clone();
    AsyncTransaction::named("Outer")
        .with_logger(sink.clone())
        .with_id_source(local_source())
        .run(|_| async move {
            tokio::task::yield_now().await;
            AsyncTransaction::named("Inner")
                .with_logger(inner_sink)
                .with_id_source(local_source())
                .run(|_| async { Ok::<_, ()>(()) })
                .await
        })
        .await
        .unwrap();

    let messages = sink.messages();
    assert_eq!(messages.len(), 4);
    assert!(messages[0].contains("Enter[Outer]"));
    assert!(messages[1].contains("Enter[Inner]"));
    assert!(messages[2].contains("Exit[Inner]"));
    assert!(messages[3].contains("Exit[Outer]"));
}
