//! Store behavior tests
//!
//! Run the repository end to end against the in-memory backend. Each test
//! builds its own provider, so no state leaks between tests.

use chrono::{TimeZone, Utc};
use expensectl_core::{ConnectionProvider, ErrorKind, Expense, ExpenseRepo, MemoryBackend};
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (MemoryBackend, ConnectionProvider<MemoryBackend>) {
    let backend = MemoryBackend::new();
    let provider = ConnectionProvider::new(backend.clone(), "mongodb://localhost:27017");
    (backend, provider)
}

fn expense(id: &str, title: &str, amount: f64) -> Expense {
    let date = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Expense::new(id, title, amount, date)
}

#[tokio::test]
async fn test_create_then_find_round_trips() {
    let (_, provider) = setup();
    let repo = ExpenseRepo::new(&provider);
    let original = expense("rt-1", "Groceries", 42.17);

    repo.create(&original).await.unwrap();
    let found = repo.find_by_expense_id("rt-1").await.unwrap();

    assert!(found.is_persisted());
    assert!(!original.is_persisted());
    assert!(found.same_content(&original));
}

#[tokio::test]
async fn test_delete_then_find_is_not_found() {
    let (_, provider) = setup();
    let repo = ExpenseRepo::new(&provider);

    repo.create(&expense("gone", "Taxi", 18.0)).await.unwrap();
    repo.delete_by_expense_id("gone").await.unwrap();

    let err = repo.find_by_expense_id("gone").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_find_all_on_empty_collection_is_not_found() {
    let (_, provider) = setup();
    let repo = ExpenseRepo::new(&provider);

    let err = repo.find_all().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_many_then_find_all_returns_same_set() {
    let (_, provider) = setup();
    let repo = ExpenseRepo::new(&provider);
    let batch = vec![
        expense("e1", "Rent", 1200.0),
        expense("e2", "Power", 85.4),
        expense("e3", "Internet", 60.0),
    ];

    repo.create_many(&batch).await.unwrap();
    let all = repo.find_all().await.unwrap();

    assert_eq!(all.len(), batch.len());
    for wanted in &batch {
        assert!(
            all.iter().any(|stored| stored.same_content(wanted)),
            "missing {}",
            wanted.expense_id
        );
    }
}

#[tokio::test]
async fn test_delete_all_then_find_all_is_not_found() {
    let (_, provider) = setup();
    let repo = ExpenseRepo::new(&provider);

    repo.create_many(&[expense("a", "A", 1.0), expense("b", "B", 2.0)])
        .await
        .unwrap();
    repo.delete_all().await.unwrap();

    let err = repo.find_all().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_first_expense_lifecycle() {
    let (_, provider) = setup();
    let repo = ExpenseRepo::new(&provider);
    let first = Expense::new("1d", "First expense", 3.50, Utc::now());

    repo.create(&first).await.unwrap();

    let found = repo.find_by_expense_id("1d").await.unwrap();
    assert_eq!(found.title, "First expense");
    assert_eq!(found.amount, 3.50);
    assert_eq!(found.date, first.date);

    repo.delete_by_expense_id("1d").await.unwrap();
    let err = repo.find_by_expense_id("1d").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_no_validation_of_field_values() {
    let (_, provider) = setup();
    let repo = ExpenseRepo::new(&provider);
    let odd = Expense::new(
        "",
        "",
        -999.99,
        Utc.with_ymd_and_hms(1901, 1, 1, 0, 0, 0).unwrap(),
    );

    repo.create(&odd).await.unwrap();
    let found = repo.find_by_expense_id("").await.unwrap();
    assert!(found.same_content(&odd));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_share_one_connection() {
    let backend = MemoryBackend::new().with_connect_delay(Duration::from_millis(25));
    let provider = Arc::new(ConnectionProvider::new(
        backend.clone(),
        "mongodb://localhost:27017",
    ));

    let tasks: Vec<_> = (0..12)
        .map(|i| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move {
                let repo = ExpenseRepo::new(&*provider);
                repo.create(&expense(&format!("c{}", i), "Concurrent", i as f64))
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("task panicked").expect("create failed");
    }

    assert_eq!(backend.connect_attempts(), 1);
    assert_eq!(backend.ping_attempts(), 1);

    let repo = ExpenseRepo::new(&*provider);
    assert_eq!(repo.find_all().await.unwrap().len(), 12);
}

#[tokio::test]
async fn test_poisoned_provider_fails_every_operation() {
    let backend = MemoryBackend::new().fail_pings(1);
    let provider = ConnectionProvider::new(backend.clone(), "mongodb://localhost:27017");
    let repo = ExpenseRepo::new(&provider);

    for _ in 0..3 {
        let err = repo.find_by_expense_id("x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }
    assert_eq!(backend.connect_attempts(), 1);
}
