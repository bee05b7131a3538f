use chrono::{TimeZone, Utc};
use expensectl_core::{ConnectionProvider, Expense, ExpenseRepo, MemoryBackend};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// Strategy to generate arbitrary expenses with dates from 1970 to 2100
fn arb_expense() -> impl Strategy<Value = Expense> {
    (
        "[a-zA-Z0-9-]{1,24}",
        ".*",
        any::<f64>().prop_filter("finite amounts only", |f| f.is_finite()),
        0i64..4_102_444_800_000,
    )
        .prop_map(|(id, title, amount, millis)| {
            let date = Utc.timestamp_millis_opt(millis).unwrap();
            Expense::new(id, title, amount, date)
        })
}

proptest! {
    /// Property: create then find_by_expense_id returns the same content
    #[test]
    fn prop_create_find_round_trip(expense in arb_expense()) {
        let found = runtime().block_on(async {
            let provider = ConnectionProvider::new(MemoryBackend::new(), "mem://prop");
            let repo = ExpenseRepo::new(&provider);
            repo.create(&expense).await.unwrap();
            repo.find_by_expense_id(&expense.expense_id).await.unwrap()
        });

        prop_assert!(found.is_persisted());
        prop_assert!(found.same_content(&expense));
    }

    /// Property: find_all returns exactly what create_many stored
    #[test]
    fn prop_create_many_find_all_same_count(batch in prop::collection::vec(arb_expense(), 1..20)) {
        let all = runtime().block_on(async {
            let provider = ConnectionProvider::new(MemoryBackend::new(), "mem://prop");
            let repo = ExpenseRepo::new(&provider);
            repo.create_many(&batch).await.unwrap();
            repo.find_all().await.unwrap()
        });

        prop_assert_eq!(all.len(), batch.len());
        for (stored, wanted) in all.iter().zip(&batch) {
            prop_assert!(stored.same_content(wanted));
        }
    }
}
