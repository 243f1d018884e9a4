//! Concurrent writers against the shared store.
//!
//! Every collection update is a compare-and-swap, so parallel tasks must not
//! lose each other's writes.

use campus_ledger::Campus;
use campus_ledger::catalog::NewStructure;
use campus_ledger::directory::{NewUser, Role};
use campus_ledger::payments::{PaymentError, PaymentRequest, WALLET_METHOD};
use campus_ledger::store::FileStore;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_wallet_adjustments_are_not_lost() {
    let campus = Campus::in_memory();
    campus
        .create_user(NewUser::new("alice", "pw", Role::Student))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let users = campus.users.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..5 {
                users.adjust_wallet("alice", 10).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(campus.users.get_wallet("alice").await.unwrap(), 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_wallet_payments_never_overdraw() {
    let campus = Campus::in_memory();
    campus
        .create_structure(NewStructure {
            category_id: "category-tuition".to_string(),
            academic_year: "2025-2026".to_string(),
            amount: 1000,
            due_date: None,
            is_active: true,
        })
        .await
        .unwrap();
    campus
        .create_user(NewUser::new("alice", "pw", Role::Student))
        .await
        .unwrap();
    campus.users.set_wallet("alice", 250).await.unwrap();
    let fee_id = campus.fees.rows_for("alice").await.unwrap()[0].id.clone();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let payments = campus.payments.clone();
        let fee_id = fee_id.clone();
        handles.push(tokio::spawn(async move {
            payments
                .create(PaymentRequest::new("alice", &fee_id, 50, WALLET_METHOD))
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(PaymentError::InsufficientBalance { .. }) => {}
            Err(e) => panic!("Unexpected payment error: {e}"),
        }
    }

    assert_eq!(succeeded, 5, "Wallet of 250 covers exactly five payments of 50");
    assert_eq!(campus.users.get_wallet("alice").await.unwrap(), 0);
    let fee = campus.fees.find(&fee_id).await.unwrap().unwrap();
    assert_eq!(fee.remaining_amount, 750);
    assert_eq!(campus.payments.list_all().await.unwrap().len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_idempotent_submits_apply_once() {
    let campus = Campus::in_memory();
    campus
        .create_structure(NewStructure {
            category_id: "category-tuition".to_string(),
            academic_year: "2025-2026".to_string(),
            amount: 500,
            due_date: None,
            is_active: true,
        })
        .await
        .unwrap();
    campus
        .create_user(NewUser::new("alice", "pw", Role::Student))
        .await
        .unwrap();
    let fee_id = campus.fees.rows_for("alice").await.unwrap()[0].id.clone();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let payments = campus.payments.clone();
        let fee_id = fee_id.clone();
        handles.push(tokio::spawn(async move {
            payments
                .create(
                    PaymentRequest::new("alice", &fee_id, 100, "Online")
                        .with_idempotency_key("double-click"),
                )
                .await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, PaymentError::DuplicatePayment(_)))
    );
    let fee = campus.fees.find(&fee_id).await.unwrap().unwrap();
    assert_eq!(fee.remaining_amount, 400);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("campus.json");

    {
        let campus = Campus::new(Arc::new(FileStore::open(&path).await.unwrap()));
        campus.initialize().await.unwrap();
        campus
            .create_user(NewUser::new("alice", "pw", Role::Student))
            .await
            .unwrap();
        campus.users.set_wallet("alice", 75).await.unwrap();
    }

    let campus = Campus::new(Arc::new(FileStore::open(&path).await.unwrap()));
    assert_eq!(campus.users.get_wallet("alice").await.unwrap(), 75);
    assert_eq!(campus.fees.rows_for("alice").await.unwrap().len(), 2);
    // Seeding does not run twice
    campus.initialize().await.unwrap();
    assert_eq!(campus.catalog.list_structures().await.unwrap().len(), 2);
}
