//! End-to-end ledger tests through the `Campus` facade.
//!
//! Covers enrollment, payment capping, wallet shortfalls, template charges,
//! refunds, invoices, account renames, and the reconciliation reports.

use campus_ledger::Campus;
use campus_ledger::catalog::{NewStructure, StructureUpdate};
use campus_ledger::directory::{NewUser, Role, UserUpdate};
use campus_ledger::fees::{FeeCharge, FeeStatus};
use campus_ledger::invoices::{INVOICE_PAYMENT_METHOD, InvoiceStatus, NewInvoice};
use campus_ledger::payments::{PaymentError, PaymentRequest, PaymentStatus, WALLET_METHOD};
use campus_ledger::refunds::{NewRefund, RefundStatus};
use campus_ledger::reports::StudentBalance;

/// Campus with one active 500 template and one student
async fn setup_campus() -> (Campus, String) {
    let campus = Campus::in_memory();
    let structure = campus
        .create_structure(NewStructure {
            category_id: "category-tuition".to_string(),
            academic_year: "2025-2026".to_string(),
            amount: 500,
            due_date: None,
            is_active: true,
        })
        .await
        .expect("Failed to create structure");
    campus
        .create_user(NewUser::new("alice", "pw", Role::Student).with_name("Alice", "Liddell"))
        .await
        .expect("Failed to create student");
    (campus, structure.id)
}

async fn only_fee_id(campus: &Campus, username: &str) -> String {
    let fees = campus.fees.rows_for(username).await.unwrap();
    assert_eq!(fees.len(), 1, "Expected exactly one fee for {username}");
    fees[0].id.clone()
}

// ============================================================================
// Enrollment
// ============================================================================

#[tokio::test]
async fn test_student_enrolled_at_creation() {
    let (campus, structure_id) = setup_campus().await;

    let fees = campus.fees.rows_for("alice").await.unwrap();
    assert_eq!(fees.len(), 1);
    assert_eq!(fees[0].fee_structure_id, structure_id);
    assert_eq!(fees[0].original_amount, 500);
    assert_eq!(fees[0].remaining_amount, 500);
    assert_eq!(fees[0].status, FeeStatus::Unpaid);
}

#[tokio::test]
async fn test_new_template_enrolls_existing_students() {
    let (campus, _) = setup_campus().await;
    campus
        .create_structure(NewStructure {
            category_id: "category-library".to_string(),
            academic_year: "2025-2026".to_string(),
            amount: 200,
            due_date: None,
            is_active: true,
        })
        .await
        .unwrap();

    assert_eq!(campus.fees.rows_for("alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reactivated_template_is_enrolled() {
    let campus = Campus::in_memory();
    let dormant = campus
        .create_structure(NewStructure {
            category_id: "category-lab".to_string(),
            academic_year: "2025-2026".to_string(),
            amount: 80,
            due_date: None,
            is_active: false,
        })
        .await
        .unwrap();
    campus
        .create_user(NewUser::new("alice", "pw", Role::Student))
        .await
        .unwrap();
    assert!(campus.fees.rows_for("alice").await.unwrap().is_empty());

    campus
        .update_structure(
            &dormant.id,
            StructureUpdate {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(campus.fees.rows_for("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reactivated_student_is_enrolled() {
    let campus = Campus::in_memory();
    let carol = campus
        .create_user(NewUser::new("carol", "pw", Role::Student).inactive())
        .await
        .unwrap();
    campus
        .create_structure(NewStructure {
            category_id: "category-tuition".to_string(),
            academic_year: "2025-2026".to_string(),
            amount: 100,
            due_date: None,
            is_active: true,
        })
        .await
        .unwrap();
    assert!(campus.fees.rows_for("carol").await.unwrap().is_empty());

    campus
        .update_user(
            &carol.id,
            UserUpdate {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(campus.fees.rows_for("carol").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_for_student_twice_is_stable() {
    let (campus, _) = setup_campus().await;
    let first = campus.fees.list_for_student("alice").await.unwrap();
    let second = campus.fees.list_for_student("alice").await.unwrap();
    assert_eq!(first, second, "Second read must not create rows");
}

#[tokio::test]
async fn test_initialize_seeds_catalog_and_enrolls() {
    let campus = Campus::in_memory();
    campus
        .create_user(NewUser::new("alice", "pw", Role::Student))
        .await
        .unwrap();
    campus.initialize().await.unwrap();
    campus.initialize().await.unwrap();

    assert_eq!(campus.catalog.list_categories().await.unwrap().len(), 3);
    assert_eq!(campus.fees.rows_for("alice").await.unwrap().len(), 2);
}

// ============================================================================
// Payments
// ============================================================================

#[tokio::test]
async fn test_overpayment_records_capped_amount() {
    let (campus, _) = setup_campus().await;
    let fee_id = only_fee_id(&campus, "alice").await;

    let payment = campus
        .payments
        .create(PaymentRequest::new("alice", &fee_id, 700, "Online"))
        .await
        .unwrap();

    assert_eq!(payment.amount, 500, "Payment must be capped at the remaining amount");
    let fee = campus.fees.find(&fee_id).await.unwrap().unwrap();
    assert_eq!(fee.remaining_amount, 0);
    assert_eq!(fee.status, FeeStatus::Paid);
}

#[tokio::test]
async fn test_wallet_shortfall_records_nothing() {
    let (campus, _) = setup_campus().await;
    campus.users.set_wallet("alice", 40).await.unwrap();
    let fee_id = only_fee_id(&campus, "alice").await;

    let result = campus
        .payments
        .create(PaymentRequest::new("alice", &fee_id, 100, WALLET_METHOD))
        .await;

    assert!(matches!(
        result,
        Err(PaymentError::InsufficientBalance { .. })
    ));
    assert!(campus.payments.list_all().await.unwrap().is_empty());
    assert_eq!(campus.users.get_wallet("alice").await.unwrap(), 40);
}

#[tokio::test]
async fn test_template_charge_adds_to_existing_row() {
    let (campus, structure_id) = setup_campus().await;

    let fee = campus
        .fees
        .assign_fee(
            "alice",
            FeeCharge::Template {
                fee_structure_id: structure_id,
                amount: Some(150),
            },
        )
        .await
        .unwrap();

    assert_eq!(fee.original_amount, 650);
    assert_eq!(fee.remaining_amount, 650);
    assert_eq!(campus.fees.rows_for("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_partial_payment_then_charge_keeps_status_consistent() {
    let (campus, structure_id) = setup_campus().await;
    let fee_id = only_fee_id(&campus, "alice").await;

    campus
        .payments
        .create(PaymentRequest::new("alice", &fee_id, 500, "Online"))
        .await
        .unwrap();
    let fee = campus
        .fees
        .assign_fee(
            "alice",
            FeeCharge::Template {
                fee_structure_id: structure_id,
                amount: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(fee.original_amount, 1000);
    assert_eq!(fee.remaining_amount, 500);
    assert_eq!(fee.status, FeeStatus::Partial);
}

// ============================================================================
// Refunds and invoices
// ============================================================================

#[tokio::test]
async fn test_refund_approval_leaves_ledger_untouched() {
    let (campus, _) = setup_campus().await;
    let fee_id = only_fee_id(&campus, "alice").await;
    let payment = campus
        .payments
        .create(PaymentRequest::new("alice", &fee_id, 200, "Online"))
        .await
        .unwrap();

    let request = campus
        .refunds
        .create(NewRefund {
            user_id: "alice".to_string(),
            username: "alice".to_string(),
            payment_id: payment.id.clone(),
            amount: 200,
            reason: "Withdrew".to_string(),
        })
        .await
        .unwrap();
    campus
        .refunds
        .set_status(&request.id, RefundStatus::Approved)
        .await
        .unwrap();

    let payment = campus.payments.find(&payment.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    let fee = campus.fees.find(&fee_id).await.unwrap().unwrap();
    assert_eq!(fee.remaining_amount, 300);
}

#[tokio::test]
async fn test_invoice_payment_counts_towards_revenue() {
    let (campus, _) = setup_campus().await;
    let invoice = campus
        .invoices
        .create(NewInvoice {
            user_id: "alice".to_string(),
            username: "alice".to_string(),
            title: "Transcript".to_string(),
            description: Some("Official copy".to_string()),
            amount: 30,
            due_date: None,
        })
        .await
        .unwrap();

    let (invoice, payment) = campus
        .invoices
        .pay(&invoice.id, INVOICE_PAYMENT_METHOD)
        .await
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(payment.payment_method, INVOICE_PAYMENT_METHOD);
    assert_eq!(campus.reports.total_revenue().await.unwrap(), 30);
}

#[tokio::test]
async fn test_rename_keeps_ledger_history() {
    let (campus, _) = setup_campus().await;
    let fee_id = only_fee_id(&campus, "alice").await;
    let payment = campus
        .payments
        .create(PaymentRequest::new("alice", &fee_id, 500, "Online"))
        .await
        .unwrap();
    campus
        .refunds
        .create(NewRefund {
            user_id: "alice".to_string(),
            username: "alice".to_string(),
            payment_id: payment.id.clone(),
            amount: 50,
            reason: "Overcharged".to_string(),
        })
        .await
        .unwrap();
    let alice = campus.users.find_by_username("alice").await.unwrap().unwrap();
    campus
        .invoices
        .create(NewInvoice {
            user_id: alice.id.clone(),
            username: "alice".to_string(),
            title: "Transcript".to_string(),
            description: None,
            amount: 30,
            due_date: None,
        })
        .await
        .unwrap();
    let before = campus.reports.student_balance("alice").await.unwrap();

    campus
        .update_user(
            &alice.id,
            UserUpdate {
                username: Some("alicia".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(campus.reports.student_balance("alicia").await.unwrap(), before);
    assert_eq!(
        before,
        StudentBalance {
            total_due: 500,
            total_paid: 500,
            outstanding: 0
        }
    );
    assert!(campus.reports.unpaid_students().await.unwrap().is_empty());

    let owners: Vec<String> = campus
        .fees
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.user_id)
        .collect();
    assert_eq!(owners, vec!["alicia"]);
    assert_eq!(campus.payments.list_for_student("alicia").await.unwrap().len(), 1);
    assert_eq!(campus.refunds.list_for_student("alicia").await.unwrap().len(), 1);
    assert_eq!(campus.invoices.list_for_student("alicia").await.unwrap().len(), 1);
    assert!(campus.payments.list_for_student("alice").await.unwrap().is_empty());
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn test_unpaid_students_excludes_settled() {
    let (campus, _) = setup_campus().await;
    campus
        .create_user(NewUser::new("bob", "pw", Role::Student))
        .await
        .unwrap();
    let fee_id = only_fee_id(&campus, "bob").await;
    campus
        .payments
        .create(PaymentRequest::new("bob", &fee_id, 500, "Manual"))
        .await
        .unwrap();

    let unpaid = campus.reports.unpaid_students().await.unwrap();
    let names: Vec<&str> = unpaid.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice"]);
    assert_eq!(unpaid[0].firstname, "Alice");
}

#[tokio::test]
async fn test_unknown_student_balance_is_zero() {
    let (campus, _) = setup_campus().await;
    assert_eq!(
        campus.reports.student_balance("user-unknown").await.unwrap(),
        StudentBalance {
            total_due: 0,
            total_paid: 0,
            outstanding: 0
        }
    );
}

#[tokio::test]
async fn test_payment_history_newest_first() {
    let (campus, _) = setup_campus().await;
    let fee_id = only_fee_id(&campus, "alice").await;
    for amount in [100, 200, 50] {
        campus
            .payments
            .create(PaymentRequest::new("alice", &fee_id, amount, "Online"))
            .await
            .unwrap();
    }

    let history = campus.reports.payment_history().await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(
        history
            .windows(2)
            .all(|w| w[0].payment_date >= w[1].payment_date),
        "History must be sorted by date, newest first"
    );
}
