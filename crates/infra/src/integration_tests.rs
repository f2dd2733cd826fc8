//! End-to-end tests through the services.
//!
//! Operation → AccountBook transaction → commit → EventBus, plus the reports
//! read back from the committed state.

use std::sync::Arc;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stockbook_core::{AccountId, DomainError, Quantity, Scope, UserId};
use stockbook_inventory::{
    DamageApproval, EditRequest, MovementKind, MovementStatus, Product, ProductField,
};
use stockbook_observability::{LogFormat, TracingConfig};
use stockbook_reporting::ReportWindow;
use stockbook_sales::{AuditStatus, NewSale, PaymentStatus};

use crate::config::LedgerConfig;
use crate::services::NewProduct;
use crate::stockbook::InMemoryStockbook;

fn boxes(n: Decimal) -> Quantity {
    Quantity::new(n, Decimal::ZERO)
}

fn setup() -> (InMemoryStockbook, Scope, Scope) {
    stockbook_observability::tracing::init_with(
        &TracingConfig::default()
            .with_format(LogFormat::Pretty)
            .with_default_directive("debug")
            .with_test_writer(),
    );
    let stockbook = InMemoryStockbook::in_memory(LedgerConfig::default());
    let account_id = AccountId::new();
    let clerk = Scope::new(account_id, UserId::new());
    let manager = Scope::new(account_id, UserId::new());
    (stockbook, clerk, manager)
}

/// 10 boxes, 20 kg per box, cost 50, price 70.
fn create_fish(stockbook: &InMemoryStockbook, scope: &Scope) -> Product {
    stockbook
        .ledger()
        .create_product(
            scope,
            NewProduct {
                name: "Tilapia".to_string(),
                category_id: None,
                quantity: boxes(dec!(10)),
                box_to_kg_ratio: dec!(20),
                cost_per_box: dec!(50),
                price_per_box: dec!(70),
                low_stock_threshold: None,
                expiry_date: None,
            },
        )
        .unwrap()
}

fn sale_of(product: &Product, client: &str, quantity: Quantity, amount_paid: Decimal) -> NewSale {
    NewSale {
        product_id: product.id_typed(),
        client_id: None,
        client_name: client.to_string(),
        client_phone: None,
        quantity,
        box_price: None,
        kg_price: None,
        amount_paid,
        payment_method: "cash".to_string(),
        sold_at: Utc::now(),
    }
}

fn window_around_now() -> ReportWindow {
    let now = Utc::now();
    ReportWindow::new(now - Duration::hours(1), now + Duration::hours(1)).unwrap()
}

#[test]
fn restock_sale_and_pending_edit_scenario() {
    let (stockbook, clerk, manager) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();

    let restock = stockbook
        .ledger()
        .record_restock(&clerk, id, boxes(dec!(5)), Utc::now(), None)
        .unwrap();
    assert_eq!(restock.total_cost, dec!(250));
    assert_eq!(restock.status, MovementStatus::Completed);
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(15)
    );

    let sale = stockbook
        .sales()
        .record_sale(&clerk, sale_of(&product, "Bakari", boxes(dec!(3)), dec!(210)))
        .unwrap();
    assert_eq!(sale.total_amount(), dec!(210));
    assert_eq!(sale.profit(), dec!(60));
    assert_eq!(sale.payment_status(), PaymentStatus::Completed);

    let window = window_around_now();
    let report = stockbook.reports().general_report(&clerk, window).unwrap();
    assert_eq!(report.rows[0].added, boxes(dec!(5)));
    assert_eq!(report.rows[0].sold, boxes(dec!(3)));
    assert_eq!(report.rows[0].profit, dec!(60));

    let edits = stockbook
        .ledger()
        .request_edit(
            &clerk,
            id,
            EditRequest {
                price_per_box: Some(dec!(80)),
                ..Default::default()
            },
            Some("supplier price rise"),
        )
        .unwrap();
    assert_eq!(edits.len(), 1);

    // Pending: neither the product nor recorded sales move.
    let current = stockbook.ledger().get_product(&clerk, id).unwrap();
    assert_eq!(current.pricing().price_per_box, dec!(70));
    assert_eq!(current.quantity_box(), dec!(12));
    assert_eq!(stockbook.sales().get_sale(&clerk, sale.id()).unwrap().profit(), dec!(60));
    let report = stockbook.reports().general_report(&clerk, window).unwrap();
    assert_eq!(report.rows[0].sold, boxes(dec!(3)));
    assert_eq!(report.rows[0].profit, dec!(60));

    stockbook
        .approvals()
        .approve_edit(&manager, edits[0].id(), id)
        .unwrap();
    let current = stockbook.ledger().get_product(&clerk, id).unwrap();
    assert_eq!(current.pricing().price_per_box, dec!(80));
    assert_eq!(current.pricing().price_per_kg, dec!(4));
    assert_eq!(stockbook.sales().get_sale(&clerk, sale.id()).unwrap().profit(), dec!(60));

    // Approved pricing revalues the window's sold quantity.
    let report = stockbook.reports().general_report(&clerk, window).unwrap();
    assert_eq!(report.rows[0].sold, boxes(dec!(3)));
    assert_eq!(report.rows[0].profit, dec!(90));
    assert_eq!(report.rows[0].recorded_profit, dec!(60));
}

#[test]
fn ledger_listings_are_newest_first() {
    let (stockbook, clerk, _manager) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();

    stockbook
        .ledger()
        .record_restock(&clerk, id, boxes(dec!(1)), Utc::now(), None)
        .unwrap();
    stockbook
        .ledger()
        .record_restock(&clerk, id, boxes(dec!(2)), Utc::now(), None)
        .unwrap();
    stockbook
        .ledger()
        .record_damage(&clerk, id, boxes(dec!(1)), "crushed")
        .unwrap();
    stockbook
        .ledger()
        .record_damage(&clerk, id, boxes(dec!(3)), "thawed")
        .unwrap();

    let restocks = stockbook.ledger().list_restocks(&clerk, Some(id)).unwrap();
    assert_eq!(restocks.len(), 2);
    assert_eq!(restocks[0].quantity, boxes(dec!(2)));
    assert_eq!(restocks[1].quantity, boxes(dec!(1)));

    let damages = stockbook.ledger().list_damages(&clerk, None).unwrap();
    assert_eq!(damages.len(), 2);
    assert_eq!(damages[0].quantity(), boxes(dec!(3)));

    let movements = stockbook.ledger().list_movements(&clerk, Some(id)).unwrap();
    assert_eq!(movements.len(), 4);
    assert!(matches!(movements[0].kind(), MovementKind::Damage { .. }));
    assert!(matches!(movements[3].kind(), MovementKind::Restock { .. }));

    let pending = stockbook.ledger().list_pending_movements(&clerk).unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending[0].created_at() <= pending[1].created_at());
}

#[test]
fn double_approval_applies_the_edit_once() {
    let (stockbook, clerk, manager) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();
    let events = stockbook.subscribe();

    let edits = stockbook
        .ledger()
        .request_edit(
            &clerk,
            id,
            EditRequest {
                name: Some("Nile Tilapia".to_string()),
                ..Default::default()
            },
            None,
        )
        .unwrap();
    let movement_id = edits[0].id();

    stockbook
        .approvals()
        .approve_edit(&manager, movement_id, id)
        .unwrap();
    let err = stockbook
        .approvals()
        .approve_edit(&manager, movement_id, id)
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));

    let field_changes = events
        .drain()
        .into_iter()
        .filter(|e| e.payload()["event_type"] == "inventory.product.field_changed")
        .count();
    assert_eq!(field_changes, 1);
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().name(),
        "Nile Tilapia"
    );
}

#[test]
fn approver_must_differ_from_requester() {
    let (stockbook, clerk, _) = setup();
    let product = create_fish(&stockbook, &clerk);

    let damage = stockbook
        .ledger()
        .record_damage(&clerk, product.id_typed(), boxes(dec!(1)), "crushed in transit")
        .unwrap();
    let err = stockbook.approvals().approve_damage(&clerk, damage.id()).unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized(_)));

    // Same user is fine when the rule is switched off.
    let relaxed = InMemoryStockbook::in_memory(
        LedgerConfig::default().with_require_distinct_approver(false),
    );
    let product = create_fish(&relaxed, &clerk);
    let damage = relaxed
        .ledger()
        .record_damage(&clerk, product.id_typed(), boxes(dec!(1)), "crushed in transit")
        .unwrap();
    relaxed.approvals().approve_damage(&clerk, damage.id()).unwrap();
}

#[test]
fn damage_approval_writes_off_stock() {
    let (stockbook, clerk, manager) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();

    let damage = stockbook
        .ledger()
        .record_damage(&clerk, id, boxes(dec!(2)), "thawed")
        .unwrap();
    assert_eq!(damage.approval(), DamageApproval::Pending);
    assert_eq!(damage.loss_value(), dec!(100));
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(10)
    );
    assert_eq!(stockbook.ledger().list_pending_movements(&clerk).unwrap().len(), 1);

    let approved = stockbook.approvals().approve_damage(&manager, damage.id()).unwrap();
    assert_eq!(approved.approval(), DamageApproval::Approved);
    assert_eq!(approved.decided_by(), Some(manager.actor()));
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(8)
    );

    let movements = stockbook.ledger().list_movements(&clerk, Some(id)).unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].status(), MovementStatus::Completed);
    assert!(stockbook.ledger().list_pending_movements(&clerk).unwrap().is_empty());

    // A decided damage reports its state, even to the original reporter.
    let err = stockbook.approvals().approve_damage(&clerk, damage.id()).unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}

#[test]
fn damage_rejection_leaves_stock_alone() {
    let (stockbook, clerk, manager) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();

    let damage = stockbook
        .ledger()
        .record_damage(&clerk, id, boxes(dec!(2)), "thawed")
        .unwrap();
    let rejected = stockbook
        .approvals()
        .reject_damage(&manager, damage.id(), Some("boxes were fine"))
        .unwrap();
    assert_eq!(rejected.approval(), DamageApproval::Rejected);
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(10)
    );

    let movements = stockbook.ledger().list_movements(&clerk, Some(id)).unwrap();
    assert_eq!(movements[0].status(), MovementStatus::Rejected);
    assert_eq!(movements[0].rejection_reason(), Some("boxes were fine"));

    let err = stockbook
        .approvals()
        .approve_damage(&manager, damage.id())
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}

#[test]
fn damage_beyond_stock_is_refused_at_report_time() {
    let (stockbook, clerk, _) = setup();
    let product = create_fish(&stockbook, &clerk);

    let err = stockbook
        .ledger()
        .record_damage(&clerk, product.id_typed(), boxes(dec!(11)), "flood")
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let err = stockbook
        .ledger()
        .record_damage(&clerk, product.id_typed(), boxes(dec!(1)), "   ")
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn write_off_exceeding_stock_is_an_integrity_fault_and_rolls_back() {
    let (stockbook, clerk, manager) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();

    let damage = stockbook
        .ledger()
        .record_damage(&clerk, id, boxes(dec!(5)), "thawed")
        .unwrap();
    // Stock runs down while the damage waits for approval.
    stockbook
        .sales()
        .record_sale(&clerk, sale_of(&product, "Bakari", boxes(dec!(8)), dec!(560)))
        .unwrap();

    let err = stockbook
        .approvals()
        .approve_damage(&manager, damage.id())
        .unwrap_err();
    assert!(matches!(err, DomainError::IntegrityFault(_)));

    let damages = stockbook.ledger().list_damages(&clerk, Some(id)).unwrap();
    assert_eq!(damages[0].approval(), DamageApproval::Pending);
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(2)
    );
}

#[test]
fn approved_deletion_hides_the_product() {
    let (stockbook, clerk, manager) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();

    let request = stockbook
        .ledger()
        .request_delete(&clerk, id, "discontinued")
        .unwrap();
    assert_eq!(
        request.kind(),
        &MovementKind::ProductDelete {
            old_boxes: dec!(10)
        }
    );
    // Still live while pending.
    assert_eq!(stockbook.ledger().list_products(&clerk).unwrap().len(), 1);

    stockbook
        .approvals()
        .approve_deletion(&manager, request.id(), id)
        .unwrap();
    assert!(matches!(
        stockbook.ledger().get_product(&clerk, id),
        Err(DomainError::NotFound(_))
    ));
    assert!(stockbook.ledger().list_products(&clerk).unwrap().is_empty());

    let err = stockbook
        .ledger()
        .record_restock(&clerk, id, boxes(dec!(1)), Utc::now(), None)
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[test]
fn approvals_check_request_kind_and_product() {
    let (stockbook, clerk, manager) = setup();
    let fish = create_fish(&stockbook, &clerk);
    let other = create_fish(&stockbook, &clerk);

    let deletion = stockbook
        .ledger()
        .request_delete(&clerk, fish.id_typed(), "discontinued")
        .unwrap();
    let err = stockbook
        .approvals()
        .approve_edit(&manager, deletion.id(), fish.id_typed())
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let err = stockbook
        .approvals()
        .approve_deletion(&manager, deletion.id(), other.id_typed())
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let rejected = stockbook
        .approvals()
        .reject_deletion(&manager, deletion.id(), None)
        .unwrap();
    assert_eq!(rejected.status(), MovementStatus::Rejected);
    assert!(stockbook.ledger().get_product(&clerk, fish.id_typed()).is_ok());
}

#[test]
fn edit_without_changes_creates_no_requests() {
    let (stockbook, clerk, _) = setup();
    let product = create_fish(&stockbook, &clerk);

    let edits = stockbook
        .ledger()
        .request_edit(
            &clerk,
            product.id_typed(),
            EditRequest {
                name: Some("  Tilapia ".to_string()),
                price_per_box: Some(dec!(70)),
                ..Default::default()
            },
            None,
        )
        .unwrap();
    assert!(edits.is_empty());
    assert!(stockbook.ledger().list_pending_movements(&clerk).unwrap().is_empty());
}

#[test]
fn correction_requires_a_reason_and_keeps_stock_non_negative() {
    let (stockbook, clerk, _) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();

    let err = stockbook
        .ledger()
        .record_correction(&clerk, id, boxes(dec!(-1)), "")
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let err = stockbook
        .ledger()
        .record_correction(&clerk, id, boxes(dec!(-11)), "count")
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let movement = stockbook
        .ledger()
        .record_correction(&clerk, id, boxes(dec!(-1)), "recount")
        .unwrap();
    assert_eq!(movement.status(), MovementStatus::Completed);
    assert_eq!(movement.reason(), Some("recount"));
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(9)
    );
}

#[test]
fn general_report_reconciles_opening_to_closing() {
    let (stockbook, clerk, manager) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();

    stockbook
        .ledger()
        .record_restock(&clerk, id, boxes(dec!(5)), Utc::now(), None)
        .unwrap();
    stockbook
        .sales()
        .record_sale(&clerk, sale_of(&product, "Bakari", boxes(dec!(3)), dec!(100)))
        .unwrap();
    stockbook
        .ledger()
        .record_correction(&clerk, id, boxes(dec!(-1)), "recount")
        .unwrap();
    let damage = stockbook
        .ledger()
        .record_damage(&clerk, id, boxes(dec!(2)), "thawed")
        .unwrap();
    stockbook.approvals().approve_damage(&manager, damage.id()).unwrap();

    let report = stockbook
        .reports()
        .general_report(&clerk, window_around_now())
        .unwrap();
    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(row.opening, boxes(dec!(10)));
    assert_eq!(row.added, boxes(dec!(5)));
    assert_eq!(row.corrected, boxes(dec!(-1)));
    assert_eq!(row.sold, boxes(dec!(3)));
    assert_eq!(row.damaged, boxes(dec!(2)));
    assert_eq!(row.closing, boxes(dec!(9)));
    assert_eq!(
        row.opening + row.added + row.corrected - row.sold - row.damaged,
        row.closing
    );
    assert_eq!(row.sales_amount, dec!(210));
    assert_eq!(row.unpaid_quantity, boxes(dec!(3)));
    assert_eq!(row.unpaid_amount, dec!(110));
    assert_eq!(row.damage_amount, dec!(100));
    assert_eq!(row.pending_damage_amount, Decimal::ZERO);
    assert_eq!(row.profit, dec!(60));
}

#[test]
fn debtor_payment_is_spread_oldest_first() {
    let (stockbook, clerk, _) = setup();
    let product = create_fish(&stockbook, &clerk);
    let now = Utc::now();

    let first = stockbook
        .sales()
        .record_sale(
            &clerk,
            NewSale {
                box_price: Some(dec!(100)),
                sold_at: now - Duration::days(2),
                ..sale_of(&product, "Amina", boxes(dec!(1)), dec!(70))
            },
        )
        .unwrap();
    let second = stockbook
        .sales()
        .record_sale(
            &clerk,
            NewSale {
                box_price: Some(dec!(45.50)),
                sold_at: now - Duration::days(1),
                ..sale_of(&product, " amina ", boxes(dec!(1)), Decimal::ZERO)
            },
        )
        .unwrap();
    assert_eq!(first.client_id(), second.client_id());
    assert_eq!(first.payment_status(), PaymentStatus::Partial);
    assert_eq!(second.payment_status(), PaymentStatus::Pending);

    let debtors = stockbook.reports().debtor_report(&clerk).unwrap();
    assert_eq!(debtors.len(), 1);
    assert_eq!(debtors[0].amount_owed, dec!(75.50));
    assert_eq!(debtors[0].outstanding_sales, 2);

    let err = stockbook
        .sales()
        .process_debtor_payment(&clerk, first.client_id(), dec!(80), "cash")
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let receipt = stockbook
        .sales()
        .process_debtor_payment(&clerk, first.client_id(), dec!(50), "mobile money")
        .unwrap();
    assert_eq!(receipt.allocations.len(), 2);
    assert_eq!(receipt.allocations[0].sale_id, first.id());
    assert_eq!(receipt.allocations[0].amount, dec!(30));
    assert_eq!(receipt.allocations[1].amount, dec!(20));
    assert_eq!(receipt.allocations[1].remaining_amount, dec!(25.50));

    let first = stockbook.sales().get_sale(&clerk, first.id()).unwrap();
    assert_eq!(first.payment_status(), PaymentStatus::Completed);
    let debtors = stockbook.reports().debtor_report(&clerk).unwrap();
    assert_eq!(debtors[0].amount_owed, dec!(25.50));
    assert_eq!(stockbook.sales().list_payments(&clerk).unwrap().len(), 1);
}

#[test]
fn approved_sale_audits_move_stock() {
    let (stockbook, clerk, manager) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();

    let sale = stockbook
        .sales()
        .record_sale(&clerk, sale_of(&product, "Bakari", boxes(dec!(3)), Decimal::ZERO))
        .unwrap();

    let edit = stockbook
        .sales()
        .request_sale_edit(&clerk, sale.id(), boxes(dec!(5)), "miscounted")
        .unwrap();
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(7)
    );
    stockbook.sales().approve_audit(&manager, edit.id()).unwrap();
    let revised = stockbook.sales().get_sale(&clerk, sale.id()).unwrap();
    assert_eq!(revised.quantity(), boxes(dec!(5)));
    assert_eq!(revised.total_amount(), dec!(350));
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(5)
    );

    let delete = stockbook
        .sales()
        .request_sale_delete(&clerk, sale.id(), "duplicate entry")
        .unwrap();
    let approved = stockbook.sales().approve_audit(&manager, delete.id()).unwrap();
    assert_eq!(approved.status(), AuditStatus::Approved);
    assert!(matches!(
        stockbook.sales().get_sale(&clerk, sale.id()),
        Err(DomainError::NotFound(_))
    ));
    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(10)
    );
}

#[test]
fn sale_edit_below_amount_paid_is_refused() {
    let (stockbook, clerk, manager) = setup();
    let product = create_fish(&stockbook, &clerk);

    let sale = stockbook
        .sales()
        .record_sale(&clerk, sale_of(&product, "Bakari", boxes(dec!(3)), dec!(210)))
        .unwrap();
    let err = stockbook
        .sales()
        .request_sale_edit(&clerk, sale.id(), boxes(dec!(2)), "returned one")
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let edit = stockbook
        .sales()
        .request_sale_delete(&clerk, sale.id(), "test entry")
        .unwrap();
    let rejected = stockbook
        .sales()
        .reject_audit(&manager, edit.id(), Some("keep it"))
        .unwrap();
    assert_eq!(rejected.status(), AuditStatus::Rejected);
    assert!(stockbook.sales().list_audits(&clerk, true).unwrap().is_empty());
    assert!(stockbook.sales().get_sale(&clerk, sale.id()).is_ok());
}

#[test]
fn accounts_are_isolated() {
    let (stockbook, clerk, _) = setup();
    let product = create_fish(&stockbook, &clerk);
    let outsider = Scope::new(AccountId::new(), UserId::new());

    assert!(matches!(
        stockbook.ledger().get_product(&outsider, product.id_typed()),
        Err(DomainError::NotFound(_))
    ));
    assert!(matches!(
        stockbook
            .ledger()
            .record_restock(&outsider, product.id_typed(), boxes(dec!(1)), Utc::now(), None),
        Err(DomainError::NotFound(_))
    ));
    assert!(stockbook.ledger().list_products(&outsider).unwrap().is_empty());
    assert!(stockbook.reports().debtor_report(&outsider).unwrap().is_empty());
}

#[test]
fn committed_events_are_published_in_sequence() {
    let (stockbook, clerk, _) = setup();
    let events = stockbook.subscribe();

    let product = create_fish(&stockbook, &clerk);
    stockbook
        .ledger()
        .record_restock(&clerk, product.id_typed(), boxes(dec!(5)), Utc::now(), None)
        .unwrap();
    stockbook
        .sales()
        .record_sale(&clerk, sale_of(&product, "Bakari", boxes(dec!(1)), dec!(70)))
        .unwrap();

    let published = events.drain();
    let sequence: Vec<u64> = published.iter().map(|e| e.sequence_number()).collect();
    assert_eq!(sequence, vec![1, 2, 3, 4]);
    assert!(published.iter().all(|e| e.account_id() == clerk.account_id()));

    let types: Vec<&str> = published
        .iter()
        .filter_map(|e| e.payload()["event_type"].as_str())
        .collect();
    assert_eq!(
        types,
        vec![
            "inventory.product.created",
            "inventory.product.stock_received",
            "inventory.product.stock_sold",
            "sales.sale.recorded",
        ]
    );
    assert_eq!(published[3].aggregate_type(), "sales.sale");
}

#[test]
fn failed_operations_publish_nothing_and_change_nothing() {
    let (stockbook, clerk, _) = setup();
    let product = create_fish(&stockbook, &clerk);
    let events = stockbook.subscribe();

    let err = stockbook
        .sales()
        .record_sale(&clerk, sale_of(&product, "Bakari", boxes(dec!(11)), Decimal::ZERO))
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    assert!(events.drain().is_empty());
    assert!(stockbook.sales().list_sales(&clerk, None).unwrap().is_empty());
    assert_eq!(
        stockbook
            .ledger()
            .get_product(&clerk, product.id_typed())
            .unwrap()
            .quantity_box(),
        dec!(10)
    );

    // The next commit continues the account sequence without a gap.
    stockbook
        .ledger()
        .record_restock(&clerk, product.id_typed(), boxes(dec!(1)), Utc::now(), None)
        .unwrap();
    let published = events.drain();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].sequence_number(), 2);
}

#[test]
fn concurrent_restocks_are_all_counted() {
    let (stockbook, clerk, _) = setup();
    let product = create_fish(&stockbook, &clerk);
    let id = product.id_typed();
    let stockbook = Arc::new(stockbook);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let stockbook = stockbook.clone();
            std::thread::spawn(move || {
                for _ in 0..10 {
                    stockbook
                        .ledger()
                        .record_restock(&clerk, id, boxes(dec!(1)), Utc::now(), None)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
        dec!(90)
    );
    assert_eq!(stockbook.ledger().list_restocks(&clerk, Some(id)).unwrap().len(), 80);
}

#[test]
fn profit_and_loss_uses_configured_top_products() {
    let stockbook = InMemoryStockbook::in_memory(LedgerConfig::default().with_top_products(1));
    let account_id = AccountId::new();
    let clerk = Scope::new(account_id, UserId::new());
    let fish = create_fish(&stockbook, &clerk);
    let other = create_fish(&stockbook, &clerk);

    stockbook
        .sales()
        .record_sale(&clerk, sale_of(&fish, "Bakari", boxes(dec!(2)), dec!(140)))
        .unwrap();
    stockbook
        .sales()
        .record_sale(&clerk, sale_of(&other, "Bakari", boxes(dec!(1)), dec!(70)))
        .unwrap();
    stockbook
        .sales()
        .record_expense(&clerk, "transport", "truck hire", dec!(30), "cash", Utc::now())
        .unwrap();

    let report = stockbook
        .reports()
        .profit_loss(&clerk, window_around_now())
        .unwrap();
    assert_eq!(report.revenue, dec!(210));
    assert_eq!(report.expenses, dec!(30));
    assert_eq!(report.top_products.len(), 1);
    assert_eq!(report.top_products[0].product_id, fish.id_typed());
}

#[test]
fn low_stock_uses_configured_default_threshold() {
    let stockbook =
        InMemoryStockbook::in_memory(LedgerConfig::default().with_low_stock_threshold(dec!(12)));
    let clerk = Scope::new(AccountId::new(), UserId::new());
    create_fish(&stockbook, &clerk);

    let rows = stockbook.reports().low_stock(&clerk).unwrap();
    assert_eq!(rows.len(), 1);
}

mod proptest_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn restocks_add_exactly_their_quantity(amounts in proptest::collection::vec(1u32..500, 1..8)) {
            let (stockbook, clerk, _) = setup();
            let product = create_fish(&stockbook, &clerk);
            let id = product.id_typed();

            let mut expected = dec!(10);
            for amount in &amounts {
                let quantity = boxes(Decimal::from(*amount));
                stockbook
                    .ledger()
                    .record_restock(&clerk, id, quantity, Utc::now(), None)
                    .unwrap();
                expected += Decimal::from(*amount);
                prop_assert_eq!(
                    stockbook.ledger().get_product(&clerk, id).unwrap().quantity_box(),
                    expected
                );
            }
            prop_assert_eq!(
                stockbook.ledger().list_movements(&clerk, Some(id)).unwrap().len(),
                amounts.len()
            );
        }

        #[test]
        fn edit_requests_one_movement_per_changed_field(
            rename in any::<bool>(),
            ratio in any::<bool>(),
            cost in any::<bool>(),
            price in any::<bool>(),
        ) {
            let (stockbook, clerk, manager) = setup();
            let product = create_fish(&stockbook, &clerk);
            let id = product.id_typed();

            let request = EditRequest {
                name: rename.then(|| "Catfish".to_string()),
                box_to_kg_ratio: ratio.then_some(dec!(25)),
                cost_per_box: cost.then_some(dec!(55)),
                price_per_box: price.then_some(dec!(90)),
            };
            let expected = [rename, ratio, cost, price].iter().filter(|b| **b).count();

            let edits = stockbook.ledger().request_edit(&clerk, id, request, None).unwrap();
            prop_assert_eq!(edits.len(), expected);
            prop_assert_eq!(&stockbook.ledger().get_product(&clerk, id).unwrap(), &product);

            for (approved, edit) in edits.iter().enumerate() {
                stockbook.approvals().approve_edit(&manager, edit.id(), id).unwrap();
                prop_assert_eq!(
                    stockbook.ledger().list_pending_movements(&clerk).unwrap().len(),
                    expected - approved - 1
                );
            }
            let updated = stockbook.ledger().get_product(&clerk, id).unwrap();
            prop_assert_eq!(updated.name(), if rename { "Catfish" } else { "Tilapia" });
            prop_assert_eq!(updated.box_to_kg_ratio(), if ratio { dec!(25) } else { dec!(20) });
            prop_assert_eq!(updated.pricing().cost_per_box, if cost { dec!(55) } else { dec!(50) });
            prop_assert_eq!(updated.pricing().price_per_box, if price { dec!(90) } else { dec!(70) });
            prop_assert_eq!(updated.quantity_box(), dec!(10));

            let fields: Vec<ProductField> = edits
                .iter()
                .filter_map(|m| match m.kind() {
                    MovementKind::ProductEdit { change } => Some(change.field()),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(fields.len(), expected);
        }
    }
}
