use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tracing::{info, instrument, warn};

use stockbook_core::{DomainError, DomainResult, Quantity, Scope};
use stockbook_events::{EventBus, EventEnvelope};
use stockbook_inventory::{ProductCommand, ReturnStock, SellStock};
use stockbook_sales::{
    AuditChange, AuditId, AuditStatus, ClientId, Deposit, Expense, NewSale, PaymentApplied,
    PaymentReceipt, Sale, SaleAudit, SaleDeleted, SaleEvent, SaleId, SaleRecorded, SaleRevised,
    plan_allocation,
};

use super::{ensure_distinct_approver, optional_text, required_text};
use crate::config::LedgerConfig;
use crate::dispatcher::LedgerDispatcher;
use crate::store::{AccountBook, LedgerStore};

/// Sales, debtor payments, sale audits and the cash book.
#[derive(Debug)]
pub struct SalesBook<S, B> {
    dispatcher: Arc<LedgerDispatcher<S, B>>,
    config: LedgerConfig,
}

impl<S, B> Clone for SalesBook<S, B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            config: self.config.clone(),
        }
    }
}

/// Move `quantity` between the shelf and a sale: positive parts leave stock,
/// negative parts come back. Boxes and kilograms may move in opposite
/// directions.
fn shift_stock(
    book: &mut AccountBook,
    scope: &Scope,
    sale: &Sale,
    delta: Quantity,
    at: DateTime<Utc>,
) -> DomainResult<()> {
    let outgoing = Quantity::new(delta.boxes.max(Decimal::ZERO), delta.kg.max(Decimal::ZERO));
    let incoming = Quantity::new(
        (-delta.boxes).max(Decimal::ZERO),
        (-delta.kg).max(Decimal::ZERO),
    );
    let product_id = sale.product_id();

    if !outgoing.is_zero() {
        book.execute_product(
            product_id,
            ProductCommand::SellStock(SellStock {
                account_id: scope.account_id(),
                product_id,
                quantity: outgoing,
                occurred_at: at,
            }),
        )?;
    }
    if !incoming.is_zero() {
        book.execute_product(
            product_id,
            ProductCommand::ReturnStock(ReturnStock {
                account_id: scope.account_id(),
                product_id,
                quantity: incoming,
                occurred_at: at,
            }),
        )?;
    }
    Ok(())
}

impl<S, B> SalesBook<S, B>
where
    S: LedgerStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: Arc<LedgerDispatcher<S, B>>, config: LedgerConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Price the sale at the product's current pricing, take the stock and
    /// register the client if the name is new.
    #[instrument(skip(self, scope, input), fields(account_id = %scope.account_id(), product_id = %input.product_id), err)]
    pub fn record_sale(&self, scope: &Scope, input: NewSale) -> DomainResult<Sale> {
        let sale = self.dispatcher.execute(scope, |book| {
            let pricing = *book.product(input.product_id)?.pricing();
            let client_id = book.resolve_client(input.client_id, &input.client_name);
            let sale = Sale::record(
                SaleId::new(),
                scope.account_id(),
                client_id,
                &input,
                &pricing,
                scope.actor(),
            )?;

            let now = Utc::now();
            book.execute_product(
                input.product_id,
                ProductCommand::SellStock(SellStock {
                    account_id: scope.account_id(),
                    product_id: input.product_id,
                    quantity: sale.quantity(),
                    occurred_at: now,
                }),
            )?;
            book.stage_sale_event(SaleEvent::SaleRecorded(SaleRecorded {
                account_id: scope.account_id(),
                sale_id: sale.id(),
                product_id: sale.product_id(),
                client_id,
                quantity: sale.quantity(),
                total_amount: sale.total_amount(),
                occurred_at: now,
            }));
            book.insert_sale(sale).cloned()
        })?;

        info!(
            sale_id = %sale.id(),
            total = %sale.total_amount(),
            status = sale.payment_status().as_str(),
            "sale recorded"
        );
        Ok(sale)
    }

    pub fn get_sale(&self, scope: &Scope, sale_id: SaleId) -> DomainResult<Sale> {
        self.dispatcher
            .query(scope, |book| book.sale(sale_id).cloned())?
    }

    /// Sales, newest first, optionally for one client.
    pub fn list_sales(&self, scope: &Scope, client_id: Option<ClientId>) -> DomainResult<Vec<Sale>> {
        let mut sales = self.dispatcher.query(scope, |book| {
            book.sales()
                .filter(|s| client_id.is_none_or(|id| s.client_id() == id))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        sales.sort_by(|a, b| b.sold_at().cmp(&a.sold_at()).then(b.id().cmp(&a.id())));
        Ok(sales)
    }

    /// Spread a debtor's payment over their outstanding sales, oldest first.
    #[instrument(skip(self, scope), fields(account_id = %scope.account_id(), client_id = %client_id), err)]
    pub fn process_debtor_payment(
        &self,
        scope: &Scope,
        client_id: ClientId,
        amount: Decimal,
        payment_method: &str,
    ) -> DomainResult<PaymentReceipt> {
        let receipt = self.dispatcher.execute(scope, |book| {
            let payment_method = required_text("payment method", payment_method)?;
            let allocations = plan_allocation(client_id, book.sales(), amount)?;

            let now = Utc::now();
            for allocation in &allocations {
                book.sale_mut(allocation.sale_id)?
                    .apply_payment(allocation.amount)?;
                book.stage_sale_event(SaleEvent::PaymentApplied(PaymentApplied {
                    account_id: scope.account_id(),
                    sale_id: allocation.sale_id,
                    amount: allocation.amount,
                    remaining_amount: allocation.remaining_amount,
                    occurred_at: now,
                }));
            }

            let receipt = PaymentReceipt {
                account_id: scope.account_id(),
                client_id,
                amount,
                payment_method,
                allocations,
                received_by: scope.actor(),
                received_at: now,
            };
            book.push_payment(receipt.clone())?;
            Ok(receipt)
        })?;

        info!(
            amount = %receipt.amount,
            sales = receipt.allocations.len(),
            "debtor payment applied"
        );
        Ok(receipt)
    }

    /// Payments received, newest first.
    pub fn list_payments(&self, scope: &Scope) -> DomainResult<Vec<PaymentReceipt>> {
        self.dispatcher
            .query(scope, |book| book.payments().iter().rev().cloned().collect())
    }

    /// Ask for a sale's quantity to be changed. Nothing moves until the
    /// audit is approved.
    #[instrument(skip(self, scope, reason), fields(account_id = %scope.account_id(), sale_id = %sale_id), err)]
    pub fn request_sale_edit(
        &self,
        scope: &Scope,
        sale_id: SaleId,
        quantity: Quantity,
        reason: &str,
    ) -> DomainResult<SaleAudit> {
        let audit = self.dispatcher.execute(scope, |book| {
            let sale = book.sale(sale_id)?;
            sale.check_revision(quantity)?;
            if sale.quantity() == quantity {
                return Err(DomainError::validation("sale edit does not change the quantity"));
            }
            let change = AuditChange::Edit {
                before: sale.quantity(),
                after: quantity,
            };
            let audit = SaleAudit::request(
                scope.account_id(),
                sale_id,
                change,
                reason,
                scope.actor(),
                Utc::now(),
            )?;
            book.insert_audit(audit.clone())?;
            Ok(audit)
        })?;

        info!(audit_id = %audit.id(), "sale edit requested");
        Ok(audit)
    }

    #[instrument(skip(self, scope, reason), fields(account_id = %scope.account_id(), sale_id = %sale_id), err)]
    pub fn request_sale_delete(
        &self,
        scope: &Scope,
        sale_id: SaleId,
        reason: &str,
    ) -> DomainResult<SaleAudit> {
        let audit = self.dispatcher.execute(scope, |book| {
            let before = book.sale(sale_id)?.quantity();
            let audit = SaleAudit::request(
                scope.account_id(),
                sale_id,
                AuditChange::Delete { before },
                reason,
                scope.actor(),
                Utc::now(),
            )?;
            book.insert_audit(audit.clone())?;
            Ok(audit)
        })?;

        info!(audit_id = %audit.id(), "sale deletion requested");
        Ok(audit)
    }

    /// Apply a sale audit. Stock follows the quantity: a larger sale takes
    /// more from the shelf, a smaller or deleted one puts it back.
    #[instrument(skip(self, scope), fields(account_id = %scope.account_id(), audit_id = %audit_id), err)]
    pub fn approve_audit(&self, scope: &Scope, audit_id: AuditId) -> DomainResult<SaleAudit> {
        let audit = self.dispatcher.execute(scope, |book| {
            let audit = book.audit(audit_id)?;
            ensure_distinct_approver(&self.config, scope, audit.requested_by())?;
            let sale_id = audit.sale_id();
            let change = audit.change();

            let now = Utc::now();
            book.audit_mut(audit_id)?.approve(scope.actor(), now)?;
            let sale = book.sale(sale_id)?.clone();
            book.product(sale.product_id())?;

            match change {
                AuditChange::Edit { before, after } => {
                    if sale.quantity() != before {
                        return Err(DomainError::invalid_state(format!(
                            "sale {sale_id} changed since the edit was requested"
                        )));
                    }
                    book.sale_mut(sale_id)?.revise_quantity(after)?;
                    shift_stock(book, scope, &sale, after - before, now)?;
                    book.stage_sale_event(SaleEvent::SaleRevised(SaleRevised {
                        account_id: scope.account_id(),
                        sale_id,
                        before,
                        after,
                        occurred_at: now,
                    }));
                }
                AuditChange::Delete { .. } => {
                    let removed = book.remove_sale(sale_id)?;
                    shift_stock(book, scope, &sale, Quantity::ZERO - removed.quantity(), now)?;
                    book.stage_sale_event(SaleEvent::SaleDeleted(SaleDeleted {
                        account_id: scope.account_id(),
                        sale_id,
                        returned: removed.quantity(),
                        occurred_at: now,
                    }));
                }
            }
            book.audit(audit_id).cloned()
        })?;

        info!(change = audit.change().as_str(), "sale audit approved");
        Ok(audit)
    }

    #[instrument(skip(self, scope, reason), fields(account_id = %scope.account_id(), audit_id = %audit_id), err)]
    pub fn reject_audit(
        &self,
        scope: &Scope,
        audit_id: AuditId,
        reason: Option<&str>,
    ) -> DomainResult<SaleAudit> {
        let audit = self.dispatcher.execute(scope, |book| {
            let audit = book.audit_mut(audit_id)?;
            audit.reject(scope.actor(), Utc::now(), optional_text(reason))?;
            Ok(audit.clone())
        })?;

        warn!(change = audit.change().as_str(), "sale audit rejected");
        Ok(audit)
    }

    /// Audits, oldest first; pending ones only when `pending_only` is set.
    pub fn list_audits(&self, scope: &Scope, pending_only: bool) -> DomainResult<Vec<SaleAudit>> {
        self.dispatcher.query(scope, |book| {
            book.audits()
                .filter(|a| !pending_only || a.status() == AuditStatus::Pending)
                .cloned()
                .collect()
        })
    }

    #[instrument(skip(self, scope, description), fields(account_id = %scope.account_id()), err)]
    pub fn record_expense(
        &self,
        scope: &Scope,
        category: &str,
        description: &str,
        amount: Decimal,
        payment_method: &str,
        spent_at: DateTime<Utc>,
    ) -> DomainResult<Expense> {
        let expense = self.dispatcher.execute(scope, |book| {
            let expense = Expense::new(
                scope.account_id(),
                category,
                description,
                amount,
                payment_method,
                spent_at,
                scope.actor(),
            )?;
            book.push_expense(expense.clone())?;
            Ok(expense)
        })?;

        info!(category = %expense.category, amount = %expense.amount, "expense recorded");
        Ok(expense)
    }

    #[instrument(skip(self, scope, description), fields(account_id = %scope.account_id()), err)]
    pub fn record_deposit(
        &self,
        scope: &Scope,
        amount: Decimal,
        description: &str,
        deposited_at: DateTime<Utc>,
    ) -> DomainResult<Deposit> {
        let deposit = self.dispatcher.execute(scope, |book| {
            let deposit = Deposit::new(
                scope.account_id(),
                amount,
                description,
                deposited_at,
                scope.actor(),
            )?;
            book.push_deposit(deposit.clone())?;
            Ok(deposit)
        })?;

        info!(amount = %deposit.amount, "deposit recorded");
        Ok(deposit)
    }

    pub fn list_expenses(&self, scope: &Scope) -> DomainResult<Vec<Expense>> {
        self.dispatcher
            .query(scope, |book| book.expenses().iter().rev().cloned().collect())
    }

    pub fn list_deposits(&self, scope: &Scope) -> DomainResult<Vec<Deposit>> {
        self.dispatcher
            .query(scope, |book| book.deposits().iter().rev().cloned().collect())
    }
}
