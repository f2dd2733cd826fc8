use std::collections::BTreeMap;

use uuid::Uuid;

use stockbook_core::{
    AccountId, AccountOwned, Aggregate, AggregateId, DomainError, DomainResult,
};
use stockbook_events::EventEnvelope;
use stockbook_inventory::{
    CreateProduct, DamageId, DamageRecord, Movement, MovementId, Product, ProductCommand,
    ProductEvent, ProductId, RestockId, RestockRecord,
};
use stockbook_reporting::ReportInput;
use stockbook_sales::{
    AuditId, ClientId, Deposit, Expense, PaymentReceipt, Sale, SaleAudit, SaleEvent, SaleId,
};

use crate::events::{LedgerEvent, PRODUCT_AGGREGATE, SALE_AGGREGATE};

/// Everything one business account owns.
///
/// Services mutate a book only inside a store transaction; events staged in
/// the outbox are handed back on commit and dropped on rollback.
#[derive(Debug, Clone)]
pub struct AccountBook {
    account_id: AccountId,
    products: BTreeMap<ProductId, Product>,
    movements: BTreeMap<MovementId, Movement>,
    restocks: BTreeMap<RestockId, RestockRecord>,
    damages: BTreeMap<DamageId, DamageRecord>,
    sales: BTreeMap<SaleId, Sale>,
    audits: BTreeMap<AuditId, SaleAudit>,
    expenses: Vec<Expense>,
    deposits: Vec<Deposit>,
    payments: Vec<PaymentReceipt>,
    clients: BTreeMap<String, ClientId>,
    next_sequence: u64,
    outbox: Vec<EventEnvelope<LedgerEvent>>,
}

impl AccountBook {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            products: BTreeMap::new(),
            movements: BTreeMap::new(),
            restocks: BTreeMap::new(),
            damages: BTreeMap::new(),
            sales: BTreeMap::new(),
            audits: BTreeMap::new(),
            expenses: Vec::new(),
            deposits: Vec::new(),
            payments: Vec::new(),
            clients: BTreeMap::new(),
            next_sequence: 1,
            outbox: Vec::new(),
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    fn owned<'a, R: AccountOwned>(&self, record: &'a R) -> DomainResult<&'a R> {
        if record.account_id() != self.account_id {
            return Err(DomainError::unauthorized("record belongs to another account"));
        }
        Ok(record)
    }

    // ---- products ----

    /// A live product. Removed products are reported as not found.
    pub fn product(&self, id: ProductId) -> DomainResult<&Product> {
        let product = self
            .products
            .get(&id)
            .filter(|p| p.is_live())
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))?;
        if product.account_id() != Some(self.account_id) {
            return Err(DomainError::unauthorized("product belongs to another account"));
        }
        Ok(product)
    }

    pub fn live_products(&self) -> impl Iterator<Item = &Product> {
        self.products.values().filter(|p| p.is_live())
    }

    pub fn create_product(&mut self, command: CreateProduct) -> DomainResult<&Product> {
        if command.account_id != self.account_id {
            return Err(DomainError::unauthorized("product belongs to another account"));
        }
        let product_id = command.product_id;
        if self.products.contains_key(&product_id) {
            return Err(DomainError::invalid_state(format!(
                "product {product_id} already exists"
            )));
        }
        let mut product = Product::empty(product_id);
        let events = product.execute(&ProductCommand::CreateProduct(command))?;
        self.products.insert(product_id, product);
        self.stage_product_events(product_id, events);
        self.product(product_id)
    }

    /// Run a command against a stored product and stage its events.
    pub fn execute_product(
        &mut self,
        product_id: ProductId,
        command: ProductCommand,
    ) -> DomainResult<Vec<ProductEvent>> {
        let product = self
            .products
            .get_mut(&product_id)
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;
        let events = product.execute(&command)?;
        self.stage_product_events(product_id, events.clone());
        Ok(events)
    }

    fn stage_product_events(&mut self, product_id: ProductId, events: Vec<ProductEvent>) {
        for event in events {
            self.stage(product_id.0, PRODUCT_AGGREGATE, LedgerEvent::Product(event));
        }
    }

    // ---- ledger records ----

    pub fn movement(&self, id: MovementId) -> DomainResult<&Movement> {
        let movement = self
            .movements
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("movement {id}")))?;
        self.owned(movement)
    }

    pub fn movement_mut(&mut self, id: MovementId) -> DomainResult<&mut Movement> {
        self.movement(id)?;
        self.movements
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("movement {id}")))
    }

    pub fn movements(&self) -> impl DoubleEndedIterator<Item = &Movement> {
        self.movements.values()
    }

    pub fn insert_movement(&mut self, movement: Movement) -> DomainResult<&Movement> {
        self.owned(&movement)?;
        let id = movement.id();
        self.movements.insert(id, movement);
        self.movement(id)
    }

    pub fn restocks(&self) -> impl DoubleEndedIterator<Item = &RestockRecord> {
        self.restocks.values()
    }

    pub fn insert_restock(&mut self, restock: RestockRecord) -> DomainResult<()> {
        self.owned(&restock)?;
        self.restocks.insert(restock.id, restock);
        Ok(())
    }

    pub fn damage(&self, id: DamageId) -> DomainResult<&DamageRecord> {
        let damage = self
            .damages
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("damage {id}")))?;
        self.owned(damage)
    }

    pub fn damage_mut(&mut self, id: DamageId) -> DomainResult<&mut DamageRecord> {
        self.damage(id)?;
        self.damages
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("damage {id}")))
    }

    pub fn damages(&self) -> impl DoubleEndedIterator<Item = &DamageRecord> {
        self.damages.values()
    }

    pub fn insert_damage(&mut self, damage: DamageRecord) -> DomainResult<()> {
        self.owned(&damage)?;
        self.damages.insert(damage.id(), damage);
        Ok(())
    }

    // ---- sales ----

    pub fn sale(&self, id: SaleId) -> DomainResult<&Sale> {
        let sale = self
            .sales
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("sale {id}")))?;
        self.owned(sale)
    }

    pub fn sale_mut(&mut self, id: SaleId) -> DomainResult<&mut Sale> {
        self.sale(id)?;
        self.sales
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("sale {id}")))
    }

    pub fn sales(&self) -> impl DoubleEndedIterator<Item = &Sale> {
        self.sales.values()
    }

    pub fn insert_sale(&mut self, sale: Sale) -> DomainResult<&Sale> {
        self.owned(&sale)?;
        let id = sale.id();
        self.sales.insert(id, sale);
        self.sale(id)
    }

    pub fn remove_sale(&mut self, id: SaleId) -> DomainResult<Sale> {
        self.sale(id)?;
        self.sales
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("sale {id}")))
    }

    /// Reuse the id of a known client name, or register a new client.
    ///
    /// Names match case-insensitively after trimming. An explicit id wins and
    /// is remembered for the name.
    pub fn resolve_client(&mut self, client_id: Option<ClientId>, name: &str) -> ClientId {
        let key = name.trim().to_lowercase();
        match client_id {
            Some(id) => {
                self.clients.entry(key).or_insert(id);
                id
            }
            None => *self.clients.entry(key).or_insert_with(ClientId::new),
        }
    }

    pub fn audit(&self, id: AuditId) -> DomainResult<&SaleAudit> {
        let audit = self
            .audits
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("audit {id}")))?;
        self.owned(audit)
    }

    pub fn audit_mut(&mut self, id: AuditId) -> DomainResult<&mut SaleAudit> {
        self.audit(id)?;
        self.audits
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("audit {id}")))
    }

    pub fn audits(&self) -> impl DoubleEndedIterator<Item = &SaleAudit> {
        self.audits.values()
    }

    pub fn insert_audit(&mut self, audit: SaleAudit) -> DomainResult<()> {
        self.owned(&audit)?;
        self.audits.insert(audit.id(), audit);
        Ok(())
    }

    pub fn stage_sale_event(&mut self, event: SaleEvent) {
        let sale_id = event.sale_id();
        self.stage(
            AggregateId::from_uuid(Uuid::from(sale_id)),
            SALE_AGGREGATE,
            LedgerEvent::Sale(event),
        );
    }

    // ---- cash ----

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn push_expense(&mut self, expense: Expense) -> DomainResult<()> {
        self.owned(&expense)?;
        self.expenses.push(expense);
        Ok(())
    }

    pub fn deposits(&self) -> &[Deposit] {
        &self.deposits
    }

    pub fn push_deposit(&mut self, deposit: Deposit) -> DomainResult<()> {
        self.owned(&deposit)?;
        self.deposits.push(deposit);
        Ok(())
    }

    pub fn payments(&self) -> &[PaymentReceipt] {
        &self.payments
    }

    pub fn push_payment(&mut self, receipt: PaymentReceipt) -> DomainResult<()> {
        self.owned(&receipt)?;
        self.payments.push(receipt);
        Ok(())
    }

    // ---- outbox ----

    fn stage(
        &mut self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        event: LedgerEvent,
    ) {
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            self.account_id,
            aggregate_id,
            aggregate_type,
            self.next_sequence,
            event,
        );
        self.next_sequence += 1;
        self.outbox.push(envelope);
    }

    pub(crate) fn take_outbox(&mut self) -> Vec<EventEnvelope<LedgerEvent>> {
        std::mem::take(&mut self.outbox)
    }

    /// Owned copy of the facts the reports read.
    pub fn report_data(&self) -> ReportData {
        ReportData {
            products: self.products.values().cloned().collect(),
            movements: self.movements.values().cloned().collect(),
            restocks: self.restocks.values().cloned().collect(),
            damages: self.damages.values().cloned().collect(),
            sales: self.sales.values().cloned().collect(),
            expenses: self.expenses.clone(),
            deposits: self.deposits.clone(),
        }
    }
}

/// Snapshot of an account's facts, detached from the store lock.
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub products: Vec<Product>,
    pub movements: Vec<Movement>,
    pub restocks: Vec<RestockRecord>,
    pub damages: Vec<DamageRecord>,
    pub sales: Vec<Sale>,
    pub expenses: Vec<Expense>,
    pub deposits: Vec<Deposit>,
}

impl ReportData {
    pub fn input(&self) -> ReportInput<'_> {
        ReportInput {
            products: &self.products,
            movements: &self.movements,
            restocks: &self.restocks,
            damages: &self.damages,
            sales: &self.sales,
            expenses: &self.expenses,
            deposits: &self.deposits,
        }
    }
}
