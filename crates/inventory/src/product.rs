use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{
    AccountId, Aggregate, AggregateId, AggregateRoot, DomainError, Quantity, impl_uuid_newtype,
};
use stockbook_events::Event;

/// Product identifier (account-scoped via `account_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Product category reference (categories themselves live in the catalog UI).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(uuid::Uuid);

impl_uuid_newtype!(CategoryId, "CategoryId");

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Whole days from `now` until `expiry`, rounded up (negative once expired).
pub fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expiry - now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

/// Per-unit cost and selling price. Kilogram prices derive from box prices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub cost_per_box: Decimal,
    pub cost_per_kg: Decimal,
    pub price_per_box: Decimal,
    pub price_per_kg: Decimal,
}

impl Pricing {
    /// Derive kilogram prices from box prices through the box-to-kg ratio.
    pub fn from_box_prices(cost_per_box: Decimal, price_per_box: Decimal, ratio: Decimal) -> Self {
        Self {
            cost_per_box,
            cost_per_kg: per_kg(cost_per_box, ratio),
            price_per_box,
            price_per_kg: per_kg(price_per_box, ratio),
        }
    }

    pub fn profit_per_box(&self) -> Decimal {
        self.price_per_box - self.cost_per_box
    }

    pub fn profit_per_kg(&self) -> Decimal {
        self.price_per_kg - self.cost_per_kg
    }

    /// Value of `quantity` at current cost.
    pub fn cost_of(&self, quantity: Quantity) -> Decimal {
        quantity.valued_at(self.cost_per_box, self.cost_per_kg)
    }
}

fn per_kg(per_box: Decimal, ratio: Decimal) -> Decimal {
    if ratio.is_zero() {
        return Decimal::ZERO;
    }
    (per_box / ratio).round_dp(4)
}

/// Product attributes that can only change through an approved edit request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Name,
    BoxToKgRatio,
    CostPerBox,
    PricePerBox,
}

impl ProductField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::BoxToKgRatio => "box_to_kg_ratio",
            ProductField::CostPerBox => "cost_per_box",
            ProductField::PricePerBox => "price_per_box",
        }
    }
}

/// One field-level change: the value before the request and the requested value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldChange {
    Name { old: String, new: String },
    BoxToKgRatio { old: Decimal, new: Decimal },
    CostPerBox { old: Decimal, new: Decimal },
    PricePerBox { old: Decimal, new: Decimal },
}

impl FieldChange {
    pub fn field(&self) -> ProductField {
        match self {
            FieldChange::Name { .. } => ProductField::Name,
            FieldChange::BoxToKgRatio { .. } => ProductField::BoxToKgRatio,
            FieldChange::CostPerBox { .. } => ProductField::CostPerBox,
            FieldChange::PricePerBox { .. } => ProductField::PricePerBox,
        }
    }

    /// Old value rendered for display in movement listings.
    pub fn old_display(&self) -> String {
        match self {
            FieldChange::Name { old, .. } => old.clone(),
            FieldChange::BoxToKgRatio { old, .. }
            | FieldChange::CostPerBox { old, .. }
            | FieldChange::PricePerBox { old, .. } => old.to_string(),
        }
    }

    pub fn new_display(&self) -> String {
        match self {
            FieldChange::Name { new, .. } => new.clone(),
            FieldChange::BoxToKgRatio { new, .. }
            | FieldChange::CostPerBox { new, .. }
            | FieldChange::PricePerBox { new, .. } => new.to_string(),
        }
    }
}

/// Requested values for the editable fields; `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub name: Option<String>,
    pub box_to_kg_ratio: Option<Decimal>,
    pub cost_per_box: Option<Decimal>,
    pub price_per_box: Option<Decimal>,
}

/// Aggregate root: Product (the live stock snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    account_id: Option<AccountId>,
    name: String,
    category_id: Option<CategoryId>,
    stock: Quantity,
    box_to_kg_ratio: Decimal,
    pricing: Pricing,
    low_stock_threshold: Option<Decimal>,
    expiry_date: Option<DateTime<Utc>>,
    days_left: Option<i64>,
    removed_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            account_id: None,
            name: String::new(),
            category_id: None,
            stock: Quantity::ZERO,
            box_to_kg_ratio: Decimal::ONE,
            pricing: Pricing::from_box_prices(Decimal::ZERO, Decimal::ZERO, Decimal::ONE),
            low_stock_threshold: None,
            expiry_date: None,
            days_left: None,
            removed_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn account_id(&self) -> Option<AccountId> {
        self.account_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn stock(&self) -> Quantity {
        self.stock
    }

    pub fn quantity_box(&self) -> Decimal {
        self.stock.boxes
    }

    pub fn quantity_kg(&self) -> Decimal {
        self.stock.kg
    }

    pub fn box_to_kg_ratio(&self) -> Decimal {
        self.box_to_kg_ratio
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    pub fn low_stock_threshold(&self) -> Option<Decimal> {
        self.low_stock_threshold
    }

    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }

    /// Days left until expiry as of the last stock-affecting event.
    pub fn days_left(&self) -> Option<i64> {
        self.days_left
    }

    pub fn removed_at(&self) -> Option<DateTime<Utc>> {
        self.removed_at
    }

    /// Live products: created and not removed by an approved deletion.
    pub fn is_live(&self) -> bool {
        self.created && self.removed_at.is_none()
    }

    /// Field changes an edit request would make; unchanged values are skipped.
    pub fn diff(&self, request: &EditRequest) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        if let Some(name) = &request.name {
            let name = name.trim();
            if name != self.name {
                changes.push(FieldChange::Name {
                    old: self.name.clone(),
                    new: name.to_string(),
                });
            }
        }
        if let Some(ratio) = request.box_to_kg_ratio {
            if ratio != self.box_to_kg_ratio {
                changes.push(FieldChange::BoxToKgRatio {
                    old: self.box_to_kg_ratio,
                    new: ratio,
                });
            }
        }
        if let Some(cost) = request.cost_per_box {
            if cost != self.pricing.cost_per_box {
                changes.push(FieldChange::CostPerBox {
                    old: self.pricing.cost_per_box,
                    new: cost,
                });
            }
        }
        if let Some(price) = request.price_per_box {
            if price != self.pricing.price_per_box {
                changes.push(FieldChange::PricePerBox {
                    old: self.pricing.price_per_box,
                    new: price,
                });
            }
        }
        changes
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub opening_stock: Quantity,
    pub box_to_kg_ratio: Decimal,
    pub cost_per_box: Decimal,
    pub price_per_box: Decimal,
    pub low_stock_threshold: Option<Decimal>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveStock (restock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub expiry_date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CorrectStock (signed manual adjustment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectStock {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub adjustment: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: WriteOffDamage (applied when a damage report is approved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOffDamage {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SellStock (a sale leaves the warehouse).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellStock {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReturnStock (a sale was reduced or deleted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnStock {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeField (applied when an edit request is approved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeField {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub change: FieldChange,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveProduct (applied when a deletion request is approved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveProduct {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    ReceiveStock(ReceiveStock),
    CorrectStock(CorrectStock),
    WriteOffDamage(WriteOffDamage),
    SellStock(SellStock),
    ReturnStock(ReturnStock),
    ChangeField(ChangeField),
    RemoveProduct(RemoveProduct),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub opening_stock: Quantity,
    pub box_to_kg_ratio: Decimal,
    pub pricing: Pricing,
    pub low_stock_threshold: Option<Decimal>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub days_left: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceived {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Present only when the delivery changed the expiry date.
    pub expiry: Option<ExpiryUpdate>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryUpdate {
    pub expiry_date: DateTime<Utc>,
    pub days_left: i64,
}

/// Event: StockCorrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCorrected {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub adjustment: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DamageWrittenOff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageWrittenOff {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSold {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReturned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReturned {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FieldChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChanged {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub change: FieldChange,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRemoved {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    StockReceived(StockReceived),
    StockCorrected(StockCorrected),
    DamageWrittenOff(DamageWrittenOff),
    StockSold(StockSold),
    StockReturned(StockReturned),
    FieldChanged(FieldChanged),
    ProductRemoved(ProductRemoved),
}

impl ProductEvent {
    pub fn product_id(&self) -> ProductId {
        match self {
            ProductEvent::ProductCreated(e) => e.product_id,
            ProductEvent::StockReceived(e) => e.product_id,
            ProductEvent::StockCorrected(e) => e.product_id,
            ProductEvent::DamageWrittenOff(e) => e.product_id,
            ProductEvent::StockSold(e) => e.product_id,
            ProductEvent::StockReturned(e) => e.product_id,
            ProductEvent::FieldChanged(e) => e.product_id,
            ProductEvent::ProductRemoved(e) => e.product_id,
        }
    }
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "inventory.product.created",
            ProductEvent::StockReceived(_) => "inventory.product.stock_received",
            ProductEvent::StockCorrected(_) => "inventory.product.stock_corrected",
            ProductEvent::DamageWrittenOff(_) => "inventory.product.damage_written_off",
            ProductEvent::StockSold(_) => "inventory.product.stock_sold",
            ProductEvent::StockReturned(_) => "inventory.product.stock_returned",
            ProductEvent::FieldChanged(_) => "inventory.product.field_changed",
            ProductEvent::ProductRemoved(_) => "inventory.product.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::StockReceived(e) => e.occurred_at,
            ProductEvent::StockCorrected(e) => e.occurred_at,
            ProductEvent::DamageWrittenOff(e) => e.occurred_at,
            ProductEvent::StockSold(e) => e.occurred_at,
            ProductEvent::StockReturned(e) => e.occurred_at,
            ProductEvent::FieldChanged(e) => e.occurred_at,
            ProductEvent::ProductRemoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.account_id = Some(e.account_id);
                self.name = e.name.clone();
                self.category_id = e.category_id;
                self.stock = e.opening_stock;
                self.box_to_kg_ratio = e.box_to_kg_ratio;
                self.pricing = e.pricing;
                self.low_stock_threshold = e.low_stock_threshold;
                self.expiry_date = e.expiry_date;
                self.days_left = e.days_left;
                self.created = true;
            }
            ProductEvent::StockReceived(e) => {
                self.stock += e.quantity;
                if let Some(expiry) = e.expiry {
                    self.expiry_date = Some(expiry.expiry_date);
                    self.days_left = Some(expiry.days_left);
                }
            }
            ProductEvent::StockCorrected(e) => {
                self.stock += e.adjustment;
            }
            ProductEvent::DamageWrittenOff(e) => {
                self.stock = self.stock - e.quantity;
            }
            ProductEvent::StockSold(e) => {
                self.stock = self.stock - e.quantity;
            }
            ProductEvent::StockReturned(e) => {
                self.stock += e.quantity;
            }
            ProductEvent::FieldChanged(e) => match &e.change {
                FieldChange::Name { new, .. } => {
                    self.name = new.clone();
                }
                FieldChange::BoxToKgRatio { new, .. } => {
                    self.box_to_kg_ratio = *new;
                    self.pricing = Pricing::from_box_prices(
                        self.pricing.cost_per_box,
                        self.pricing.price_per_box,
                        *new,
                    );
                }
                FieldChange::CostPerBox { new, .. } => {
                    self.pricing = Pricing::from_box_prices(
                        *new,
                        self.pricing.price_per_box,
                        self.box_to_kg_ratio,
                    );
                }
                FieldChange::PricePerBox { new, .. } => {
                    self.pricing = Pricing::from_box_prices(
                        self.pricing.cost_per_box,
                        *new,
                        self.box_to_kg_ratio,
                    );
                }
            },
            ProductEvent::ProductRemoved(e) => {
                self.removed_at = Some(e.occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::ReceiveStock(cmd) => self.handle_receive(cmd),
            ProductCommand::CorrectStock(cmd) => self.handle_correct(cmd),
            ProductCommand::WriteOffDamage(cmd) => self.handle_write_off(cmd),
            ProductCommand::SellStock(cmd) => self.handle_sell(cmd),
            ProductCommand::ReturnStock(cmd) => self.handle_return(cmd),
            ProductCommand::ChangeField(cmd) => self.handle_change_field(cmd),
            ProductCommand::RemoveProduct(cmd) => self.handle_remove(cmd),
        }
    }
}

impl Product {
    fn ensure_live(&self, account_id: AccountId, product_id: ProductId) -> Result<(), DomainError> {
        if !self.is_live() {
            return Err(DomainError::not_found(format!("product {product_id}")));
        }
        if self.account_id != Some(account_id) {
            return Err(DomainError::unauthorized("product belongs to another account"));
        }
        if self.id != product_id {
            return Err(DomainError::validation("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::invalid_state("product already exists"));
        }
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        validate_ratio(cmd.box_to_kg_ratio)?;
        validate_price("cost_per_box", cmd.cost_per_box)?;
        validate_price("price_per_box", cmd.price_per_box)?;
        if cmd.opening_stock.is_negative() {
            return Err(DomainError::validation("opening stock must be >= 0"));
        }
        if let Some(threshold) = cmd.low_stock_threshold {
            if threshold < Decimal::ZERO {
                return Err(DomainError::validation("low_stock_threshold must be >= 0"));
            }
        }

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            account_id: cmd.account_id,
            product_id: cmd.product_id,
            name: name.to_string(),
            category_id: cmd.category_id,
            opening_stock: cmd.opening_stock,
            box_to_kg_ratio: cmd.box_to_kg_ratio,
            pricing: Pricing::from_box_prices(
                cmd.cost_per_box,
                cmd.price_per_box,
                cmd.box_to_kg_ratio,
            ),
            low_stock_threshold: cmd.low_stock_threshold,
            expiry_date: cmd.expiry_date,
            days_left: cmd.expiry_date.map(|d| days_until(d, cmd.occurred_at)),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_receive(&self, cmd: &ReceiveStock) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_live(cmd.account_id, cmd.product_id)?;
        cmd.quantity.ensure_positive_movement("restock")?;

        let expiry = cmd
            .expiry_date
            .filter(|d| Some(*d) != self.expiry_date)
            .map(|d| ExpiryUpdate {
                expiry_date: d,
                days_left: days_until(d, cmd.occurred_at),
            });

        Ok(vec![ProductEvent::StockReceived(StockReceived {
            account_id: cmd.account_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            expiry,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_correct(&self, cmd: &CorrectStock) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_live(cmd.account_id, cmd.product_id)?;
        if cmd.adjustment.is_zero() {
            return Err(DomainError::validation("correction cannot be zero"));
        }
        if (self.stock + cmd.adjustment).is_negative() {
            return Err(DomainError::validation("correction would leave negative stock"));
        }

        Ok(vec![ProductEvent::StockCorrected(StockCorrected {
            account_id: cmd.account_id,
            product_id: cmd.product_id,
            adjustment: cmd.adjustment,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_write_off(&self, cmd: &WriteOffDamage) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_live(cmd.account_id, cmd.product_id)?;
        cmd.quantity.ensure_positive_movement("damage")?;

        // The damage was validated at report time; running short now means the
        // snapshot no longer matches the ledger.
        let remaining = self.stock - cmd.quantity;
        if remaining.is_negative() {
            return Err(DomainError::integrity(format!(
                "damage write-off of {} boxes / {} kg exceeds stock of {} boxes / {} kg for product {}",
                cmd.quantity.boxes, cmd.quantity.kg, self.stock.boxes, self.stock.kg, self.id
            )));
        }

        Ok(vec![ProductEvent::DamageWrittenOff(DamageWrittenOff {
            account_id: cmd.account_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_sell(&self, cmd: &SellStock) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_live(cmd.account_id, cmd.product_id)?;
        cmd.quantity.ensure_positive_movement("sale")?;
        if (self.stock - cmd.quantity).is_negative() {
            return Err(DomainError::validation("insufficient stock"));
        }

        Ok(vec![ProductEvent::StockSold(StockSold {
            account_id: cmd.account_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_return(&self, cmd: &ReturnStock) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_live(cmd.account_id, cmd.product_id)?;
        cmd.quantity.ensure_positive_movement("return")?;

        Ok(vec![ProductEvent::StockReturned(StockReturned {
            account_id: cmd.account_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_field(&self, cmd: &ChangeField) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_live(cmd.account_id, cmd.product_id)?;
        validate_change(&cmd.change)?;

        Ok(vec![ProductEvent::FieldChanged(FieldChanged {
            account_id: cmd.account_id,
            product_id: cmd.product_id,
            change: cmd.change.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveProduct) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_live(cmd.account_id, cmd.product_id)?;

        Ok(vec![ProductEvent::ProductRemoved(ProductRemoved {
            account_id: cmd.account_id,
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

fn validate_ratio(ratio: Decimal) -> Result<(), DomainError> {
    if ratio <= Decimal::ZERO {
        return Err(DomainError::validation("box_to_kg_ratio must be > 0"));
    }
    Ok(())
}

fn validate_price(field: &str, value: Decimal) -> Result<(), DomainError> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(format!("{field} must be >= 0")));
    }
    Ok(())
}

/// Validate the requested value of a field change.
pub fn validate_change(change: &FieldChange) -> Result<(), DomainError> {
    match change {
        FieldChange::Name { new, .. } => {
            if new.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            Ok(())
        }
        FieldChange::BoxToKgRatio { new, .. } => validate_ratio(*new),
        FieldChange::CostPerBox { new, .. } => validate_price("cost_per_box", *new),
        FieldChange::PricePerBox { new, .. } => validate_price("price_per_box", *new),
    }
}
