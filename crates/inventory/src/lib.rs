//! Inventory domain module.
//!
//! Business rules for products, the stock movement ledger, restock deliveries
//! and damage reports, implemented as deterministic domain logic (no IO, no
//! storage).

pub mod damage;
pub mod movement;
pub mod product;
pub mod restock;

pub use damage::{DamageApproval, DamageId, DamageRecord};
pub use movement::{Movement, MovementId, MovementKind, MovementStatus};
pub use product::{
    CategoryId, ChangeField, CorrectStock, CreateProduct, EditRequest, FieldChange, Pricing,
    Product, ProductCommand, ProductEvent, ProductField, ProductId, ReceiveStock, RemoveProduct,
    ReturnStock, SellStock, WriteOffDamage, days_until, validate_change,
};
pub use restock::{RestockId, RestockRecord};
