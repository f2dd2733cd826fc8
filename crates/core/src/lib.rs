//! `stockbook-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the account [`Scope`] every operation runs under, the shared
//! error taxonomy and the box/kilogram [`Quantity`] value object.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod scope;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::AccountOwned;
pub use error::{DomainError, DomainResult};
pub use id::{AccountId, AggregateId, UserId};
pub use scope::Scope;
pub use value_object::Quantity;
