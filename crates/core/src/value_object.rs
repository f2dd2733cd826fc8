//! Value objects: equality by value, not identity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A stock amount expressed in both units the business tracks.
///
/// `boxes` and `kg` are carried side by side; a product usually keeps
/// `kg == boxes * ratio`, but partial-unit movements may move only one side.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub boxes: Decimal,
    pub kg: Decimal,
}

impl Quantity {
    pub const ZERO: Quantity = Quantity {
        boxes: Decimal::ZERO,
        kg: Decimal::ZERO,
    };

    pub fn new(boxes: Decimal, kg: Decimal) -> Self {
        Self { boxes, kg }
    }

    pub fn is_zero(&self) -> bool {
        self.boxes.is_zero() && self.kg.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.boxes < Decimal::ZERO || self.kg < Decimal::ZERO
    }

    /// Validate an inbound movement amount: both sides >= 0, at least one > 0.
    pub fn ensure_positive_movement(&self, what: &str) -> DomainResult<()> {
        if self.is_negative() {
            return Err(DomainError::validation(format!(
                "{what}: boxes and kg must be >= 0"
            )));
        }
        if self.is_zero() {
            return Err(DomainError::validation(format!(
                "{what}: boxes or kg must be > 0"
            )));
        }
        Ok(())
    }

    /// Value of this amount at the given per-box / per-kg prices.
    pub fn valued_at(&self, per_box: Decimal, per_kg: Decimal) -> Decimal {
        self.boxes * per_box + self.kg * per_kg
    }
}

impl core::ops::Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.boxes + rhs.boxes, self.kg + rhs.kg)
    }
}

impl core::ops::Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.boxes - rhs.boxes, self.kg - rhs.kg)
    }
}

impl core::ops::AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.boxes += rhs.boxes;
        self.kg += rhs.kg;
    }
}

impl core::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Quantity {
        iter.fold(Quantity::ZERO, |acc, q| acc + q)
    }
}
