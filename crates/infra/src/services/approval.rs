use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::{error, info, instrument, warn};

use stockbook_core::{DomainError, DomainResult, Scope};
use stockbook_events::{EventBus, EventEnvelope};
use stockbook_inventory::{
    ChangeField, DamageId, DamageRecord, Movement, MovementId, MovementKind, ProductCommand,
    ProductId, RemoveProduct, WriteOffDamage,
};

use super::{ensure_distinct_approver, optional_text};
use crate::config::LedgerConfig;
use crate::dispatcher::LedgerDispatcher;
use crate::store::{AccountBook, LedgerStore};

/// Which pending request an approval or rejection targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Edit,
    Delete,
}

impl RequestKind {
    fn matches(self, kind: &MovementKind) -> bool {
        matches!(
            (self, kind),
            (RequestKind::Edit, MovementKind::ProductEdit { .. })
                | (RequestKind::Delete, MovementKind::ProductDelete { .. })
        )
    }

    fn label(self) -> &'static str {
        match self {
            RequestKind::Edit => "product_edit",
            RequestKind::Delete => "product_delete",
        }
    }
}

/// Look up a pending request and check it is the kind the caller expects,
/// for the product the caller names.
fn pending_request<'a>(
    book: &'a AccountBook,
    movement_id: MovementId,
    product_id: Option<ProductId>,
    expected: RequestKind,
) -> DomainResult<&'a Movement> {
    let movement = book.movement(movement_id)?;
    if !expected.matches(movement.kind()) {
        return Err(DomainError::validation(format!(
            "movement {movement_id} is a {} request, not {}",
            movement.kind().as_str(),
            expected.label()
        )));
    }
    if let Some(product_id) = product_id {
        if movement.product_id() != product_id {
            return Err(DomainError::validation(format!(
                "movement {movement_id} does not belong to product {product_id}"
            )));
        }
    }
    if !movement.is_pending() {
        return Err(DomainError::invalid_state(format!(
            "movement {movement_id} is already {}",
            movement.status().as_str()
        )));
    }
    Ok(movement)
}

/// Second-person sign-off on damages, product edits and deletions.
///
/// Approval applies the requested change and closes the request in one
/// transaction; rejection closes the request and changes nothing else.
#[derive(Debug)]
pub struct ApprovalWorkflow<S, B> {
    dispatcher: Arc<LedgerDispatcher<S, B>>,
    config: LedgerConfig,
}

impl<S, B> Clone for ApprovalWorkflow<S, B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, B> ApprovalWorkflow<S, B>
where
    S: LedgerStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: Arc<LedgerDispatcher<S, B>>, config: LedgerConfig) -> Self {
        Self { dispatcher, config }
    }

    #[instrument(skip(self, scope), fields(account_id = %scope.account_id(), movement_id = %movement_id), err)]
    pub fn approve_edit(
        &self,
        scope: &Scope,
        movement_id: MovementId,
        product_id: ProductId,
    ) -> DomainResult<Movement> {
        let movement = self.dispatcher.execute(scope, |book| {
            let movement = pending_request(book, movement_id, Some(product_id), RequestKind::Edit)?;
            ensure_distinct_approver(&self.config, scope, movement.requested_by())?;
            let MovementKind::ProductEdit { change } = movement.kind().clone() else {
                return Err(DomainError::validation("not a product edit"));
            };
            book.product(product_id)?;

            let now = Utc::now();
            book.execute_product(
                product_id,
                ProductCommand::ChangeField(ChangeField {
                    account_id: scope.account_id(),
                    product_id,
                    change,
                    occurred_at: now,
                }),
            )?;
            let movement = book.movement_mut(movement_id)?;
            movement.complete(scope.actor(), now)?;
            Ok(movement.clone())
        })?;

        info!(product_id = %product_id, "product edit approved");
        Ok(movement)
    }

    #[instrument(skip(self, scope, reason), fields(account_id = %scope.account_id(), movement_id = %movement_id), err)]
    pub fn reject_edit(
        &self,
        scope: &Scope,
        movement_id: MovementId,
        reason: Option<&str>,
    ) -> DomainResult<Movement> {
        self.reject_request(scope, movement_id, RequestKind::Edit, reason)
    }

    #[instrument(skip(self, scope), fields(account_id = %scope.account_id(), movement_id = %movement_id), err)]
    pub fn approve_deletion(
        &self,
        scope: &Scope,
        movement_id: MovementId,
        product_id: ProductId,
    ) -> DomainResult<Movement> {
        let movement = self.dispatcher.execute(scope, |book| {
            let movement =
                pending_request(book, movement_id, Some(product_id), RequestKind::Delete)?;
            ensure_distinct_approver(&self.config, scope, movement.requested_by())?;
            book.product(product_id)?;

            let now = Utc::now();
            book.execute_product(
                product_id,
                ProductCommand::RemoveProduct(RemoveProduct {
                    account_id: scope.account_id(),
                    product_id,
                    occurred_at: now,
                }),
            )?;
            let movement = book.movement_mut(movement_id)?;
            movement.complete(scope.actor(), now)?;
            Ok(movement.clone())
        })?;

        info!(product_id = %product_id, "product deletion approved");
        Ok(movement)
    }

    #[instrument(skip(self, scope, reason), fields(account_id = %scope.account_id(), movement_id = %movement_id), err)]
    pub fn reject_deletion(
        &self,
        scope: &Scope,
        movement_id: MovementId,
        reason: Option<&str>,
    ) -> DomainResult<Movement> {
        self.reject_request(scope, movement_id, RequestKind::Delete, reason)
    }

    fn reject_request(
        &self,
        scope: &Scope,
        movement_id: MovementId,
        expected: RequestKind,
        reason: Option<&str>,
    ) -> DomainResult<Movement> {
        let movement = self.dispatcher.execute(scope, |book| {
            pending_request(book, movement_id, None, expected)?;
            let movement = book.movement_mut(movement_id)?;
            movement.reject(scope.actor(), Utc::now(), optional_text(reason))?;
            Ok(movement.clone())
        })?;

        warn!(kind = expected.label(), "request rejected");
        Ok(movement)
    }

    /// Apply an approved damage: stock is written off, the report is marked
    /// approved and its ledger entry completes.
    #[instrument(skip(self, scope), fields(account_id = %scope.account_id(), damage_id = %damage_id), err)]
    pub fn approve_damage(&self, scope: &Scope, damage_id: DamageId) -> DomainResult<DamageRecord> {
        let result = self.dispatcher.execute(scope, |book| {
            let damage = book.damage(damage_id)?;
            damage.ensure_pending()?;
            ensure_distinct_approver(&self.config, scope, damage.reported_by())?;
            let product_id = damage.product_id();
            let quantity = damage.quantity();
            let movement_id = damage.movement_id();

            let now = Utc::now();
            book.damage_mut(damage_id)?.approve(scope.actor(), now)?;
            book.product(product_id)?;
            book.execute_product(
                product_id,
                ProductCommand::WriteOffDamage(WriteOffDamage {
                    account_id: scope.account_id(),
                    product_id,
                    quantity,
                    occurred_at: now,
                }),
            )?;
            book.movement_mut(movement_id)?.complete(scope.actor(), now)?;
            book.damage(damage_id).cloned()
        });

        match result {
            Ok(damage) => {
                info!(loss_value = %damage.loss_value(), "damage approved");
                Ok(damage)
            }
            Err(e @ DomainError::IntegrityFault(_)) => {
                error!(error = %e, "damage write-off would leave negative stock");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, scope, reason), fields(account_id = %scope.account_id(), damage_id = %damage_id), err)]
    pub fn reject_damage(
        &self,
        scope: &Scope,
        damage_id: DamageId,
        reason: Option<&str>,
    ) -> DomainResult<DamageRecord> {
        let damage = self.dispatcher.execute(scope, |book| {
            let movement_id = book.damage(damage_id)?.movement_id();
            let now = Utc::now();
            book.damage_mut(damage_id)?.reject(scope.actor(), now)?;
            book.movement_mut(movement_id)?
                .reject(scope.actor(), now, optional_text(reason))?;
            book.damage(damage_id).cloned()
        })?;

        warn!(loss_value = %damage.loss_value(), "damage rejected");
        Ok(damage)
    }
}
