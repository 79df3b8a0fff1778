//! Draft order coordinator. Owns every transition a draft goes
//! through from creation to confirmation/rejection/expiry, including the
//! handoff into a real `Order` plus its station tickets at confirmation.

pub mod lock;
pub mod repository;
pub mod sweeper;

use crate::db::TenantCtx;
use crate::domain::draft_order::{DraftLineItem, DraftOrder};
use crate::domain::order::{Order, OrderLineItem};
use crate::error::{DomainError, DomainResult};
use crate::events::{DomainEvent, EventBus};
use crate::ids::{DraftLineItemId, DraftOrderId, MenuItemId, TableSessionId, UserId};
use crate::money::Money;
use crate::ticket::TicketDispatcher;
use chrono::{Duration, Utc};
use lock::LockPolicy;
use repository::{DraftRepository, OrderRepository};
use sqlx::PgPool;

#[derive(Clone)]
pub struct DraftCoordinator {
    pool: PgPool,
    bus: EventBus,
    lock_policy: LockPolicy,
    default_ttl: Duration,
}

impl DraftCoordinator {
    pub fn new(pool: PgPool, bus: EventBus, lease_duration: Duration, default_ttl: Duration) -> Self {
        Self {
            pool,
            bus,
            lock_policy: LockPolicy::new(lease_duration),
            default_ttl,
        }
    }

    pub async fn create(&self, ctx: &TenantCtx, table_session_id: TableSessionId) -> DomainResult<DraftOrder> {
        let draft = DraftOrder::new(table_session_id, self.default_ttl);
        DraftRepository::new(&self.pool).insert(ctx, &draft).await?;
        self.bus.publish(DomainEvent::DraftCreated {
            draft_id: draft.id,
            table_session_id,
        });
        Ok(draft)
    }

    pub async fn add_line_item(
        &self,
        ctx: &TenantCtx,
        draft_id: DraftOrderId,
        menu_item_id: MenuItemId,
        quantity: u32,
        unit_price: Money,
        notes: Option<String>,
    ) -> DomainResult<DraftOrder> {
        let repo = DraftRepository::new(&self.pool);
        let mut draft = repo.get(ctx, draft_id).await?;
        if draft.status != crate::domain::draft_order::DraftStatus::Draft {
            return Err(DomainError::InvalidTransition(
                "cannot add line items once a draft has been submitted".into(),
            ));
        }
        let item = DraftLineItem {
            id: DraftLineItemId::new(),
            menu_item_id,
            quantity,
            unit_price,
            notes,
        };
        repo.insert_line_item(ctx, draft_id, &item).await?;
        draft.line_items.push(item);
        Ok(draft)
    }

    pub async fn acquire_lock(&self, ctx: &TenantCtx, draft_id: DraftOrderId, user_id: UserId) -> DomainResult<DraftOrder> {
        let repo = DraftRepository::new(&self.pool);
        let mut draft = repo.get(ctx, draft_id).await?;
        let expected_version = draft.version;
        draft.acquire_lock(user_id, Utc::now(), self.lock_policy.lease_duration)?;
        repo.save_cas(ctx, &draft, expected_version).await?;
        self.bus.publish(DomainEvent::DraftAcquired {
            draft_id,
            table_session_id: draft.table_session_id,
            locked_by: user_id,
        });
        Ok(draft)
    }

    pub async fn release_lock(&self, ctx: &TenantCtx, draft_id: DraftOrderId, user_id: UserId) -> DomainResult<DraftOrder> {
        let repo = DraftRepository::new(&self.pool);
        let mut draft = repo.get(ctx, draft_id).await?;
        let expected_version = draft.version;
        draft.release_lock(user_id)?;
        repo.save_cas(ctx, &draft, expected_version).await?;
        Ok(draft)
    }

    pub async fn submit(&self, ctx: &TenantCtx, draft_id: DraftOrderId) -> DomainResult<DraftOrder> {
        let repo = DraftRepository::new(&self.pool);
        let mut draft = repo.get(ctx, draft_id).await?;
        let expected_version = draft.version;
        draft.submit()?;
        repo.save_cas(ctx, &draft, expected_version).await?;
        self.bus.publish(DomainEvent::DraftSubmitted {
            draft_id,
            table_session_id: draft.table_session_id,
        });
        Ok(draft)
    }

    /// Confirms a draft, materializing it into an `Order` and fanning out
    /// one kitchen ticket per distinct station/course among its line items.
    /// Only the caller holding the draft's lock may confirm it.
    pub async fn confirm(
        &self,
        ctx: &TenantCtx,
        draft_id: DraftOrderId,
        user_id: UserId,
        dispatcher: &TicketDispatcher,
    ) -> DomainResult<Order> {
        let draft_repo = DraftRepository::new(&self.pool);
        let mut draft = draft_repo.get(ctx, draft_id).await?;
        let expected_version = draft.version;
        draft.confirm(user_id)?;

        let line_items: Vec<OrderLineItem> = draft
            .line_items
            .iter()
            .map(|item| OrderLineItem {
                id: crate::ids::OrderLineItemId::new(),
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                notes: item.notes.clone(),
            })
            .collect();
        let order = Order::from_confirmed_draft(draft.id, draft.table_session_id, line_items);

        OrderRepository::new(&self.pool).insert(ctx, &order).await?;
        draft_repo.save_cas(ctx, &draft, expected_version).await?;

        self.bus.publish(DomainEvent::DraftConfirmed {
            draft_id,
            table_session_id: draft.table_session_id,
            order_id: order.id,
            total: order.total(),
        });
        self.bus.publish(DomainEvent::OrderCreated {
            order_id: order.id,
            table_session_id: order.table_session_id,
        });

        dispatcher.dispatch(ctx, &order).await?;

        Ok(order)
    }

    pub async fn reject(&self, ctx: &TenantCtx, draft_id: DraftOrderId, user_id: UserId, reason: String) -> DomainResult<DraftOrder> {
        let repo = DraftRepository::new(&self.pool);
        let mut draft = repo.get(ctx, draft_id).await?;
        let expected_version = draft.version;
        draft.reject(user_id, reason.clone())?;
        repo.save_cas(ctx, &draft, expected_version).await?;
        self.bus.publish(DomainEvent::DraftRejected {
            draft_id,
            table_session_id: draft.table_session_id,
            reason,
        });
        Ok(draft)
    }

    pub async fn reassign(&self, ctx: &TenantCtx, draft_id: DraftOrderId, new_session: TableSessionId) -> DomainResult<DraftOrder> {
        let repo = DraftRepository::new(&self.pool);
        let mut draft = repo.get(ctx, draft_id).await?;
        let expected_version = draft.version;
        let old_session = draft.reassign(new_session)?;
        repo.save_cas(ctx, &draft, expected_version).await?;
        self.bus.publish(DomainEvent::DraftReassigned {
            draft_id,
            old_session,
            new_session,
        });
        Ok(draft)
    }

    pub async fn expire(&self, ctx: &TenantCtx, draft_id: DraftOrderId) -> DomainResult<()> {
        let repo = DraftRepository::new(&self.pool);
        let mut draft = repo.get(ctx, draft_id).await?;
        let expected_version = draft.version;
        draft.expire(Utc::now())?;
        repo.save_cas(ctx, &draft, expected_version).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}
