//! Post-confirmation order adjustments: comps, discounts, and corrections
//! applied after an order has left the draft stage. Kept as a signed
//! ledger entry rather than mutating order line items directly, so the
//! order's original total stays auditable.

use crate::ids::{OrderAdjustmentId, OrderId, UserId};
use crate::money::SignedMoney;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Comp,
    Discount,
    Correction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAdjustment {
    pub id: OrderAdjustmentId,
    pub order_id: OrderId,
    pub kind: AdjustmentKind,
    pub amount: SignedMoney,
    pub reason: String,
    pub applied_by: UserId,
    pub applied_at: DateTime<Utc>,
}

impl OrderAdjustment {
    pub fn new(order_id: OrderId, kind: AdjustmentKind, amount: SignedMoney, reason: String, applied_by: UserId) -> Self {
        Self {
            id: OrderAdjustmentId::new(),
            order_id,
            kind,
            amount,
            reason,
            applied_by,
            applied_at: Utc::now(),
        }
    }
}
