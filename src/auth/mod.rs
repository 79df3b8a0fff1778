//! Roles and permission checks. Authentication (token issuance, login,
//! registration) is out of scope — tokens arrive bearer-style, already
//! signed by an external identity provider; this module only validates
//! and authorizes.

pub mod middleware;
pub mod token;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Waiter,
    Cashier,
    Kitchen,
    Expo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ManageMenu,
    OpenTableSession,
    SubmitDraft,
    ConfirmDraft,
    RejectDraft,
    ReassignDraft,
    ViewTicketQueue,
    BumpTicket,
    HoldTicket,
    FireTicket,
    VoidTicket,
    TakePayment,
    ResolvePayment,
    RefundPayment,
    OpenShift,
    CloseShift,
    ReconcileShift,
    RecordCashEvent,
    ApproveCashEvent,
    ApplyAdjustment,
    ReprintTicket,
    CompleteOrder,
}

impl Role {
    /// Static permission grants per role. A `Manager` and `Admin`
    /// carry every permission; the rest are scoped to their station in the
    /// floor/kitchen/cash workflow.
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin | Role::Manager => &[
                ManageMenu,
                OpenTableSession,
                SubmitDraft,
                ConfirmDraft,
                RejectDraft,
                ReassignDraft,
                ViewTicketQueue,
                BumpTicket,
                HoldTicket,
                FireTicket,
                VoidTicket,
                TakePayment,
                ResolvePayment,
                RefundPayment,
                OpenShift,
                CloseShift,
                ReconcileShift,
                RecordCashEvent,
                ApproveCashEvent,
                ApplyAdjustment,
                ReprintTicket,
                CompleteOrder,
            ],
            Role::Waiter => &[
                OpenTableSession,
                SubmitDraft,
                ReassignDraft,
                TakePayment,
                CompleteOrder,
            ],
            Role::Cashier => &[
                TakePayment,
                ResolvePayment,
                RefundPayment,
                OpenShift,
                CloseShift,
                RecordCashEvent,
                CompleteOrder,
            ],
            Role::Kitchen => &[ViewTicketQueue, BumpTicket, HoldTicket, FireTicket],
            Role::Expo => &[
                ViewTicketQueue,
                BumpTicket,
                HoldTicket,
                FireTicket,
                VoidTicket,
                ConfirmDraft,
                RejectDraft,
                ReprintTicket,
            ],
        }
    }

    pub fn can(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: crate::ids::UserId,
    pub tenant_id: crate::ids::TenantId,
    pub role: Role,
}

impl AuthContext {
    pub fn require(&self, permission: Permission) -> Result<(), crate::error::DomainError> {
        if self.role.can(permission) {
            Ok(())
        } else {
            Err(crate::error::DomainError::PermissionDenied(format!(
                "role {:?} lacks {:?}",
                self.role, permission
            )))
        }
    }

    pub fn tenant_ctx(&self) -> crate::db::TenantCtx {
        crate::db::TenantCtx::new(self.tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_has_every_permission_a_waiter_has() {
        for permission in Role::Waiter.permissions() {
            assert!(Role::Manager.can(*permission));
        }
    }

    #[test]
    fn kitchen_cannot_take_payment() {
        assert!(!Role::Kitchen.can(Permission::TakePayment));
    }

    #[test]
    fn cashier_can_reconcile_is_false() {
        assert!(!Role::Cashier.can(Permission::ReconcileShift));
    }
}
