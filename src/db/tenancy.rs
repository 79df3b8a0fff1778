//! Tenant binding for the current request.
//!
//! `TenantCtx` is extracted from the caller's auth token and threaded
//! explicitly into every repository call. There is no ambient/thread-local
//! tenant — every query is tenant-scoped at the call site instead of
//! relying on a singleton-session binding.

use crate::ids::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantCtx {
    pub tenant_id: TenantId,
}

impl TenantCtx {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }
}
