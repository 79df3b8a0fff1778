//! Domain entities and their state machines. Each submodule
//! owns one aggregate's shape plus its legal-transition set; repositories
//! under `draft/`, `ticket/`, `payment/`, and `shift/` persist these types
//! and enforce the transitions via CAS updates.

pub mod adjustment;
pub mod draft_order;
pub mod menu;
pub mod order;
pub mod payment;
pub mod shift;
pub mod table_session;
pub mod ticket;
