pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod draft;
pub mod error;
pub mod events;
pub mod ids;
pub mod logging;
pub mod money;
pub mod payment;
pub mod push;
pub mod shift;
pub mod ticket;
