//! Route handlers, one module per resource.

pub mod analysis;
pub mod chat;
pub mod health;
pub mod journal;
pub mod prescriptions;
pub mod remedies;
