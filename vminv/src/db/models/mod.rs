//! Database entity models.

pub mod users;
pub mod vms;
