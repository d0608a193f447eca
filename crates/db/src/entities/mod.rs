//! `SeaORM` entity definitions.

pub mod branches;
pub mod brokers;
pub mod customers;
pub mod fuel_types;
pub mod permissions;
pub mod policy_types;
pub mod premium_types;
pub mod roles;
pub mod users;
