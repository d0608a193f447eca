//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every mutation runs through the [`UnitOfWork`](crate::unit_of_work::UnitOfWork).

pub mod broker;
pub mod customer;
pub mod reference;
pub mod user;

pub use broker::{BrokerError, BrokerRepository, BrokerWithHeadOffice, CreateBrokerInput};
pub use customer::{
    CreateCustomerInput, CustomerError, CustomerFilter, CustomerRepository, UpdateCustomerInput,
};
pub use reference::{NewReferenceItem, ReferenceItem, ReferenceKind, ReferenceRepository};
pub use user::{UserManagementError, UserRepository};
