//! `vestry-infra` — storage and permission-resolution services.
//!
//! Store traits with two implementations: in-memory (dev/tests) and Postgres.
//! Both honor the same error taxonomy; handlers and the authorization gate
//! never know which backend they talk to.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod resolver;
pub mod schema;
pub mod seed;
pub mod store;

pub use error::{RepoResult, RepositoryError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use resolver::PermissionResolver;
pub use store::{
    ContributionStore, FinanceReportStore, IdentityStore, MassFilter, MassStore, OfferingStore,
    ParishStore, PaymentStore, ReportQuery, RoleAssignment, RoleAssignmentStore, RoleStore,
};
