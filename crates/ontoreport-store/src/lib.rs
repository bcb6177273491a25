//! Ontoreport Store: lease-locked persistence of the ontologies report

pub mod file_lease;
pub mod lease;
pub mod redis_lease;
pub mod store;

pub use file_lease::FileLease;
pub use lease::{acquire, InMemoryLease, LeaseBackend, LeaseGuard};
pub use redis_lease::RedisLease;
pub use store::ReportStore;
