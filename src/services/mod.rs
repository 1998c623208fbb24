// Business rules behind the HTTP handlers. Everything here takes the store
// explicitly so it can be exercised without a router.
pub mod accounts;
pub mod posts;
pub mod users;
