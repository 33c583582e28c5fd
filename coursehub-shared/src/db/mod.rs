/// Database plumbing: connection pool and migrations
///
/// Row types and their SQL live in [`crate::models`]; services reach them
/// through [`crate::store::Store`].

pub mod migrations;
pub mod pool;
