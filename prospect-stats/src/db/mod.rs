//! Database access for prospect-stats
//!
//! Free functions over `SqlitePool` (or an open transaction) for each
//! table the statistics engine reads or writes.

pub mod buildings;
pub mod doors;
pub mod salespeople;
pub mod statistics;
pub mod zones;
