//! Store adapters and inventory building.

pub mod adapter;
pub mod inventory;
pub mod memory;
pub mod options;
pub mod postgres;

pub use adapter::{RowStream, Store};
pub use inventory::build_inventory;
pub use memory::{MemoryEntity, MemoryStore};
pub use options::PostgresOptions;
pub use postgres::PostgresStore;
