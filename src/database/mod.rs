pub mod manager;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;
pub use record::{as_i64, into_record, Record, RecordExt, Table};
pub use store::RecordStore;
