//! Built-in storage adapters.
//!
//! Available backends:
//! - `MemoryAdapter` — in-memory stores (fast, volatile); also used by the
//!   library's own tests.
//! - `SqliteAdapter` — file-based SQLite storage, behind the `sqlite`
//!   feature (enabled by default).
//!
//! Third-party backends implement the `Adapter` trait and plug in through
//! their own `AdapterConfig` implementation.

mod memory;
#[cfg(feature = "sqlite")]
mod sql;

pub use memory::MemoryAdapter;
#[cfg(feature = "sqlite")]
pub use sql::SqliteAdapter;
