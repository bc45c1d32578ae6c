//! # pgchain
//!
//! Chainable SQL command builder for Postgres.
//!
//! ## Features
//!
//! - **Chain and clone**: every builder method consumes the command and returns the next one,
//!   so a shared base can be extended in several directions
//! - **Sticky errors**: the first mistake in a chain is kept and reported by `pp()` / `go()`,
//!   nothing panics and nothing reaches the database
//! - **Positional markers**: write `?`, get `$1, $2, ...` on the wire and inlined values in `pp()`
//! - **Bulk inserts**: `insert(...).into(...).values(...)` loads rows with `COPY FROM STDIN`
//! - **Dynamic rows**: results are materialized into rows with typed accessors and a serde
//!   `transfer` into your own structs
//!
//! ```ignore
//! use pgchain::prelude::*;
//!
//! let pool = create_pool(&PoolConfig::from_env()?)?;
//! let client = pool.get().await?;
//!
//! let films = command()
//!     .select(["title", "length"])
//!     .from(["film"])
//!     .where_("length > ?", [120])
//!     .desc_by("length")
//!     .limit(5)
//!     .go(&client)
//!     .await?;
//!
//! command()
//!     .insert(["first_name", "last_name"])
//!     .into("actor")
//!     .values([vals!["Ryan", "Bryan"]])
//!     .go(&client)
//!     .await?;
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod gateway;
pub mod placeholder;
pub mod prelude;
pub mod relation;
pub mod result;
pub mod row;
pub mod value;

pub use command::{Command, NO_ARGS, POSTGRES_MAX_COLUMNS, SelectItem, command};
pub use config::ExecConfig;
pub use error::{BuildError, ChainError, ChainResult};
pub use gateway::{Gateway, QueryOutput};
pub use placeholder::{render_debug, translate_placeholders};
pub use relation::{Field, Relation, Table};
pub use result::ResultSet;
pub use row::Row;
pub use value::Value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use config::PoolConfig;
#[cfg(feature = "pool")]
pub use pool::create_pool;

// Re-export driver types users need alongside a gateway
pub use tokio_postgres;

#[cfg(feature = "pool")]
pub use deadpool_postgres;
