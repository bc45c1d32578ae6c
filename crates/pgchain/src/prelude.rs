//! Convenient imports for typical `pgchain` usage.
//!
//! ```ignore
//! use pgchain::prelude::*;
//! ```

pub use crate::{
    ChainError, ChainResult, Command, ExecConfig, Field, Gateway, NO_ARGS, ResultSet, Row, Table,
    Value, command, vals,
};

#[cfg(feature = "pool")]
pub use crate::{PoolConfig, create_pool};
