//! Federated query execution.
//!
//! One query, fanned out to every partition, normalized and merged back
//! into a single [`FederatedResult`].
//!
//! ```text
//!                   query
//!                     │
//!        ┌────────────┼────────────┐        adapter call per partition
//!        ▼            ▼            ▼        (serial / rayon / async / stream)
//!   partition 0  partition 1  partition 2
//!        │            │            │
//!   normalize    normalize    normalize     PartitionOutput -> Vec<Record>
//!        └────────────┼────────────┘
//!                     ▼
//!        merge in partition order, dedup by fingerprint
//! ```

mod adapter;
mod executor;
mod fingerprint;
mod normalize;
mod result;
mod stream;

pub use adapter::{AdapterError, CypherAdapter, PartitionQueryAdapter};
pub use executor::{DEFAULT_MAX_WORKERS, FederatedExecutor};
pub use normalize::{
    FALLBACK_COLUMN, PartitionOutput, Record, RowContainer, RowLike, SerializedFields, normalize,
    normalize_row,
};
pub use result::FederatedResult;
pub use stream::FederatedStream;
