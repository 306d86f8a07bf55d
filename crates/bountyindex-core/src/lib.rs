//! bountyindex-core — data model, event vocabulary, and pure indexing logic
//! for the bounty-marketplace snapshot.
//!
//! # Architecture
//!
//! ```text
//! BountyIndexer (bountyindex-sync)
//!     ├── ChainClient          (chain head + decoded log queries)
//!     ├── chunk::block_windows (range tiling under the RPC range cap)
//!     ├── apply::apply_event   (decoded event → snapshot mutation)
//!     ├── SnapshotStore        (bountyindex-store, JSON persistence)
//!     └── query                (filtered read views, never remote)
//! ```

pub mod apply;
pub mod chunk;
pub mod config;
pub mod error;
pub mod event;
pub mod query;
pub mod types;

pub use apply::apply_event;
pub use chunk::block_windows;
pub use config::{IndexerConfig, IndexerConfigBuilder};
pub use error::IndexerError;
pub use event::{ChainEvent, EventKind, EventPayload};
pub use query::{BountyFilter, IndexStats};
pub use types::{AgentRecord, BountyIndex, BountyRecord, BountyStatus};
