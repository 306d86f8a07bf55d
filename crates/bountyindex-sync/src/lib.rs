//! bountyindex-sync — brings the snapshot from its checkpoint to the chain
//! head in bounded windows, and keeps it there with a polling loop.
//!
//! The remote log source sits behind the [`ChainClient`] trait; everything
//! else (event application, querying) is synchronous in-memory work from
//! `bountyindex-core`.

pub mod client;
pub mod engine;

pub use client::ChainClient;
pub use engine::BountyIndexer;
