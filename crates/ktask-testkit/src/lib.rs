//! In-memory cluster backend for exercising [`ktask_core::TaskClient`] without a cluster.

mod builders;
pub use builders::{job, labels};

mod cluster;
pub use cluster::{Call, MemoryCluster};
