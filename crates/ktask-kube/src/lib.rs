//! [`ClusterBackend`](ktask_core::ClusterBackend) over the Kubernetes API.
//!
//! [`KubeBackend`] talks to the cluster with the [`kube`] crate using the ambient
//! configuration (in-cluster service account or local `~/.kube/config`).

mod backend;
pub use backend::KubeBackend;

mod error;
pub use error::{KubeError, cluster_error};

pub use kube;
