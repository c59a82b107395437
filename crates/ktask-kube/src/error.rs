use thiserror::Error;

use ktask_core::{ClusterError, ConfigError};

#[derive(Debug, Error)]
pub enum KubeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// Classify a `kube` failure.
///
/// API status responses keep their code so 404 can be told apart; every other
/// failure (connection, TLS, decoding) is a transport error.
pub fn cluster_error(err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(resp) => ClusterError::Status {
            code: resp.code,
            reason: resp.reason,
            message: resp.message,
        },
        other => ClusterError::Transport(other.to_string()),
    }
}
