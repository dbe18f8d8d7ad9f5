use crate::errors::AutorefreshError;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Node {node} is no longer attached to the UI tree")]
    NodeDetached { node: u64 },

    #[error("Host rejected activation: {reason}")]
    ActivationRejected { reason: String },

    #[error("Host panicked during {operation}: {message}")]
    Panicked {
        operation: &'static str,
        message: String,
    },
}

impl AutorefreshError for HostError {
    fn error_code(&self) -> &'static str {
        match self {
            HostError::NodeDetached { .. } => "HOST_NODE_DETACHED",
            HostError::ActivationRejected { .. } => "HOST_ACTIVATION_REJECTED",
            HostError::Panicked { .. } => "HOST_PANICKED",
        }
    }
}
