// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("TLS setup failed: {0}")]
    TlsError(String),

    #[error("Invalid admission request: {0}")]
    InvalidRequest(String),

    #[error("Pod {namespace}/{pod} has no {resource} tracking resource")]
    MissingTrackingInstance {
        pod: String,
        namespace: String,
        resource: String,
    },
}

impl HookError {
    /// Whether the API server answered with 404 for the requested object
    pub fn is_not_found(&self) -> bool {
        matches!(self, HookError::KubeError(kube::Error::Api(err)) if err.code == 404)
    }
}

pub type Result<T> = std::result::Result<T, HookError>;
