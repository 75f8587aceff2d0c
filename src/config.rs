// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use crate::error::HookError;
use crate::tracking::{TrackingRegistry, TrackingResource};
use anyhow::Result;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

/// Misspelled toggle still set by older deployments
const LEGACY_TRACK_RESCHEDULED_PODS: &str = "TRACK_RESCHEULED_PODS";

/// Webhook configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Label key/value selecting the pods this hook manages
    pub pod_label_selector_key: String,
    pub pod_label_selector_value: String,
    /// Annotation asking the operator to reschedule a pod
    pub reschedule_annotation_key: String,
    pub reschedule_annotation_value: String,
    /// Remember marked pods on a tracking resource to detect same-name recreation
    pub track_rescheduled_pods: bool,
    pub tracking_resource: TrackingResource,
    pub tls_cert_file: PathBuf,
    pub tls_key_file: PathBuf,
    pub listen_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pod_label_selector_key: defaults::POD_LABEL_SELECTOR_KEY.to_string(),
            pod_label_selector_value: defaults::POD_LABEL_SELECTOR_VALUE.to_string(),
            reschedule_annotation_key: defaults::RESCHEDULE_ANNOTATION_KEY.to_string(),
            reschedule_annotation_value: defaults::RESCHEDULE_ANNOTATION_VALUE.to_string(),
            track_rescheduled_pods: defaults::TRACK_RESCHEDULED_PODS,
            tracking_resource: TrackingResource::CouchbaseCluster,
            tls_cert_file: PathBuf::from(defaults::TLS_CERT_FILE),
            tls_key_file: PathBuf::from(defaults::TLS_KEY_FILE),
            listen_addr: defaults::LISTEN_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8443))),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, using defaults for unset ones
    pub fn from_env(registry: &TrackingRegistry) -> Result<Self> {
        Self::from_lookup(registry, |key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(registry: &TrackingRegistry, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Config {
            tracking_resource: registry.default_resource(),
            ..Config::default()
        };

        if let Some(v) = get("POD_LABEL_SELECTOR_KEY") {
            config.pod_label_selector_key = v;
        }
        if let Some(v) = get("POD_LABEL_SELECTOR_VALUE") {
            config.pod_label_selector_value = v;
        }
        if let Some(v) = get("RESCHEDULE_ANNOTATION_KEY") {
            config.reschedule_annotation_key = v;
        }
        if let Some(v) = get("RESCHEDULE_ANNOTATION_VALUE") {
            config.reschedule_annotation_value = v;
        }
        if let Some(v) = get("TRACK_RESCHEDULED_PODS").or_else(|| get(LEGACY_TRACK_RESCHEDULED_PODS)) {
            config.track_rescheduled_pods = v.parse().unwrap_or(false);
        }
        if let Some(v) = get("TRACKING_RESOURCE_TYPE") {
            config.tracking_resource = registry.resolve(&v);
        }
        if let Some(v) = get("TLS_CERT_FILE") {
            config.tls_cert_file = PathBuf::from(v);
        }
        if let Some(v) = get("TLS_KEY_FILE") {
            config.tls_key_file = PathBuf::from(v);
        }
        if let Some(v) = get("LISTEN_ADDR") {
            config.listen_addr = v.parse().map_err(|e| {
                HookError::ConfigError(format!("LISTEN_ADDR '{}' is not a valid socket address: {}", v, e))
            })?;
        }

        Ok(config)
    }

    pub fn with_pod_label_selector(mut self, key: &str, value: &str) -> Self {
        self.pod_label_selector_key = key.to_string();
        self.pod_label_selector_value = value.to_string();
        self
    }

    pub fn with_reschedule_annotation(mut self, key: &str, value: &str) -> Self {
        self.reschedule_annotation_key = key.to_string();
        self.reschedule_annotation_value = value.to_string();
        self
    }

    pub fn with_track_rescheduled_pods(mut self, track: bool) -> Self {
        self.track_rescheduled_pods = track;
        self
    }

    pub fn with_tracking_resource(mut self, resource: TrackingResource) -> Self {
        self.tracking_resource = resource;
        self
    }

    /// Check if a pod carries the selector label and is therefore handled by the hook
    pub fn is_managed(&self, pod: &Pod) -> bool {
        pod.labels()
            .get(&self.pod_label_selector_key)
            .is_some_and(|v| *v == self.pod_label_selector_value)
    }

    /// Check if a pod has already been asked to reschedule
    pub fn is_marked_for_reschedule(&self, pod: &Pod) -> bool {
        pod.annotations()
            .get(&self.reschedule_annotation_key)
            .is_some_and(|v| *v == self.reschedule_annotation_value)
    }

    pub fn log_summary(&self) {
        info!(
            "Configuration loaded: pod_selector={}={}, reschedule_annotation={}={}, track_rescheduled_pods={}, tracking_resource={}, listen_addr={}",
            self.pod_label_selector_key,
            self.pod_label_selector_value,
            self.reschedule_annotation_key,
            self.reschedule_annotation_value,
            self.track_rescheduled_pods,
            self.tracking_resource,
            self.listen_addr
        );
    }
}
