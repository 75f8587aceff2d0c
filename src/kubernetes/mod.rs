// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Access to cluster state needed by the eviction hook.
//!
//! The decision engine only sees the [`ClusterState`] trait; [`KubeClusterState`]
//! implements it against the API server.

pub mod annotations;
pub mod client;

use crate::error::Result;
use crate::tracking::{TrackingInstance, TrackingResource};
use k8s_openapi::api::core::v1::Pod;
use kube::api::DynamicObject;
use std::future::Future;

pub use annotations::annotation_patch;
pub use client::KubeClusterState;

/// Reads and single-annotation writes against the cluster
pub trait ClusterState {
    /// Fetch a pod. A missing pod is reported as a 404 API error.
    fn get_pod(&self, name: &str, namespace: &str) -> impl Future<Output = Result<Pod>> + Send;

    /// Fetch a tracking resource instance without requiring a typed schema
    fn get_tracking_instance(
        &self,
        resource: TrackingResource,
        instance: &TrackingInstance,
    ) -> impl Future<Output = Result<DynamicObject>> + Send;

    /// Set (`Some`) or remove (`None`) one annotation on a tracking resource instance
    fn patch_tracking_annotation(
        &self,
        resource: TrackingResource,
        instance: &TrackingInstance,
        key: &str,
        value: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Set one annotation on a pod
    fn patch_pod_annotation(
        &self,
        name: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
