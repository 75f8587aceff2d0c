// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resources that remember rescheduled pods across their deletion and recreation.
//!
//! A tracking resource outlives the pods it tracks. For every pod marked for
//! rescheduling it carries one annotation, `reschedule.hook/<namespace>.<name>`,
//! so that concurrent evictions of sibling pods touch disjoint keys.

pub mod couchbase_cluster;
pub mod namespace;

use crate::constants::tracking::ANNOTATION_PREFIX;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{ApiResource, DynamicObject},
    Api, Client,
};
use std::fmt;
use tracing::warn;

/// Identity of the tracking resource instance associated with a pod
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingInstance {
    pub name: String,
    /// `None` for cluster scoped resources
    pub namespace: Option<String>,
}

/// The kinds of resource that can hold tracking annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingResource {
    /// The pod's own namespace, always tracked
    Namespace,
    /// The CouchbaseCluster owning the pod, tracked for in-place upgrades only
    CouchbaseCluster,
}

impl TrackingResource {
    /// Identifier used in configuration and logs
    pub fn resource_type(&self) -> &'static str {
        match self {
            TrackingResource::Namespace => namespace::RESOURCE_TYPE,
            TrackingResource::CouchbaseCluster => couchbase_cluster::RESOURCE_TYPE,
        }
    }

    /// Locate the instance a pod belongs to. Derived from labels and namespace only.
    pub fn instance_for(&self, pod: &Pod) -> Option<TrackingInstance> {
        match self {
            TrackingResource::Namespace => namespace::instance_for(pod),
            TrackingResource::CouchbaseCluster => couchbase_cluster::instance_for(pod),
        }
    }

    /// Whether pods of this instance are recreated under the same name and so
    /// need a tracking annotation. Only gates writes, never reads or clears.
    pub fn should_track(&self, instance: &DynamicObject) -> bool {
        match self {
            TrackingResource::Namespace => true,
            TrackingResource::CouchbaseCluster => couchbase_cluster::should_track(instance),
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        match self {
            TrackingResource::Namespace => namespace::api_resource(),
            TrackingResource::CouchbaseCluster => couchbase_cluster::api_resource(),
        }
    }

    /// Address the collection holding an instance through the dynamic API
    pub fn api(&self, client: Client, instance: &TrackingInstance) -> Api<DynamicObject> {
        let ar = self.api_resource();
        match instance.namespace.as_deref() {
            Some(ns) => Api::namespaced_with(client, ns, &ar),
            None => Api::all_with(client, &ar),
        }
    }
}

impl fmt::Display for TrackingResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_type())
    }
}

/// Set of tracking resources selectable by configuration.
///
/// Built once at startup and consulted while loading the configuration.
#[derive(Debug, Clone)]
pub struct TrackingRegistry {
    resources: Vec<TrackingResource>,
    fallback: TrackingResource,
}

impl TrackingRegistry {
    pub fn builtin() -> Self {
        Self {
            resources: vec![
                TrackingResource::Namespace,
                TrackingResource::CouchbaseCluster,
            ],
            fallback: TrackingResource::CouchbaseCluster,
        }
    }

    pub fn get(&self, resource_type: &str) -> Option<TrackingResource> {
        self.resources
            .iter()
            .copied()
            .find(|r| r.resource_type().eq_ignore_ascii_case(resource_type.trim()))
    }

    /// Look up a tracking resource, falling back to the default for unknown types
    pub fn resolve(&self, resource_type: &str) -> TrackingResource {
        self.get(resource_type).unwrap_or_else(|| {
            warn!(
                "Unknown tracking resource type '{}' (known: {}), defaulting to {}",
                resource_type,
                self.resource_types().collect::<Vec<_>>().join(", "),
                self.fallback
            );
            self.fallback
        })
    }

    pub fn default_resource(&self) -> TrackingResource {
        self.fallback
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.iter().map(|r| r.resource_type())
    }
}

impl Default for TrackingRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Annotation key flagging a pod as already marked for rescheduling
pub fn tracking_annotation(pod_name: &str, pod_namespace: &str) -> String {
    format!("{}{}.{}", ANNOTATION_PREFIX, pod_namespace, pod_name)
}
