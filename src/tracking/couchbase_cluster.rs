// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Tracking on the `CouchbaseCluster` that owns the pod.
//!
//! The cluster object is read untyped; only `spec.upgradeProcess` is inspected.

use super::TrackingInstance;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{ApiResource, DynamicObject, GroupVersionKind},
    ResourceExt,
};

pub const RESOURCE_TYPE: &str = "couchbasecluster";

/// Pod label naming the owning cluster
pub const CLUSTER_LABEL: &str = "couchbase_cluster";

/// Upgrade strategy under which the operator recreates pods with the same name
pub const IN_PLACE_UPGRADE: &str = "InPlaceUpgrade";

const GROUP: &str = "couchbase.com";
const VERSION: &str = "v2";
const KIND: &str = "CouchbaseCluster";
const PLURAL: &str = "couchbaseclusters";

pub(super) fn instance_for(pod: &Pod) -> Option<TrackingInstance> {
    let name = pod
        .labels()
        .get(CLUSTER_LABEL)
        .filter(|name| !name.is_empty())?;

    Some(TrackingInstance {
        name: name.clone(),
        namespace: pod.namespace(),
    })
}

pub(super) fn should_track(cluster: &DynamicObject) -> bool {
    cluster
        .data
        .pointer("/spec/upgradeProcess")
        .and_then(|v| v.as_str())
        .is_some_and(|process| process == IN_PLACE_UPGRADE)
}

pub(super) fn api_resource() -> ApiResource {
    ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(GROUP, VERSION, KIND), PLURAL)
}
