// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Tracking on the pod's own `Namespace` object.

use super::TrackingInstance;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::{api::ApiResource, ResourceExt};

pub const RESOURCE_TYPE: &str = "namespace";

/// The namespace a pod lives in is its tracking instance
pub(super) fn instance_for(pod: &Pod) -> Option<TrackingInstance> {
    let namespace = pod.namespace().filter(|ns| !ns.is_empty())?;
    Some(TrackingInstance {
        name: namespace,
        namespace: None,
    })
}

pub(super) fn api_resource() -> ApiResource {
    ApiResource::erase::<Namespace>(&())
}
