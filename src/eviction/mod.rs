// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Eviction decisions.
//!
//! An eviction of a managed pod is never allowed. Instead the pod is annotated so
//! the operator reschedules it, and the eviction is denied with 429 so that the
//! drain keeps retrying until the pod is gone. Because the operator may recreate
//! the pod under the same name, marked pods are remembered on a tracking resource
//! and a recreated pod is answered with 404 once.

pub mod verdict;

use crate::config::Config;
use crate::constants::tracking::TRACKED;
use crate::error::{HookError, Result};
use crate::kubernetes::ClusterState;
use crate::tracking::{tracking_annotation, TrackingInstance, TrackingResource};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::{debug, error, info, instrument};

pub use verdict::{DenyReason, Verdict};

/// The pod an eviction request is aimed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionTarget {
    pub name: String,
    pub namespace: String,
}

impl EvictionTarget {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

/// Decide whether an eviction may proceed, annotating the pod and tracking
/// resource on the way. API errors are turned into 500 verdicts, never returned.
#[instrument(skip(config, cluster), fields(pod = %target.name, namespace = %target.namespace))]
pub async fn decide<C: ClusterState>(target: &EvictionTarget, config: &Config, cluster: &C) -> Verdict {
    info!("Handling eviction request");

    let pod = match cluster.get_pod(&target.name, &target.namespace).await {
        Ok(pod) => pod,
        Err(e) if e.is_not_found() => {
            info!("Pod no longer exists");
            return Verdict::pod_rescheduled();
        }
        Err(e) => {
            error!("Failed to get pod: {}", e);
            return Verdict::failed_to_get_pod();
        }
    };

    if !config.is_managed(&pod) {
        info!(
            "Pod does not have the {}={} label, eviction allowed",
            config.pod_label_selector_key, config.pod_label_selector_value
        );
        return Verdict::Allow;
    }

    // The marker is authoritative and must be checked before any tracking write
    if config.is_marked_for_reschedule(&pod) {
        info!("Pod waiting to be rescheduled");
        return Verdict::waiting_for_reschedule();
    }

    let flagged = if config.track_rescheduled_pods {
        match track_rescheduled_pod(&pod, target, config.tracking_resource, cluster).await {
            Tracking::Done(verdict) => return verdict,
            Tracking::Flagged { instance, key } => Some((instance, key)),
            Tracking::Skipped => None,
        }
    } else {
        None
    };

    info!("Adding reschedule annotation to pod");
    if let Err(e) = cluster
        .patch_pod_annotation(
            &target.name,
            &target.namespace,
            &config.reschedule_annotation_key,
            &config.reschedule_annotation_value,
        )
        .await
    {
        error!("Failed to add reschedule annotation to pod: {}", e);

        // A tracking flag only exists for marked pods
        if let Some((instance, key)) = flagged {
            if let Err(e) = cluster
                .patch_tracking_annotation(config.tracking_resource, &instance, &key, None)
                .await
            {
                error!("Failed to roll back tracking annotation {}: {}", key, e);
            }
        }
        return Verdict::failed_to_add_reschedule_annotation();
    }

    Verdict::reschedule_requested()
}

fn tracking_instance(
    resource: TrackingResource,
    pod: &Pod,
    target: &EvictionTarget,
) -> Result<TrackingInstance> {
    resource
        .instance_for(pod)
        .ok_or_else(|| HookError::MissingTrackingInstance {
            pod: target.name.clone(),
            namespace: target.namespace.clone(),
            resource: resource.to_string(),
        })
}

/// Outcome of the tracking step
enum Tracking {
    /// The decision ends with this verdict
    Done(Verdict),
    /// A flag was written for the pod under `key`
    Flagged { instance: TrackingInstance, key: String },
    /// The instance does not recreate pods with the same name
    Skipped,
}

/// Detect a pod recreated under a tracked name, or remember this pod before it
/// gets marked.
async fn track_rescheduled_pod<C: ClusterState>(
    pod: &Pod,
    target: &EvictionTarget,
    resource: TrackingResource,
    cluster: &C,
) -> Tracking {
    let instance = match tracking_instance(resource, pod, target) {
        Ok(instance) => instance,
        Err(e) => {
            error!("{}", e);
            return Tracking::Done(Verdict::failed_to_get_tracking_resource());
        }
    };

    let tracking_object = match cluster.get_tracking_instance(resource, &instance).await {
        Ok(object) => object,
        Err(e) => {
            error!("Failed to get {} {}: {}", resource, instance.name, e);
            return Tracking::Done(Verdict::failed_to_get_tracking_resource());
        }
    };

    let key = tracking_annotation(&target.name, &target.namespace);

    // Clearing is attempted regardless of should_track so stale flags never linger
    if tracking_object.annotations().get(&key).is_some_and(|v| v == TRACKED) {
        info!("Pod has been rescheduled with the same name");

        if let Err(e) = cluster
            .patch_tracking_annotation(resource, &instance, &key, None)
            .await
        {
            error!("Failed to remove tracking annotation: {}", e);
            return Tracking::Done(Verdict::failed_to_remove_tracking_annotation());
        }

        return Tracking::Done(Verdict::pod_rescheduled_with_same_name());
    }

    if resource.should_track(&tracking_object) {
        info!(
            tracking_resource = %instance.name,
            "Pod will be rescheduled with the same name, adding annotation to tracking resource"
        );

        if let Err(e) = cluster
            .patch_tracking_annotation(resource, &instance, &key, Some(TRACKED))
            .await
        {
            error!("Failed to add tracking annotation: {}", e);
            return Tracking::Done(Verdict::failed_to_add_tracking_annotation());
        }

        Tracking::Flagged { instance, key }
    } else {
        debug!("{} {} does not recreate pods with the same name, not tracking", resource, instance.name);
        Tracking::Skipped
    }
}
