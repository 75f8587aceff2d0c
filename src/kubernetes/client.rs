// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! [`ClusterState`] backed by a kube [`Client`]

use super::{annotation_patch, ClusterState};
use crate::error::Result;
use crate::tracking::{TrackingInstance, TrackingResource};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{DynamicObject, Patch, PatchParams},
    Api, Client,
};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct KubeClusterState {
    client: Client,
    dry_run: bool,
}

impl KubeClusterState {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            dry_run: false,
        }
    }

    /// Issue every patch as a server-side dry run
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn patch_params(&self) -> PatchParams {
        PatchParams {
            dry_run: self.dry_run,
            ..Default::default()
        }
    }
}

impl ClusterState for KubeClusterState {
    #[instrument(skip(self))]
    async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(pods.get(name).await?)
    }

    #[instrument(skip(self, resource), fields(resource = %resource))]
    async fn get_tracking_instance(
        &self,
        resource: TrackingResource,
        instance: &TrackingInstance,
    ) -> Result<DynamicObject> {
        let api = resource.api(self.client.clone(), instance);
        Ok(api.get(&instance.name).await?)
    }

    #[instrument(skip(self, resource), fields(resource = %resource, dry_run = self.dry_run))]
    async fn patch_tracking_annotation(
        &self,
        resource: TrackingResource,
        instance: &TrackingInstance,
        key: &str,
        value: Option<&str>,
    ) -> Result<()> {
        let api = resource.api(self.client.clone(), instance);
        api.patch(
            &instance.name,
            &self.patch_params(),
            &Patch::Merge(annotation_patch(key, value)),
        )
        .await?;

        debug!("Patched annotation {} on {} {}", key, resource, instance.name);
        Ok(())
    }

    #[instrument(skip(self), fields(dry_run = self.dry_run))]
    async fn patch_pod_annotation(
        &self,
        name: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        pods.patch(
            name,
            &self.patch_params(),
            &Patch::Merge(annotation_patch(key, Some(value))),
        )
        .await?;

        debug!("Patched annotation {} on pod {}/{}", key, namespace, name);
        Ok(())
    }
}
