// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses and cluster state.

use crate::error::{HookError, Result};
use crate::kubernetes::ClusterState;
use crate::tracking::{TrackingInstance, TrackingResource};
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DynamicObject, ObjectMeta};
use kube::client::Body;
use kube::error::ErrorResponse;
use kube::Client;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request received by [`MockService`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PATCH requests matching the path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().unwrap_or_default().to_string();
        let content_type = req
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let body = req
                .into_body()
                .collect()
                .await
                .map(|c| c.to_bytes())
                .unwrap_or_default();
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path: path.clone(),
                query,
                content_type,
                body,
            });

            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("object", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock pod JSON response
pub fn pod_json(
    name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
    annotations: &BTreeMap<String, String>,
) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": labels,
            "annotations": annotations,
        }
    })
    .to_string()
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a mock CouchbaseCluster JSON response
pub fn couchbase_cluster_json(
    name: &str,
    namespace: &str,
    upgrade_process: &str,
    annotations: &BTreeMap<String, String>,
) -> String {
    serde_json::json!({
        "apiVersion": "couchbase.com/v2",
        "kind": "CouchbaseCluster",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "annotations": annotations,
        },
        "spec": {
            "upgradeProcess": upgrade_process
        }
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// Build a typed pod
pub fn make_pod(name: &str, namespace: &str, labels: &[(&str, &str)], annotations: &[(&str, &str)]) -> Pod {
    let to_map = |pairs: &[(&str, &str)]| {
        (!pairs.is_empty()).then(|| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        })
    };

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: to_map(labels),
            annotations: to_map(annotations),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Cluster operations that [`FakeCluster`] can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    GetPod,
    GetTrackingInstance,
    SetTrackingAnnotation,
    RemoveTrackingAnnotation,
    PatchPod,
}

type InstanceKey = (TrackingResource, TrackingInstance);

/// In-memory [`ClusterState`].
///
/// Every call yields to the scheduler first, so concurrent decisions interleave
/// the way they would against a remote API server. Patches apply to a single
/// annotation key, like a JSON merge patch.
#[derive(Default)]
pub struct FakeCluster {
    pods: Mutex<HashMap<(String, String), Pod>>,
    instances: Mutex<HashMap<InstanceKey, DynamicObject>>,
    failures: Mutex<HashSet<FailOn>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pod(self, pod: Pod) -> Self {
        self.put_pod(pod);
        self
    }

    pub fn with_tracking_instance(
        self,
        resource: TrackingResource,
        instance: TrackingInstance,
        spec: serde_json::Value,
    ) -> Self {
        let object = DynamicObject::new(&instance.name, &resource.api_resource())
            .data(serde_json::json!({ "spec": spec }));
        self.instances
            .lock()
            .unwrap()
            .insert((resource, instance), object);
        self
    }

    pub fn fail_on(&self, op: FailOn) {
        self.failures.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: FailOn) {
        self.failures.lock().unwrap().remove(&op);
    }

    /// Create or replace a pod, as the operator does when it recreates one
    pub fn put_pod(&self, pod: Pod) {
        let key = (
            pod.metadata.namespace.clone().unwrap_or_default(),
            pod.metadata.name.clone().unwrap_or_default(),
        );
        self.pods.lock().unwrap().insert(key, pod);
    }

    pub fn delete_pod(&self, name: &str, namespace: &str) {
        self.pods
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()));
    }

    pub fn pod(&self, name: &str, namespace: &str) -> Option<Pod> {
        self.pods
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn tracking_annotations(
        &self,
        resource: TrackingResource,
        instance: &TrackingInstance,
    ) -> BTreeMap<String, String> {
        self.instances
            .lock()
            .unwrap()
            .get(&(resource, instance.clone()))
            .and_then(|o| o.metadata.annotations.clone())
            .unwrap_or_default()
    }

    fn check(&self, op: FailOn) -> Result<()> {
        if self.failures.lock().unwrap().contains(&op) {
            return Err(api_error(500, "InternalError"));
        }
        Ok(())
    }
}

fn api_error(code: u16, reason: &str) -> HookError {
    HookError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: reason.to_string(),
        reason: reason.to_string(),
        code,
    }))
}

fn apply_annotation(meta: &mut ObjectMeta, key: &str, value: Option<&str>) {
    let annotations = meta.annotations.get_or_insert_with(BTreeMap::new);
    match value {
        Some(v) => {
            annotations.insert(key.to_string(), v.to_string());
        }
        None => {
            annotations.remove(key);
        }
    }
}

impl ClusterState for FakeCluster {
    async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod> {
        tokio::task::yield_now().await;
        self.check(FailOn::GetPod)?;
        self.pod(name, namespace)
            .ok_or_else(|| api_error(404, "NotFound"))
    }

    async fn get_tracking_instance(
        &self,
        resource: TrackingResource,
        instance: &TrackingInstance,
    ) -> Result<DynamicObject> {
        tokio::task::yield_now().await;
        self.check(FailOn::GetTrackingInstance)?;
        self.instances
            .lock()
            .unwrap()
            .get(&(resource, instance.clone()))
            .cloned()
            .ok_or_else(|| api_error(404, "NotFound"))
    }

    async fn patch_tracking_annotation(
        &self,
        resource: TrackingResource,
        instance: &TrackingInstance,
        key: &str,
        value: Option<&str>,
    ) -> Result<()> {
        tokio::task::yield_now().await;
        self.check(match value {
            Some(_) => FailOn::SetTrackingAnnotation,
            None => FailOn::RemoveTrackingAnnotation,
        })?;
        let mut instances = self.instances.lock().unwrap();
        let object = instances
            .get_mut(&(resource, instance.clone()))
            .ok_or_else(|| api_error(404, "NotFound"))?;
        apply_annotation(&mut object.metadata, key, value);
        Ok(())
    }

    async fn patch_pod_annotation(
        &self,
        name: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        tokio::task::yield_now().await;
        self.check(FailOn::PatchPod)?;
        let mut pods = self.pods.lock().unwrap();
        let pod = pods
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| api_error(404, "NotFound"))?;
        apply_annotation(&mut pod.metadata, key, Some(value));
        Ok(())
    }
}
