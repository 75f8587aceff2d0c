// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! AdmissionReview envelopes for eviction requests

use crate::error::{HookError, Result};
use crate::eviction::{EvictionTarget, Verdict};
use k8s_openapi::api::policy::v1::Eviction;
use serde::{Deserialize, Serialize};

const API_VERSION: &str = "admission.k8s.io/v1";
const KIND: &str = "AdmissionReview";

/// Incoming AdmissionReview, reduced to the fields the hook reads
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    pub request: Option<AdmissionRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub object: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub response: AdmissionResponse,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionStatus>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AdmissionStatus {
    pub status: &'static str,
    pub message: &'static str,
    pub reason: &'static str,
    pub code: u16,
}

/// What the engine needs from a decoded eviction review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionReview {
    pub uid: String,
    pub target: EvictionTarget,
    pub dry_run: bool,
}

/// Decode an AdmissionReview carrying an Eviction
pub fn parse_review(body: &[u8]) -> Result<EvictionReview> {
    let review: AdmissionReview = serde_json::from_slice(body)
        .map_err(|e| HookError::InvalidRequest(format!("Failed to decode admission review: {}", e)))?;

    let request = review
        .request
        .ok_or_else(|| HookError::InvalidRequest("Admission review has no request".to_string()))?;

    let object = request
        .object
        .ok_or_else(|| HookError::InvalidRequest("Admission request has no object".to_string()))?;

    let eviction: Eviction = serde_json::from_value(object)
        .map_err(|e| HookError::InvalidRequest(format!("Failed to decode eviction request: {}", e)))?;

    let name = eviction
        .metadata
        .name
        .or(request.name)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| HookError::InvalidRequest("Eviction has no pod name".to_string()))?;
    let namespace = eviction
        .metadata
        .namespace
        .or(request.namespace)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| HookError::InvalidRequest("Eviction has no pod namespace".to_string()))?;

    Ok(EvictionReview {
        uid: request.uid,
        target: EvictionTarget { name, namespace },
        dry_run: request.dry_run.unwrap_or(false),
    })
}

/// Wrap a verdict in the AdmissionReview answering request `uid`
pub fn review_response(uid: &str, verdict: &Verdict) -> AdmissionReviewResponse {
    let response = match verdict {
        Verdict::Allow => AdmissionResponse {
            uid: uid.to_string(),
            allowed: true,
            status: None,
        },
        Verdict::Deny {
            code,
            reason,
            message,
        } => AdmissionResponse {
            uid: uid.to_string(),
            allowed: false,
            status: Some(AdmissionStatus {
                status: "Failure",
                message,
                reason: reason.as_str(),
                code: code.as_u16(),
            }),
        },
    };

    AdmissionReviewResponse {
        api_version: API_VERSION,
        kind: KIND,
        response,
    }
}
