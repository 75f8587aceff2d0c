// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Outcome of an eviction decision

use crate::constants::messages;
use http::StatusCode;
use std::fmt;

/// Machine readable reason attached to a denial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotFound,
    TooManyRequests,
    InternalError,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NotFound => "NotFound",
            DenyReason::TooManyRequests => "TooManyRequests",
            DenyReason::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny {
        code: StatusCode,
        reason: DenyReason,
        message: &'static str,
    },
}

impl Verdict {
    fn deny(code: StatusCode, reason: DenyReason, message: &'static str) -> Self {
        Verdict::Deny {
            code,
            reason,
            message,
        }
    }

    fn internal_error(message: &'static str) -> Self {
        Self::deny(StatusCode::INTERNAL_SERVER_ERROR, DenyReason::InternalError, message)
    }

    /// The pod no longer exists; drain treats the 404 as done
    pub fn pod_rescheduled() -> Self {
        Self::deny(StatusCode::NOT_FOUND, DenyReason::NotFound, messages::POD_RESCHEDULED)
    }

    /// A pod recreated under a previously tracked name.
    ///
    /// Shares reason `NotFound` with [`Verdict::pod_rescheduled`]; the drain only
    /// looks at the 404, and the message tells the two apart.
    pub fn pod_rescheduled_with_same_name() -> Self {
        Self::deny(
            StatusCode::NOT_FOUND,
            DenyReason::NotFound,
            messages::POD_RESCHEDULED_WITH_SAME_NAME,
        )
    }

    pub fn waiting_for_reschedule() -> Self {
        Self::deny(
            StatusCode::TOO_MANY_REQUESTS,
            DenyReason::TooManyRequests,
            messages::POD_WAITING_FOR_RESCHEDULE,
        )
    }

    pub fn reschedule_requested() -> Self {
        Self::deny(
            StatusCode::TOO_MANY_REQUESTS,
            DenyReason::TooManyRequests,
            messages::RESCHEDULE_ANNOTATION_ADDED,
        )
    }

    pub fn failed_to_get_pod() -> Self {
        Self::internal_error(messages::FAILED_TO_GET_POD)
    }

    pub fn failed_to_get_tracking_resource() -> Self {
        Self::internal_error(messages::FAILED_TO_GET_TRACKING_RESOURCE)
    }

    pub fn failed_to_remove_tracking_annotation() -> Self {
        Self::internal_error(messages::FAILED_TO_REMOVE_TRACKING_ANNOTATION)
    }

    pub fn failed_to_add_tracking_annotation() -> Self {
        Self::internal_error(messages::FAILED_TO_ADD_TRACKING_ANNOTATION)
    }

    pub fn failed_to_add_reschedule_annotation() -> Self {
        Self::internal_error(messages::FAILED_TO_ADD_RESCHEDULE_ANNOTATION)
    }

    pub fn timed_out() -> Self {
        Self::internal_error(messages::DECISION_TIMED_OUT)
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn code(&self) -> Option<StatusCode> {
        match self {
            Verdict::Allow => None,
            Verdict::Deny { code, .. } => Some(*code),
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            Verdict::Allow => None,
            Verdict::Deny { message, .. } => Some(*message),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Allow => f.write_str("allow"),
            Verdict::Deny {
                code,
                reason,
                message,
            } => write!(f, "deny {} {}: {}", code.as_u16(), reason, message),
        }
    }
}
