// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Defaults for the recognized configuration options
pub mod defaults {
    pub const POD_LABEL_SELECTOR_KEY: &str = "app";
    pub const POD_LABEL_SELECTOR_VALUE: &str = "couchbase";
    pub const RESCHEDULE_ANNOTATION_KEY: &str = "cao.couchbase.com/reschedule";
    pub const RESCHEDULE_ANNOTATION_VALUE: &str = "true";
    pub const TRACK_RESCHEDULED_PODS: bool = true;
    pub const TLS_CERT_FILE: &str = "/etc/webhook/certs/tls.crt";
    pub const TLS_KEY_FILE: &str = "/etc/webhook/certs/tls.key";
    pub const LISTEN_ADDR: &str = "0.0.0.0:8443";
}

/// Annotation keys written to tracking resources
pub mod tracking {
    /// Prefix of the per-pod tracking flag, followed by `<namespace>.<name>`
    pub const ANNOTATION_PREFIX: &str = "reschedule.hook/";
    /// Value stored under a per-pod tracking flag
    pub const TRACKED: &str = "true";
}

/// Human readable messages embedded in admission responses
pub mod messages {
    pub const POD_WAITING_FOR_RESCHEDULE: &str = "Pod waiting to be rescheduled";
    pub const POD_RESCHEDULED: &str = "Pod has been rescheduled";
    pub const POD_RESCHEDULED_WITH_SAME_NAME: &str = "Pod has been rescheduled with the same name";
    pub const RESCHEDULE_ANNOTATION_ADDED: &str = "Reschedule annotation added to pod";
    pub const FAILED_TO_ADD_RESCHEDULE_ANNOTATION: &str =
        "Failed to add reschedule annotation to pod";
    pub const FAILED_TO_GET_TRACKING_RESOURCE: &str =
        "Failed to get rescheduled pods tracking resource";
    pub const FAILED_TO_REMOVE_TRACKING_ANNOTATION: &str =
        "Failed to remove tracking annotation from rescheduled pods tracking resource";
    pub const FAILED_TO_ADD_TRACKING_ANNOTATION: &str =
        "Failed to add annotation to rescheduled pods tracking resource";
    pub const FAILED_TO_GET_POD: &str = "Failed to get pod";
    pub const DECISION_TIMED_OUT: &str = "Timed out handling eviction request";
}

/// HTTP server settings
pub mod server {
    pub const EVICTION_PATH: &str = "/eviction";
    pub const READINESS_PATH: &str = "/readyz";
    pub const HEADER_READ_TIMEOUT_SECS: u64 = 10;
    pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 10;
    /// Deadline for a single eviction decision, including all API calls
    pub const DECISION_TIMEOUT_SECS: u64 = 10;
    pub const SHUTDOWN_GRACE_SECS: u64 = 10;
}
