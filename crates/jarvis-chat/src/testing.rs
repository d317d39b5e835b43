//! Scripted inference endpoint for tests and offline runs.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::gateway::{Content, InferenceEndpoint, MediaRef};

/// Reply used when no scripted reply is queued.
pub const DEFAULT_REPLY: &str = "At your service, sir.";

/// One recorded call against a [`ScriptedEndpoint`].
#[derive(Debug, Clone)]
pub enum EndpointCall {
    Probe(String),
    Upload {
        path: PathBuf,
        /// Whether the file existed when the upload was attempted.
        existed: bool,
        mime_type: String,
    },
    Generate {
        model: String,
        contents: Vec<Content>,
    },
}

/// An [`InferenceEndpoint`] that replays queued results and records calls.
///
/// Every model probes successfully unless [`fail_probe`](Self::fail_probe)
/// says otherwise.
#[derive(Debug, Default)]
pub struct ScriptedEndpoint {
    probe_failures: Mutex<HashMap<String, GatewayError>>,
    upload_failure: Mutex<Option<GatewayError>>,
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: Mutex<Vec<EndpointCall>>,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        lock(&self.replies).push_back(Ok(text.into()));
    }

    pub fn push_error(&self, err: GatewayError) {
        lock(&self.replies).push_back(Err(err));
    }

    pub fn fail_probe(&self, model: impl Into<String>, err: GatewayError) {
        lock(&self.probe_failures).insert(model.into(), err);
    }

    pub fn fail_upload(&self, err: GatewayError) {
        *lock(&self.upload_failure) = Some(err);
    }

    pub fn calls(&self) -> Vec<EndpointCall> {
        lock(&self.calls).clone()
    }

    pub fn probe_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, EndpointCall::Probe(_)))
            .count()
    }

    pub fn generate_calls(&self) -> Vec<(String, Vec<Content>)> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                EndpointCall::Generate { model, contents } => {
                    Some((model.clone(), contents.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn uploaded_paths(&self) -> Vec<PathBuf> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                EndpointCall::Upload { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EndpointCall) {
        lock(&self.calls).push(call);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl InferenceEndpoint for ScriptedEndpoint {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn probe_model(&self, model: &str) -> Result<(), GatewayError> {
        self.record(EndpointCall::Probe(model.to_string()));
        match lock(&self.probe_failures).get(model) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<MediaRef, GatewayError> {
        self.record(EndpointCall::Upload {
            path: path.to_path_buf(),
            existed: path.exists(),
            mime_type: mime_type.to_string(),
        });
        if let Some(err) = lock(&self.upload_failure).clone() {
            return Err(err);
        }
        let name = format!("files/scripted-{}", self.uploaded_paths().len());
        Ok(MediaRef {
            uri: format!("https://scripted.invalid/v1beta/{}", name),
            name,
            mime_type: mime_type.to_string(),
        })
    }

    async fn generate(&self, model: &str, contents: &[Content]) -> Result<String, GatewayError> {
        self.record(EndpointCall::Generate {
            model: model.to_string(),
            contents: contents.to_vec(),
        });
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()))
    }
}
