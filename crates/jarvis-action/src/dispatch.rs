//! Deep-link dispatch.
//!
//! Turns a resolved [`DirectiveAction`] into a delayed [`NavigationRequest`]
//! and hands it to the render surface through the [`Navigator`] trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::error::ActionError;
use crate::registry::validate_target;
use crate::types::{DirectiveAction, NavigationRequest};

/// Render-surface hook that opens a URI on the client.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Open `request.uri`. The delay has already elapsed when this is called.
    async fn navigate(&self, request: &NavigationRequest) -> Result<(), ActionError>;
}

/// Schedules navigations for resolved directives.
pub struct DeepLinkDispatcher {
    navigator: Arc<dyn Navigator>,
    delay: Duration,
}

impl DeepLinkDispatcher {
    pub fn new(navigator: Arc<dyn Navigator>, delay: Duration) -> Self {
        Self { navigator, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Build the request for an action, or `None` for unresolved actions.
    pub fn request_for(
        &self,
        action: &DirectiveAction,
    ) -> Result<Option<NavigationRequest>, ActionError> {
        match action {
            DirectiveAction::Navigate { name, target_uri } => {
                validate_target(name, target_uri)?;
                Ok(Some(NavigationRequest {
                    name: name.clone(),
                    uri: target_uri.clone(),
                    delay: self.delay,
                }))
            }
            DirectiveAction::Unresolved { .. } => Ok(None),
        }
    }

    /// Fire-and-forget: spawn a task that waits `delay` and then navigates.
    ///
    /// Returns the task handle so callers may await it; dropping the handle
    /// does not cancel the navigation.
    pub fn dispatch(
        &self,
        action: &DirectiveAction,
    ) -> Result<Option<JoinHandle<()>>, ActionError> {
        let Some(request) = self.request_for(action)? else {
            return Ok(None);
        };

        tracing::info!(
            name = %request.name,
            uri = %request.uri,
            delay_ms = request.delay.as_millis() as u64,
            navigator = self.navigator.name(),
            "Scheduling deep-link navigation"
        );

        let navigator = Arc::clone(&self.navigator);
        let handle = tokio::spawn(async move {
            if !request.delay.is_zero() {
                tokio::time::sleep(request.delay).await;
            }
            match navigator.navigate(&request).await {
                Ok(()) => tracing::debug!(uri = %request.uri, "Navigation delivered"),
                Err(e) => tracing::warn!(uri = %request.uri, error = %e, "Navigation failed"),
            }
        });
        Ok(Some(handle))
    }
}

impl std::fmt::Debug for DeepLinkDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLinkDispatcher")
            .field("navigator", &self.navigator.name())
            .field("delay", &self.delay)
            .finish()
    }
}
