//! Launch request contract handed to decision engines.

use gate_context::LaunchContext;
use gate_primitives::RequestId;
use serde::{Deserialize, Serialize};

/// Full request sent to a decision engine for one job launch.
///
/// The id and template name only feed log correlation; the decision depends on
/// the context alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    #[serde(default)]
    id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    context: LaunchContext,
}

impl LaunchRequest {
    /// Creates a request with a fresh id for the supplied context.
    #[must_use]
    pub fn new(context: LaunchContext) -> Self {
        Self {
            id: RequestId::random(),
            template: None,
            context,
        }
    }

    /// Overrides the request id, e.g. with one issued by the host platform.
    #[must_use]
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    /// Names the job template being launched.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        let template = template.into();
        if !template.trim().is_empty() {
            self.template = Some(template);
        }
        self
    }

    /// Returns the request id.
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the job template name, if known.
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Returns the launch payload.
    #[must_use]
    pub fn context(&self) -> &LaunchContext {
        &self.context
    }

    /// Consumes the request, returning the launch payload.
    #[must_use]
    pub fn into_context(self) -> LaunchContext {
        self.context
    }
}

impl From<LaunchContext> for LaunchRequest {
    fn from(context: LaunchContext) -> Self {
        Self::new(context)
    }
}
