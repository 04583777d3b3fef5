//! Action dispatch (spec §6): scenario steps declare side effects as data
//! (`scenario::Action`), and this module is the only place that turns
//! them into real-world effects. Only transfer is implemented against a
//! live collaborator; the rest are explicit non-goals per spec and exist
//! as typed stand-ins so scenario authoring and routing can be tested
//! without a CRM or mail server.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::scenario::Action;
use crate::softswitch::SoftswitchApi;

#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, call_id: &str, action: &Action) -> Result<()>;
}

/// Dispatches `Transfer` to the softswitch and logs everything else as
/// unimplemented, rather than silently dropping it.
pub struct DefaultActionExecutor {
    softswitch: Arc<dyn SoftswitchApi>,
}

impl DefaultActionExecutor {
    pub fn new(softswitch: Arc<dyn SoftswitchApi>) -> Self {
        Self { softswitch }
    }
}

#[async_trait]
impl ActionExecutor for DefaultActionExecutor {
    async fn execute(&self, call_id: &str, action: &Action) -> Result<()> {
        match action {
            Action::Transfer { extension, context } => {
                let cmd = crate::softswitch::Command::transfer(call_id, extension, context);
                self.softswitch.exec_api(&cmd).await?;
                Ok(())
            }
            Action::Hangup => {
                let cmd = crate::softswitch::Command::kill(call_id);
                self.softswitch.exec_api(&cmd).await?;
                Ok(())
            }
            Action::Webhook { url, .. } => {
                warn!(call_id, url, "webhook action not implemented, skipping");
                Ok(())
            }
            Action::SendEmail { template } => {
                warn!(call_id, template, "send_email action not implemented, skipping");
                Ok(())
            }
            Action::UpdateCrm { .. } => {
                warn!(call_id, "update_crm action not implemented, skipping");
                Ok(())
            }
        }
    }
}

pub mod fakes {
    use super::*;
    use parking_lot::Mutex;

    /// Records every dispatched action for assertion in tests.
    pub struct RecordingActionExecutor {
        pub executed: Mutex<Vec<(String, Action)>>,
    }

    impl RecordingActionExecutor {
        pub fn new() -> Self {
            Self { executed: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ActionExecutor for RecordingActionExecutor {
        async fn execute(&self, call_id: &str, action: &Action) -> Result<()> {
            self.executed.lock().push((call_id.to_string(), action.clone()));
            Ok(())
        }
    }
}
