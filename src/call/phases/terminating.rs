//! Terminating phase (spec §4.6.6): run a terminal step's actions, hang
//! up if the softswitch hasn't already, and persist the final status.

use tracing::info;

use crate::call::phases::CallDeps;
use crate::call::session::{CallSession, FinalStatus};
use crate::error::Result;
use crate::persistence::FinalizedCall;
use crate::softswitch::Command;

pub async fn run(session: &CallSession, deps: &CallDeps, final_status: FinalStatus, hang_up: bool) -> Result<()> {
    if let Some(step) = deps.scenario.step(&session.current_step) {
        for action in &step.actions {
            deps.actions.execute(&session.call_id, action).await?;
        }
    }

    if hang_up {
        let cmd = Command::kill(&session.call_id);
        // Best-effort: the channel may already be gone if the caller hung up.
        let _ = deps.softswitch.exec_api(&cmd).await;
    }

    deps.softswitch.untrack_call(&session.call_id);

    let qualification_score = if matches!(final_status, FinalStatus::Qualified | FinalStatus::NotQualified) {
        Some(session.qualification.score())
    } else {
        None
    };

    info!(call_id = %session.call_id, status = final_status.as_str(), "call ended");
    deps.persistence
        .finalize_call(FinalizedCall {
            call_id: session.call_id.clone(),
            final_status: final_status.as_str().to_string(),
            qualification_score,
        })
        .await
}
