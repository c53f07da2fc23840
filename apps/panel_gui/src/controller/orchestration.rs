//! Command orchestration helpers from panel actions to the backend queue.

use crossbeam_channel::{Sender, TrySendError};
use panel_core::{cancel::CancelEffect, debit::DebitEffect};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::Debit(DebitEffect::FetchOperatorEmail) => "debit_fetch_email",
        BackendCommand::Debit(DebitEffect::CreateCharge(_)) => "debit_create_charge",
        BackendCommand::Cancel(CancelEffect::FetchOperatorEmail) => "cancel_fetch_email",
        BackendCommand::Cancel(CancelEffect::FetchIntentStatus(_)) => "cancel_fetch_status",
        BackendCommand::Cancel(CancelEffect::CancelIntent { .. }) => "cancel_intent",
        BackendCommand::Cancel(CancelEffect::RefreshDashboard) => "refresh_dashboard",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "Backend queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend worker disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
        }
    }
}
