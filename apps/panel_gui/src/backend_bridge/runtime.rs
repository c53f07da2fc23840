//! Backend worker: owns the async runtime and the payments client, executes
//! panel effects, and pushes completion events back to the UI loop.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use panel_core::{cancel, debit, ConfiguredDashboardHost};
use payments_client::{HttpPaymentsApi, MissingPaymentsApi, PaymentsApi};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub struct BackendConfig {
    pub secret_key: String,
    pub api_base_url: String,
    pub operator_email: Option<String>,
}

pub fn launch(config: BackendConfig, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let api: Arc<dyn PaymentsApi> = if config.secret_key.is_empty() {
                tracing::warn!("no payments secret key configured; submissions will fail");
                Arc::new(MissingPaymentsApi)
            } else {
                Arc::new(HttpPaymentsApi::new(config.api_base_url, config.secret_key))
            };
            let host = ConfiguredDashboardHost {
                operator_email: config.operator_email,
            };
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Debit(effect) => {
                        if let Some(event) = debit::run_effect(api.as_ref(), &host, effect).await {
                            let _ = ui_tx.try_send(UiEvent::Debit(event));
                        }
                    }
                    BackendCommand::Cancel(effect) => {
                        if let Some(event) = cancel::run_effect(api.as_ref(), &host, effect).await {
                            let _ = ui_tx.try_send(UiEvent::Cancel(event));
                        }
                    }
                }
            }
        });
    });
}
