mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use payments_client::config::{load_settings, prepare_api_base_url, Settings};
use shared::domain::{EnvironmentMode, PaymentIntentId};

use backend_bridge::commands::BackendCommand;
use backend_bridge::runtime::{self, BackendConfig};
use controller::events::UiEvent;
use ui::PanelApp;

#[derive(Parser, Debug)]
struct Args {
    /// Path to a panels.toml settings file.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Environment mode: "live" or "test".
    #[arg(long)]
    mode: Option<String>,
    /// PaymentIntent id injected by the hosting surface for the cancellation panel.
    #[arg(long)]
    payment_intent: Option<String>,
    /// Operator email attached to submission metadata.
    #[arg(long)]
    operator_email: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref());
    if let Some(mode) = args.mode {
        settings.mode = EnvironmentMode::parse(&mode);
    }
    if let Some(id) = args.payment_intent {
        settings.object_id = Some(id);
    }
    if let Some(email) = args.operator_email {
        settings.operator_email = Some(email);
    }

    let api_base_url = prepare_api_base_url(&settings.api_base_url).unwrap_or_else(|err| {
        tracing::warn!("falling back to the default payments api base url: {err}");
        Settings::default().api_base_url
    });

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    runtime::launch(
        BackendConfig {
            secret_key: settings.secret_key,
            api_base_url,
            operator_email: settings.operator_email,
        },
        cmd_rx,
        ui_tx,
    );

    let mode = settings.mode;
    let dashboard_base_url = settings.dashboard_base_url;
    let target = settings.object_id.map(PaymentIntentId::new);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Payment Operator Panels")
            .with_inner_size([480.0, 560.0])
            .with_min_inner_size([400.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Payment Operator Panels",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(PanelApp::new(
                cmd_tx,
                ui_rx,
                mode,
                dashboard_base_url,
                target,
            )))
        }),
    )
}
