//! Panel shell: account-debit and cancellation forms, submit affordances,
//! outcome rows, and event plumbing to the backend worker.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use panel_core::{cancel, dashboard_payment_url, debit};
use shared::domain::{Currency, EnvironmentMode, Outcome, OutcomeKind, PaymentIntentId};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;

const CANCEL_GATE_TOOLTIP: &str = "A payment can only be canceled while its status is \
requires_payment_method, requires_capture, requires_confirmation, requires_action or, \
in rare cases, processing.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActivePanel {
    AccountDebit,
    CancelPayment,
}

pub struct PanelApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    mode: EnvironmentMode,
    dashboard_base_url: String,
    active: ActivePanel,
    debit: debit::DebitPanel,
    cancel: cancel::CancelPanel,
    source_input: String,
    amount_input: String,
    status: String,
}

impl PanelApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        mode: EnvironmentMode,
        dashboard_base_url: String,
        target: Option<PaymentIntentId>,
    ) -> Self {
        let (debit, debit_effects) = debit::init();
        let (cancel, cancel_effects) = cancel::init(target.clone());

        let mut app = Self {
            cmd_tx,
            ui_rx,
            mode,
            dashboard_base_url,
            active: if target.is_some() {
                ActivePanel::CancelPayment
            } else {
                ActivePanel::AccountDebit
            },
            debit,
            cancel,
            source_input: String::new(),
            amount_input: String::new(),
            status: String::new(),
        };

        for effect in debit_effects {
            app.dispatch(BackendCommand::Debit(effect));
        }
        for effect in cancel_effects {
            app.dispatch(BackendCommand::Cancel(effect));
        }

        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn apply_debit(&mut self, event: debit::DebitEvent) {
        let submitted_ok = matches!(&event, debit::DebitEvent::SubmitCompleted(Ok(_)));
        let (state, effects) = debit::reduce(std::mem::take(&mut self.debit), event);
        self.debit = state;
        for effect in effects {
            self.dispatch(BackendCommand::Debit(effect));
        }
        if submitted_ok {
            self.source_input.clear();
            self.amount_input.clear();
        }
    }

    fn apply_cancel(&mut self, event: cancel::CancelEvent) {
        let (state, effects) = cancel::reduce(std::mem::take(&mut self.cancel), event);
        self.cancel = state;
        for effect in effects {
            self.dispatch(BackendCommand::Cancel(effect));
        }
    }

    fn drain_backend_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Debit(event) => self.apply_debit(event),
                UiEvent::Cancel(event) => self.apply_cancel(event),
                UiEvent::Info(text) => self.status = text,
                UiEvent::BackendFailed(text) => self.status = text,
            }
        }
    }

    fn debit_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Account Debit");
        ui.label("Create charge-type account debits against a connected account.");
        ui.add_space(8.0);

        let source = ui.add(
            egui::TextEdit::singleline(&mut self.source_input)
                .hint_text("Source account ID")
                .desired_width(f32::INFINITY),
        );
        if source.changed() {
            let value = self.source_input.clone();
            self.apply_debit(debit::DebitEvent::SourceAccountChanged(value));
        }

        let amount = ui.add(
            egui::TextEdit::singleline(&mut self.amount_input)
                .hint_text("Transfer amount (minor units)")
                .desired_width(f32::INFINITY),
        );
        if amount.changed() {
            let value = parse_amount_input(&self.amount_input);
            self.apply_debit(debit::DebitEvent::AmountChanged(value));
        }

        let selected_label = self
            .debit
            .form
            .currency
            .map(|currency| currency.label())
            .unwrap_or("set the currency");
        let mut picked: Option<Currency> = None;
        egui::ComboBox::from_label("Currency")
            .selected_text(selected_label)
            .show_ui(ui, |ui| {
                for currency in Currency::ALL {
                    if ui
                        .selectable_label(
                            self.debit.form.currency == Some(currency),
                            currency.label(),
                        )
                        .clicked()
                    {
                        picked = Some(currency);
                    }
                }
            });
        if let Some(currency) = picked {
            self.apply_debit(debit::DebitEvent::CurrencyChanged(Some(currency)));
        }

        let mut acknowledged = self.debit.form.acknowledged;
        if ui
            .checkbox(
                &mut acknowledged,
                "This action will incur account debit fees in live mode",
            )
            .changed()
        {
            self.apply_debit(debit::DebitEvent::AcknowledgedChanged(acknowledged));
        }

        ui.add_space(8.0);
        let busy = self.debit.submitting;
        let valid = debit::form_is_valid(&self.debit.form);
        let clicked = ui
            .add_enabled(!busy && valid, egui::Button::new("Create account debit"))
            .clicked();
        if busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Submitting...");
            });
        }
        if clicked {
            self.apply_debit(debit::DebitEvent::SubmitPressed);
        }

        if let Some(outcome) = self.debit.outcome.clone() {
            self.outcome_row(ui, &outcome, "created");
        }
    }

    fn cancel_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Cancel PaymentIntent");
        ui.label("Cancel a PaymentIntent for non-card payments.");
        ui.add_space(8.0);

        let mut target_display = self
            .cancel
            .form
            .target
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default();
        ui.add_enabled(
            false,
            egui::TextEdit::singleline(&mut target_display)
                .hint_text("PaymentIntent ID")
                .desired_width(f32::INFINITY),
        );

        let status_text = self
            .cancel
            .form
            .current_status
            .map(|status| status.as_str())
            .unwrap_or("loading...");
        ui.label(format!("Current status: {status_text}"));

        let cancellable = cancel::is_cancellable(self.cancel.form.current_status);
        let mut acknowledged = self.cancel.form.acknowledged;
        let checkbox = ui.add_enabled(
            cancellable,
            egui::Checkbox::new(&mut acknowledged, "This action is not reversible"),
        );
        if checkbox.changed() {
            self.apply_cancel(cancel::CancelEvent::AcknowledgedChanged(acknowledged));
        }

        ui.add_space(8.0);
        let busy = self.cancel.submitting;
        let valid = cancel::form_is_valid(&self.cancel.form);
        let clicked = ui
            .add_enabled(!busy && valid, egui::Button::new("Cancel the PaymentIntent"))
            .on_disabled_hover_text(CANCEL_GATE_TOOLTIP)
            .clicked();
        if busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Submitting...");
            });
        }
        if clicked {
            self.apply_cancel(cancel::CancelEvent::SubmitPressed);
        }

        if let Some(outcome) = self.cancel.outcome.clone() {
            self.outcome_row(ui, &outcome, "canceled");
        }
    }

    fn outcome_row(&self, ui: &mut egui::Ui, outcome: &Outcome, info_prefix: &str) {
        ui.add_space(4.0);
        match outcome.kind {
            OutcomeKind::Attention => {
                ui.colored_label(ui.visuals().error_fg_color, &outcome.text);
            }
            OutcomeKind::Info => {
                ui.horizontal(|ui| {
                    ui.label(info_prefix);
                    ui.hyperlink_to(
                        &outcome.text,
                        dashboard_payment_url(&self.dashboard_base_url, self.mode, &outcome.text),
                    );
                });
            }
        }
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_backend_events();

        egui::TopBottomPanel::top("panel_switcher").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.active, ActivePanel::AccountDebit, "Account debit");
                ui.selectable_value(
                    &mut self.active,
                    ActivePanel::CancelPayment,
                    "Cancel PaymentIntent",
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("mode: {}", self.mode.as_str()));
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.small(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.active {
            ActivePanel::AccountDebit => self.debit_panel(ui),
            ActivePanel::CancelPayment => self.cancel_panel(ui),
        });

        // Backend completion events arrive outside the UI's own input cycle.
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

fn parse_amount_input(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::parse_amount_input;

    #[test]
    fn amount_input_parses_whole_minor_units_only() {
        assert_eq!(parse_amount_input("1000"), 1000);
        assert_eq!(parse_amount_input(" 250 "), 250);
        assert_eq!(parse_amount_input(""), 0);
        assert_eq!(parse_amount_input("12.50"), 0);
        assert_eq!(parse_amount_input("abc"), 0);
    }
}
