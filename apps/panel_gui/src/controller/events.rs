//! Events pushed from the backend worker into the panel UI loop.

use panel_core::{cancel::CancelEvent, debit::DebitEvent};

pub enum UiEvent {
    Debit(DebitEvent),
    Cancel(CancelEvent),
    Info(String),
    BackendFailed(String),
}
