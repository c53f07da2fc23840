//! Backend commands queued from the panel UI to the backend worker.

use panel_core::{cancel::CancelEffect, debit::DebitEffect};

pub enum BackendCommand {
    Debit(DebitEffect),
    Cancel(CancelEffect),
}
