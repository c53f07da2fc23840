//! UI layer: the panel shell hosting both operator forms.

pub mod app;

pub use app::PanelApp;
