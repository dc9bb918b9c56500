mod app;
pub mod event_dialog;
pub mod views;

pub use app::CalendarApp;
