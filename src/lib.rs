// On-call shift calendar
// Library root

pub mod engine;
pub mod models;
pub mod services;
pub mod ui_egui;
pub mod utils;
