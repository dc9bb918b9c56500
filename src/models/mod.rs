// Module exports for models

pub mod event;
pub mod role;
pub mod settings;
