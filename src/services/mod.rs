// Module exports for services

pub mod api;
pub mod event;
pub mod settings;
