// On-call shift calendar
// Main entry point

use oncall_calendar::models::settings::ConfigOverrides;
use oncall_calendar::ui_egui::CalendarApp;

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::init();

    log::info!("Starting on-call calendar");

    // Backend and team come from the environment so the same binary can
    // point at any deployment.
    let overrides = ConfigOverrides {
        events_url: std::env::var("ONCALL_EVENTS_URL").ok(),
        team: std::env::var("ONCALL_TEAM").ok(),
        user: std::env::var("ONCALL_USER").ok(),
        timezone: std::env::var("ONCALL_TZ").ok(),
        read_only: std::env::var("ONCALL_READ_ONLY")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        ..Default::default()
    };
    if overrides.events_url.is_none() {
        log::warn!("ONCALL_EVENTS_URL not set, running without a backend");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("On-Call Calendar"),
        ..Default::default()
    };

    eframe::run_native(
        "On-Call Calendar",
        options,
        Box::new(move |_cc| Ok(Box::new(CalendarApp::new(overrides)))),
    )
}
