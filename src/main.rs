//! Money Transfer Dashboard
//!
//! Entry point.  Responsibilities:
//!   1. Initialises tracing (`RUST_LOG` overrides the default filter).
//!   2. Loads the config and builds the HTTP gateway to the transfer API.
//!   3. Hands off to the Iced application loop, starting the first refresh.

mod commands;
mod config;
mod dashboard;
mod gateway;
mod model;
mod progress;
mod reconcile;
mod scheduler;
mod store;
mod surface;
mod ui;

#[cfg(test)]
mod testing;

use std::process;

use iced::{window, Size};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{config::Config, gateway::HttpGateway};

fn main() -> iced::Result {
    // ── Logging ──────────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("transfer_dashboard=info,wgpu=warn,iced=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    // ── Config + gateway ─────────────────────────────────────────────────────
    let config = Config::load();
    let gateway = match HttpGateway::new(config.api_base_url()) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!(error = %format!("{e:#}"), "invalid api base url");
            process::exit(1);
        }
    };
    info!(
        api = config.api_base_url(),
        interval_ms = config.refresh_interval().as_millis() as u64,
        auto_refresh = config.auto_refresh,
        "starting dashboard"
    );

    // ── Launch Iced application ──────────────────────────────────────────────
    iced::application(ui::App::title, ui::App::update, ui::App::view)
        .subscription(ui::App::subscription)
        .theme(|_| iced::Theme::Light)
        .window(window::Settings {
            size: Size::new(1280.0, 860.0),
            min_size: Some(Size::new(900.0, 600.0)),
            resizable: true,
            decorations: true,
            ..Default::default()
        })
        .run_with(move || ui::App::new(config.clone(), gateway.clone()))
}
