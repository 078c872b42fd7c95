//! rfb-viewer entry point.
//!
//! Loads the configuration, wires the session loop to its collaborators, and
//! runs until Ctrl+C or until the remote side drops the connection.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()              -- TOML file, CLI flags override
//!  └─ SessionLoop::spawn()       -- owns the Session
//!  └─ input forwarding task      -- RawInputSource -> SessionHandle::input
//!  └─ viewer event task          -- ChannelObserver -> log
//!  └─ connect, wait for Ctrl+C, shutdown
//! ```
//!
//! # Protocol engine
//!
//! The `MockProtocolEngine` used here records every outbound event instead
//! of talking to a real server, and the `MockRawInputSource` stands in for
//! the platform keyboard/mouse hook.  A real build plugs in engine and hook
//! implementations for the target platform.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use rfb_core::{Modifier, ModifierState, Rect, SpecialKeys};
use rfb_viewer::application::engine::ProtocolEngine;
use rfb_viewer::application::event_loop::SessionLoop;
use rfb_viewer::application::forward_input::ReservedKeyHook;
use rfb_viewer::application::session::CredentialProvider;
use rfb_viewer::infrastructure::{
    credentials::{EnvCredentialProvider, StaticCredentialProvider},
    engine::mock::MockProtocolEngine,
    input_source::{mock::MockRawInputSource, RawInputEvent, RawInputSource},
    storage::config::{load_config, load_config_from, ViewerConfig},
    ui_bridge::{ChannelObserver, ViewerEvent},
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// RFB remote desktop viewer.
///
/// Every flag overrides the matching value from the config file.
#[derive(Debug, Parser)]
#[command(name = "rfb-viewer", about = "RFB remote desktop session controller", version)]
struct Cli {
    /// Remote host name or address.
    #[arg(long, env = "RFB_HOST")]
    host: Option<String>,

    /// Display number (port 5900 + display).
    #[arg(long, env = "RFB_DISPLAY")]
    display: Option<i32>,

    /// Explicit TCP port; overrides the display-derived port.
    #[arg(long, env = "RFB_PORT")]
    port: Option<u16>,

    /// Do not forward any local input.
    #[arg(long)]
    view_only: bool,

    /// Stretch the remote desktop to the viewport.
    #[arg(long)]
    scaled: bool,

    /// Path to a config file instead of the platform default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Environment variable holding the password, read when the server asks.
    #[arg(long, default_value = "RFB_PASSWORD")]
    password_env: String,
}

impl Cli {
    /// Applies the command-line overrides on top of `config`.
    fn apply(&self, mut config: ViewerConfig) -> ViewerConfig {
        if let Some(host) = &self.host {
            config.connection.host = host.clone();
        }
        if let Some(display) = self.display {
            config.connection.display = display;
        }
        if self.port.is_some() {
            config.connection.port = self.port;
        }
        config.connection.view_only |= self.view_only;
        config.display.scaled |= self.scaled;
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => load_config().unwrap_or_else(|e| {
            eprintln!("config unavailable ({e}); using defaults");
            ViewerConfig::default()
        }),
    };
    let config = cli.apply(config);

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    info!("rfb-viewer starting");

    // ── Collaborators ─────────────────────────────────────────────────────────
    let engine = Arc::new(MockProtocolEngine::default());
    let credentials: Arc<dyn CredentialProvider> = if std::env::var_os(&cli.password_env).is_some() {
        Arc::new(EnvCredentialProvider::new(cli.password_env.clone()))
    } else {
        Arc::new(StaticCredentialProvider::cancelling())
    };
    let (observer, mut viewer_events) = ChannelObserver::new();
    let input_source = Arc::new(MockRawInputSource::new());

    let (session_loop, handle) = SessionLoop::new(
        Arc::clone(&engine) as Arc<dyn ProtocolEngine>,
        credentials,
        Arc::new(observer),
        Arc::clone(&input_source) as Arc<dyn ReservedKeyHook>,
    );
    let session_task = session_loop.spawn();

    // ── Input forwarding ──────────────────────────────────────────────────────
    let mut raw_input = input_source.start().context("starting input source")?;
    let input_handle = handle.clone();
    tokio::spawn(async move {
        while let Some(event) = raw_input.recv().await {
            if input_handle.input(event).await.is_err() {
                break;
            }
        }
        debug!("input forwarding stopped");
    });

    // ── Viewer events ─────────────────────────────────────────────────────────
    let (lost_tx, mut lost_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(async move {
        while let Some(event) = viewer_events.recv().await {
            match event {
                ViewerEvent::ConnectComplete { width, height, name } => {
                    info!("connected to \"{name}\" ({width}x{height})");
                }
                ViewerEvent::ConnectionLost { reason } => {
                    match reason {
                        Some(reason) => warn!("connection lost: {reason}"),
                        None => info!("disconnected"),
                    }
                    let _ = lost_tx.try_send(());
                }
                ViewerEvent::ClipboardChanged { text } => {
                    info!("remote clipboard changed ({} chars)", text.chars().count());
                }
                ViewerEvent::Invalidate { rect } => {
                    debug!(?rect, "repaint");
                }
            }
        }
    });

    // ── Session ───────────────────────────────────────────────────────────────
    handle.set_viewport(config.viewport()).await?;
    let id = handle.connect(config.connect_params()).await?;
    info!(session = %id, "connect requested");

    // Exercise the pipeline with a short burst of synthetic input.
    let shift = ModifierState::empty().with(Modifier::LeftShift, true);
    for (vk_code, modifiers) in [(0x48u8, shift), (0x49, ModifierState::empty())] {
        input_source.inject_event(RawInputEvent::Key { vk_code, modifiers, pressed: true });
        input_source.inject_event(RawInputEvent::Key { vk_code, modifiers, pressed: false });
    }
    input_source.inject_event(RawInputEvent::PointerMove {
        x: 100,
        y: 100,
        modifiers: ModifierState::empty(),
    });
    if let Err(e) = handle.send_special_keys(SpecialKeys::CtrlAltDel, None).await {
        warn!("special keys not sent: {e}");
    }
    engine.deliver_update(Rect::new(0, 0, 64, 64));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("failed to listen for Ctrl+C signal: {e}");
            }
            info!("shutdown signal received");
        }
        _ = lost_rx.recv() => {}
    }

    input_source.stop();
    handle.shutdown().await?;
    session_task.await.context("session loop panicked")?;

    info!(
        key_events = engine.key_events().len(),
        pointer_events = engine.pointer_events().len(),
        "rfb-viewer stopped"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_leave_config_untouched() {
        let cli = Cli::parse_from(["rfb-viewer"]);
        let config = cli.apply(ViewerConfig::default());
        assert_eq!(config.connection.host, ViewerConfig::default().connection.host);
        assert_eq!(cli.password_env, "RFB_PASSWORD");
    }

    #[test]
    fn test_cli_flags_override_config() {
        // Arrange
        let cli = Cli::parse_from([
            "rfb-viewer", "--host", "desk.lan", "--display", "2", "--view-only", "--scaled",
        ]);

        // Act
        let config = cli.apply(ViewerConfig::default());

        // Assert
        assert_eq!(config.connection.host, "desk.lan");
        assert_eq!(config.connection.display, 2);
        assert!(config.connection.view_only);
        assert!(config.display.scaled);
    }
}
