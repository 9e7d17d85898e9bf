use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::signal;

use realtime_sessions::auth::EnvTokenStore;
use realtime_sessions::config::Settings;
use realtime_sessions::metrics::encode_metrics;
use realtime_sessions::session::{ChannelKind, RoomMembership, SessionConnectionManager};
use realtime_sessions::telemetry::init_telemetry;

/// Command line: `session-probe [chat|call|stream ...] [--room SESSION USER ROLE]`
struct ProbeArgs {
    kinds: Vec<ChannelKind>,
    room: Option<RoomMembership>,
}

fn parse_args() -> Result<ProbeArgs> {
    let mut kinds = Vec::new();
    let mut room = None;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        if arg == "--room" {
            let (Some(session), Some(user), Some(role)) = (args.next(), args.next(), args.next())
            else {
                bail!("--room expects SESSION USER ROLE");
            };
            room = Some(RoomMembership::new(session, user, role));
        } else {
            kinds.push(arg.parse::<ChannelKind>().map_err(anyhow::Error::msg)?);
        }
    }

    if kinds.is_empty() {
        kinds.push(ChannelKind::Chat);
    }
    Ok(ProbeArgs { kinds, room })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Keep the guard alive until exit so spans are flushed
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    let args = parse_args()?;
    let token_store = Arc::new(EnvTokenStore::new(settings.auth.token_env.clone()));
    let manager = SessionConnectionManager::with_websocket(&settings, token_store);

    manager.on_status_change(|kind, state| {
        tracing::info!(kind = %kind, state = %state, "Status changed");
    });
    manager.on_connection_lost(|kind, reason| {
        tracing::error!(kind = %kind, reason = %reason, "Connection lost for good");
    });

    for kind in &args.kinds {
        let kind = *kind;
        for event in probe_events(kind) {
            manager.on(kind, event, move |payload| {
                tracing::info!(kind = %kind, event = %event, payload = %payload, "Inbound event");
            });
        }

        match manager.connect_default(kind).await {
            Ok(handle) => {
                tracing::info!(kind = %kind, connection_id = %handle.connection_id, "Connected");
                if let Some(room) = &args.room {
                    if let Err(e) = manager.join_room_as(kind, room.clone()) {
                        tracing::warn!(kind = %kind, error = %e, "Join failed");
                    }
                }
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, code = e.code(), "Connect failed");
            }
        }
    }

    shutdown_signal().await;

    manager.disconnect_all().await;
    if let Ok(metrics) = encode_metrics() {
        tracing::debug!(metrics = %metrics, "Final metrics");
    }

    tracing::info!("Probe shutdown complete");
    Ok(())
}

fn probe_events(kind: ChannelKind) -> &'static [&'static str] {
    match kind {
        ChannelKind::Chat => &["new_message", "user_typing", "messages_read", "error"],
        ChannelKind::Call => &["incoming_call", "call_accepted", "call_ended", "error"],
        ChannelKind::Stream => &[
            "new_comment",
            "new_like",
            "new_gift",
            "viewer_joined",
            "viewer_left",
            "viewer_count_updated",
            "call_request_received",
            "call_started",
            "call_finished",
            "call_ended",
            "error",
        ],
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, disconnecting");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, disconnecting");
        }
    }
}
