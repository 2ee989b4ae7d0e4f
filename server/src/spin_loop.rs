use crate::config::ServerConfig;
use crate::planner::SpinTrajectory;
use crate::options::OptionError;
use crate::state::{ImportError, SpinEvent, WheelState};
use crate::storage::JsonFileStore;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, oneshot};
use wheel_shared::protocol::{
    ClientMsg, ExportMsg, FrameMsg, NoticeMsg, ServerMsg, SpinResultMsg, WelcomeMsg,
    PROTOCOL_VERSION,
};

/// Shown to the user when an imported file cannot be applied
pub const INVALID_FILE_NOTICE: &str = "Invalid file format";

/// Commands from client connections to the spin loop
pub enum WheelCommand {
    ClientJoin {
        response: oneshot::Sender<(u32, WelcomeMsg)>,
    },
    ClientLeave {
        id: u32,
    },
    Client {
        id: u32,
        msg: ClientMsg,
    },
}

/// Broadcasts from the spin loop to connections
#[derive(Debug, Clone)]
pub enum WheelBroadcast {
    All(ServerMsg),
    /// Reply meant for one connection only
    To { client_id: u32, msg: ServerMsg },
}

/// What a client message did to the state
#[derive(Debug)]
pub enum Applied {
    /// Items or settings changed: broadcast and persist
    Changed,
    /// A spin started
    Spin(SpinTrajectory),
    /// Nothing changed; answer the sender only
    Reply(ServerMsg),
    Ignored,
}

fn notice(message: impl Into<String>) -> Applied {
    Applied::Reply(ServerMsg::Notice(NoticeMsg {
        message: message.into(),
    }))
}

/// Apply one client message to the wheel.
pub fn apply_client_msg(state: &mut WheelState, msg: ClientMsg, now: Instant) -> Applied {
    let result = match msg {
        ClientMsg::Spin => {
            return match state.request_spin(now) {
                Some(trajectory) => Applied::Spin(trajectory),
                None => Applied::Ignored,
            };
        }
        ClientMsg::AddItem { text } => state.add_item(&text).map_err(|e| e.to_string()),
        ClientMsg::RemoveItem { index } => {
            state.remove_item(index as usize).map_err(|e| e.to_string())
        }
        ClientMsg::EditItem { index, text } => state
            .edit_item(index as usize, &text)
            .map_err(|e| e.to_string()),
        ClientMsg::ClearItems => state.clear_items().map_err(|e| e.to_string()),
        ClientMsg::LoadPreset { preset } => {
            state.load_preset(preset.into()).map_err(|e| e.to_string())
        }
        ClientMsg::SetWheelSize { size } => state.set_wheel_size(size),
        ClientMsg::SetSpinDuration { ms } => state.set_spin_duration(ms),
        ClientMsg::SetSoundEnabled { enabled } => {
            state.set_sound_enabled(enabled);
            Ok(())
        }
        ClientMsg::ToggleDarkMode => {
            state.toggle_dark_mode();
            Ok(())
        }
        ClientMsg::Import { document } => match state.import_document(&document) {
            Ok(defaulted) => {
                if !defaulted.is_empty() {
                    tracing::debug!("Import used defaults for {:?}", defaulted);
                }
                Ok(())
            }
            Err(ImportError::Options(e @ OptionError::Spinning)) => Err(e.to_string()),
            Err(e) => {
                tracing::info!("Rejected import: {}", e);
                Err(INVALID_FILE_NOTICE.to_string())
            }
        },
        ClientMsg::RestoreRotation { rotation } => {
            if !state.restore_rotation(rotation) {
                return Applied::Ignored;
            }
            tracing::debug!(
                "Rotation restored to {:.3}, pointer over {:?}",
                state.rotation(),
                state.pointer_index()
            );
            Ok(())
        }
        ClientMsg::Export => {
            return Applied::Reply(ServerMsg::Export(ExportMsg {
                document: state.export_document().to_json_pretty(),
            }));
        }
    };

    match result {
        Ok(()) => Applied::Changed,
        Err(message) => notice(message),
    }
}

async fn persist(store: &mut Option<JsonFileStore>, state: &WheelState) {
    if let Some(store) = store.as_mut() {
        store.save(&state.document()).await;
    }
}

/// Run the spin loop. Owns the wheel state and the store.
pub async fn run_spin_loop(
    mut cmd_rx: mpsc::Receiver<WheelCommand>,
    broadcast_tx: broadcast::Sender<WheelBroadcast>,
    config: ServerConfig,
) {
    let mut state = WheelState::from_config(&config);
    let mut store = config.data_path.clone().map(JsonFileStore::new);

    if let Some(document) = store.as_mut().and_then(|s| s.load()) {
        match state.apply_document(document) {
            Ok(()) => tracing::info!(
                "Restored wheel with {} items, {} history entries",
                state.options().len(),
                state.history.len()
            ),
            Err(e) => tracing::warn!("Saved wheel rejected: {}", e),
        }
    }

    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate_hz as f64);
    let mut tick_interval = tokio::time::interval(tick_duration);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut next_client_id: u32 = 1;

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                match state.tick(Instant::now()) {
                    None => {}
                    Some(SpinEvent::Frame { rotation }) => {
                        let _ = broadcast_tx.send(WheelBroadcast::All(ServerMsg::Frame(
                            FrameMsg { rotation },
                        )));
                    }
                    Some(SpinEvent::Finished(outcome)) => {
                        tracing::info!("Winner: {} (#{})", outcome.winner, outcome.winner_index);
                        let _ = broadcast_tx.send(WheelBroadcast::All(ServerMsg::Frame(
                            FrameMsg { rotation: outcome.rotation },
                        )));
                        let _ = broadcast_tx.send(WheelBroadcast::All(ServerMsg::SpinResult(
                            SpinResultMsg {
                                winner_index: outcome.winner_index as u32,
                                winner: outcome.winner,
                                rotation: outcome.rotation,
                                history: state.history.to_vec(),
                                sound_enabled: state.settings.sound_enabled,
                            },
                        )));
                        persist(&mut store, &state).await;
                    }
                }
            }

            Some(cmd) = cmd_rx.recv() => {
                match cmd {
                    WheelCommand::ClientJoin { response } => {
                        let id = next_client_id;
                        next_client_id = next_client_id.wrapping_add(1);
                        let welcome = WelcomeMsg {
                            protocol_version: PROTOCOL_VERSION,
                            server_version: env!("CARGO_PKG_VERSION").to_string(),
                            state: state.snapshot(),
                        };
                        let _ = response.send((id, welcome));
                    }
                    WheelCommand::ClientLeave { id } => {
                        tracing::info!("Client {} left", id);
                    }
                    WheelCommand::Client { id, msg } => {
                        match apply_client_msg(&mut state, msg, Instant::now()) {
                            Applied::Changed => {
                                let _ = broadcast_tx.send(WheelBroadcast::All(
                                    ServerMsg::WheelState(state.snapshot()),
                                ));
                                persist(&mut store, &state).await;
                            }
                            Applied::Spin(trajectory) => {
                                let _ = broadcast_tx.send(WheelBroadcast::All(
                                    ServerMsg::SpinStarted(trajectory.to_wire()),
                                ));
                            }
                            Applied::Reply(msg) => {
                                let _ = broadcast_tx.send(WheelBroadcast::To { client_id: id, msg });
                            }
                            Applied::Ignored => {
                                tracing::debug!("Client {} request ignored", id);
                            }
                        }
                    }
                }
            }

            else => break,
        }
    }

    tracing::info!("Spin loop ended");
}
