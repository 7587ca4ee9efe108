//! Per-turn render scheduling.
//!
//! Each turn is one tokio task owning the turn's append-only buffer. Chunks
//! re-arm a debounce timer (last-write-wins, so a burst of chunks costs one
//! pass); timer expiry runs a non-final pass over the current snapshot;
//! stream end drops any pending timer and runs exactly one final pass over
//! the complete buffer, even when it is empty. Cancellation discards the
//! turn without emitting anything further.

use mathdown_core::Renderer;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::StreamConfig;
use crate::events::{RenderUpdate, TurnId};

#[derive(Debug)]
pub(crate) enum TurnCommand {
    Chunk(String),
    End,
}

pub(crate) struct TurnHandle {
    pub(crate) commands: UnboundedSender<TurnCommand>,
    pub(crate) cancel: CancellationToken,
}

pub(crate) fn spawn_turn(
    turn_id: TurnId,
    renderer: Renderer,
    config: StreamConfig,
    updates: UnboundedSender<RenderUpdate>,
) -> TurnHandle {
    let (commands, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    tokio::spawn(run_turn(turn_id, renderer, config, rx, updates, task_cancel));
    TurnHandle { commands, cancel }
}

async fn run_turn(
    turn_id: TurnId,
    renderer: Renderer,
    config: StreamConfig,
    mut commands: UnboundedReceiver<TurnCommand>,
    updates: UnboundedSender<RenderUpdate>,
    cancel: CancellationToken,
) {
    let mut buffer = String::new();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                tracing::debug!(%turn_id, "turn aborted, discarding pending render");
                return;
            }

            cmd = commands.recv() => match cmd {
                Some(TurnCommand::Chunk(text)) => {
                    buffer.push_str(&text);
                    deadline = Some(Instant::now() + config.debounce);
                }
                Some(TurnCommand::End) => {
                    // The one final pass; any armed timer is simply dropped.
                    let html = renderer.render(&buffer, true);
                    let _ = updates.send(RenderUpdate { turn_id, html, is_final: true });
                    return;
                }
                // Command side dropped without an explicit end: abandoned turn.
                None => return,
            },

            () = sleep_until_deadline(deadline), if deadline.is_some() => {
                deadline = None;
                let html = renderer.render(&buffer, false);
                let _ = updates.send(RenderUpdate { turn_id, html, is_final: false });
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
