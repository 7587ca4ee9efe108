//! Turn routing: the in-process boundary the chat controller talks to.
//!
//! The controller feeds raw text chunks per turn and signals end or abort;
//! rendered HTML comes back as [`RenderUpdate`]s on the update channel. Each
//! live turn runs its own scheduler task; ended and aborted turns are
//! tombstoned so late chunks are dropped instead of resurrecting the turn.

use std::collections::{HashMap, HashSet};

use mathdown_core::Renderer;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::StreamConfig;
use crate::events::{RenderUpdate, TurnId};
use crate::session::{self, TurnCommand, TurnHandle};

pub struct RenderRouter {
    renderer: Renderer,
    config: StreamConfig,
    updates: UnboundedSender<RenderUpdate>,
    turns: HashMap<TurnId, TurnHandle>,
    closed: HashSet<TurnId>,
}

impl RenderRouter {
    pub fn new(
        renderer: Renderer,
        config: StreamConfig,
        updates: UnboundedSender<RenderUpdate>,
    ) -> Self {
        Self {
            renderer,
            config,
            updates,
            turns: HashMap::new(),
            closed: HashSet::new(),
        }
    }

    /// Appends a chunk to the turn's buffer, starting the turn on first use.
    pub fn on_chunk(&mut self, turn: TurnId, text: &str) {
        if self.closed.contains(&turn) {
            tracing::debug!(%turn, "dropping chunk for closed turn");
            return;
        }
        let handle = self.turns.entry(turn).or_insert_with(|| {
            session::spawn_turn(turn, self.renderer.clone(), self.config, self.updates.clone())
        });
        let _ = handle.commands.send(TurnCommand::Chunk(text.to_string()));
    }

    /// Ends the turn's stream: one final pass over the full buffer follows,
    /// even when no chunk ever arrived.
    pub fn on_stream_end(&mut self, turn: TurnId) {
        if self.closed.contains(&turn) {
            return;
        }
        self.closed.insert(turn);
        let handle = self.turns.remove(&turn).unwrap_or_else(|| {
            session::spawn_turn(turn, self.renderer.clone(), self.config, self.updates.clone())
        });
        let _ = handle.commands.send(TurnCommand::End);
    }

    /// Aborts the turn: pending work is discarded and nothing further is
    /// emitted for it.
    pub fn on_stream_abort(&mut self, turn: TurnId) {
        self.closed.insert(turn);
        if let Some(handle) = self.turns.remove(&turn) {
            handle.cancel.cancel();
        }
    }

    /// Aborts every live turn (e.g. the whole conversation was superseded).
    pub fn abort_all(&mut self) {
        for (turn, handle) in self.turns.drain() {
            self.closed.insert(turn);
            handle.cancel.cancel();
        }
    }

    /// Number of turns still streaming.
    pub fn live_turns(&self) -> usize {
        self.turns.len()
    }
}
