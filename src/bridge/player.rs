//! Message-passing bridge between an external player and the playback store.
//!
//! The player pushes [`PlayerEvent`]s into a bounded channel; [`PlayerBridge::pump`] drains it in
//! emission order and reduces each event into the [`PlaybackStore`]. The only frames that flow the
//! other way are user seeks ([`PlayerBridge::seek`], [`PlayerBridge::scrub_to_pixel`]).
//!
//! A channel lives exactly as long as one attach: detaching (or attaching a different player) drops
//! the receiver, so a stale player can no longer deliver events.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use tracing::{debug, info, warn};

use crate::{
    foundation::core::FrameIndex,
    store::{playback::PlaybackStore, scenes::SceneStore},
};

/// Default bounded capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Events emitted by the external player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The player rendered a new current frame.
    FrameUpdate(FrameIndex),
    /// Playback started.
    Play,
    /// Playback paused.
    Pause,
}

/// Command/event contract of the external player.
pub trait Player {
    /// Frame the player is currently showing.
    fn current_frame(&self) -> FrameIndex;
    /// Jump to `frame`.
    fn seek(&mut self, frame: FrameIndex);
    /// Start emitting events through `events`. Replaces any previous subscription.
    fn subscribe(&mut self, events: PlayerEvents);
    /// Stop emitting events.
    fn unsubscribe(&mut self);
}

/// Sending half handed to a player on attach.
#[derive(Clone, Debug)]
pub struct PlayerEvents {
    tx: SyncSender<PlayerEvent>,
}

/// Result of [`PlayerEvents::emit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Queued for the next pump.
    Queued,
    /// The channel is full; the event was dropped.
    Full,
    /// The bridge has detached; the event was dropped.
    Detached,
}

impl PlayerEvents {
    /// Queue an event without blocking.
    pub fn emit(&self, event: PlayerEvent) -> EmitOutcome {
        match self.tx.try_send(event) {
            Ok(()) => EmitOutcome::Queued,
            Err(TrySendError::Full(ev)) => {
                warn!(?ev, "player event channel full; event dropped");
                EmitOutcome::Full
            }
            Err(TrySendError::Disconnected(_)) => EmitOutcome::Detached,
        }
    }
}

/// Apply one player event to the playback store.
pub fn reduce(playback: &mut PlaybackStore, event: PlayerEvent) {
    match event {
        PlayerEvent::FrameUpdate(frame) => playback.set_frame(frame),
        PlayerEvent::Play => playback.play(),
        PlayerEvent::Pause => playback.pause(),
    }
}

/// Owner of the attached player for one mount cycle.
pub struct PlayerBridge {
    capacity: usize,
    player: Option<Box<dyn Player>>,
    rx: Option<Receiver<PlayerEvent>>,
}

impl Default for PlayerBridge {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl PlayerBridge {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            player: None,
            rx: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.player.is_some()
    }

    /// Subscribe to `player`, detaching and returning any previously attached player.
    ///
    /// The cursor is synchronised to the player's current frame.
    pub fn attach(
        &mut self,
        mut player: Box<dyn Player>,
        playback: &mut PlaybackStore,
    ) -> Option<Box<dyn Player>> {
        let previous = self.detach();
        let (tx, rx) = mpsc::sync_channel(self.capacity);
        player.subscribe(PlayerEvents { tx });
        playback.set_frame(player.current_frame());
        self.player = Some(player);
        self.rx = Some(rx);
        info!(capacity = self.capacity, "player attached");
        previous
    }

    /// Unsubscribe and release the player. Undelivered events are discarded.
    pub fn detach(&mut self) -> Option<Box<dyn Player>> {
        self.rx = None;
        let mut player = self.player.take()?;
        player.unsubscribe();
        info!("player detached");
        Some(player)
    }

    /// Drain queued events in emission order. Returns how many were applied.
    #[tracing::instrument(skip_all)]
    pub fn pump(&mut self, playback: &mut PlaybackStore, scenes: &SceneStore) -> usize {
        let Some(rx) = self.rx.as_ref() else {
            return 0;
        };
        playback.sync_duration(scenes);
        let mut applied = 0usize;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    reduce(playback, event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if applied > 0 {
            debug!(applied, frame = playback.frame().0, "player events applied");
        }
        applied
    }

    /// User seek: moves the cursor and commands the player. Returns the clamped frame.
    ///
    /// Entrance animations are suppressed until the next play so seeking does not replay them.
    pub fn seek(&mut self, frame: FrameIndex, playback: &mut PlaybackStore) -> FrameIndex {
        playback.begin_scrub();
        playback.set_frame(frame);
        let target = playback.frame();
        if let Some(player) = self.player.as_mut() {
            player.seek(target);
        }
        target
    }

    /// User scrub at a horizontal pixel offset in the preview container.
    pub fn scrub_to_pixel(&mut self, x: f64, playback: &mut PlaybackStore) -> FrameIndex {
        let frame = playback.frame_at_x(x);
        self.seek(frame, playback)
    }
}

impl Drop for PlayerBridge {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bridge/player.rs"]
mod tests;
