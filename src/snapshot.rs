//! Save and restore of playback state around transient activity

use crate::client::{settle_delay, SoundTouchClient, DEFAULT_SELECT_DELAY};
use crate::endpoint::{nodes, Endpoint};
use crate::error::Result;
use crate::models::{NowPlayingStatus, Volume};
use std::time::Duration;

/// Settle time after switching source during a restore
pub const RESTORE_SOURCE_DELAY: Duration = Duration::from_secs(2);

/// Captured device state, one slot per endpoint
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    pub now_playing: Option<NowPlayingStatus>,
    pub volume: Option<Volume>,
}

impl SnapshotStore {
    /// Drop the slot for `endpoint` so a restore skips it; false if it was empty
    pub fn remove(&mut self, endpoint: &Endpoint) -> bool {
        if *endpoint == nodes::NOW_PLAYING {
            self.now_playing.take().is_some()
        } else if *endpoint == nodes::VOLUME {
            self.volume.take().is_some()
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.now_playing = None;
        self.volume = None;
    }

    pub fn is_empty(&self) -> bool {
        self.now_playing.is_none() && self.volume.is_none()
    }
}

impl SoundTouchClient {
    /// Capture the current now-playing status and volume, replacing any earlier snapshot
    pub async fn store_snapshot(&self) -> Result<()> {
        self.snapshot_store().clear();

        let now_playing = self.get_now_playing_status(true).await?;
        let volume = self.get_volume(true).await?;
        tracing::info!(
            "Stored snapshot of '{}': {} at volume {}",
            self.device().device_name(),
            now_playing.source.as_deref().unwrap_or("unknown source"),
            volume.actual
        );

        let mut store = self.snapshot_store();
        store.now_playing = Some(now_playing);
        store.volume = Some(volume);
        Ok(())
    }

    /// Copy of the stored snapshot
    pub fn snapshot(&self) -> SnapshotStore {
        self.snapshot_store().clone()
    }

    /// Drop one slot of the stored snapshot so
    /// [`restore_snapshot`](Self::restore_snapshot) skips it
    pub fn remove_snapshot_setting(&self, endpoint: Endpoint) -> bool {
        self.snapshot_store().remove(&endpoint)
    }

    /// Return the device to the stored snapshot.
    ///
    /// When the source changed since the snapshot, the captured source is
    /// selected first and given [`RESTORE_SOURCE_DELAY`] to settle. The
    /// captured content item is then selected and given `delay` (default 5s).
    /// The captured volume level is set last. Empty slots are skipped.
    pub async fn restore_snapshot(&self, delay: Option<Duration>) -> Result<()> {
        let store = self.snapshot();
        if store.is_empty() {
            tracing::info!(
                "No snapshot stored for '{}'; nothing to restore",
                self.device().device_name()
            );
            return Ok(());
        }

        if let Some(captured) = &store.now_playing {
            let current = self.get_now_playing_status(true).await?;
            if current.source != captured.source {
                if let Some(source) = captured.source.as_deref() {
                    let account = captured
                        .content_item
                        .as_ref()
                        .and_then(|item| item.source_account.as_deref())
                        .or(captured.source_account.as_deref());
                    self.select_source(source, account, Some(RESTORE_SOURCE_DELAY))
                        .await?;
                }
            }
            if let Some(item) = &captured.content_item {
                self.select_content_item(item, Some(settle_delay(delay, DEFAULT_SELECT_DELAY)))
                    .await?;
            }
        }

        if let Some(volume) = &store.volume {
            self.set_volume_level(volume.actual).await?;
        }

        tracing::info!("Restored snapshot on '{}'", self.device().device_name());
        Ok(())
    }
}
