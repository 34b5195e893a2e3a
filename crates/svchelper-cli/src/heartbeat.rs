//! Heartbeat demo service

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use svchelper_core::{Service, TaskGroup};
use tracing::{debug, info};

use crate::config::HeartbeatConfig;

/// Logs a beat every interval until cancelled
///
/// While paused the timer keeps running but beats are skipped.
pub struct HeartbeatService {
    config: HeartbeatConfig,
    paused: Arc<AtomicBool>,
    beats: Arc<AtomicU64>,
}

impl HeartbeatService {
    /// New heartbeat service
    pub fn new(config: HeartbeatConfig) -> Self {
        Self {
            config,
            paused: Arc::new(AtomicBool::new(false)),
            beats: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Beats logged so far
    #[cfg(test)]
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }
}

impl Service for HeartbeatService {
    fn schedule(&self, tasks: &TaskGroup) -> anyhow::Result<()> {
        let token = tasks.token();
        let paused = self.paused.clone();
        let beats = self.beats.clone();
        let max_beats = self.config.max_beats;
        let interval = self.config.interval();

        tasks.spawn("heartbeat", async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if paused.load(Ordering::SeqCst) {
                            debug!("Paused, skipping beat");
                            continue;
                        }
                        let beat = beats.fetch_add(1, Ordering::SeqCst) + 1;
                        info!(beat, "Heartbeat");
                        if max_beats.is_some_and(|max| beat >= max) {
                            info!(beat, "Beat limit reached");
                            token.cancel();
                            break;
                        }
                    }
                }
            }
            Ok(())
        });
        Ok(())
    }

    fn pause(&self) -> anyhow::Result<()> {
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&self) -> anyhow::Result<()> {
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(max_beats: Option<u64>) -> HeartbeatConfig {
        HeartbeatConfig {
            interval_ms: 5,
            max_beats,
        }
    }

    #[tokio::test]
    async fn test_stops_itself_after_max_beats() {
        let service = HeartbeatService::new(config(Some(3)));
        let group = TaskGroup::new();
        service.schedule(&group).unwrap();

        tokio::time::timeout(Duration::from_secs(5), group.cancelled())
            .await
            .unwrap();
        assert!(group.wait().await.is_empty());
        assert_eq!(service.beats(), 3);
    }

    #[tokio::test]
    async fn test_paused_skips_beats() {
        let service = HeartbeatService::new(config(None));
        service.pause().unwrap();
        let group = TaskGroup::new();
        service.schedule(&group).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.beats(), 0);

        service.resume().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(service.beats() > 0);

        group.cancel();
        assert!(group.wait().await.is_empty());
    }
}
