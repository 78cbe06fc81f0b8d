//! Coin monitoring service
//!
//! Host-facing registry of per-call coin detection sessions. The call or
//! session manager creates one session per monitored call, feeds audio
//! frames as they arrive on either leg, and consumes coin events from the
//! service's event channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DetectorConfig;
use crate::core::{ChannelCoinSession, Direction};
use crate::{Error, Result};

/// One monitored call in the registry.
pub struct MonitoredSession {
    pub id: Uuid,
    pub call_id: String,
    pub created_at: DateTime<Utc>,
    session: ChannelCoinSession,
}

/// Coin monitoring events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CoinEvent {
    Started,
    SessionCreated {
        call_id: String,
    },
    CoinDetected {
        call_id: String,
        direction: Direction,
        total: u64,
    },
    SessionEnded {
        call_id: String,
        rx_coins: u64,
        tx_coins: u64,
    },
}

/// Registry of coin detection sessions keyed by call id.
pub struct CoinMonitorService {
    detector_config: DetectorConfig,
    max_sessions: u32,
    sessions: Arc<DashMap<String, MonitoredSession>>,
    event_tx: mpsc::UnboundedSender<CoinEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<CoinEvent>>,
    is_running: bool,
}

impl CoinMonitorService {
    pub fn new(detector_config: DetectorConfig, max_sessions: u32) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            detector_config,
            max_sessions,
            sessions: Arc::new(DashMap::new()),
            event_tx,
            event_rx: Some(event_rx),
            is_running: false,
        }
    }

    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<CoinEvent>> {
        self.event_rx.take()
    }

    pub async fn start(&mut self) -> Result<()> {
        info!(
            tone_a = self.detector_config.tone_a_freq,
            tone_b = self.detector_config.tone_b_freq,
            threshold = self.detector_config.threshold,
            "Starting coin monitor service"
        );
        self.is_running = true;
        let _ = self.event_tx.send(CoinEvent::Started);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping coin monitor service");

        let call_ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for call_id in call_ids {
            let _ = self.end_session(&call_id);
        }

        self.is_running = false;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Register a call for coin detection with the configured default
    /// sample-rate hint. Both directions start enabled per the detector
    /// configuration.
    pub fn create_session(&self, call_id: &str) -> Result<Uuid> {
        self.create_session_with_hint(call_id, self.detector_config.default_sample_rate)
    }

    /// Register a call for coin detection, pre-tuning both directions to
    /// `sample_rate_hint`.
    pub fn create_session_with_hint(&self, call_id: &str, sample_rate_hint: u32) -> Result<Uuid> {
        if self.sessions.len() >= self.max_sessions as usize {
            return Err(Error::session(format!(
                "Session limit reached ({})",
                self.max_sessions
            )));
        }
        if self.sessions.contains_key(call_id) {
            return Err(Error::session(format!(
                "Call {} is already monitored",
                call_id
            )));
        }

        let id = Uuid::new_v4();
        let session = MonitoredSession {
            id,
            call_id: call_id.to_string(),
            created_at: Utc::now(),
            session: ChannelCoinSession::new(&self.detector_config, sample_rate_hint),
        };
        self.sessions.insert(call_id.to_string(), session);

        let _ = self.event_tx.send(CoinEvent::SessionCreated {
            call_id: call_id.to_string(),
        });

        debug!(call_id, %id, "coin detection session created");
        Ok(id)
    }

    /// Feed one audio frame for a monitored call. Emits a
    /// [`CoinEvent::CoinDetected`] whenever the direction's count
    /// advances.
    pub fn process_frame(
        &self,
        call_id: &str,
        direction: Direction,
        samples: &[i16],
        sample_rate: u32,
    ) -> Result<()> {
        let mut entry = self
            .sessions
            .get_mut(call_id)
            .ok_or_else(|| Error::session(format!("No session for call {}", call_id)))?;

        let before = entry.session.coins(direction);
        entry.session.process_frame(direction, samples, sample_rate)?;
        let after = entry.session.coins(direction);

        if after > before {
            info!(call_id, %direction, total = after, "coin deposit detected");
            let _ = self.event_tx.send(CoinEvent::CoinDetected {
                call_id: call_id.to_string(),
                direction,
                total: after,
            });
        }
        Ok(())
    }

    /// Debounced coin count for one direction of a monitored call.
    pub fn query_coins(&self, call_id: &str, direction: Direction) -> Result<u64> {
        let entry = self
            .sessions
            .get(call_id)
            .ok_or_else(|| Error::session(format!("No session for call {}", call_id)))?;
        Ok(entry.session.coins(direction))
    }

    /// Toggle processing for one direction of a monitored call.
    pub fn set_direction_enabled(
        &self,
        call_id: &str,
        direction: Direction,
        enabled: bool,
    ) -> Result<()> {
        let mut entry = self
            .sessions
            .get_mut(call_id)
            .ok_or_else(|| Error::session(format!("No session for call {}", call_id)))?;
        entry.session.set_enabled(direction, enabled);
        debug!(call_id, %direction, enabled, "direction toggled");
        Ok(())
    }

    /// Remove a call from the registry, emitting its final counts.
    pub fn end_session(&self, call_id: &str) -> Result<(u64, u64)> {
        let (_, entry) = self
            .sessions
            .remove(call_id)
            .ok_or_else(|| Error::session(format!("No session for call {}", call_id)))?;

        let rx_coins = entry.session.coins(Direction::Rx);
        let tx_coins = entry.session.coins(Direction::Tx);

        let _ = self.event_tx.send(CoinEvent::SessionEnded {
            call_id: call_id.to_string(),
            rx_coins,
            tx_coins,
        });

        info!(call_id, rx_coins, tx_coins, "coin detection session ended");
        Ok((rx_coins, tx_coins))
    }
}
