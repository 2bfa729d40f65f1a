//! Transfer accounting hooks.
//!
//! The media pipeline uses these callbacks for bandwidth estimation. Every
//! open session produces `initializing`, `started`, any number of
//! `bytes_transferred` and finally `ended`.

use std::sync::atomic::{AtomicU64, Ordering};

use url::Url;

pub trait TransferListener: Send + Sync {
    fn on_transfer_initializing(&self, _uri: &Url) {}

    fn on_transfer_start(&self, _uri: &Url) {}

    fn on_bytes_transferred(&self, uri: &Url, bytes: u64);

    fn on_transfer_end(&self, _uri: &Url) {}
}

/// Counters for transfers through any number of data sources.
#[derive(Debug, Default)]
pub struct TransferStats {
    /// Sessions that reached `open`
    pub transfers_initializing: AtomicU64,
    /// Sessions that finished `open` successfully
    pub transfers_started: AtomicU64,
    /// Sessions closed after a successful open
    pub transfers_ended: AtomicU64,
    /// Total bytes delivered to consumers
    pub bytes_transferred: AtomicU64,
}

/// Point-in-time copy of [`TransferStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferSnapshot {
    pub transfers_initializing: u64,
    pub transfers_started: u64,
    pub transfers_ended: u64,
    pub bytes_transferred: u64,
}

impl TransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfers started but not yet ended.
    pub fn active_transfers(&self) -> u64 {
        self.transfers_started
            .load(Ordering::Relaxed)
            .saturating_sub(self.transfers_ended.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> TransferSnapshot {
        TransferSnapshot {
            transfers_initializing: self.transfers_initializing.load(Ordering::Relaxed),
            transfers_started: self.transfers_started.load(Ordering::Relaxed),
            transfers_ended: self.transfers_ended.load(Ordering::Relaxed),
            bytes_transferred: self.bytes_transferred.load(Ordering::Relaxed),
        }
    }
}

impl TransferListener for TransferStats {
    fn on_transfer_initializing(&self, _uri: &Url) {
        self.transfers_initializing.fetch_add(1, Ordering::Relaxed);
    }

    fn on_transfer_start(&self, _uri: &Url) {
        self.transfers_started.fetch_add(1, Ordering::Relaxed);
    }

    fn on_bytes_transferred(&self, _uri: &Url, bytes: u64) {
        self.bytes_transferred.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_transfer_end(&self, _uri: &Url) {
        self.transfers_ended.fetch_add(1, Ordering::Relaxed);
    }
}
