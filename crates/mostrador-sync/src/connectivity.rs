//! # Connectivity Gate
//!
//! A declared, not probed, view of network reachability.
//!
//! The engine never pings the remote to find out whether it is online: the
//! host application tells it. Browsers/OS integrations, a successful request,
//! or an operator toggle all end up calling [`ConnectivityGate::set_online`],
//! and the sync cycle simply refuses to start while the gate is closed. The
//! worst case of a stale `true` is one failed request that flips the sale to
//! error review; a stale `false` just delays sync until the next declaration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared online/offline flag.
///
/// Clones share the same underlying flag.
#[derive(Debug, Clone)]
pub struct ConnectivityGate {
    online: Arc<AtomicBool>,
}

impl ConnectivityGate {
    /// Creates a gate with the given initial state.
    pub fn new(online: bool) -> Self {
        ConnectivityGate {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    /// Declares the device online or offline.
    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            info!(online, "Connectivity state changed");
        }
    }

    /// Whether the device is currently declared online.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

impl Default for ConnectivityGate {
    /// Starts offline: sync waits for an explicit declaration.
    fn default() -> Self {
        ConnectivityGate::new(false)
    }
}
