//! Sliding-window rate limiting per client

use axum::extract::{ConnectInfo, Request};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Client identifier used when the peer address is unknown
pub const UNKNOWN_CLIENT: &str = "unknown";

struct Windows {
    clients: HashMap<String, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

/// Bounds requests per client within a sliding window
///
/// Clients with no request in the last window are forgotten, at most once
/// per window.
pub struct RateLimiter {
    windows: Mutex<Windows>,
    ceiling: usize,
    window: Duration,
}

impl RateLimiter {
    /// Allow `ceiling` requests per client in any `window`
    pub fn new(ceiling: usize, window: Duration) -> Self {
        Self {
            windows: Mutex::new(Windows {
                clients: HashMap::new(),
                last_sweep: None,
            }),
            ceiling,
            window,
        }
    }

    /// Check and record one request from `client`
    pub fn allow(&self, client: &str) -> bool {
        self.allow_at(client, Instant::now())
    }

    /// Check and record one request from `client` at `now`
    ///
    /// Timestamps at least one window old are pruned first. A rejected
    /// request is not recorded.
    pub fn allow_at(&self, client: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        self.sweep(&mut windows, now);
        let stamps = windows.clients.entry(client.to_string()).or_default();

        while let Some(&oldest) = stamps.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if stamps.len() >= self.ceiling {
            if stamps.is_empty() {
                windows.clients.remove(client);
            }
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// Number of clients currently holding window state
    pub fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clients
            .len()
    }

    fn sweep(&self, windows: &mut Windows, now: Instant) {
        let due = windows
            .last_sweep
            .map_or(true, |last| now.saturating_duration_since(last) >= self.window);
        if !due {
            return;
        }

        let window = self.window;
        windows.clients.retain(|_, stamps| {
            stamps
                .back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < window)
        });
        windows.last_sweep = Some(now);
    }

    /// Requests per window
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Window length
    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Peer IP of a request, or [`UNKNOWN_CLIENT`] when the server was not
/// started with connection info
pub fn client_id(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
