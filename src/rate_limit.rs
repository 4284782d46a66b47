use axum::http::HeaderMap;
use chrono::Utc;
use std::collections::HashMap;

/// Requests allowed per one-minute window, plus a burst allowance on top.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub per_minute: u32,
    pub burst: u32,
}

impl Quota {
    fn ceiling(&self) -> u32 {
        self.per_minute + self.burst
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Window {
    minute: u64,
    used: u32,
}

impl Window {
    fn try_take(&mut self, minute: u64, quota: Quota) -> bool {
        if self.minute != minute {
            *self = Window { minute, used: 0 };
        }
        if self.used >= quota.ceiling() {
            return false;
        }
        self.used += 1;
        true
    }
}

/// Fixed one-minute windows: one per client, plus one shared by everyone.
/// A request rejected by its client window does not spend global quota.
#[derive(Debug)]
pub struct RateLimiter {
    per_client: Quota,
    global: Quota,
    max_clients: usize,
    clients: HashMap<String, Window>,
    shared: Window,
}

impl RateLimiter {
    pub fn new(per_client: Quota, global: Quota, max_clients: usize) -> Self {
        Self {
            per_client,
            global,
            max_clients,
            clients: HashMap::new(),
            shared: Window::default(),
        }
    }

    pub fn admit(&mut self, client: &str) -> bool {
        self.admit_at(client, (Utc::now().timestamp() / 60) as u64)
    }

    fn admit_at(&mut self, client: &str, minute: u64) -> bool {
        if self.clients.len() > self.max_clients {
            self.clients.retain(|_, w| w.minute == minute);
        }
        let quota = self.per_client;
        self.clients
            .entry(client.to_string())
            .or_default()
            .try_take(minute, quota)
            && self.shared.try_take(minute, self.global)
    }
}

/// Client address as reported by the fronting proxy, first hop only.
pub fn client_ip(headers: &HeaderMap) -> String {
    ["cf-connecting-ip", "x-real-ip", "x-forwarded-for"]
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .and_then(|raw| raw.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
