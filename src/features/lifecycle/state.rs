//! Per-session lifecycle bookkeeping
//!
//! Process-lifetime only: the active-module pointer and window history are
//! not persisted and vanish on restart or eviction.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;

/// An interval during which a module was the session's active module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleWindow {
    pub module_name: String,
    pub init_time: DateTime<Utc>,
    /// `None` while the window is open
    pub closed_at: Option<DateTime<Utc>>,
}

impl ModuleWindow {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// Lifecycle record of one (session, module) pair; no record means uninitialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initialized,
    Closed,
}

#[derive(Debug, Clone)]
struct SessionState {
    active_module: Option<String>,
    windows: Vec<ModuleWindow>,
    lifecycle: HashMap<String, LifecycleState>,
    last_seen: DateTime<Utc>,
}

impl SessionState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            active_module: None,
            windows: Vec::new(),
            lifecycle: HashMap::new(),
            last_seen: now,
        }
    }
}

/// Session-state store, created empty and filled on first reference
///
/// Module names are stored as given; callers pass the module's canonical
/// name so windows of the same module always compare equal.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_module(&self, session_id: &str) -> Option<String> {
        self.sessions
            .get(session_id)
            .and_then(|s| s.active_module.clone())
    }

    /// Window history in creation order
    pub fn windows(&self, session_id: &str) -> Vec<ModuleWindow> {
        self.sessions
            .get(session_id)
            .map(|s| s.windows.clone())
            .unwrap_or_default()
    }

    pub fn lifecycle_state(&self, session_id: &str, module: &str) -> Option<LifecycleState> {
        self.sessions
            .get(session_id)
            .and_then(|s| s.lifecycle.get(module).copied())
    }

    /// Make `module` active and append a new open window
    pub fn open_window(&self, session_id: &str, module: &str, now: DateTime<Utc>) {
        let mut state = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new(now));
        state.active_module = Some(module.to_string());
        state.windows.push(ModuleWindow {
            module_name: module.to_string(),
            init_time: now,
            closed_at: None,
        });
        state.lifecycle.insert(module.to_string(), LifecycleState::Initialized);
        state.last_seen = now;
    }

    /// Close the most recent open window of `module`. Returns false when
    /// there was none to close.
    pub fn close_window(&self, session_id: &str, module: &str, now: DateTime<Utc>) -> bool {
        let Some(mut state) = self.sessions.get_mut(session_id) else {
            return false;
        };
        state.last_seen = now;

        if state.active_module.as_deref() == Some(module) {
            state.active_module = None;
        }

        let Some(window) = state
            .windows
            .iter_mut()
            .rev()
            .find(|w| w.is_open() && w.module_name == module)
        else {
            return false;
        };
        window.closed_at = Some(now.max(window.init_time));

        if let Some(record) = state.lifecycle.get_mut(module) {
            *record = LifecycleState::Closed;
        }
        true
    }

    pub fn touch(&self, session_id: &str, now: DateTime<Utc>) {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new(now))
            .last_seen = now;
    }

    pub fn evict(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Drop every session not seen since `cutoff`; returns the evicted ids
    pub fn evict_idle(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        let idle: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().last_seen < cutoff)
            .map(|entry| entry.key().clone())
            .collect();
        for session_id in &idle {
            self.sessions.remove(session_id);
        }
        idle
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
