//! Hook event bus.
//!
//! Observers implement [`HookHandler`] and are registered on a
//! [`HookRegistry`]. The registry publishes typed [`HookPayload`]s to every
//! handler subscribed to the payload's [`HookEvent`]:
//!
//! - mutable events run handlers one at a time in priority order; a
//!   [`HookAction::ModifyPayload`] patch is applied to the payload before the
//!   next handler sees it, and the first [`HookAction::Block`] cancels the
//!   event;
//! - read-only events are notifications; blocks and patches are logged and
//!   ignored.
//!
//! Dispatch is synchronous so the chat send path can stay blocking; async
//! handlers are driven through [`HookHandler::handle_sync`].
//!
//! The full shell handler lives in `plume-plugins`.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use {
    anyhow::Result,
    async_trait::async_trait,
    plume_protocol::{ChatComponent, ChatTextPosition},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tokio::runtime::{Builder, Handle, RuntimeFlavor},
    tracing::{debug, info, warn},
};

use crate::types::ConnectionId;

// ── HookEvent ───────────────────────────────────────────────────────────────

/// Events that hooks can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    /// A chat line is about to be sent. Cancelable and mutable.
    ChatMessageSending,
    /// A chat line arrived (or was injected locally) for display.
    ChatMessageReceiving,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl HookEvent {
    pub const ALL: &'static [HookEvent] = &[Self::ChatMessageSending, Self::ChatMessageReceiving];

    /// Returns true if this event is a notification: handlers cannot block or
    /// modify it and may run in parallel.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ChatMessageReceiving)
    }

    /// Parse the event name used in config files (`"ChatMessageSending"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.to_string() == name)
    }
}

// ── HookPayload ─────────────────────────────────────────────────────────────

/// Typed payload carried with each hook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum HookPayload {
    ChatMessageSending {
        connection: ConnectionId,
        message: String,
    },
    ChatMessageReceiving {
        connection: ConnectionId,
        message: ChatComponent,
        position: ChatTextPosition,
        sender: Option<String>,
    },
}

/// Payload fields a patch may never overwrite.
const PROTECTED_FIELDS: &[&str] = &["event", "connection"];

impl HookPayload {
    /// Returns the [`HookEvent`] variant that matches this payload.
    pub fn event(&self) -> HookEvent {
        match self {
            Self::ChatMessageSending { .. } => HookEvent::ChatMessageSending,
            Self::ChatMessageReceiving { .. } => HookEvent::ChatMessageReceiving,
        }
    }

    pub fn connection(&self) -> &ConnectionId {
        match self {
            Self::ChatMessageSending { connection, .. }
            | Self::ChatMessageReceiving { connection, .. } => connection,
        }
    }

    /// Merge a JSON object patch into this payload in place.
    ///
    /// Top-level keys replace the matching payload field. `event` and
    /// `connection` are never overwritten. On error the payload is unchanged.
    pub fn apply_patch(&mut self, patch: &Value) -> crate::Result<()> {
        let event = self.event();
        let Value::Object(fields) = patch else {
            return Err(crate::Error::invalid_patch(event, "expected a JSON object"));
        };

        let mut current = serde_json::to_value(&*self)?;
        if let Value::Object(map) = &mut current {
            for (key, value) in fields {
                if PROTECTED_FIELDS.contains(&key.as_str()) {
                    debug!(event = %event, field = %key, "ignoring patch to protected field");
                    continue;
                }
                map.insert(key.clone(), value.clone());
            }
        }

        *self = serde_json::from_value(current)
            .map_err(|e| crate::Error::invalid_patch(event, e))?;
        Ok(())
    }
}

// ── HookAction ──────────────────────────────────────────────────────────────

/// The outcome a hook handler returns.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum HookAction {
    /// Let the event proceed normally.
    #[default]
    Continue,
    /// Replace payload fields, e.g. `{"message": "/help"}`.
    ModifyPayload(Value),
    /// Cancel the event, with a reason string.
    Block(String),
}

// ── HookHandler trait ───────────────────────────────────────────────────────

/// Trait implemented by both native and shell hook handlers.
#[async_trait]
pub trait HookHandler: Send + Sync {
    /// A human-readable name for this handler.
    fn name(&self) -> &str;

    /// Which events this handler subscribes to.
    fn events(&self) -> &[HookEvent];

    /// Priority for ordering. Higher values run first. Default is 0.
    fn priority(&self) -> i32 {
        0
    }

    /// Handle the event, returning an action that may modify or block the flow.
    async fn handle(&self, event: HookEvent, payload: &HookPayload) -> Result<HookAction>;

    /// Synchronous handle for the dispatcher's blocking send path.
    ///
    /// The default drives the async [`handle`](Self::handle) to completion.
    /// Inside a multi-threaded runtime it uses `block_in_place`; anywhere else
    /// the future runs on a private current-thread runtime.
    fn handle_sync(&self, event: HookEvent, payload: &HookPayload) -> Result<HookAction> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.handle(event, payload)))
            },
            // The only worker thread cannot be blocked.
            Ok(_) => std::thread::scope(|scope| {
                scope
                    .spawn(|| block_on_fresh_runtime(self.handle(event, payload)))
                    .join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("hook handler panicked")))
            }),
            Err(_) => block_on_fresh_runtime(self.handle(event, payload)),
        }
    }
}

fn block_on_fresh_runtime(fut: impl Future<Output = Result<HookAction>>) -> Result<HookAction> {
    Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(fut)
}

// ── HookStats ───────────────────────────────────────────────────────────────

/// Per-handler health statistics for circuit breaker logic.
pub struct HookStats {
    pub call_count: AtomicU64,
    pub failure_count: AtomicU64,
    pub consecutive_failures: AtomicU64,
    pub block_count: AtomicU64,
    pub total_latency_us: AtomicU64,
    pub disabled: AtomicBool,
    pub disabled_at: std::sync::Mutex<Option<Instant>>,
}

impl HookStats {
    pub fn new() -> Self {
        Self {
            call_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            block_count: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            disabled: AtomicBool::new(false),
            disabled_at: std::sync::Mutex::new(None),
        }
    }

    pub fn record_success(&self, latency: Duration) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, latency: Duration) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn avg_latency(&self) -> Duration {
        let calls = self.call_count.load(Ordering::Relaxed);
        if calls == 0 {
            return Duration::ZERO;
        }
        let total = self.total_latency_us.load(Ordering::Relaxed);
        Duration::from_micros(total / calls)
    }
}

impl Default for HookStats {
    fn default() -> Self {
        Self::new()
    }
}

// ── Handler entry (with stats) ──────────────────────────────────────────────

struct HandlerEntry {
    handler: Arc<dyn HookHandler>,
    stats: Arc<HookStats>,
}

// ── HookRegistry ────────────────────────────────────────────────────────────

/// Manages registered hook handlers and dispatches events to them.
pub struct HookRegistry {
    handlers: HashMap<HookEvent, Vec<HandlerEntry>>,
    /// Maximum consecutive failures before auto-disabling a handler.
    circuit_breaker_threshold: u64,
    /// Cooldown period before re-enabling a circuit-broken handler.
    circuit_breaker_cooldown: Duration,
    /// When true, Block/Modify results are logged but not applied.
    pub dry_run: bool,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            circuit_breaker_threshold: 3,
            circuit_breaker_cooldown: Duration::from_secs(60),
            dry_run: false,
        }
    }

    pub fn with_circuit_breaker(mut self, threshold: u64, cooldown: Duration) -> Self {
        self.circuit_breaker_threshold = threshold;
        self.circuit_breaker_cooldown = cooldown;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Register a handler for all events it subscribes to.
    /// Handlers are sorted by priority (descending) within each event; equal
    /// priorities keep registration order.
    pub fn register(&mut self, handler: Arc<dyn HookHandler>) {
        let stats = Arc::new(HookStats::new());
        for &event in handler.events() {
            let entry = HandlerEntry {
                handler: Arc::clone(&handler),
                stats: Arc::clone(&stats),
            };
            let handlers = self.handlers.entry(event).or_default();
            handlers.push(entry);
            handlers.sort_by_key(|h| std::cmp::Reverse(h.handler.priority()));
        }
        info!(handler = handler.name(), "hook handler registered");
    }

    /// Returns true if any handlers are registered for the given event.
    pub fn has_handlers(&self, event: HookEvent) -> bool {
        self.handlers.get(&event).is_some_and(|v| !v.is_empty())
    }

    /// Get stats for a named handler.
    pub fn handler_stats(&self, name: &str) -> Option<Arc<HookStats>> {
        self.handlers
            .values()
            .flatten()
            .find(|e| e.handler.name() == name)
            .map(|e| Arc::clone(&e.stats))
    }

    /// All registered handler names, sorted and deduplicated.
    pub fn handler_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .values()
            .flatten()
            .map(|e| e.handler.name().to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Returns true if the handler must be skipped. Trips the breaker after
    /// too many consecutive failures and re-arms it after the cooldown.
    fn check_circuit_breaker(&self, entry: &HandlerEntry) -> bool {
        let is_disabled = entry.stats.disabled.load(Ordering::Relaxed);

        if !is_disabled {
            let consecutive_failures = entry.stats.consecutive_failures.load(Ordering::Relaxed);
            if consecutive_failures >= self.circuit_breaker_threshold {
                entry.stats.disabled.store(true, Ordering::Relaxed);
                *entry
                    .stats
                    .disabled_at
                    .lock()
                    .unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
                warn!(
                    handler = entry.handler.name(),
                    "hook circuit breaker tripped after {} consecutive failures",
                    self.circuit_breaker_threshold
                );
                return true;
            }
            return false;
        }

        let disabled_at = entry
            .stats
            .disabled_at
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(at) = *disabled_at
            && at.elapsed() >= self.circuit_breaker_cooldown
        {
            drop(disabled_at);
            entry.stats.disabled.store(false, Ordering::Relaxed);
            entry.stats.consecutive_failures.store(0, Ordering::Relaxed);
            info!(
                handler = entry.handler.name(),
                "hook circuit breaker reset after cooldown"
            );
            return false;
        }
        true
    }

    /// Dispatch an event to every handler subscribed to it, in priority order.
    ///
    /// Returns [`HookAction::Block`] if a handler cancelled a mutable event,
    /// otherwise [`HookAction::Continue`]. Accepted patches have already been
    /// applied to `payload` when this returns. Runs synchronously; async
    /// handlers are bridged through [`HookHandler::handle_sync`].
    pub fn dispatch_sync(&self, payload: &mut HookPayload) -> Result<HookAction> {
        let event = payload.event();
        let Some(handlers) = self.handlers_for(event) else {
            return Ok(HookAction::Continue);
        };

        debug!(event = %event, count = handlers.len(), "dispatching hook event");

        for entry in handlers {
            if self.check_circuit_breaker(entry) {
                continue;
            }
            let start = Instant::now();
            let result = entry.handler.handle_sync(event, payload);
            let latency = start.elapsed();

            if event.is_read_only() {
                record_read_only(entry, event, result, latency);
                continue;
            }
            if let Some(reason) = self.apply_result(entry, event, result, latency, payload) {
                return Ok(HookAction::Block(reason));
            }
        }
        Ok(HookAction::Continue)
    }

    fn handlers_for(&self, event: HookEvent) -> Option<&[HandlerEntry]> {
        self.handlers
            .get(&event)
            .map(Vec::as_slice)
            .filter(|h| !h.is_empty())
    }

    /// Record a mutable-event handler result and apply its patch.
    /// Returns the block reason if the handler cancelled the event.
    fn apply_result(
        &self,
        entry: &HandlerEntry,
        event: HookEvent,
        result: Result<HookAction>,
        latency: Duration,
        payload: &mut HookPayload,
    ) -> Option<String> {
        let name = entry.handler.name();
        match result {
            Ok(HookAction::Continue) => entry.stats.record_success(latency),
            Ok(HookAction::ModifyPayload(patch)) => {
                if self.dry_run {
                    entry.stats.record_success(latency);
                    info!(handler = name, event = %event, "hook modify (dry-run, not applied)");
                } else if let Err(e) = payload.apply_patch(&patch) {
                    entry.stats.record_failure(latency);
                    warn!(handler = name, event = %event, error = %e, "hook patch rejected");
                } else {
                    entry.stats.record_success(latency);
                    debug!(handler = name, event = %event, "hook modified payload");
                }
            },
            Ok(HookAction::Block(reason)) => {
                entry.stats.record_success(latency);
                if self.dry_run {
                    info!(handler = name, event = %event, reason = %reason, "hook block (dry-run, not applied)");
                } else {
                    entry.stats.block_count.fetch_add(1, Ordering::Relaxed);
                    info!(handler = name, event = %event, reason = %reason, "hook blocked event");
                    return Some(reason);
                }
            },
            Err(e) => {
                entry.stats.record_failure(latency);
                warn!(handler = name, event = %event, error = %e, "hook handler failed");
            },
        }
        None
    }
}

fn record_read_only(
    entry: &HandlerEntry,
    event: HookEvent,
    result: Result<HookAction>,
    latency: Duration,
) {
    let name = entry.handler.name();
    match result {
        Ok(action) => {
            entry.stats.record_success(latency);
            match action {
                HookAction::Continue => {},
                HookAction::ModifyPayload(_) => {
                    debug!(handler = name, event = %event, "hook modify on read-only event (ignored)");
                },
                HookAction::Block(reason) => {
                    debug!(handler = name, event = %event, reason = %reason, "hook block on read-only event (ignored)");
                },
            }
        },
        Err(e) => {
            entry.stats.record_failure(latency);
            warn!(handler = name, event = %event, error = %e, "hook handler failed");
        },
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
