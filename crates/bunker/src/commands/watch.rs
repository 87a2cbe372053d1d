//! Live watch: keep caches in sync with the change feed and print every
//! change until Ctrl-C.
//!
//! Table/plain output prints human-readable lines; structured formats
//! print one compact JSON object per line.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bunker_core::{
    CacheState, CacheStatus, ChangeEvent, ConnectionState, ConnectionStatus, CoreError, Inventory,
    RecordId, RecordStream, RemoteResource, Resource, ResourceCache, ResourceKind, Snapshot,
};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::records::Listing;
use super::with_record_type;

pub async fn handle(
    inventory: &Inventory,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut kinds = if args.kinds.is_empty() {
        inventory.kinds()
    } else {
        args.kinds
    };
    kinds.sort();
    kinds.dedup();

    let printer = Printer {
        structured: !matches!(global.output, OutputFormat::Table | OutputFormat::Plain),
        color: output::should_color(&global.color),
    };

    inventory.start().await;

    let mut tasks = JoinSet::new();
    tasks.spawn(watch_connection(inventory.connection_state(), printer));
    if args.events {
        tasks.spawn(watch_events(inventory.events(), printer));
    }
    for kind in kinds {
        let inventory = inventory.clone();
        with_record_type!(kind, R => {
            tasks.spawn(watch_kind::<R>(inventory, printer));
        });
    }

    tokio::signal::ctrl_c().await?;
    tasks.abort_all();
    inventory.shutdown().await;
    Ok(())
}

// ── Watch tasks ──────────────────────────────────────────────────────

async fn watch_kind<R: Listing>(inventory: Inventory, printer: Printer) {
    let mut feed = KindWatch::new(inventory.caches().of::<R>());
    while let Some(update) = feed.next().await {
        match update {
            KindUpdate::Changes { diff, total } => printer.changes(&diff, total),
            KindUpdate::Failed(e) => printer.failed(R::KIND, &e),
        }
    }
}

/// One cache's changes as seen from the moment the watch began.
///
/// Created before the first load, so the loaded records arrive as the
/// first diff and nothing applied after them is missed.
struct KindWatch<R: Resource> {
    status: watch::Receiver<CacheState>,
    stream: RecordStream<R>,
    previous: Snapshot<R>,
}

enum KindUpdate<R> {
    Changes { diff: Diff<R>, total: usize },
    Failed(CoreError),
}

impl<R: Resource> KindWatch<R> {
    fn new<S: RemoteResource<R>>(cache: &ResourceCache<R, S>) -> Self {
        let status = cache.status();
        // Starts the first load on an idle cache.
        let stream = cache.subscribe();
        let previous = stream.current().clone();
        Self {
            status,
            stream,
            previous,
        }
    }

    /// Next non-empty diff or load failure; `None` once the cache is gone.
    async fn next(&mut self) -> Option<KindUpdate<R>> {
        loop {
            tokio::select! {
                next = self.stream.changed() => {
                    let next = next?;
                    let diff = Diff::between(self.previous.as_slice(), next.as_slice());
                    let total = next.len();
                    self.previous = next;
                    if !diff.is_empty() {
                        return Some(KindUpdate::Changes { diff, total });
                    }
                }
                changed = self.status.changed() => {
                    changed.ok()?;
                    let state = self.status.borrow_and_update().clone();
                    if let (CacheStatus::Error, Some(e)) = (state.status, state.last_error) {
                        return Some(KindUpdate::Failed(e));
                    }
                }
            }
        }
    }
}

async fn watch_connection(mut status: watch::Receiver<ConnectionStatus>, printer: Printer) {
    let mut last = status.borrow_and_update().state;
    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        if current.state != last || current.next_retry.is_some() {
            printer.connection(&current);
        }
        last = current.state;
    }
}

async fn watch_events(mut events: broadcast::Receiver<Arc<ChangeEvent>>, printer: Printer) {
    loop {
        match events.recv().await {
            Ok(event) => printer.event(&event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event printer fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

// ── Diff ─────────────────────────────────────────────────────────────

/// What changed between two snapshots of one cache.
#[derive(Debug)]
pub struct Diff<R> {
    pub added: Vec<Arc<R>>,
    pub updated: Vec<Arc<R>>,
    pub removed: Vec<RecordId>,
}

impl<R: Resource> Diff<R> {
    pub fn between(before: &[Arc<R>], after: &[Arc<R>]) -> Self {
        let old: HashMap<RecordId, &Arc<R>> = before.iter().map(|r| (r.id(), r)).collect();
        let mut seen = HashSet::with_capacity(after.len());
        let mut added = Vec::new();
        let mut updated = Vec::new();

        for record in after {
            let id = record.id();
            seen.insert(id);
            match old.get(&id) {
                None => added.push(Arc::clone(record)),
                Some(prev) if !Arc::ptr_eq(prev, record) && ***prev != **record => {
                    updated.push(Arc::clone(record));
                }
                Some(_) => {}
            }
        }

        let removed = before
            .iter()
            .map(|r| r.id())
            .filter(|id| !seen.contains(id))
            .collect();

        Self {
            added,
            updated,
            removed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

// ── Printer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Printer {
    structured: bool,
    color: bool,
}

impl Printer {
    fn emit(&self, value: &impl Serialize, text: impl FnOnce() -> String) {
        let line = if self.structured {
            match serde_json::to_string(value) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "could not serialize watch line");
                    return;
                }
            }
        } else {
            format!("{} {}", chrono::Local::now().format("%H:%M:%S"), text())
        };
        output::print_output(&line, false);
    }

    fn paint(&self, text: &str, style: fn(&str) -> String) -> String {
        if self.color { style(text) } else { text.to_owned() }
    }

    fn failed(&self, kind: ResourceKind, error: &CoreError) {
        self.emit(
            &json!({"kind": kind, "error": error.to_string()}),
            || {
                format!(
                    "{}: {}",
                    kind.label(),
                    self.paint(&error.to_string(), |s| s.red().to_string())
                )
            },
        );
    }

    fn changes<R: Listing>(&self, diff: &Diff<R>, total: usize) {
        let value = json!({
            "kind": R::KIND,
            "added": diff.added,
            "updated": diff.updated,
            "removed": diff.removed,
            "total": total,
        });
        self.emit(&value, || {
            let mut lines = vec![format!(
                "{}: +{} ~{} -{} ({total} records)",
                R::KIND.label(),
                diff.added.len(),
                diff.updated.len(),
                diff.removed.len()
            )];
            for record in &diff.added {
                let mark = self.paint("+", |s| s.green().to_string());
                lines.push(format!("  {mark} #{} {}", record.id(), record.label()));
            }
            for record in &diff.updated {
                let mark = self.paint("~", |s| s.yellow().to_string());
                lines.push(format!("  {mark} #{} {}", record.id(), record.label()));
            }
            for id in &diff.removed {
                let mark = self.paint("-", |s| s.red().to_string());
                lines.push(format!("  {mark} #{id}"));
            }
            lines.join("\n")
        });
    }

    fn connection(&self, status: &ConnectionStatus) {
        let retry_in = status
            .next_retry
            .map(|at| at.saturating_duration_since(tokio::time::Instant::now()).as_secs());
        let state = match status.state {
            ConnectionState::Connected => "connected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Disconnected => "disconnected",
        };
        let value = json!({
            "connection": state,
            "retryCount": status.retry_count,
            "retryInSecs": retry_in,
        });
        self.emit(&value, || {
            let painted = match status.state {
                ConnectionState::Connected => self.paint(state, |s| s.green().to_string()),
                ConnectionState::Connecting => self.paint(state, |s| s.yellow().to_string()),
                ConnectionState::Disconnected => self.paint(state, |s| s.red().to_string()),
            };
            match retry_in {
                Some(secs) => format!(
                    "change feed {painted}, retry #{} in {secs}s",
                    status.retry_count
                ),
                None => format!("change feed {painted}"),
            }
        });
    }

    fn event(&self, event: &ChangeEvent) {
        self.emit(&json!({ "event": event }), || {
            self.paint(&format!("event: {event}"), |s| s.dimmed().to_string())
        });
    }
}
