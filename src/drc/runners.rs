//! Verification runs
//!
//! A run validates the board, executes every configured check on a rayon
//! pool, de-duplicates the results by approval and applies the stored
//! approvals. Runs can be executed inline or on a background thread that
//! reports progress through a channel.

use rayon::prelude::*;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::approvals::ApprovalSet;
use super::board::BoardSnapshot;
use super::checks::{default_checks, Check};
use super::error::{DrcError, Result};
use super::messages::{summarize, Approval, RuleCheckMessage};
use super::settings::DrcSettings;

/// Progress notifications of one run
#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    Started,
    Status(String),
    /// Percentage of finished checks
    Progress(u8),
    Finished { message_count: usize },
}

/// Outcome of a completed run
#[derive(Clone, Debug)]
pub struct DrcReport {
    /// Sorted by approval
    pub messages: Vec<RuleCheckMessage>,
    /// Stored approvals that matched no message
    pub orphaned_approvals: Vec<Approval>,
    pub elapsed_ms: f64,
}

impl DrcReport {
    /// Messages not suppressed by an approval
    pub fn unapproved(&self) -> impl Iterator<Item = &RuleCheckMessage> {
        self.messages.iter().filter(|m| !m.approved)
    }
}

/// A configured catalog of checks plus the approvals to apply
pub struct DesignRuleCheck {
    settings: DrcSettings,
    checks: Vec<Box<dyn Check>>,
    approvals: ApprovalSet,
}

impl DesignRuleCheck {
    /// The checks enabled in `settings`
    pub fn new(settings: DrcSettings) -> Result<Self> {
        let checks = default_checks(&settings);
        Self::with_checks(settings, checks)
    }

    pub fn with_checks(settings: DrcSettings, checks: Vec<Box<dyn Check>>) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings, checks, approvals: ApprovalSet::new() })
    }

    pub fn with_approvals(mut self, approvals: ApprovalSet) -> Self {
        self.approvals = approvals;
        self
    }

    pub fn settings(&self) -> &DrcSettings {
        &self.settings
    }

    /// Run to completion on the calling thread
    pub fn run(&self, board: &BoardSnapshot) -> Result<DrcReport> {
        self.run_with(board, None, &AtomicBool::new(false))
    }

    /// Run with optional progress events. `cancel` is polled before each
    /// check starts; a check already running always finishes.
    pub fn run_with(
        &self,
        board: &BoardSnapshot,
        events: Option<&Sender<RunEvent>>,
        cancel: &AtomicBool,
    ) -> Result<DrcReport> {
        let start = Instant::now();
        let emit = |event: RunEvent| {
            if let Some(tx) = events {
                // A dropped receiver only means nobody is listening
                let _ = tx.send(event);
            }
        };

        board.validate()?;
        emit(RunEvent::Started);
        info!(
            checks = self.checks.len(),
            nets = board.nets.len(),
            features = board.features.len(),
            layers = board.copper_layers.len(),
            "starting design rule check"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.thread_count)
            .build()
            .map_err(|e| DrcError::ThreadPool { reason: e.to_string() })?;

        let total = self.checks.len();
        let done = AtomicUsize::new(0);
        let results: Vec<Option<Vec<RuleCheckMessage>>> = pool.install(|| {
            self.checks
                .par_iter()
                .map(|check| {
                    if cancel.load(Ordering::SeqCst) {
                        debug!(check = check.name(), "skipped, run cancelled");
                        return None;
                    }
                    emit(RunEvent::Status(format!("Check {}...", check.name())));
                    let check_start = Instant::now();
                    let messages = check.run(board, &self.settings);
                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    emit(RunEvent::Progress((finished * 100 / total) as u8));
                    info!(
                        check = check.name(),
                        messages = messages.len(),
                        elapsed = ?check_start.elapsed(),
                        "check finished"
                    );
                    Some(messages)
                })
                .collect()
        });

        if results.iter().any(Option::is_none) {
            info!(finished = done.load(Ordering::SeqCst), total, "design rule check cancelled");
            return Err(DrcError::Cancelled);
        }

        // Keyed by approval: the first message for an approval wins
        let mut unique: BTreeMap<Approval, RuleCheckMessage> = BTreeMap::new();
        for message in results.into_iter().flatten().flatten() {
            match unique.entry(message.approval.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(message);
                }
                Entry::Occupied(_) => {
                    warn!(approval = %message.approval, "dropping message with duplicate approval");
                }
            }
        }
        let mut messages: Vec<RuleCheckMessage> = unique.into_values().collect();
        let orphaned_approvals = self.approvals.apply(&mut messages);

        emit(RunEvent::Progress(100));
        emit(RunEvent::Finished { message_count: messages.len() });
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            messages = messages.len(),
            approved = messages.iter().filter(|m| m.approved).count(),
            orphaned = orphaned_approvals.len(),
            elapsed_ms,
            "design rule check completed"
        );
        debug!("\n{}", summarize(&messages));

        Ok(DrcReport { messages, orphaned_approvals, elapsed_ms })
    }

    /// Run on a background thread
    pub fn spawn(self, board: BoardSnapshot) -> RunHandle {
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let thread = thread::spawn(move || self.run_with(&board, Some(&tx), &flag));
        RunHandle { events: rx, cancel, thread }
    }
}

/// A run executing on a background thread
pub struct RunHandle {
    events: Receiver<RunEvent>,
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<Result<DrcReport>>,
}

impl RunHandle {
    /// Progress events; the channel closes when the run ends
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    /// Ask the run to stop before its next check
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the run completes
    pub fn wait(self) -> Result<DrcReport> {
        self.thread.join().map_err(|_| DrcError::WorkerPanicked)?
    }
}
