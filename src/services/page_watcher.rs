//! Page watcher: the timer side of reconciliation.
//!
//! Mutation batches and location changes are turned into delayed reconcile
//! tasks, and a periodic sweep task re-arms itself forever. The watcher holds
//! no clock of its own; callers feed it millisecond timestamps, so the same
//! scheduler runs under tokio, under JavaScript timers and in tests.
//!
//! Tasks are never cancelled. A task that finds its target gone simply does
//! nothing when it runs.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::debug;

use crate::dom::AddedNode;
use crate::types::settings::TimingSettings;

/// Work the page has to do once a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchTask {
    /// Re-apply the whole stored mapping.
    Reconcile,
    /// Restore markers that went missing, then re-arm.
    Sweep,
    /// Start fading the feedback toast shown under this token.
    HideFeedback(u64),
    /// Detach the feedback toast shown under this token.
    RemoveFeedback(u64),
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due: u64,
    seq: u64,
    task: WatchTask,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Subscription on DOM mutation batches: when any added node satisfies the
/// predicate, a reconcile burst is scheduled.
#[derive(Debug, Clone)]
pub struct MutationRule {
    pub name: &'static str,
    pub matches: fn(&AddedNode) -> bool,
    pub burst_ms: Vec<u64>,
}

impl MutationRule {
    /// Fires when a conversation link is added, directly or nested.
    pub fn conversation_links(burst_ms: Vec<u64>) -> Self {
        Self {
            name: "conversation-links",
            matches: AddedNode::looks_like_conversation_link,
            burst_ms,
        }
    }
}

/// What one mutation batch triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub navigated: bool,
    pub rules_fired: Vec<&'static str>,
}

impl Observation {
    pub fn scheduled_anything(&self) -> bool {
        self.navigated || !self.rules_fired.is_empty()
    }
}

pub struct PageWatcher {
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
    last_location: Option<String>,
    navigation_burst_ms: Vec<u64>,
    sweep_interval_ms: u64,
    rules: Vec<MutationRule>,
}

impl PageWatcher {
    /// Watcher with the conversation-link rule already subscribed.
    pub fn new(timing: &TimingSettings) -> Self {
        let mut watcher = Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
            last_location: None,
            navigation_burst_ms: timing.navigation_burst_ms.clone(),
            sweep_interval_ms: timing.sweep_interval_ms,
            rules: Vec::new(),
        };
        watcher.subscribe(MutationRule::conversation_links(timing.mutation_burst_ms.clone()));
        watcher
    }

    pub fn subscribe(&mut self, rule: MutationRule) {
        self.rules.push(rule);
    }

    /// Records the starting location, schedules the startup reconciles and
    /// arms the first sweep.
    pub fn start(&mut self, now: u64, location: &str, startup_burst_ms: &[u64]) {
        self.last_location = Some(location.to_string());
        self.schedule_burst(now, startup_burst_ms, WatchTask::Reconcile);
        if self.sweep_interval_ms > 0 {
            self.schedule(now, self.sweep_interval_ms, WatchTask::Sweep);
        }
    }

    /// Feeds one mutation batch. A changed location schedules the navigation
    /// burst; each rule matching an added node schedules its own burst.
    pub fn observe(&mut self, now: u64, location: &str, added: &[AddedNode]) -> Observation {
        let mut observation = Observation::default();

        if self.last_location.as_deref() != Some(location) {
            debug!(from = ?self.last_location, to = location, "location changed");
            self.last_location = Some(location.to_string());
            let burst = self.navigation_burst_ms.clone();
            self.schedule_burst(now, &burst, WatchTask::Reconcile);
            observation.navigated = true;
        }

        let fired: Vec<(&'static str, Vec<u64>)> = self
            .rules
            .iter()
            .filter(|rule| added.iter().any(|node| (rule.matches)(node)))
            .map(|rule| (rule.name, rule.burst_ms.clone()))
            .collect();
        for (name, burst) in fired {
            debug!(rule = name, "mutation rule fired");
            self.schedule_burst(now, &burst, WatchTask::Reconcile);
            observation.rules_fired.push(name);
        }

        observation
    }

    pub fn schedule(&mut self, now: u64, delay_ms: u64, task: WatchTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled {
            due: now.saturating_add(delay_ms),
            seq,
            task,
        }));
    }

    pub fn schedule_burst(&mut self, now: u64, delays_ms: &[u64], task: WatchTask) {
        for delay in delays_ms {
            self.schedule(now, *delay, task);
        }
    }

    /// Pops every task due at `now`, earliest first. A popped sweep re-arms
    /// itself at its next slot after `now`, so a long gap yields one sweep.
    pub fn take_due(&mut self, now: u64) -> Vec<WatchTask> {
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.due > now {
                break;
            }
            let Some(Reverse(item)) = self.queue.pop() else {
                break;
            };
            if item.task == WatchTask::Sweep && self.sweep_interval_ms > 0 {
                let missed = (now - item.due) / self.sweep_interval_ms;
                let next_due = item.due + (missed + 1) * self.sweep_interval_ms;
                self.schedule(next_due, 0, WatchTask::Sweep);
            }
            due.push(item.task);
        }
        due
    }

    /// Instant of the earliest pending task.
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(s)| s.due)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of pending tasks equal to `task`.
    pub fn pending_of(&self, task: WatchTask) -> usize {
        self.queue.iter().filter(|Reverse(s)| s.task == task).count()
    }

    pub fn last_location(&self) -> Option<&str> {
        self.last_location.as_deref()
    }
}
