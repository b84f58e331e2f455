use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Why a scan ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanReason {
    Refresh,
    Navigation,
    HeadMutation,
    Enabled,
    InitialRetry(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanScheduleConfig {
    /// Quiet period required after the last debounced trigger.
    pub debounce: Duration,
    /// Upper bound between the first debounced trigger and the scan.
    pub max_wait: Duration,
    /// Offsets from initialization for the staggered retry scans.
    pub initial_retries: Vec<Duration>,
}

impl Default for ScanScheduleConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            max_wait: Duration::from_secs(2),
            initial_retries: vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
        }
    }
}

/// Cancel-and-reschedule pacing for rescans.
///
/// Debounced triggers push the deadline out to `last + debounce`, bounded by
/// `first + max_wait`; forced triggers are due immediately; initial retries
/// are independent deadlines that coalesce with any scan running at or after
/// them.
#[derive(Debug)]
pub struct ScanSchedule {
    config: ScanScheduleConfig,
    dirty: bool,
    pending: usize,
    last_trigger: Option<Instant>,
    first_trigger: Option<Instant>,
    reason: Option<ScanReason>,
    forced_at: Option<Instant>,
    retries: VecDeque<(Instant, usize)>,
}

impl ScanSchedule {
    pub fn new(config: ScanScheduleConfig) -> Self {
        Self {
            config,
            dirty: false,
            pending: 0,
            last_trigger: None,
            first_trigger: None,
            reason: None,
            forced_at: None,
            retries: VecDeque::new(),
        }
    }

    pub const fn config(&self) -> &ScanScheduleConfig {
        &self.config
    }

    /// Debounced trigger: reschedules any pending deadline.
    pub fn trigger(&mut self, reason: ScanReason, now: Instant) {
        self.pending += 1;
        self.reason = Some(reason);
        self.last_trigger = Some(now);
        self.first_trigger.get_or_insert(now);
        self.dirty = true;
    }

    /// Immediate trigger (explicit refresh): due at `now`.
    pub fn force(&mut self, reason: ScanReason, now: Instant) {
        self.pending += 1;
        self.reason = Some(reason);
        self.forced_at.get_or_insert(now);
        self.dirty = true;
    }

    /// Arm the staggered retry scans relative to `start`, replacing any
    /// previously armed set.
    pub fn arm_initial_retries(&mut self, start: Instant) {
        self.retries = self
            .config
            .initial_retries
            .iter()
            .enumerate()
            .map(|(idx, offset)| (start + *offset, idx + 1))
            .collect();
    }

    /// Drop every pending trigger and retry.
    pub fn cancel(&mut self) {
        self.reset_debounce();
        self.retries.clear();
    }

    pub const fn pending(&self) -> usize {
        self.pending
    }

    pub fn retries_remaining(&self) -> usize {
        self.retries.len()
    }

    pub fn is_idle(&self) -> bool {
        !self.dirty && self.retries.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let debounced = self.debounced_deadline();
        let retry = self.retries.front().map(|(at, _)| *at);
        match (debounced, retry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns the reason of the scan due at `now`, consuming the trigger and
    /// every retry that is already due.
    pub fn take_due(&mut self, now: Instant) -> Option<ScanReason> {
        let mut due_retry = None;
        while let Some((at, idx)) = self.retries.front().copied() {
            if at > now {
                break;
            }
            self.retries.pop_front();
            due_retry = Some(idx);
        }

        if self.debounced_deadline().is_some_and(|deadline| deadline <= now) {
            let reason = self.reason.take().unwrap_or(ScanReason::Refresh);
            self.reset_debounce();
            return Some(reason);
        }

        due_retry.map(ScanReason::InitialRetry)
    }

    fn debounced_deadline(&self) -> Option<Instant> {
        if !self.dirty {
            return None;
        }

        if let Some(forced) = self.forced_at {
            return Some(forced);
        }

        let mut deadline = self.last_trigger.map(|last| last + self.config.debounce);

        if let Some(first) = self.first_trigger {
            let forced = first + self.config.max_wait;
            deadline = Some(match deadline {
                Some(current) if forced < current => forced,
                Some(current) => current,
                None => forced,
            });
        }

        deadline
    }

    fn reset_debounce(&mut self) {
        self.dirty = false;
        self.pending = 0;
        self.last_trigger = None;
        self.first_trigger = None;
        self.reason = None;
        self.forced_at = None;
    }
}

impl Default for ScanSchedule {
    fn default() -> Self {
        Self::new(ScanScheduleConfig::default())
    }
}
