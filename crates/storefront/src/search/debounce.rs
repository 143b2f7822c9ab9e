use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::SearchConfig;

/// A search ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    /// Issue order; higher is newer.
    pub seq: u64,
    /// Query text as last entered.
    pub query: String,
}

#[derive(Debug, Clone)]
struct Pending {
    query: String,
    deadline: Instant,
    burst_start: Instant,
}

/// Coalesces rapid search input into one request per quiet period.
///
/// Each input pushes the deadline to `now + window`. With `max_wait` set, the
/// deadline never moves past `burst_start + max_wait`, so a burst that keeps
/// typing still gets a search out. Without it the debounce is purely trailing.
///
/// The `_at` methods take the current instant explicitly; nothing here reads
/// a clock.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    max_wait: Option<Duration>,
    pending: Option<Pending>,
    /// Bursts that came due before anyone polled, oldest first, with their
    /// deadlines. Issued ahead of the current one.
    overdue: VecDeque<(SearchTicket, Instant)>,
    last_issued: u64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl Debouncer {
    #[must_use]
    pub const fn new(window: Duration, max_wait: Option<Duration>) -> Self {
        Self {
            window,
            max_wait,
            pending: None,
            overdue: VecDeque::new(),
            last_issued: 0,
        }
    }

    #[must_use]
    pub const fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.debounce, config.max_wait)
    }

    /// Record new input at `now`, restarting the timer.
    pub fn submit_at(&mut self, query: impl Into<String>, now: Instant) {
        // The timer for the previous burst has already fired
        if let Some(due) = self.pending.take_if(|p| p.deadline <= now) {
            let deadline = due.deadline;
            let ticket = self.issue(due);
            self.overdue.push_back((ticket, deadline));
        }

        let burst_start = self.pending.as_ref().map_or(now, |p| p.burst_start);
        let candidate = now + self.window;
        let deadline = self
            .max_wait
            .map_or(candidate, |max_wait| candidate.min(burst_start + max_wait));

        self.pending = Some(Pending {
            query: query.into(),
            deadline,
            burst_start,
        });
    }

    /// Take the search that is due at `now`, if any.
    ///
    /// Returns at most one ticket per call; call again to drain.
    pub fn poll_at(&mut self, now: Instant) -> Option<SearchTicket> {
        if let Some((ticket, _)) = self.overdue.pop_front() {
            return Some(ticket);
        }

        let due = self.pending.take_if(|p| p.deadline <= now)?;
        Some(self.issue(due))
    }

    fn issue(&mut self, pending: Pending) -> SearchTicket {
        self.last_issued += 1;
        tracing::debug!(
            seq = self.last_issued,
            query = %pending.query,
            "search debounce elapsed"
        );
        SearchTicket {
            seq: self.last_issued,
            query: pending.query,
        }
    }

    /// When the next search falls due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.overdue
            .front()
            .map(|(_, deadline)| *deadline)
            .or_else(|| self.pending.as_ref().map(|p| p.deadline))
    }

    /// Whether input is waiting for its timer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some() || !self.overdue.is_empty()
    }

    /// Drop any waiting input without issuing it.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.overdue.clear();
    }

    /// Whether a response to `ticket` is for the most recently issued search.
    #[must_use]
    pub const fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.seq == self.last_issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Feed `inputs` at their offsets, polling every millisecond, and collect
    /// every ticket issued up to `until`.
    fn run(debouncer: &mut Debouncer, inputs: &[(u64, &str)], until: u64) -> Vec<(u64, String)> {
        let base = Instant::now();
        let mut issued = Vec::new();
        for t in 0..=until {
            let now = base + ms(t);
            for (_, query) in inputs.iter().filter(|(at, _)| *at == t) {
                debouncer.submit_at(*query, now);
            }
            while let Some(ticket) = debouncer.poll_at(now) {
                issued.push((t, ticket.query));
            }
        }
        issued
    }

    #[test]
    fn test_burst_within_window_issues_last_value_once() {
        let mut debouncer = Debouncer::new(WINDOW, Some(WINDOW));
        let issued = run(
            &mut debouncer,
            &[(0, "i"), (50, "ip"), (120, "iph"), (300, "ipho")],
            2000,
        );
        assert_eq!(issued, vec![(500, "ipho".to_string())]);
    }

    #[test]
    fn test_inputs_at_0_100_200_600_issue_two_searches() {
        let mut debouncer = Debouncer::new(WINDOW, Some(WINDOW));
        let issued = run(
            &mut debouncer,
            &[(0, "a"), (100, "ab"), (200, "abc"), (600, "abcd")],
            2000,
        );
        let queries: Vec<_> = issued.iter().map(|(_, q)| q.as_str()).collect();
        assert_eq!(queries, ["abc", "abcd"]);
    }

    #[test]
    fn test_pure_trailing_waits_for_quiet() {
        let mut debouncer = Debouncer::new(WINDOW, None);
        let issued = run(
            &mut debouncer,
            &[(0, "a"), (100, "ab"), (200, "abc"), (600, "abcd")],
            2000,
        );
        assert_eq!(issued, vec![(1100, "abcd".to_string())]);
    }

    #[test]
    fn test_nothing_issued_before_deadline() {
        let mut debouncer = Debouncer::default();
        let base = Instant::now();

        debouncer.submit_at("phone", base);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.next_deadline(), Some(base + WINDOW));
        assert!(debouncer.poll_at(base + ms(499)).is_none());

        let ticket = debouncer.poll_at(base + WINDOW);
        assert_eq!(
            ticket,
            Some(SearchTicket {
                seq: 1,
                query: "phone".to_string()
            })
        );
        assert!(!debouncer.is_pending());
        assert!(debouncer.poll_at(base + ms(5000)).is_none());
    }

    #[test]
    fn test_late_poll_still_issues_both_bursts_in_order() {
        let mut debouncer = Debouncer::new(WINDOW, None);
        let base = Instant::now();

        debouncer.submit_at("first", base);
        // Timer for "first" fired at 500 but nobody polled before new input
        debouncer.submit_at("second", base + ms(700));

        let first = debouncer.poll_at(base + ms(700));
        assert_eq!(first.map(|t| t.query), Some("first".to_string()));
        assert!(debouncer.poll_at(base + ms(700)).is_none());

        let second = debouncer.poll_at(base + ms(1200));
        assert_eq!(second.as_ref().map(|t| t.seq), Some(2));
        assert_eq!(second.map(|t| t.query), Some("second".to_string()));
    }

    #[test]
    fn test_every_overdue_burst_is_kept() {
        let mut debouncer = Debouncer::new(WINDOW, None);
        let base = Instant::now();

        debouncer.submit_at("a", base);
        debouncer.submit_at("b", base + ms(700));
        debouncer.submit_at("c", base + ms(1400));
        assert_eq!(debouncer.next_deadline(), Some(base + WINDOW));

        let now = base + ms(1900);
        let mut issued = Vec::new();
        while let Some(ticket) = debouncer.poll_at(now) {
            issued.push((ticket.seq, ticket.query));
        }
        assert_eq!(
            issued,
            vec![
                (1, "a".to_string()),
                (2, "b".to_string()),
                (3, "c".to_string())
            ]
        );
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut debouncer = Debouncer::default();
        let base = Instant::now();

        debouncer.submit_at("a", base);
        let Some(first) = debouncer.poll_at(base + WINDOW) else {
            panic!("first search not issued");
        };
        assert!(debouncer.is_current(&first));

        debouncer.submit_at("b", base + ms(600));
        // Still current while the next search is only pending
        assert!(debouncer.is_current(&first));

        let Some(second) = debouncer.poll_at(base + ms(1100)) else {
            panic!("second search not issued");
        };
        assert!(!debouncer.is_current(&first));
        assert!(debouncer.is_current(&second));
    }

    #[test]
    fn test_cancel_discards_pending_input() {
        let mut debouncer = Debouncer::default();
        let base = Instant::now();

        debouncer.submit_at("a", base);
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(debouncer.poll_at(base + ms(1000)).is_none());
    }
}
