use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Pending {
    generation: u64,
    due: Instant,
}

/// Coalesces keystroke validations per field. Scheduling a field again
/// replaces its previous deadline, so a stale validation can never fire after
/// a newer input.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    generation: u64,
    pending: HashMap<&'static str, Pending>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: 0,
            pending: HashMap::new(),
        }
    }

    /// Schedules (or reschedules) `field` for validation one window after `now`.
    /// Returns the generation of the new schedule.
    pub fn schedule(&mut self, field: &'static str, now: Instant) -> u64 {
        self.generation += 1;
        self.pending.insert(
            field,
            Pending {
                generation: self.generation,
                due: now + self.window,
            },
        );
        self.generation
    }

    /// Drops the pending validation of `field`, if any.
    pub fn cancel(&mut self, field: &str) -> bool {
        self.pending.remove(field).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.pending.contains_key(field)
    }

    /// Removes and returns every field whose deadline is at or before `now`,
    /// oldest schedule first.
    pub fn take_due(&mut self, now: Instant) -> Vec<&'static str> {
        let mut due: Vec<(&'static str, u64)> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.due <= now)
            .map(|(field, pending)| (*field, pending.generation))
            .collect();
        due.sort_by_key(|(_, generation)| *generation);
        for (field, _) in &due {
            self.pending.remove(field);
        }
        due.into_iter().map(|(field, _)| field).collect()
    }

    /// Earliest pending deadline, for hosts that sleep until the next flush.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.due).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn nothing_fires_inside_the_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.schedule("email", start);
        assert!(debouncer
            .take_due(start + Duration::from_millis(499))
            .is_empty());
        assert_eq!(debouncer.take_due(start + WINDOW), vec!["email"]);
        assert!(!debouncer.is_pending("email"));
    }

    #[test]
    fn rescheduling_pushes_the_deadline_back() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        let first = debouncer.schedule("phone", start);
        let second = debouncer.schedule("phone", start + Duration::from_millis(400));
        assert!(second > first);
        assert_eq!(
            debouncer.next_deadline(),
            Some(start + Duration::from_millis(900))
        );
        assert!(debouncer
            .take_due(start + Duration::from_millis(600))
            .is_empty());
        assert_eq!(
            debouncer.take_due(start + Duration::from_millis(900)),
            vec!["phone"]
        );
    }

    #[test]
    fn cancel_drops_pending_validation() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.schedule("zipcode", start);
        assert!(debouncer.cancel("zipcode"));
        assert!(!debouncer.cancel("zipcode"));
        assert!(debouncer.take_due(start + WINDOW * 2).is_empty());
    }

    #[test]
    fn due_fields_are_returned_in_schedule_order() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.schedule("full_name", start);
        debouncer.schedule("email", start + Duration::from_millis(10));
        assert_eq!(
            debouncer.next_deadline(),
            Some(start + WINDOW)
        );
        assert_eq!(
            debouncer.take_due(start + WINDOW * 2),
            vec!["full_name", "email"]
        );
    }
}
