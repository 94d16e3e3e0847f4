//! Round-robin rotation over an ordered set of names.
//!
//! Each priority pool keeps its lane names in a [`RoundRobin`] so that no
//! lane monopolizes the pool: every call that serves an entry advances the
//! cursor past it, and a scan that finds nothing leaves the cursor exactly
//! where it was so no entry is ever permanently skipped.

/// Ordered set with a rotating cursor.
///
/// The cursor always points at the next entry to serve. The first entry
/// added becomes the initial cursor target.
#[derive(Debug)]
pub struct RoundRobin<T: PartialEq> {
    items: Vec<T>,
    cursor: usize,
}

impl<T: PartialEq> RoundRobin<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
        }
    }

    /// Append an entry if absent.
    pub fn add(&mut self, item: T) {
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    /// Drop an entry if present, repairing the cursor so the entry that
    /// followed it in rotation order is served next.
    pub fn remove(&mut self, item: &T) {
        let Some(idx) = self.items.iter().position(|i| i == item) else {
            return;
        };
        self.items.remove(idx);
        if self.items.is_empty() {
            self.cursor = 0;
        } else if idx < self.cursor {
            self.cursor -= 1;
        } else if self.cursor >= self.items.len() {
            self.cursor = 0;
        }
    }

    /// Serve the entry at the cursor and advance one position circularly.
    /// `None` if empty.
    pub fn next(&mut self) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        let idx = self.cursor;
        self.cursor = (idx + 1) % self.items.len();
        Some(&self.items[idx])
    }

    /// Scan forward from the cursor for at most one full circuit, looking
    /// for an entry satisfying `pred`. The cursor move is committed only on
    /// a match; a failed circuit leaves the rotation untouched, so a
    /// caller's fruitless search never costs any entry its turn.
    pub fn next_matching(&mut self, mut pred: impl FnMut(&T) -> bool) -> Option<&T> {
        let len = self.items.len();
        for offset in 0..len {
            let idx = (self.cursor + offset) % len;
            if pred(&self.items[idx]) {
                self.cursor = (idx + 1) % len;
                return Some(&self.items[idx]);
            }
        }
        None
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: PartialEq> Default for RoundRobin<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_order() {
        let mut r = RoundRobin::new();
        r.add("a");
        r.add("b");
        r.add("c");
        // First added is served first, then the rotation cycles.
        assert_eq!(r.next(), Some(&"a"));
        assert_eq!(r.next(), Some(&"b"));
        assert_eq!(r.next(), Some(&"c"));
        assert_eq!(r.next(), Some(&"a"));
    }

    #[test]
    fn test_empty_and_duplicates() {
        let mut r: RoundRobin<&str> = RoundRobin::new();
        assert_eq!(r.next(), None);
        r.add("a");
        r.add("a");
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_remove_repairs_cursor() {
        let mut r = RoundRobin::new();
        r.add("a");
        r.add("b");
        r.add("c");
        assert_eq!(r.next(), Some(&"a"));
        // Cursor now targets "b". Removing it must hand the turn to "c".
        r.remove(&"b");
        assert_eq!(r.next(), Some(&"c"));
        assert_eq!(r.next(), Some(&"a"));
    }

    #[test]
    fn test_remove_before_cursor() {
        let mut r = RoundRobin::new();
        r.add("a");
        r.add("b");
        r.add("c");
        r.next(); // cursor -> "b"
        r.remove(&"a");
        assert_eq!(r.next(), Some(&"b"));
        assert_eq!(r.next(), Some(&"c"));
    }

    #[test]
    fn test_next_matching_commits_on_match() {
        let mut r = RoundRobin::new();
        r.add(1);
        r.add(2);
        r.add(3);
        assert_eq!(r.next_matching(|n| *n % 2 == 0), Some(&2));
        // Cursor advanced past the match.
        assert_eq!(r.next(), Some(&3));
    }

    #[test]
    fn test_next_matching_failed_scan_preserves_cursor() {
        let mut r = RoundRobin::new();
        r.add("a");
        r.add("b");
        assert_eq!(r.next_matching(|_| false), None);
        // A failed circuit must not rotate anyone out of turn.
        assert_eq!(r.next(), Some(&"a"));
    }

    #[test]
    fn test_next_matching_full_circuit() {
        let mut r = RoundRobin::new();
        r.add("a");
        r.add("b");
        r.add("c");
        r.next(); // cursor -> "b"
        // Only "a", behind the cursor, matches; the scan must wrap to it.
        assert_eq!(r.next_matching(|i| *i == "a"), Some(&"a"));
        assert_eq!(r.next(), Some(&"b"));
    }
}
