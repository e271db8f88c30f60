//! Aircraft under a station's active handling

use tracing::{debug, warn};

use crate::record::PlaneRecord;

/// LIFO stack of aircraft records
///
/// Records are copied in. Pushing a callsign that is already present is the
/// caller's responsibility; it is logged but not rejected.
#[derive(Debug, Clone, Default)]
pub struct PlaneStack {
    planes: Vec<PlaneRecord>,
}

impl PlaneStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a plane onto the top of the stack
    pub fn push(&mut self, plane: PlaneRecord) {
        if self.contains(&plane.callsign) {
            warn!("{} pushed while already on the plane stack", plane.callsign);
        }
        self.planes.push(plane);
    }

    /// Remove and return the top plane, or `None` when empty
    pub fn pop(&mut self) -> Option<PlaneRecord> {
        let plane = self.planes.pop();
        if plane.is_none() {
            debug!("pop on empty plane stack");
        }
        plane
    }

    /// The top plane without removing it
    pub fn top(&self) -> Option<&PlaneRecord> {
        self.planes.last()
    }

    /// Whether a plane with this callsign is on the stack
    pub fn contains(&self, callsign: &str) -> bool {
        self.planes.iter().any(|p| p.callsign == callsign)
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Iterate from the bottom (first pushed) to the top
    pub fn iter(&self) -> impl Iterator<Item = &PlaneRecord> {
        self.planes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PlaneCategory;

    fn plane(callsign: &str) -> PlaneRecord {
        PlaneRecord::new(PlaneCategory::GaSingle, callsign, 1200)
    }

    #[test]
    fn test_lifo_order() {
        let mut stack = PlaneStack::new();
        stack.push(plane("A"));
        stack.push(plane("B"));
        stack.push(plane("C"));

        assert_eq!(stack.pop().unwrap().callsign, "C");
        assert_eq!(stack.pop().unwrap().callsign, "B");
        assert_eq!(stack.pop().unwrap().callsign, "A");
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_empty_returns_none() {
        let mut stack = PlaneStack::new();
        assert!(stack.pop().is_none());
        assert!(stack.top().is_none());
    }

    #[test]
    fn test_duplicate_push_is_kept() {
        let mut stack = PlaneStack::new();
        stack.push(plane("N1"));
        stack.push(plane("N1"));
        assert_eq!(stack.len(), 2);
        assert!(stack.contains("N1"));
    }

    #[test]
    fn test_top_and_iter() {
        let mut stack = PlaneStack::new();
        stack.push(plane("A"));
        stack.push(plane("B"));
        assert_eq!(stack.top().unwrap().callsign, "B");
        let order: Vec<_> = stack.iter().map(|p| p.callsign.as_str()).collect();
        assert_eq!(order, ["A", "B"]);
    }
}
