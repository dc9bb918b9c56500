//! Row-slot assignment table.
//!
//! Maps stacking-row index to the events occupying it, used to detect
//! time-overlap conflicts during layout. Conflict checks always use the
//! original (untrimmed) start/end so stacking reflects true scheduling
//! conflicts even when bars are visually clipped to the grid.

use crate::models::event::ShiftEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEntry {
    pub id: Option<i64>,
    pub start: i64,
    pub end: i64,
}

/// First-fit greedy row table. Append-only within a render pass; entries
/// leave only through explicit removal on event update/delete, or a full
/// clear. Letting it drift out of sync with the event collection corrupts
/// layout silently.
#[derive(Debug, Clone, Default)]
pub struct RowSlots {
    rows: Vec<Vec<SlotEntry>>,
}

impl RowSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Place the event into the first row without a conflicting occupant,
    /// appending a new row when none fits. Returns the 1-based row index.
    ///
    /// Open-interval test: touching endpoints never conflict.
    pub fn assign(&mut self, event: &ShiftEvent) -> usize {
        let entry = SlotEntry {
            id: event.id,
            start: event.orig_start,
            end: event.orig_end,
        };

        for (i, row) in self.rows.iter_mut().enumerate() {
            let conflict = row
                .iter()
                .any(|slot| slot.start < entry.end && slot.end > entry.start);
            if !conflict {
                row.push(entry);
                return i + 1;
            }
        }

        self.rows.push(vec![entry]);
        self.rows.len()
    }

    /// Remove a saved event's entry. Events without ids were never tracked
    /// individually and are only dropped by `clear`.
    pub fn remove(&mut self, id: i64) -> bool {
        for row in &mut self.rows {
            if let Some(pos) = row.iter().position(|slot| slot.id == Some(id)) {
                row.remove(pos);
                return true;
            }
        }
        false
    }
}
