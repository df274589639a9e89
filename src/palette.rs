//! Palette state: which shapes the player still has, and which is picked
//! up.
//!
//! The palette is plain state for the game loop; it knows shape ids and
//! counts, not geometry. Taking decrements a slot, restoring (after the
//! player lifts a placed piece back off the board) increments it.

/// One palette slot: a shape id and how many copies remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    /// Shape id, as used by the level's shape index.
    pub shape_id: String,
    /// Copies not yet placed.
    pub remaining: usize,
}

/// The palette: ordered slots plus an optional selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    selected: Option<usize>,
}

impl Palette {
    /// Build a palette from `(shape_id, count)` pairs, keeping order.
    /// Repeated ids merge into the earlier slot.
    pub fn new(slots: impl IntoIterator<Item = (String, usize)>) -> Self {
        let mut entries: Vec<PaletteEntry> = Vec::new();
        for (shape_id, count) in slots {
            match entries.iter_mut().find(|entry| entry.shape_id == shape_id) {
                Some(entry) => entry.remaining += count,
                None => entries.push(PaletteEntry {
                    shape_id,
                    remaining: count,
                }),
            }
        }
        Palette {
            entries,
            selected: None,
        }
    }

    /// The slots, in palette order.
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Index of the selected slot, if any.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The selected slot's shape id, if any.
    pub fn selected_shape_id(&self) -> Option<&str> {
        self.selected
            .map(|index| self.entries[index].shape_id.as_str())
    }

    /// Select the slot at `index`. Returns `false` (keeping the previous
    /// selection) when the index is out of range or the slot is empty.
    pub fn select(&mut self, index: usize) -> bool {
        match self.entries.get(index) {
            Some(entry) if entry.remaining > 0 => {
                self.selected = Some(index);
                true
            }
            _ => false,
        }
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Consume one copy of the selected shape, returning its id. The
    /// selection is cleared when the slot runs out.
    pub fn take_selected(&mut self) -> Option<String> {
        let index = self.selected?;
        let entry = &mut self.entries[index];
        if entry.remaining == 0 {
            return None;
        }
        entry.remaining -= 1;
        let shape_id = entry.shape_id.clone();
        if entry.remaining == 0 {
            self.selected = None;
        }
        Some(shape_id)
    }

    /// Return a previously taken copy of `shape_id` to its slot. Returns
    /// `false` if the palette has no such slot.
    pub fn restore(&mut self, shape_id: &str) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.shape_id == shape_id)
        {
            Some(entry) => {
                entry.remaining += 1;
                true
            }
            None => false,
        }
    }

    /// Whether every slot is empty.
    pub fn is_exhausted(&self) -> bool {
        self.entries.iter().all(|entry| entry.remaining == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        Palette::new(vec![("bar".to_owned(), 2), ("dot".to_owned(), 1)])
    }

    #[test]
    fn repeated_ids_merge_into_one_slot() {
        let palette = Palette::new(vec![
            ("bar".to_owned(), 1),
            ("dot".to_owned(), 1),
            ("bar".to_owned(), 1),
        ]);
        assert_eq!(palette.entries().len(), 2);
        assert_eq!(palette.entries()[0].remaining, 2);
    }

    #[test]
    fn select_take_and_run_dry() {
        let mut palette = palette();
        assert!(palette.select(1));
        assert_eq!(palette.selected_shape_id(), Some("dot"));

        assert_eq!(palette.take_selected().as_deref(), Some("dot"));
        // The slot emptied, so the selection cleared with it.
        assert_eq!(palette.selected(), None);
        assert_eq!(palette.take_selected(), None);

        // An empty slot cannot be reselected.
        assert!(!palette.select(1));
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let mut palette = palette();
        assert!(palette.select(0));
        assert!(!palette.select(5));
        // The failed select left the old selection alone.
        assert_eq!(palette.selected(), Some(0));
    }

    #[test]
    fn restore_refills_a_slot() {
        let mut palette = palette();
        palette.select(1);
        palette.take_selected();
        assert!(palette.restore("dot"));
        assert!(palette.select(1));

        assert!(!palette.restore("ghost"));
    }

    #[test]
    fn exhaustion_tracks_every_slot() {
        let mut palette = palette();
        assert!(!palette.is_exhausted());

        palette.select(0);
        palette.take_selected();
        palette.select(0);
        palette.take_selected();
        palette.select(1);
        palette.take_selected();
        assert!(palette.is_exhausted());
    }
}
