//! The tray of pieces offered each turn.

use crate::bag::WeightedBag;
use crate::grid::Grid;
use crate::shape::{catalog, Shape};
use crate::theme::{self, Theme};
use rand::Rng;

/// One tray slot: a shape on offer, its colour theme, and whether the
/// piece has already been played this set.
#[derive(Debug, Clone, Copy)]
pub struct PieceSlot {
    pub shape_index: usize,
    pub theme: Theme,
    pub used: bool,
}

impl PieceSlot {
    pub fn shape(&self) -> &'static Shape {
        &catalog()[self.shape_index]
    }
}

/// The fixed-size set of pieces currently on offer.
#[derive(Debug, Clone)]
pub struct Tray {
    count: usize,
    slots: Vec<PieceSlot>,
}

impl Tray {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            slots: Vec::with_capacity(count),
        }
    }

    /// Deal a fresh set: every slot unused, one shared theme per set.
    pub fn refill<R: Rng>(&mut self, bag: &mut WeightedBag, score: u64, rng: &mut R) {
        let set_theme = theme::random_theme(rng);
        self.slots.clear();
        for _ in 0..self.count {
            self.slots.push(PieceSlot {
                shape_index: bag.next(score),
                theme: set_theme,
                used: false,
            });
        }
    }

    pub fn slots(&self) -> &[PieceSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&PieceSlot> {
        self.slots.get(index)
    }

    pub fn mark_used(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.used = true;
        }
    }

    pub fn all_used(&self) -> bool {
        self.slots.iter().all(|slot| slot.used)
    }

    /// Build a tray with handpicked slots.
    #[cfg(test)]
    pub fn from_slots(slots: Vec<PieceSlot>) -> Self {
        Self {
            count: slots.len(),
            slots,
        }
    }

    /// Game-over probe: true when no unused piece fits anywhere on the grid.
    pub fn none_placeable(&self, grid: &Grid) -> bool {
        self.slots
            .iter()
            .filter(|slot| !slot.used)
            .all(|slot| !grid.any_valid_placement(slot.shape()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BagRules;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dealt_tray(count: usize) -> Tray {
        let mut bag = WeightedBag::with_seed(BagRules::default(), 11);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut tray = Tray::new(count);
        tray.refill(&mut bag, 0, &mut rng);
        tray
    }

    #[test]
    fn test_refill_deals_full_unused_set() {
        let tray = dealt_tray(4);
        assert_eq!(tray.slots().len(), 4);
        assert!(tray.slots().iter().all(|slot| !slot.used));
        assert!(!tray.all_used());
    }

    #[test]
    fn test_set_shares_one_theme() {
        let tray = dealt_tray(4);
        let first = tray.slots()[0].theme;
        assert!(tray.slots().iter().all(|slot| slot.theme == first));
    }

    #[test]
    fn test_refill_follows_bag_order() {
        let mut reference = WeightedBag::with_seed(BagRules::default(), 11);
        let expected: Vec<usize> = (0..3).map(|_| reference.next(0)).collect();

        let tray = dealt_tray(3);
        let dealt: Vec<usize> = tray.slots().iter().map(|s| s.shape_index).collect();
        assert_eq!(dealt, expected);
    }

    #[test]
    fn test_mark_used_until_exhausted() {
        let mut tray = dealt_tray(2);
        tray.mark_used(0);
        assert!(!tray.all_used());
        tray.mark_used(1);
        assert!(tray.all_used());
    }

    #[test]
    fn test_none_placeable() {
        let tray = dealt_tray(4);

        let open = Grid::new(10);
        assert!(!tray.none_placeable(&open));

        let mut blocked = Grid::new(10);
        for y in 0..10 {
            for x in 0..10 {
                blocked.set(x, y, crate::grid::Cell::Filled(theme::PALETTE[0]));
            }
        }
        assert!(tray.none_placeable(&blocked));
    }
}
