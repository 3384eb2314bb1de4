//! Mastery progress, derived on demand from the ledger and the catalog.

use crate::board::{Board, Module};
use crate::ledger::Ledger;
use serde::Serialize;

/// Owned share of `module`'s cells. A module with no cells yields 0.
pub fn progress_for(module: Module, ledger: &Ledger, board: &Board) -> f32 {
    ratio(board.module_cells(module).map(|cell| ledger.is_owned(cell.id)))
}

/// Owned share of every purchasable cell on the board, counted flat rather
/// than averaged per module.
pub fn overall_progress(ledger: &Ledger, board: &Board) -> f32 {
    ratio(board.purchasable().map(|cell| ledger.is_owned(cell.id)))
}

fn ratio(owned: impl Iterator<Item = bool>) -> f32 {
    let (hits, total) = owned.fold((0u32, 0u32), |(hits, total), owned| {
        (hits + owned as u32, total + 1)
    });
    if total == 0 {
        0.0
    } else {
        hits as f32 / total as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub brush: f32,
    pub ink: f32,
    pub paper: f32,
    pub color: f32,
    pub overall: f32,
}

impl ProgressSnapshot {
    pub fn compute(ledger: &Ledger, board: &Board) -> Self {
        Self {
            brush: progress_for(Module::Brush, ledger, board),
            ink: progress_for(Module::Ink, ledger, board),
            paper: progress_for(Module::Paper, ledger, board),
            color: progress_for(Module::Color, ledger, board),
            overall: overall_progress(ledger, board),
        }
    }

    pub fn module(&self, module: Module) -> f32 {
        match module {
            Module::Brush => self.brush,
            Module::Ink => self.ink,
            Module::Paper => self.paper,
            Module::Color => self.color,
            Module::Misc => 0.0,
        }
    }

    pub fn is_complete(&self, module: Module) -> bool {
        self.module(module) >= 1.0
    }
}

/// Opacity of each layer of the central painting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaintingLayers {
    /// Brush outline, always faintly visible.
    pub sketch: f32,
    pub ink_wash: f32,
    pub pigment: f32,
    pub paper_fill: f32,
    pub percent: u8,
}

impl From<&ProgressSnapshot> for PaintingLayers {
    fn from(progress: &ProgressSnapshot) -> Self {
        Self {
            sketch: 0.2 + progress.brush * 0.8,
            ink_wash: progress.ink,
            pigment: progress.color,
            paper_fill: progress.paper,
            percent: (progress.overall * 100.0).round() as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CellId, catalog};
    use crate::ledger::Evidence;
    use crate::player::Player;

    fn own_all(ledger: &mut Ledger, ids: impl IntoIterator<Item = CellId>) {
        let mut player = Player::new(u32::MAX);
        for id in ids {
            ledger
                .purchase(catalog(), id, &mut player, Evidence::new(vec![1]))
                .unwrap();
        }
    }

    #[test]
    fn empty_ledger_is_zero() {
        let snapshot = ProgressSnapshot::compute(&Ledger::new(), catalog());
        assert_eq!(snapshot.overall, 0.0);
        for module in Module::MASTERY {
            assert_eq!(snapshot.module(module), 0.0);
        }
    }

    #[test]
    fn full_ledger_is_one() {
        let mut ledger = Ledger::new();
        own_all(&mut ledger, catalog().purchasable().map(|c| c.id).collect::<Vec<_>>());
        let snapshot = ProgressSnapshot::compute(&ledger, catalog());
        assert_eq!(snapshot.overall, 1.0);
        assert!(Module::MASTERY.iter().all(|m| snapshot.is_complete(*m)));
    }

    #[test]
    fn overall_is_flat_not_averaged() {
        let mut ledger = Ledger::new();
        own_all(&mut ledger, (16..=19).map(CellId));
        assert_eq!(progress_for(Module::Color, &ledger, catalog()), 1.0);
        assert_eq!(overall_progress(&ledger, catalog()), 4.0 / 19.0);
    }

    #[test]
    fn misc_module_has_no_cells() {
        assert_eq!(progress_for(Module::Misc, &Ledger::new(), catalog()), 0.0);
    }

    #[test]
    fn painting_layers_track_modules() {
        let mut ledger = Ledger::new();
        own_all(&mut ledger, [CellId(1), CellId(6), CellId(7)]);
        let layers = PaintingLayers::from(&ProgressSnapshot::compute(&ledger, catalog()));
        assert!((layers.sketch - (0.2 + 0.8 / 5.0)).abs() < 1e-6);
        assert!((layers.ink_wash - 0.4).abs() < 1e-6);
        assert_eq!(layers.pigment, 0.0);
        assert_eq!(layers.percent, 16);
    }
}
