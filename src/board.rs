//! Static board catalog: the 36 perimeter cells of the painting board.
//!
//! The layout is fixed. Corners hold the four special cells, and each side
//! carries one mastery module interleaved with chance, chest and tax cells.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Number of cells on the perimeter.
pub const BOARD_SIZE: usize = 36;
/// Grid index the token is sent to by a GoToJail cell.
pub const JAIL_INDEX: usize = 9;
/// Corner grid indices, in play order.
pub const CORNERS: [usize; 4] = [0, 9, 18, 27];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Module {
    Brush,
    Ink,
    Paper,
    Color,
    Misc,
}

impl Module {
    /// The four skill categories, in the order the painting fills in.
    pub const MASTERY: [Module; 4] = [Module::Brush, Module::Ink, Module::Paper, Module::Color];

    pub fn label(&self) -> &'static str {
        match self {
            Module::Brush => "Brush",
            Module::Ink => "Ink",
            Module::Paper => "Paper",
            Module::Color => "Color",
            Module::Misc => "Misc",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CellKind {
    Start,
    Purchasable,
    Chance,
    Chest,
    Tax,
    Jail,
    Rest,
    GoToJail,
}

impl CellKind {
    /// Kinds that may only sit on a corner.
    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            CellKind::Start | CellKind::Jail | CellKind::Rest | CellKind::GoToJail
        )
    }
}

/// Identifier of a cell. Purchasable cells use positive ids; every other
/// cell uses the negated grid index, so the start cell is `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellId(pub i16);

impl CellId {
    pub fn is_purchasable(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub id: CellId,
    pub kind: CellKind,
    pub module: Module,
    /// Mastery cost for purchasable cells, levy for tax cells, 0 otherwise.
    pub price: u32,
    pub consult_fee: u32,
    pub grid_index: usize,
    pub name: &'static str,
    pub description: &'static str,
    pub action: &'static str,
}

impl Cell {
    fn special(index: usize, kind: CellKind, name: &'static str, price: u32) -> Self {
        let action = match kind {
            CellKind::Tax => "Pay tuition coins",
            CellKind::Chance | CellKind::Chest => "Draw a card",
            _ => "",
        };
        Self {
            id: CellId(-(index as i16)),
            kind,
            module: Module::Misc,
            price,
            consult_fee: 0,
            grid_index: index,
            name,
            description: "",
            action,
        }
    }

    fn mastery(index: usize, skill: &Skill) -> Self {
        Self {
            id: CellId(skill.id),
            kind: CellKind::Purchasable,
            module: skill.module,
            price: skill.price,
            consult_fee: skill.fee,
            grid_index: index,
            name: skill.name,
            description: skill.desc,
            action: "Finish the exercise and check in",
        }
    }

    /// 1-based (column, row) on a 10x10 grid. The bottom row runs right to
    /// left from Start, the left column upward from Jail, the top row left to
    /// right from Rest, and the right column downward from GoToJail.
    pub fn grid_coord(&self) -> (u8, u8) {
        let i = self.grid_index as u8;
        match i {
            0..=9 => (10 - i, 10),
            10..=18 => (1, 10 - (i - 9)),
            19..=27 => (1 + (i - 18), 1),
            _ => (10, 1 + (i - 27)),
        }
    }
}

struct Skill {
    id: i16,
    module: Module,
    name: &'static str,
    price: u32,
    fee: u32,
    desc: &'static str,
}

const SKILLS: [Skill; 19] = [
    Skill {
        id: 1,
        module: Module::Brush,
        name: "Five-Finger Grip",
        price: 60,
        fee: 2,
        desc: "Firm fingers, hollow palm, all five at work",
    },
    Skill {
        id: 2,
        module: Module::Brush,
        name: "Three-Finger Grip",
        price: 60,
        fee: 4,
        desc: "Thumb and index pinch, middle finger supports",
    },
    Skill {
        id: 3,
        module: Module::Brush,
        name: "Center and Side Tip",
        price: 100,
        fee: 6,
        desc: "Center tip rounds, side tip cuts",
    },
    Skill {
        id: 4,
        module: Module::Brush,
        name: "Hidden and Exposed Tip",
        price: 100,
        fee: 6,
        desc: "Go left before going right",
    },
    Skill {
        id: 5,
        module: Module::Brush,
        name: "Lift and Press",
        price: 120,
        fee: 8,
        desc: "Lift for thin, press for thick",
    },
    Skill {
        id: 6,
        module: Module::Ink,
        name: "Scorched Ink",
        price: 140,
        fee: 10,
        desc: "Black as lacquer, sets the bones",
    },
    Skill {
        id: 7,
        module: Module::Ink,
        name: "Thick Ink",
        price: 140,
        fee: 10,
        desc: "Little water, much ink, full of spirit",
    },
    Skill {
        id: 8,
        module: Module::Ink,
        name: "Heavy Ink",
        price: 160,
        fee: 12,
        desc: "Between thick and light",
    },
    Skill {
        id: 9,
        module: Module::Ink,
        name: "Light Ink",
        price: 160,
        fee: 12,
        desc: "Much water, little ink, plain and elegant",
    },
    Skill {
        id: 10,
        module: Module::Ink,
        name: "Clear Ink",
        price: 180,
        fee: 14,
        desc: "The faintest ink, barely there",
    },
    Skill {
        id: 11,
        module: Module::Paper,
        name: "Raw Xuan",
        price: 200,
        fee: 16,
        desc: "Absorbs fast, suits freehand",
    },
    Skill {
        id: 12,
        module: Module::Paper,
        name: "Sized Xuan",
        price: 200,
        fee: 16,
        desc: "Resists water, suits fine line",
    },
    Skill {
        id: 13,
        module: Module::Paper,
        name: "Half-Sized Xuan",
        price: 220,
        fee: 18,
        desc: "Half raw, half sized",
    },
    Skill {
        id: 14,
        module: Module::Paper,
        name: "Gold-Flecked Xuan",
        price: 220,
        fee: 18,
        desc: "Decorative and rich",
    },
    Skill {
        id: 15,
        module: Module::Paper,
        name: "Bark Paper",
        price: 240,
        fee: 20,
        desc: "Long fibers, strong pull",
    },
    Skill {
        id: 16,
        module: Module::Color,
        name: "Primary Pigments",
        price: 260,
        fee: 22,
        desc: "Know each pigment as it is",
    },
    Skill {
        id: 17,
        module: Module::Color,
        name: "Verdant Green",
        price: 260,
        fee: 22,
        desc: "Gamboge with indigo",
    },
    Skill {
        id: 18,
        module: Module::Color,
        name: "Indigo Mountains",
        price: 280,
        fee: 24,
        desc: "Rouge with indigo",
    },
    Skill {
        id: 19,
        module: Module::Color,
        name: "Blue-Green Landscape",
        price: 300,
        fee: 26,
        desc: "Azurite with malachite",
    },
];

enum Slot {
    Special(CellKind, &'static str, u32),
    Skill(i16),
}

/// Perimeter layout, indexed by grid position.
const LAYOUT: [Slot; BOARD_SIZE] = [
    Slot::Special(CellKind::Start, "Daily First Stroke", 0),
    Slot::Skill(1),
    Slot::Special(CellKind::Chest, "Insight", 0),
    Slot::Skill(2),
    Slot::Special(CellKind::Tax, "Paper and Ink Wear", 100),
    Slot::Skill(3),
    Slot::Skill(4),
    Slot::Special(CellKind::Chance, "Opportunity", 0),
    Slot::Skill(5),
    Slot::Special(CellKind::Jail, "Quiet Settling", 0),
    Slot::Skill(6),
    Slot::Special(CellKind::Chest, "Insight", 0),
    Slot::Skill(7),
    Slot::Skill(8),
    Slot::Special(CellKind::Tax, "Brush Tip Wear", 50),
    Slot::Skill(9),
    Slot::Special(CellKind::Chance, "Opportunity", 0),
    Slot::Skill(10),
    Slot::Special(CellKind::Rest, "Idle Clouds", 0),
    Slot::Skill(11),
    Slot::Special(CellKind::Chest, "Insight", 0),
    Slot::Skill(12),
    Slot::Skill(13),
    Slot::Skill(14),
    Slot::Special(CellKind::Chance, "Opportunity", 0),
    Slot::Skill(15),
    Slot::Special(CellKind::Tax, "Studio Upkeep", 150),
    Slot::Special(CellKind::GoToJail, "Field Sketching", 0),
    Slot::Skill(16),
    Slot::Special(CellKind::Chest, "Insight", 0),
    Slot::Skill(17),
    Slot::Special(CellKind::Chance, "Opportunity", 0),
    Slot::Skill(18),
    Slot::Special(CellKind::Tax, "Pigment Restock", 75),
    Slot::Skill(19),
    Slot::Special(CellKind::Chance, "Opportunity", 0),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Cell>,
}

impl Board {
    pub fn standard() -> Self {
        let cells = LAYOUT
            .iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Slot::Special(kind, name, price) => Cell::special(index, *kind, *name, *price),
                Slot::Skill(id) => Cell::mastery(index, &SKILLS[(*id - 1) as usize]),
            })
            .collect();
        Self { cells }
    }

    /// Callers guarantee `grid_index < BOARD_SIZE`.
    pub fn cell_at(&self, grid_index: usize) -> &Cell {
        &self.cells[grid_index]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.id == id)
    }

    pub fn purchasable(&self) -> impl Iterator<Item = &Cell> {
        self.cells
            .iter()
            .filter(|cell| cell.kind == CellKind::Purchasable)
    }

    pub fn module_cells(&self, module: Module) -> impl Iterator<Item = &Cell> {
        self.purchasable().filter(move |cell| cell.module == module)
    }

    /// Checks the layout invariants: 36 cells, grid indices form a
    /// permutation of 0..36, corners hold only corner kinds, and purchasable
    /// ids are unique and positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.cells.len() != BOARD_SIZE {
            return Err(format!("expected {BOARD_SIZE} cells, found {}", self.cells.len()));
        }
        let mut seen_ids = HashSet::new();
        for (index, cell) in self.cells.iter().enumerate() {
            if cell.grid_index != index {
                return Err(format!("cell {} stored at slot {index}", cell.grid_index));
            }
            if CORNERS.contains(&index) != cell.kind.is_corner() {
                return Err(format!("cell {index} has kind {:?}", cell.kind));
            }
            if (cell.kind == CellKind::Purchasable) != cell.id.is_purchasable() {
                return Err(format!("cell {index} has id {}", cell.id));
            }
            if cell.kind == CellKind::Purchasable && !seen_ids.insert(cell.id) {
                return Err(format!("duplicate id {}", cell.id));
            }
        }
        Ok(())
    }
}

/// Process-wide catalog, built on first use.
pub fn catalog() -> &'static Board {
    static CATALOG: OnceLock<Board> = OnceLock::new();
    CATALOG.get_or_init(Board::standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_board_is_valid() {
        assert_eq!(catalog().validate(), Ok(()));
    }

    #[test]
    fn corners_hold_special_cells() {
        let board = catalog();
        assert_eq!(board.cell_at(0).kind, CellKind::Start);
        assert_eq!(board.cell_at(JAIL_INDEX).kind, CellKind::Jail);
        assert_eq!(board.cell_at(18).kind, CellKind::Rest);
        assert_eq!(board.cell_at(27).kind, CellKind::GoToJail);
        assert_eq!(board.cell_at(0).id, CellId(0));
        assert_eq!(board.cell_at(27).id, CellId(-27));
    }

    #[test]
    fn module_sizes() {
        let board = catalog();
        assert_eq!(board.purchasable().count(), 19);
        assert_eq!(board.module_cells(Module::Brush).count(), 5);
        assert_eq!(board.module_cells(Module::Ink).count(), 5);
        assert_eq!(board.module_cells(Module::Paper).count(), 5);
        assert_eq!(board.module_cells(Module::Color).count(), 4);
        assert_eq!(board.module_cells(Module::Misc).count(), 0);
    }

    #[test]
    fn tax_cells_carry_their_levy() {
        let board = catalog();
        let taxes: Vec<(usize, u32)> = board
            .cells()
            .iter()
            .filter(|c| c.kind == CellKind::Tax)
            .map(|c| (c.grid_index, c.price))
            .collect();
        assert_eq!(taxes, vec![(4, 100), (14, 50), (26, 150), (33, 75)]);
    }

    #[test]
    fn lookup_by_id() {
        let cell = catalog().cell(CellId(19)).unwrap();
        assert_eq!(cell.grid_index, 34);
        assert_eq!(cell.module, Module::Color);
        assert_eq!(cell.price, 300);
        assert!(catalog().cell(CellId(20)).is_none());
    }

    #[test]
    fn grid_coords_follow_the_perimeter() {
        let board = catalog();
        assert_eq!(board.cell_at(0).grid_coord(), (10, 10));
        assert_eq!(board.cell_at(9).grid_coord(), (1, 10));
        assert_eq!(board.cell_at(18).grid_coord(), (1, 1));
        assert_eq!(board.cell_at(27).grid_coord(), (10, 1));
        assert_eq!(board.cell_at(35).grid_coord(), (10, 9));

        let coords: HashSet<(u8, u8)> = board.cells().iter().map(Cell::grid_coord).collect();
        assert_eq!(coords.len(), BOARD_SIZE);
    }

    #[test]
    fn validate_rejects_misplaced_corner() {
        let mut board = Board::standard();
        board.cells.swap(0, 1);
        assert!(board.validate().is_err());
    }
}
