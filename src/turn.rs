//! Turn step functions: rolling, moving, and resolving the cell landed on.
//!
//! These are pure with respect to the session. [`crate::session::GameSession`]
//! sequences them with the suspension windows between steps.

use crate::board::{BOARD_SIZE, Board, Cell, CellId, CellKind, JAIL_INDEX};
use crate::config::Rules;
use crate::ledger::Ledger;
use crate::player::Player;
use rand::Rng;
use serde::Serialize;

pub fn roll_die<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=6)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    pub outcome: u8,
    pub from: usize,
    pub to: usize,
    /// The unwrapped sum reached or passed Start.
    pub passed_start: bool,
    pub salary: u32,
}

/// Moves the token `outcome` cells and credits the salary on a wrap, as one
/// step. Landing exactly on Start counts as a wrap.
pub fn roll_and_advance(player: &mut Player, outcome: u8, rules: &Rules) -> MoveReport {
    let from = player.position;
    let sum = from + outcome as usize;
    let to = sum % BOARD_SIZE;
    let passed_start = sum >= BOARD_SIZE;

    player.position = to;
    let salary = if passed_start {
        player.credit(rules.salary);
        rules.salary
    } else {
        0
    };

    MoveReport {
        outcome,
        from,
        to,
        passed_start,
        salary,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardDeck {
    Chance,
    Chest,
}

/// What happened when the token stopped on a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LandingEffect {
    OfferPurchase { cell: CellId, affordable: bool },
    ViewOwned { cell: CellId },
    /// `charged` is below `requested` when funds ran out.
    Tax { requested: u32, charged: u32 },
    /// `applied` differs from `delta` when a loss hit the zero floor.
    Card { deck: CardDeck, delta: i32, applied: i32 },
    SentToJail { from: usize, to: usize },
    Quiet { kind: CellKind },
}

impl LandingEffect {
    /// Purchase views stay open until the player closes them.
    pub fn awaits_acknowledgement(&self) -> bool {
        matches!(
            self,
            LandingEffect::OfferPurchase { .. } | LandingEffect::ViewOwned { .. }
        )
    }

    pub fn message(&self, board: &Board) -> String {
        let name = |id: &CellId| board.cell(*id).map(|c| c.name).unwrap_or("?");
        match self {
            LandingEffect::OfferPurchase { cell, affordable: true } => {
                format!("Master {}?", name(cell))
            }
            LandingEffect::OfferPurchase { cell, affordable: false } => {
                format!("{}: not enough coins to master", name(cell))
            }
            LandingEffect::ViewOwned { cell } => format!("{} (mastered)", name(cell)),
            LandingEffect::Tax { charged, .. } => format!("Tax paid: -{charged} coins"),
            LandingEffect::Card { deck, applied, .. } => {
                let label = match deck {
                    CardDeck::Chance => "Opportunity",
                    CardDeck::Chest => "Insight",
                };
                if *applied >= 0 {
                    format!("{label}: an unexpected windfall +{applied}")
                } else {
                    format!("{label}: spilled the ink {applied}")
                }
            }
            LandingEffect::SentToJail { .. } => "Off to face the wall!".to_string(),
            LandingEffect::Quiet { .. } => String::new(),
        }
    }
}

/// Resolves the effect of landing on `cell` and applies it to `player`.
/// Purchases are never made here; see [`Ledger::purchase`].
pub fn resolve_landing<R: Rng + ?Sized>(
    player: &mut Player,
    cell: &Cell,
    ledger: &Ledger,
    rules: &Rules,
    rng: &mut R,
) -> LandingEffect {
    match cell.kind {
        CellKind::Purchasable => land_on_mastery(player, cell, ledger),
        CellKind::Tax => land_on_tax(player, cell, rules),
        CellKind::Chance => draw_card(player, CardDeck::Chance, rules, rng),
        CellKind::Chest => draw_card(player, CardDeck::Chest, rules, rng),
        CellKind::GoToJail => send_to_jail(player),
        CellKind::Start | CellKind::Jail | CellKind::Rest => {
            LandingEffect::Quiet { kind: cell.kind }
        }
    }
}

fn land_on_mastery(player: &Player, cell: &Cell, ledger: &Ledger) -> LandingEffect {
    if ledger.is_owned(cell.id) {
        LandingEffect::ViewOwned { cell: cell.id }
    } else {
        LandingEffect::OfferPurchase {
            cell: cell.id,
            affordable: player.funds >= cell.price,
        }
    }
}

fn land_on_tax(player: &mut Player, cell: &Cell, rules: &Rules) -> LandingEffect {
    let requested = if cell.price > 0 { cell.price } else { rules.default_tax };
    let charged = player.debit_clamped(requested);
    LandingEffect::Tax { requested, charged }
}

fn draw_card<R: Rng + ?Sized>(
    player: &mut Player,
    deck: CardDeck,
    rules: &Rules,
    rng: &mut R,
) -> LandingEffect {
    let amount = i32::try_from(rules.card_amount).unwrap_or(i32::MAX);
    let delta = if rng.gen_bool(0.5) { amount } else { -amount };
    let applied = player.adjust(delta);
    LandingEffect::Card { deck, delta, applied }
}

fn send_to_jail(player: &mut Player) -> LandingEffect {
    let from = player.position;
    player.position = JAIL_INDEX;
    player.in_rest = true;
    LandingEffect::SentToJail {
        from,
        to: JAIL_INDEX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::catalog;
    use crate::ledger::Evidence;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn die_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = [false; 7];
        for _ in 0..600 {
            let outcome = roll_die(&mut rng);
            assert!((1..=6).contains(&outcome));
            seen[outcome as usize] = true;
        }
        assert!(seen[1..].iter().all(|s| *s));
    }

    #[test]
    fn every_move_wraps_modulo_board() {
        let rules = Rules::default();
        for position in 0..BOARD_SIZE {
            for outcome in 1..=6u8 {
                let mut player = Player::new(0);
                player.position = position;
                let report = roll_and_advance(&mut player, outcome, &rules);
                let sum = position + outcome as usize;
                assert_eq!(report.to, sum % BOARD_SIZE);
                assert!(report.to < BOARD_SIZE);
                assert_eq!(report.passed_start, sum >= BOARD_SIZE);
                assert_eq!(player.funds, if sum >= BOARD_SIZE { 200 } else { 0 });
            }
        }
    }

    #[test]
    fn landing_exactly_on_start_pays_salary() {
        let mut player = Player::new(1500);
        player.position = 30;
        let report = roll_and_advance(&mut player, 6, &Rules::default());
        assert_eq!(report.to, 0);
        assert!(report.passed_start);
        assert_eq!(player.funds, 1700);
    }

    #[test]
    fn tax_never_goes_below_zero() {
        let mut rng = StdRng::seed_from_u64(0);
        let taxes: Vec<&Cell> = catalog()
            .cells()
            .iter()
            .filter(|c| c.kind == CellKind::Tax)
            .collect();
        for funds in [0, 1, 49, 50, 74, 100, 149, 1500] {
            for cell in &taxes {
                let mut player = Player::new(funds);
                let effect =
                    resolve_landing(&mut player, cell, &Ledger::new(), &Rules::default(), &mut rng);
                let charged = cell.price.min(funds);
                assert_eq!(effect, LandingEffect::Tax { requested: cell.price, charged });
                assert_eq!(player.funds, funds - charged);
            }
        }
    }

    #[test]
    fn unset_tax_uses_default() {
        let mut cell = catalog().cell_at(4).clone();
        cell.price = 0;
        let mut player = Player::new(1500);
        let effect = resolve_landing(
            &mut player,
            &cell,
            &Ledger::new(),
            &Rules::default(),
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(effect, LandingEffect::Tax { requested: 100, charged: 100 });
        assert_eq!(player.funds, 1400);
    }

    #[test]
    fn cards_move_funds_by_fifty_either_way() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut gains = 0;
        let mut losses = 0;
        for index in [2, 7] {
            let cell = catalog().cell_at(index);
            for _ in 0..100 {
                let mut player = Player::new(1500);
                let effect =
                    resolve_landing(&mut player, cell, &Ledger::new(), &Rules::default(), &mut rng);
                match effect {
                    LandingEffect::Card { delta: 50, applied: 50, .. } => {
                        assert_eq!(player.funds, 1550);
                        gains += 1;
                    }
                    LandingEffect::Card { delta: -50, applied: -50, .. } => {
                        assert_eq!(player.funds, 1450);
                        losses += 1;
                    }
                    other => panic!("unexpected effect {other:?}"),
                }
            }
        }
        assert!(gains > 0 && losses > 0);
    }

    #[test]
    fn card_loss_is_floored() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let mut player = Player::new(20);
            if let LandingEffect::Card { delta: -50, applied, .. } = resolve_landing(
                &mut player,
                catalog().cell_at(16),
                &Ledger::new(),
                &Rules::default(),
                &mut rng,
            ) {
                assert_eq!(applied, -20);
                assert_eq!(player.funds, 0);
            }
        }
    }

    #[test]
    fn oversized_card_amount_saturates() {
        let rules = Rules {
            card_amount: u32::MAX,
            ..Rules::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let (mut gained, mut lost) = (false, false);
        for _ in 0..40 {
            let mut player = Player::new(10);
            let cell = catalog().cell_at(7);
            match resolve_landing(&mut player, cell, &Ledger::new(), &rules, &mut rng) {
                LandingEffect::Card { delta, applied, .. } if delta > 0 => {
                    assert_eq!((delta, applied), (i32::MAX, i32::MAX));
                    assert_eq!(player.funds, 10 + i32::MAX as u32);
                    gained = true;
                }
                LandingEffect::Card { delta, applied, .. } => {
                    assert_eq!((delta, applied), (-i32::MAX, -10));
                    assert_eq!(player.funds, 0);
                    lost = true;
                }
                other => panic!("unexpected effect {other:?}"),
            }
        }
        assert!(gained && lost);
    }

    #[test]
    fn go_to_jail_overrides_position() {
        let mut player = Player::new(1500);
        player.position = 27;
        let effect = resolve_landing(
            &mut player,
            catalog().cell_at(27),
            &Ledger::new(),
            &Rules::default(),
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(effect, LandingEffect::SentToJail { from: 27, to: JAIL_INDEX });
        assert_eq!(player.position, JAIL_INDEX);
        assert!(player.in_rest);
        assert_eq!(player.funds, 1500);
    }

    #[test]
    fn corners_are_quiet() {
        for index in [0, 9, 18] {
            let cell = catalog().cell_at(index);
            let mut player = Player::new(1500);
            let effect = resolve_landing(
                &mut player,
                cell,
                &Ledger::new(),
                &Rules::default(),
                &mut StdRng::seed_from_u64(0),
            );
            assert_eq!(effect, LandingEffect::Quiet { kind: cell.kind });
            assert_eq!(player, Player::new(1500));
        }
    }

    #[test]
    fn mastery_cells_offer_or_show() {
        let cell = catalog().cell_at(1);
        let mut rng = StdRng::seed_from_u64(0);
        let mut ledger = Ledger::new();

        let mut poor = Player::new(10);
        let effect = resolve_landing(&mut poor, cell, &ledger, &Rules::default(), &mut rng);
        assert_eq!(effect, LandingEffect::OfferPurchase { cell: cell.id, affordable: false });
        assert!(effect.awaits_acknowledgement());

        let mut player = Player::new(1500);
        ledger
            .purchase(catalog(), cell.id, &mut player, Evidence::new(vec![7]))
            .unwrap();
        let effect = resolve_landing(&mut player, cell, &ledger, &Rules::default(), &mut rng);
        assert_eq!(effect, LandingEffect::ViewOwned { cell: cell.id });
        assert_eq!(effect.message(catalog()), "Five-Finger Grip (mastered)");
    }
}
