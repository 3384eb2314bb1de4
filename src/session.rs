//! A single game: the player, the ledger, and the turn state machine.
//!
//! A turn runs `Idle -> Moving -> Settling -> Landed -> Idle`. The die is
//! known the moment [`GameSession::roll`] returns. The position is committed
//! once the move window elapses, and the landing is resolved once the settle
//! window elapses. Hosts advance both windows with [`GameSession::tick`].

use crate::board::{Board, CellId, CellKind, catalog};
use crate::config::{GameConfig, Rules};
use crate::error::{GameError, PurchaseError};
use crate::ledger::{Evidence, Ledger, OwnershipRecord};
use crate::player::Player;
use crate::progress::{PaintingLayers, ProgressSnapshot};
use crate::turn::{LandingEffect, MoveReport, resolve_landing, roll_and_advance, roll_die};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TurnPhase {
    Idle,
    Moving { outcome: u8, remaining: Duration },
    Settling { report: MoveReport, remaining: Duration },
    /// A purchase view is open and waits for the player.
    Landed { effect: LandingEffect },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TurnEvent {
    Moved(MoveReport),
    Landed(LandingEffect),
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub player: Player,
    pub phase: TurnPhase,
    pub owned: Vec<CellId>,
    pub progress: ProgressSnapshot,
    pub painting: PaintingLayers,
}

pub struct GameSession {
    config: GameConfig,
    rules: Rules,
    board: &'static Board,
    player: Player,
    ledger: Ledger,
    phase: TurnPhase,
    rng: StdRng,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Self {
        let player = Player::new(config.starting_funds);
        Self::from_parts(config, player, Ledger::new())
    }

    /// Starts a session from existing player and ledger state.
    pub fn from_parts(config: GameConfig, player: Player, ledger: Ledger) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rules: config.rules(),
            config,
            board: catalog(),
            player,
            ledger,
            phase: TurnPhase::Idle,
            rng,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &'static Board {
        self.board
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    /// True while a suspension window is pending.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, TurnPhase::Moving { .. } | TurnPhase::Settling { .. })
    }

    pub fn roll(&mut self) -> Result<u8, GameError> {
        self.ensure_idle()?;
        let outcome = roll_die(&mut self.rng);
        self.roll_with(outcome)
    }

    /// Starts a turn with a chosen die outcome.
    pub fn roll_with(&mut self, outcome: u8) -> Result<u8, GameError> {
        self.ensure_idle()?;
        if !(1..=6).contains(&outcome) {
            return Err(GameError::InvalidRoll(outcome));
        }
        self.player.pending_roll = Some(outcome);
        self.player.in_rest = false;
        self.phase = TurnPhase::Moving {
            outcome,
            remaining: self.config.move_delay(),
        };
        debug!(outcome, from = self.player.position, "rolled");
        Ok(outcome)
    }

    /// Advances the pending suspension window by `dt`, performing at most one
    /// transition.
    pub fn tick(&mut self, dt: Duration) -> Option<TurnEvent> {
        match &mut self.phase {
            TurnPhase::Moving { outcome, remaining } => {
                *remaining = remaining.saturating_sub(dt);
                if !remaining.is_zero() {
                    return None;
                }
                let report = roll_and_advance(&mut self.player, *outcome, &self.rules);
                debug!(
                    to = report.to,
                    passed_start = report.passed_start,
                    funds = self.player.funds,
                    "moved"
                );
                self.phase = TurnPhase::Settling {
                    report,
                    remaining: self.config.settle_delay(),
                };
                Some(TurnEvent::Moved(report))
            }
            TurnPhase::Settling { report, remaining } => {
                *remaining = remaining.saturating_sub(dt);
                if !remaining.is_zero() {
                    return None;
                }
                let cell = self.board.cell_at(report.to);
                let effect = resolve_landing(
                    &mut self.player,
                    cell,
                    &self.ledger,
                    &self.rules,
                    &mut self.rng,
                );
                debug!(cell = %cell.id, ?effect, funds = self.player.funds, "landed");
                self.phase = if effect.awaits_acknowledgement() {
                    TurnPhase::Landed {
                        effect: effect.clone(),
                    }
                } else {
                    TurnPhase::Idle
                };
                Some(TurnEvent::Landed(effect))
            }
            TurnPhase::Idle | TurnPhase::Landed { .. } => None,
        }
    }

    /// Fast-forwards every pending window.
    pub fn settle(&mut self) -> Vec<TurnEvent> {
        let mut events = Vec::new();
        while self.is_busy() {
            events.extend(self.tick(Duration::MAX));
        }
        events
    }

    /// Closes an open purchase view. Returns whether one was open.
    pub fn acknowledge(&mut self) -> bool {
        if matches!(self.phase, TurnPhase::Landed { .. }) {
            self.phase = TurnPhase::Idle;
            true
        } else {
            false
        }
    }

    /// Opens the purchase view for a cell outside of a turn.
    pub fn view(&mut self, id: CellId) -> Result<LandingEffect, GameError> {
        self.ensure_idle()?;
        let cell = self
            .board
            .cell(id)
            .filter(|cell| cell.kind == CellKind::Purchasable)
            .ok_or(PurchaseError::NotPurchasable(id))?;
        let effect = if self.ledger.is_owned(id) {
            LandingEffect::ViewOwned { cell: id }
        } else {
            LandingEffect::OfferPurchase {
                cell: id,
                affordable: self.player.funds >= cell.price,
            }
        };
        self.phase = TurnPhase::Landed {
            effect: effect.clone(),
        };
        Ok(effect)
    }

    /// The cell whose purchase view is open, if any.
    pub fn viewed_cell(&self) -> Option<CellId> {
        match &self.phase {
            TurnPhase::Landed {
                effect:
                    LandingEffect::OfferPurchase { cell, .. } | LandingEffect::ViewOwned { cell },
            } => Some(*cell),
            _ => None,
        }
    }

    /// Masters a cell. Allowed between turns, or for the viewed cell while a
    /// purchase view is open; a success closes the view.
    pub fn purchase(
        &mut self,
        id: CellId,
        evidence: Evidence,
    ) -> Result<OwnershipRecord, GameError> {
        if self.is_busy() {
            debug!(cell = %id, "purchase rejected: turn in flight");
            return Err(GameError::Busy);
        }
        if let Some(viewed) = self.viewed_cell().filter(|viewed| *viewed != id) {
            debug!(cell = %id, %viewed, "purchase rejected: another view is open");
            return Err(GameError::Busy);
        }
        let record = self
            .ledger
            .purchase(self.board, id, &mut self.player, evidence)?;
        self.acknowledge();
        Ok(record)
    }

    /// Restores the starting player and empties the ledger, abandoning any
    /// turn in flight.
    pub fn reset(&mut self) {
        self.player.reset(self.config.starting_funds);
        self.ledger.clear();
        self.phase = TurnPhase::Idle;
        info!(funds = self.player.funds, "session reset");
    }

    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSnapshot::compute(&self.ledger, self.board)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let progress = self.progress();
        SessionSnapshot {
            player: self.player.clone(),
            phase: self.phase.clone(),
            owned: self.ledger.owned_ids().collect(),
            painting: PaintingLayers::from(&progress),
            progress,
        }
    }

    fn ensure_idle(&self) -> Result<(), GameError> {
        if matches!(self.phase, TurnPhase::Idle) {
            Ok(())
        } else {
            debug!(phase = ?self.phase, "rejected: busy");
            Err(GameError::Busy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::JAIL_INDEX;

    fn session() -> GameSession {
        GameSession::new(GameConfig {
            seed: Some(11),
            ..GameConfig::default()
        })
    }

    #[test]
    fn second_roll_while_moving_is_busy() {
        let mut game = session();
        game.roll_with(3).unwrap();
        let before = game.player().clone();
        assert_eq!(game.roll(), Err(GameError::Busy));
        assert_eq!(game.roll_with(2), Err(GameError::Busy));
        assert_eq!(game.player(), &before);
    }

    #[test]
    fn invalid_outcome_is_rejected() {
        let mut game = session();
        assert_eq!(game.roll_with(0), Err(GameError::InvalidRoll(0)));
        assert_eq!(game.roll_with(7), Err(GameError::InvalidRoll(7)));
        assert_eq!(game.phase(), &TurnPhase::Idle);
        assert_eq!(game.player().pending_roll, None);
    }

    #[test]
    fn position_commits_only_after_move_window() {
        let mut game = session();
        game.roll_with(6).unwrap();
        assert_eq!(game.tick(Duration::from_millis(400)), None);
        assert_eq!(game.player().position, 0);
        assert_eq!(game.tick(Duration::from_millis(599)), None);

        let moved = game.tick(Duration::from_millis(1)).unwrap();
        assert!(matches!(moved, TurnEvent::Moved(MoveReport { to: 6, .. })));
        assert_eq!(game.player().position, 6);

        assert_eq!(game.tick(Duration::from_millis(499)), None);
        assert!(matches!(game.phase(), TurnPhase::Settling { .. }));
        let landed = game.tick(Duration::from_millis(1)).unwrap();
        let offer = LandingEffect::OfferPurchase { cell: CellId(4), affordable: true };
        assert_eq!(landed, TurnEvent::Landed(offer.clone()));
        assert_eq!(game.phase(), &TurnPhase::Landed { effect: offer });
    }

    #[test]
    fn card_landing_returns_straight_to_idle() {
        let mut game = session();
        game.roll_with(2).unwrap();
        let events = game.settle();
        assert!(matches!(events[1], TurnEvent::Landed(LandingEffect::Card { .. })));
        assert_eq!(game.phase(), &TurnPhase::Idle);
    }

    #[test]
    fn purchase_view_blocks_rolling_until_acknowledged() {
        let mut game = session();
        game.roll_with(1).unwrap();
        game.settle();
        assert!(matches!(game.phase(), TurnPhase::Landed { .. }));
        assert_eq!(game.roll(), Err(GameError::Busy));
        assert!(game.acknowledge());
        assert!(!game.acknowledge());
        assert!(game.roll().is_ok());
    }

    #[test]
    fn purchase_during_move_is_busy() {
        let mut game = session();
        game.roll_with(2).unwrap();
        let err = game.purchase(CellId(1), Evidence::new(vec![1])).unwrap_err();
        assert_eq!(err, GameError::Busy);
        assert!(game.ledger().is_empty());
    }

    #[test]
    fn settling_window_rejects_every_action() {
        let mut game = session();
        game.roll_with(6).unwrap();
        assert!(matches!(game.tick(Duration::from_millis(1000)), Some(TurnEvent::Moved(_))));
        assert!(matches!(game.phase(), TurnPhase::Settling { .. }));
        let player = game.player().clone();
        let phase = game.phase().clone();

        assert_eq!(game.roll(), Err(GameError::Busy));
        assert_eq!(game.roll_with(1), Err(GameError::Busy));
        assert_eq!(game.purchase(CellId(4), Evidence::new(vec![1])), Err(GameError::Busy));
        assert_eq!(game.view(CellId(4)), Err(GameError::Busy));
        assert!(!game.acknowledge());

        assert_eq!(game.player(), &player);
        assert_eq!(game.phase(), &phase);
        assert!(game.ledger().is_empty());
    }

    #[test]
    fn open_view_only_sells_its_own_cell() {
        let mut game = session();
        game.view(CellId(19)).unwrap();
        assert_eq!(game.viewed_cell(), Some(CellId(19)));

        let err = game.purchase(CellId(1), Evidence::new(vec![1])).unwrap_err();
        assert_eq!(err, GameError::Busy);
        assert_eq!(game.player().funds, 1500);
        assert!(game.ledger().is_empty());
        assert_eq!(game.viewed_cell(), Some(CellId(19)));

        game.purchase(CellId(19), Evidence::new(vec![1])).unwrap();
        assert_eq!(game.viewed_cell(), None);
        assert!(game.ledger().is_owned(CellId(19)));
    }

    #[test]
    fn purchase_closes_the_view() {
        let mut game = session();
        game.roll_with(1).unwrap();
        game.settle();
        game.purchase(CellId(1), Evidence::new(vec![1])).unwrap();
        assert_eq!(game.phase(), &TurnPhase::Idle);
        assert_eq!(game.player().funds, 1440);
    }

    #[test]
    fn view_opens_any_mastery_cell() {
        let mut game = session();
        let effect = game.view(CellId(19)).unwrap();
        assert_eq!(effect, LandingEffect::OfferPurchase { cell: CellId(19), affordable: true });
        assert_eq!(game.view(CellId(18)), Err(GameError::Busy));
        game.acknowledge();
        assert_eq!(
            game.view(CellId(-2)),
            Err(GameError::Purchase(PurchaseError::NotPurchasable(CellId(-2))))
        );
    }

    #[test]
    fn go_to_jail_after_moving() {
        let mut game = GameSession::from_parts(
            GameConfig::instant(),
            Player {
                position: 24,
                ..Player::new(1500)
            },
            Ledger::new(),
        );
        game.roll_with(3).unwrap();
        let events = game.settle();
        assert_eq!(events.len(), 2);
        assert_eq!(game.player().position, JAIL_INDEX);
        assert!(game.player().in_rest);

        game.roll_with(1).unwrap();
        assert!(!game.player().in_rest);
    }

    #[test]
    fn reset_mid_turn_returns_to_start() {
        let mut game = session();
        game.roll_with(1).unwrap();
        game.settle();
        game.purchase(CellId(1), Evidence::new(vec![1])).unwrap();
        game.roll_with(4).unwrap();

        game.reset();
        assert_eq!(game.phase(), &TurnPhase::Idle);
        assert_eq!(game.player(), &Player::new(1500));
        assert!(game.ledger().is_empty());
        assert_eq!(game.tick(Duration::MAX), None);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut game = session();
        game.purchase(CellId(16), Evidence::new(vec![1])).unwrap();
        let snapshot = game.snapshot();
        assert_eq!(snapshot.owned, vec![CellId(16)]);
        assert_eq!(snapshot.progress.color, 0.25);
        assert_eq!(snapshot.painting.pigment, 0.25);
        assert_eq!(snapshot.player.funds, 1240);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["player"]["funds"], 1240);
        assert_eq!(json["phase"], "Idle");
    }
}
