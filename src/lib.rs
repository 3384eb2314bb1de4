//! Core of a single-player painting-mastery board game.
//!
//! A token travels a 36-cell perimeter. Landing on cells buys mastery of a
//! painting skill, pays tax, draws a card or sends the token to the jail
//! corner. As the four skill modules fill in, the central painting fills in
//! with them. Rendering lives in the `ink-street` binary behind the `gui`
//! feature; this crate holds the rules.

pub mod advisor;
pub mod board;
pub mod config;
pub mod error;
pub mod ledger;
pub mod player;
pub mod progress;
pub mod session;
pub mod turn;

pub use board::{Board, Cell, CellId, CellKind, Module, catalog};
pub use config::{AdvisorConfig, GameConfig, Rules};
pub use error::{GameError, PurchaseError};
pub use ledger::{Evidence, Ledger, OwnershipRecord};
pub use player::Player;
pub use progress::{PaintingLayers, ProgressSnapshot, overall_progress, progress_for};
pub use session::{GameSession, SessionSnapshot, TurnEvent, TurnPhase};
pub use turn::{LandingEffect, MoveReport, resolve_landing, roll_and_advance};
