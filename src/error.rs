use crate::board::CellId;
use thiserror::Error;

/// Rejections on the purchase path. None of them mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("cell {0} cannot be mastered")]
    NotPurchasable(CellId),
    #[error("cell {0} is already mastered")]
    AlreadyOwned(CellId),
    #[error("insufficient funds: price {price}, available {funds}")]
    InsufficientFunds { price: u32, funds: u32 },
    #[error("an evidence artifact is required to master a cell")]
    MissingEvidence,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("a turn is already in flight")]
    Busy,
    #[error("die outcome {0} is outside 1..=6")]
    InvalidRoll(u8),
    #[error(transparent)]
    Purchase(#[from] PurchaseError),
}
