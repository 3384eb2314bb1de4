//! Ownership ledger: which cells are mastered, and the evidence behind each.

use crate::board::{Board, CellId, CellKind};
use crate::error::PurchaseError;
use crate::player::Player;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Opaque proof-of-work payload attached to a purchase.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Evidence {
    bytes: Vec<u8>,
    mime: Option<String>,
}

impl Evidence {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Parses a `data:<mime>;base64,<payload>` URI. Anything that is not a
    /// base64 data URI is kept verbatim as text bytes.
    pub fn from_data_uri(uri: &str) -> Self {
        let parsed = uri.strip_prefix("data:").and_then(|rest| {
            let (header, payload) = rest.split_once(',')?;
            let mime = header.strip_suffix(";base64")?;
            let bytes = STANDARD.decode(payload.trim()).ok()?;
            Some((mime, bytes))
        });
        match parsed {
            Some((mime, bytes)) if !mime.is_empty() => Self::new(bytes).with_mime(mime),
            Some((_, bytes)) => Self::new(bytes),
            None => Self::new(uri.as_bytes()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }
}

impl fmt::Debug for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evidence")
            .field("len", &self.bytes.len())
            .field("mime", &self.mime)
            .finish()
    }
}

/// Receipt for a successful purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OwnershipRecord {
    pub cell: CellId,
    pub price: u32,
    pub funds_after: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    owned: BTreeMap<CellId, Evidence>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_owned(&self, id: CellId) -> bool {
        self.owned.contains_key(&id)
    }

    pub fn evidence(&self, id: CellId) -> Option<&Evidence> {
        self.owned.get(&id)
    }

    pub fn owned_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.owned.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    /// Masters `id` for `player`. Either every check passes and the price is
    /// debited with the evidence recorded, or nothing changes.
    pub fn purchase(
        &mut self,
        board: &Board,
        id: CellId,
        player: &mut Player,
        evidence: Evidence,
    ) -> Result<OwnershipRecord, PurchaseError> {
        let cell = board
            .cell(id)
            .filter(|cell| cell.kind == CellKind::Purchasable)
            .ok_or(PurchaseError::NotPurchasable(id))?;

        if self.is_owned(id) {
            debug!(cell = %id, "purchase rejected: already owned");
            return Err(PurchaseError::AlreadyOwned(id));
        }
        if player.funds < cell.price {
            debug!(
                cell = %id,
                price = cell.price,
                funds = player.funds,
                "purchase rejected: insufficient funds"
            );
            return Err(PurchaseError::InsufficientFunds {
                price: cell.price,
                funds: player.funds,
            });
        }
        if evidence.is_empty() {
            debug!(cell = %id, "purchase rejected: missing evidence");
            return Err(PurchaseError::MissingEvidence);
        }

        player.funds -= cell.price;
        self.owned.insert(id, evidence);
        info!(
            cell = %id,
            name = cell.name,
            price = cell.price,
            funds = player.funds,
            "cell mastered"
        );

        Ok(OwnershipRecord {
            cell: id,
            price: cell.price,
            funds_after: player.funds,
        })
    }

    pub fn clear(&mut self) {
        self.owned.clear();
    }
}
