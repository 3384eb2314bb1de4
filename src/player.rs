use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub position: usize,
    pub funds: u32,
    /// Set when a GoToJail cell sends the token to the jail corner. Cleared
    /// when the token next departs.
    pub in_rest: bool,
    /// Last die outcome, kept for display.
    pub pending_roll: Option<u8>,
}

impl Player {
    pub fn new(starting_funds: u32) -> Self {
        Self {
            position: 0,
            funds: starting_funds,
            in_rest: false,
            pending_roll: None,
        }
    }

    pub fn credit(&mut self, amount: u32) {
        self.funds = self.funds.saturating_add(amount);
    }

    /// Debits up to `amount`, flooring funds at zero. Returns what was taken.
    pub fn debit_clamped(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.funds);
        self.funds -= taken;
        taken
    }

    /// Applies a signed change, flooring at zero. Returns the change applied.
    pub fn adjust(&mut self, delta: i32) -> i32 {
        if delta >= 0 {
            self.credit(delta.unsigned_abs());
            delta
        } else {
            -(self.debit_clamped(delta.unsigned_abs()) as i32)
        }
    }

    pub fn reset(&mut self, starting_funds: u32) {
        *self = Self::new(starting_funds);
    }
}
