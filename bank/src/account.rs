use crate::messages::Outcome;

/// The one balance the bank keeps. Only the bank task holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceAccount {
    amount: i64,
}

impl BalanceAccount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the account with `amount` already in it. Negative openings are
    /// clamped to zero.
    pub fn with_balance(amount: i64) -> Self {
        BalanceAccount {
            amount: amount.max(0),
        }
    }

    /// Only positive amounts are accepted.
    pub fn deposit(&mut self, amount: i64) -> Outcome {
        if amount <= 0 {
            return Outcome::rejected(self.amount);
        }
        match self.amount.checked_add(amount) {
            Some(new_amount) => {
                self.amount = new_amount;
                Outcome::accepted(new_amount)
            }
            None => Outcome::rejected(self.amount),
        }
    }

    /// Fails without touching the balance when it does not cover `amount`.
    /// Negative amounts are refused, they would be an unchecked deposit.
    pub fn withdraw(&mut self, amount: i64) -> Outcome {
        if amount < 0 || self.amount < amount {
            return Outcome::rejected(self.amount);
        }
        self.amount -= amount;
        Outcome::accepted(self.amount)
    }

    pub fn balance(&self) -> Outcome {
        Outcome::accepted(self.amount)
    }
}
