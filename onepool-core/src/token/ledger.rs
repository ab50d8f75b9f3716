use crate::error::{CoreError, Result};
use crate::token::{bps_of, FeeToken, StakeToken, BPS_DENOMINATOR};
use crate::types::{tokens, Address, Amount};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Serializable contents of a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerState {
    pub name: String,
    pub symbol: String,
    pub owner: Address,
    pub total_supply: Amount,
    /// Burned on every transfer unless one side is excluded.
    pub transfer_tax_bps: u16,
    /// Anyone may mint to themselves (test fee tokens).
    pub public_mint: bool,
    pub balances: BTreeMap<Address, Amount>,
    pub allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    pub tax_excluded: BTreeSet<Address>,
}

impl LedgerState {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn tax_for(&self, from: &Address, to: &Address, amount: Amount) -> Amount {
        if self.tax_excluded.contains(from) || self.tax_excluded.contains(to) {
            return 0;
        }
        bps_of(amount, self.transfer_tax_bps)
    }

    /// Every check happens before the first write.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<Amount> {
        let available = self.balance(from);
        if available < amount {
            return Err(CoreError::InsufficientBalance {
                need: amount,
                available,
            });
        }

        let tax = self.tax_for(from, to, amount);
        let received = amount - tax;
        let to_balance = self
            .balance(to)
            .checked_add(received)
            .ok_or_else(|| CoreError::overflow("recipient balance"))?;

        self.balances.insert(from.clone(), available - amount);
        // `from == to` must see the debit before the credit.
        let to_balance = if from == to {
            available - amount + received
        } else {
            to_balance
        };
        self.balances.insert(to.clone(), to_balance);
        self.total_supply -= tax;

        Ok(received)
    }
}

/// Shared handle to an in-memory ERC-20 style ledger.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl TokenLedger {
    pub fn new(
        name: &str,
        symbol: &str,
        owner: Address,
        initial_supply: Amount,
        transfer_tax_bps: u16,
    ) -> Result<Self> {
        if transfer_tax_bps as u128 > BPS_DENOMINATOR {
            return Err(CoreError::config("Transfer tax must not exceed 10000 bps"));
        }

        let mut balances = BTreeMap::new();
        if initial_supply > 0 {
            balances.insert(owner.clone(), initial_supply);
        }

        let state = LedgerState {
            name: name.to_string(),
            symbol: symbol.to_string(),
            owner,
            total_supply: initial_supply,
            transfer_tax_bps,
            public_mint: false,
            balances,
            allowances: BTreeMap::new(),
            tax_excluded: BTreeSet::new(),
        };

        Ok(Self::from_state(state))
    }

    /// The deflationary 1POOL token: 10 000 tokens to the owner, 4% burned per transfer.
    pub fn one_pool(owner: Address) -> Result<Self> {
        Self::new("OnePool", "1POOL", owner, tokens(10_000), 400)
    }

    /// A tax-free fee token anyone can mint.
    pub fn fee_token(name: &str, symbol: &str, owner: Address) -> Result<Self> {
        let ledger = Self::new(name, symbol, owner, 0, 0)?;
        ledger.state.write().public_mint = true;
        Ok(ledger)
    }

    pub fn from_state(state: LedgerState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn to_state(&self) -> LedgerState {
        self.state.read().clone()
    }

    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    pub fn owner(&self) -> Address {
        self.state.read().owner.clone()
    }

    pub fn total_supply(&self) -> Amount {
        self.state.read().total_supply
    }

    pub fn transfer_tax_bps(&self) -> u16 {
        self.state.read().transfer_tax_bps
    }

    pub fn approve(&self, owner: &Address, spender: &Address, amount: Amount) {
        let mut state = self.state.write();
        state
            .allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);

        tracing::debug!("{} approved {} for {} {}", owner, spender, amount, state.symbol);
    }

    /// Owner mints, or anyone when the ledger allows public minting.
    pub fn mint(&self, caller: &Address, to: &Address, amount: Amount) -> Result<()> {
        let mut state = self.state.write();
        if !state.public_mint && caller != &state.owner {
            return Err(CoreError::unauthorized("caller is not the owner"));
        }

        let total_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| CoreError::overflow("total supply"))?;
        let balance = state.balance(to) + amount;

        state.total_supply = total_supply;
        state.balances.insert(to.clone(), balance);

        tracing::debug!("Minted {} {} to {}", amount, state.symbol, to);
        Ok(())
    }

    pub fn transfer_ownership(&self, caller: &Address, new_owner: Address) -> Result<()> {
        let mut state = self.state.write();
        if caller != &state.owner {
            return Err(CoreError::unauthorized("caller is not the owner"));
        }

        tracing::info!(
            "{} ownership transferred from {} to {}",
            state.symbol,
            state.owner,
            new_owner
        );
        state.owner = new_owner;
        Ok(())
    }

    pub fn set_tax_excluded(&self, caller: &Address, account: &Address, excluded: bool) -> Result<()> {
        let mut state = self.state.write();
        if caller != &state.owner {
            return Err(CoreError::unauthorized("caller is not the owner"));
        }

        if excluded {
            state.tax_excluded.insert(account.clone());
        } else {
            state.tax_excluded.remove(account);
        }
        Ok(())
    }
}

impl FeeToken for TokenLedger {
    fn symbol(&self) -> String {
        self.state.read().symbol.clone()
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.state.read().balance(account)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state.read().allowance(owner, spender)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<Amount> {
        let mut state = self.state.write();

        let allowed = state.allowance(from, spender);
        if allowed < amount {
            return Err(CoreError::InsufficientAllowance {
                need: amount,
                available: allowed,
            });
        }

        let received = state.move_balance(from, to, amount)?;
        state
            .allowances
            .entry(from.clone())
            .or_default()
            .insert(spender.clone(), allowed - amount);

        Ok(received)
    }
}

impl StakeToken for TokenLedger {
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<Amount> {
        self.state.write().move_balance(from, to, amount)
    }

    fn burn(&self, from: &Address, amount: Amount) -> Result<()> {
        let mut state = self.state.write();
        let available = state.balance(from);
        if available < amount {
            return Err(CoreError::InsufficientBalance {
                need: amount,
                available,
            });
        }

        state.balances.insert(from.clone(), available - amount);
        state.total_supply -= amount;

        tracing::debug!("Burned {} {} from {}", amount, state.symbol, from);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TokenLedger, Address, Address, Address) {
        let owner = Address::new("owner");
        let ledger = TokenLedger::one_pool(owner.clone()).unwrap();
        (ledger, owner, Address::new("addr1"), Address::new("addr2"))
    }

    #[test]
    fn test_owner_holds_total_supply() {
        let (ledger, owner, _, _) = setup();
        assert_eq!(ledger.symbol(), "1POOL");
        assert_eq!(ledger.balance_of(&owner), ledger.total_supply());
    }

    #[test]
    fn test_transfer_burns_tax() {
        let (ledger, owner, addr1, addr2) = setup();

        ledger.transfer(&owner, &addr1, 1000).unwrap();
        assert_eq!(ledger.balance_of(&addr1), 960);

        ledger.transfer(&addr1, &addr2, 960).unwrap();
        assert_eq!(ledger.balance_of(&addr2), 922);
    }

    #[test]
    fn test_balances_after_transfers() {
        let (ledger, owner, addr1, addr2) = setup();
        let supply = ledger.total_supply();

        ledger.transfer(&owner, &addr1, 100).unwrap();
        ledger.transfer(&owner, &addr2, 200).unwrap();

        assert_eq!(
            ledger.balance_of(&owner).to_string(),
            "9999999999999999999700"
        );
        assert_eq!(ledger.balance_of(&addr1), 96);
        assert_eq!(ledger.balance_of(&addr2), 192);
        assert_eq!(ledger.total_supply(), supply - 12);
    }

    #[test]
    fn test_transfer_exceeding_balance_fails() {
        let (ledger, owner, addr1, _) = setup();
        let before = ledger.balance_of(&owner);

        let result = ledger.transfer(&addr1, &owner, 1);
        assert!(matches!(
            result,
            Err(CoreError::InsufficientBalance { need: 1, available: 0 })
        ));
        assert_eq!(ledger.balance_of(&owner), before);
    }

    #[test]
    fn test_excluded_recipient_receives_in_full() {
        let (ledger, owner, addr1, _) = setup();
        let pool = Address::new("pool");
        ledger.set_tax_excluded(&owner, &pool, true).unwrap();

        ledger.transfer(&owner, &pool, 1000).unwrap();
        assert_eq!(ledger.balance_of(&pool), 1000);

        assert!(ledger.set_tax_excluded(&addr1, &addr1, true).is_err());
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let (ledger, owner, addr1, _) = setup();
        ledger.set_tax_excluded(&owner, &addr1, true).unwrap();

        assert!(matches!(
            ledger.transfer_from(&addr1, &owner, &addr1, 10),
            Err(CoreError::InsufficientAllowance { .. })
        ));

        ledger.approve(&owner, &addr1, 15);
        ledger.transfer_from(&addr1, &owner, &addr1, 10).unwrap();
        assert_eq!(ledger.allowance(&owner, &addr1), 5);
        assert_eq!(ledger.balance_of(&addr1), 10);
    }

    #[test]
    fn test_huge_taxed_transfer_does_not_overflow() {
        let (ledger, owner, addr1, _) = setup();
        ledger.mint(&owner, &owner, u128::MAX / 2).unwrap();

        let amount = u128::MAX / 4;
        let received = ledger.transfer(&owner, &addr1, amount).unwrap();

        assert_eq!(received, amount - bps_of(amount, 400));
        assert_eq!(ledger.balance_of(&addr1), received);
    }

    #[test]
    fn test_bps_of_matches_plain_arithmetic() {
        for amount in [0, 1, 99, 1000, 960, 123_456_789] {
            assert_eq!(bps_of(amount, 400), amount * 400 / BPS_DENOMINATOR);
        }
        assert_eq!(bps_of(u128::MAX, 10_000), u128::MAX);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let (ledger, owner, _, _) = setup();
        let supply = ledger.total_supply();

        ledger.burn(&owner, 500).unwrap();
        assert_eq!(ledger.total_supply(), supply - 500);
    }

    #[test]
    fn test_mint_permissions() {
        let (ledger, owner, addr1, _) = setup();
        assert!(ledger.mint(&addr1, &addr1, 1).is_err());
        ledger.mint(&owner, &addr1, 1).unwrap();

        let fee = TokenLedger::fee_token("Bogged", "BOG", owner).unwrap();
        fee.mint(&addr1, &addr1, 42).unwrap();
        assert_eq!(fee.balance_of(&addr1), 42);
    }

    #[test]
    fn test_ownership_handoff() {
        let (ledger, owner, addr1, _) = setup();
        let master = Address::new("master");

        ledger.transfer_ownership(&owner, master.clone()).unwrap();
        assert_eq!(ledger.owner(), master);
        assert!(ledger.transfer_ownership(&owner, addr1).is_err());
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let (ledger, owner, addr1, _) = setup();
        ledger.approve(&owner, &addr1, 7);

        let json = serde_json::to_string(&ledger.to_state()).unwrap();
        let restored = TokenLedger::from_state(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.allowance(&owner, &addr1), 7);
        assert_eq!(restored.balance_of(&owner), ledger.balance_of(&owner));
    }
}
