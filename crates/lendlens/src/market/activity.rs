use alloy::primitives::Address;
use serde::Serialize;
use std::collections::BTreeMap;

/// An in-flight user action on a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyAction {
    Supply,
    Withdraw,
    Borrow,
    Repay,
    /// Anything not tied to one form, e.g. entering a market.
    General,
}

/// Busy flags for one market. All clear by default.
#[expect(
    clippy::struct_excessive_bools,
    reason = "one independent flag per form the presentation layer shows"
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MarketActivity {
    pub supply: bool,
    pub withdraw: bool,
    pub borrow: bool,
    pub repay: bool,
    pub general: bool,
}

impl MarketActivity {
    fn flag_mut(&mut self, action: BusyAction) -> &mut bool {
        match action {
            BusyAction::Supply => &mut self.supply,
            BusyAction::Withdraw => &mut self.withdraw,
            BusyAction::Borrow => &mut self.borrow,
            BusyAction::Repay => &mut self.repay,
            BusyAction::General => &mut self.general,
        }
    }

    pub const fn is_busy(&self, action: BusyAction) -> bool {
        match action {
            BusyAction::Supply => self.supply,
            BusyAction::Withdraw => self.withdraw,
            BusyAction::Borrow => self.borrow,
            BusyAction::Repay => self.repay,
            BusyAction::General => self.general,
        }
    }

    pub const fn any(&self) -> bool {
        self.supply || self.withdraw || self.borrow || self.repay || self.general
    }
}

/// Per-market busy flags owned by the presentation layer.
///
/// Kept apart from [`super::MarketView`] so a refresh never clobbers an in-flight action.
#[derive(Debug, Clone, Default)]
pub struct ActivityBook {
    markets: BTreeMap<Address, MarketActivity>,
}

impl ActivityBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `action` as in flight. Returns `false` if it already was.
    pub fn begin(&mut self, market: Address, action: BusyAction) -> bool {
        let flag = self.markets.entry(market).or_default().flag_mut(action);
        !std::mem::replace(flag, true)
    }

    pub fn finish(&mut self, market: Address, action: BusyAction) {
        if let Some(a) = self.markets.get_mut(&market) {
            *a.flag_mut(action) = false;
            if !a.any() {
                self.markets.remove(&market);
            }
        }
    }

    pub fn is_busy(&self, market: Address, action: BusyAction) -> bool {
        self.get(market).is_busy(action)
    }

    pub fn get(&self, market: Address) -> MarketActivity {
        self.markets.get(&market).copied().unwrap_or_default()
    }
}
