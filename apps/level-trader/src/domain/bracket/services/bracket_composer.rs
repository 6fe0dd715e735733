//! Bracket Composer
//!
//! Sizes an entry and derives its stop, target and time-exit legs.

use rust_decimal::Decimal;

use crate::domain::bracket::value_objects::{
    BracketOrder, EntrySkipped, LegRole, OcaGroup, OcaKind, OrderKind, OrderSpec,
    PositionDirection,
};
use crate::domain::instruction::{EntrySide, Instruction, TradingMode};
use crate::domain::market::{Contract, Quote};
use crate::domain::pricing::{TickRuleError, TickRuleTable};
use crate::domain::shared::{VenueTime, compact_stamp};

/// Everything needed to compose one bracket.
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
    /// Instruction of the underlying.
    pub instruction: &'a Instruction,
    /// Side the crossing triggered.
    pub side: EntrySide,
    /// Contract that will be traded.
    pub contract: &'a Contract,
    /// Current quote of the traded contract.
    pub quote: &'a Quote,
    /// Tick rules of the traded contract.
    pub rules: &'a TickRuleTable,
    /// Session close.
    pub close_deadline: VenueTime,
    /// Current venue time.
    pub now: VenueTime,
    /// Account the orders are placed for.
    pub account: &'a str,
}

/// Outcome of a compose attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// A bracket ready for placement.
    Bracket(Box<BracketOrder>),
    /// The entry was skipped.
    Skipped(EntrySkipped),
}

/// Builds brackets with references tagged by the application name.
#[derive(Debug, Clone)]
pub struct BracketComposer {
    app_name: String,
    oca_kind: OcaKind,
}

impl BracketComposer {
    /// Create a composer whose order references carry `app_name`.
    ///
    /// Exit legs are grouped with reduce-with-block semantics: a partial fill
    /// on one exit reduces the others by the same quantity.
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            oca_kind: OcaKind::ReduceWithBlock,
        }
    }

    /// Build `<prefix>_<app>_<symbol>_<YYYYmmdd_HHMMSS>`.
    #[must_use]
    pub fn reference(&self, prefix: &str, symbol: &str, at: &VenueTime) -> String {
        format!("{prefix}_{}_{symbol}_{}", self.app_name, compact_stamp(at))
    }

    /// Compose a bracket or explain why the entry is skipped.
    ///
    /// # Errors
    ///
    /// Returns a `TickRuleError` if the stop or target cannot be legalized.
    pub fn compose(&self, request: &ComposeRequest<'_>) -> Result<Composition, TickRuleError> {
        let instruction = request.instruction;

        let Some((bid, ask)) = request.quote.tradable_book() else {
            return Ok(Composition::Skipped(EntrySkipped::InvalidQuote));
        };

        let spread = (ask - bid).abs();
        let last = request
            .quote
            .last
            .filter(|l| *l > Decimal::ZERO)
            .unwrap_or(ask);
        let ratio = spread / last;
        let limit = instruction.stop_fraction();
        if ratio > limit {
            return Ok(Composition::Skipped(EntrySkipped::SpreadTooWide {
                ratio: ratio.round_dp(4),
                limit,
            }));
        }

        let direction = match (instruction.mode, request.side) {
            (TradingMode::Stocks, EntrySide::Falling) => PositionDirection::Short,
            _ => PositionDirection::Long,
        };
        let reference_price = match direction {
            PositionDirection::Long => ask,
            PositionDirection::Short => bid,
        };

        let multiplier = request.contract.multiplier;
        if multiplier <= Decimal::ZERO {
            return Ok(Composition::Skipped(EntrySkipped::InvalidMultiplier {
                local_symbol: request.contract.local_symbol.clone(),
                multiplier,
            }));
        }
        let unit_cost = reference_price * multiplier;
        let size = instruction
            .amount
            .checked_div(unit_cost)
            .map_or(Decimal::ZERO, |units| units.floor());
        if size < Decimal::ONE {
            return Ok(Composition::Skipped(EntrySkipped::SizeTooSmall {
                amount: instruction.amount,
                unit_cost,
            }));
        }

        let stop = instruction.stop_fraction();
        let target = instruction.target_fraction();
        let (raw_stop, raw_target) = match direction {
            PositionDirection::Long => (
                reference_price * (Decimal::ONE - stop),
                reference_price * (Decimal::ONE + target),
            ),
            PositionDirection::Short => (
                reference_price * (Decimal::ONE + stop),
                reference_price * (Decimal::ONE - target),
            ),
        };
        let stop_price = request.rules.legalize(raw_stop)?;
        let target_price = request.rules.legalize(raw_target)?;

        let exit_time = request.close_deadline - instruction.flatten_delay();
        let symbol = instruction.symbol.as_str();
        let group = OcaGroup {
            name: self.reference("oca", symbol, &request.now),
            kind: self.oca_kind,
        };

        let entry_side = direction.entry_side();
        let leg = |role: LegRole, kind: OrderKind, in_group: bool| OrderSpec {
            role,
            side: if role == LegRole::Entry {
                entry_side
            } else {
                entry_side.opposite()
            },
            kind,
            quantity: size,
            order_ref: self.reference(role.prefix(), symbol, &request.now),
            account: request.account.to_string(),
            bracket_ref: group.name.clone(),
            oca: in_group.then(|| group.clone()),
            good_after: (role == LegRole::TimeExit).then_some(exit_time),
        };

        let bracket = BracketOrder {
            direction,
            size,
            reference_price,
            entry: leg(LegRole::Entry, OrderKind::Market, false),
            stop_exit: leg(
                LegRole::StopExit,
                OrderKind::Stop {
                    trigger: stop_price,
                },
                true,
            ),
            target_exit: leg(
                LegRole::TargetExit,
                OrderKind::Limit {
                    limit: target_price,
                },
                true,
            ),
            time_exit: leg(LegRole::TimeExit, OrderKind::Market, true),
            group: group.clone(),
            exit_time,
        };

        Ok(Composition::Bracket(Box::new(bracket)))
    }
}
