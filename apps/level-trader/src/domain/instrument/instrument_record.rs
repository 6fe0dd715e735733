//! Instrument Record Aggregate
//!
//! Everything the trading loop knows about one symbol: its instruction, the
//! resolved underlying, the price sample, the trading state and the bracket
//! currently working.

use rust_decimal::Decimal;

use crate::domain::bracket::PlacedBracket;
use crate::domain::instruction::{EntrySide, Instruction};
use crate::domain::instrument::TradingState;
use crate::domain::market::Contract;
use crate::domain::session::GlobalState;
use crate::domain::shared::{StateChange, Symbol, TransitionError, VenueTime};
use crate::domain::signal::{Crossing, PriceSample};

/// What happened to a reloaded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionUpdate {
    /// The new instruction is in effect.
    Applied,
    /// The record is ACTIVE; the new instruction applies on the return to IDLE.
    Deferred,
    /// The instruction is identical to the current one.
    Unchanged,
}

/// Per-symbol trading record.
#[derive(Debug, Clone)]
pub struct InstrumentRecord {
    instruction: Instruction,
    underlying: Contract,
    state: TradingState,
    sample: PriceSample,
    bracket: Option<PlacedBracket>,
    pending: Option<Instruction>,
    retired: bool,
}

impl InstrumentRecord {
    /// Create an IDLE record.
    #[must_use]
    pub fn new(instruction: Instruction, underlying: Contract) -> Self {
        Self {
            instruction,
            underlying,
            state: TradingState::Idle,
            sample: PriceSample::default(),
            bracket: None,
            pending: None,
            retired: false,
        }
    }

    /// Underlying symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.instruction.symbol
    }

    /// Instruction in effect.
    #[must_use]
    pub const fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    /// Resolved underlying contract.
    #[must_use]
    pub const fn underlying(&self) -> &Contract {
        &self.underlying
    }

    /// Current trading state.
    #[must_use]
    pub const fn state(&self) -> TradingState {
        self.state
    }

    /// Last two sampled prices.
    #[must_use]
    pub const fn sample(&self) -> &PriceSample {
        &self.sample
    }

    /// Working bracket, while ACTIVE.
    #[must_use]
    pub const fn bracket(&self) -> Option<&PlacedBracket> {
        self.bracket.as_ref()
    }

    /// Position size of the working bracket, zero when flat.
    #[must_use]
    pub fn position_size(&self) -> Decimal {
        self.bracket.as_ref().map_or(Decimal::ZERO, |b| b.order.size)
    }

    /// Instruction waiting for the return to IDLE.
    #[must_use]
    pub const fn pending_instruction(&self) -> Option<&Instruction> {
        self.pending.as_ref()
    }

    /// Returns true once the symbol left the instruction file.
    #[must_use]
    pub const fn is_retired(&self) -> bool {
        self.retired
    }

    /// Record the latest last-trade price.
    pub const fn observe_price(&mut self, last: Option<Decimal>) {
        self.sample.advance(last);
    }

    /// Last instant at which entries are allowed: `close - flatten delay`.
    #[must_use]
    pub fn entry_deadline(&self, close: VenueTime) -> VenueTime {
        close - self.instruction.flatten_delay()
    }

    /// Returns true if a crossing may open a new bracket now.
    #[must_use]
    pub fn accepts_entries(&self, global: GlobalState, now: VenueTime, close: VenueTime) -> bool {
        self.state == TradingState::Idle
            && global == GlobalState::Active
            && !self.retired
            && now < self.entry_deadline(close)
    }

    /// Entry side triggered by the last price step, if any.
    ///
    /// Only sides configured in the instruction are considered.
    #[must_use]
    pub fn signal(&self) -> Option<EntrySide> {
        let rising = self
            .instruction
            .rising
            .filter(|level| self.sample.crossing(level.threshold) == Crossing::Rising)
            .map(|_| EntrySide::Rising);
        let falling = self
            .instruction
            .falling
            .filter(|level| self.sample.crossing(level.threshold) == Crossing::Falling)
            .map(|_| EntrySide::Falling);
        falling.or(rising)
    }

    /// IDLE -> ACTIVE once the exits of `bracket` are working.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` unless the record is IDLE.
    pub fn activate(
        &mut self,
        bracket: PlacedBracket,
        now: VenueTime,
    ) -> Result<StateChange, TransitionError> {
        let change = self.switch(TradingState::Active, now)?;
        self.bracket = Some(bracket);
        Ok(change)
    }

    /// ACTIVE -> IDLE once the stop or the time exit filled the whole position.
    ///
    /// Returns `Ok(None)` while neither exit is complete.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` unless the record is ACTIVE.
    pub fn on_exit_progress(
        &mut self,
        stop_filled: Decimal,
        time_filled: Decimal,
        now: VenueTime,
    ) -> Result<Option<StateChange>, TransitionError> {
        if self.state != TradingState::Active {
            return Err(TransitionError::new(
                self.symbol().as_str(),
                self.state,
                TradingState::Idle,
            ));
        }

        let size = self.position_size();
        if stop_filled != size && time_filled != size {
            return Ok(None);
        }

        let change = self.switch(TradingState::Idle, now)?;
        self.bracket = None;
        if let Some(next) = self.pending.take() {
            self.instruction = next;
        }
        Ok(Some(change))
    }

    /// IDLE -> DONE_NO_VALID_DERIVATIVE.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` unless the record is IDLE.
    pub fn mark_no_valid_derivative(
        &mut self,
        now: VenueTime,
    ) -> Result<StateChange, TransitionError> {
        self.switch(TradingState::DoneNoValidDerivative, now)
    }

    /// Swap in a reloaded instruction for the same symbol.
    pub fn replace_instruction(&mut self, instruction: Instruction) -> InstructionUpdate {
        self.retired = false;
        if instruction == self.instruction {
            self.pending = None;
            return InstructionUpdate::Unchanged;
        }
        if self.state == TradingState::Active {
            self.pending = Some(instruction);
            InstructionUpdate::Deferred
        } else {
            self.instruction = instruction;
            InstructionUpdate::Applied
        }
    }

    /// Stop opening brackets for this symbol. A working bracket runs to completion.
    pub const fn retire(&mut self) {
        self.retired = true;
    }

    fn switch(&mut self, to: TradingState, now: VenueTime) -> Result<StateChange, TransitionError> {
        if !self.state.can_transition_to(to) {
            return Err(TransitionError::new(self.symbol().as_str(), self.state, to));
        }
        let change = StateChange::new(self.symbol().as_str(), self.state, to, now);
        self.state = to;
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bracket::{
        BracketOrder, LegRole, OcaGroup, OcaKind, OrderHandle, OrderKind, OrderSide, OrderSpec,
        PositionDirection,
    };
    use crate::domain::instruction::{EntryLevel, TradingMode};
    use crate::domain::market::ContractKind;
    use chrono::{DateTime, Duration, NaiveDate};
    use rust_decimal_macros::dec;

    fn time(s: &str) -> VenueTime {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn instruction() -> Instruction {
        let expiration = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        Instruction {
            symbol: Symbol::new("X"),
            currency: "USD".to_string(),
            mode: TradingMode::Options,
            amount: dec!(1000),
            stop_pct: dec!(10),
            target_pct: dec!(20),
            rising: Some(EntryLevel::option(dec!(100), dec!(100), expiration)),
            falling: Some(EntryLevel::option(dec!(90), dec!(90), expiration)),
            flatten_delay_minutes: 15,
        }
    }

    fn contract() -> Contract {
        Contract {
            con_id: 7,
            symbol: Symbol::new("X"),
            local_symbol: "X".to_string(),
            kind: ContractKind::Stock,
            currency: "USD".to_string(),
            exchange: "SMART".to_string(),
            multiplier: dec!(1),
            market_rules: vec![],
        }
    }

    fn leg(role: LegRole, id: i64) -> (OrderSpec, OrderHandle) {
        let spec = OrderSpec {
            role,
            side: if role == LegRole::Entry {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            },
            kind: OrderKind::Market,
            quantity: dec!(2),
            order_ref: format!("{}_t_X", role.prefix()),
            account: "DU1".to_string(),
            bracket_ref: "oca_t_X".to_string(),
            oca: None,
            good_after: None,
        };
        let handle = OrderHandle {
            order_id: id,
            order_ref: spec.order_ref.clone(),
        };
        (spec, handle)
    }

    fn placed() -> PlacedBracket {
        let (entry, entry_h) = leg(LegRole::Entry, 1);
        let (stop, stop_h) = leg(LegRole::StopExit, 2);
        let (target, target_h) = leg(LegRole::TargetExit, 3);
        let (time_exit, time_h) = leg(LegRole::TimeExit, 4);
        PlacedBracket {
            order: BracketOrder {
                direction: PositionDirection::Long,
                size: dec!(2),
                reference_price: dec!(5),
                entry,
                stop_exit: stop,
                target_exit: target,
                time_exit,
                group: OcaGroup {
                    name: "oca_t_X".to_string(),
                    kind: OcaKind::ReduceWithBlock,
                },
                exit_time: time("2024-03-15T15:45:00-04:00"),
            },
            contract: contract(),
            entry: entry_h,
            stop_exit: stop_h,
            target_exit: target_h,
            time_exit: time_h,
        }
    }

    fn now() -> VenueTime {
        time("2024-03-15T10:00:00-04:00")
    }

    fn close() -> VenueTime {
        time("2024-03-15T16:00:00-04:00")
    }

    #[test]
    fn instrument_record_new() {
        let record = InstrumentRecord::new(instruction(), contract());
        assert_eq!(record.state(), TradingState::Idle);
        assert_eq!(record.symbol().as_str(), "X");
        assert!(record.bracket().is_none());
        assert_eq!(record.position_size(), Decimal::ZERO);
        assert!(!record.is_retired());
    }

    #[test]
    fn accepts_entries_requires_all_conditions() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        assert!(record.accepts_entries(GlobalState::Active, now(), close()));
        assert!(!record.accepts_entries(GlobalState::WaitMarketOpen, now(), close()));

        let deadline = time("2024-03-15T15:45:00-04:00");
        assert!(record.accepts_entries(
            GlobalState::Active,
            deadline - Duration::seconds(1),
            close()
        ));
        assert!(!record.accepts_entries(GlobalState::Active, deadline, close()));

        record.retire();
        assert!(!record.accepts_entries(GlobalState::Active, now(), close()));
    }

    #[test]
    fn signal_follows_configured_levels() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        record.observe_price(Some(dec!(99.5)));
        assert_eq!(record.signal(), None);

        record.observe_price(Some(dec!(100.5)));
        assert_eq!(record.signal(), Some(EntrySide::Rising));

        record.observe_price(Some(dec!(101)));
        assert_eq!(record.signal(), None);

        record.observe_price(Some(dec!(89)));
        assert_eq!(record.signal(), Some(EntrySide::Falling));
    }

    #[test]
    fn signal_ignores_disabled_side() {
        let mut inst = instruction();
        inst.rising = None;
        let mut record = InstrumentRecord::new(inst, contract());
        record.observe_price(Some(dec!(99.5)));
        record.observe_price(Some(dec!(100.5)));
        assert_eq!(record.signal(), None);
    }

    #[test]
    fn activate_once_per_entry() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        let change = record.activate(placed(), now()).unwrap();
        assert_eq!(change.to_string(), "20240315 10:00:00 X: IDLE -> ACTIVE");
        assert_eq!(record.position_size(), dec!(2));
        assert!(!record.accepts_entries(GlobalState::Active, now(), close()));

        let err = record.activate(placed(), now()).unwrap_err();
        assert_eq!(err.from, "ACTIVE");
    }

    #[test]
    fn exit_progress_returns_to_idle_on_full_stop() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        record.activate(placed(), now()).unwrap();

        assert_eq!(
            record
                .on_exit_progress(dec!(1), Decimal::ZERO, now())
                .unwrap(),
            None
        );
        let change = record
            .on_exit_progress(dec!(2), Decimal::ZERO, now())
            .unwrap()
            .unwrap();
        assert_eq!(change.to, "IDLE");
        assert!(record.bracket().is_none());
    }

    #[test]
    fn exit_progress_returns_to_idle_on_time_exit() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        record.activate(placed(), now()).unwrap();
        assert!(
            record
                .on_exit_progress(Decimal::ZERO, dec!(2), now())
                .unwrap()
                .is_some()
        );
        assert_eq!(record.state(), TradingState::Idle);
    }

    #[test]
    fn exit_progress_requires_active() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        assert!(record.on_exit_progress(dec!(2), dec!(0), now()).is_err());
    }

    #[test]
    fn no_valid_derivative_is_terminal() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        let change = record.mark_no_valid_derivative(now()).unwrap();
        assert_eq!(change.to, "DONE_NO_VALID_DERIVATIVE");

        assert!(record.activate(placed(), now()).is_err());
        assert!(record.mark_no_valid_derivative(now()).is_err());
        assert!(!record.accepts_entries(GlobalState::Active, now(), close()));
    }

    #[test]
    fn replace_instruction_when_idle() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        assert_eq!(
            record.replace_instruction(instruction()),
            InstructionUpdate::Unchanged
        );

        let mut next = instruction();
        next.amount = dec!(2000);
        assert_eq!(
            record.replace_instruction(next),
            InstructionUpdate::Applied
        );
        assert_eq!(record.instruction().amount, dec!(2000));
    }

    #[test]
    fn replace_instruction_deferred_while_active() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        record.activate(placed(), now()).unwrap();

        let mut next = instruction();
        next.stop_pct = dec!(5);
        assert_eq!(
            record.replace_instruction(next),
            InstructionUpdate::Deferred
        );
        assert_eq!(record.instruction().stop_pct, dec!(10));
        assert!(record.pending_instruction().is_some());

        record
            .on_exit_progress(dec!(2), Decimal::ZERO, now())
            .unwrap();
        assert_eq!(record.instruction().stop_pct, dec!(5));
        assert!(record.pending_instruction().is_none());
    }

    #[test]
    fn retired_record_is_revived_by_reload() {
        let mut record = InstrumentRecord::new(instruction(), contract());
        record.retire();
        assert!(record.is_retired());
        record.replace_instruction(instruction());
        assert!(!record.is_retired());
    }
}
