//! Trading Session Service
//!
//! One pass of the trading loop per [`TradingSession::iterate`] call:
//!
//! 1. Start the session on the first pass (market window, INIT -> WAIT_MARKET_OPEN)
//! 2. Reload instructions when the source changed and onboard new symbols
//! 3. Re-open any subscription lost in a reconnect
//! 4. Absorb venue notifications (fills, commissions, bars, errors)
//! 5. Sample last prices and log completed bars
//! 6. Evaluate entries, then exits, while the session is ACTIVE
//! 7. Advance the global session
//!
//! Venue traffic is pumped between the steps. Each pump is also where a
//! shutdown request interrupts the iteration; bracket placement never is.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    InstructionSourcePort, MarketCalendarPort, VenueError, VenueEvent, VenuePort,
};
use crate::application::services::subscriptions::SubscriptionRegistry;
use crate::domain::bracket::{
    BracketComposer, BracketOrder, ComposeRequest, Composition, EntrySkipped, OrderHandle,
    PlacedBracket,
};
use crate::domain::instruction::{EntrySide, Instruction, TradingMode};
use crate::domain::instrument::{InstructionUpdate, InstrumentRecord, TradingState};
use crate::domain::ledger::{ExecutionId, ExecutionLedger, ExecutionRecord};
use crate::domain::market::{BarSize, Contract, ContractSpec, OptionRight, Quote};
use crate::domain::pricing::{TickRuleError, TickRuleTable};
use crate::domain::session::{GlobalState, MarketWindow, SessionDefaults, SessionStateMachine};
use crate::domain::shared::{StateChange, Symbol, VenueTime, log_stamp};
use crate::error::TraderError;

/// Settings of a trading session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Name stamped into every order reference.
    pub app_name: String,
    /// Routing exchange for every contract.
    pub routing_exchange: String,
    /// Well-known contract whose trading hours define the session.
    pub reference: ContractSpec,
    /// Fallback market window and test mode.
    pub defaults: SessionDefaults,
    /// Intraday bar size.
    pub intraday_bar: BarSize,
    /// How long each yield point pumps venue traffic.
    pub pump_interval: Duration,
    /// Time given to a freshly subscribed derivative quote.
    pub derivative_quote_wait: Duration,
    /// Poll interval while waiting for the entry fill.
    pub entry_fill_poll: Duration,
    /// Bound on the entry fill wait.
    pub entry_fill_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            app_name: "level_trader".to_string(),
            routing_exchange: "SMART".to_string(),
            reference: ContractSpec::stock(Symbol::new("AAPL"), "USD", "SMART"),
            defaults: SessionDefaults::default(),
            intraday_bar: BarSize::from_seconds(60).unwrap_or(BarSize::DAILY),
            pump_interval: Duration::from_millis(100),
            derivative_quote_wait: Duration::from_millis(500),
            entry_fill_poll: Duration::from_millis(1),
            entry_fill_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Keep iterating.
    Continue,
    /// The session reached DONE.
    SessionDone,
    /// The venue does not trade today.
    MarketClosed,
}

/// Trading loop state that survives reconnects.
pub struct TradingSession<V: ?Sized, C: ?Sized, I: ?Sized> {
    venue: Arc<V>,
    calendar: Arc<C>,
    source: Arc<I>,
    settings: SessionSettings,
    composer: BracketComposer,
    account: String,
    global: SessionStateMachine,
    records: BTreeMap<Symbol, InstrumentRecord>,
    subscriptions: SubscriptionRegistry,
    ledger: ExecutionLedger,
    executions: BTreeMap<ExecutionId, ExecutionRecord>,
    rules: HashMap<i32, TickRuleTable>,
    venue_errors: BTreeMap<String, BTreeSet<i32>>,
    new_bars: BTreeSet<Symbol>,
    source_stamp: Option<Option<SystemTime>>,
    last_seen: Option<VenueTime>,
}

impl<V, C, I> TradingSession<V, C, I>
where
    V: VenuePort + ?Sized,
    C: MarketCalendarPort + ?Sized,
    I: InstructionSourcePort + ?Sized,
{
    /// Create a session in INIT with no instruments.
    #[must_use]
    pub fn new(venue: Arc<V>, calendar: Arc<C>, source: Arc<I>, settings: SessionSettings) -> Self {
        Self {
            venue,
            calendar,
            source,
            composer: BracketComposer::new(settings.app_name.clone()),
            settings,
            account: String::new(),
            global: SessionStateMachine::new(),
            records: BTreeMap::new(),
            subscriptions: SubscriptionRegistry::new(),
            ledger: ExecutionLedger::new(),
            executions: BTreeMap::new(),
            rules: HashMap::new(),
            venue_errors: BTreeMap::new(),
            new_bars: BTreeSet::new(),
            source_stamp: None,
            last_seen: None,
        }
    }

    /// Account orders are placed for.
    pub fn set_account(&mut self, account: impl Into<String>) {
        self.account = account.into();
    }

    /// Account orders are placed for.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Session settings.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Global session state.
    #[must_use]
    pub const fn global_state(&self) -> GlobalState {
        self.global.state()
    }

    /// Today's market window, once the session started.
    #[must_use]
    pub const fn window(&self) -> Option<&MarketWindow> {
        self.global.window()
    }

    /// Record of `symbol`.
    #[must_use]
    pub fn record(&self, symbol: &Symbol) -> Option<&InstrumentRecord> {
        self.records.get(symbol)
    }

    /// All instrument records.
    pub fn records(&self) -> impl Iterator<Item = &InstrumentRecord> {
        self.records.values()
    }

    /// Open market-data subscriptions.
    #[must_use]
    pub const fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// Executions observed so far, keyed by execution id.
    #[must_use]
    pub const fn executions(&self) -> &BTreeMap<ExecutionId, ExecutionRecord> {
        &self.executions
    }

    /// Venue error codes reported per local symbol.
    #[must_use]
    pub const fn venue_errors(&self) -> &BTreeMap<String, BTreeSet<i32>> {
        &self.venue_errors
    }

    /// Run one iteration.
    ///
    /// # Errors
    ///
    /// Returns `Interrupted` when `shutdown` fires at a yield point, and any
    /// venue, calendar, instruction source or state machine failure.
    pub async fn iterate(
        &mut self,
        shutdown: &CancellationToken,
    ) -> Result<IterationOutcome, TraderError> {
        self.yield_point(shutdown).await?;
        let now = self.venue.current_time().await?;

        if self.global.state() == GlobalState::Init && !self.start_session(now).await? {
            return Ok(IterationOutcome::MarketClosed);
        }

        self.reload_instructions().await?;
        self.resubscribe().await?;
        self.process_events();
        self.sample_prices();
        self.yield_point(shutdown).await?;

        self.process_bars();
        self.yield_point(shutdown).await?;

        if self.global.state() == GlobalState::Active {
            self.evaluate_entries(now).await?;
        }
        self.yield_point(shutdown).await?;

        if self.global.state() == GlobalState::Active {
            self.check_exits(now)?;
        }
        self.yield_point(shutdown).await?;

        if let Some(change) = self.global.advance(now) {
            log_transition(&change);
            if self.global.is_done() {
                tracing::warn!("Session closed");
                return Ok(IterationOutcome::SessionDone);
            }
        }

        self.heartbeat(now);
        Ok(IterationOutcome::Continue)
    }

    /// Cancel every market-data subscription and forget the handles.
    ///
    /// Returns the number of cancellations that failed.
    pub async fn release_subscriptions(&mut self) -> usize {
        self.subscriptions.cancel_all(&*self.venue).await
    }

    /// Open subscriptions for every instrument that has none.
    ///
    /// # Errors
    ///
    /// Returns the first venue error.
    pub async fn resubscribe(&mut self) -> Result<usize, TraderError> {
        let mut opened = 0;
        for (symbol, record) in &self.records {
            if self
                .subscriptions
                .subscribe(
                    &*self.venue,
                    symbol,
                    record.underlying(),
                    self.settings.intraday_bar,
                )
                .await?
            {
                opened += 1;
            }
        }
        if opened > 0 {
            tracing::info!(opened, "Subscriptions re-established");
        }
        Ok(opened)
    }

    async fn yield_point(&self, shutdown: &CancellationToken) -> Result<(), TraderError> {
        if shutdown.is_cancelled() {
            return Err(TraderError::Interrupted);
        }
        self.venue.pump(self.settings.pump_interval).await?;
        Ok(())
    }

    /// Compute today's window. Returns `false` if the market is closed today.
    async fn start_session(&mut self, now: VenueTime) -> Result<bool, TraderError> {
        tracing::info!(now = %now, "Starting session");

        let reference = self.venue.resolve_contract(&self.settings.reference).await?;
        let day = self
            .calendar
            .trading_day(&reference, now.date_naive())
            .await?;

        if !day.is_open && !self.settings.defaults.test_right_now {
            tracing::info!(date = %now.date_naive(), "Market closed today, nothing to do");
            return Ok(false);
        }

        let window = MarketWindow::resolve(&day, now, &self.settings.defaults);
        tracing::info!(open = %window.open, close = %window.close, "Market window");

        let change = self.global.initialize(window, now)?;
        log_transition(&change);
        Ok(true)
    }

    async fn reload_instructions(&mut self) -> Result<(), TraderError> {
        let stamp = self.source.modified().await?;
        if self.source_stamp == Some(stamp) {
            return Ok(());
        }
        // A source that fails to load is not retried until it changes again.
        self.source_stamp = Some(stamp);

        let table = match self.source.load().await {
            Ok(table) => table,
            Err(e) => {
                tracing::error!(error = %e, "Reading instructions did not succeed");
                return Err(e.into());
            }
        };

        for rejected in table.rejected() {
            tracing::warn!(
                row = rejected.index,
                symbol = %rejected.symbol,
                reason = %rejected.reason,
                "Instruction row dropped"
            );
        }
        tracing::warn!(count = table.len(), "Instructions read");
        for instruction in table.iter() {
            tracing::info!(instruction = ?instruction, "Instruction");
        }

        for (symbol, record) in &mut self.records {
            match table.get(symbol) {
                Some(instruction) => match record.replace_instruction(instruction.clone()) {
                    InstructionUpdate::Applied => {
                        tracing::info!(symbol = %symbol, "Instruction updated");
                    }
                    InstructionUpdate::Deferred => {
                        tracing::warn!(symbol = %symbol, "Instruction update deferred until flat");
                    }
                    InstructionUpdate::Unchanged => {}
                },
                None if !record.is_retired() => {
                    record.retire();
                    tracing::warn!(symbol = %symbol, state = %record.state(), "Symbol removed from instructions, retired");
                }
                None => {}
            }
        }

        let fresh: Vec<Instruction> = table
            .iter()
            .filter(|instruction| !self.records.contains_key(&instruction.symbol))
            .cloned()
            .collect();
        for instruction in fresh {
            self.onboard(instruction).await?;
        }

        Ok(())
    }

    /// Resolve, cache rules and subscribe a new symbol.
    ///
    /// A symbol that cannot be set up is skipped until the next reload.
    async fn onboard(&mut self, instruction: Instruction) -> Result<(), TraderError> {
        let symbol = instruction.symbol.clone();
        let spec = ContractSpec::stock(
            symbol.clone(),
            instruction.currency.clone(),
            self.settings.routing_exchange.clone(),
        );

        let underlying = match self.venue.resolve_contract(&spec).await {
            Ok(contract) => contract,
            Err(e) if e.is_unresolvable() => {
                tracing::error!(symbol = %symbol, error = %e, "Unable to unambiguously qualify symbol");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for rule_id in underlying.rule_ids() {
            self.rules_for(rule_id).await?;
        }

        match self
            .subscriptions
            .subscribe(
                &*self.venue,
                &symbol,
                &underlying,
                self.settings.intraday_bar,
            )
            .await
        {
            Ok(_) => {}
            Err(e @ (VenueError::NotConnected | VenueError::ConnectionLost { .. })) => {
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Unable to get all required information, check subscriptions");
                return Ok(());
            }
        }

        let mut record = InstrumentRecord::new(instruction, underlying);
        record.observe_price(self.venue.quote(record.underlying()).and_then(|q| q.last));
        tracing::info!(symbol = %symbol, contract = %record.underlying(), "Instrument onboarded");
        self.records.insert(symbol, record);
        Ok(())
    }

    fn process_events(&mut self) {
        for event in self.venue.drain_events() {
            match event {
                VenueEvent::Fill(fill) => {
                    let id = fill.execution_id.clone();
                    if self.ledger.observe(&id) {
                        tracing::info!(
                            execution = %id,
                            order_ref = %fill.order_ref,
                            contract = %fill.local_symbol,
                            side = %fill.side,
                            quantity = %fill.quantity,
                            price = %fill.price,
                            "New fill"
                        );
                        self.executions.insert(id, ExecutionRecord::from_fill(fill));
                    } else {
                        match self.executions.get_mut(&id) {
                            Some(record) if record.fill.is_none() => {
                                tracing::info!(
                                    execution = %id,
                                    order_ref = %fill.order_ref,
                                    quantity = %fill.quantity,
                                    price = %fill.price,
                                    "New fill"
                                );
                                record.fill = Some(fill);
                            }
                            _ => tracing::debug!(execution = %id, "Fill already seen"),
                        }
                    }
                }
                VenueEvent::Commission(report) => {
                    let id = report.execution_id.clone();
                    if self.ledger.observe(&id) {
                        tracing::info!(
                            execution = %id,
                            commission = %report.commission,
                            currency = %report.currency,
                            "New commission"
                        );
                        self.executions
                            .insert(id, ExecutionRecord::from_commission(report));
                    } else {
                        match self.executions.get_mut(&id) {
                            Some(record) if record.commission.is_none() => {
                                tracing::info!(
                                    execution = %id,
                                    commission = %report.commission,
                                    currency = %report.currency,
                                    "New commission"
                                );
                                record.commission = Some(report);
                            }
                            _ => tracing::debug!(execution = %id, "Commission already seen"),
                        }
                    }
                }
                VenueEvent::BarUpdate {
                    series,
                    has_new_bar,
                } => {
                    if !has_new_bar {
                        continue;
                    }
                    if let Some(symbol) = self.subscriptions.symbol_for_intraday(series) {
                        self.new_bars.insert(symbol.clone());
                    }
                }
                VenueEvent::Timeout { idle } => {
                    tracing::error!(idle_secs = idle.as_secs(), "TIMEOUT, venue connection probably lost");
                }
                VenueEvent::Error {
                    code,
                    symbol,
                    message,
                } => {
                    tracing::info!(code, symbol = ?symbol, message = %message, "Venue error");
                    if let Some(symbol) = symbol {
                        self.venue_errors.entry(symbol).or_default().insert(code);
                    }
                }
            }
        }
    }

    fn sample_prices(&mut self) {
        for record in self.records.values_mut() {
            let last = self.venue.quote(record.underlying()).and_then(|q| q.last);
            record.observe_price(last);
        }
    }

    /// Log the last complete intraday bar of today for each updated series.
    fn process_bars(&mut self) {
        let Some(session_date) = self.global.window().map(|w| w.open.date_naive()) else {
            return;
        };

        for symbol in std::mem::take(&mut self.new_bars) {
            let Some(sub) = self.subscriptions.get(&symbol) else {
                continue;
            };
            let mut bars = self.venue.bars(sub.intraday);
            // The last bar is still forming.
            bars.pop();
            if let Some(bar) = bars
                .iter()
                .rev()
                .find(|bar| bar.time.date_naive() == session_date)
            {
                tracing::info!(
                    symbol = %symbol,
                    time = %bar.time,
                    open = %bar.open,
                    high = %bar.high,
                    low = %bar.low,
                    close = %bar.close,
                    volume = %bar.volume,
                    "New complete bar"
                );
            }
        }
    }

    async fn evaluate_entries(&mut self, now: VenueTime) -> Result<(), TraderError> {
        let Some(close) = self.global.close() else {
            return Ok(());
        };
        let global = self.global.state();

        let signals: Vec<(Symbol, EntrySide)> = self
            .records
            .iter()
            .filter(|(_, record)| record.accepts_entries(global, now, close))
            .filter_map(|(symbol, record)| record.signal().map(|side| (symbol.clone(), side)))
            .collect();

        for (symbol, side) in signals {
            self.enter(&symbol, side, now, close).await?;
        }
        Ok(())
    }

    async fn enter(
        &mut self,
        symbol: &Symbol,
        side: EntrySide,
        now: VenueTime,
        close: VenueTime,
    ) -> Result<(), TraderError> {
        let Some(record) = self.records.get(symbol) else {
            return Ok(());
        };
        let instruction = record.instruction().clone();
        let underlying = record.underlying().clone();
        tracing::warn!(symbol = %symbol, level = %side, at = %log_stamp(&now), "Entry level crossed");

        let contract = match instruction.mode {
            TradingMode::Stocks => underlying,
            TradingMode::Options => {
                let Some(contract) = self.resolve_derivative(&instruction, side, now).await? else {
                    return Ok(());
                };
                contract
            }
        };

        let rules = self.rules_for_contract(&contract).await?;

        // The derivative subscription is released on every path below.
        let result = match self.derivative_quote(&contract).await {
            Ok(quote) => {
                self.compose_and_place(&instruction, side, &contract, &quote, &rules, now, close)
                    .await
            }
            Err(e) => Err(e),
        };

        if contract.is_option()
            && let Err(e) = self.venue.cancel_quotes(&contract).await
        {
            tracing::debug!(contract = %contract, error = %e, "Derivative quote cancellation failed");
        }
        result
    }

    async fn resolve_derivative(
        &mut self,
        instruction: &Instruction,
        side: EntrySide,
        now: VenueTime,
    ) -> Result<Option<Contract>, TraderError> {
        let right = match side {
            EntrySide::Rising => OptionRight::Call,
            EntrySide::Falling => OptionRight::Put,
        };
        let spec = instruction.level(side).and_then(|level| {
            Some(ContractSpec::Option {
                symbol: instruction.symbol.clone(),
                currency: instruction.currency.clone(),
                exchange: self.settings.routing_exchange.clone(),
                right,
                strike: level.strike?,
                expiration: level.expiration?,
            })
        });
        let Some(spec) = spec else {
            self.no_valid_derivative(&instruction.symbol, format!("{} {side}", instruction.symbol), now)?;
            return Ok(None);
        };

        match self.venue.resolve_contract(&spec).await {
            Ok(contract) => Ok(Some(contract)),
            Err(e) if e.is_unresolvable() => {
                tracing::warn!(symbol = %instruction.symbol, error = %e, "Derivative resolution failed");
                self.no_valid_derivative(&instruction.symbol, spec.to_string(), now)?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn no_valid_derivative(
        &mut self,
        symbol: &Symbol,
        descriptor: String,
        now: VenueTime,
    ) -> Result<(), TraderError> {
        let reason = EntrySkipped::NoValidDerivative { descriptor };
        tracing::warn!(symbol = %symbol, reason = %reason, "No entry");
        if let Some(record) = self.records.get_mut(symbol) {
            let change = record.mark_no_valid_derivative(now)?;
            log_transition(&change);
        }
        Ok(())
    }

    async fn rules_for_contract(&mut self, contract: &Contract) -> Result<TickRuleTable, TraderError> {
        let rule_id = contract
            .rule_id_for(&self.settings.routing_exchange)
            .ok_or_else(|| TickRuleError::InvalidRuleTable {
                reason: format!("no market rule for {}", contract.local_symbol),
            })?;
        self.rules_for(rule_id).await
    }

    async fn rules_for(&mut self, rule_id: i32) -> Result<TickRuleTable, TraderError> {
        if let Some(rules) = self.rules.get(&rule_id) {
            return Ok(rules.clone());
        }
        let rules = self.venue.tick_rules(rule_id).await?;
        tracing::debug!(rule_id, rules = ?rules.rules(), "Market rule cached");
        self.rules.insert(rule_id, rules.clone());
        Ok(rules)
    }

    /// Quote of the traded contract. Derivatives are subscribed on demand.
    async fn derivative_quote(&self, contract: &Contract) -> Result<Quote, TraderError> {
        if contract.is_option() {
            self.venue.subscribe_quotes(contract).await?;
            self.venue.pump(self.settings.derivative_quote_wait).await?;
        }
        let quote = self.venue.quote(contract).unwrap_or_default();
        tracing::debug!(
            contract = %contract,
            bid = ?quote.bid,
            ask = ?quote.ask,
            last = ?quote.last,
            spread = ?quote.spread(),
            "Traded contract quote"
        );
        Ok(quote)
    }

    #[allow(clippy::too_many_arguments)]
    async fn compose_and_place(
        &mut self,
        instruction: &Instruction,
        side: EntrySide,
        contract: &Contract,
        quote: &Quote,
        rules: &TickRuleTable,
        now: VenueTime,
        close: VenueTime,
    ) -> Result<(), TraderError> {
        let symbol = &instruction.symbol;
        let composition = self.composer.compose(&ComposeRequest {
            instruction,
            side,
            contract,
            quote,
            rules,
            close_deadline: close,
            now,
            account: &self.account,
        })?;

        let bracket = match composition {
            Composition::Skipped(reason) => {
                tracing::warn!(symbol = %symbol, contract = %contract.local_symbol, reason = %reason, "No entry");
                return Ok(());
            }
            Composition::Bracket(bracket) => *bracket,
        };

        tracing::warn!(
            symbol = %symbol,
            contract = %contract.local_symbol,
            direction = ?bracket.direction,
            size = %bracket.size,
            reference = %bracket.reference_price,
            stop = %bracket.stop_exit.kind,
            target = %bracket.target_exit.kind,
            exit_time = %log_stamp(&bracket.exit_time),
            at = %log_stamp(&now),
            "Entry trade"
        );

        let placed = self.place_bracket(symbol, contract, bracket).await?;
        if let Some(record) = self.records.get_mut(symbol) {
            let change = record.activate(placed, now)?;
            log_transition(&change);
        }
        Ok(())
    }

    /// Entry first, exits once the entry is completely filled.
    async fn place_bracket(
        &self,
        symbol: &Symbol,
        contract: &Contract,
        bracket: BracketOrder,
    ) -> Result<PlacedBracket, TraderError> {
        let entry = self.venue.place_order(contract, &bracket.entry).await?;
        self.await_entry_fill(symbol, &entry, bracket.size).await?;

        let stop_exit = self.venue.place_order(contract, &bracket.stop_exit).await?;
        let target_exit = self
            .venue
            .place_order(contract, &bracket.target_exit)
            .await?;
        let time_exit = self.venue.place_order(contract, &bracket.time_exit).await?;
        tracing::info!(
            symbol = %symbol,
            group = %bracket.group.name,
            stop = %stop_exit,
            target = %target_exit,
            time = %time_exit,
            "Exit orders placed"
        );

        Ok(PlacedBracket {
            order: bracket,
            contract: contract.clone(),
            entry,
            stop_exit,
            target_exit,
            time_exit,
        })
    }

    /// Bounded poll on the entry's filled quantity.
    async fn await_entry_fill(
        &self,
        symbol: &Symbol,
        entry: &OrderHandle,
        size: Decimal,
    ) -> Result<(), TraderError> {
        let poll = self.settings.entry_fill_poll.max(Duration::from_millis(1));
        let polls = (self.settings.entry_fill_timeout.as_millis() / poll.as_millis()).max(1);

        let mut filled = Decimal::ZERO;
        for _ in 0..polls {
            filled = self
                .venue
                .order_status(entry)
                .map_or(Decimal::ZERO, |status| status.filled);
            if filled >= size {
                return Ok(());
            }
            if !self.venue.is_connected() {
                return Err(VenueError::ConnectionLost {
                    message: format!("while waiting for {} to fill", entry.order_ref),
                }
                .into());
            }
            self.venue.pump(poll).await?;
        }

        tracing::error!(symbol = %symbol, order = %entry, filled = %filled, size = %size, "Entry did not fill in time");
        if let Err(e) = self.venue.cancel_order(entry).await {
            tracing::warn!(order = %entry, error = %e, "Entry cancellation failed");
        }
        Err(TraderError::EntryFillTimeout {
            symbol: symbol.to_string(),
            order_ref: entry.order_ref.clone(),
            filled,
            size,
        })
    }

    fn check_exits(&mut self, now: VenueTime) -> Result<(), TraderError> {
        for (symbol, record) in &mut self.records {
            if record.state() != TradingState::Active {
                continue;
            }
            let Some(bracket) = record.bracket() else {
                tracing::error!(symbol = %symbol, "Marked ACTIVE but no bracket found");
                continue;
            };
            let filled = |handle: &OrderHandle| {
                self.venue
                    .order_status(handle)
                    .map_or(Decimal::ZERO, |status| status.filled)
            };
            let stop_filled = filled(&bracket.stop_exit);
            let time_filled = filled(&bracket.time_exit);

            if let Some(change) = record.on_exit_progress(stop_filled, time_filled, now)? {
                if stop_filled > Decimal::ZERO {
                    tracing::warn!(symbol = %symbol, filled = %stop_filled, "Stop hit");
                } else {
                    tracing::warn!(symbol = %symbol, filled = %time_filled, "Time exit filled");
                }
                log_transition(&change);
            }
        }
        Ok(())
    }

    fn heartbeat(&mut self, now: VenueTime) {
        if self.last_seen.is_some_and(|last| last.hour() != now.hour()) {
            tracing::info!(at = %now.time().with_nanosecond(0).unwrap_or(NaiveTime::MIN), "Hour boundary, heartbeat to show the session is alive");
        }
        self.last_seen = Some(now);
    }
}

/// State transitions are logged at WARN.
fn log_transition(change: &StateChange) {
    tracing::warn!(
        entity = %change.entity,
        from = %change.from,
        to = %change.to,
        at = %log_stamp(&change.at),
        "State transition"
    );
}
