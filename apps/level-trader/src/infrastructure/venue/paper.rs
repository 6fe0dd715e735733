//! Paper Venue
//!
//! In-memory venue on a simulated clock. Every `pump` advances the clock by the
//! pumped duration, applies due replay steps, activates good-after orders,
//! matches working orders against the current quotes and rolls intraday bars.
//!
//! Matching rules:
//!
//! - Market orders fill at the ask (buy) or bid (sell), falling back to last
//! - Stop orders fill at last once last trades through the trigger
//! - Limit orders fill at the limit once last reaches it
//!
//! A fill in a one-cancels-all group reduces the remaining quantity of its
//! working siblings (reduce kinds) or cancels them (cancel kind). Orders stay
//! at the venue across disconnects; subscriptions do not.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::FixedOffset;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use super::market::{PaperListing, PaperMarket, PaperMarketError, ReplayStep};
use crate::application::ports::{
    BarSeriesId, OrderState, OrderStatus, VenueError, VenueEvent, VenuePort,
};
use crate::domain::bracket::{OcaKind, OrderHandle, OrderKind, OrderSide, OrderSpec};
use crate::domain::ledger::{CommissionReport, ExecutionId, FillReport};
use crate::domain::market::{
    Bar, BarRequest, BarSize, Contract, ContractSpec, Quote, TradingHours,
};
use crate::domain::pricing::TickRuleTable;
use crate::domain::shared::VenueTime;

/// Paper venue settings.
#[derive(Debug, Clone)]
pub struct PaperVenueConfig {
    /// Simulated clock at creation.
    pub start: VenueTime,
    /// Exchange every listing is routed through.
    pub exchange: String,
    /// Managed accounts.
    pub accounts: Vec<String>,
    /// Commission charged per filled unit.
    pub commission_per_unit: Decimal,
    /// Deliver every fill and commission notification twice.
    pub duplicate_notifications: bool,
    /// Sleep for the pumped duration, so the simulated clock follows wall time.
    pub realtime: bool,
}

impl PaperVenueConfig {
    /// Defaults with the clock starting at `start`.
    #[must_use]
    pub fn starting_at(start: VenueTime) -> Self {
        Self {
            start,
            exchange: "SMART".to_string(),
            accounts: vec!["DU0000001".to_string()],
            commission_per_unit: Decimal::new(65, 2),
            duplicate_notifications: false,
            realtime: false,
        }
    }
}

/// Venue operations that accept injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperOperation {
    /// `connect`.
    Connect,
    /// `managed_accounts`.
    ManagedAccounts,
    /// `resolve_contract`.
    ResolveContract,
    /// `trading_hours`.
    TradingHours,
    /// `tick_rules`.
    TickRules,
    /// `subscribe_quotes`.
    SubscribeQuotes,
    /// `cancel_quotes`.
    CancelQuotes,
    /// `request_bars`.
    RequestBars,
    /// `cancel_bars`.
    CancelBars,
    /// `place_order`.
    PlaceOrder,
    /// `cancel_order`.
    CancelOrder,
    /// `pump`.
    Pump,
}

/// An order as the paper venue sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperOrder {
    /// Handle returned at placement.
    pub handle: OrderHandle,
    /// Submitted order.
    pub spec: OrderSpec,
    /// Contract the order trades.
    pub contract: Contract,
    /// Venue view of the order.
    pub status: OrderStatus,
}

#[derive(Debug)]
struct WorkingOrder {
    handle: OrderHandle,
    spec: OrderSpec,
    contract: Contract,
    state: OrderState,
    quantity: Decimal,
    filled: Decimal,
    notional: Decimal,
}

impl WorkingOrder {
    fn remaining(&self) -> Decimal {
        (self.quantity - self.filled).max(Decimal::ZERO)
    }

    fn status(&self) -> OrderStatus {
        OrderStatus {
            state: self.state,
            filled: self.filled,
            remaining: self.remaining(),
            avg_fill_price: (self.filled > Decimal::ZERO).then(|| self.notional / self.filled),
        }
    }
}

#[derive(Debug)]
struct Series {
    con_id: i64,
    request: BarRequest,
    bars: Vec<Bar>,
}

#[derive(Debug)]
struct PaperState {
    config: PaperVenueConfig,
    connected: bool,
    connects: u32,
    clock: VenueTime,
    listings: Vec<(ContractSpec, Contract)>,
    rules: HashMap<i32, TickRuleTable>,
    hours: TradingHours,
    quotes: HashMap<i64, Quote>,
    fill_sizes: HashMap<i64, Decimal>,
    quote_subscriptions: HashSet<i64>,
    series: BTreeMap<i64, Series>,
    history: HashMap<(i64, BarSize), Vec<Bar>>,
    orders: BTreeMap<i64, WorkingOrder>,
    events: Vec<VenueEvent>,
    failures: HashMap<PaperOperation, VecDeque<Option<VenueError>>>,
    steps: VecDeque<(VenueTime, ReplayStep)>,
    next_id: i64,
    next_execution: u64,
}

/// In-memory venue adapter.
#[derive(Debug)]
pub struct PaperVenue {
    state: Mutex<PaperState>,
}

impl PaperVenue {
    /// Create an empty venue.
    ///
    /// Trading hours default to 09:30-16:00 on the start date.
    #[must_use]
    pub fn new(config: PaperVenueConfig) -> Self {
        let hours = TradingHours {
            liquid_hours: format!(
                "{date}:0930-{date}:1600",
                date = config.start.format("%Y%m%d")
            ),
            offset: *config.start.offset(),
        };
        Self {
            state: Mutex::new(PaperState {
                clock: config.start,
                config,
                connected: false,
                connects: 0,
                listings: Vec::new(),
                rules: HashMap::new(),
                hours,
                quotes: HashMap::new(),
                fill_sizes: HashMap::new(),
                quote_subscriptions: HashSet::new(),
                series: BTreeMap::new(),
                history: HashMap::new(),
                orders: BTreeMap::new(),
                events: Vec::new(),
                failures: HashMap::new(),
                steps: VecDeque::new(),
                next_id: 1,
                next_execution: 1,
            }),
        }
    }

    /// Create a venue serving `market`.
    #[must_use]
    pub fn with_market(config: PaperVenueConfig, market: &PaperMarket) -> Self {
        let venue = Self::new(config);
        for listing in &market.listings {
            if let Err(e) = venue.list(listing) {
                tracing::warn!(con_id = listing.con_id, error = %e, "Skipping paper listing");
            }
        }
        if let Ok(tables) = market.rule_tables() {
            for (id, rules) in tables {
                venue.set_rules(id, rules);
            }
        }
        if let Some(hours) = &market.liquid_hours {
            venue.set_liquid_hours(hours);
        }
        venue.script(market.steps.iter().cloned());
        venue
    }

    /// Make a contract resolvable.
    ///
    /// # Errors
    ///
    /// Returns `Multiplier` if the listing carries a non-positive multiplier.
    pub fn list(&self, listing: &PaperListing) -> Result<(), PaperMarketError> {
        let mut state = self.state.lock();
        let listed = listing.resolve(&state.config.exchange)?;
        state.listings.push(listed);
        Ok(())
    }

    /// Serve a tick rule table.
    pub fn set_rules(&self, rule_id: i32, rules: TickRuleTable) {
        self.state.lock().rules.insert(rule_id, rules);
    }

    /// Replace the liquid hours of every contract.
    pub fn set_liquid_hours(&self, liquid_hours: &str) {
        self.state.lock().hours.liquid_hours = liquid_hours.to_string();
    }

    /// Replace the quote of a listed contract.
    ///
    /// Returns false if no listing has `local_symbol`.
    pub fn set_quote(&self, local_symbol: &str, quote: Quote) -> bool {
        let mut state = self.state.lock();
        let Some(con_id) = state.con_id_of(local_symbol) else {
            return false;
        };
        state.quotes.insert(con_id, quote);
        true
    }

    /// Limit how many units of `local_symbol` one match fills; `None` lifts the limit.
    ///
    /// Returns false if no listing has `local_symbol`.
    pub fn cap_fills(&self, local_symbol: &str, size: Option<Decimal>) -> bool {
        let mut state = self.state.lock();
        let Some(con_id) = state.con_id_of(local_symbol) else {
            return false;
        };
        state.set_fill_size(con_id, size);
        true
    }

    /// Seed the bars served when a series of `size` is requested for `local_symbol`.
    pub fn seed_bars(&self, local_symbol: &str, size: BarSize, bars: Vec<Bar>) -> bool {
        let mut state = self.state.lock();
        let Some(con_id) = state.con_id_of(local_symbol) else {
            return false;
        };
        state.history.insert((con_id, size), bars);
        true
    }

    /// Queue quote changes relative to the clock at creation.
    pub fn script(&self, steps: impl IntoIterator<Item = ReplayStep>) {
        let mut state = self.state.lock();
        let start = state.config.start;
        let mut timed: Vec<(VenueTime, ReplayStep)> = state.steps.drain(..).collect();
        timed.extend(steps.into_iter().map(|step| {
            let offset =
                chrono::Duration::from_std(Duration::from_secs(step.after_secs)).unwrap_or_default();
            (start + offset, step)
        }));
        timed.sort_by_key(|(at, _)| *at);
        state.steps = timed.into();
    }

    /// Fail the next call of `operation` with `error`.
    ///
    /// Queued after [`Self::pass_next`], the failure waits for the passed calls.
    pub fn fail_next(&self, operation: PaperOperation, error: VenueError) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(Some(error));
    }

    /// Let the next `calls` calls of `operation` through before any queued failure.
    pub fn pass_next(&self, operation: PaperOperation, calls: usize) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .extend(std::iter::repeat_with(|| None).take(calls));
    }

    /// Drop the connection as if the network failed.
    pub fn drop_connection(&self) {
        self.state.lock().disconnect();
    }

    /// Deliver a notification on the next drain.
    pub fn push_event(&self, event: VenueEvent) {
        self.state.lock().events.push(event);
    }

    /// Move the clock forward and process everything that became due.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock();
        let clock = state.clock + chrono::Duration::from_std(by).unwrap_or_default();
        state.run_until(clock);
    }

    /// Move the clock to `at` (never backwards) and process everything that became due.
    pub fn set_clock(&self, at: VenueTime) {
        let mut state = self.state.lock();
        let clock = at.max(state.clock);
        state.run_until(clock);
    }

    /// Simulated clock.
    #[must_use]
    pub fn clock(&self) -> VenueTime {
        self.state.lock().clock
    }

    /// Successful connections so far.
    #[must_use]
    pub fn connects(&self) -> u32 {
        self.state.lock().connects
    }

    /// Open quote subscriptions.
    #[must_use]
    pub fn quote_subscriptions(&self) -> usize {
        self.state.lock().quote_subscriptions.len()
    }

    /// Open bar series.
    #[must_use]
    pub fn bar_series(&self) -> usize {
        self.state.lock().series.len()
    }

    /// Every order placed so far, in placement order.
    #[must_use]
    pub fn orders(&self) -> Vec<PaperOrder> {
        self.state
            .lock()
            .orders
            .values()
            .map(|order| PaperOrder {
                handle: order.handle.clone(),
                spec: order.spec.clone(),
                contract: order.contract.clone(),
                status: order.status(),
            })
            .collect()
    }

    /// Offset of the simulated clock.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        *self.state.lock().clock.offset()
    }
}

impl PaperState {
    fn check(&mut self, operation: PaperOperation) -> Result<(), VenueError> {
        if let Some(Some(error)) = self
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        if operation != PaperOperation::Connect && !self.connected {
            return Err(VenueError::NotConnected);
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.quote_subscriptions.clear();
        self.series.clear();
    }

    fn con_id_of(&self, local_symbol: &str) -> Option<i64> {
        self.listings
            .iter()
            .find(|(_, contract)| contract.local_symbol == local_symbol)
            .map(|(_, contract)| contract.con_id)
    }

    fn set_fill_size(&mut self, con_id: i64, size: Option<Decimal>) {
        match size.filter(|size| *size > Decimal::ZERO) {
            Some(size) => self.fill_sizes.insert(con_id, size),
            None => self.fill_sizes.remove(&con_id),
        };
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn run_until(&mut self, clock: VenueTime) {
        self.clock = clock;

        while self.steps.front().is_some_and(|(at, _)| *at <= clock) {
            if let Some((_, step)) = self.steps.pop_front() {
                self.apply_step(&step);
            }
        }

        let ids: Vec<i64> = self.orders.keys().copied().collect();
        for id in ids {
            self.match_order(id);
        }

        self.roll_bars();
    }

    fn apply_step(&mut self, step: &ReplayStep) {
        let Some(con_id) = self.con_id_of(&step.local_symbol) else {
            tracing::debug!(symbol = %step.local_symbol, "Replay step for unknown contract");
            return;
        };
        let quote = self.quotes.entry(con_id).or_default();
        quote.bid = step.bid.or(quote.bid);
        quote.ask = step.ask.or(quote.ask);
        quote.last = step.last.or(quote.last);
        if step.fill_size.is_some() {
            self.set_fill_size(con_id, step.fill_size);
        }
    }

    fn match_order(&mut self, id: i64) {
        let clock = self.clock;
        let Some(order) = self.orders.get_mut(&id) else {
            return;
        };
        if order.state == OrderState::PreSubmitted
            && order.spec.good_after.is_none_or(|at| at <= clock)
        {
            order.state = OrderState::Submitted;
        }
        if order.state != OrderState::Submitted {
            return;
        }

        let quote = self
            .quotes
            .get(&order.contract.con_id)
            .copied()
            .unwrap_or_default();
        let buy = order.spec.side == OrderSide::Buy;
        let price = match order.spec.kind {
            OrderKind::Market if buy => quote.ask.or(quote.last),
            OrderKind::Market => quote.bid.or(quote.last),
            OrderKind::Stop { trigger } => quote
                .last
                .filter(|last| if buy { *last >= trigger } else { *last <= trigger }),
            OrderKind::Limit { limit } => quote
                .last
                .filter(|last| if buy { *last <= limit } else { *last >= limit })
                .map(|_| limit),
        };

        if let Some(price) = price.filter(|p| *p > Decimal::ZERO) {
            self.fill(id, price);
        }
    }

    fn fill(&mut self, id: i64, price: Decimal) {
        let clock = self.clock;
        let Some(order) = self.orders.get_mut(&id) else {
            return;
        };
        let remaining = order.remaining();
        let quantity = self
            .fill_sizes
            .get(&order.contract.con_id)
            .map_or(remaining, |size| remaining.min(*size));
        if quantity <= Decimal::ZERO {
            return;
        }
        order.filled += quantity;
        order.notional += quantity * price;
        if order.remaining() <= Decimal::ZERO {
            order.state = OrderState::Filled;
        }

        let execution_id = ExecutionId::new(format!("0000e{:07x}.01.01", self.next_execution));
        self.next_execution += 1;
        let fill = FillReport {
            execution_id: execution_id.clone(),
            order_ref: order.spec.order_ref.clone(),
            local_symbol: order.contract.local_symbol.clone(),
            side: order.spec.side,
            quantity,
            price,
            time: clock,
        };
        let commission = CommissionReport {
            execution_id,
            commission: self.config.commission_per_unit * quantity,
            currency: order.contract.currency.clone(),
        };
        let group = order.spec.oca.clone();

        self.events.push(VenueEvent::Fill(fill.clone()));
        self.events.push(VenueEvent::Commission(commission.clone()));
        if self.config.duplicate_notifications {
            self.events.push(VenueEvent::Commission(commission));
            self.events.push(VenueEvent::Fill(fill));
        }

        let Some(group) = group else {
            return;
        };
        for (_, sibling) in self.orders.iter_mut().filter(|(other, sibling)| {
            **other != id
                && !sibling.state.is_done()
                && sibling.spec.oca.as_ref().is_some_and(|g| g.name == group.name)
        }) {
            match group.kind {
                OcaKind::CancelWithBlock => sibling.state = OrderState::Cancelled,
                OcaKind::ReduceWithBlock | OcaKind::ReduceWithoutBlock => {
                    sibling.quantity = (sibling.quantity - quantity).max(sibling.filled);
                    if sibling.remaining() <= Decimal::ZERO {
                        sibling.state = OrderState::Cancelled;
                    }
                }
            }
        }
    }

    fn roll_bars(&mut self) {
        let clock = self.clock;
        for (id, series) in &mut self.series {
            if series.request.regular_hours_only {
                continue;
            }
            let Some(last) = self.quotes.get(&series.con_id).and_then(|q| q.last) else {
                continue;
            };
            let seconds = i64::from(series.request.size.seconds().max(1));
            let start = clock - chrono::Duration::seconds(clock.timestamp().rem_euclid(seconds));

            match series.bars.last_mut() {
                Some(bar) if bar.time == start => {
                    bar.high = bar.high.max(last);
                    bar.low = bar.low.min(last);
                    bar.close = last;
                }
                _ => {
                    series.bars.push(Bar {
                        time: start,
                        open: last,
                        high: last,
                        low: last,
                        close: last,
                        volume: Decimal::ZERO,
                    });
                    self.events.push(VenueEvent::BarUpdate {
                        series: BarSeriesId(*id),
                        has_new_bar: true,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl VenuePort for PaperVenue {
    async fn connect(&self) -> Result<(), VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::Connect)?;
        state.connected = true;
        state.connects += 1;
        Ok(())
    }

    async fn disconnect(&self) {
        self.state.lock().disconnect();
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn managed_accounts(&self) -> Result<Vec<String>, VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::ManagedAccounts)?;
        Ok(state.config.accounts.clone())
    }

    async fn current_time(&self) -> Result<VenueTime, VenueError> {
        let state = self.state.lock();
        if !state.connected {
            return Err(VenueError::NotConnected);
        }
        Ok(state.clock)
    }

    async fn resolve_contract(&self, spec: &ContractSpec) -> Result<Contract, VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::ResolveContract)?;

        let matches: Vec<&Contract> = state
            .listings
            .iter()
            .filter(|(listed, _)| listed == spec)
            .map(|(_, contract)| contract)
            .collect();
        match matches.as_slice() {
            [contract] => Ok((*contract).clone()),
            [] => Err(VenueError::NotFound {
                descriptor: spec.to_string(),
            }),
            _ => Err(VenueError::Ambiguous {
                descriptor: spec.to_string(),
                matches: matches.len(),
            }),
        }
    }

    async fn trading_hours(&self, _contract: &Contract) -> Result<TradingHours, VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::TradingHours)?;
        Ok(state.hours.clone())
    }

    async fn tick_rules(&self, rule_id: i32) -> Result<TickRuleTable, VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::TickRules)?;
        state
            .rules
            .get(&rule_id)
            .cloned()
            .ok_or_else(|| VenueError::NotFound {
                descriptor: format!("market rule {rule_id}"),
            })
    }

    async fn subscribe_quotes(&self, contract: &Contract) -> Result<(), VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::SubscribeQuotes)?;
        state.quote_subscriptions.insert(contract.con_id);
        Ok(())
    }

    async fn cancel_quotes(&self, contract: &Contract) -> Result<(), VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::CancelQuotes)?;
        state.quote_subscriptions.remove(&contract.con_id);
        Ok(())
    }

    fn quote(&self, contract: &Contract) -> Option<Quote> {
        let state = self.state.lock();
        if !state.connected || !state.quote_subscriptions.contains(&contract.con_id) {
            return None;
        }
        state.quotes.get(&contract.con_id).copied()
    }

    async fn request_bars(
        &self,
        contract: &Contract,
        request: BarRequest,
    ) -> Result<BarSeriesId, VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::RequestBars)?;

        let id = state.next_id();
        let bars = state
            .history
            .get(&(contract.con_id, request.size))
            .cloned()
            .unwrap_or_default();
        state.series.insert(
            id,
            Series {
                con_id: contract.con_id,
                request,
                bars,
            },
        );
        Ok(BarSeriesId(id))
    }

    async fn cancel_bars(&self, series: BarSeriesId) -> Result<(), VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::CancelBars)?;
        state
            .series
            .remove(&series.0)
            .map(|_| ())
            .ok_or_else(|| VenueError::Request {
                message: format!("unknown bar series {series}"),
            })
    }

    fn bars(&self, series: BarSeriesId) -> Vec<Bar> {
        self.state
            .lock()
            .series
            .get(&series.0)
            .map(|s| s.bars.clone())
            .unwrap_or_default()
    }

    async fn place_order(
        &self,
        contract: &Contract,
        order: &OrderSpec,
    ) -> Result<OrderHandle, VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::PlaceOrder)?;

        if !state
            .listings
            .iter()
            .any(|(_, listed)| listed.con_id == contract.con_id)
        {
            return Err(VenueError::Rejected {
                order_ref: order.order_ref.clone(),
                reason: format!("unknown contract {contract}"),
            });
        }

        let id = state.next_id();
        let handle = OrderHandle {
            order_id: id,
            order_ref: order.order_ref.clone(),
        };
        state.orders.insert(
            id,
            WorkingOrder {
                handle: handle.clone(),
                spec: order.clone(),
                contract: contract.clone(),
                state: OrderState::PreSubmitted,
                quantity: order.quantity,
                filled: Decimal::ZERO,
                notional: Decimal::ZERO,
            },
        );
        state.match_order(id);
        Ok(handle)
    }

    async fn cancel_order(&self, handle: &OrderHandle) -> Result<(), VenueError> {
        let mut state = self.state.lock();
        state.check(PaperOperation::CancelOrder)?;

        match state.orders.get_mut(&handle.order_id) {
            Some(order) if !order.state.is_done() => {
                order.state = OrderState::Cancelled;
                Ok(())
            }
            _ => Err(VenueError::Rejected {
                order_ref: handle.order_ref.clone(),
                reason: "order is not working".to_string(),
            }),
        }
    }

    fn order_status(&self, handle: &OrderHandle) -> Option<OrderStatus> {
        self.state
            .lock()
            .orders
            .get(&handle.order_id)
            .map(WorkingOrder::status)
    }

    async fn pump(&self, max_wait: Duration) -> Result<(), VenueError> {
        let realtime = {
            let mut state = self.state.lock();
            state.check(PaperOperation::Pump)?;
            state.config.realtime
        };
        if realtime {
            tokio::time::sleep(max_wait).await;
        }

        let mut state = self.state.lock();
        if !state.connected {
            return Err(VenueError::ConnectionLost {
                message: "connection dropped while pumping".to_string(),
            });
        }
        let clock = state.clock + chrono::Duration::from_std(max_wait).unwrap_or_default();
        state.run_until(clock);
        Ok(())
    }

    fn drain_events(&self) -> Vec<VenueEvent> {
        std::mem::take(&mut self.state.lock().events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bracket::{LegRole, OcaGroup};
    use crate::domain::market::OptionRight;
    use crate::domain::shared::Symbol;
    use chrono::{DateTime, NaiveDate};
    use rust_decimal_macros::dec;

    fn start() -> VenueTime {
        DateTime::parse_from_rfc3339("2024-03-15T09:30:00-04:00").unwrap()
    }

    async fn venue() -> PaperVenue {
        let venue = PaperVenue::new(PaperVenueConfig::starting_at(start()));
        venue.list(&PaperListing::stock(1, "XYZ", 26)).unwrap();
        venue.set_rules(26, TickRuleTable::uniform(dec!(0.01)));
        venue.connect().await.unwrap();
        venue
    }

    async fn xyz(venue: &PaperVenue) -> Contract {
        venue
            .resolve_contract(&ContractSpec::stock(Symbol::new("XYZ"), "USD", "SMART"))
            .await
            .unwrap()
    }

    fn order(role: LegRole, side: OrderSide, kind: OrderKind, oca: Option<&str>) -> OrderSpec {
        OrderSpec {
            role,
            side,
            kind,
            quantity: dec!(10),
            order_ref: format!("{}_t_XYZ", role.prefix()),
            account: "DU0000001".to_string(),
            bracket_ref: "oca_t_XYZ".to_string(),
            oca: oca.map(|name| OcaGroup {
                name: name.to_string(),
                kind: OcaKind::ReduceWithBlock,
            }),
            good_after: None,
        }
    }

    #[tokio::test]
    async fn resolve_not_found_and_ambiguous() {
        let venue = venue().await;
        let expiration = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let call = |con_id| PaperListing::option(con_id, "XYZ", OptionRight::Call, dec!(101), expiration, 26);
        venue.list(&call(2)).unwrap();
        venue.list(&call(3)).unwrap();

        let (spec, _) = call(0).resolve("SMART").unwrap();
        let err = venue.resolve_contract(&spec).await.unwrap_err();
        assert!(matches!(err, VenueError::Ambiguous { matches: 2, .. }));

        let (spec, _) = PaperListing::stock(0, "NOPE", 26).resolve("SMART").unwrap();
        let err = venue.resolve_contract(&spec).await.unwrap_err();
        assert!(matches!(err, VenueError::NotFound { .. }));
    }

    #[tokio::test]
    async fn quotes_visible_only_when_subscribed() {
        let venue = venue().await;
        let contract = xyz(&venue).await;
        venue.set_quote("XYZ", Quote::new(dec!(99.9), dec!(100.1), dec!(100)));

        assert!(venue.quote(&contract).is_none());
        venue.subscribe_quotes(&contract).await.unwrap();
        assert_eq!(venue.quote(&contract).unwrap().last, Some(dec!(100)));

        venue.drop_connection();
        assert!(venue.quote(&contract).is_none());
        assert_eq!(venue.quote_subscriptions(), 0);
    }

    #[tokio::test]
    async fn market_order_fills_at_placement() {
        let venue = venue().await;
        let contract = xyz(&venue).await;
        venue.set_quote("XYZ", Quote::new(dec!(99.9), dec!(100.1), dec!(100)));

        let handle = venue
            .place_order(&contract, &order(LegRole::Entry, OrderSide::Buy, OrderKind::Market, None))
            .await
            .unwrap();
        let status = venue.order_status(&handle).unwrap();
        assert_eq!(status.state, OrderState::Filled);
        assert_eq!(status.filled, dec!(10));
        assert_eq!(status.avg_fill_price, Some(dec!(100.1)));

        let events = venue.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], VenueEvent::Commission(c) if c.commission == dec!(6.50)));
    }

    #[tokio::test]
    async fn stop_fill_cancels_oca_siblings() {
        let venue = venue().await;
        let contract = xyz(&venue).await;
        venue.set_quote("XYZ", Quote::new(dec!(99.9), dec!(100.1), dec!(100)));

        let stop = venue
            .place_order(
                &contract,
                &order(LegRole::StopExit, OrderSide::Sell, OrderKind::Stop { trigger: dec!(95) }, Some("oca")),
            )
            .await
            .unwrap();
        let target = venue
            .place_order(
                &contract,
                &order(LegRole::TargetExit, OrderSide::Sell, OrderKind::Limit { limit: dec!(110) }, Some("oca")),
            )
            .await
            .unwrap();
        let mut timed = order(LegRole::TimeExit, OrderSide::Sell, OrderKind::Market, Some("oca"));
        timed.good_after = Some(start() + chrono::Duration::hours(6));
        let time = venue.place_order(&contract, &timed).await.unwrap();

        assert_eq!(venue.order_status(&time).unwrap().state, OrderState::PreSubmitted);
        assert_eq!(venue.order_status(&stop).unwrap().state, OrderState::Submitted);

        venue.set_quote("XYZ", Quote::new(dec!(94.8), dec!(95.0), dec!(94.9)));
        venue.pump(Duration::from_millis(100)).await.unwrap();

        assert_eq!(venue.order_status(&stop).unwrap().filled, dec!(10));
        assert_eq!(venue.order_status(&target).unwrap().state, OrderState::Cancelled);
        assert_eq!(venue.order_status(&time).unwrap().state, OrderState::Cancelled);
        assert_eq!(venue.order_status(&time).unwrap().remaining, dec!(0));
    }

    #[tokio::test]
    async fn partial_stop_fill_reduces_oca_siblings() {
        let venue = venue().await;
        let contract = xyz(&venue).await;
        venue.set_quote("XYZ", Quote::new(dec!(99.9), dec!(100.1), dec!(100)));
        assert!(venue.cap_fills("XYZ", Some(dec!(4))));
        assert!(!venue.cap_fills("NOPE", Some(dec!(4))));

        let stop = venue
            .place_order(
                &contract,
                &order(LegRole::StopExit, OrderSide::Sell, OrderKind::Stop { trigger: dec!(95) }, Some("oca")),
            )
            .await
            .unwrap();
        let target = venue
            .place_order(
                &contract,
                &order(LegRole::TargetExit, OrderSide::Sell, OrderKind::Limit { limit: dec!(110) }, Some("oca")),
            )
            .await
            .unwrap();
        let mut timed = order(LegRole::TimeExit, OrderSide::Sell, OrderKind::Market, Some("oca"));
        timed.good_after = Some(start() + chrono::Duration::hours(6));
        let time = venue.place_order(&contract, &timed).await.unwrap();

        venue.set_quote("XYZ", Quote::new(dec!(94.8), dec!(95.0), dec!(94.9)));
        venue.pump(Duration::from_millis(100)).await.unwrap();

        let status = venue.order_status(&stop).unwrap();
        assert_eq!(status.state, OrderState::Submitted);
        assert_eq!(status.filled, dec!(4));
        assert_eq!(status.remaining, dec!(6));
        let target_status = venue.order_status(&target).unwrap();
        assert_eq!(target_status.state, OrderState::Submitted);
        assert_eq!(target_status.remaining, dec!(6));
        let time_status = venue.order_status(&time).unwrap();
        assert_eq!(time_status.state, OrderState::PreSubmitted);
        assert_eq!(time_status.remaining, dec!(6));

        let events = venue.drain_events();
        assert!(matches!(&events[0], VenueEvent::Fill(f) if f.quantity == dec!(4)));

        venue.pump(Duration::from_millis(100)).await.unwrap();
        assert_eq!(venue.order_status(&stop).unwrap().filled, dec!(8));
        assert_eq!(venue.order_status(&target).unwrap().remaining, dec!(2));

        venue.pump(Duration::from_millis(100)).await.unwrap();
        assert_eq!(venue.order_status(&stop).unwrap().state, OrderState::Filled);
        assert_eq!(venue.order_status(&target).unwrap().state, OrderState::Cancelled);
        assert_eq!(venue.order_status(&time).unwrap().state, OrderState::Cancelled);
    }

    #[tokio::test]
    async fn good_after_order_activates_on_time() {
        let venue = venue().await;
        let contract = xyz(&venue).await;
        venue.set_quote("XYZ", Quote::new(dec!(99.9), dec!(100.1), dec!(100)));

        let mut timed = order(LegRole::TimeExit, OrderSide::Sell, OrderKind::Market, None);
        timed.good_after = Some(start() + chrono::Duration::seconds(30));
        let handle = venue.place_order(&contract, &timed).await.unwrap();

        venue.advance(Duration::from_secs(29));
        assert_eq!(venue.order_status(&handle).unwrap().state, OrderState::PreSubmitted);
        venue.advance(Duration::from_secs(1));
        let status = venue.order_status(&handle).unwrap();
        assert_eq!(status.state, OrderState::Filled);
        assert_eq!(status.avg_fill_price, Some(dec!(99.9)));
    }

    #[tokio::test]
    async fn duplicate_notifications() {
        let mut config = PaperVenueConfig::starting_at(start());
        config.duplicate_notifications = true;
        let venue = PaperVenue::new(config);
        venue.list(&PaperListing::stock(1, "XYZ", 26)).unwrap();
        venue.connect().await.unwrap();
        let contract = xyz(&venue).await;
        venue.set_quote("XYZ", Quote::new(dec!(99.9), dec!(100.1), dec!(100)));

        venue
            .place_order(&contract, &order(LegRole::Entry, OrderSide::Buy, OrderKind::Market, None))
            .await
            .unwrap();
        assert_eq!(venue.drain_events().len(), 4);
        assert!(venue.drain_events().is_empty());
    }

    #[tokio::test]
    async fn replay_steps_and_bars() {
        let venue = venue().await;
        let contract = xyz(&venue).await;
        venue.script([
            ReplayStep {
                after_secs: 30,
                local_symbol: "XYZ".to_string(),
                bid: None,
                ask: None,
                last: Some(dec!(100)),
                fill_size: None,
            },
            ReplayStep {
                after_secs: 90,
                local_symbol: "XYZ".to_string(),
                bid: None,
                ask: None,
                last: Some(dec!(101)),
                fill_size: None,
            },
        ]);
        venue.subscribe_quotes(&contract).await.unwrap();
        let series = venue
            .request_bars(&contract, BarRequest::intraday_extended(BarSize::from_seconds(60).unwrap()))
            .await
            .unwrap();

        venue.pump(Duration::from_secs(30)).await.unwrap();
        assert_eq!(venue.quote(&contract).unwrap().last, Some(dec!(100)));
        venue.pump(Duration::from_secs(60)).await.unwrap();

        let bars = venue.bars(series);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, dec!(101));
        let updates = venue
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, VenueEvent::BarUpdate { has_new_bar: true, .. }))
            .count();
        assert_eq!(updates, 2);
    }

    #[tokio::test]
    async fn failure_injection_and_disconnect() {
        let venue = venue().await;
        venue.fail_next(PaperOperation::Pump, VenueError::Timeout { operation: "pump".to_string() });

        assert!(matches!(
            venue.pump(Duration::ZERO).await,
            Err(VenueError::Timeout { .. })
        ));
        assert!(venue.pump(Duration::ZERO).await.is_ok());

        venue.pass_next(PaperOperation::Pump, 2);
        venue.fail_next(PaperOperation::Pump, VenueError::Timeout { operation: "pump".to_string() });
        assert!(venue.pump(Duration::ZERO).await.is_ok());
        assert!(venue.pump(Duration::ZERO).await.is_ok());
        assert!(venue.pump(Duration::ZERO).await.is_err());
        assert!(venue.pump(Duration::ZERO).await.is_ok());

        venue.disconnect().await;
        assert!(matches!(venue.current_time().await, Err(VenueError::NotConnected)));
        assert!(matches!(venue.pump(Duration::ZERO).await, Err(VenueError::NotConnected)));
    }
}
