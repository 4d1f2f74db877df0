//! The rate scheduler.
//!
//! A single control loop ticks every [`TICK`], phase locked to its start. Each
//! tick refreshes the contract and account state, consults the balance guard,
//! then dispatches the tick's share of the minute quota as concurrently
//! running batches. The loop never waits on a batch.

use crate::{
    clock::Clock,
    config::Settings,
    inflight::InFlight,
    quota::{split_batches, Quota, Rate},
    submit::{self, MiningCall},
    MinerError, MinerResult,
};
use effort_gateway::ChainGateway;
use effort_state::{account, snapshot, ContractSnapshot, MinerAccountStatus};
use effort_types::SuggestedParams;
use std::{ops::Range, sync::Arc, time::Duration};
use tokio::{
    sync::Semaphore,
    task::JoinSet,
    time::{sleep, Instant},
};
use tracing::Instrument;

/// Interval between ticks.
pub const TICK: Duration = Duration::from_secs(2);

/// Interval between checks while waiting for mining to open.
pub const START_POLL: Duration = Duration::from_secs(5);

/// What a tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// Start of the minute window the tick fell in.
    pub window: u64,
    /// Transactions dispatched.
    pub dispatched: u64,
    /// Sequence number ranges of the dispatched batches, in dispatch order.
    pub batches: Vec<Range<u64>>,
    /// Quota left in the window afterwards.
    pub remaining: u64,
}

/// Drives the mining loop.
pub struct Scheduler<G, C> {
    gateway: G,
    clock: C,
    settings: Arc<Settings>,
    rate: Rate,
    quota: Quota,
    in_flight: InFlight,
    limit: Option<Arc<Semaphore>>,
    tasks: JoinSet<()>,
    /// Sequence number of the next transaction. Equals the number sent so far.
    next_seq: u64,
    ticks: u64,
    state: Option<(ContractSnapshot, MinerAccountStatus)>,
}

/// Time left until the next tick boundary, `elapsed` after the first tick.
pub fn until_next_tick(elapsed: Duration) -> Duration {
    let phase = elapsed.as_nanos() % TICK.as_nanos();
    TICK - Duration::from_nanos(phase as u64)
}

impl<G, C> Scheduler<G, C>
where
    G: ChainGateway,
    C: Clock,
{
    /// A scheduler mining at `rate` with the given settings.
    pub fn new(gateway: G, clock: C, settings: Arc<Settings>, rate: Rate) -> Self {
        let limit = settings
            .max_in_flight_batches
            .map(|n| Arc::new(Semaphore::new(n)));
        Self {
            gateway,
            clock,
            settings,
            rate,
            quota: Quota::new(rate.tpm),
            in_flight: InFlight::default(),
            limit,
            tasks: JoinSet::new(),
            next_seq: 0,
            ticks: 0,
            state: None,
        }
    }

    /// A handle to the in-flight counts.
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Number of transactions dispatched so far.
    pub fn sent(&self) -> u64 {
        self.next_seq
    }

    /// Mine until a fatal error.
    ///
    /// Waits for the contract's start time, then ticks forever. On a fatal
    /// error no further batches are dispatched. Batches already running are
    /// allowed to finish before the error is returned.
    pub async fn run(mut self) -> MinerResult<(), G::Error> {
        let result = self.mine().await;
        self.drain().await;
        result
    }

    async fn mine(&mut self) -> MinerResult<(), G::Error> {
        let snapshot = snapshot::fetch(&self.gateway, self.settings.app_id).await?;
        self.wait_for_start(snapshot.start_timestamp).await;
        let start = Instant::now();
        loop {
            self.tick().await?;
            sleep(until_next_tick(start.elapsed())).await;
        }
    }

    /// Poll until the wall clock reaches `start_timestamp`.
    pub async fn wait_for_start(&self, start_timestamp: u64) {
        loop {
            let now = self.clock.unix_now();
            if now >= start_timestamp {
                return;
            }
            tracing::info!(seconds = start_timestamp - now, "mining has not started yet");
            sleep(START_POLL).await;
        }
    }

    /// Run one tick.
    ///
    /// A tick whose state refresh fails after mining has started dispatches
    /// nothing and consumes no quota.
    #[tracing::instrument(skip(self), fields(tick = self.ticks))]
    pub async fn tick(&mut self) -> MinerResult<TickReport, G::Error> {
        self.reap();
        let amount = self.quota.begin_tick(self.clock.unix_now());

        let mut batches = vec![];
        if let Some((snapshot, status)) = self.refresh().await? {
            self.ticks += 1;
            self.log_stats(&snapshot, &status);
            self.settings.guard.check(status.spendable)?;
            if amount > 0 {
                match self.gateway.suggested_params().await {
                    Ok(params) => batches = self.dispatch(amount, &snapshot, params),
                    Err(err) => tracing::warn!(%err, "no transaction parameters, skipping tick"),
                }
            }
        }
        let dispatched = batches.iter().map(|b| b.end - b.start).sum();
        self.quota.commit(dispatched);

        Ok(TickReport {
            window: self.quota.window().unwrap_or_default(),
            dispatched,
            batches,
            remaining: self.quota.remaining(),
        })
    }

    /// Wait for every dispatched batch to finish.
    pub async fn drain(&mut self) {
        while let Some(res) = self.tasks.join_next().await {
            if let Err(err) = res {
                tracing::error!(%err, "batch task failed");
            }
        }
    }

    /// Collect batches that already finished.
    fn reap(&mut self) {
        while let Some(res) = self.tasks.try_join_next() {
            if let Err(err) = res {
                tracing::error!(%err, "batch task failed");
            }
        }
    }

    /// The current contract and account state.
    ///
    /// Fetched every `snapshot_refresh_ticks` ticks, so cached state is at most
    /// that many ticks old. A gateway error on a due refresh yields `None` once
    /// a previous state exists, and the refresh is retried on the next tick.
    /// Without a previous state, and for decode failures, it is fatal.
    async fn refresh(
        &mut self,
    ) -> MinerResult<Option<(ContractSnapshot, MinerAccountStatus)>, G::Error> {
        let every = u64::from(self.settings.snapshot_refresh_ticks.max(1));
        let due = self.ticks % every == 0;
        if let (Some(state), false) = (&self.state, due) {
            return Ok(Some(state.clone()));
        }
        match self.fetch_state().await {
            Ok(state) => {
                if let Some((previous, _)) = &self.state {
                    if previous.block != state.0.block {
                        tracing::info!(block = state.0.block, winner = %state.0.last_miner, "new block");
                    }
                }
                self.state = Some(state.clone());
                Ok(Some(state))
            }
            Err(MinerError::Gateway(err)) if self.state.is_some() => {
                tracing::warn!(%err, "failed to refresh state, skipping tick");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch_state(&self) -> MinerResult<(ContractSnapshot, MinerAccountStatus), G::Error> {
        let settings = &self.settings;
        let snapshot = snapshot::fetch(&self.gateway, settings.app_id).await?;
        let status = account::fetch(
            &self.gateway,
            &settings.miner.address(),
            &settings.deposit.address(),
            settings.app_id,
        )
        .await?;
        Ok((snapshot, status))
    }

    fn log_stats(&self, snapshot: &ContractSnapshot, status: &MinerAccountStatus) {
        let share = status.effort_share(snapshot.last_miner_effort);
        tracing::info!(
            sent = self.next_seq,
            pending = self.in_flight.pending(),
            block = snapshot.block,
            current_effort = snapshot.current_miner_effort,
            last_effort = snapshot.last_miner_effort,
            own_effort = status.own_effort,
            share = %format_args!("{share:.2}%"),
            "mining"
        );
    }

    /// Launch `amount` calls as batches of at most 16 and return their
    /// sequence ranges.
    fn dispatch(
        &mut self,
        amount: u64,
        snapshot: &ContractSnapshot,
        params: SuggestedParams,
    ) -> Vec<Range<u64>> {
        let params = params.with_flat_fee(self.rate.fee);
        let deposit = self.settings.deposit.address();
        let call = Arc::new(MiningCall::new(&self.settings.method, deposit, snapshot, params));
        let batches: Vec<_> = split_batches(self.next_seq, amount).collect();
        for seqs in &batches {
            let reservation = self.in_flight.reserve(seqs.end - seqs.start);
            self.next_seq = seqs.end;
            tracing::debug!(first = seqs.start, count = reservation.count(), "dispatching batch");

            let gateway = self.gateway.clone();
            let settings = self.settings.clone();
            let call = call.clone();
            let limit = self.limit.clone();
            let seqs = seqs.clone();
            let future = async move {
                let _permit = match limit {
                    Some(limit) => limit.acquire_owned().await.ok(),
                    None => None,
                };
                submit::run_batch(&gateway, &settings.miner, &call, seqs, reservation).await;
            };
            self.tasks.spawn(future.in_current_span());
        }
        batches
    }
}
