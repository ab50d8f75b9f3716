use crate::clock::Clock;
use crate::error::{LotteryError, Result};
use crate::oracle::{BetPlaced, OracleMessage, RandomnessReceived, RandomnessSource};
use crate::pool::{LotteryPool, RoundOutcome};
use onepool_core::{Address, Amount};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

const OUTCOME_CHANNEL_CAPACITY: usize = 64;

/// Async front for a [`LotteryPool`].
///
/// Calls are serialized on the pool mutex. Accepted bets travel as
/// [`OracleMessage::BetPlaced`] to a resolver task, which asks the
/// randomness source and feeds [`OracleMessage::RandomnessReceived`] back into
/// the pool as the oracle.
pub struct PoolService {
    pool: Arc<Mutex<LotteryPool>>,
    clock: Arc<dyn Clock>,
    messages: mpsc::UnboundedSender<OracleMessage>,
    outcomes: broadcast::Sender<RoundOutcome>,
    resolver: JoinHandle<()>,
}

impl PoolService {
    pub fn start(pool: LotteryPool, clock: Arc<dyn Clock>, source: Arc<dyn RandomnessSource>) -> Self {
        let pool = Arc::new(Mutex::new(pool));
        let (messages, inbox) = mpsc::unbounded_channel();
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);

        let resolver = tokio::spawn(run_resolver(
            pool.clone(),
            clock.clone(),
            source,
            inbox,
            messages.clone(),
            outcomes.clone(),
        ));

        Self {
            pool,
            clock,
            messages,
            outcomes,
            resolver,
        }
    }

    /// Place a bet now. Resolution happens later on the resolver task.
    pub async fn play(&self, caller: &Address, amount: Amount) -> Result<BetPlaced> {
        let placed = {
            let mut pool = self.pool.lock().await;
            pool.play(caller, amount, self.clock.now())?
        };

        self.messages
            .send(OracleMessage::BetPlaced(placed.clone()))
            .map_err(|_| LotteryError::internal("resolver has shut down"))?;

        Ok(placed)
    }

    /// Relay randomness obtained outside the service's own source.
    pub fn deliver(&self, randomness: RandomnessReceived) -> Result<()> {
        self.messages
            .send(OracleMessage::RandomnessReceived(randomness))
            .map_err(|_| LotteryError::internal("resolver has shut down"))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundOutcome> {
        self.outcomes.subscribe()
    }

    pub async fn lock(&self) -> MutexGuard<'_, LotteryPool> {
        self.pool.lock().await
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Stop the resolver and hand the pool back.
    ///
    /// Randomness still queued or being fetched is dropped, so a pending round
    /// stays pending in the returned pool.
    pub async fn shutdown(self) -> Result<LotteryPool> {
        let Self {
            pool,
            messages,
            resolver,
            ..
        } = self;
        drop(messages);

        // The resolver holds its own sender for re-queued randomness and
        // never sees the channel close.
        resolver.abort();
        let _ = resolver.await;

        Arc::try_unwrap(pool)
            .map(Mutex::into_inner)
            .map_err(|_| LotteryError::internal("pool still shared after shutdown"))
    }
}

async fn run_resolver(
    pool: Arc<Mutex<LotteryPool>>,
    clock: Arc<dyn Clock>,
    source: Arc<dyn RandomnessSource>,
    mut inbox: mpsc::UnboundedReceiver<OracleMessage>,
    requeue: mpsc::UnboundedSender<OracleMessage>,
    outcomes: broadcast::Sender<RoundOutcome>,
) {
    while let Some(message) = inbox.recv().await {
        match message {
            OracleMessage::BetPlaced(bet) => {
                // Ask off the pool lock; sources may be slow.
                let source = source.clone();
                let requeue = requeue.clone();
                tokio::spawn(async move {
                    match source.request_randomness(&bet).await {
                        Ok(value) => {
                            let _ = requeue.send(OracleMessage::RandomnessReceived(
                                RandomnessReceived {
                                    round: bet.round,
                                    value,
                                },
                            ));
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Randomness for round {} unavailable, round stays pending: {}",
                                bet.round,
                                e
                            );
                        }
                    }
                });
            }
            OracleMessage::RandomnessReceived(randomness) => {
                let mut pool = pool.lock().await;

                if !pool.playing() || pool.round_id() != randomness.round {
                    tracing::warn!(
                        "Dropping randomness for round {}, pool is at round {} (playing: {})",
                        randomness.round,
                        pool.round_id(),
                        pool.playing()
                    );
                    continue;
                }

                let oracle = pool.oracle().clone();
                match pool.receive_randomness(&oracle, randomness.value, clock.now()) {
                    Ok(outcome) => {
                        // No subscribers is fine.
                        let _ = outcomes.send(outcome);
                    }
                    Err(e) => {
                        tracing::warn!("Round {} failed to resolve: {}", randomness.round, e);
                    }
                }
            }
        }
    }
}
