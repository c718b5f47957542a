//! Worker lifecycle supervision.
//!
//! One tokio task per exchange runs the venue's feed worker and forwards
//! its events into the mux. The supervisor owns the restart state machine:
//! `starting → connected → disconnected → backing_off → starting`, with a
//! terminal `failed_permanently` once the sliding failure window fills up.
//! One exchange's failure is invisible to the others.

use crate::mux::{IngestionMux, MuxProducer};
use anyhow::{anyhow, Result};
use common::Exchange;
use config_lib::SupervisorSettings;
use feed_worker_trait::{FeedEvent, FeedWorker, FeedWorkerFactory};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Starting,
    Connected,
    Disconnected,
    BackingOff,
    FailedPermanently,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Starting => "starting",
            WorkerStatus::Connected => "connected",
            WorkerStatus::Disconnected => "disconnected",
            WorkerStatus::BackingOff => "backing_off",
            WorkerStatus::FailedPermanently => "failed_permanently",
        }
    }
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operator-facing view of one worker.
#[derive(Debug, Clone)]
pub struct WorkerHealth {
    pub exchange: Exchange,
    pub status: WorkerStatus,
    pub consecutive_failures: u32,
    pub failures_in_window: usize,
    pub next_restart_in: Option<Duration>,
    pub last_failure: Option<String>,
}

struct WorkerState {
    status: WorkerStatus,
    consecutive_failures: u32,
    failure_times: VecDeque<Instant>,
    next_restart_at: Option<Instant>,
    connected_since: Option<Instant>,
    last_failure: Option<String>,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            status: WorkerStatus::Starting,
            consecutive_failures: 0,
            failure_times: VecDeque::new(),
            next_restart_at: None,
            connected_since: None,
            last_failure: None,
        }
    }
}

struct SupervisorShared {
    exchanges: Vec<Exchange>,
    states: RwLock<HashMap<Exchange, WorkerState>>,
}

enum SignalKind {
    Connected,
    Ended { fatal: bool, reason: String },
}

struct WorkerSignal {
    exchange: Exchange,
    kind: SignalKind,
}

enum CtlMsg {
    Signal(WorkerSignal),
    Reset(Exchange),
    Shutdown,
}

/// Cloneable handle for operator queries and control.
#[derive(Clone)]
pub struct SupervisorHandle {
    shared: Arc<SupervisorShared>,
    ctl_tx: mpsc::Sender<CtlMsg>,
}

impl SupervisorHandle {
    /// Snapshot of every worker's state, in configuration order.
    pub fn health(&self) -> Vec<WorkerHealth> {
        let now = Instant::now();
        let states = self.shared.states.read();
        self.shared
            .exchanges
            .iter()
            .filter_map(|exchange| {
                states.get(exchange).map(|st| WorkerHealth {
                    exchange: *exchange,
                    status: st.status,
                    consecutive_failures: st.consecutive_failures,
                    failures_in_window: st.failure_times.len(),
                    next_restart_in: st
                        .next_restart_at
                        .map(|at| at.saturating_duration_since(now)),
                    last_failure: st.last_failure.clone(),
                })
            })
            .collect()
    }

    /// Operator-triggered revival of a permanently-failed exchange.
    pub async fn reset(&self, exchange: Exchange) -> Result<()> {
        self.ctl_tx
            .send(CtlMsg::Reset(exchange))
            .await
            .map_err(|_| anyhow!("supervisor is not running"))
    }

    /// Signal a clean shutdown. The supervisor's task completes once every
    /// worker has stopped or been torn down.
    pub async fn shutdown(&self) -> Result<()> {
        self.ctl_tx
            .send(CtlMsg::Shutdown)
            .await
            .map_err(|_| anyhow!("supervisor is not running"))
    }
}

pub struct Supervisor {
    settings: SupervisorSettings,
    factory: Arc<dyn FeedWorkerFactory>,
    mux: IngestionMux,
    shared: Arc<SupervisorShared>,
    tasks: HashMap<Exchange, JoinHandle<()>>,
    ctl_tx: mpsc::Sender<CtlMsg>,
    ctl_rx: mpsc::Receiver<CtlMsg>,
    worker_shutdown_tx: watch::Sender<bool>,
    worker_shutdown_rx: watch::Receiver<bool>,
}

impl Supervisor {
    pub fn new(
        settings: SupervisorSettings,
        exchanges: Vec<Exchange>,
        factory: Arc<dyn FeedWorkerFactory>,
        mux: IngestionMux,
    ) -> (Self, SupervisorHandle) {
        let states = exchanges
            .iter()
            .map(|&exchange| (exchange, WorkerState::new()))
            .collect();
        let shared = Arc::new(SupervisorShared {
            exchanges,
            states: RwLock::new(states),
        });
        let (ctl_tx, ctl_rx) = mpsc::channel(64);
        let (worker_shutdown_tx, worker_shutdown_rx) = watch::channel(false);
        let handle = SupervisorHandle {
            shared: Arc::clone(&shared),
            ctl_tx: ctl_tx.clone(),
        };
        (
            Self {
                settings,
                factory,
                mux,
                shared,
                tasks: HashMap::new(),
                ctl_tx,
                ctl_rx,
                worker_shutdown_tx,
                worker_shutdown_rx,
            },
            handle,
        )
    }

    /// Spawn the supervision loop onto the runtime.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        for exchange in self.shared.exchanges.clone() {
            self.launch(exchange).await;
        }
        loop {
            let next_due = self.next_restart_due();
            tokio::select! {
                maybe = self.ctl_rx.recv() => match maybe {
                    None => break,
                    Some(CtlMsg::Signal(signal)) => self.on_signal(signal),
                    Some(CtlMsg::Reset(exchange)) => self.on_reset(exchange).await,
                    Some(CtlMsg::Shutdown) => {
                        self.shutdown_workers().await;
                        break;
                    }
                },
                _ = async {
                    if let Some(at) = next_due {
                        tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await;
                    }
                }, if next_due.is_some() => {
                    self.launch_due().await;
                }
            }
        }
        info!("Supervisor stopped");
        Ok(())
    }

    async fn launch(&mut self, exchange: Exchange) {
        {
            let mut states = self.shared.states.write();
            if let Some(st) = states.get_mut(&exchange) {
                st.status = WorkerStatus::Starting;
                st.next_restart_at = None;
            }
        }
        info!(exchange = %exchange, "Starting feed worker");
        let worker = match self.factory.spawn_worker(exchange).await {
            Ok(worker) => worker,
            Err(e) => {
                warn!(exchange = %exchange, error = %e, "Failed to spawn feed worker");
                self.record_failure(exchange, e.to_string());
                return;
            }
        };
        let producer = match self.mux.producer(exchange) {
            Ok(producer) => producer,
            Err(e) => {
                error!(exchange = %exchange, error = %e, "Failed to register worker with mux");
                self.record_failure(exchange, e.to_string());
                return;
            }
        };
        let ctl = self.ctl_tx.clone();
        let shutdown = self.worker_shutdown_rx.clone();
        let handle = tokio::spawn(run_worker(exchange, worker, producer, ctl, shutdown));
        self.tasks.insert(exchange, handle);
    }

    fn on_signal(&mut self, signal: WorkerSignal) {
        match signal.kind {
            SignalKind::Connected => {
                let mut states = self.shared.states.write();
                if let Some(st) = states.get_mut(&signal.exchange) {
                    st.status = WorkerStatus::Connected;
                    st.connected_since = Some(Instant::now());
                }
                info!(exchange = %signal.exchange, "Feed worker connected");
            }
            SignalKind::Ended { fatal, reason } => {
                self.tasks.remove(&signal.exchange);
                if fatal {
                    warn!(exchange = %signal.exchange, reason = %reason, "Feed worker reported a fatal error");
                } else {
                    info!(exchange = %signal.exchange, reason = %reason, "Feed worker disconnected");
                }
                self.record_failure(signal.exchange, reason);
            }
        }
    }

    /// The `disconnected → backing_off` (or `→ failed_permanently`)
    /// transition. Also invoked when spawning itself fails.
    fn record_failure(&self, exchange: Exchange, reason: String) {
        let now = Instant::now();
        let window = Duration::from_secs(self.settings.failure_window_secs);
        let stable = Duration::from_secs(self.settings.stable_reset_secs);
        let mut states = self.shared.states.write();
        let Some(st) = states.get_mut(&exchange) else {
            return;
        };
        st.status = WorkerStatus::Disconnected;
        // A sustained connection wipes the consecutive count before the new
        // failure is recorded.
        if let Some(since) = st.connected_since.take() {
            if now.duration_since(since) >= stable {
                st.consecutive_failures = 0;
                st.failure_times.clear();
            }
        }
        st.consecutive_failures += 1;
        st.failure_times.push_back(now);
        while let Some(&front) = st.failure_times.front() {
            if now.duration_since(front) > window {
                st.failure_times.pop_front();
            } else {
                break;
            }
        }
        st.last_failure = Some(reason.clone());

        if st.failure_times.len() as u32 >= self.settings.max_consecutive_failures {
            st.status = WorkerStatus::FailedPermanently;
            st.next_restart_at = None;
            error!(
                exchange = %exchange,
                failures = st.failure_times.len(),
                "Worker hit the failure ceiling; marked permanently failed until operator reset"
            );
        } else {
            let delay = self.backoff_delay(st.consecutive_failures);
            st.status = WorkerStatus::BackingOff;
            st.next_restart_at = Some(now + delay);
            warn!(
                exchange = %exchange,
                reason = %reason,
                consecutive = st.consecutive_failures,
                delay_ms = delay.as_millis() as u64,
                "Worker down; restart scheduled"
            );
        }
    }

    /// Exponential backoff with a capped ceiling.
    fn backoff_delay(&self, consecutive: u32) -> Duration {
        let exp = consecutive.saturating_sub(1).min(16);
        let ms = self
            .settings
            .initial_backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.settings.max_backoff_ms);
        Duration::from_millis(ms)
    }

    async fn on_reset(&mut self, exchange: Exchange) {
        let permitted = {
            let mut states = self.shared.states.write();
            match states.get_mut(&exchange) {
                Some(st) if st.status == WorkerStatus::FailedPermanently => {
                    st.consecutive_failures = 0;
                    st.failure_times.clear();
                    st.last_failure = None;
                    true
                }
                _ => false,
            }
        };
        if permitted {
            info!(exchange = %exchange, "Operator reset; relaunching worker");
            self.launch(exchange).await;
        } else {
            warn!(exchange = %exchange, "Reset ignored; worker is not permanently failed");
        }
    }

    fn next_restart_due(&self) -> Option<Instant> {
        let states = self.shared.states.read();
        states
            .values()
            .filter(|st| st.status == WorkerStatus::BackingOff)
            .filter_map(|st| st.next_restart_at)
            .min()
    }

    async fn launch_due(&mut self) {
        let now = Instant::now();
        let due: Vec<Exchange> = {
            let states = self.shared.states.read();
            self.shared
                .exchanges
                .iter()
                .copied()
                .filter(|exchange| {
                    states.get(exchange).is_some_and(|st| {
                        st.status == WorkerStatus::BackingOff
                            && st.next_restart_at.is_some_and(|at| at <= now)
                    })
                })
                .collect()
        };
        for exchange in due {
            self.launch(exchange).await;
        }
    }

    async fn shutdown_workers(&mut self) {
        info!("Supervisor shutting down; signalling workers");
        let _ = self.worker_shutdown_tx.send(true);
        let grace = Duration::from_millis(self.settings.shutdown_grace_ms);
        for (exchange, handle) in self.tasks.drain() {
            let abort = handle.abort_handle();
            match tokio::time::timeout(grace, handle).await {
                Ok(_) => debug!(exchange = %exchange, "Worker task exited"),
                Err(_) => {
                    warn!(exchange = %exchange, "Worker did not stop within the grace period; aborting");
                    abort.abort();
                }
            }
        }
    }
}

/// The per-worker task: forwards the event sequence into the mux and
/// reports lifecycle transitions to the supervisor. Ends with the sequence.
async fn run_worker(
    exchange: Exchange,
    mut worker: Box<dyn FeedWorker>,
    producer: MuxProducer,
    ctl: mpsc::Sender<CtlMsg>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!(exchange = %exchange, "Worker task stopping on shutdown signal");
                return;
            }
            maybe = worker.next_event() => {
                let signal = match maybe {
                    Some(FeedEvent::Connected) => {
                        producer.push(FeedEvent::Connected);
                        let _ = ctl
                            .send(CtlMsg::Signal(WorkerSignal {
                                exchange,
                                kind: SignalKind::Connected,
                            }))
                            .await;
                        continue;
                    }
                    Some(message @ FeedEvent::Message(_)) => {
                        producer.push(message);
                        continue;
                    }
                    Some(FeedEvent::Disconnected(reason)) => {
                        producer.push(FeedEvent::Disconnected(reason.clone()));
                        SignalKind::Ended { fatal: false, reason }
                    }
                    Some(FeedEvent::FatalError(reason)) => {
                        producer.push(FeedEvent::FatalError(reason.clone()));
                        SignalKind::Ended { fatal: true, reason }
                    }
                    None => SignalKind::Ended {
                        fatal: false,
                        reason: "event sequence terminated".to_string(),
                    },
                };
                let _ = ctl.send(CtlMsg::Signal(WorkerSignal { exchange, kind: signal })).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::IngestMetrics;
    use async_trait::async_trait;
    use mockall::Sequence;
    use parking_lot::Mutex;

    fn settings(initial_ms: u64, max_failures: u32) -> SupervisorSettings {
        SupervisorSettings {
            initial_backoff_ms: initial_ms,
            max_backoff_ms: 30_000,
            max_consecutive_failures: max_failures,
            failure_window_secs: 300,
            stable_reset_secs: 60,
            shutdown_grace_ms: 500,
        }
    }

    fn new_mux(exchanges: &[Exchange]) -> IngestionMux {
        IngestionMux::new(exchanges, 64, Arc::new(IngestMetrics::new()))
    }

    /// A worker that plays a script and then either holds the connection
    /// open forever or ends its sequence.
    struct ScriptedWorker {
        events: VecDeque<FeedEvent>,
        hold_open: bool,
    }

    #[async_trait]
    impl FeedWorker for ScriptedWorker {
        async fn next_event(&mut self) -> Option<FeedEvent> {
            match self.events.pop_front() {
                Some(event) => Some(event),
                None if self.hold_open => std::future::pending().await,
                None => None,
            }
        }
    }

    /// Hands out one script per spawn, counting spawns.
    struct ScriptedFactory {
        scripts: Mutex<VecDeque<(Vec<FeedEvent>, bool)>>,
        spawned: std::sync::atomic::AtomicU32,
    }

    impl ScriptedFactory {
        fn new(scripts: Vec<(Vec<FeedEvent>, bool)>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into_iter().collect()),
                spawned: std::sync::atomic::AtomicU32::new(0),
            }
        }

        fn spawn_count(&self) -> u32 {
            self.spawned.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeedWorkerFactory for ScriptedFactory {
        async fn spawn_worker(&self, _exchange: Exchange) -> Result<Box<dyn FeedWorker>> {
            self.spawned
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let (events, hold_open) = self
                .scripts
                .lock()
                .pop_front()
                .unwrap_or((Vec::new(), true));
            Ok(Box::new(ScriptedWorker {
                events: events.into_iter().collect(),
                hold_open,
            }))
        }
    }

    async fn wait_for(
        handle: &SupervisorHandle,
        exchange: Exchange,
        mut cond: impl FnMut(&WorkerHealth) -> bool,
    ) {
        for _ in 0..200 {
            if handle
                .health()
                .iter()
                .find(|h| h.exchange == exchange)
                .is_some_and(&mut cond)
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "condition not reached; health = {:?}",
            handle.health()
        );
    }

    #[tokio::test]
    async fn test_disconnect_triggers_backoff_restart() {
        let factory = Arc::new(ScriptedFactory::new(vec![
            (
                vec![
                    FeedEvent::Connected,
                    FeedEvent::Disconnected("server closed".to_string()),
                ],
                false,
            ),
            (vec![FeedEvent::Connected], true),
        ]));
        let mux = new_mux(&[Exchange::Binance]);
        let (supervisor, handle) = Supervisor::new(
            settings(10, 5),
            vec![Exchange::Binance],
            Arc::clone(&factory) as Arc<dyn FeedWorkerFactory>,
            mux,
        );
        let task = supervisor.spawn();

        wait_for(&handle, Exchange::Binance, |h| {
            h.status == WorkerStatus::Connected && h.consecutive_failures == 1
        })
        .await;
        assert_eq!(factory.spawn_count(), 2);

        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_repeated_fatals_become_permanent() {
        let fatal_script = || {
            (
                vec![FeedEvent::FatalError("invalid subscription".to_string())],
                false,
            )
        };
        let factory = Arc::new(ScriptedFactory::new(vec![fatal_script(), fatal_script()]));
        let mux = new_mux(&[Exchange::Okx]);
        let (supervisor, handle) = Supervisor::new(
            settings(5, 2),
            vec![Exchange::Okx],
            Arc::clone(&factory) as Arc<dyn FeedWorkerFactory>,
            mux,
        );
        let task = supervisor.spawn();

        wait_for(&handle, Exchange::Okx, |h| {
            h.status == WorkerStatus::FailedPermanently
        })
        .await;
        assert_eq!(factory.spawn_count(), 2);
        let health = handle.health().remove(0);
        assert_eq!(health.failures_in_window, 2);
        assert_eq!(
            health.last_failure.as_deref(),
            Some("invalid subscription")
        );

        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_permanent_failure_does_not_block_other_exchanges() {
        let factory = Arc::new(ScriptedFactory::new(vec![
            // Spawn order follows configuration order.
            (vec![FeedEvent::FatalError("down".to_string())], false),
            (vec![FeedEvent::Connected], true),
        ]));
        let mux = new_mux(&[Exchange::Binance, Exchange::Bybit]);
        let (supervisor, handle) = Supervisor::new(
            settings(5, 1),
            vec![Exchange::Binance, Exchange::Bybit],
            Arc::clone(&factory) as Arc<dyn FeedWorkerFactory>,
            mux,
        );
        let task = supervisor.spawn();

        wait_for(&handle, Exchange::Binance, |h| {
            h.status == WorkerStatus::FailedPermanently
        })
        .await;
        wait_for(&handle, Exchange::Bybit, |h| {
            h.status == WorkerStatus::Connected
        })
        .await;

        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_operator_reset_revives_failed_worker() {
        let factory = Arc::new(ScriptedFactory::new(vec![
            (vec![FeedEvent::FatalError("bad".to_string())], false),
            (vec![FeedEvent::Connected], true),
        ]));
        let mux = new_mux(&[Exchange::Bitget]);
        let (supervisor, handle) = Supervisor::new(
            settings(5, 1),
            vec![Exchange::Bitget],
            Arc::clone(&factory) as Arc<dyn FeedWorkerFactory>,
            mux,
        );
        let task = supervisor.spawn();

        wait_for(&handle, Exchange::Bitget, |h| {
            h.status == WorkerStatus::FailedPermanently
        })
        .await;

        handle.reset(Exchange::Bitget).await.unwrap();
        wait_for(&handle, Exchange::Bitget, |h| {
            h.status == WorkerStatus::Connected && h.failures_in_window == 0
        })
        .await;
        assert_eq!(factory.spawn_count(), 2);

        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_held_open_workers() {
        let factory = Arc::new(ScriptedFactory::new(vec![(
            vec![FeedEvent::Connected],
            true,
        )]));
        let mux = new_mux(&[Exchange::Binance]);
        let (supervisor, handle) = Supervisor::new(
            settings(10, 5),
            vec![Exchange::Binance],
            Arc::clone(&factory) as Arc<dyn FeedWorkerFactory>,
            mux,
        );
        let task = supervisor.spawn();

        wait_for(&handle, Exchange::Binance, |h| {
            h.status == WorkerStatus::Connected
        })
        .await;

        handle.shutdown().await.unwrap();
        // The supervisor task must complete within the bounded grace.
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("supervisor did not stop")
            .unwrap()
            .unwrap();
    }

    mockall::mock! {
        pub Worker {}

        #[async_trait]
        impl FeedWorker for Worker {
            async fn next_event(&mut self) -> Option<FeedEvent>;
        }
    }

    struct MockOnceFactory {
        first: Mutex<Option<MockWorker>>,
    }

    #[async_trait]
    impl FeedWorkerFactory for MockOnceFactory {
        async fn spawn_worker(&self, _exchange: Exchange) -> Result<Box<dyn FeedWorker>> {
            match self.first.lock().take() {
                Some(worker) => Ok(Box::new(worker)),
                None => Ok(Box::new(ScriptedWorker {
                    events: VecDeque::new(),
                    hold_open: true,
                })),
            }
        }
    }

    #[tokio::test]
    async fn test_terminated_sequence_counts_as_failure() {
        let mut worker = MockWorker::new();
        let mut seq = Sequence::new();
        worker
            .expect_next_event()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Some(FeedEvent::Connected));
        worker
            .expect_next_event()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| None);

        let factory = Arc::new(MockOnceFactory {
            first: Mutex::new(Some(worker)),
        });
        let mux = new_mux(&[Exchange::Bybit]);
        let (supervisor, handle) = Supervisor::new(
            settings(5, 5),
            vec![Exchange::Bybit],
            factory as Arc<dyn FeedWorkerFactory>,
            mux,
        );
        let task = supervisor.spawn();

        wait_for(&handle, Exchange::Bybit, |h| h.consecutive_failures == 1).await;
        let health = handle.health().remove(0);
        assert_eq!(
            health.last_failure.as_deref(),
            Some("event sequence terminated")
        );

        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[test]
    fn test_backoff_delay_growth_and_cap() {
        let mux = new_mux(&[Exchange::Binance]);
        let factory = Arc::new(ScriptedFactory::new(Vec::new()));
        let (supervisor, _handle) = Supervisor::new(
            SupervisorSettings {
                initial_backoff_ms: 500,
                max_backoff_ms: 30_000,
                max_consecutive_failures: 5,
                failure_window_secs: 300,
                stable_reset_secs: 60,
                shutdown_grace_ms: 500,
            },
            vec![Exchange::Binance],
            factory as Arc<dyn FeedWorkerFactory>,
            mux,
        );
        assert_eq!(supervisor.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(supervisor.backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(supervisor.backoff_delay(4), Duration::from_millis(4000));
        // Capped at the configured ceiling.
        assert_eq!(supervisor.backoff_delay(12), Duration::from_millis(30_000));
        assert_eq!(supervisor.backoff_delay(64), Duration::from_millis(30_000));
    }
}
