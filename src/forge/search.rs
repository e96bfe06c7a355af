//! Multi-worker randomized search for a signable message
//!
//! Workers share the harvested [`RevealedSet`] read-only and race to find a
//! candidate `prefix || payload || suffix` whose digest is supported at all
//! 256 positions. The winner slot is a capacity-1 channel: the first offer
//! is accepted, later offers are dropped. Stopping is cooperative: every
//! worker polls a shared flag once per attempt, so one may finish a last
//! iteration after the winner is in.

use crate::forge::{config::Alphabet, config::ForgeConfig, revealed::RevealedSet, ForgeError, Result};
use crate::lamport::Message;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender, TrySendError};
use rand::distributions::Alphanumeric;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Attempts a worker counts locally before publishing to the shared total
const ATTEMPT_FLUSH: u64 = 4096;

/// Attempts between a worker's deadline checks
const DEADLINE_CHECK: u64 = 256;

/// Pause before a worker retries a failed entropy draw
const ENTROPY_BACKOFF: Duration = Duration::from_millis(10);

/// External cancellation signal
///
/// Cloning shares the flag; cancelling any clone stops every search that
/// was handed one.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A generated message and its digest
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub message: Vec<u8>,
    pub digest: Message,
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub winner: Candidate,
    /// Candidates tried across all workers
    pub attempts: u64,
}

/// Seeds a worker's CSPRNG
pub trait SeedSource: Sync {
    fn seed(&self) -> std::result::Result<StdRng, rand::Error>;
}

/// Seeds from the operating system's entropy source
#[derive(Clone, Copy, Debug, Default)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn seed(&self) -> std::result::Result<StdRng, rand::Error> {
        StdRng::from_rng(OsRng)
    }
}

/// Run the search until a winner is found, `cancel` fires or the configured
/// deadline passes
///
/// The caller must have checked coverage first: with an uncovered position
/// no candidate can ever win and only cancellation ends the search.
pub fn run<S: SeedSource>(
    coverage: &RevealedSet,
    payload: &[u8],
    config: &ForgeConfig,
    cancel: &CancelToken,
    seeds: &S,
) -> Result<SearchOutcome> {
    config.validate()?;

    let workers = config.worker_count();
    let started = Instant::now();
    let deadline = config.deadline().map(|d| started + d);
    let stop = AtomicBool::new(false);
    let attempts = AtomicU64::new(0);
    let (winner_tx, winner_rx) = bounded::<Candidate>(1);

    log::info!(
        "searching with {} workers, payload {} bytes, candidate {} bytes",
        workers,
        payload.len(),
        config.prefix_len + payload.len() + config.suffix_len
    );

    let winner = thread::scope(|scope| {
        for id in 0..workers {
            let worker = Worker {
                id,
                coverage,
                payload,
                config,
                stop: &stop,
                cancel,
                deadline,
                attempts: &attempts,
                winner: winner_tx.clone(),
                seeds,
            };
            scope.spawn(move || worker.run());
        }
        drop(winner_tx);

        let winner = loop {
            let expired = deadline.map_or(false, |d| Instant::now() >= d);
            if cancel.is_cancelled() || expired {
                break winner_rx.try_recv().ok();
            }
            let wait = match deadline {
                Some(d) => config.poll_interval().min(d.saturating_duration_since(Instant::now())),
                None => config.poll_interval(),
            };
            match winner_rx.recv_timeout(wait) {
                Ok(candidate) => break Some(candidate),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break None,
            }
        };

        stop.store(true, Ordering::Release);
        winner
    });

    let attempts = attempts.load(Ordering::Acquire);
    let elapsed = started.elapsed();

    match winner {
        Some(winner) => {
            log::info!(
                "winner after {} attempts in {:.2?} ({:.0} attempts/s)",
                attempts,
                elapsed,
                attempts as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
            );
            Ok(SearchOutcome { winner, attempts })
        }
        None => {
            log::info!("search aborted after {} attempts in {:.2?}", attempts, elapsed);
            Err(ForgeError::SearchAborted { attempts })
        }
    }
}

struct Worker<'a, S> {
    id: usize,
    coverage: &'a RevealedSet,
    payload: &'a [u8],
    config: &'a ForgeConfig,
    stop: &'a AtomicBool,
    cancel: &'a CancelToken,
    deadline: Option<Instant>,
    attempts: &'a AtomicU64,
    winner: Sender<Candidate>,
    seeds: &'a S,
}

impl<'a, S: SeedSource> Worker<'a, S> {
    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire) || self.cancel.is_cancelled()
    }

    fn expired(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    fn should_stop(&self) -> bool {
        self.stop_requested() || self.expired()
    }

    fn run(self) {
        log::debug!("worker {} started", self.id);

        let Some(mut rng) = self.seed_rng() else {
            log::debug!("worker {} stopped before seeding", self.id);
            return;
        };

        let prefix_len = self.config.prefix_len;
        let payload_end = prefix_len + self.payload.len();
        let mut buf = vec![0u8; payload_end + self.config.suffix_len];
        buf[prefix_len..payload_end].copy_from_slice(self.payload);

        let mut total = 0u64;
        let mut unflushed = 0u64;

        loop {
            if self.stop_requested() {
                break;
            }
            if total % DEADLINE_CHECK == 0 && self.expired() {
                log::debug!("worker {} hit the deadline", self.id);
                self.stop.store(true, Ordering::Release);
                break;
            }

            if total > 0 && total % self.config.reseed_interval == 0 {
                match self.seeds.seed() {
                    Ok(fresh) => rng = fresh,
                    Err(e) => log::warn!("worker {}: reseed failed ({}), keeping current stream", self.id, e),
                }
            }

            if let Err(e) = self.fill_random(&mut rng, &mut buf, payload_end) {
                log::warn!("worker {}: entropy draw failed ({}), retrying", self.id, e);
                thread::sleep(ENTROPY_BACKOFF);
                continue;
            }

            total += 1;
            unflushed += 1;
            if unflushed == ATTEMPT_FLUSH {
                self.attempts.fetch_add(unflushed, Ordering::Relaxed);
                unflushed = 0;
            }

            let digest = Message::digest(&buf);
            if self.coverage.supports(&digest) {
                self.publish(Candidate {
                    message: buf.clone(),
                    digest,
                });
                break;
            }
        }

        self.attempts.fetch_add(unflushed, Ordering::Relaxed);
        log::debug!("worker {} stopped after {} attempts", self.id, total);
    }

    /// Offer a winner; the first offer fills the slot and later ones are dropped
    fn publish(&self, candidate: Candidate) {
        match self.winner.try_send(candidate) {
            Ok(()) => log::debug!("worker {} published a winner", self.id),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                log::debug!("worker {} found a duplicate winner, dropped", self.id)
            }
        }
        self.stop.store(true, Ordering::Release);
    }

    /// Seed this worker's CSPRNG, retrying until it succeeds or the search stops
    fn seed_rng(&self) -> Option<StdRng> {
        loop {
            if self.should_stop() {
                return None;
            }
            match self.seeds.seed() {
                Ok(rng) => return Some(rng),
                Err(e) => {
                    log::warn!("worker {}: entropy source failed ({}), retrying", self.id, e);
                    thread::sleep(ENTROPY_BACKOFF);
                }
            }
        }
    }

    fn fill_random(
        &self,
        rng: &mut StdRng,
        buf: &mut [u8],
        payload_end: usize,
    ) -> std::result::Result<(), rand::Error> {
        let (prefix, rest) = buf.split_at_mut(self.config.prefix_len);
        let suffix = &mut rest[payload_end - self.config.prefix_len..];

        match self.config.alphabet {
            Alphabet::Binary => {
                rng.try_fill_bytes(prefix)?;
                rng.try_fill_bytes(suffix)?;
            }
            Alphabet::Alphanumeric => {
                for b in prefix.iter_mut().chain(suffix.iter_mut()) {
                    *b = rng.sample(Alphanumeric);
                }
            }
        }
        Ok(())
    }
}
