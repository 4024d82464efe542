//! Control actor and expiry driver.
//!
//! One background thread per cache owns both the command queue and the
//! rotation timer. Commands are applied strictly in enqueue order; the
//! timer shares the same wait, so rotations are totally ordered with
//! respect to every other mutation.
//!
//! ## Control Loop
//!
//! ```text
//!   loop:
//!     recv_timeout(until next rotation deadline)
//!       ├─ Install / Delete / Clear / SetResolver  → apply to the ring
//!       ├─ Sync(reply)                             → ack: queue is drained
//!       ├─ Shutdown (or all senders dropped)       → exit
//!       └─ Timeout                                 → rotate once, re-arm
//! ```
//!
//! ## Notes
//! - The driver is the only caller of `GenerationRing::rotate`.
//! - Deadlines advance by whole periods; when the thread falls more than a
//!   period behind (a stalled host, a long debugger pause) the missed ticks
//!   are skipped rather than replayed as a rotation burst.
//! - Lookups never touch this thread; resolvers run in the caller's
//!   context, so a slow resolver cannot delay expiry.

use std::hash::Hash;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::ds::{Cached, GenerationRing};
use crate::metrics::CacheCounters;
use crate::resolver::Resolver;

/// A mutation enqueued to the control actor.
pub(crate) enum Command<K, V> {
    /// Install pairs into the newest bucket (resolver results and explicit
    /// inserts share this path).
    Install(Vec<(K, Cached<V>)>),
    /// Remove a key from every bucket.
    Delete(K),
    /// Empty every bucket, keeping ring positions.
    Clear,
    /// Swap the resolver used for subsequent misses.
    SetResolver(Arc<dyn Resolver<K, V>>),
    /// Barrier: acknowledged once all previously enqueued commands applied.
    Sync(Sender<()>),
    /// Stop the driver thread.
    Shutdown,
}

/// Everything the driver thread needs, captured at spawn time.
pub(crate) struct DriverContext<K, V> {
    pub name: Arc<str>,
    pub ring: Arc<GenerationRing<K, V>>,
    pub resolver: Arc<RwLock<Arc<dyn Resolver<K, V>>>>,
    pub counters: Arc<CacheCounters>,
    pub period: Duration,
}

/// Spawns the control thread for one cache instance.
pub(crate) fn spawn<K, V>(
    ctx: DriverContext<K, V>,
    commands: Receiver<Command<K, V>>,
) -> JoinHandle<()>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let thread_name = format!("gencache-{}", ctx.name);
    std::thread::Builder::new()
        .name(thread_name)
        .spawn(move || run(ctx, commands))
        .expect("failed to spawn cache driver thread")
}

fn run<K, V>(ctx: DriverContext<K, V>, commands: Receiver<Command<K, V>>)
where
    K: Eq + Hash,
{
    let mut deadline = Instant::now() + ctx.period;
    loop {
        let timeout = deadline.saturating_duration_since(Instant::now());
        match commands.recv_timeout(timeout) {
            Ok(Command::Install(pairs)) => {
                ctx.counters.record_installs(pairs.len() as u64);
                ctx.ring.newest().insert_many(pairs);
            }
            Ok(Command::Delete(key)) => {
                if ctx.ring.delete_from_all(&key) {
                    ctx.counters.record_remove();
                }
            }
            Ok(Command::Clear) => ctx.ring.clear_all(),
            Ok(Command::SetResolver(resolver)) => *ctx.resolver.write() = resolver,
            Ok(Command::Sync(done)) => {
                // Receiver may have given up waiting; that is not our problem.
                let _ = done.send(());
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                let report = ctx.ring.rotate();
                ctx.counters.record_rotation();
                tracing::debug!(
                    cache = %ctx.name,
                    expired_slot = report.expired_slot,
                    expired_len = report.expired_len,
                    newest = report.newest,
                    oldest = report.oldest,
                    "generation expired"
                );
                deadline += ctx.period;
                let now = Instant::now();
                if deadline <= now {
                    // Missed ticks are skipped, never replayed.
                    deadline = now + ctx.period;
                }
            }
        }
    }
}
