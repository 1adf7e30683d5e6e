use futures::{Stream, StreamExt, stream};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// When a page counts as settled: at most `max_inflight` requests in flight
/// for at least `quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub max_inflight: usize,
    pub quiet: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            max_inflight: 2,
            quiet: Duration::from_millis(500),
        }
    }
}

/// Request lifecycle event, keyed by the browser's request id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Started(String),
    Done(String),
}

/// Merge the browser's per-kind request streams into one event stream.
///
/// The merge does not preserve order across the inputs, so a request's
/// `Done` may arrive before its `Started`. [`NetworkIdle`] accounts for that.
pub fn network_events<A, B, C>(
    started: A,
    finished: B,
    failed: C,
) -> impl Stream<Item = NetworkEvent>
where
    A: Stream<Item = String>,
    B: Stream<Item = String>,
    C: Stream<Item = String>,
{
    stream::select(
        started.map(NetworkEvent::Started),
        stream::select(finished.map(NetworkEvent::Done), failed.map(NetworkEvent::Done)),
    )
}

/// Tracks in-flight requests and since when the page has been quiet enough
#[derive(Debug)]
pub struct NetworkIdle {
    policy: SettlePolicy,
    inflight: HashSet<String>,
    /// Ids already finished; a late `Started` for one of these is stale
    finished: HashSet<String>,
    idle_since: Option<Instant>,
}

impl NetworkIdle {
    pub fn new(policy: SettlePolicy, now: Instant) -> Self {
        Self {
            policy,
            inflight: HashSet::new(),
            finished: HashSet::new(),
            idle_since: Some(now),
        }
    }

    pub fn request_started(&mut self, id: String, now: Instant) {
        if self.finished.contains(&id) {
            return;
        }
        self.inflight.insert(id);
        self.refresh(now);
    }

    pub fn request_finished(&mut self, id: &str, now: Instant) {
        self.inflight.remove(id);
        self.finished.insert(id.to_string());
        self.refresh(now);
    }

    fn refresh(&mut self, now: Instant) {
        if self.inflight.len() > self.policy.max_inflight {
            self.idle_since = None;
        } else if self.idle_since.is_none() {
            self.idle_since = Some(now);
        }
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// Instant the quiet window completes, if the page is currently quiet
    pub fn settles_at(&self) -> Option<Instant> {
        self.idle_since.map(|since| since + self.policy.quiet)
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        self.settles_at().is_some_and(|at| now >= at)
    }
}

/// Consume network events until the settle condition holds.
///
/// Has no deadline of its own; callers bound it with a timeout. If the event
/// stream ends, the remaining quiet window is waited out and the page is
/// treated as settled.
pub async fn wait_for_idle<S>(events: S, policy: SettlePolicy)
where
    S: Stream<Item = NetworkEvent>,
{
    let mut events = std::pin::pin!(events);
    let mut idle = NetworkIdle::new(policy, Instant::now());

    loop {
        let settle_at = idle.settles_at();

        tokio::select! {
            event = events.next() => match event {
                Some(NetworkEvent::Started(id)) => idle.request_started(id, Instant::now()),
                Some(NetworkEvent::Done(id)) => idle.request_finished(&id, Instant::now()),
                None => {
                    if let Some(at) = settle_at {
                        tokio::time::sleep_until(at).await;
                    }
                    return;
                }
            },
            _ = tokio::time::sleep_until(settle_at.unwrap_or_else(Instant::now)),
                if settle_at.is_some() =>
            {
                tracing::debug!("Network settled with {} request(s) in flight", idle.inflight());
                return;
            }
        }
    }
}
