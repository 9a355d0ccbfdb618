//! Generation cycle: the upstream request races a fixed step animation.
//!
//! ```text
//!   Generation::start(id, timeline, fetch, tx)
//!         │
//!         └── task ─┬── run_timeline   → Step{index, percent} per step, then 100%
//!                   └── fetch future   → PlaylistDocument (fallback on error)
//!                          both feed JoinSlots; the second arrival emits Complete
//! ```
//!
//! The fetch never fails from the orchestrator's point of view: upstream
//! errors are logged and replaced by the demo document.  Dropping the
//! `GenerationHandle` aborts the task, and every event carries the id so the
//! App can discard anything from a superseded cycle.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use moodmix_proto::config::TimelineMode;
use moodmix_proto::playlist::{Normalizer, PlaylistDocument};

use crate::api::{ApiClient, Upload};

// ── Timeline ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineStep {
    pub label: &'static str,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
}

const STEP_LABELS: [&str; 5] = [
    "Reading your photo",
    "Sensing the mood",
    "Searching for songs",
    "Collecting tracks",
    "Mixing your playlist",
];

impl Timeline {
    pub fn new(steps: Vec<TimelineStep>) -> Self {
        Self { steps }
    }

    pub fn for_mode(mode: TimelineMode) -> Self {
        let millis: [u64; 5] = match mode {
            TimelineMode::Fast => [1500, 2000, 2500, 2000, 1500],
            TimelineMode::Slow => [10_000; 5],
        };
        Self::new(
            STEP_LABELS
                .iter()
                .zip(millis)
                .map(|(&label, ms)| TimelineStep {
                    label,
                    duration: Duration::from_millis(ms),
                })
                .collect(),
        )
    }

    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Progress shown when step `index` begins.
    pub fn percent_at(&self, index: usize) -> u8 {
        if self.is_empty() || index >= self.len() {
            return 100;
        }
        (index * 100 / self.steps.len()) as u8
    }
}

// ── Join primitive ────────────────────────────────────────────────────────────

/// Two-slot barrier: network result and animation completion.  Yields the
/// network value exactly once, on whichever arrival comes second.
#[derive(Debug)]
pub struct JoinSlots<T> {
    network: Option<T>,
    network_arrived: bool,
    animation_done: bool,
    fired: bool,
}

impl<T> JoinSlots<T> {
    pub fn new() -> Self {
        Self {
            network: None,
            network_arrived: false,
            animation_done: false,
            fired: false,
        }
    }

    pub fn arrive_network(&mut self, value: T) -> Option<T> {
        if self.network_arrived {
            return None;
        }
        self.network_arrived = true;
        if self.animation_done {
            self.fired = true;
            Some(value)
        } else {
            self.network = Some(value);
            None
        }
    }

    pub fn arrive_animation(&mut self) -> Option<T> {
        if self.animation_done {
            return None;
        }
        self.animation_done = true;
        if self.network_arrived {
            self.fired = true;
            self.network.take()
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn is_complete(&self) -> bool {
        self.fired
    }
}

impl<T> Default for JoinSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Events / handle ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum GenerationEvent {
    /// Step `index` started.  `index == timeline.len()` marks the end of the
    /// animation (`percent == 100`).
    Step { id: u64, index: usize, percent: u8 },
    Complete {
        id: u64,
        document: Box<PlaylistDocument>,
    },
}

impl GenerationEvent {
    pub fn id(&self) -> u64 {
        match self {
            Self::Step { id, .. } | Self::Complete { id, .. } => *id,
        }
    }
}

/// Owns the running cycle.  Dropping it cancels the cycle.
pub struct GenerationHandle {
    id: u64,
    task: JoinHandle<()>,
}

impl GenerationHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        if !self.task.is_finished() {
            debug!("generation {}: cancelled", self.id);
        }
        self.task.abort();
    }
}

impl Drop for GenerationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct Generation;

impl Generation {
    pub fn start<F>(
        id: u64,
        timeline: Timeline,
        fetch: F,
        tx: mpsc::Sender<GenerationEvent>,
    ) -> GenerationHandle
    where
        F: Future<Output = PlaylistDocument> + Send + 'static,
    {
        info!(
            "generation {}: start ({} steps, {:?})",
            id,
            timeline.len(),
            timeline.total()
        );
        let task = tokio::spawn(async move {
            let mut slots = JoinSlots::new();
            let animation = run_timeline(id, &timeline, &tx);
            tokio::pin!(fetch);
            tokio::pin!(animation);
            let mut fetch_done = false;
            let mut animation_done = false;

            let document = loop {
                tokio::select! {
                    doc = &mut fetch, if !fetch_done => {
                        fetch_done = true;
                        debug!("generation {}: network slot filled", id);
                        if let Some(doc) = slots.arrive_network(doc) {
                            break doc;
                        }
                    }
                    _ = &mut animation, if !animation_done => {
                        animation_done = true;
                        debug!("generation {}: animation finished", id);
                        if let Some(doc) = slots.arrive_animation() {
                            break doc;
                        }
                    }
                    else => return,
                }
            };

            info!("generation {}: complete ({} tracks)", id, document.tracks.len());
            let _ = tx
                .send(GenerationEvent::Complete {
                    id,
                    document: Box::new(document),
                })
                .await;
        });
        GenerationHandle { id, task }
    }
}

async fn run_timeline(id: u64, timeline: &Timeline, tx: &mpsc::Sender<GenerationEvent>) {
    for (index, step) in timeline.steps().iter().enumerate() {
        let percent = timeline.percent_at(index);
        let _ = tx.send(GenerationEvent::Step { id, index, percent }).await;
        tokio::time::sleep(step.duration).await;
    }
    let _ = tx
        .send(GenerationEvent::Step {
            id,
            index: timeline.len(),
            percent: 100,
        })
        .await;
}

/// The network half of a cycle.  Never fails: any `ApiError` is logged and
/// answered with the demo document.
pub async fn fetch_playlist(
    client: ApiClient,
    normalizer: Normalizer,
    upload: Upload,
    fallback_audio: String,
) -> PlaylistDocument {
    let original = upload.original_handle();
    match client.generate_with_retry(&upload).await {
        Ok(valid) => normalizer.normalize(&valid, &original),
        Err(e) => {
            warn!(
                "generation: upstream failed [{}]: {}; using fallback playlist",
                e.kind(),
                e
            );
            PlaylistDocument::fallback(&original, &fallback_audio)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodmix_proto::config::ApiConfig;
    use std::path::PathBuf;
    use tokio::time::Instant;

    fn timeline_of(secs: &[u64]) -> Timeline {
        Timeline::new(
            secs.iter()
                .map(|&s| TimelineStep {
                    label: "step",
                    duration: Duration::from_secs(s),
                })
                .collect(),
        )
    }

    fn doc() -> PlaylistDocument {
        PlaylistDocument::fallback("p.jpg", "")
    }

    /// Drain events until `Complete`; returns the time it arrived and every
    /// step seen.
    async fn run_to_completion(
        mut rx: mpsc::Receiver<GenerationEvent>,
        start: Instant,
    ) -> (Duration, Vec<(usize, u8)>) {
        let mut steps = Vec::new();
        while let Some(ev) = rx.recv().await {
            match ev {
                GenerationEvent::Step { index, percent, .. } => steps.push((index, percent)),
                GenerationEvent::Complete { .. } => return (start.elapsed(), steps),
            }
        }
        panic!("channel closed before completion");
    }

    #[test]
    fn test_join_network_first() {
        let mut slots = JoinSlots::new();
        assert_eq!(slots.arrive_network(7), None);
        assert!(!slots.is_complete());
        assert_eq!(slots.arrive_animation(), Some(7));
        assert!(slots.is_complete());
        assert_eq!(slots.arrive_animation(), None);
    }

    #[test]
    fn test_join_animation_first() {
        let mut slots = JoinSlots::new();
        assert_eq!(slots.arrive_animation(), None);
        assert_eq!(slots.arrive_network("doc"), Some("doc"));
        assert_eq!(slots.arrive_network("late"), None);
    }

    #[test]
    fn test_timeline_modes() {
        let fast = Timeline::for_mode(TimelineMode::Fast);
        assert_eq!(fast.len(), 5);
        assert_eq!(fast.total(), Duration::from_millis(9500));
        let slow = Timeline::for_mode(TimelineMode::Slow);
        assert_eq!(slow.total(), Duration::from_secs(50));
        assert_eq!(slow.percent_at(0), 0);
        assert_eq!(slow.percent_at(3), 60);
        assert_eq!(slow.percent_at(5), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_network_waits_for_animation() {
        let (tx, rx) = mpsc::channel(64);
        let start = Instant::now();
        let fetch = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            doc()
        };
        let _handle = Generation::start(1, timeline_of(&[2, 2, 2, 2, 2]), fetch, tx);

        let (elapsed, steps) = run_to_completion(rx, start).await;
        assert_eq!(elapsed, Duration::from_secs(10));
        assert_eq!(
            steps,
            vec![(0, 0), (1, 20), (2, 40), (3, 60), (4, 80), (5, 100)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_network_completes_when_it_arrives() {
        let (tx, rx) = mpsc::channel(64);
        let start = Instant::now();
        let fetch = async {
            tokio::time::sleep(Duration::from_secs(15)).await;
            doc()
        };
        let _handle = Generation::start(2, timeline_of(&[2, 2, 2, 2, 2]), fetch, tx);

        let (elapsed, steps) = run_to_completion(rx, start).await;
        assert_eq!(elapsed, Duration::from_secs(15));
        assert_eq!(steps.last(), Some(&(5, 100)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_completion() {
        let (tx, mut rx) = mpsc::channel(64);
        let handle = Generation::start(3, timeline_of(&[1, 1]), async { doc() }, tx);

        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(handle);

        while let Some(ev) = rx.recv().await {
            assert!(
                !matches!(ev, GenerationEvent::Complete { .. }),
                "completion after cancel"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_carry_generation_id() {
        let (tx, mut rx) = mpsc::channel(64);
        let _handle = Generation::start(42, timeline_of(&[1]), async { doc() }, tx);
        while let Some(ev) = rx.recv().await {
            assert_eq!(ev.id(), 42);
            if matches!(ev, GenerationEvent::Complete { .. }) {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_falls_back_when_backend_is_down() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: 2,
            max_retries: 0,
            retry_backoff_ms: 0,
        })
        .unwrap();
        let upload = Upload {
            path: PathBuf::from("/tmp/photo.png"),
            file_name: "photo.png".to_string(),
            mime: "image/png",
            bytes: vec![1, 2, 3],
            mood_hint: None,
        };
        let document = fetch_playlist(
            client,
            Normalizer::default(),
            upload,
            "http://demo/mix.mp3".to_string(),
        )
        .await;
        assert_eq!(document.tracks.len(), 3);
        assert_eq!(document.images[0].url, "/tmp/photo.png");
        assert_eq!(document.audio_url, "http://demo/mix.mp3");
        assert!(document.session_id.is_none());
    }
}
