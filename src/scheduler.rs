use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::LayoutConfig;
use crate::graph::QuestGraph;
use crate::ir::Direction;
use crate::layout::{HeightEstimator, LayeredSolver, QuestLayout, compute_layout};

/// The layout currently on display, tagged with the run that produced it.
#[derive(Debug, Clone)]
pub struct CommittedLayout {
    pub generation: u64,
    pub layout: Arc<QuestLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Committed { generation: u64 },
    /// A newer run was requested before this one finished.
    Stale { generation: u64, latest: u64 },
    /// The solver failed. The previous layout stays committed.
    Failed { generation: u64, error: String },
}

impl RunOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Committed { generation }
            | Self::Stale { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Handle to one requested run.
#[derive(Debug)]
pub struct LayoutTicket {
    pub generation: u64,
    handle: JoinHandle<RunOutcome>,
}

impl LayoutTicket {
    pub async fn wait(self) -> RunOutcome {
        let generation = self.generation;
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) => RunOutcome::Failed {
                generation,
                error: err.to_string(),
            },
        }
    }
}

struct SchedulerInner {
    latest: AtomicU64,
    config: LayoutConfig,
    solver: Arc<dyn LayeredSolver>,
    heights: Arc<dyn HeightEstimator>,
    committed: watch::Sender<CommittedLayout>,
}

/// Runs layouts off the caller's task. Every request takes a fresh generation;
/// a finished run commits only if no newer run was requested meanwhile and
/// nothing newer is already committed. Commits swap the whole layout at once.
#[derive(Clone)]
pub struct LayoutScheduler {
    runtime: Handle,
    inner: Arc<SchedulerInner>,
}

impl LayoutScheduler {
    pub fn new(
        runtime: Handle,
        config: LayoutConfig,
        solver: Arc<dyn LayeredSolver>,
        heights: Arc<dyn HeightEstimator>,
    ) -> Self {
        let (committed, _) = watch::channel(CommittedLayout {
            generation: 0,
            layout: Arc::new(QuestLayout::empty(Direction::default())),
        });
        Self {
            runtime,
            inner: Arc::new(SchedulerInner {
                latest: AtomicU64::new(0),
                config,
                solver,
                heights,
                committed,
            }),
        }
    }

    pub fn latest_generation(&self) -> u64 {
        self.inner.latest.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> CommittedLayout {
        self.inner.committed.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CommittedLayout> {
        self.inner.committed.subscribe()
    }

    /// Starts a run over `graph`, superseding any run still in flight.
    pub fn request(&self, graph: QuestGraph, direction: Direction) -> LayoutTicket {
        let generation = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, nodes = graph.nodes.len(), "layout requested");
        let inner = Arc::clone(&self.inner);
        let handle = self
            .runtime
            .spawn_blocking(move || inner.run(generation, &graph, direction));
        LayoutTicket { generation, handle }
    }
}

impl SchedulerInner {
    fn run(&self, generation: u64, graph: &QuestGraph, direction: Direction) -> RunOutcome {
        let result = compute_layout(
            graph,
            direction,
            &self.config,
            self.solver.as_ref(),
            self.heights.as_ref(),
        );
        let layout = match result {
            Ok(layout) => layout,
            Err(err) => {
                tracing::warn!(generation, error = %err, "layout run failed, keeping previous layout");
                return RunOutcome::Failed {
                    generation,
                    error: err.to_string(),
                };
            }
        };

        let layout = Arc::new(layout);
        let committed = self.committed.send_if_modified(|current| {
            if generation != self.latest.load(Ordering::SeqCst) || generation <= current.generation {
                return false;
            }
            *current = CommittedLayout {
                generation,
                layout: Arc::clone(&layout),
            };
            true
        });

        if committed {
            tracing::info!(
                generation,
                nodes = layout.nodes.len(),
                edges = layout.edges.len(),
                "layout committed"
            );
            RunOutcome::Committed { generation }
        } else {
            let latest = self.latest.load(Ordering::SeqCst);
            tracing::warn!(generation, latest, "discarding stale layout run");
            RunOutcome::Stale { generation, latest }
        }
    }
}
