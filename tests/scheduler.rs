use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use questmap::config::LayoutConfig;
use questmap::feed::ManualOverrides;
use questmap::ir::{Direction, Quest};
use questmap::layout::{
    HeuristicHeight, LayeredSolver, LayoutError, RankedSolver, SolverInput, SolverOutput,
};
use questmap::scheduler::{LayoutScheduler, RunOutcome};
use questmap::{GraphInputs, QuestGraph, build_graph, classify};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Blocks each run until the test releases the gate registered for one of
/// its node ids, then lays out with the ranked backend.
#[derive(Default)]
struct GatedSolver {
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl GatedSolver {
    fn gate(&self, id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(id.to_string(), rx);
        tx
    }
}

impl LayeredSolver for GatedSolver {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn solve(&self, input: &SolverInput) -> Result<SolverOutput, LayoutError> {
        let gate = {
            let mut gates = self.gates.lock().unwrap();
            input.nodes.iter().find_map(|node| gates.remove(&node.id))
        };
        if let Some(gate) = gate {
            let _ = gate.blocking_recv();
        }
        RankedSolver.solve(input)
    }
}

fn graph_with(id: &str) -> QuestGraph {
    let quests = vec![Quest {
        id: id.to_string(),
        title: id.to_string(),
        ..Quest::default()
    }];
    let mut graph = build_graph(&quests, &ManualOverrides::default(), &GraphInputs::default());
    classify(&mut graph);
    graph
}

fn scheduler(solver: Arc<GatedSolver>) -> LayoutScheduler {
    LayoutScheduler::new(
        Handle::current(),
        LayoutConfig::default(),
        solver,
        Arc::new(HeuristicHeight::default()),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn older_run_finishing_first_is_discarded() {
    let solver = Arc::new(GatedSolver::default());
    let release_old = solver.gate("old");
    let release_new = solver.gate("new");
    let scheduler = scheduler(Arc::clone(&solver));

    let old = scheduler.request(graph_with("old"), Direction::LeftRight);
    let new = scheduler.request(graph_with("new"), Direction::TopBottom);
    assert_eq!(scheduler.latest_generation(), 2);

    release_old.send(()).unwrap();
    assert_eq!(
        old.wait().await,
        RunOutcome::Stale {
            generation: 1,
            latest: 2
        }
    );
    assert_eq!(scheduler.current().generation, 0);
    assert!(scheduler.current().layout.is_empty());

    release_new.send(()).unwrap();
    assert_eq!(new.wait().await, RunOutcome::Committed { generation: 2 });
    let current = scheduler.current();
    assert_eq!(current.generation, 2);
    assert!(current.layout.nodes.contains_key("new"));
    assert_eq!(current.layout.direction, Direction::TopBottom);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn older_run_finishing_last_is_discarded() {
    let solver = Arc::new(GatedSolver::default());
    let release_old = solver.gate("old");
    let release_new = solver.gate("new");
    let scheduler = scheduler(Arc::clone(&solver));
    let mut updates = scheduler.subscribe();

    let old = scheduler.request(graph_with("old"), Direction::LeftRight);
    let new = scheduler.request(graph_with("new"), Direction::LeftRight);

    release_new.send(()).unwrap();
    assert!(new.wait().await.is_committed());
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().generation, 2);

    release_old.send(()).unwrap();
    let outcome = old.wait().await;
    assert_eq!(outcome.generation(), 1);
    assert!(!outcome.is_committed());

    let current = scheduler.current();
    assert_eq!(current.generation, 2);
    assert!(current.layout.nodes.contains_key("new"));
    assert!(!current.layout.nodes.contains_key("old"));
    assert!(!updates.has_changed().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_of_requests_commits_only_the_last() {
    let solver = Arc::new(GatedSolver::default());
    let scheduler = scheduler(Arc::clone(&solver));

    let tickets: Vec<_> = (0..5)
        .map(|i| scheduler.request(graph_with(&format!("q{i}")), Direction::LeftRight))
        .collect();
    let mut committed = Vec::new();
    for ticket in tickets {
        if let RunOutcome::Committed { generation } = ticket.wait().await {
            committed.push(generation);
        }
    }
    assert_eq!(committed.last(), Some(&5));
    assert_eq!(scheduler.current().generation, 5);
    assert!(scheduler.current().layout.nodes.contains_key("q4"));
}
