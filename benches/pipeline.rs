use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use questmap::config::{LayoutConfig, RenderConfig};
use questmap::feed::ManualOverrides;
use questmap::ir::{Direction, Quest};
use questmap::layout::{HeuristicHeight, RankedSolver, compute_layout};
use questmap::render::render_svg;
use questmap::theme::Theme;
use questmap::{GraphInputs, QuestGraph, build_graph, classify};
use std::hint::black_box;

const KINDS: [&str; 6] = [
    "Main Story Quest",
    "Side Quest",
    "Journey",
    "Objective",
    "Faction Story",
    "Event",
];

/// Zoned chains with cross links, a few exclusions and level-gated roots.
fn generated_feed(quests: usize) -> Vec<Quest> {
    (0..quests)
        .map(|i| {
            let zone = (i % 9) as i64;
            let mut prerequisites = Vec::new();
            if i >= 9 && i % 7 != 0 {
                prerequisites.push(format!("Q{}", i - 9));
            }
            if i >= 20 && i % 5 == 0 {
                prerequisites.push(format!("Q{}", i - 20));
            }
            let not_prerequisites = if i >= 3 && i % 31 == 0 {
                vec![format!("Q{}", i - 3)]
            } else {
                Vec::new()
            };
            Quest {
                id: format!("Q{i}"),
                title: format!("Quest number {i} in zone {zone}"),
                quest_type: Some(KINDS[i % KINDS.len()].to_string()),
                zone_id: Some(zone),
                required_level: prerequisites
                    .is_empty()
                    .then_some(((i / 9) % 12 * 5 + 5) as i64),
                prerequisites,
                not_prerequisites,
                ..Quest::default()
            }
        })
        .collect()
}

fn graph_of(quests: &[Quest]) -> QuestGraph {
    let mut graph = build_graph(quests, &ManualOverrides::default(), &GraphInputs::default());
    classify(&mut graph);
    graph
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_classify");
    for size in [100usize, 400, 1200] {
        let quests = generated_feed(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &quests, |b, quests| {
            b.iter(|| {
                let graph = graph_of(black_box(quests));
                black_box(graph.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    let heights = HeuristicHeight::default();
    for size in [100usize, 400, 1200] {
        let graph = graph_of(&generated_feed(size));
        for direction in [Direction::LeftRight, Direction::TopBottom] {
            group.bench_with_input(
                BenchmarkId::new(direction.token(), size),
                &graph,
                |b, graph| {
                    b.iter(|| {
                        let layout =
                            compute_layout(black_box(graph), direction, &config, &RankedSolver, &heights)
                                .expect("layout failed");
                        black_box(layout.nodes.len());
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = LayoutConfig::default();
    let render = RenderConfig::default();
    let theme = Theme::night();
    let heights = HeuristicHeight::default();
    for size in [100usize, 400] {
        let quests = generated_feed(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &quests, |b, quests| {
            b.iter(|| {
                let graph = graph_of(black_box(quests));
                let layout =
                    compute_layout(&graph, Direction::LeftRight, &config, &RankedSolver, &heights)
                        .expect("layout failed");
                let svg = render_svg(&layout, &theme, &render);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_build, bench_layout, bench_end_to_end
);
criterion_main!(benches);
