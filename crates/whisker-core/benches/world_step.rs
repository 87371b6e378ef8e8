use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use whisker_core::config::SpawnSpec;
use whisker_core::{Action, DecisionResponse, Outbound, VecEventSink, World, WorldConfig};

fn make_world(agents: usize) -> World {
    let mut config = WorldConfig::default();
    config.agents = (0..agents)
        .map(|i| {
            let x = 30.0 + (i % 20) as f64 * 35.0;
            let y = 30.0 + (i / 20) as f64 * 35.0;
            SpawnSpec::at(format!("agent-{i}"), x, y)
        })
        .collect();
    World::new(config).expect("valid bench config")
}

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("whisker-core/tick_and_respond");

    for &n in &[2usize, 64usize, 256usize] {
        let mut world = make_world(n);
        let mut sink = VecEventSink::default();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &_n| {
            b.iter(|| {
                world.tick(&mut sink);
                for event in sink.take() {
                    if let Outbound::DecisionRequest { agent, .. } = event {
                        let response = DecisionResponse {
                            agent,
                            action_index: Action::VeerLeft.index() as i64,
                        };
                        black_box(world.handle_response(response, &mut sink).ok());
                    }
                }
                sink.take();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_world_step);
criterion_main!(benches);
