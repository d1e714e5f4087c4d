use ai_2048_grid::engine::{add_random_tile, simulate, Direction, Grid};
use ai_2048_grid::expectimax;
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus() -> Vec<Grid> {
    let mut rng = StdRng::seed_from_u64(1337);
    let mut grids = Vec::new();
    let mut g = Grid::new(4).unwrap();
    grids.push(g.clone());
    add_random_tile(&mut g, &mut rng);
    add_random_tile(&mut g, &mut rng);
    grids.push(g.clone());
    for i in 0..24 {
        let dir = Direction::ALL[i % Direction::ALL.len()];
        let outcome = simulate(&g, dir);
        if outcome.moved {
            g = outcome.grid;
            add_random_tile(&mut g, &mut rng);
        }
        grids.push(g.clone());
    }
    grids
}

fn bench_heuristic(c: &mut Criterion) {
    let grids = corpus();
    c.bench_function("heuristic/rate_grid", |bch| {
        bch.iter(|| {
            let mut acc = 0f64;
            for g in &grids {
                let v = expectimax::rate_grid(g);
                acc = acc.mul_add(1.000_000_1, v);
            }
            black_box(acc)
        })
    });
}

criterion_group!(heuristic, bench_heuristic);
criterion_main!(heuristic);
