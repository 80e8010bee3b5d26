use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use infinito_core::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut ids = TileIds::new();
    let spawner = TileSpawner::default();

    let mut board = spawner.initial_board((4, 4), &mut ids, &mut rng);
    let mut boards = vec![board.clone()];
    for direction in Direction::ALL.into_iter().cycle().take(64) {
        let result = transition(&board, direction);
        if result.moved {
            board = spawner.spawn(&result.settled, &mut ids, &mut rng);
        }
        if board.is_game_over() {
            board = spawner.initial_board((4, 4), &mut ids, &mut rng);
        }
        boards.push(board.clone());
    }
    boards
}

fn bench_transition(c: &mut Criterion) {
    let boards = corpus();
    for direction in Direction::ALL {
        c.bench_function(&format!("transition/{:?}", direction), |b| {
            b.iter(|| {
                let mut merges = 0;
                for board in &boards {
                    merges += transition(black_box(board), direction).merges;
                }
                black_box(merges)
            })
        });
    }
}

fn bench_game_over(c: &mut Criterion) {
    let boards = corpus();
    c.bench_function("board/is_game_over", |b| {
        b.iter(|| boards.iter().filter(|board| black_box(board).is_game_over()).count())
    });
}

fn bench_session(c: &mut Criterion) {
    c.bench_function("session/move_and_settle", |b| {
        b.iter_batched(
            || {
                let mut rng = SmallRng::seed_from_u64(9);
                let session = GameSession::new(GameConfig::default(), 0, &mut rng);
                (session, rng)
            },
            |(mut session, mut rng)| {
                for direction in Direction::ALL.into_iter().cycle().take(32) {
                    if let Some(scheduled) = session.apply_move(direction).scheduled() {
                        session.complete(scheduled, &mut rng);
                    }
                }
                black_box(session.score())
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_transition, bench_game_over, bench_session);
criterion_main!(benches);
