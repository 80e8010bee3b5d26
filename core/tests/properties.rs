use infinito_core::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn random_board(rng: &mut SmallRng, size: Coord2) -> Board {
    let (width, height) = size;
    let rows: Vec<Vec<TileValue>> = (0..height)
        .map(|_| {
            (0..width)
                .map(|_| {
                    if rng.random_bool(0.55) {
                        2u32.pow(rng.random_range(1..=6))
                    } else {
                        0
                    }
                })
                .collect()
        })
        .collect();
    Board::from_rows(&rows[..], &mut TileIds::new()).unwrap()
}

fn boards(seed: u64, count: usize) -> Vec<Board> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| random_board(&mut rng, (4, 4)))
        .collect()
}

#[test]
fn two_twos_slide_left_into_one_four() {
    let mut ids = TileIds::new();
    let mut board = Board::new((4, 4));
    board.place((0, 0), ids.tile(2)).unwrap();
    board.place((1, 0), ids.tile(2)).unwrap();

    let result = transition(&board, Direction::Left);

    assert!(result.moved);
    assert_eq!(result.score_delta, 4);
    let tiles: Vec<_> = result.settled.tiles().collect();
    assert_eq!(tiles.len(), 1);
    assert_eq!(tiles[0].0, (0, 0));
    assert_eq!(tiles[0].1.value, 4);
}

#[test]
fn no_op_moves_leave_the_board_untouched() {
    let mut checked = 0;
    for board in boards(1, 400) {
        for direction in Direction::ALL {
            let result = transition(&board, direction);
            if !result.moved {
                assert_eq!(result.settled, board);
                assert_eq!(result.score_delta, 0);
                checked += 1;
            }
        }
    }
    assert!(checked > 0);
}

#[test]
fn values_are_conserved_and_merges_scored_once() {
    for board in boards(2, 400) {
        for direction in Direction::ALL {
            let result = transition(&board, direction);

            assert_eq!(result.settled.value_sum(), board.value_sum());
            assert_eq!(
                result.settled.tile_count(),
                board.tile_count() - result.merges
            );

            let merged: Vec<_> = result
                .settled
                .tiles()
                .filter(|(_, tile)| tile.flags.contains(TileFlags::MERGED))
                .collect();
            assert_eq!(merged.len(), usize::from(result.merges));
            assert_eq!(
                merged
                    .iter()
                    .map(|(_, tile)| Score::from(tile.value))
                    .sum::<Score>(),
                result.score_delta
            );
            if result.merges == 0 {
                assert_eq!(result.score_delta, 0);
            }
        }
    }
}

#[test]
fn every_merge_consumes_exactly_two_tiles() {
    for board in boards(3, 400) {
        for direction in Direction::ALL {
            let result = transition(&board, direction);

            for (coords, tile) in result.settled.tiles() {
                let sources: Vec<_> = result
                    .slide
                    .tiles()
                    .iter()
                    .filter(|sliding| sliding.to == coords)
                    .collect();

                if tile.flags.contains(TileFlags::MERGED) {
                    assert_eq!(sources.len(), 2);
                    assert!(sources.iter().all(|s| s.tile.value * 2 == tile.value));
                    assert_eq!(sources.iter().filter(|s| s.tile.is_ghost()).count(), 1);
                } else {
                    assert_eq!(sources.len(), 1);
                    assert_eq!(sources[0].tile.value, tile.value);
                }
            }
            assert_eq!(result.slide.tiles().len(), usize::from(board.tile_count()));
        }
    }
}

#[test]
fn repeating_a_move_only_moves_through_merges() {
    for board in boards(4, 400) {
        for direction in Direction::ALL {
            let first = transition(&board, direction);
            let second = transition(&first.settled, direction);

            if second.moved {
                assert!(second.merges > 0);
            }
        }
    }
}

#[test]
fn compacted_board_is_stable_under_back_and_forth() {
    let mut checked = 0;
    for board in boards(5, 400) {
        for direction in Direction::ALL {
            let compacted = transition(&board, direction).settled.settled();
            if transition(&compacted, direction).moved {
                continue;
            }

            let back = transition(&compacted, direction.opposite()).settled;
            let forth = transition(&back, direction);

            assert_eq!(forth.settled.to_rows(), compacted.to_rows());
            assert_eq!(forth.score_delta, 0);
            assert!(!transition(&forth.settled, direction).moved);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn spawning_fills_every_cell_exactly_once() {
    let mut rng = SmallRng::seed_from_u64(6);
    let mut ids = TileIds::new();
    let spawner = TileSpawner::default();

    let mut board = Board::new((4, 4));
    for step in 1..=16u16 {
        board = spawner.spawn(&board, &mut ids, &mut rng);
        assert_eq!(board.tile_count(), step);
    }
    assert!(board.is_full());

    let mut tile_ids: Vec<_> = board.tiles().map(|(_, tile)| tile.id).collect();
    tile_ids.sort_unstable();
    tile_ids.dedup();
    assert_eq!(tile_ids.len(), 16);

    assert_eq!(spawner.spawn(&board, &mut ids, &mut rng), board);
}

#[test]
fn spawned_twos_are_about_nine_in_ten() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut ids = TileIds::new();
    let spawner = TileSpawner::default();
    let empty = Board::new((4, 4));

    let rounds = 20_000;
    let twos = (0..rounds)
        .filter(|_| {
            let board = spawner.spawn(&empty, &mut ids, &mut rng);
            board.tiles().all(|(_, tile)| tile.value == 2)
        })
        .count();

    let frequency = twos as f64 / rounds as f64;
    assert!((frequency - 0.9).abs() < 0.02, "frequency {}", frequency);
}

#[test]
fn game_over_needs_a_full_board_without_pairs() {
    let mut ids = TileIds::new();
    let checkerboard =
        Board::from_rows(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]], &mut ids)
            .unwrap();
    assert!(checkerboard.is_game_over());

    let with_pair =
        Board::from_rows(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 2, 2, 4], [4, 8, 4, 2]], &mut ids)
            .unwrap();
    assert!(!with_pair.is_game_over());
}

#[test]
fn random_play_keeps_session_invariants() {
    let mut rng = SmallRng::seed_from_u64(8);
    let mut session = GameSession::new(GameConfig::default(), 0, &mut rng);

    for _ in 0..2_000 {
        if session.is_game_over() {
            assert!(!session.board().has_any_move());
            session.reset(&mut rng);
            continue;
        }

        let direction = Direction::ALL[rng.random_range(0..4)];
        let before = session.score();
        let outcome = session.apply_move(direction);

        if let Some(scheduled) = outcome.scheduled() {
            assert!(session.is_transitioning());
            let delta = transition(session.board(), direction).score_delta;
            assert_eq!(session.complete(scheduled, &mut rng), ActionOutcome::Changed);
            assert_eq!(session.score(), before + delta);
        } else {
            assert!(!session.board().can_move(direction));
        }

        assert!(!session.is_transitioning());
        assert!(session.best_score() >= session.score());
        assert!(session.history().len() <= session.config().history_limit);
        assert!(session.board().tile_count() <= session.config().total_cells());
    }
}

#[test]
fn history_is_bounded_to_twenty_moves() {
    let mut rng = SmallRng::seed_from_u64(9);
    let mut session = GameSession::new(GameConfig::default(), 0, &mut rng);

    let mut moves = 0;
    let mut directions = Direction::ALL.into_iter().cycle();
    while moves < 30 && !session.is_game_over() {
        if let Some(scheduled) = session.apply_move(directions.next().unwrap()).scheduled() {
            session.complete(scheduled, &mut rng);
            moves += 1;
        }
    }

    assert_eq!(session.history().len(), moves.min(20));
}

#[test]
fn undo_snapshots_survive_later_moves() {
    let mut rng = SmallRng::seed_from_u64(10);
    let mut session = GameSession::new(GameConfig::default(), 0, &mut rng);
    let start = session.board().settled();

    let mut first = None;
    for direction in Direction::ALL {
        if let Some(scheduled) = session.apply_move(direction).scheduled() {
            session.complete(scheduled, &mut rng);
            first = Some(direction);
            break;
        }
    }
    assert!(first.is_some());

    assert_eq!(session.history().peek().map(|s| &s.board), Some(&start));
    for direction in Direction::ALL {
        if let Some(scheduled) = session.apply_move(direction).scheduled() {
            session.complete(scheduled, &mut rng);
        }
    }
    while session.history().len() > 1 {
        session.undo();
    }

    assert_eq!(session.history().peek().map(|s| &s.board), Some(&start));
    session.undo();
    assert_eq!(session.board(), &start);
    assert_eq!(session.score(), 0);
}
