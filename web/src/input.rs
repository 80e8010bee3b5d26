use infinito_core::{Action, Direction};

/// Shortest touch travel, in CSS pixels, that counts as a swipe.
pub(crate) const SWIPE_THRESHOLD: f64 = 30.0;

pub(crate) fn key_action(key: &str) -> Option<Action> {
    use Direction::*;
    match key {
        "ArrowUp" => Some(Action::Move(Up)),
        "ArrowDown" => Some(Action::Move(Down)),
        "ArrowLeft" => Some(Action::Move(Left)),
        "ArrowRight" => Some(Action::Move(Right)),
        "Escape" => Some(Action::Cancel),
        _ => None,
    }
}

/// Direction of a swipe between two client positions; the axis with the larger travel wins.
pub(crate) fn swipe_direction(start: (f64, f64), end: (f64, f64)) -> Option<Direction> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let (abs_dx, abs_dy) = (dx.abs(), dy.abs());

    if abs_dx.max(abs_dy) <= SWIPE_THRESHOLD {
        return None;
    }

    Some(if abs_dx > abs_dy {
        if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    })
}
