use crate::types::{Direction, GridPos, PixelPos, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Steer {
    Move(Direction),
    Hold,
    Replan,
}

/// Axis direction from `pos` to the pixel origin of `target`. A missing
/// target or a diagonal offset asks for a new path.
pub(super) fn steer_toward(pos: PixelPos, target: Option<GridPos>, cell_size: i32) -> Steer {
    let Some(target) = target else {
        return Steer::Replan;
    };
    let goal = target.to_pixel(cell_size);
    match (goal.x - pos.x, goal.y - pos.y) {
        (0, 0) => Steer::Hold,
        (0, dy) => Steer::Move(if dy > 0 { Direction::Down } else { Direction::Up }),
        (dx, 0) => Steer::Move(if dx < 0 { Direction::Left } else { Direction::Right }),
        _ => Steer::Replan,
    }
}

/// Pickup boxes are anchored at the centre of their cell.
pub(super) fn pickup_box(cell: GridPos, cell_size: i32, size: i32) -> Rect {
    let origin = cell.to_pixel(cell_size);
    Rect::new(
        origin.x + cell_size / 2,
        origin.y + cell_size / 2,
        size,
        size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steer_follows_shared_axis() {
        let pos = PixelPos::new(64, 64);
        assert_eq!(
            steer_toward(pos, Some(GridPos::new(2, 3)), 32),
            Steer::Move(Direction::Down)
        );
        assert_eq!(
            steer_toward(pos, Some(GridPos::new(2, 1)), 32),
            Steer::Move(Direction::Up)
        );
        assert_eq!(
            steer_toward(pos, Some(GridPos::new(1, 2)), 32),
            Steer::Move(Direction::Left)
        );
        assert_eq!(
            steer_toward(pos, Some(GridPos::new(3, 2)), 32),
            Steer::Move(Direction::Right)
        );
    }

    #[test]
    fn steer_replans_on_missing_or_diagonal_target() {
        let pos = PixelPos::new(64, 64);
        assert_eq!(steer_toward(pos, None, 32), Steer::Replan);
        assert_eq!(
            steer_toward(pos, Some(GridPos::new(3, 3)), 32),
            Steer::Replan
        );
        assert_eq!(steer_toward(pos, Some(GridPos::new(2, 2)), 32), Steer::Hold);
    }

    #[test]
    fn pickup_box_sits_at_cell_centre() {
        assert_eq!(pickup_box(GridPos::new(1, 1), 32, 4), Rect::new(48, 48, 4, 4));
        assert_eq!(pickup_box(GridPos::new(6, 3), 32, 8), Rect::new(208, 112, 8, 8));
    }
}
