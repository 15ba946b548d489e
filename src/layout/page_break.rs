//! # Page Break Decisions
//!
//! Logic for deciding whether a unit is placed where the cursor is or on
//! the next page. Units are atomic: they are never split across pages.

use super::{Cursor, Geometry};

/// What to do with a unit of the given height at the current cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place the unit on the current page (it fits).
    Place,
    /// Start a new page and place the unit at its top.
    MoveToNextPage,
    /// The unit does not fit, but the cursor is already at the top of a
    /// page: place it here and let it run past the bottom margin.
    Overflow,
}

/// Decide where a unit (or a keep-with-next group) of `height` goes.
///
/// Moving to a fresh page only helps when we are not already on one.
pub fn decide_break(cursor: &Cursor, height: f64, geometry: &Geometry) -> BreakDecision {
    if cursor.y + height <= geometry.content_bottom() {
        return BreakDecision::Place;
    }

    if cursor.is_at_page_top(geometry) {
        return BreakDecision::Overflow;
    }

    BreakDecision::MoveToNextPage
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry {
            page_width: 200.0,
            page_height: 300.0,
            top_margin: 20.0,
            bottom_margin: 20.0,
            left_margin: 10.0,
            content_width: 180.0,
        }
    }

    #[test]
    fn everything_fits() {
        let g = geometry();
        let cursor = Cursor { page: 0, y: 100.0 };
        assert_eq!(decide_break(&cursor, 50.0, &g), BreakDecision::Place);
    }

    #[test]
    fn exact_fit_is_placed() {
        let g = geometry();
        let cursor = Cursor { page: 2, y: 230.0 };
        assert_eq!(decide_break(&cursor, 50.0, &g), BreakDecision::Place);
    }

    #[test]
    fn too_tall_for_remainder_moves() {
        let g = geometry();
        let cursor = Cursor { page: 0, y: 250.0 };
        assert_eq!(decide_break(&cursor, 40.0, &g), BreakDecision::MoveToNextPage);
    }

    #[test]
    fn oversized_at_page_top_overflows() {
        let g = geometry();
        let cursor = Cursor::start(&g);
        assert_eq!(decide_break(&cursor, 500.0, &g), BreakDecision::Overflow);
        // ...and still moves when it is not at the top
        let lower = cursor.advance(10.0);
        assert_eq!(decide_break(&lower, 500.0, &g), BreakDecision::MoveToNextPage);
    }
}
