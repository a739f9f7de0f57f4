use crate::dom::{Position, Size};

/// Move `preferred` so that a `box_size` box placed there stays inside `viewport`, keeping
/// `margin` pixels clear on every side.
///
/// When the box plus margins is larger than the viewport the box is pinned to the top-left
/// margin.
///
/// ```
/// use picker_embed::position::adjust;
/// use picker_embed::{Position, Size};
///
/// let viewport = Size::new(1024.0, 768.0);
/// let modal = Size::new(350.0, 500.0);
/// let p = adjust(Position::new(900.0, 700.0), modal, viewport, 10.0);
/// assert_eq!(p, Position::new(664.0, 258.0));
/// ```
#[must_use]
pub fn adjust(preferred: Position, box_size: Size, viewport: Size, margin: f64) -> Position {
    Position {
        x: clamp_axis(preferred.x, box_size.width, viewport.width, margin),
        y: clamp_axis(preferred.y, box_size.height, viewport.height, margin),
    }
}

fn clamp_axis(value: f64, extent: f64, available: f64, margin: f64) -> f64 {
    let max = available - extent - margin;
    if max < margin {
        return margin;
    }
    value.clamp(margin, max)
}
