use crate::daemon::collection::events::Position;

/// Euclidean distance between two pointer samples.
pub fn distance(from: Position, to: Position) -> f64 {
    ((from.x - to.x).powi(2) + (from.y - to.y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Position::new(0., 0.), Position::new(3., 4.)), 5.);
        assert_eq!(distance(Position::new(3., 4.), Position::new(0., 0.)), 5.);
        assert_eq!(distance(Position::new(7., 7.), Position::new(7., 7.)), 0.);
    }

    #[test]
    fn test_distance_negative_coordinates() {
        assert_eq!(distance(Position::new(-1., -1.), Position::new(2., 3.)), 5.);
    }
}
