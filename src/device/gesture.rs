use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hierarchy::{Bounds, Point};

pub const DEFAULT_SWIPE_DURATION_MS: u64 = 40;

/// Perpendicular wobble applied to the end point, in pixels
pub const SWIPE_JITTER: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// A concrete swipe, ready to hand to `input swipe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwipePlan {
    pub start: Point,
    pub end: Point,
    pub duration_ms: u64,
}

impl SwipePlan {
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "swipe".to_string(),
            self.start.x.to_string(),
            self.start.y.to_string(),
            self.end.x.to_string(),
            self.end.y.to_string(),
            self.duration_ms.to_string(),
        ]
    }
}

/// Uniform in `[min, max)`, collapsing to `min` for empty ranges
fn random_in<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        min
    } else {
        rng.gen_range(min..max)
    }
}

/// Plan a randomised swipe across `bounds`.
///
/// The start lands in the middle half of the cross axis and in the half of
/// the travel axis the gesture moves away from. Travel covers `ratio` of the
/// extent, the end point wobbles by up to `SWIPE_JITTER` across the travel
/// axis and is clamped to `bounds`. A zero duration means
/// `DEFAULT_SWIPE_DURATION_MS`.
pub fn plan_swipe<R: Rng + ?Sized>(
    rng: &mut R,
    bounds: &Bounds,
    direction: Direction,
    duration_ms: u64,
    ratio: f64,
) -> SwipePlan {
    let duration_ms = if duration_ms == 0 {
        DEFAULT_SWIPE_DURATION_MS
    } else {
        duration_ms
    };
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };

    let Bounds {
        left,
        top,
        right,
        bottom,
    } = *bounds;
    let width = bounds.width();
    let height = bounds.height();

    let start = match direction {
        Direction::Up => Point::new(
            random_in(rng, left + width / 4, left + width * 3 / 4),
            random_in(rng, top + height / 2, bottom - height / 4),
        ),
        Direction::Down => Point::new(
            random_in(rng, left + width / 4, left + width * 3 / 4),
            random_in(rng, top + height / 4, top + height / 2),
        ),
        Direction::Left => Point::new(
            random_in(rng, left + width / 2, right - width / 4),
            random_in(rng, top + height / 4, top + height * 3 / 4),
        ),
        Direction::Right => Point::new(
            random_in(rng, left + width / 4, left + width / 2),
            random_in(rng, top + height / 4, top + height * 3 / 4),
        ),
    };

    let extent = if direction.is_vertical() { height } else { width };
    let distance = (f64::from(extent) * ratio) as i32;
    let jitter = random_in(rng, -SWIPE_JITTER, SWIPE_JITTER);

    let end = match direction {
        Direction::Up => Point::new(start.x + jitter, start.y - distance),
        Direction::Down => Point::new(start.x + jitter, start.y + distance),
        Direction::Left => Point::new(start.x - distance, start.y + jitter),
        Direction::Right => Point::new(start.x + distance, start.y + jitter),
    };

    SwipePlan {
        start,
        end: bounds.clamp(end),
        duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DIRECTIONS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    #[test]
    fn test_end_point_stays_inside_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let bounds = Bounds::new(100, 200, 500, 1000);

        for _ in 0..200 {
            for direction in DIRECTIONS {
                let plan = plan_swipe(&mut rng, &bounds, direction, 0, 1.0);
                assert!(bounds.contains(plan.start), "{direction}: {plan:?}");
                assert!(bounds.contains(plan.end), "{direction}: {plan:?}");
                assert_eq!(plan.duration_ms, DEFAULT_SWIPE_DURATION_MS);
            }
        }
    }

    #[test]
    fn test_start_point_lies_in_source_half() {
        let mut rng = StdRng::seed_from_u64(42);
        let bounds = Bounds::new(0, 0, 1080, 1920);

        for _ in 0..200 {
            let up = plan_swipe(&mut rng, &bounds, Direction::Up, 0, 0.5).start;
            assert!((270..810).contains(&up.x));
            assert!((960..1440).contains(&up.y));

            let down = plan_swipe(&mut rng, &bounds, Direction::Down, 0, 0.5).start;
            assert!((270..810).contains(&down.x));
            assert!((480..960).contains(&down.y));

            let left = plan_swipe(&mut rng, &bounds, Direction::Left, 0, 0.5).start;
            assert!((540..810).contains(&left.x));
            assert!((480..1440).contains(&left.y));

            let right = plan_swipe(&mut rng, &bounds, Direction::Right, 0, 0.5).start;
            assert!((270..540).contains(&right.x));
            assert!((480..1440).contains(&right.y));
        }
    }

    #[test]
    fn test_travel_distance_and_jitter() {
        let mut rng = StdRng::seed_from_u64(1);
        let bounds = Bounds::new(0, 0, 1000, 2000);

        for _ in 0..100 {
            let plan = plan_swipe(&mut rng, &bounds, Direction::Up, 300, 0.25);
            assert_eq!(plan.duration_ms, 300);
            assert_eq!(plan.start.y - plan.end.y, 500);
            assert!((plan.end.x - plan.start.x).abs() <= SWIPE_JITTER);

            let plan = plan_swipe(&mut rng, &bounds, Direction::Right, 0, 0.25);
            assert_eq!(plan.end.x - plan.start.x, 250);
            assert!((plan.end.y - plan.start.y).abs() <= SWIPE_JITTER);
        }
    }

    #[test]
    fn test_degenerate_bounds_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        let bounds = Bounds::default();
        for direction in DIRECTIONS {
            let plan = plan_swipe(&mut rng, &bounds, direction, 0, 0.8);
            assert_eq!(plan.end, Point::new(0, 0));
        }
    }

    #[test]
    fn test_plan_args() {
        let plan = SwipePlan {
            start: Point::new(1, 2),
            end: Point::new(3, 4),
            duration_ms: 40,
        };
        assert_eq!(plan.to_args(), vec!["swipe", "1", "2", "3", "4", "40"]);
    }
}
