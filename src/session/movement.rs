//! Road-constrained movement. The walkable surface is the union of road
//! corridors (axis rectangles widened by a fixed half-width); a requested
//! displacement is clamped along its dominant axis to the merged 1-D interval
//! of corridors containing the start point.

use crate::constants::{COORD_EPSILON, ROAD_HALF_WIDTH};
use crate::map::{Map, Road};
use crate::types::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Road corridor as an axis-aligned rectangle in continuous coordinates.
#[derive(Clone, Copy, Debug)]
struct Corridor {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

#[derive(Clone, Copy, Debug)]
struct Interval {
    left: f64,
    right: f64,
}

fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min - COORD_EPSILON && value <= max + COORD_EPSILON
}

fn corridor(road: &Road) -> Corridor {
    if road.is_horizontal() {
        let y = road.start().1 as f64;
        Corridor {
            min_x: road.min_along_axis() as f64 - ROAD_HALF_WIDTH,
            max_x: road.max_along_axis() as f64 + ROAD_HALF_WIDTH,
            min_y: y - ROAD_HALF_WIDTH,
            max_y: y + ROAD_HALF_WIDTH,
        }
    } else {
        let x = road.start().0 as f64;
        Corridor {
            min_x: x - ROAD_HALF_WIDTH,
            max_x: x + ROAD_HALF_WIDTH,
            min_y: road.min_along_axis() as f64 - ROAD_HALF_WIDTH,
            max_y: road.max_along_axis() as f64 + ROAD_HALF_WIDTH,
        }
    }
}

/// Collects the 1-D extents along `axis` of every candidate road whose
/// corridor contains `from` on the other axis.
fn intervals_along_axis(map: &Map, from: Point, axis: Axis) -> Vec<Interval> {
    let roads = map.roads();
    let mut result = Vec::new();

    for index in map.road_candidates(from) {
        let rect = corridor(&roads[index]);
        match axis {
            Axis::Horizontal => {
                if !in_range(from.y, rect.min_y, rect.max_y) {
                    continue;
                }
                result.push(Interval {
                    left: rect.min_x,
                    right: rect.max_x,
                });
            }
            Axis::Vertical => {
                if !in_range(from.x, rect.min_x, rect.max_x) {
                    continue;
                }
                result.push(Interval {
                    left: rect.min_y,
                    right: rect.max_y,
                });
            }
        }
    }

    result
}

/// Finds the merged interval containing `from`, tolerating a small epsilon
/// gap to the nearest interval boundary.
fn current_interval(from: f64, merged: &[Interval]) -> Option<Interval> {
    let mut best: Option<Interval> = None;
    let mut best_dist = f64::INFINITY;

    for seg in merged {
        if from >= seg.left - COORD_EPSILON && from <= seg.right + COORD_EPSILON {
            return Some(*seg);
        }

        let dist = if from < seg.left {
            seg.left - from
        } else {
            from - seg.right
        };
        if dist < best_dist {
            best_dist = dist;
            best = Some(*seg);
        }
    }

    if best_dist <= COORD_EPSILON {
        best
    } else {
        None
    }
}

/// Clamps a move from `from` to `to` along one axis to the boundary of the
/// merged interval containing `from`. A start outside every interval refuses
/// the move entirely; that is a defensive fallback, not normal play.
fn restrict_inside_intervals(from: f64, to: f64, mut intervals: Vec<Interval>) -> f64 {
    if intervals.is_empty() {
        return from;
    }

    intervals.sort_by(|a, b| a.left.total_cmp(&b.left));

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for seg in intervals {
        match merged.last_mut() {
            Some(last) if seg.left <= last.right => {
                last.right = last.right.max(seg.right);
            }
            _ => merged.push(seg),
        }
    }

    let Some(current) = current_interval(from, &merged) else {
        return from;
    };

    if to > from {
        to.min(current.right)
    } else {
        to.max(current.left)
    }
}

/// Clamps the displacement `from`->`to` to the road corridors around `from`.
/// Movement is axis-locked per tick: the dominant axis (ties favor x) is
/// clamped and the other coordinate is left unchanged.
pub(super) fn restrict_movement_to_roads(map: &Map, from: Point, to: Point) -> Point {
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    if dx.abs() >= dy.abs() {
        let intervals = intervals_along_axis(map, from, Axis::Horizontal);
        Point::new(restrict_inside_intervals(from.x, to.x, intervals), from.y)
    } else {
        let intervals = intervals_along_axis(map, from, Axis::Vertical);
        Point::new(from.x, restrict_inside_intervals(from.y, to.y, intervals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Road;

    fn cross_map() -> Map {
        let mut map = Map::new("cross".to_string(), "Cross".to_string());
        map.add_road(Road::horizontal(0, 0, 10));
        map.add_road(Road::vertical(5, 0, 10));
        map
    }

    #[test]
    fn noop_move_is_idempotent() {
        let map = cross_map();
        for point in [
            Point::new(0.0, 0.0),
            Point::new(3.2, 0.39),
            Point::new(5.4, 7.0),
            Point::new(10.4, 0.0),
        ] {
            let result = restrict_movement_to_roads(&map, point, point);
            assert_eq!(result, point);
        }
    }

    #[test]
    fn move_inside_one_corridor_is_unclamped() {
        let map = cross_map();
        let from = Point::new(2.0, 0.2);
        let to = Point::new(7.5, 0.2);
        assert_eq!(restrict_movement_to_roads(&map, from, to), to);
    }

    #[test]
    fn move_past_corridor_end_stops_on_the_boundary() {
        let map = cross_map();
        let from = Point::new(9.0, 0.0);
        let to = Point::new(12.0, 0.0);
        let result = restrict_movement_to_roads(&map, from, to);
        assert_eq!(result, Point::new(10.4, 0.0));

        let result = restrict_movement_to_roads(&map, Point::new(1.0, 0.0), Point::new(-3.0, 0.0));
        assert_eq!(result, Point::new(-0.4, 0.0));
    }

    #[test]
    fn crossing_roads_merge_into_one_interval() {
        let map = cross_map();
        // moving down the vertical road across the horizontal one
        let from = Point::new(5.0, 2.0);
        let to = Point::new(5.0, -1.0);
        let result = restrict_movement_to_roads(&map, from, to);
        assert_eq!(result, Point::new(5.0, -0.4));
    }

    #[test]
    fn dominant_axis_ties_favor_x() {
        let map = cross_map();
        let from = Point::new(2.0, 0.0);
        let to = Point::new(3.0, 1.0);
        let result = restrict_movement_to_roads(&map, from, to);
        // y untouched, x clamped (here: inside corridor, so taken as is)
        assert_eq!(result, Point::new(3.0, 0.0));
    }

    #[test]
    fn non_dominant_axis_never_drifts() {
        let map = cross_map();
        let from = Point::new(2.0, 0.3);
        let to = Point::new(6.0, 0.1);
        let result = restrict_movement_to_roads(&map, from, to);
        assert_eq!(result.y, 0.3);
    }

    #[test]
    fn start_outside_every_corridor_refuses_movement() {
        let map = cross_map();
        let from = Point::new(2.0, 3.0);
        let to = Point::new(6.0, 3.0);
        assert_eq!(restrict_movement_to_roads(&map, from, to), from);
    }

    #[test]
    fn sideways_move_off_the_road_is_clamped_to_corridor_edge() {
        let map = cross_map();
        let from = Point::new(2.0, 0.0);
        let to = Point::new(2.0, 2.0);
        let result = restrict_movement_to_roads(&map, from, to);
        assert_eq!(result, Point::new(2.0, 0.4));
    }
}
