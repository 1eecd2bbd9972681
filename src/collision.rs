use crate::types::Point;

/// What kind of object a gatherer ran over during its move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetClass {
    Loot,
    Office,
}

/// A static pickup candidate: a loot item or an office deposit point.
#[derive(Clone, Copy, Debug)]
pub struct Target {
    pub class: TargetClass,
    pub position: Point,
    pub width: f64,
    pub id: u32,
}

/// One dog's displacement during a tick. Callers must only build gatherers
/// for dogs that actually moved; a zero-length segment would divide by zero.
#[derive(Clone, Copy, Debug)]
pub struct Gatherer {
    pub start: Point,
    pub end: Point,
    pub width: f64,
    pub dog_id: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct GatherEvent {
    pub class: TargetClass,
    pub target_id: u32,
    pub dog_id: u32,
    pub sq_distance: f64,
    /// Fraction of the gatherer's path at which the target is reached.
    /// Events sorted by this field replay pickups in physical order.
    pub time: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct SweepResult {
    pub sq_distance: f64,
    pub proj_ratio: f64,
}

impl SweepResult {
    pub fn is_collected(&self, collect_radius: f64) -> bool {
        self.proj_ratio >= 0.0
            && self.proj_ratio <= 1.0
            && self.sq_distance <= collect_radius * collect_radius
    }
}

/// Projects point `c` onto the segment `a`->`b`.
/// `proj_ratio` may fall outside [0, 1] when the closest point on the
/// carrying line lies beyond the segment ends.
pub fn sweep_point(a: Point, b: Point, c: Point) -> SweepResult {
    let u_x = c.x - a.x;
    let u_y = c.y - a.y;
    let v_x = b.x - a.x;
    let v_y = b.y - a.y;
    let u_dot_v = u_x * v_x + u_y * v_y;
    let u_len2 = u_x * u_x + u_y * u_y;
    let v_len2 = v_x * v_x + v_y * v_y;

    SweepResult {
        sq_distance: u_len2 - (u_dot_v * u_dot_v) / v_len2,
        proj_ratio: u_dot_v / v_len2,
    }
}

/// Finds every (gatherer, target) pair swept this tick, ordered by `time`
/// ascending.
pub fn find_gather_events(targets: &[Target], gatherers: &[Gatherer]) -> Vec<GatherEvent> {
    let mut events = Vec::with_capacity(targets.len() * gatherers.len());

    for gatherer in gatherers {
        for target in targets {
            let result = sweep_point(gatherer.start, gatherer.end, target.position);
            let collect_radius = gatherer.width + target.width;
            if result.is_collected(collect_radius) {
                events.push(GatherEvent {
                    class: target.class,
                    target_id: target.id,
                    dog_id: gatherer.dog_id,
                    sq_distance: result.sq_distance,
                    time: result.proj_ratio,
                });
            }
        }
    }

    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gatherer(start: (f64, f64), end: (f64, f64), width: f64) -> Gatherer {
        Gatherer {
            start: Point::new(start.0, start.1),
            end: Point::new(end.0, end.1),
            width,
            dog_id: 0,
        }
    }

    fn loot_at(x: f64, y: f64, id: u32) -> Target {
        Target {
            class: TargetClass::Loot,
            position: Point::new(x, y),
            width: 0.0,
            id,
        }
    }

    #[test]
    fn point_on_segment_is_always_collected() {
        let result = sweep_point(
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(2.0, 0.0),
        );
        assert!(result.sq_distance.abs() < 1e-12);
        assert!(result.is_collected(0.1));
    }

    #[test]
    fn point_behind_start_is_never_collected() {
        let result = sweep_point(
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(-0.5, 0.0),
        );
        assert!(result.proj_ratio < 0.0);
        assert!(!result.is_collected(100.0));
    }

    #[test]
    fn point_past_end_is_never_collected() {
        let result = sweep_point(
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.5, 0.0),
        );
        assert!(result.proj_ratio > 1.0);
        assert!(!result.is_collected(100.0));
    }

    #[test]
    fn perpendicular_distance_gates_collection() {
        let near = sweep_point(
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(2.0, 0.3),
        );
        assert!(near.is_collected(0.3));
        assert!(!near.is_collected(0.29));
    }

    #[test]
    fn events_are_ordered_by_path_fraction() {
        let targets = vec![loot_at(3.0, 0.0, 7), loot_at(1.0, 0.0, 8), loot_at(2.0, 0.0, 9)];
        let gatherers = vec![gatherer((0.0, 0.0), (4.0, 0.0), 0.3)];

        let events = find_gather_events(&targets, &gatherers);
        let ids: Vec<u32> = events.iter().map(|e| e.target_id).collect();
        assert_eq!(ids, vec![8, 9, 7]);
        assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn offices_and_loot_mix_in_one_pass() {
        let targets = vec![
            loot_at(1.0, 0.0, 1),
            Target {
                class: TargetClass::Office,
                position: Point::new(3.0, 0.0),
                width: 0.5,
                id: 0,
            },
        ];
        let gatherers = vec![gatherer((0.0, 0.0), (4.0, 0.0), 0.3)];

        let events = find_gather_events(&targets, &gatherers);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].class, TargetClass::Loot);
        assert_eq!(events[1].class, TargetClass::Office);
    }
}
