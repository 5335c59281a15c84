use bevy::prelude::*;

use crate::script::Hook;

/// How progress past a path vertex is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationPolicy {
    /// Stop exactly on every vertex, dropping any overshoot.
    #[default]
    DiscreteStop,
    /// Keep the overshoot and carry it into the next segment. Smoother at low
    /// frame rates but can cut corners.
    ContinuousCarry,
}

/// Instructions for `NpcCommand::FollowPath`. Unset fields keep what the
/// NPC's current path already has.
#[derive(Debug, Clone, Default)]
pub struct FollowPathData {
    pub path: Option<Vec<Vec3>>,
    /// Metres per second over the whole path.
    pub speed: Option<f32>,
    /// Seconds for one full pass; wins over `speed`.
    pub total_duration: Option<f32>,
    pub loop_path: Option<bool>,
    /// Smooth the points into a Catmull-Rom spline.
    pub curve: bool,
    pub starting_point: Option<usize>,
    pub on_finish: Option<Hook>,
    pub on_reached_point: Option<Hook>,
    pub policy: Option<InterpolationPolicy>,
}

impl FollowPathData {
    pub fn new(path: impl Into<Vec<Vec3>>) -> Self {
        Self {
            path: Some(path.into()),
            ..default()
        }
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn total_duration(mut self, secs: f32) -> Self {
        self.total_duration = Some(secs);
        self
    }

    pub fn looping(mut self, loop_path: bool) -> Self {
        self.loop_path = Some(loop_path);
        self
    }

    pub fn curve(mut self) -> Self {
        self.curve = true;
        self
    }

    pub fn starting_point(mut self, index: usize) -> Self {
        self.starting_point = Some(index);
        self
    }

    pub fn on_finish(mut self, hook: impl Into<Hook>) -> Self {
        self.on_finish = Some(hook.into());
        self
    }

    pub fn on_reached_point(mut self, hook: impl Into<Hook>) -> Self {
        self.on_reached_point = Some(hook.into());
        self
    }

    pub fn policy(mut self, policy: InterpolationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

/// What a single walk step produced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathStep {
    pub position: Vec3,
    /// Set when the NPC turned onto a new segment.
    pub look_at: Option<Vec3>,
    /// Path vertices reached this step, not counting loop wraps or the end.
    pub reached: u32,
    pub finished: bool,
}

/// An NPC's walk along a polyline.
#[derive(Component, Debug, Clone)]
pub struct PathFollow {
    points: Vec<Vec3>,
    origin: usize,
    target: usize,
    fraction: f32,
    /// Progress per second on each segment, closing segment last when looping.
    speeds: Vec<f32>,
    looping: bool,
    total_duration: Option<f32>,
    pub policy: InterpolationPolicy,
    pub on_finish: Option<Hook>,
    pub on_reached_point: Option<Hook>,
}

impl PathFollow {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            origin: 0,
            target: 1,
            fraction: 0.0,
            speeds: Vec::new(),
            looping: false,
            total_duration: None,
            policy: InterpolationPolicy::default(),
            on_finish: None,
            on_reached_point: None,
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn total_duration(&self) -> Option<f32> {
        self.total_duration
    }

    /// Restarts progress on segment `index`.
    pub fn set_index(&mut self, index: usize) {
        let index = index.min(self.points.len().saturating_sub(1));
        self.fraction = 0.0;
        self.origin = index;
        self.target = if index + 1 < self.points.len() { index + 1 } else { 0 };
    }

    /// Where path progress says the walker should be.
    pub fn expected_position(&self) -> Option<Vec3> {
        let origin = *self.points.get(self.origin)?;
        if self.fraction <= 0.0 {
            return Some(origin);
        }
        let target = *self.points.get(self.target)?;
        Some(origin.lerp(target, self.fraction.min(1.0)))
    }

    /// Applies `data` and prepares the walk from `position`. Returns the point
    /// to face, or `None` when the path can't be walked, in which case the
    /// walk is left as it was.
    pub fn configure(
        &mut self,
        data: Option<&FollowPathData>,
        position: Vec3,
        walking_speed: f32,
        rejoin_epsilon_sq: f32,
    ) -> Option<Vec3> {
        let mut next = self.clone();
        let look_at = next.apply(data, position, walking_speed, rejoin_epsilon_sq)?;
        *self = next;
        Some(look_at)
    }

    fn apply(
        &mut self,
        data: Option<&FollowPathData>,
        position: Vec3,
        walking_speed: f32,
        rejoin_epsilon_sq: f32,
    ) -> Option<Vec3> {
        if let Some(data) = data {
            if let Some(points) = &data.path {
                let looping = data.loop_path.unwrap_or(self.looping);
                self.points = if data.curve {
                    catmull_rom(points, points.len() * 4, looping)
                } else {
                    points.clone()
                };
                self.origin = 0;
                self.target = 1;
                self.fraction = 0.0;
                self.total_duration = None;
            }
            if let Some(looping) = data.loop_path {
                self.looping = looping;
            }
            if let Some(index) = data.starting_point {
                self.set_index(index);
            }
            if let Some(policy) = data.policy {
                self.policy = policy;
            }
            if data.on_finish.is_some() {
                self.on_finish = data.on_finish.clone();
            }
            if data.on_reached_point.is_some() {
                self.on_reached_point = data.on_reached_point.clone();
            }
        }

        if self.points.len() < 2 {
            warn!("can't follow a path with {} points", self.points.len());
            return None;
        }
        if self.origin >= self.points.len() || self.target >= self.points.len() {
            self.set_index(0);
        }

        self.rejoin(position, rejoin_epsilon_sq);

        let mut lengths: Vec<f32> = self
            .points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .collect();
        if self.looping
            && let (Some(first), Some(last)) = (self.points.first(), self.points.last())
        {
            lengths.push(last.distance(*first));
        }
        let total_distance: f32 = lengths.iter().sum();
        if !(total_distance > 0.0 && total_distance.is_finite()) {
            warn!("can't follow a path of zero length");
            return None;
        }

        let total_duration = match data {
            Some(FollowPathData {
                total_duration: Some(secs),
                ..
            }) => *secs,
            Some(FollowPathData {
                speed: Some(speed), ..
            }) if *speed > 0.0 => total_distance / speed,
            _ => match self.total_duration {
                Some(secs) => secs,
                None => total_distance / walking_speed,
            },
        };
        self.total_duration = Some(total_duration);
        self.speeds = lengths
            .iter()
            .map(|length| 1.0 / ((length / total_distance) * total_duration))
            .collect();

        self.points.get(self.target).copied()
    }

    /// Splices `position` into the path when the walker is not where progress
    /// says it should be, so it walks back onto the path from there.
    fn rejoin(&mut self, position: Vec3, rejoin_epsilon_sq: f32) {
        let Some(expected) = self.expected_position() else {
            return;
        };
        if position.distance_squared(expected) <= rejoin_epsilon_sq {
            return;
        }
        let at = if self.fraction > 0.0 {
            self.origin + 1
        } else {
            self.origin
        };
        self.points.insert(at, position);
        self.origin = at;
        self.target = at + 1;
        self.fraction = 0.0;
        trace!("rejoining path at {position} as point {at}");
    }

    /// Advances the walk by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> PathStep {
        let speed = self.speeds.get(self.origin).copied().unwrap_or(0.0);
        self.fraction += dt * speed;
        if !self.fraction.is_finite() {
            self.fraction = 0.0;
        }

        let mut step = PathStep::default();
        match self.policy {
            InterpolationPolicy::DiscreteStop => {
                if self.fraction < 1.0 {
                    step.position = self.lerp();
                    return step;
                }
                step.position = self.points[self.target];
                if !self.advance_vertex(&mut step) {
                    self.fraction = 1.0;
                    return step;
                }
                self.fraction = 0.0;
            }
            InterpolationPolicy::ContinuousCarry => {
                if self.fraction >= 1.0 {
                    let segments = self.fraction.floor().max(1.0);
                    for _ in 0..segments as usize {
                        if !self.advance_vertex(&mut step) {
                            self.fraction = 1.0;
                            step.position = self.points[self.origin];
                            return step;
                        }
                    }
                    self.fraction -= segments;
                }
                step.position = self.lerp();
            }
        }
        step
    }

    /// Moves the origin onto the current target. Returns `false` when the
    /// path ended there.
    fn advance_vertex(&mut self, step: &mut PathStep) -> bool {
        self.origin = self.target;
        self.target += 1;
        if self.target >= self.points.len() {
            if !self.looping {
                self.target = self.origin;
                step.finished = true;
                return false;
            }
            self.target = 0;
        } else {
            step.reached += 1;
        }
        step.look_at = Some(self.points[self.target]);
        true
    }

    fn lerp(&self) -> Vec3 {
        self.points[self.origin].lerp(self.points[self.target], self.fraction)
    }
}

/// Samples a Catmull-Rom spline through `points`, `samples` points per
/// segment. A closed spline doesn't repeat its first point at the end.
pub fn catmull_rom(points: &[Vec3], samples: usize, closed: bool) -> Vec<Vec3> {
    let count = points.len();
    if count < 2 || samples == 0 {
        return points.to_vec();
    }
    let at = |index: isize| -> Vec3 {
        if closed {
            points[index.rem_euclid(count as isize) as usize]
        } else {
            points[index.clamp(0, count as isize - 1) as usize]
        }
    };

    let segments = if closed { count } else { count - 1 };
    let mut curve = Vec::with_capacity(segments * samples + 1);
    for segment in 0..segments as isize {
        let (p0, p1, p2, p3) = (at(segment - 1), at(segment), at(segment + 1), at(segment + 2));
        for sample in 0..samples {
            let t = sample as f32 / samples as f32;
            let t2 = t * t;
            let t3 = t2 * t;
            curve.push(
                0.5 * (2.0 * p1
                    + (p2 - p0) * t
                    + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
                    + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3),
            );
        }
    }
    if !closed {
        curve.push(points[count - 1]);
    }
    curve
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(points: &[Vec3], data: FollowPathData) -> PathFollow {
        let mut path = PathFollow::new(Vec::new());
        path.configure(Some(&data), points[0], 2.0, 0.1);
        path
    }

    #[test]
    fn speeds_share_total_duration_by_segment_length() {
        let path = straight(
            &[Vec3::ZERO, Vec3::X * 2.0, Vec3::X * 3.0],
            FollowPathData::new(vec![Vec3::ZERO, Vec3::X * 2.0, Vec3::X * 3.0]).total_duration(3.0),
        );
        assert_eq!(path.speeds, vec![0.5, 1.0]);
    }

    #[test]
    fn duration_falls_back_to_walking_speed_then_keeps_previous() {
        let points = vec![Vec3::ZERO, Vec3::X * 4.0];
        let mut path = straight(&points, FollowPathData::new(points.clone()));
        assert_eq!(path.total_duration(), Some(2.0));

        path.configure(Some(&FollowPathData::default()), Vec3::ZERO, 8.0, 0.1);
        assert_eq!(path.total_duration(), Some(2.0));

        path.configure(Some(&FollowPathData::default().speed(1.0)), Vec3::ZERO, 8.0, 0.1);
        assert_eq!(path.total_duration(), Some(4.0));
    }

    #[test]
    fn discrete_stop_lands_exactly_and_finishes_once() {
        let points = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)];
        let mut path = straight(&points, FollowPathData::new(points.clone()).total_duration(5.0));
        assert_eq!(path.speeds, vec![0.2]);

        let steps: Vec<PathStep> = (0..4).map(|_| path.step(1.25)).collect();
        assert_eq!(steps[1].position, Vec3::new(0.0, 0.0, 2.5));
        assert_eq!(steps[3].position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(steps.iter().filter(|step| step.finished).count(), 1);
        assert!(steps[3].finished);
        assert_eq!(steps[3].reached, 0);
    }

    #[test]
    fn looping_path_wraps_instead_of_finishing() {
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)];
        let mut path = straight(
            &points,
            FollowPathData::new(points.clone())
                .looping(true)
                .speed(1.0),
        );
        let mut reached = 0;
        for _ in 0..400 {
            let step = path.step(0.05);
            assert!(!step.finished);
            reached += step.reached;
        }
        assert!(reached > 0);
        assert!(path.target() < path.points().len());
    }

    #[test]
    fn continuous_carry_skips_segments_and_keeps_remainder() {
        let points: Vec<Vec3> = (0..5).map(|i| Vec3::X * i as f32).collect();
        let mut path = straight(
            &points,
            FollowPathData::new(points.clone())
                .total_duration(4.0)
                .policy(InterpolationPolicy::ContinuousCarry),
        );

        let step = path.step(2.5);
        assert_eq!(path.origin(), 2);
        assert_eq!(path.target(), 3);
        assert!((path.fraction() - 0.5).abs() < 1e-5);
        assert!((step.position - Vec3::X * 2.5).length() < 1e-5);
        assert_eq!(step.reached, 2);
        assert_eq!(step.look_at, Some(Vec3::X * 3.0));
    }

    #[test]
    fn rejoins_from_off_path_position() {
        let points = vec![Vec3::ZERO, Vec3::X * 4.0];
        let mut path = PathFollow::new(Vec::new());
        let look_at = path.configure(
            Some(&FollowPathData::new(points)),
            Vec3::new(0.0, 0.0, 3.0),
            2.0,
            0.1,
        );
        assert_eq!(path.points()[0], Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(path.points().len(), 3);
        assert_eq!(look_at, Some(Vec3::ZERO));
    }

    #[test]
    fn resuming_on_path_keeps_progress() {
        let points = vec![Vec3::ZERO, Vec3::X * 4.0];
        let mut path = straight(&points, FollowPathData::new(points.clone()));
        let step = path.step(1.0);
        path.configure(None, step.position, 2.0, 0.1);
        assert_eq!(path.points().len(), 2);
        assert!((path.fraction() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn rejects_degenerate_paths() {
        let mut path = PathFollow::new(Vec::new());
        assert!(path.configure(Some(&FollowPathData::new(vec![Vec3::ONE])), Vec3::ONE, 2.0, 0.1).is_none());
        assert!(
            path.configure(Some(&FollowPathData::new(vec![Vec3::ONE, Vec3::ONE])), Vec3::ONE, 2.0, 0.1)
                .is_none()
        );
    }

    #[test]
    fn rejected_path_leaves_the_walk_untouched() {
        let points = vec![Vec3::ZERO, Vec3::X * 4.0];
        let mut path = straight(&points, FollowPathData::new(points.clone()));
        let step = path.step(1.0);

        let single = FollowPathData::new(vec![Vec3::Z]).total_duration(1.0);
        assert!(path.configure(Some(&single), step.position, 2.0, 0.1).is_none());
        assert_eq!(path.points(), points.as_slice());
        assert_eq!(path.total_duration(), Some(2.0));
        assert!((path.fraction() - 0.5).abs() < 1e-5);

        let step = path.step(1.0);
        assert_eq!(step.position, Vec3::X * 4.0);
        assert!(step.finished);
    }

    #[test]
    fn catmull_rom_passes_through_control_points() {
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)];
        let open = catmull_rom(&points, 4, false);
        assert_eq!(open.len(), 2 * 4 + 1);
        assert_eq!(open[0], points[0]);
        assert_eq!(open[4], points[1]);
        assert_eq!(open[8], points[2]);

        let closed = catmull_rom(&points, 4, true);
        assert_eq!(closed.len(), 3 * 4);
        assert_ne!(closed.last(), Some(&points[0]));
    }
}
