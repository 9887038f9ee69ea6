//! Skier descent: follows the steepest downhill direction one unit per step,
//! then heads straight for the shelter once inside its basin.

use crate::heightfield::HeightField;

const ARRIVAL_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkierStatus {
    Arrived,
    Moving,
    /// Zero gradient outside the shelter basin
    Stuck,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkierOutcome {
    pub status: SkierStatus,
    pub steps: usize,
}

#[derive(Clone, Debug)]
pub struct Skier {
    position: (f64, f64),
    history: Vec<(f64, f64)>,
}

impl Skier {
    pub fn new(start: (f64, f64)) -> Self {
        Self {
            position: start,
            history: vec![start],
        }
    }

    /// A skier at `(x, y)`, or `None` if that cell is too low to start from.
    pub fn launch(field: &HeightField, x: i32, y: i32) -> Option<Self> {
        field
            .is_valid_start(x, y)
            .then(|| Self::new((x as f64, y as f64)))
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    /// Every position visited, starting point first.
    pub fn history(&self) -> &[(f64, f64)] {
        &self.history
    }

    pub fn step(&mut self, field: &HeightField) -> SkierStatus {
        let (sx, sy) = field.shelter_coords();
        let shelter = (sx as f64, sy as f64);
        let to_shelter = (shelter.0 - self.position.0, shelter.1 - self.position.1);
        let distance = to_shelter.0.hypot(to_shelter.1);
        if distance < ARRIVAL_EPSILON {
            return SkierStatus::Arrived;
        }

        let cx = self.position.0.floor() as i32;
        let cy = self.position.1.floor() as i32;

        self.position = if field.is_in_global_minimum_basin(cx, cy) {
            if distance > 1.0 {
                (
                    self.position.0 + to_shelter.0 / distance,
                    self.position.1 + to_shelter.1 / distance,
                )
            } else {
                shelter
            }
        } else {
            let (gx, gy) = field.get_gradient(cx, cy);
            let norm = (gx as f64).hypot(gy as f64);
            if norm <= 0.0 {
                return SkierStatus::Stuck;
            }
            (self.position.0 - gx as f64 / norm, self.position.1 - gy as f64 / norm)
        };
        self.history.push(self.position);
        SkierStatus::Moving
    }

    /// Step until the skier arrives, gets stuck, or `max_steps` moves are made.
    pub fn run(&mut self, field: &HeightField, max_steps: usize) -> SkierOutcome {
        let mut steps = 0;
        loop {
            let status = self.step(field);
            if status != SkierStatus::Moving {
                return SkierOutcome { status, steps };
            }
            steps += 1;
            if steps >= max_steps {
                return SkierOutcome { status, steps };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Tilemap;

    /// Cone with its tip at (2, 2), flat at zero there.
    fn cone() -> HeightField {
        let altitude = Tilemap::from_fn(9, 9, |x, y| {
            let dx = x as f32 - 2.0;
            let dy = y as f32 - 2.0;
            (dx * dx + dy * dy).sqrt() * 20.0
        });
        HeightField::new(altitude, (2, 2), 100.0)
    }

    #[test]
    fn test_launch_needs_high_ground() {
        let field = cone();
        assert!(Skier::launch(&field, 2, 2).is_none());
        assert!(Skier::launch(&field, 30, 30).is_none());
        let skier = Skier::launch(&field, 8, 8).unwrap();
        assert_eq!(skier.position(), (8.0, 8.0));
        assert_eq!(skier.history().len(), 1);
    }

    #[test]
    fn test_descends_to_shelter() {
        let field = cone();
        let mut skier = Skier::launch(&field, 8, 8).unwrap();
        let outcome = skier.run(&field, 100);
        assert_eq!(outcome.status, SkierStatus::Arrived);
        assert_eq!(skier.position(), (2.0, 2.0));
        assert_eq!(skier.history().len(), outcome.steps + 1);

        let first = skier.history()[0];
        let second = skier.history()[1];
        assert!(second.0 < first.0 && second.1 < first.1);
    }

    #[test]
    fn test_stuck_on_plateau() {
        let altitude = Tilemap::new_with(5, 5, 200.0f32);
        let mut field = HeightField::new(altitude, (0, 0), 100.0);
        // Lower the shelter so the plateau is not part of its basin
        let params = crate::config::ToolConfig {
            radius: 0,
            excavator_depth: 50.0,
            ..Default::default()
        };
        assert!(field.apply_tool(crate::tools::ToolKind::Excavator, &params, 0, 0));

        let mut skier = Skier::launch(&field, 4, 4).unwrap();
        let outcome = skier.run(&field, 10);
        assert_eq!(outcome.status, SkierStatus::Stuck);
        assert_eq!(outcome.steps, 0);
    }

    #[test]
    fn test_step_cap() {
        let field = cone();
        let mut skier = Skier::new((8.0, 8.0));
        let outcome = skier.run(&field, 2);
        assert_eq!(outcome, SkierOutcome { status: SkierStatus::Moving, steps: 2 });
    }
}
