//! Game session: one map, one start point, a limited set of tool charges,
//! and the path cost the player is trying to beat.

use crate::config::{PathfindingConfig, ToolCharges, ToolConfig};
use crate::heightfield::HeightField;
use crate::pathfinding::{find_path, Path};
use crate::tools::ToolKind;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToolOutcome {
    /// No charges left for this tool; the map is untouched
    NoCharges,
    /// The map changed and a charge was spent
    Applied { current_cost: f64 },
    /// The tool changed nothing (e.g. entirely off the map); no charge spent
    NoEffect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Current route is strictly cheaper than the baseline
    Improved,
    NotImproved,
    /// No route from start to shelter exists any more
    Unreachable,
}

pub struct GameSession {
    field: HeightField,
    pathfinding: PathfindingConfig,
    tool: ToolConfig,
    initial_charges: ToolCharges,
    charges: ToolCharges,
    start: (usize, usize),
    baseline: Path,
    current: Path,
}

impl GameSession {
    pub fn new(
        field: HeightField,
        start: (usize, usize),
        pathfinding: PathfindingConfig,
        tool: ToolConfig,
        charges: ToolCharges,
    ) -> Self {
        let baseline = find_path(&field, start, field.shelter_coords(), &pathfinding);
        log::info!("Cost to beat from {:?}: {:.2}", start, baseline.total_cost);
        Self {
            field,
            pathfinding,
            tool,
            initial_charges: charges,
            charges,
            start,
            current: baseline.clone(),
            baseline,
        }
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn start(&self) -> (usize, usize) {
        self.start
    }

    pub fn end(&self) -> (usize, usize) {
        self.field.shelter_coords()
    }

    pub fn baseline(&self) -> &Path {
        &self.baseline
    }

    pub fn current(&self) -> &Path {
        &self.current
    }

    pub fn charges(&self) -> ToolCharges {
        self.charges
    }

    pub fn charges_left(&self, kind: ToolKind) -> u32 {
        *charge_slot(&self.charges, kind)
    }

    pub fn apply_tool(&mut self, kind: ToolKind, x: i32, y: i32) -> ToolOutcome {
        if self.charges_left(kind) == 0 {
            return ToolOutcome::NoCharges;
        }
        if !self.field.apply_tool(kind, &self.tool, x, y) {
            return ToolOutcome::NoEffect;
        }

        *charge_slot_mut(&mut self.charges, kind) -= 1;
        self.current = find_path(&self.field, self.start, self.end(), &self.pathfinding);
        log::info!(
            "{} at ({}, {}): cost {:.2} (baseline {:.2})",
            kind,
            x,
            y,
            self.current.total_cost,
            self.baseline.total_cost
        );
        ToolOutcome::Applied {
            current_cost: self.current.total_cost,
        }
    }

    pub fn verdict(&self) -> Verdict {
        if !self.current.is_valid() {
            Verdict::Unreachable
        } else if self.current.total_cost < self.baseline.total_cost {
            Verdict::Improved
        } else {
            Verdict::NotImproved
        }
    }

    /// Swap in a new map, recompute the baseline and restore all charges.
    pub fn reset_map(&mut self, field: HeightField) {
        self.field = field;
        self.charges = self.initial_charges;
        self.baseline = find_path(&self.field, self.start, self.end(), &self.pathfinding);
        self.current = self.baseline.clone();
        log::info!("Map reset; cost to beat {:.2}", self.baseline.total_cost);
    }
}

fn charge_slot(charges: &ToolCharges, kind: ToolKind) -> &u32 {
    match kind {
        ToolKind::Excavator => &charges.excavator,
        ToolKind::Filler => &charges.filler,
        ToolKind::Grader => &charges.grader,
    }
}

fn charge_slot_mut(charges: &mut ToolCharges, kind: ToolKind) -> &mut u32 {
    match kind {
        ToolKind::Excavator => &mut charges.excavator,
        ToolKind::Filler => &mut charges.filler,
        ToolKind::Grader => &mut charges.grader,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Tilemap;

    /// Flat at 100 with a ridge across row 3 and the shelter at the bottom.
    fn ridge_field() -> HeightField {
        let altitude = Tilemap::from_fn(9, 9, |x, y| {
            if (x, y) == (4, 8) {
                0.0
            } else if y == 3 {
                180.0
            } else {
                100.0
            }
        });
        HeightField::new(altitude, (4, 8), 90.0)
    }

    fn session(charges: ToolCharges) -> GameSession {
        let tool = ToolConfig {
            radius: 2,
            excavator_depth: 80.0,
            ..Default::default()
        };
        GameSession::new(ridge_field(), (4, 0), PathfindingConfig::default(), tool, charges)
    }

    #[test]
    fn test_baseline_computed_on_start() {
        let s = session(ToolCharges::default());
        assert!(s.baseline().is_valid());
        assert_eq!(s.baseline(), s.current());
        assert_eq!(s.end(), (4, 8));
        assert_eq!(s.verdict(), Verdict::NotImproved);
    }

    #[test]
    fn test_excavating_the_ridge_improves() {
        let mut s = session(ToolCharges::default());
        let baseline = s.baseline().total_cost;

        match s.apply_tool(ToolKind::Excavator, 4, 3) {
            ToolOutcome::Applied { current_cost } => assert!(current_cost < baseline),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(s.charges_left(ToolKind::Excavator), 2);
        assert_eq!(s.verdict(), Verdict::Improved);
    }

    #[test]
    fn test_charges_run_out() {
        let charges = ToolCharges {
            excavator: 1,
            filler: 0,
            grader: 1,
        };
        let mut s = session(charges);
        assert_eq!(s.apply_tool(ToolKind::Filler, 4, 4), ToolOutcome::NoCharges);
        assert!(matches!(s.apply_tool(ToolKind::Excavator, 2, 3), ToolOutcome::Applied { .. }));
        assert_eq!(s.apply_tool(ToolKind::Excavator, 6, 3), ToolOutcome::NoCharges);
    }

    #[test]
    fn test_off_map_tool_spends_nothing() {
        let mut s = session(ToolCharges::default());
        assert_eq!(s.apply_tool(ToolKind::Filler, 100, 100), ToolOutcome::NoEffect);
        assert_eq!(s.charges(), ToolCharges::default());
    }

    #[test]
    fn test_reset_restores_charges_and_baseline() {
        let mut s = session(ToolCharges::default());
        s.apply_tool(ToolKind::Excavator, 4, 3);
        assert_eq!(s.verdict(), Verdict::Improved);

        s.reset_map(ridge_field());
        assert_eq!(s.charges(), ToolCharges::default());
        assert_eq!(s.baseline(), s.current());
        assert_eq!(s.verdict(), Verdict::NotImproved);
    }
}
