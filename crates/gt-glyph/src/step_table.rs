use gt_core::config::Step;
use gt_core::error::CoreError;

/// Table de correspondance luminance → step, 256 entrées.
///
/// Construite en deux phases, pour chaque niveau `g` :
/// 1. premier step (dans l'ordre stocké) dont `[min_gray, max_gray]` contient `g` ;
/// 2. sinon (trou), step dont le centre `(min + max) / 2` est le plus proche
///    de `g`, le premier rencontré gagnant en cas d'égalité.
///
/// La table est une fonction pure de la liste de steps.
///
/// # Example
/// ```
/// use gt_core::config::default_steps;
/// use gt_glyph::step_table::StepTable;
///
/// let table = StepTable::build(&default_steps()).unwrap();
/// assert_eq!(table.lookup(0).name, "Black");
/// assert_eq!(table.lookup(200).name, "Very Light");
/// assert_eq!(table.lookup(255).name, "White");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepTable {
    steps: Vec<Step>,
    index: [usize; 256],
}

impl StepTable {
    /// Build the table for a step list.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptySteps`] if `steps` is empty.
    pub fn build(steps: &[Step]) -> Result<Self, CoreError> {
        if steps.is_empty() {
            return Err(CoreError::EmptySteps);
        }
        let mut index = [0usize; 256];
        for (gray, slot) in index.iter_mut().enumerate() {
            let gray = gray as u8;
            *slot = steps
                .iter()
                .position(|s| s.contains(gray))
                .unwrap_or_else(|| nearest_center(steps, gray));
        }
        log::debug!("Table de steps reconstruite ({} steps)", steps.len());
        Ok(Self {
            steps: steps.to_vec(),
            index,
        })
    }

    /// Step for a brightness level.
    #[inline(always)]
    #[must_use]
    pub fn lookup(&self, gray: u8) -> &Step {
        &self.steps[self.index[gray as usize]]
    }

    /// Index (in the step list) of the step for a brightness level.
    #[inline(always)]
    #[must_use]
    pub fn index_of(&self, gray: u8) -> usize {
        self.index[gray as usize]
    }

    /// Steps the table was built from.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// Index du step au centre le plus proche de `gray` ; égalité → le premier.
fn nearest_center(steps: &[Step], gray: u8) -> usize {
    let target = f32::from(gray);
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, step) in steps.iter().enumerate() {
        let distance = (step.center() - target).abs();
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_core::color::Rgb;
    use gt_core::config::default_steps;

    fn step(name: &str, min: u8, max: u8) -> Step {
        Step::new(name, '#', Rgb::WHITE, Rgb::BLACK, min, max)
    }

    #[test]
    fn every_level_resolves_for_default_steps() {
        let steps = default_steps();
        let table = StepTable::build(&steps).unwrap();
        for g in 0..=255u8 {
            assert!(table.lookup(g).contains(g), "niveau {g}");
        }
        assert_eq!(table.lookup(42).name, "Black");
        assert_eq!(table.lookup(43).name, "Dark");
        assert_eq!(table.lookup(128).name, "Medium");
    }

    #[test]
    fn gap_resolves_to_nearest_center() {
        let table = StepTable::build(&[step("low", 0, 10), step("high", 20, 30)]).unwrap();
        assert_eq!(table.lookup(15).name, "low");
        assert_eq!(table.lookup(16).name, "high");
        // Au-delà de toutes les plages.
        assert_eq!(table.lookup(255).name, "high");
    }

    #[test]
    fn gap_tie_keeps_first_step() {
        // Centres 5 et 25 : 15 est à égale distance.
        let table = StepTable::build(&[step("b", 20, 30), step("a", 0, 10)]).unwrap();
        assert_eq!(table.lookup(15).name, "b");
    }

    #[test]
    fn overlap_resolves_to_first_defined() {
        let table = StepTable::build(&[step("wide", 0, 200), step("narrow", 100, 110)]).unwrap();
        assert_eq!(table.lookup(105).name, "wide");
        let table = StepTable::build(&[step("narrow", 100, 110), step("wide", 0, 200)]).unwrap();
        assert_eq!(table.lookup(105).name, "narrow");
    }

    #[test]
    fn build_is_deterministic() {
        let steps = vec![step("a", 30, 60), step("b", 50, 90), step("c", 200, 210)];
        let a = StepTable::build(&steps).unwrap();
        let b = StepTable::build(&steps.clone()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_steps_rejected() {
        assert!(matches!(StepTable::build(&[]), Err(CoreError::EmptySteps)));
    }
}
