/// Incrément de temps de simulation par tick rendu, à `motion_speed = 1`.
pub const TIME_STEP: f64 = 0.01;

/// Horloge d'animation cadencée, indépendante du rafraîchissement de l'affichage.
///
/// Le driver appelle [`AnimationClock::tick`] à chaque rafraîchissement avec un
/// horodatage en millisecondes. Un tick arrivé avant `1000 / framerate` ms
/// depuis le dernier tick rendu est ignoré entièrement.
///
/// # Example
/// ```
/// use gt_core::clock::AnimationClock;
/// let mut clock = AnimationClock::new();
/// assert!(clock.tick(0.0, 24, 1.0).is_some());
/// assert!(clock.tick(10.0, 24, 1.0).is_none());
/// assert!(clock.tick(42.0, 24, 1.0).is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct AnimationClock {
    /// Temps de simulation accumulé.
    time: f64,
    /// Ancre du dernier tick rendu (ms), alignée sur la grille de cadence.
    anchor_ms: Option<f64>,
    /// Nombre de ticks rendus depuis la création.
    rendered: u64,
    paused: bool,
}

impl AnimationClock {
    /// Create a clock at simulation time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Durée minimale entre deux ticks rendus, en millisecondes.
    #[must_use]
    pub fn frame_interval_ms(framerate: u32) -> f64 {
        1000.0 / f64::from(framerate.max(1))
    }

    /// Avance l'horloge si le tick doit être rendu.
    ///
    /// Retourne le nouveau temps de simulation, ou `None` si le tick est
    /// sauté (trop tôt ou en pause).
    pub fn tick(&mut self, now_ms: f64, framerate: u32, motion_speed: f32) -> Option<f64> {
        if self.paused {
            return None;
        }
        let interval = Self::frame_interval_ms(framerate);
        match self.anchor_ms {
            Some(anchor) => {
                let elapsed = now_ms - anchor;
                if elapsed < interval {
                    return None;
                }
                self.anchor_ms = Some(now_ms - elapsed % interval);
            }
            None => self.anchor_ms = Some(now_ms),
        }
        self.time += TIME_STEP * f64::from(motion_speed);
        self.rendered += 1;
        Some(self.time)
    }

    /// Current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of ticks that were rendered.
    #[must_use]
    pub fn rendered_ticks(&self) -> u64 {
        self.rendered
    }

    /// Met à jour l'état de pause.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// `true` si l'horloge est en pause.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_early_ticks_without_advancing() {
        let mut clock = AnimationClock::new();
        clock.tick(0.0, 10, 1.0);
        let t = clock.time();
        assert!(clock.tick(50.0, 10, 1.0).is_none());
        assert!((clock.time() - t).abs() < f64::EPSILON);
        assert_eq!(clock.rendered_ticks(), 1);
    }

    #[test]
    fn anchor_keeps_cadence_without_drift() {
        let mut clock = AnimationClock::new();
        clock.tick(0.0, 10, 1.0);
        // 130 ms écoulées : l'ancre retombe sur 100, pas 130.
        assert!(clock.tick(130.0, 10, 1.0).is_some());
        assert!(clock.tick(190.0, 10, 1.0).is_none());
        assert!(clock.tick(200.0, 10, 1.0).is_some());
    }

    #[test]
    fn motion_speed_scales_time() {
        let mut clock = AnimationClock::new();
        clock.tick(0.0, 24, 2.0);
        assert!((clock.time() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn paused_clock_renders_nothing() {
        let mut clock = AnimationClock::new();
        clock.set_paused(true);
        assert!(clock.tick(1000.0, 24, 1.0).is_none());
        assert!(clock.is_paused());
        clock.set_paused(false);
        assert!(clock.tick(1000.0, 24, 1.0).is_some());
    }
}
