use std::collections::VecDeque;

/// Cadence mesurée des ticks rendus, par fenêtre glissante.
///
/// Alimenté avec les horodatages (ms) des ticks effectivement rendus, pas
/// avec ceux du rafraîchissement de l'affichage.
///
/// # Example
/// ```
/// use gt_render::meter::TickMeter;
/// let mut meter = TickMeter::new(8);
/// for i in 0..8 {
///     meter.record(f64::from(i) * 50.0);
/// }
/// assert!((meter.rate() - 20.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct TickMeter {
    stamps: VecDeque<f64>,
    window: usize,
}

impl TickMeter {
    /// Create a meter averaging over `window` ticks.
    #[must_use]
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            stamps: VecDeque::with_capacity(window + 1),
            window,
        }
    }

    /// Enregistre un tick rendu à `now_ms`.
    pub fn record(&mut self, now_ms: f64) {
        self.stamps.push_back(now_ms);
        if self.stamps.len() > self.window {
            self.stamps.pop_front();
        }
    }

    /// Ticks par seconde sur la fenêtre, 0 tant qu'il n'y a pas deux ticks.
    #[must_use]
    pub fn rate(&self) -> f64 {
        match (self.stamps.front(), self.stamps.back()) {
            (Some(first), Some(last)) if last > first => {
                (self.stamps.len() - 1) as f64 * 1000.0 / (last - first)
            }
            _ => 0.0,
        }
    }

    /// Oublie l'historique (après une pause).
    pub fn reset(&mut self) {
        self.stamps.clear();
    }
}
