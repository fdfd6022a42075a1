use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};
use gt_core::frame::FrameBuffer;
use gt_core::traits::{EncodedArtifact, Encoder};
use thiserror::Error;

/// Errors reported by the [`CaptureCoordinator`].
#[derive(Error, Debug)]
pub enum CaptureError {
    /// A capture is already recording or finalizing.
    #[error("Une capture est déjà en cours")]
    InProgress,

    /// The capture ended before any frame was recorded.
    #[error("Capture vide : aucune frame enregistrée")]
    EmptyCapture,

    /// The encoder rejected a frame or failed to finalize.
    #[error(transparent)]
    Encoder(anyhow::Error),

    /// The encoding thread could not start or panicked.
    #[error("Le thread d'encodage a été perdu")]
    WorkerLost,
}

/// Résultat d'une capture terminée.
pub type CaptureOutcome = Result<EncodedArtifact, CaptureError>;

/// État observable du coordinateur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    /// Aucune capture.
    Idle,
    /// Enregistrement des frames composées.
    Capturing,
    /// L'encodeur termine l'artefact.
    Finalizing,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Finalizing => "finalizing",
        })
    }
}

/// Drapeau d'activité partagé avec l'extérieur (touche, Ctrl-C).
///
/// L'annulation est coopérative : elle prend effet au tick suivant.
#[derive(Clone, Debug)]
pub struct CaptureHandle {
    active: Arc<AtomicBool>,
}

impl CaptureHandle {
    /// Arrête l'enregistrement au prochain tick.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    /// `false` une fois annulée ou terminée.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

enum Job {
    Frame(FrameBuffer),
    Finish,
}

struct Session {
    jobs: Sender<Job>,
    worker: JoinHandle<CaptureOutcome>,
    active: Arc<AtomicBool>,
    started_ms: f64,
    duration_ms: f64,
    recorded: usize,
}

enum Phase {
    Idle,
    Capturing(Session),
    Finalizing {
        worker: JoinHandle<CaptureOutcome>,
        recorded: usize,
    },
}

/// Thread d'encodage : reçoit les frames dans l'ordre, puis finalise.
///
/// Sans aucune frame, l'encodeur n'est jamais appelé.
fn encode_all(mut encoder: Box<dyn Encoder>, jobs: &Receiver<Job>) -> CaptureOutcome {
    let mut accepted = 0usize;
    for job in jobs.iter() {
        match job {
            Job::Frame(frame) => {
                encoder.accept(&frame).map_err(CaptureError::Encoder)?;
                accepted += 1;
            }
            Job::Finish => break,
        }
    }
    if accepted == 0 {
        return Err(CaptureError::EmptyCapture);
    }
    encoder.finalize().map_err(CaptureError::Encoder)
}

/// Machine à états Idle → Capturing → Finalizing → Idle.
///
/// Piloté par la boucle de rendu : [`CaptureCoordinator::record`] à chaque
/// tick rendu, [`CaptureCoordinator::poll`] à chaque itération. L'encodeur
/// tourne sur un thread dédié ; le thread de rendu ne bloque jamais.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// use gt_core::traits::{ArtifactKind, EncodedArtifact, Encoder};
/// use gt_export::capture::{CaptureCoordinator, CaptureState};
///
/// struct Count(usize);
/// impl Encoder for Count {
///     fn accept(&mut self, _f: &FrameBuffer) -> anyhow::Result<()> { self.0 += 1; Ok(()) }
///     fn finalize(self: Box<Self>) -> anyhow::Result<EncodedArtifact> {
///         Ok(EncodedArtifact { kind: ArtifactKind::Video, path: "x.mp4".into(), frames: self.0 })
///     }
/// }
///
/// let mut capture = CaptureCoordinator::new();
/// capture.start(1.0, Box::new(Count(0)), 0.0).unwrap();
/// assert_eq!(capture.state(), CaptureState::Capturing);
/// capture.record(&FrameBuffer::new(2, 2), 0.0);
/// let artifact = capture.finish_blocking().unwrap().unwrap();
/// assert_eq!(artifact.frames, 1);
/// assert_eq!(capture.state(), CaptureState::Idle);
/// ```
pub struct CaptureCoordinator {
    phase: Phase,
}

impl Default for CaptureCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureCoordinator {
    /// Create an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CaptureState {
        match self.phase {
            Phase::Idle => CaptureState::Idle,
            Phase::Capturing(_) => CaptureState::Capturing,
            Phase::Finalizing { .. } => CaptureState::Finalizing,
        }
    }

    /// Frames enregistrées par la capture en cours (0 si Idle).
    #[must_use]
    pub fn recorded_frames(&self) -> usize {
        match &self.phase {
            Phase::Idle => 0,
            Phase::Capturing(session) => session.recorded,
            Phase::Finalizing { recorded, .. } => *recorded,
        }
    }

    /// Secondes restantes de la fenêtre de capture.
    #[must_use]
    pub fn remaining_secs(&self, now_ms: f64) -> Option<f64> {
        match &self.phase {
            Phase::Capturing(session) => {
                Some(((session.started_ms + session.duration_ms - now_ms) / 1000.0).max(0.0))
            }
            _ => None,
        }
    }

    /// Démarre une capture de `duration_secs` secondes à partir de `now_ms`.
    ///
    /// # Errors
    /// [`CaptureError::InProgress`] if a capture is active (its state is left
    /// untouched), [`CaptureError::WorkerLost`] if the encoding thread cannot
    /// be spawned.
    pub fn start(
        &mut self,
        duration_secs: f64,
        encoder: Box<dyn Encoder>,
        now_ms: f64,
    ) -> Result<CaptureHandle, CaptureError> {
        if !matches!(self.phase, Phase::Idle) {
            log::warn!("Capture refusée : état {}", self.state());
            return Err(CaptureError::InProgress);
        }
        let (jobs, rx) = flume::unbounded();
        let worker = thread::Builder::new()
            .name("gt-capture".to_string())
            .spawn(move || encode_all(encoder, &rx))
            .map_err(|e| {
                log::error!("Impossible de lancer le thread d'encodage : {e}");
                CaptureError::WorkerLost
            })?;

        let active = Arc::new(AtomicBool::new(true));
        self.phase = Phase::Capturing(Session {
            jobs,
            worker,
            active: Arc::clone(&active),
            started_ms: now_ms,
            duration_ms: duration_secs.max(0.0) * 1000.0,
            recorded: 0,
        });
        log::debug!("Capture : idle → capturing ({duration_secs:.1}s)");
        Ok(CaptureHandle { active })
    }

    /// Enregistre une frame composée si la fenêtre de capture est ouverte.
    ///
    /// Retourne `true` si la frame a été enregistrée.
    pub fn record(&mut self, frame: &FrameBuffer, now_ms: f64) -> bool {
        self.check_window(now_ms);
        let Phase::Capturing(session) = &mut self.phase else {
            return false;
        };
        if session.jobs.send(Job::Frame(frame.clone())).is_err() {
            // Thread d'encodage déjà terminé (échec d'accept).
            self.begin_finalize();
            return false;
        }
        session.recorded += 1;
        true
    }

    /// Fait avancer la machine à états sans enregistrer.
    ///
    /// Retourne le résultat une seule fois, quand la finalisation se termine.
    pub fn poll(&mut self, now_ms: f64) -> Option<CaptureOutcome> {
        self.check_window(now_ms);
        let done = matches!(&self.phase, Phase::Finalizing { worker, .. } if worker.is_finished());
        if done { self.join() } else { None }
    }

    /// Termine la capture en cours et attend l'encodeur.
    ///
    /// `None` si aucune capture n'était active.
    pub fn finish_blocking(&mut self) -> Option<CaptureOutcome> {
        self.begin_finalize();
        self.join()
    }

    fn check_window(&mut self, now_ms: f64) {
        if let Phase::Capturing(session) = &self.phase {
            let cancelled = !session.active.load(Ordering::Relaxed);
            let elapsed = now_ms - session.started_ms >= session.duration_ms;
            if cancelled || elapsed {
                if cancelled {
                    log::debug!("Capture annulée après {} frames", session.recorded);
                }
                self.begin_finalize();
            }
        }
    }

    fn begin_finalize(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Capturing(session) => {
                session.active.store(false, Ordering::Relaxed);
                // Erreur = thread déjà terminé ; join() en rapportera la cause.
                let _ = session.jobs.send(Job::Finish);
                log::debug!("Capture : capturing → finalizing ({} frames)", session.recorded);
                self.phase = Phase::Finalizing {
                    worker: session.worker,
                    recorded: session.recorded,
                };
            }
            other => self.phase = other,
        }
    }

    fn join(&mut self) -> Option<CaptureOutcome> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Finalizing { worker, recorded } => {
                let outcome = worker.join().unwrap_or(Err(CaptureError::WorkerLost));
                match &outcome {
                    Ok(artifact) => log::info!(
                        "Capture terminée : {} ({} frames)",
                        artifact.path.display(),
                        artifact.frames
                    ),
                    Err(e) => log::warn!("Capture échouée après {recorded} frames : {e}"),
                }
                log::debug!("Capture : finalizing → idle");
                Some(outcome)
            }
            other => {
                self.phase = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use gt_core::traits::ArtifactKind;

    use super::*;

    #[derive(Default)]
    struct Calls {
        accepted: Vec<u8>,
        finalized: bool,
    }

    struct Mock {
        calls: Arc<Mutex<Calls>>,
        fail_accept: bool,
        fail_finalize: bool,
    }

    impl Mock {
        fn boxed(calls: &Arc<Mutex<Calls>>) -> Box<Self> {
            Box::new(Self {
                calls: Arc::clone(calls),
                fail_accept: false,
                fail_finalize: false,
            })
        }
    }

    impl Encoder for Mock {
        fn accept(&mut self, frame: &FrameBuffer) -> anyhow::Result<()> {
            if self.fail_accept {
                anyhow::bail!("disk full");
            }
            self.calls.lock().unwrap().accepted.push(frame.data[0]);
            Ok(())
        }

        fn finalize(self: Box<Self>) -> anyhow::Result<EncodedArtifact> {
            let mut calls = self.calls.lock().unwrap();
            calls.finalized = true;
            if self.fail_finalize {
                anyhow::bail!("muxer crashed");
            }
            Ok(EncodedArtifact {
                kind: ArtifactKind::Video,
                path: "out.mp4".into(),
                frames: calls.accepted.len(),
            })
        }
    }

    fn marked(value: u8) -> FrameBuffer {
        let mut fb = FrameBuffer::new(1, 1);
        fb.fill([value, 0, 0, 255]);
        fb
    }

    #[test]
    fn second_start_is_rejected_without_side_effects() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut capture = CaptureCoordinator::new();
        capture.start(10.0, Mock::boxed(&calls), 0.0).unwrap();
        capture.record(&marked(1), 0.0);
        capture.record(&marked(2), 40.0);

        let other = Arc::new(Mutex::new(Calls::default()));
        assert!(matches!(
            capture.start(10.0, Mock::boxed(&other), 50.0),
            Err(CaptureError::InProgress)
        ));
        assert_eq!(capture.state(), CaptureState::Capturing);
        assert_eq!(capture.recorded_frames(), 2);

        let artifact = capture.finish_blocking().unwrap().unwrap();
        assert_eq!(artifact.frames, 2);
        assert_eq!(calls.lock().unwrap().accepted, [1, 2]);
        assert!(other.lock().unwrap().accepted.is_empty());
    }

    /// Bloque chaque `accept` jusqu'à ce que le test libère la porte.
    struct Gated {
        gate: Receiver<()>,
        frames: usize,
    }

    impl Encoder for Gated {
        fn accept(&mut self, _frame: &FrameBuffer) -> anyhow::Result<()> {
            self.gate.recv()?;
            self.frames += 1;
            Ok(())
        }

        fn finalize(self: Box<Self>) -> anyhow::Result<EncodedArtifact> {
            Ok(EncodedArtifact {
                kind: ArtifactKind::Video,
                path: "slow.mp4".into(),
                frames: self.frames,
            })
        }
    }

    #[test]
    fn start_is_rejected_while_finalizing() {
        let (release, gate) = flume::unbounded();
        let mut capture = CaptureCoordinator::new();
        let handle = capture
            .start(10.0, Box::new(Gated { gate, frames: 0 }), 0.0)
            .unwrap();
        assert!(capture.record(&marked(1), 0.0));
        handle.cancel();

        assert!(capture.poll(10.0).is_none());
        assert_eq!(capture.state(), CaptureState::Finalizing);

        let calls = Arc::new(Mutex::new(Calls::default()));
        assert!(matches!(
            capture.start(1.0, Mock::boxed(&calls), 20.0),
            Err(CaptureError::InProgress)
        ));
        assert_eq!(capture.state(), CaptureState::Finalizing);
        assert_eq!(capture.recorded_frames(), 1);

        release.send(()).unwrap();
        let artifact = capture.finish_blocking().unwrap().unwrap();
        assert_eq!(artifact.frames, 1);
        assert_eq!(artifact.path, std::path::PathBuf::from("slow.mp4"));
        assert!(calls.lock().unwrap().accepted.is_empty());
    }

    #[test]
    fn cancelled_before_any_tick_is_empty() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut capture = CaptureCoordinator::new();
        let handle = capture.start(5.0, Mock::boxed(&calls), 0.0).unwrap();
        handle.cancel();
        assert!(!capture.record(&marked(1), 10.0));
        assert_eq!(capture.state(), CaptureState::Finalizing);

        let outcome = capture.finish_blocking().unwrap();
        assert!(matches!(outcome, Err(CaptureError::EmptyCapture)));
        let calls = calls.lock().unwrap();
        assert!(calls.accepted.is_empty());
        assert!(!calls.finalized);
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn window_closes_after_duration() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut capture = CaptureCoordinator::new();
        let handle = capture.start(1.0, Mock::boxed(&calls), 1000.0).unwrap();
        assert!(capture.record(&marked(1), 1000.0));
        assert!(capture.record(&marked(2), 1500.0));
        assert!(capture.record(&marked(3), 1999.0));
        assert!(!capture.record(&marked(4), 2000.0));
        assert!(!handle.is_active());
        assert_eq!(capture.state(), CaptureState::Finalizing);
        assert_eq!(capture.finish_blocking().unwrap().unwrap().frames, 3);
    }

    #[test]
    fn cancellation_keeps_partial_frames() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut capture = CaptureCoordinator::new();
        let handle = capture.start(60.0, Mock::boxed(&calls), 0.0).unwrap();
        capture.record(&marked(7), 0.0);
        capture.record(&marked(8), 40.0);
        handle.cancel();
        assert!(!capture.record(&marked(9), 80.0));
        let artifact = capture.finish_blocking().unwrap().unwrap();
        assert_eq!(artifact.frames, 2);
        assert!(calls.lock().unwrap().finalized);
    }

    #[test]
    fn encoder_failure_returns_to_idle() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut capture = CaptureCoordinator::new();
        let encoder = Box::new(Mock {
            calls: Arc::clone(&calls),
            fail_accept: false,
            fail_finalize: true,
        });
        capture.start(1.0, encoder, 0.0).unwrap();
        capture.record(&marked(1), 0.0);
        let err = capture.finish_blocking().unwrap().unwrap_err();
        assert!(matches!(err, CaptureError::Encoder(_)));
        assert_eq!(err.to_string(), "muxer crashed");
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.start(1.0, Mock::boxed(&calls), 0.0).is_ok());
    }

    #[test]
    fn accept_failure_is_surfaced() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut capture = CaptureCoordinator::new();
        let encoder = Box::new(Mock {
            calls: Arc::clone(&calls),
            fail_accept: true,
            fail_finalize: false,
        });
        capture.start(1.0, encoder, 0.0).unwrap();
        capture.record(&marked(1), 0.0);
        let err = capture.finish_blocking().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(!calls.lock().unwrap().finalized);
    }

    #[test]
    fn poll_reports_completion_once() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut capture = CaptureCoordinator::new();
        capture.start(0.1, Mock::boxed(&calls), 0.0).unwrap();
        capture.record(&marked(1), 0.0);
        let remaining = capture.remaining_secs(50.0).unwrap();
        assert!((remaining - 0.05).abs() < 1e-9);

        let mut outcome = None;
        for _ in 0..200 {
            outcome = capture.poll(100.0);
            if outcome.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(outcome.unwrap().unwrap().frames, 1);
        assert!(capture.poll(200.0).is_none());
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn idle_coordinator_ignores_frames() {
        let mut capture = CaptureCoordinator::new();
        assert!(!capture.record(&marked(1), 0.0));
        assert!(capture.finish_blocking().is_none());
        assert_eq!(capture.state().to_string(), "idle");
    }
}
