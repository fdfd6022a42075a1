use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use chrono::Local;
use gt_core::clock::AnimationClock;
use gt_core::config::GlyphConfig;
use gt_core::traits::{EncodedArtifact, Encoder};

use crate::cli::Cli;
use crate::pipeline::{FramePipeline, TickOutcome, default_capture_path, make_encoder};

/// Attente maximale d'une première frame (source vidéo lente à démarrer).
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(10);

/// Mode sans terminal : snapshot et/ou capture, puis sortie.
///
/// # Errors
/// Returns an error if no frame can be rendered, the capture fails, or the
/// Ctrl-C handler cannot be installed.
pub fn run(cli: &Cli, config: &Arc<ArcSwap<GlyphConfig>>, mut pipeline: FramePipeline) -> Result<()> {
    if let Some(path) = &cli.snapshot {
        snapshot(&mut pipeline, config, path)?;
        println!("{}", path.display());
    }

    if cli.capture.is_some() {
        let path = cli
            .output
            .clone()
            .unwrap_or_else(|| default_capture_path(cli.format, Local::now()));
        let encoder = make_encoder(cli.format, path, config.load().framerate);
        let artifact = capture(&mut pipeline, config, encoder, cli.capture_secs(), |handle| {
            ctrlc::set_handler(move || handle.cancel())
                .context("Impossible d'installer le handler Ctrl-C")
        })?;
        println!("{}", artifact.path.display());
    }
    Ok(())
}

/// Rend jusqu'à la première frame disponible puis l'écrit en PNG.
///
/// # Errors
/// Returns an error if the source stays unavailable or the write fails.
pub fn snapshot(
    pipeline: &mut FramePipeline,
    config: &Arc<ArcSwap<GlyphConfig>>,
    path: &Path,
) -> Result<()> {
    let started = Instant::now();
    loop {
        let snapshot = config.load_full();
        let now_ms = started.elapsed().as_secs_f64() * 1000.0;
        if pipeline.tick(&snapshot, now_ms) == TickOutcome::Rendered {
            return pipeline.snapshot(path);
        }
        if started.elapsed() > FIRST_FRAME_TIMEOUT {
            anyhow::bail!(
                "Aucune frame source après {}s",
                FIRST_FRAME_TIMEOUT.as_secs()
            );
        }
        thread::sleep(pause_for(&snapshot));
    }
}

/// Capture bloquante de `secs` secondes.
///
/// `on_start` reçoit le handle d'annulation (branché sur Ctrl-C par le
/// binaire).
///
/// # Errors
/// Returns the capture error (empty capture, encoder failure) or the error
/// of `on_start`.
pub fn capture(
    pipeline: &mut FramePipeline,
    config: &Arc<ArcSwap<GlyphConfig>>,
    encoder: Box<dyn Encoder>,
    secs: f64,
    on_start: impl FnOnce(gt_export::CaptureHandle) -> Result<()>,
) -> Result<EncodedArtifact> {
    let started = Instant::now();
    let elapsed_ms = || started.elapsed().as_secs_f64() * 1000.0;

    let handle = pipeline.start_capture(encoder, secs, elapsed_ms())?;
    if let Err(e) = on_start(handle) {
        pipeline.cancel_capture();
        let _ = pipeline.finish_capture();
        return Err(e);
    }
    log::info!("Capture headless : {secs:.1}s");

    loop {
        let snapshot = config.load_full();
        let now_ms = elapsed_ms();
        pipeline.tick(&snapshot, now_ms);
        if let Some(outcome) = pipeline.poll_capture(now_ms) {
            return Ok(outcome?);
        }
        thread::sleep(pause_for(&snapshot));
    }
}

/// Quart de l'intervalle de frame : assez fin pour ne pas rater la cadence.
fn pause_for(config: &GlyphConfig) -> Duration {
    Duration::from_secs_f64(AnimationClock::frame_interval_ms(config.framerate) / 4000.0)
}

#[cfg(test)]
mod tests {
    use gt_core::frame::FrameBuffer;
    use gt_core::traits::ArtifactKind;
    use gt_render::BlockGlyphs;
    use gt_source::image::ImageSource;

    use super::*;

    struct Counter(usize);

    impl Encoder for Counter {
        fn accept(&mut self, _frame: &FrameBuffer) -> Result<()> {
            self.0 += 1;
            Ok(())
        }

        fn finalize(self: Box<Self>) -> Result<EncodedArtifact> {
            Ok(EncodedArtifact {
                kind: ArtifactKind::ImageSequence,
                path: "frames".into(),
                frames: self.0,
            })
        }
    }

    fn setup() -> (FramePipeline, Arc<ArcSwap<GlyphConfig>>) {
        let config = GlyphConfig {
            width: 16,
            height: 16,
            tiles_per_row: 4,
            framerate: 60,
            ..GlyphConfig::default()
        };
        let pipeline = FramePipeline::new(
            Box::new(ImageSource::from_frame(FrameBuffer::new(4, 4))),
            Box::new(BlockGlyphs::new()),
        );
        (pipeline, Arc::new(ArcSwap::from_pointee(config)))
    }

    #[test]
    fn capture_runs_for_its_window() {
        let (mut pipeline, config) = setup();
        let artifact = capture(&mut pipeline, &config, Box::new(Counter(0)), 0.2, |_| Ok(())).unwrap();
        assert!(artifact.frames >= 1);
        // 0.2s à 60 fps : au plus 13 ticks.
        assert!(artifact.frames <= 13);
    }

    #[test]
    fn cancel_at_start_reports_empty_capture() {
        let (mut pipeline, config) = setup();
        let result = capture(&mut pipeline, &config, Box::new(Counter(0)), 5.0, |handle| {
            handle.cancel();
            Ok(())
        });
        assert!(result.is_err());
    }

    #[test]
    fn snapshot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, config) = setup();
        let path = dir.path().join("one.png");
        snapshot(&mut pipeline, &config, &path).unwrap();
        assert!(path.is_file());
    }
}
