// Décodage vidéo via subprocess `ffmpeg` (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
//   - `probe_video`       : ffprobe → width/height/fps
//   - `spawn_ffmpeg_pipe` : ffmpeg → RGBA brut sur stdout, en boucle
//   - `spawn_video_thread`: thread dédié, lit les frames, gère les commandes
//   - `VideoSource`       : côté rendu, garde la dernière frame reçue

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use flume::{Receiver, Sender, TryRecvError};
use gt_core::config::InputMode;
use gt_core::frame::FrameBuffer;
use gt_core::identity::{FrameIdentity, SourceKey};
use gt_core::traits::{FrameSource, SourceFrame};

use crate::resize::Stretcher;

/// Taille du pool de frames pré-allouées (> capacité du canal).
const POOL_SIZE: usize = 6;
/// Capacité du canal de frames décodées.
const FRAME_CHANNEL: usize = 3;

/// Commandes envoyées au thread vidéo.
///
/// # Example
/// ```
/// use gt_source::video::VideoCommand;
/// let cmd = VideoCommand::Resize(640, 360);
/// assert!(matches!(cmd, VideoCommand::Resize(640, _)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCommand {
    /// Reprendre la lecture.
    Play,
    /// Mettre en pause.
    Pause,
    /// Changer la taille de sortie (redémarre ffmpeg à la position courante).
    Resize(u32, u32),
    /// Arrêter le thread.
    Quit,
}

/// Frame décodée et sa position de lecture.
#[derive(Clone, Debug)]
pub struct DecodedFrame {
    /// Pixels RGBA aux dimensions demandées.
    pub buffer: Arc<FrameBuffer>,
    /// Position de lecture en microsecondes.
    pub position_us: u64,
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    /// Native width.
    pub width: u32,
    /// Native height.
    pub height: u32,
    /// Images par seconde.
    pub fps: f64,
}

/// Interprète la sortie `default=noprint_wrappers=1` de ffprobe.
///
/// # Example
/// ```
/// use gt_source::video::parse_probe;
/// let info = parse_probe("width=640\nheight=360\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (640, 360));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
#[must_use]
pub fn parse_probe(text: &str) -> Option<VideoInfo> {
    let mut width = None;
    let mut height = None;
    let mut fps = 30.0;
    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        }
    }
    match (width, height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            Some(VideoInfo { width, height, fps })
        }
        _ => None,
    }
}

/// Interroge `ffprobe` sur le premier flux vidéo de `path`.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier ne
/// contient aucun flux vidéo.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context("Impossible de lancer ffprobe. Vérifiez qu'il est installé et dans le PATH.")?;

    let info = parse_probe(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("Aucun flux vidéo dans {}", path.display()))?;
    log::info!(
        "Vidéo : {}x{} @ {:.3}fps, {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Lance `ffmpeg` en boucle infinie (`-stream_loop -1`), RGBA brut sur stdout,
/// étiré à `w × h`.
///
/// Retourne `None` si le spawn échoue.
#[must_use]
pub fn spawn_ffmpeg_pipe(path: &Path, w: u32, h: u32, pos_secs: f64, fps: u32) -> Option<Child> {
    let Some(path_str) = path.to_str() else {
        log::warn!("spawn_ffmpeg_pipe: chemin non-UTF8");
        return None;
    };
    let scale_filter = format!("scale={w}:{h}:flags=bilinear");
    let fps_str = fps.to_string();
    let pos_str = format!("{pos_secs:.3}");

    match Command::new("ffmpeg")
        .args([
            "-stream_loop",
            "-1",
            "-ss",
            &pos_str,
            "-i",
            path_str,
            "-vf",
            &scale_filter,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-r",
            &fps_str,
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => {
            log::debug!("ffmpeg lancé : {w}x{h} @ {fps}fps depuis {pos_secs:.1}s");
            Some(child)
        }
        Err(e) => {
            log::warn!("Impossible de lancer ffmpeg : {e}");
            None
        }
    }
}

/// Remplit `buf` depuis `reader`.
///
/// `Ok(false)` sur EOF avant complétion.
///
/// # Errors
/// Propagates a fatal I/O error.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Slot libre du pool (`strong_count == 1`), alloué si tous sont pris.
fn free_slot(pool: &mut Vec<Arc<FrameBuffer>>, w: u32, h: u32) -> usize {
    if let Some(i) = pool.iter().position(|a| Arc::strong_count(a) == 1) {
        if !pool[i].same_size(w, h) {
            pool[i] = Arc::new(FrameBuffer::new(w, h));
        }
        return i;
    }
    pool.push(Arc::new(FrameBuffer::new(w, h)));
    pool.len() - 1
}

struct Decoder {
    path: PathBuf,
    w: u32,
    h: u32,
    fps: f64,
    pos_secs: f64,
    paused: bool,
    child: Option<Child>,
    pool: Vec<Arc<FrameBuffer>>,
}

impl Decoder {
    fn new(path: PathBuf, info: VideoInfo) -> Self {
        Self {
            path,
            w: 0,
            h: 0,
            fps: info.fps.clamp(1.0, 60.0),
            pos_secs: 0.0,
            paused: false,
            child: None,
            pool: Vec::with_capacity(POOL_SIZE),
        }
    }

    fn kill(&mut self) {
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
        }
    }

    fn restart(&mut self) {
        self.kill();
        if self.w > 0 && self.h > 0 {
            self.child = spawn_ffmpeg_pipe(
                &self.path,
                self.w,
                self.h,
                self.pos_secs,
                self.fps.round() as u32,
            );
        }
    }

    /// `true` si le thread doit s'arrêter.
    fn process_commands(&mut self, cmd_rx: &Receiver<VideoCommand>) -> bool {
        loop {
            match cmd_rx.try_recv() {
                Ok(VideoCommand::Quit) | Err(TryRecvError::Disconnected) => {
                    self.kill();
                    return true;
                }
                Ok(VideoCommand::Pause) => self.paused = true,
                Ok(VideoCommand::Play) => self.paused = false,
                Ok(VideoCommand::Resize(w, h)) => {
                    if w > 0 && h > 0 && (w, h) != (self.w, self.h) {
                        self.w = w;
                        self.h = h;
                        self.pool.clear();
                        self.pool
                            .extend((0..POOL_SIZE).map(|_| Arc::new(FrameBuffer::new(w, h))));
                        log::debug!("Thread vidéo : sortie {w}x{h}");
                        self.restart();
                    }
                }
                Err(TryRecvError::Empty) => return false,
            }
        }
    }

    fn run(&mut self, frame_tx: &Sender<DecodedFrame>, cmd_rx: &Receiver<VideoCommand>) {
        let period = Duration::from_secs_f64(1.0 / self.fps);
        let mut last = Instant::now();
        loop {
            if self.process_commands(cmd_rx) {
                break;
            }
            if self.paused || self.child.is_none() {
                thread::sleep(Duration::from_millis(10));
                continue;
            }
            if let Some(remaining) = period.checked_sub(last.elapsed()) {
                thread::sleep(remaining);
                continue;
            }
            last = Instant::now();

            let idx = free_slot(&mut self.pool, self.w, self.h);
            let Some(fb) = Arc::get_mut(&mut self.pool[idx]) else {
                continue;
            };
            let read = self
                .child
                .as_mut()
                .and_then(|c| c.stdout.as_mut())
                .map_or(Ok(false), |stdout| read_exact_or_eof(stdout, &mut fb.data));

            match read {
                Ok(true) => {
                    let frame = DecodedFrame {
                        buffer: Arc::clone(&self.pool[idx]),
                        position_us: (self.pos_secs * 1_000_000.0) as u64,
                    };
                    self.pos_secs += 1.0 / self.fps;
                    // Canal plein : le rendu est en retard, la frame est abandonnée.
                    match frame_tx.try_send(frame) {
                        Ok(()) | Err(flume::TrySendError::Full(_)) => {}
                        Err(flume::TrySendError::Disconnected(_)) => break,
                    }
                }
                Ok(false) => {
                    log::debug!("Thread vidéo : fin de flux, relance depuis 0");
                    self.pos_secs = 0.0;
                    self.restart();
                }
                Err(e) => {
                    log::warn!("Thread vidéo : lecture du pipe échouée : {e}");
                    self.kill();
                    thread::sleep(Duration::from_millis(100));
                    self.restart();
                }
            }
        }
        self.kill();
        log::info!("Thread vidéo terminé.");
    }
}

/// Spawne le thread de décodage.
///
/// Aucun ffmpeg n'est lancé avant le premier [`VideoCommand::Resize`].
///
/// # Errors
/// Retourne une erreur si ffprobe échoue ou si le thread ne démarre pas.
pub fn spawn_video_thread(
    path: PathBuf,
    frame_tx: Sender<DecodedFrame>,
    cmd_rx: Receiver<VideoCommand>,
) -> Result<(thread::JoinHandle<()>, VideoInfo)> {
    let info = probe_video(&path)?;
    let handle = thread::Builder::new()
        .name("gt-video".to_string())
        .spawn(move || Decoder::new(path, info).run(&frame_tx, &cmd_rx))
        .context("Impossible de spawner le thread vidéo")?;
    Ok((handle, info))
}

/// Source vidéo en lecture bouclée.
///
/// Non bloquante : [`FrameSource::frame`] retourne la dernière frame reçue,
/// ou `None` tant que le décodeur n'a rien produit.
pub struct VideoSource {
    frame_rx: Receiver<DecodedFrame>,
    cmd_tx: Sender<VideoCommand>,
    handle: Option<thread::JoinHandle<()>>,
    latest: Option<DecodedFrame>,
    requested: (u32, u32),
    stretcher: Stretcher,
}

impl VideoSource {
    /// Probe `path` and start decoding.
    ///
    /// # Errors
    /// Returns an error if ffprobe fails or the decoder thread cannot start.
    pub fn open(path: &Path) -> Result<Self> {
        let (frame_tx, frame_rx) = flume::bounded(FRAME_CHANNEL);
        let (cmd_tx, cmd_rx) = flume::bounded(16);
        let (handle, _info) = spawn_video_thread(path.to_path_buf(), frame_tx, cmd_rx)?;
        let mut source = Self::from_channels(frame_rx, cmd_tx);
        source.handle = Some(handle);
        Ok(source)
    }

    /// Build a source over an existing decoder channel pair.
    #[must_use]
    pub fn from_channels(frame_rx: Receiver<DecodedFrame>, cmd_tx: Sender<VideoCommand>) -> Self {
        Self {
            frame_rx,
            cmd_tx,
            handle: None,
            latest: None,
            requested: (0, 0),
            stretcher: Stretcher::new(),
        }
    }

    fn send(&self, cmd: VideoCommand) {
        if self.cmd_tx.try_send(cmd).is_err() {
            log::warn!("Commande vidéo perdue : {cmd:?}");
        }
    }
}

impl FrameSource for VideoSource {
    fn frame(&mut self, width: u32, height: u32) -> Option<SourceFrame> {
        if self.requested != (width, height) {
            self.requested = (width, height);
            self.send(VideoCommand::Resize(width, height));
        }
        while let Ok(frame) = self.frame_rx.try_recv() {
            self.latest = Some(frame);
        }
        let latest = self.latest.as_ref()?;

        // Frames encore à l'ancienne taille pendant le redémarrage de ffmpeg.
        let buffer = if latest.buffer.same_size(width, height) {
            Arc::clone(&latest.buffer)
        } else {
            match self.stretcher.stretch(&latest.buffer, width, height) {
                Ok(fb) => Arc::new(fb),
                Err(e) => {
                    log::warn!("Redimensionnement vidéo impossible : {e:#}");
                    return None;
                }
            }
        };
        Some(SourceFrame {
            buffer,
            identity: FrameIdentity::new(
                InputMode::Video,
                width,
                height,
                SourceKey::VideoPosition(latest.position_us),
            ),
        })
    }

    fn mode(&self) -> InputMode {
        InputMode::Video
    }

    fn set_paused(&mut self, paused: bool) {
        self.send(if paused {
            VideoCommand::Pause
        } else {
            VideoCommand::Play
        });
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(VideoCommand::Quit);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(w: u32, h: u32, value: u8, position_us: u64) -> DecodedFrame {
        let mut fb = FrameBuffer::new(w, h);
        fb.fill([value, value, value, 255]);
        DecodedFrame {
            buffer: Arc::new(fb),
            position_us,
        }
    }

    #[test]
    fn probe_without_stream_fails() {
        assert!(parse_probe("").is_none());
        assert!(parse_probe("width=0\nheight=10\n").is_none());
    }

    #[test]
    fn read_exact_reports_eof() {
        let mut short = std::io::Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 4];
        assert!(!read_exact_or_eof(&mut short, &mut buf).unwrap());
        let mut full = std::io::Cursor::new(vec![1u8, 2, 3, 4]);
        assert!(read_exact_or_eof(&mut full, &mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn pool_reuses_released_slots() {
        let mut pool = vec![Arc::new(FrameBuffer::new(2, 2))];
        let held = Arc::clone(&pool[0]);
        assert_eq!(free_slot(&mut pool, 2, 2), 1);
        drop(held);
        assert_eq!(free_slot(&mut pool, 2, 2), 0);
    }

    #[test]
    fn not_ready_until_first_frame() {
        let (frame_tx, frame_rx) = flume::bounded(3);
        let (cmd_tx, cmd_rx) = flume::bounded(16);
        let mut src = VideoSource::from_channels(frame_rx, cmd_tx);
        assert!(src.frame(4, 4).is_none());
        assert_eq!(cmd_rx.try_recv().unwrap(), VideoCommand::Resize(4, 4));

        frame_tx.send(decoded(4, 4, 10, 0)).unwrap();
        frame_tx.send(decoded(4, 4, 20, 40_000)).unwrap();
        let frame = src.frame(4, 4).unwrap();
        assert_eq!(frame.buffer.pixel(0, 0).0, 20);
        assert_eq!(frame.identity.key, SourceKey::VideoPosition(40_000));
        assert!(!frame.identity.is_stable());
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn stale_size_is_stretched() {
        let (frame_tx, frame_rx) = flume::bounded(3);
        let (cmd_tx, _cmd_rx) = flume::bounded(16);
        let mut src = VideoSource::from_channels(frame_rx, cmd_tx);
        frame_tx.send(decoded(8, 8, 50, 0)).unwrap();
        let frame = src.frame(4, 2).unwrap();
        assert!(frame.buffer.same_size(4, 2));
    }

    #[test]
    fn pause_is_forwarded() {
        let (_frame_tx, frame_rx) = flume::bounded::<DecodedFrame>(3);
        let (cmd_tx, cmd_rx) = flume::bounded(16);
        let mut src = VideoSource::from_channels(frame_rx, cmd_tx);
        src.set_paused(true);
        src.set_paused(false);
        assert_eq!(cmd_rx.try_recv().unwrap(), VideoCommand::Pause);
        assert_eq!(cmd_rx.try_recv().unwrap(), VideoCommand::Play);
    }
}
