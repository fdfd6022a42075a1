use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};

use anyhow::{Context, Result};
use gt_core::frame::FrameBuffer;
use gt_core::traits::{ArtifactKind, EncodedArtifact, Encoder};

/// Arguments ffmpeg : RGBA brut sur stdin → H.264 RGB sans perte.
///
/// # Example
/// ```
/// use gt_export::mp4::ffmpeg_args;
/// let args = ffmpeg_args(640, 360, 24, "out.mp4");
/// assert!(args.windows(2).any(|w| w == ["-s", "640x360"]));
/// assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
/// ```
#[must_use]
pub fn ffmpeg_args(width: u32, height: u32, fps: u32, output: &str) -> Vec<String> {
    [
        "-y",
        "-f",
        "rawvideo",
        "-vcodec",
        "rawvideo",
        "-s",
        &format!("{width}x{height}"),
        "-pix_fmt",
        "rgba",
        "-r",
        &fps.max(1).to_string(),
        "-i",
        "-",
        // Aplats de couleur nets : pas de sous-échantillonnage chroma.
        "-c:v",
        "libx264rgb",
        "-crf",
        "0",
        "-preset",
        "medium",
        "-pix_fmt",
        "rgb24",
        "-color_range",
        "pc",
        "-hide_banner",
        "-loglevel",
        "error",
        output,
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

/// Erreur rapportée par ffmpeg sur stderr, ou son code de sortie.
fn ffmpeg_failure(output: &Output) -> anyhow::Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        anyhow::anyhow!("Erreur de l'encodeur ffmpeg : {}", output.status)
    } else {
        anyhow::anyhow!("Erreur de l'encodeur ffmpeg : {stderr}")
    }
}

/// Encodeur MP4 via subprocess `ffmpeg` (doit être dans PATH).
///
/// ffmpeg est lancé à la première frame, aux dimensions de celle-ci ; les
/// frames suivantes doivent avoir la même taille. Un ffmpeg encore actif au
/// drop (capture abandonnée) est tué puis attendu.
#[derive(Debug)]
pub struct Mp4Encoder {
    path: PathBuf,
    fps: u32,
    program: PathBuf,
    child: Option<Child>,
    size: (u32, u32),
    frames: usize,
}

impl Mp4Encoder {
    /// Encode to `path` at `fps` frames per second.
    #[must_use]
    pub fn new(path: PathBuf, fps: u32) -> Self {
        Self {
            path,
            fps,
            program: PathBuf::from("ffmpeg"),
            child: None,
            size: (0, 0),
            frames: 0,
        }
    }

    /// Use another ffmpeg binary than the one found in PATH.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn spawn(&self, width: u32, height: u32) -> Result<Child> {
        let output = self.path.to_str().context("Chemin de sortie invalide (non-UTF8)")?;
        let child = Command::new(&self.program)
            .args(ffmpeg_args(width, height, self.fps, output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Échec du lancement de l'encodeur vidéo ffmpeg (est-il dans PATH ?)")?;
        log::debug!("ffmpeg encodeur : {width}x{height} @ {}fps → {output}", self.fps);
        Ok(child)
    }

    /// Le pipe a cassé : ffmpeg est sorti, on récupère sa raison.
    fn abort(&mut self, err: std::io::Error) -> anyhow::Error {
        let Some(mut child) = self.child.take() else {
            return anyhow::Error::new(err).context("Pipe ffmpeg fermé");
        };
        drop(child.stdin.take());
        log::debug!("Écriture dans le pipe ffmpeg échouée : {err}");
        match child.wait_with_output() {
            Ok(output) => ffmpeg_failure(&output),
            Err(e) => anyhow::Error::new(e).context("ffmpeg ne répond plus"),
        }
    }
}

impl Encoder for Mp4Encoder {
    fn accept(&mut self, frame: &FrameBuffer) -> Result<()> {
        if self.child.is_none() {
            self.child = Some(self.spawn(frame.width, frame.height)?);
            self.size = (frame.width, frame.height);
        }
        if !frame.same_size(self.size.0, self.size.1) {
            anyhow::bail!(
                "Taille de frame {}x{} différente du flux {}x{}",
                frame.width,
                frame.height,
                self.size.0,
                self.size.1
            );
        }
        let stdin = self
            .child
            .as_mut()
            .and_then(|c| c.stdin.as_mut())
            .context("Pipe ffmpeg fermé")?;
        if let Err(e) = stdin.write_all(&frame.data) {
            return Err(self.abort(e));
        }
        self.frames += 1;
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<EncodedArtifact> {
        let mut child = self.child.take().context("Aucune frame encodée")?;
        drop(child.stdin.take());
        let output = child.wait_with_output().context("ffmpeg ne répond plus")?;
        if !output.status.success() {
            return Err(ffmpeg_failure(&output));
        }
        Ok(EncodedArtifact {
            kind: ArtifactKind::Video,
            path: std::mem::take(&mut self.path),
            frames: self.frames,
        })
    }
}

impl Drop for Mp4Encoder {
    fn drop(&mut self) {
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_describe_raw_input() {
        let args = ffmpeg_args(8, 4, 0, "a.mp4");
        let pos = args.iter().position(|a| a == "-r").unwrap();
        assert_eq!(args[pos + 1], "1");
        assert!(args.iter().any(|a| a == "rgba"));
    }

    #[test]
    fn finalize_without_frames_fails() {
        let enc = Box::new(Mp4Encoder::new(PathBuf::from("never.mp4"), 24));
        assert!(enc.finalize().is_err());
    }

    /// Faux ffmpeg : script shell exécutable dans `dir`.
    #[cfg(unix)]
    fn fake_ffmpeg(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn broken_pipe_reports_ffmpeg_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffmpeg(dir.path(), "echo 'Unknown encoder libx264rgb' >&2\nexit 1");
        let mut enc = Mp4Encoder::new(dir.path().join("out.mp4"), 24).with_program(program);

        // 1 Mio : plus que le tampon du pipe, l'écriture voit la sortie de ffmpeg.
        let err = enc.accept(&FrameBuffer::new(512, 512)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Erreur de l'encodeur ffmpeg : Unknown encoder libx264rgb"
        );
        assert!(enc.child.is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn drop_reaps_running_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffmpeg(dir.path(), "cat > /dev/null");
        let mut enc = Mp4Encoder::new(dir.path().join("out.mp4"), 24).with_program(program);
        enc.accept(&FrameBuffer::new(2, 2)).unwrap();
        let pid = enc.child.as_ref().unwrap().id();

        drop(enc);
        assert!(!std::path::Path::new(&format!("/proc/{pid}")).exists());
    }

    #[test]
    fn encodes_when_ffmpeg_available() {
        // Dépend de ffmpeg dans PATH ; l'absence n'est pas une erreur de test.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        let mut enc = Box::new(Mp4Encoder::new(path.clone(), 24));
        let mut fb = FrameBuffer::new(16, 16);
        fb.fill([200, 10, 10, 255]);
        if enc.accept(&fb).is_err() {
            return;
        }
        assert!(enc.accept(&FrameBuffer::new(8, 8)).is_err());
        if let Ok(artifact) = enc.finalize() {
            assert_eq!(artifact.frames, 1);
            assert!(path.is_file());
        }
    }
}
