use std::sync::Arc;

use glam::{EulerRot, Mat3, Vec2, Vec3};
use gt_core::config::{GlyphConfig, InputMode, MotionMode, SceneShape};
use gt_core::frame::FrameBuffer;
use gt_core::identity::{FrameIdentity, SourceKey};
use gt_core::traits::{FrameSource, SourceFrame};
use rayon::prelude::*;

/// Champ de vision vertical de la caméra, en degrés.
pub const FOV_DEGREES: f32 = 75.0;
/// Distance caméra à zoom 1.
pub const CAMERA_DISTANCE: f32 = 3.0;
/// Lumière ambiante.
pub const AMBIENT: f32 = 0.5;
/// Intensité de la lumière directionnelle.
pub const DIRECTIONAL: f32 = 0.8;
/// Position de la lumière directionnelle (orientée vers l'origine).
pub const LIGHT_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);

const MAX_STEPS: u32 = 96;
const HIT_EPSILON: f32 = 1e-3;
/// Rayon englobant toutes les formes ; les rayons qui le ratent sont noirs.
const BOUNDS_RADIUS: f32 = 1.5;
const POOL_SIZE: usize = 4;

/// Nombre d'or.
const PHI: f32 = 1.618_034;

#[inline]
fn plane(p: Vec3, normal: Vec3, offset: f32) -> f32 {
    p.dot(normal.normalize()) - offset
}

/// Distance signée de `p` (espace objet) à la surface de `shape`.
///
/// Les polyèdres utilisent l'intersection de leurs demi-espaces : exacte à
/// l'intérieur, sous-estimée près des arêtes, ce qui reste sûr pour le
/// ray-marching.
///
/// # Example
/// ```
/// use glam::Vec3;
/// use gt_core::config::SceneShape;
/// use gt_source::scene::distance;
///
/// assert!((distance(SceneShape::Sphere, Vec3::ZERO) + 1.0).abs() < 1e-6);
/// assert!(distance(SceneShape::Cube, Vec3::new(2.0, 0.0, 0.0)) > 1.0);
/// ```
#[must_use]
pub fn distance(shape: SceneShape, p: Vec3) -> f32 {
    match shape {
        // Anneau dans le plan XY, rayon 1, tube 0.4.
        SceneShape::Torus => Vec2::new(p.truncate().length() - 1.0, p.z).length() - 0.4,
        SceneShape::Sphere => p.length() - 1.0,
        // Pyramide à base carrée : sommet (0, 1, 0), base en losange à y = -1.
        SceneShape::Pyramid => {
            let q = Vec3::new(p.x.abs(), p.y, p.z.abs());
            plane(q, Vec3::new(2.0, 1.0, 2.0), 1.0 / 3.0).max(-p.y - 1.0)
        }
        SceneShape::Cube => {
            let q = p.abs() - Vec3::splat(0.5);
            q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
        }
        // Rayon 1, hauteur 2, axe Y.
        SceneShape::Cylinder => {
            let d = Vec2::new(Vec2::new(p.x, p.z).length() - 1.0, p.y.abs() - 1.0);
            d.max_element().min(0.0) + d.max(Vec2::ZERO).length()
        }
        SceneShape::Octahedron => (p.x.abs() + p.y.abs() + p.z.abs() - 1.0) / 3f32.sqrt(),
        SceneShape::Tetrahedron => {
            let inradius = 1.0 / 3.0;
            [
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(1.0, 1.0, -1.0),
                Vec3::new(1.0, -1.0, 1.0),
                Vec3::new(-1.0, 1.0, 1.0),
            ]
            .into_iter()
            .map(|n| plane(p, n, inradius))
            .fold(f32::MIN, f32::max)
        }
        SceneShape::Icosahedron => {
            let inradius = 0.794_654_5;
            let q = p.abs();
            [
                Vec3::ONE,
                Vec3::new(0.0, 1.0 / PHI, PHI),
                Vec3::new(1.0 / PHI, PHI, 0.0),
                Vec3::new(PHI, 0.0, 1.0 / PHI),
            ]
            .into_iter()
            .map(|n| plane(q, n, inradius))
            .fold(f32::MIN, f32::max)
        }
    }
}

/// Caméra + objet + éclairage d'une frame.
#[derive(Clone, Copy, Debug)]
struct View {
    shape: SceneShape,
    /// Rotation inverse (monde → objet).
    to_object: Mat3,
    eye: Vec3,
    tan_half_fov: f32,
    aspect: f32,
    light: Vec3,
}

impl View {
    fn new(shape: SceneShape, rotation: Vec2, zoom: f32, width: u32, height: u32) -> Self {
        let object = Mat3::from_euler(EulerRot::XYZ, rotation.x, rotation.y, 0.0);
        Self {
            shape,
            to_object: object.transpose(),
            eye: Vec3::new(0.0, 0.0, CAMERA_DISTANCE / zoom.max(0.01)),
            tan_half_fov: (FOV_DEGREES.to_radians() / 2.0).tan(),
            aspect: width as f32 / height.max(1) as f32,
            light: LIGHT_POSITION.normalize(),
        }
    }

    #[inline]
    fn sdf(&self, p: Vec3) -> f32 {
        distance(self.shape, self.to_object * p)
    }

    fn normal(&self, p: Vec3) -> Vec3 {
        let e = 1e-3;
        Vec3::new(
            self.sdf(p + Vec3::X * e) - self.sdf(p - Vec3::X * e),
            self.sdf(p + Vec3::Y * e) - self.sdf(p - Vec3::Y * e),
            self.sdf(p + Vec3::Z * e) - self.sdf(p - Vec3::Z * e),
        )
        .normalize_or_zero()
    }

    /// Intensité lumineuse [0, 1] du rayon passant par (ndc_x, ndc_y).
    fn shade(&self, ndc_x: f32, ndc_y: f32) -> f32 {
        let dir = Vec3::new(
            ndc_x * self.tan_half_fov * self.aspect,
            ndc_y * self.tan_half_fov,
            -1.0,
        )
        .normalize();

        // Intersection avec la sphère englobante.
        let b = self.eye.dot(dir);
        let c = self.eye.length_squared() - BOUNDS_RADIUS * BOUNDS_RADIUS;
        let disc = b * b - c;
        if disc < 0.0 {
            return 0.0;
        }
        let far = -b + disc.sqrt();
        let mut t = (-b - disc.sqrt()).max(0.0);

        for _ in 0..MAX_STEPS {
            let p = self.eye + dir * t;
            let d = self.sdf(p);
            if d < HIT_EPSILON {
                let n = self.normal(p);
                return (AMBIENT + DIRECTIONAL * n.dot(self.light).max(0.0)).min(1.0);
            }
            t += d;
            if t > far {
                break;
            }
        }
        0.0
    }
}

/// Rend la scène dans `raw`, lignes stockées de bas en haut (ordre de
/// relecture d'un framebuffer GL).
fn render_bottom_up(view: &View, width: u32, height: u32, raw: &mut [u8]) {
    let stride = width as usize * 4;
    if stride == 0 {
        return;
    }
    let (w, h) = (width as f32, height as f32);
    raw.par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(row, pixels)| {
            // row 0 = bas de l'image.
            let ndc_y = 2.0 * (row as f32 + 0.5) / h - 1.0;
            for (x, px) in pixels.chunks_exact_mut(4).enumerate() {
                let ndc_x = 2.0 * (x as f32 + 0.5) / w - 1.0;
                let v = (view.shade(ndc_x, ndc_y) * 255.0).round() as u8;
                px.copy_from_slice(&[v, v, v, 255]);
            }
        });
}

/// Scène 3D logicielle : une forme blanche éclairée sur fond noir.
///
/// # Example
/// ```
/// use gt_core::config::SceneShape;
/// use gt_core::traits::FrameSource;
/// use gt_source::scene::SceneSource;
///
/// let mut scene = SceneSource::new(SceneShape::Sphere);
/// let frame = scene.frame(16, 16).unwrap();
/// assert_eq!(frame.buffer.pixel(0, 0), (0, 0, 0, 255));
/// assert!(frame.buffer.pixel(8, 8).0 > 0);
/// ```
pub struct SceneSource {
    shape: SceneShape,
    zoom: f32,
    rotation: Vec2,
    tick: u64,
    raw: Vec<u8>,
    pool: Vec<Arc<FrameBuffer>>,
}

impl SceneSource {
    /// Create a scene showing `shape`, unrotated, at zoom 1.
    #[must_use]
    pub fn new(shape: SceneShape) -> Self {
        Self {
            shape,
            zoom: 1.0,
            rotation: Vec2::ZERO,
            tick: 0,
            raw: Vec::new(),
            pool: Vec::with_capacity(POOL_SIZE),
        }
    }

    /// Rotation courante (x, y) en radians.
    #[must_use]
    pub fn rotation(&self) -> (f32, f32) {
        (self.rotation.x, self.rotation.y)
    }

    fn free_slot(&mut self, width: u32, height: u32) -> usize {
        if let Some(i) = self.pool.iter().position(|a| Arc::strong_count(a) == 1) {
            if !self.pool[i].same_size(width, height) {
                self.pool[i] = Arc::new(FrameBuffer::new(width, height));
            }
            return i;
        }
        self.pool.push(Arc::new(FrameBuffer::new(width, height)));
        self.pool.len() - 1
    }
}

impl FrameSource for SceneSource {
    fn frame(&mut self, width: u32, height: u32) -> Option<SourceFrame> {
        let view = View::new(self.shape, self.rotation, self.zoom, width, height);
        self.raw.resize(width as usize * height as usize * 4, 0);
        render_bottom_up(&view, width, height, &mut self.raw);

        let idx = self.free_slot(width, height);
        let fb = Arc::get_mut(&mut self.pool[idx])?;
        if let Err(e) = fb.copy_flipped(&self.raw) {
            log::warn!("Scène : relecture impossible : {e}");
            return None;
        }
        self.tick += 1;
        Some(SourceFrame {
            buffer: Arc::clone(&self.pool[idx]),
            identity: FrameIdentity::new(
                InputMode::Scene,
                width,
                height,
                SourceKey::SceneTick(self.tick),
            ),
        })
    }

    fn mode(&self) -> InputMode {
        InputMode::Scene
    }

    fn on_tick(&mut self, config: &GlyphConfig) {
        if self.shape != config.scene_shape {
            log::debug!("Scène : forme {:?}", config.scene_shape);
            self.shape = config.scene_shape;
        }
        self.zoom = config.zoom;
        if config.motion_mode == MotionMode::Motion {
            self.rotation.x += 0.005 * config.motion_speed;
            self.rotation.y += 0.01 * config.motion_speed;
        }
    }
}
