//! The park scene: authored object placements, crow animation state,
//! render toggles and the rain lifecycle.

use std::path::{Path, PathBuf};

use cgmath::{Deg, Matrix4, Rad, Vector3};
use rand::Rng;
use thiserror::Error;
use wgpu::Device;

use crate::gfx::camera::WalkCamera;
use crate::gfx::resources::global_bindings::LightMode;
use crate::simulation::rain::{RainSimulation, DEFAULT_DROP_COUNT};

use super::object::{Mesh, Object};

// Authored placements, surveyed once against the ground model.
const BENCH_POSITION: [f32; 3] = [4.31311, -0.000201, 1.25905];
const LAMP_POSITION: [f32; 3] = [3.7833, -0.019674, 3.02676];
const CROW_X: f32 = 5.9248;
const WING_L_X: f32 = 5.94813;
const WING_R_X: f32 = 5.89672;

// Camera start pose at the park entrance.
const CAMERA_POSITION: [f32; 3] = [-3.74433, 1.60775, 1.44585];
const CAMERA_TARGET: [f32; 3] = [-0.943888, 1.60775, 1.7225];

/// Models loaded from the asset root: object name, relative path, whether
/// the object is drawn into the shadow map.
const PARK_MODELS: &[(&str, &str, bool)] = &[
    ("ground", "gate+ground/ground.obj", true),
    ("sky", "sky/sky.obj", false),
    ("lamp", "street-lamp/lamp.obj", true),
    ("bench", "bench/bench.obj", true),
    ("crow_body", "bodyCrow/body.obj", true),
    ("wing_left", "wingL/wingL.obj", true),
    ("wing_right", "wingR/wingR.obj", true),
];

const RAINDROP_MODEL: &str = "raindrop/raindrop.obj";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load model {path:?}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("model {path:?} contains no geometry")]
    Empty { path: PathBuf },
}

/// Render and effect toggles, flipped by input and read by the render
/// engine every frame. One writer per tick.
#[derive(Debug, Clone, Copy)]
pub struct SceneSettings {
    pub light_mode: LightMode,
    pub fog: bool,
    pub wireframe: bool,
    pub multisampling: bool,
    pub rain: bool,
    pub wind: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            light_mode: LightMode::Directional,
            fog: false,
            wireframe: false,
            multisampling: false,
            rain: false,
            wind: false,
        }
    }
}

/// Crow and wing animation state, advanced while the animation key is
/// held. The bird drifts up and away while the wings flap between the
/// two extremes.
#[derive(Debug, Clone, Copy)]
pub struct CrowAnimation {
    pub body_y: f32,
    pub body_z: f32,
    pub wing_l_y: f32,
    pub wing_l_z: f32,
    pub wing_r_y: f32,
    pub wing_r_z: f32,
    pub wing_angle: f32,
    wing_up: bool,
}

impl CrowAnimation {
    const DRIFT: f32 = 0.01;
    const FLAP_STEP: f32 = 0.1;
    const FLAP_LIMIT: f32 = 0.8;

    pub fn new() -> Self {
        Self {
            body_y: 0.092817,
            body_z: 0.655062,
            wing_l_y: 0.083589,
            wing_l_z: 0.647693,
            wing_r_y: 0.083822,
            wing_r_z: 0.645177,
            wing_angle: 0.0,
            wing_up: false,
        }
    }

    pub fn advance(&mut self) {
        self.body_y += Self::DRIFT;
        self.body_z += Self::DRIFT;
        self.wing_l_y += Self::DRIFT;
        self.wing_l_z += Self::DRIFT;
        self.wing_r_y += Self::DRIFT;
        self.wing_r_z += Self::DRIFT;

        if self.wing_up {
            self.wing_angle += Self::FLAP_STEP;
        } else {
            self.wing_angle -= Self::FLAP_STEP;
        }

        if self.wing_angle >= Self::FLAP_LIMIT {
            self.wing_up = !self.wing_up;
        }
        if self.wing_angle <= -Self::FLAP_LIMIT {
            self.wing_up = !self.wing_up;
        }
    }
}

impl Default for CrowAnimation {
    fn default() -> Self {
        Self::new()
    }
}

/// The scene: camera, objects, settings and simulation state. Mutated by
/// exactly one thread, once per tick, then read by the render passes.
pub struct Scene {
    pub camera: WalkCamera,
    pub objects: Vec<Object>,
    pub raindrop_meshes: Vec<Mesh>,
    pub settings: SceneSettings,
    pub crow: CrowAnimation,
    pub rain: Option<RainSimulation>,
    /// Yaw applied to the ground and sky, degrees.
    pub base_angle: f32,
}

impl Scene {
    pub fn new() -> Self {
        let camera = WalkCamera::new(
            Vector3::from(CAMERA_POSITION),
            Vector3::from(CAMERA_TARGET),
            Vector3::unit_y(),
        );

        Self {
            camera,
            objects: Vec::new(),
            raindrop_meshes: Vec::new(),
            settings: SceneSettings::default(),
            crow: CrowAnimation::new(),
            rain: None,
            base_angle: 0.0,
        }
    }

    /// Loads every park model from `root`. Any missing or malformed file
    /// is fatal; there is no partial-geometry mode.
    pub fn load_park_assets(&mut self, root: &Path) -> Result<(), AssetError> {
        for &(name, relative, casts_shadow) in PARK_MODELS {
            let (meshes, base_color) = load_meshes(&root.join(relative))?;
            let mut object = Object::new(name, meshes);
            object.casts_shadow = casts_shadow;
            if let Some(color) = base_color {
                object.base_color = color;
            }
            self.objects.push(object);
        }

        let (raindrop_meshes, _) = load_meshes(&root.join(RAINDROP_MODEL))?;
        self.raindrop_meshes = raindrop_meshes;
        self.refresh_transforms();
        Ok(())
    }

    pub fn init_gpu_resources(&mut self, device: &Device, object_layout: &wgpu::BindGroupLayout) {
        for object in &mut self.objects {
            object.init_gpu_resources(device, object_layout);
        }
        for mesh in &mut self.raindrop_meshes {
            mesh.upload(device);
        }
    }

    /// Turns rain on (seeding a fresh pool) or off (dropping it). The
    /// simulation is restartable: every toggle-on regenerates the pool.
    pub fn toggle_rain(&mut self, rng: &mut impl Rng) {
        self.settings.rain = !self.settings.rain;
        self.rain = self
            .settings
            .rain
            .then(|| RainSimulation::new(DEFAULT_DROP_COUNT, rng));
    }

    /// Per-tick update: animation-driven transforms, then one rain step.
    pub fn update(&mut self) {
        self.refresh_transforms();
        if let Some(rain) = &mut self.rain {
            rain.step(self.settings.wind);
        }
    }

    /// Rebuilds every object's model matrix from the authored placements
    /// and the current animation state.
    pub fn refresh_transforms(&mut self) {
        let base = Matrix4::from_angle_y(Deg(self.base_angle));
        let crow = &self.crow;

        for object in &mut self.objects {
            object.transform = match object.name.as_str() {
                "ground" | "sky" => base,
                "bench" => Matrix4::from_translation(Vector3::from(BENCH_POSITION)),
                "lamp" => Matrix4::from_translation(Vector3::from(LAMP_POSITION)),
                "crow_body" => Matrix4::from_translation(Vector3::new(
                    CROW_X,
                    crow.body_y,
                    crow.body_z,
                )),
                "wing_left" => {
                    Matrix4::from_translation(Vector3::new(WING_L_X, crow.wing_l_y, crow.wing_l_z))
                        * Matrix4::from_angle_z(Rad(crow.wing_angle))
                }
                "wing_right" => {
                    Matrix4::from_translation(Vector3::new(WING_R_X, crow.wing_r_y, crow.wing_r_z))
                        * Matrix4::from_angle_z(Rad(-crow.wing_angle))
                }
                _ => object.transform,
            };
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads an OBJ file into meshes plus the diffuse color of its first
/// material, when the MTL resolves. A missing MTL just means default
/// shading.
fn load_meshes(path: &Path) -> Result<(Vec<Mesh>, Option<[f32; 4]>), AssetError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    if models.is_empty() {
        return Err(AssetError::Empty {
            path: path.to_path_buf(),
        });
    }

    let materials = materials.unwrap_or_default();
    let base_color = models
        .first()
        .and_then(|model| model.mesh.material_id)
        .and_then(|id| materials.get(id))
        .map(|mtl| {
            let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            [
                diffuse[0],
                diffuse[1],
                diffuse[2],
                mtl.dissolve.unwrap_or(1.0),
            ]
        });

    let mut meshes = Vec::with_capacity(models.len());
    for model in &models {
        let mesh = &model.mesh;
        let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            Mesh::calculate_face_normals(&mesh.positions, &mesh.indices)
        };

        meshes.push(Mesh::new(
            mesh.positions.clone(),
            normals,
            mesh.indices.clone(),
        ));
    }

    Ok((meshes, base_color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn wing_flap_reverses_at_the_limits() {
        let mut crow = CrowAnimation::new();

        // Starts flapping downward, reverses at -0.8, then at +0.8.
        let mut minimum = f32::MAX;
        let mut maximum = f32::MIN;
        for _ in 0..40 {
            crow.advance();
            minimum = minimum.min(crow.wing_angle);
            maximum = maximum.max(crow.wing_angle);
        }

        assert!((minimum + 0.8).abs() < 1e-4);
        assert!(maximum <= 0.8 + 1e-4);
        assert!(maximum > 0.0);
    }

    #[test]
    fn crow_drifts_a_hundredth_per_tick() {
        let mut crow = CrowAnimation::new();
        let body_y = crow.body_y;
        let wing_l_z = crow.wing_l_z;

        crow.advance();
        crow.advance();

        assert!((crow.body_y - (body_y + 0.02)).abs() < 1e-6);
        assert!((crow.wing_l_z - (wing_l_z + 0.02)).abs() < 1e-6);
    }

    #[test]
    fn transforms_follow_authored_placements() {
        let mut scene = Scene::new();
        scene
            .objects
            .push(Object::new("bench", Vec::new()));
        scene.objects.push(Object::new("crow_body", Vec::new()));

        scene.refresh_transforms();

        let bench = &scene.objects[0].transform;
        assert_eq!(bench.w.x, 4.31311);
        assert_eq!(bench.w.y, -0.000201);
        assert_eq!(bench.w.z, 1.25905);

        let crow = &scene.objects[1].transform;
        assert_eq!(crow.w.x, CROW_X);
        assert_eq!(crow.w.y, scene.crow.body_y);
    }

    #[test]
    fn rain_toggle_seeds_and_drops_the_pool() {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(3);

        scene.toggle_rain(&mut rng);
        assert!(scene.settings.rain);
        assert_eq!(scene.rain.as_ref().map(|r| r.len()), Some(3000));

        scene.toggle_rain(&mut rng);
        assert!(!scene.settings.rain);
        assert!(scene.rain.is_none());
    }

    #[test]
    fn update_steps_rain_only_when_enabled() {
        let mut scene = Scene::new();
        scene.update(); // no rain pool, must not panic

        let mut rng = StdRng::seed_from_u64(3);
        scene.toggle_rain(&mut rng);
        let before: Vec<f32> = scene
            .rain
            .as_ref()
            .map(|r| r.drops().iter().take(5).map(|d| d.position.y).collect())
            .unwrap_or_default();

        scene.update();

        let rain = scene.rain.as_ref().expect("rain pool present");
        for (drop, y) in rain.drops().iter().zip(before) {
            // Either fell by one step or got recycled to the spawn height.
            let fell = (drop.position.y - (y - 0.05)).abs() < 1e-6;
            let recycled = (drop.position.y - 8.081).abs() < 1e-6;
            assert!(fell || recycled);
        }
    }
}
