//! Raindrop pool simulation.
//!
//! A pool of independently falling drops, each remembering the spot it was
//! seeded at. A drop that reaches the ground plane or hits a shelter
//! surface respawns over its original footprint at a fixed height, so the
//! rain loops continuously instead of running out.

use cgmath::Vector3;
use rand::Rng;

use super::colliders::{shelter_obstacles, PlanarObstacle};

/// Pool size used by the interactive scene.
pub const DEFAULT_DROP_COUNT: usize = 3000;

/// Height a recycled drop re-enters the scene at.
pub const RESPAWN_HEIGHT: f32 = 8.081;

const FALL_STEP: f32 = 0.05;
const WIND_DRIFT: f32 = 0.02;

// Spawn volume over the park, uniform per axis.
const SPAWN_X: std::ops::Range<f32> = 1.874..16.350;
const SPAWN_Y: std::ops::Range<f32> = 0.0..8.081;
const SPAWN_Z: std::ops::Range<f32> = -6.592..11.712;

#[derive(Debug, Clone, Copy)]
pub struct Raindrop {
    initial: Vector3<f32>,
    pub position: Vector3<f32>,
}

impl Raindrop {
    pub fn initial(&self) -> Vector3<f32> {
        self.initial
    }
}

pub struct RainSimulation {
    drops: Vec<Raindrop>,
    obstacles: [PlanarObstacle; 4],
}

impl RainSimulation {
    /// Seeds `count` drops uniformly over the spawn volume. Callers pass
    /// the RNG so tests can seed it.
    pub fn new(count: usize, rng: &mut impl Rng) -> Self {
        let drops = (0..count)
            .map(|_| {
                let spawn = Vector3::new(
                    rng.random_range(SPAWN_X),
                    rng.random_range(SPAWN_Y),
                    rng.random_range(SPAWN_Z),
                );
                Raindrop {
                    initial: spawn,
                    position: spawn,
                }
            })
            .collect();

        Self {
            drops,
            obstacles: shelter_obstacles(),
        }
    }

    /// Advances every drop one step: constant fall, optional wind drift
    /// along -z, then recycling once the drop goes below the ground plane
    /// or ends up inside a shelter surface.
    pub fn step(&mut self, wind: bool) {
        for drop in &mut self.drops {
            drop.position.y -= FALL_STEP;
            if wind {
                drop.position.z -= WIND_DRIFT;
            }

            let landed = drop.position.y < 0.0;
            if landed || self.obstacles.iter().any(|o| o.blocks(drop.position)) {
                drop.position = drop.initial;
                drop.position.y = RESPAWN_HEIGHT;
            }
        }
    }

    pub fn drops(&self) -> &[Raindrop] {
        &self.drops
    }

    pub fn len(&self) -> usize {
        self.drops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(count: usize) -> RainSimulation {
        let mut rng = StdRng::seed_from_u64(17);
        RainSimulation::new(count, &mut rng)
    }

    #[test]
    fn drops_spawn_inside_the_documented_volume() {
        let rain = seeded(500);
        assert_eq!(rain.len(), 500);

        for drop in rain.drops() {
            let p = drop.position;
            assert!(p.x >= 1.874 && p.x < 16.350, "x out of range: {}", p.x);
            assert!(p.y >= 0.0 && p.y < 8.081, "y out of range: {}", p.y);
            assert!(p.z >= -6.592 && p.z < 11.712, "z out of range: {}", p.z);
            assert_eq!(drop.initial(), p);
        }
    }

    #[test]
    fn falling_drop_loses_constant_height_per_step() {
        let mut rain = seeded(1);
        rain.drops[0].position = Vector3::new(5.0, 100.0, -3.0);

        rain.step(false);
        let p = rain.drops[0].position;
        assert!((p.y - 99.95).abs() < 1e-6);
        assert_eq!(p.x, 5.0);
        assert_eq!(p.z, -3.0);
    }

    #[test]
    fn wind_adds_a_constant_drift() {
        let mut rain = seeded(1);
        rain.drops[0].position = Vector3::new(5.0, 100.0, -3.0);

        rain.step(true);
        let p = rain.drops[0].position;
        assert!((p.y - 99.95).abs() < 1e-6);
        assert!((p.z - -3.02).abs() < 1e-6);
    }

    #[test]
    fn grounded_drop_respawns_over_its_footprint() {
        let mut rain = seeded(4);
        for drop in &mut rain.drops {
            // Just above the ground: the next step takes every drop below
            // zero and must recycle it.
            drop.position.y = 0.03;
        }

        rain.step(false);

        for drop in rain.drops() {
            let initial = drop.initial();
            assert_eq!(drop.position.x, initial.x);
            assert_eq!(drop.position.z, initial.z);
            assert_eq!(drop.position.y, RESPAWN_HEIGHT);
        }
    }

    #[test]
    fn drop_hitting_the_roof_respawns() {
        let mut rain = seeded(1);

        // Interior test point on the right roof slope, one fall step up so
        // the advance lands exactly on it.
        let obstacles = shelter_obstacles();
        let midpoint = Vector3::new(10.65028, 2.620825, 3.24146);
        let inward = {
            use cgmath::InnerSpace;
            obstacles[0].normal.normalize()
        };
        let landing = midpoint - inward * 0.05;
        assert!(obstacles[0].blocks(landing));

        rain.drops[0].position = landing + Vector3::new(0.0, FALL_STEP, 0.0);
        rain.step(false);

        let drop = rain.drops[0];
        assert_eq!(drop.position.x, drop.initial().x);
        assert_eq!(drop.position.z, drop.initial().z);
        assert_eq!(drop.position.y, RESPAWN_HEIGHT);
    }

    #[test]
    fn drop_above_the_shelter_keeps_falling() {
        let mut rain = seeded(1);
        rain.drops[0].position = Vector3::new(10.65, 6.0, 3.24);

        rain.step(false);
        assert!((rain.drops[0].position.y - 5.95).abs() < 1e-6);
    }
}
