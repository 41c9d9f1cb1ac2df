//! Global configuration constants and world-level settings for the sandbox engine.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Default gravity vector applied in the world (Y-up).
pub const DEFAULT_GRAVITY: [f64; 2] = [0.0, -9.81];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f64 = 1.0 / 100.0;

/// Target rate of the dedicated physics thread.
pub const DEFAULT_UPDATE_RATE_HZ: f64 = 100.0;

/// Bodies leaving this square (in world units) are considered diverged.
pub const DEFAULT_WORLD_BOUND: f64 = 5100.0;

/// Coefficient of the linear air friction slot (force per unit velocity).
pub const DEFAULT_AIR_FRICTION: f64 = 0.01;

/// Coefficient of the angular air friction term (angular acceleration per rad/s).
pub const DEFAULT_ANGULAR_AIR_FRICTION: f64 = 0.05;

/// Maximum recursion depth of a laser ray tree.
pub const DEFAULT_MAX_RAY_DEPTH: u32 = 100;

/// Global number of rays all lasers may emit within one step.
pub const DEFAULT_RAY_BUDGET: usize = 1000;

/// Opacity below which a laser branch is invisible and no longer traced.
pub const MIN_VISIBLE_ALPHA: f32 = 1.0 / 255.0;

/// Distance a laser ray travels before fading out completely.
pub const DEFAULT_FADE_DISTANCE: f64 = 2000.0;

/// Spring constant of a hinge before stability clamping.
pub const DEFAULT_HINGE_CONSTANT: f64 = 1.0e6;

/// Damping of a hinge spring.
pub const DEFAULT_HINGE_DAMPING: f64 = 0.5;

/// Fraction of the explicit-Euler stability limit (`m / dt²`) a hinge may use.
pub const HINGE_STABILITY: f64 = 0.25;

/// Multiplier applied to the damping term of every spring.
pub const SPRING_DAMPING_SCALE: f64 = 20.0;

/// Density of the surrounding air, scaling the buoyancy slot.
pub const DEFAULT_AIR_DENSITY: f64 = 1.2e-3;

/// Slowest update rate the fixed timestep is derived from.
pub const MIN_UPDATE_RATE_HZ: f64 = 1.0;

/// Segments used when a circle needs a polygonal outline.
pub const CIRCLE_SEGMENTS: usize = 24;

/// Tolerance used for degenerate geometry checks.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// World-level tunables, owned by [`crate::world::World`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub gravity: DVec2,
    pub gravity_enabled: bool,
    /// `true` selects the 1/r attraction law, `false` the 1/r² law.
    pub linear_attraction: bool,
    pub air_friction_enabled: bool,
    pub air_friction: f64,
    pub angular_air_friction: f64,
    /// Mass per unit area of the air; buoyancy is `-gravity · air_density · area`.
    pub air_density: f64,
    pub world_bound: f64,
    pub ray_budget: usize,
    pub max_ray_depth: u32,
    /// Mask bits whose members never collide with each other.
    pub self_collision_exempt_mask: u32,
    /// Test every edge normal instead of the two box axes per shape.
    pub all_edge_axes: bool,
    pub update_rate_hz: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            gravity: DVec2::from_array(DEFAULT_GRAVITY),
            gravity_enabled: true,
            linear_attraction: false,
            air_friction_enabled: true,
            air_friction: DEFAULT_AIR_FRICTION,
            angular_air_friction: DEFAULT_ANGULAR_AIR_FRICTION,
            air_density: DEFAULT_AIR_DENSITY,
            world_bound: DEFAULT_WORLD_BOUND,
            ray_budget: DEFAULT_RAY_BUDGET,
            max_ray_depth: DEFAULT_MAX_RAY_DEPTH,
            self_collision_exempt_mask: 0,
            all_edge_axes: false,
            update_rate_hz: DEFAULT_UPDATE_RATE_HZ,
        }
    }
}

impl SimulationSettings {
    /// Settings with every ambient force switched off, used by deterministic setups.
    pub fn vacuum() -> Self {
        Self {
            gravity_enabled: false,
            air_friction_enabled: false,
            ..Self::default()
        }
    }

    /// Fixed timestep derived from the update rate.
    ///
    /// Rates below [`MIN_UPDATE_RATE_HZ`] are clamped; non-positive or NaN rates
    /// fall back to [`DEFAULT_TIME_STEP`].
    pub fn time_step(&self) -> f64 {
        if self.update_rate_hz > 0.0 {
            1.0 / self.update_rate_hz.max(MIN_UPDATE_RATE_HZ)
        } else {
            DEFAULT_TIME_STEP
        }
    }
}
