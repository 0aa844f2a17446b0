use crate::math::Vector3;
use crate::physics::body::Material;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid physics configuration: {0}")]
    Invalid(String),
}

/// Configuration for the physics world
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    // Force parameters
    pub gravity: Vector3,

    // Integration parameters
    pub sub_step: f32,
    pub max_sub_steps: u32,
    pub max_velocity: f32,
    pub max_angular_velocity: f32,

    // Contact parameters
    pub solver_iterations: u32,
    /// Given to added bodies that have no material of their own.
    pub default_material: Material,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.81, 0.0),
            sub_step: 1.0 / 60.0,       // 60 Hz
            max_sub_steps: 10,
            max_velocity: 200.0,         // m/s
            max_angular_velocity: 100.0, // rad/s
            solver_iterations: 4,
            default_material: Material::default(),
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        if !(self.sub_step > 0.0 && self.sub_step.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "sub_step must be positive, got {}",
                self.sub_step
            )));
        }
        if !(self.max_velocity > 0.0) || !(self.max_angular_velocity > 0.0) {
            return Err(ConfigError::Invalid(
                "velocity limits must be positive".to_string(),
            ));
        }
        if self.solver_iterations == 0 {
            return Err(ConfigError::Invalid(
                "solver_iterations must be at least 1".to_string(),
            ));
        }
        self.default_material
            .validated()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Reads and validates a YAML configuration file.
    ///
    /// Missing fields take their default values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }
}
