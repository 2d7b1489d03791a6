//! TOML scene description for the command-line host.
//!
//! ```toml
//! stream_radius = 150.0
//!
//! [[statics]]
//! translation = [0.0, 0.0, 50.0]
//! shape = { kind = "plane" }
//!
//! [[roads]]
//! points = [[-100.0, 0.0, 50.0], [100.0, 0.0, 50.0]]
//! half_width = 4.0
//!
//! [[water]]
//! min = [200.0, -50.0]
//! max = [300.0, 50.0]
//! surface = 48.0
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use rapier3d::na::{UnitQuaternion, Vector3};
use serde::Deserialize;

use crate::{
    layers::{Road, WaterBody},
    rapier::{ColliderShapeDef, WorldStaticDef},
};

/// Data as parsed directly out of the scene file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    /// Overrides the host's default stream radius.
    pub stream_radius: Option<f32>,
    #[serde(default)]
    pub statics: Vec<StaticEntry>,
    #[serde(default)]
    pub roads: Vec<RoadEntry>,
    #[serde(default)]
    pub water: Vec<WaterEntry>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticEntry {
    /// Defaults to the entry's position in the file.
    pub id: Option<u32>,
    #[serde(default)]
    pub translation: [f32; 3],
    /// Roll, pitch, yaw in degrees.
    #[serde(default)]
    pub rotation_deg: [f32; 3],
    pub shape: ShapeEntry,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeEntry {
    Plane {
        #[serde(default)]
        offset: f32,
    },
    Cuboid {
        half_extents: [f32; 3],
    },
    Sphere {
        radius: f32,
    },
    CapsuleZ {
        radius: f32,
        half_height: f32,
    },
    RoundCuboid {
        half_extents: [f32; 3],
        border_radius: f32,
    },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoadEntry {
    pub points: Vec<[f32; 3]>,
    pub half_width: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaterEntry {
    pub min: [f32; 2],
    pub max: [f32; 2],
    pub surface: f32,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        let scene =
            Self::parse(&text).with_context(|| format!("invalid scene {}", path.display()))?;
        log::info!(
            "loaded scene {}: {} statics, {} roads, {} water bodies",
            path.display(),
            scene.statics.len(),
            scene.roads.len(),
            scene.water.len()
        );
        Ok(scene)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    fn validate(&self) -> Result<()> {
        if let Some(radius) = self.stream_radius {
            ensure!(
                radius.is_finite() && radius > 0.0,
                "stream_radius must be positive, got {radius}"
            );
        }
        for (i, entry) in self.statics.iter().enumerate() {
            let params = entry.shape.parameters();
            ensure!(
                entry
                    .translation
                    .iter()
                    .chain(&entry.rotation_deg)
                    .chain(&params)
                    .all(|v| v.is_finite()),
                "static #{i} has a non-finite value"
            );
            ensure!(
                params.iter().all(|v| *v >= 0.0),
                "static #{i} has a negative size"
            );
        }
        for (i, road) in self.roads.iter().enumerate() {
            ensure!(road.points.len() >= 2, "road #{i} needs at least two points");
            ensure!(
                road.points.iter().flatten().all(|v| v.is_finite())
                    && road.half_width.is_finite()
                    && road.half_width >= 0.0,
                "road #{i} has an invalid point or width"
            );
        }
        for (i, water) in self.water.iter().enumerate() {
            ensure!(
                water.min.iter().chain(&water.max).all(|v| v.is_finite())
                    && water.surface.is_finite(),
                "water #{i} has a non-finite value"
            );
            ensure!(
                water.min[0] <= water.max[0] && water.min[1] <= water.max[1],
                "water #{i} has min > max"
            );
        }
        Ok(())
    }

    pub fn world_statics(&self) -> Vec<WorldStaticDef> {
        self.statics
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let [roll, pitch, yaw] = entry.rotation_deg.map(f32::to_radians);
                WorldStaticDef {
                    id: entry.id.unwrap_or(i as u32),
                    translation: Vector3::from(entry.translation),
                    rotation: UnitQuaternion::from_euler_angles(roll, pitch, yaw),
                    shape: entry.shape.to_def(),
                }
            })
            .collect()
    }

    pub fn roads(&self) -> Vec<Road> {
        self.roads
            .iter()
            .map(|r| Road::new(r.points.iter().copied().map(Vector3::from), r.half_width))
            .collect()
    }

    pub fn water_bodies(&self) -> Vec<WaterBody> {
        self.water
            .iter()
            .map(|w| WaterBody::new(w.min.into(), w.max.into(), w.surface))
            .collect()
    }
}

impl ShapeEntry {
    /// Size parameters, excluding the plane offset.
    fn parameters(&self) -> Vec<f32> {
        match self {
            ShapeEntry::Plane { .. } => Vec::new(),
            ShapeEntry::Cuboid { half_extents } => half_extents.to_vec(),
            ShapeEntry::Sphere { radius } => vec![*radius],
            ShapeEntry::CapsuleZ {
                radius,
                half_height,
            } => vec![*radius, *half_height],
            ShapeEntry::RoundCuboid {
                half_extents,
                border_radius,
            } => {
                let mut v = half_extents.to_vec();
                v.push(*border_radius);
                v
            }
        }
    }

    fn to_def(&self) -> ColliderShapeDef {
        match *self {
            ShapeEntry::Plane { offset } => ColliderShapeDef::Plane {
                offset_along_normal: offset,
            },
            ShapeEntry::Cuboid { half_extents } => ColliderShapeDef::Cuboid {
                half_extents: half_extents.into(),
            },
            ShapeEntry::Sphere { radius } => ColliderShapeDef::Sphere { radius },
            ShapeEntry::CapsuleZ {
                radius,
                half_height,
            } => ColliderShapeDef::CapsuleZ {
                radius,
                half_height,
            },
            ShapeEntry::RoundCuboid {
                half_extents,
                border_radius,
            } => ColliderShapeDef::RoundCuboid {
                half_extents: half_extents.into(),
                border_radius,
            },
        }
    }
}
