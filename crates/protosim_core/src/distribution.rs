//! Initial placement of devices inside the arena volume.

use crate::error::{Result, SimError};
use protosim_data::{Vec3, Volume};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Uniformly random inside the volume. Flat volumes place every device at `min.z`.
    #[default]
    UniformRandom,
    /// The listed points first, then uniformly random for the rest.
    FixedPoints { points: Vec<Vec3> },
    /// Regular lattice spanning the volume.
    Grid,
    /// The [`Distribution::Grid`] lattice in x and z, uniformly random in y.
    XGrid,
    /// Uniformly random on the curved surface of a cylinder whose axis runs
    /// along x through the middle of the volume. The diameter is the smaller
    /// of the volume's height and depth, so the volume must be 3D.
    Cylinder,
    /// Exactly the listed points; the list must cover the whole population.
    Explicit { points: Vec<Vec3> },
}

impl Distribution {
    pub fn validate(&self, volume: &Volume, population: usize) -> Result<()> {
        validate_volume(volume)?;
        match self {
            Distribution::UniformRandom | Distribution::Grid | Distribution::XGrid => Ok(()),
            Distribution::Cylinder => {
                if volume.is_3d() {
                    Ok(())
                } else {
                    Err(SimError::invalid_distribution(
                        "cylinder distribution needs a volume with positive depth",
                    ))
                }
            }
            Distribution::FixedPoints { points } => check_points(points),
            Distribution::Explicit { points } => {
                check_points(points)?;
                if points.len() < population {
                    return Err(SimError::invalid_distribution(format!(
                        "explicit distribution lists {} points for a population of {}",
                        points.len(),
                        population
                    )));
                }
                Ok(())
            }
        }
    }

    /// Position for the device at `index` out of `population`.
    pub fn place<R: Rng>(
        &self,
        index: usize,
        population: usize,
        volume: &Volume,
        rng: &mut R,
    ) -> Vec3 {
        match self {
            Distribution::UniformRandom => uniform(volume, rng),
            Distribution::FixedPoints { points } => match points.get(index) {
                Some(p) => *p,
                None => uniform(volume, rng),
            },
            Distribution::Grid => GridLayout::new(population, volume).position(index, volume),
            Distribution::XGrid => {
                let lattice = GridLayout::new(population, volume).position(index, volume);
                Vec3::new(lattice.x, rng.gen_range(volume.min.y..volume.max.y), lattice.z)
            }
            Distribution::Cylinder => cylinder(volume, rng),
            Distribution::Explicit { points } => match points.get(index) {
                Some(p) => *p,
                None => uniform(volume, rng),
            },
        }
    }
}

fn validate_volume(volume: &Volume) -> Result<()> {
    if !volume.min.is_finite() || !volume.max.is_finite() {
        return Err(SimError::invalid_distribution("volume bounds must be finite"));
    }
    let extent = Vec3::new(volume.width(), volume.height(), volume.depth());
    if !extent.is_finite() {
        return Err(SimError::invalid_distribution(format!(
            "volume extent overflows: {}x{}x{}",
            extent.x, extent.y, extent.z
        )));
    }
    if volume.width() <= 0.0 || volume.height() <= 0.0 || volume.depth() < 0.0 {
        return Err(SimError::invalid_distribution(format!(
            "volume must have positive width and height and non-negative depth, got {}x{}x{}",
            volume.width(),
            volume.height(),
            volume.depth()
        )));
    }
    Ok(())
}

fn check_points(points: &[Vec3]) -> Result<()> {
    if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
        return Err(SimError::invalid_distribution(format!(
            "point {i} is not finite: {p:?}"
        )));
    }
    Ok(())
}

fn uniform<R: Rng>(volume: &Volume, rng: &mut R) -> Vec3 {
    let z = if volume.is_3d() {
        rng.gen_range(volume.min.z..volume.max.z)
    } else {
        volume.min.z
    };
    Vec3::new(
        rng.gen_range(volume.min.x..volume.max.x),
        rng.gen_range(volume.min.y..volume.max.y),
        z,
    )
}

fn cylinder<R: Rng>(volume: &Volume, rng: &mut R) -> Vec3 {
    let radius = volume.height().min(volume.depth()) / 2.0;
    let center_y = volume.min.y + volume.height() / 2.0;
    let center_z = volume.min.z + volume.depth() / 2.0;
    let theta = rng.gen_range(0.0..TAU);
    Vec3::new(
        rng.gen_range(volume.min.x..volume.max.x),
        center_y + radius * theta.cos(),
        center_z + radius * theta.sin(),
    )
}

/// Rows, columns and layers of a lattice holding `n` devices.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridLayout {
    rows: usize,
    columns: usize,
    layers: usize,
}

impl GridLayout {
    fn new(n: usize, volume: &Volume) -> Self {
        let n = n.max(1) as f64;
        let (w, h, d) = (volume.width(), volume.height(), volume.depth());
        let (rows, layers) = if volume.is_3d() {
            let layers = (n * d * d / (w * h)).cbrt().ceil().max(1.0);
            let rows = (layers * h / d).ceil().max(1.0);
            (rows, layers)
        } else {
            ((n.sqrt() * (h / w).sqrt()).ceil().max(1.0), 1.0)
        };
        let columns = (n / (rows * layers)).ceil().max(1.0);
        Self {
            rows: rows as usize,
            columns: columns as usize,
            layers: layers as usize,
        }
    }

    fn position(&self, i: usize, volume: &Volume) -> Vec3 {
        let l = i % self.layers;
        let r = (i / self.layers) % self.rows;
        let c = i / (self.layers * self.rows);
        Vec3::new(
            volume.min.x + c as f64 * volume.width() / self.columns as f64,
            volume.min.y + r as f64 * volume.height() / self.rows as f64,
            volume.min.z + l as f64 * volume.depth() / self.layers as f64,
        )
    }
}
