use nalgebra::Point3;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// Input particle (center + radius), user-facing type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
}

impl Particle {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self { x, y, z, r }
    }

    #[must_use]
    pub const fn center(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

/// Axis-aligned, non-periodic container of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    #[must_use]
    pub const fn from_corners(min: (f64, f64, f64), max: (f64, f64, f64)) -> Self {
        Self {
            min: Point3::new(min.0, min.1, min.2),
            max: Point3::new(max.0, max.1, max.2),
        }
    }

    /// Tight box around the points, each axis padded by `padding` on both sides
    #[must_use]
    pub fn around(points: &[Point3<f64>], padding: f64) -> Self {
        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            for k in 0..3 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        for k in 0..3 {
            min[k] -= padding;
            max[k] += padding;
        }
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|k| p[k] >= self.min[k] && p[k] <= self.max[k])
    }

    #[must_use]
    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).norm()
    }
}

/// One frame of a monosize packing: particle centers, their shared radius and the container.
///
/// Particle ids are the 0-based indices into `positions`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    positions: Vec<Point3<f64>>,
    radius: f64,
    bounds: BoundingBox,
}

impl Snapshot {
    /// Build a snapshot, validating coordinates and the monosize invariant.
    ///
    /// # Errors
    /// Returns [`FeatureError`] if the frame is empty, a particle is not finite,
    /// a radius is not positive, or radii differ.
    pub fn new(particles: &[Particle], bounds: BoundingBox) -> Result<Self> {
        let Some(first) = particles.first() else {
            return Err(FeatureError::EmptySnapshot);
        };
        for (index, p) in particles.iter().enumerate() {
            if !p.x.is_finite() || !p.y.is_finite() || !p.z.is_finite() {
                return Err(FeatureError::InvalidParticle {
                    index,
                    reason: "coordinates must be finite",
                });
            }
            if !p.r.is_finite() || p.r <= 0.0 {
                return Err(FeatureError::InvalidParticle {
                    index,
                    reason: "radius must be positive and finite",
                });
            }
            if (p.r - first.r).abs() > 1e-12 * first.r {
                return Err(FeatureError::NonUniformRadius {
                    index,
                    expected: first.r,
                    found: p.r,
                });
            }
        }

        Ok(Self {
            positions: particles.iter().map(Particle::center).collect(),
            radius: first.r,
            bounds,
        })
    }

    /// Build a snapshot whose box is the particle extent padded by the radius.
    ///
    /// # Errors
    /// Same conditions as [`Snapshot::new`].
    pub fn with_padded_bounds(particles: &[Particle]) -> Result<Self> {
        let padding = particles.first().map_or(0.0, |p| p.r);
        let centers: Vec<Point3<f64>> = particles.iter().map(Particle::center).collect();
        Self::new(particles, BoundingBox::around(&centers, padding))
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// The single radius shared by every particle
    #[inline]
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Neighbor candidate sorted by a scalar (usually distance)
#[derive(Debug, Clone, Copy)]
pub struct ValuedId {
    pub value: f64,
    pub index: usize,
}

impl ValuedId {
    pub const fn new(value: f64, index: usize) -> Self {
        Self { value, index }
    }
}

impl PartialEq for ValuedId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.index == other.index
    }
}

impl Eq for ValuedId {}

impl PartialOrd for ValuedId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValuedId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Dense per-particle feature table: one row per particle, labeled columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureTable {
    /// Zero-filled table with the given labels and row count
    #[must_use]
    pub fn zeros(columns: Vec<String>, rows: usize) -> Self {
        let width = columns.len();
        Self {
            columns,
            values: vec![0.0; rows * width],
        }
    }

    /// Assemble from per-particle rows; every row must match the label count.
    ///
    /// # Panics
    /// Panics if a row length differs from the number of columns.
    #[must_use]
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        let width = columns.len();
        let mut values = Vec::with_capacity(rows.len() * width);
        for row in rows {
            assert_eq!(row.len(), width, "row width does not match column count");
            values.extend(row);
        }
        Self { columns, values }
    }

    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    #[must_use]
    pub fn n_rows(&self) -> usize {
        if self.columns.is_empty() {
            0
        } else {
            self.values.len() / self.columns.len()
        }
    }

    #[inline]
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        let w = self.columns.len();
        &self.values[i * w..(i + 1) * w]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let w = self.columns.len();
        &mut self.values[i * w..(i + 1) * w]
    }

    #[inline]
    #[must_use]
    pub fn get(&self, i: usize, k: usize) -> f64 {
        self.values[i * self.columns.len() + k]
    }

    /// Copy of column `k` across all rows
    #[must_use]
    pub fn column(&self, k: usize) -> Vec<f64> {
        (0..self.n_rows()).map(|i| self.get(i, k)).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.columns.len().max(1))
    }

    /// Concatenate tables column-wise; all must have the same row count.
    ///
    /// # Panics
    /// Panics if row counts differ.
    #[must_use]
    pub fn hstack(tables: &[&Self]) -> Self {
        let rows = tables.first().map_or(0, |t| t.n_rows());
        let columns: Vec<String> = tables.iter().flat_map(|t| t.columns.clone()).collect();
        let mut out = Self::zeros(columns, rows);
        for i in 0..rows {
            let mut offset = 0;
            for t in tables {
                assert_eq!(t.n_rows(), rows, "tables must have equal row counts");
                let w = t.n_columns();
                out.row_mut(i)[offset..offset + w].copy_from_slice(t.row(i));
                offset += w;
            }
        }
        out
    }

    /// Split into columns `..at` and `at..`
    ///
    /// # Panics
    /// Panics if `at` exceeds the column count.
    #[must_use]
    pub fn split_columns(&self, at: usize) -> (Self, Self) {
        let (left, right) = self.columns.split_at(at);
        let rows = self.n_rows();
        let mut a = Self::zeros(left.to_vec(), rows);
        let mut b = Self::zeros(right.to_vec(), rows);
        for i in 0..rows {
            let (l, r) = self.row(i).split_at(at);
            a.row_mut(i).copy_from_slice(l);
            b.row_mut(i).copy_from_slice(r);
        }
        (a, b)
    }
}

impl Serialize for FeatureTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let rows: Vec<&[f64]> = self.rows().collect();
        let mut state = serializer.serialize_struct("FeatureTable", 2)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}
