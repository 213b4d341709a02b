//! Single Voronoi cell built by clipping the container box with bisector planes.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::geometry::{
    any_normal_of_vector, intersection_of_plane_and_segment, signed_distance_to_plane_unit,
    tetrahedron_volume, triangle_area,
};
use crate::types::BoundingBox;

/// Container wall bounding a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wall {
    XMin,
    XMax,
    YMin,
    YMax,
    ZMin,
    ZMax,
}

/// What lies on the other side of a cell face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceNeighbor {
    Particle(usize),
    Wall(Wall),
}

impl FaceNeighbor {
    /// Particle id, or `None` for container walls
    #[must_use]
    pub const fn particle(&self) -> Option<usize> {
        match self {
            Self::Particle(id) => Some(*id),
            Self::Wall(_) => None,
        }
    }
}

/// Planar convex face: cyclically ordered vertex ids into the owning cell.
#[derive(Debug, Clone)]
pub struct CellFace {
    pub vertices: Vec<usize>,
    pub neighbor: FaceNeighbor,
    /// Polygon area, filled in once the cell is complete
    pub area: f64,
}

impl CellFace {
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Convex Voronoi cell of one particle.
#[derive(Debug, Clone)]
pub struct VoronoiCell {
    center: Point3<f64>,
    vertices: Vec<Point3<f64>>,
    faces: Vec<CellFace>,
    volume: f64,
    tolerance: f64,
}

impl VoronoiCell {
    /// Start from the whole container around `center`
    #[must_use]
    pub fn from_box(center: Point3<f64>, bounds: &BoundingBox, tolerance: f64) -> Self {
        let (lo, hi) = (bounds.min, bounds.max);
        let vertices = vec![
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ];
        let face = |ids: [usize; 4], wall: Wall| CellFace {
            vertices: ids.to_vec(),
            neighbor: FaceNeighbor::Wall(wall),
            area: 0.0,
        };
        let faces = vec![
            face([0, 3, 7, 4], Wall::XMin),
            face([1, 2, 6, 5], Wall::XMax),
            face([0, 1, 5, 4], Wall::YMin),
            face([3, 2, 6, 7], Wall::YMax),
            face([0, 1, 2, 3], Wall::ZMin),
            face([4, 5, 6, 7], Wall::ZMax),
        ];
        Self {
            center,
            vertices,
            faces,
            volume: 0.0,
            tolerance,
        }
    }

    #[inline]
    #[must_use]
    pub const fn center(&self) -> &Point3<f64> {
        &self.center
    }

    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    #[inline]
    #[must_use]
    pub fn faces(&self) -> &[CellFace] {
        &self.faces
    }

    #[inline]
    #[must_use]
    pub const fn volume(&self) -> f64 {
        self.volume
    }

    /// Largest center-to-vertex distance; particles farther than twice this cannot cut the cell.
    #[must_use]
    pub fn max_radius(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| (v - self.center).norm_squared())
            .fold(0.0, f64::max)
            .sqrt()
    }

    /// Keep the half-space `normal·(x − plane_point) ≤ 0` (`normal` is unit length).
    ///
    /// Returns `true` if the cell was cut and gained a face facing `neighbor`.
    pub fn clip(
        &mut self,
        plane_point: &Point3<f64>,
        normal: &Vector3<f64>,
        neighbor: FaceNeighbor,
    ) -> bool {
        let tol = self.tolerance;
        let dist: Vec<f64> = self
            .vertices
            .iter()
            .map(|v| signed_distance_to_plane_unit(plane_point, normal, v))
            .collect();
        let side: Vec<i8> = dist
            .iter()
            .map(|&d| {
                if d > tol {
                    1
                } else if d < -tol {
                    -1
                } else {
                    0
                }
            })
            .collect();

        if side.iter().all(|&s| s <= 0) {
            return false;
        }

        let mut cut_cache: HashMap<(usize, usize), usize> = HashMap::new();
        let mut cap: Vec<usize> = Vec::new();
        let mut new_faces = Vec::with_capacity(self.faces.len() + 1);

        for face in &self.faces {
            let n = face.vertices.len();
            let mut polygon = Vec::with_capacity(n + 1);
            for k in 0..n {
                let a = face.vertices[k];
                let b = face.vertices[(k + 1) % n];
                if side[a] <= 0 {
                    polygon.push(a);
                    if side[a] == 0 && !cap.contains(&a) {
                        cap.push(a);
                    }
                }
                if side[a] * side[b] < 0 {
                    let key = (a.min(b), a.max(b));
                    let id = *cut_cache.entry(key).or_insert_with(|| {
                        let p = intersection_of_plane_and_segment(
                            &self.vertices[a],
                            &self.vertices[b],
                            dist[a],
                            dist[b],
                        );
                        self.vertices.push(p);
                        self.vertices.len() - 1
                    });
                    polygon.push(id);
                    if !cap.contains(&id) {
                        cap.push(id);
                    }
                }
            }
            if polygon.len() >= 3 {
                new_faces.push(CellFace {
                    vertices: polygon,
                    neighbor: face.neighbor,
                    area: 0.0,
                });
            }
        }

        if cap.len() >= 3 {
            let ordered = self.order_around_normal(&cap, normal);
            new_faces.push(CellFace {
                vertices: ordered,
                neighbor,
                area: 0.0,
            });
        }

        self.faces = new_faces;
        self.compact_vertices();
        true
    }

    /// Sort coplanar vertex ids counter-clockwise around `normal`
    fn order_around_normal(&self, ids: &[usize], normal: &Vector3<f64>) -> Vec<usize> {
        #[allow(clippy::cast_precision_loss)]
        let centroid = ids
            .iter()
            .fold(Vector3::zeros(), |acc, &i| acc + self.vertices[i].coords)
            / ids.len() as f64;
        let e1 = any_normal_of_vector(normal);
        let e2 = normal.cross(&e1);
        let mut keyed: Vec<(f64, usize)> = ids
            .iter()
            .map(|&i| {
                let r = self.vertices[i].coords - centroid;
                (r.dot(&e2).atan2(r.dot(&e1)), i)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        keyed.into_iter().map(|(_, i)| i).collect()
    }

    /// Drop vertices no face references and renumber the rest
    fn compact_vertices(&mut self) {
        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len());
        for face in &mut self.faces {
            for v in &mut face.vertices {
                if remap[*v] == usize::MAX {
                    remap[*v] = kept.len();
                    kept.push(self.vertices[*v]);
                }
                *v = remap[*v];
            }
        }
        self.vertices = kept;
    }

    /// Area of a face by fan triangulation of its polygon
    #[must_use]
    pub fn polygon_area(&self, ids: &[usize]) -> f64 {
        if ids.len() < 3 {
            return 0.0;
        }
        let a = &self.vertices[ids[0]];
        ids.windows(2)
            .skip(1)
            .map(|w| triangle_area(a, &self.vertices[w[0]], &self.vertices[w[1]]))
            .sum()
    }

    /// Fill in face areas and the cell volume after the last clip.
    pub fn finalize(&mut self) {
        let areas: Vec<f64> = self
            .faces
            .iter()
            .map(|f| self.polygon_area(&f.vertices))
            .collect();
        for (face, area) in self.faces.iter_mut().zip(areas) {
            face.area = area;
        }

        self.volume = self
            .faces
            .iter()
            .map(|f| {
                let a = &self.vertices[f.vertices[0]];
                f.vertices
                    .windows(2)
                    .skip(1)
                    .map(|w| {
                        tetrahedron_volume(&self.center, a, &self.vertices[w[0]], &self.vertices[w[1]])
                    })
                    .sum::<f64>()
            })
            .sum();
    }

    /// Faces that face another particle
    pub fn particle_faces(&self) -> impl Iterator<Item = (usize, &CellFace)> {
        self.faces
            .iter()
            .filter_map(|f| f.neighbor.particle().map(|id| (id, f)))
    }
}
