use std::ops::RangeInclusive;

use nalgebra::Point3;
use rayon::prelude::*;

use crate::types::ValuedId;

/// Uniform cubic cells over the bounding box of a point set, stored as one
/// flat member list with per-cell start offsets.
#[derive(Debug, Clone)]
struct CellGrid {
    origin: Point3<f64>,
    edge: f64,
    dims: [usize; 3],
    /// `members[starts[c]..starts[c + 1]]` are the points in cell `c`
    starts: Vec<usize>,
    members: Vec<usize>,
}

impl CellGrid {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn new(points: &[Point3<f64>], edge: f64) -> Self {
        let (origin, upper) = points.first().map_or((Point3::origin(), Point3::origin()), |first| {
            points
                .iter()
                .fold((*first, *first), |(lo, hi), p| (lo.inf(p), hi.sup(p)))
        });
        let dims = [0, 1, 2].map(|k| ((upper[k] - origin[k]) / edge).floor() as usize + 1);

        let mut grid = Self {
            origin,
            edge,
            dims,
            starts: Vec::new(),
            members: Vec::new(),
        };
        let cells: Vec<usize> = points.iter().map(|p| grid.cell_of(p)).collect();

        // Counting sort of point ids by cell
        let mut starts = vec![0; dims.iter().product::<usize>() + 1];
        for &c in &cells {
            starts[c + 1] += 1;
        }
        for c in 1..starts.len() {
            starts[c] += starts[c - 1];
        }
        let mut fill = starts.clone();
        let mut members = vec![0; points.len()];
        for (id, &c) in cells.iter().enumerate() {
            members[fill[c]] = id;
            fill[c] += 1;
        }
        grid.starts = starts;
        grid.members = members;
        grid
    }

    #[inline]
    const fn flat(&self, [x, y, z]: [usize; 3]) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn cell_of(&self, p: &Point3<f64>) -> usize {
        let coords = [0, 1, 2].map(|k| {
            let c = ((p[k] - self.origin[k]) / self.edge).floor().max(0.0) as usize;
            c.min(self.dims[k] - 1)
        });
        self.flat(coords)
    }

    /// Cells along `axis` overlapping `[value - radius, value + radius]`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn span(&self, value: f64, radius: f64, axis: usize) -> Option<RangeInclusive<usize>> {
        let last = (self.dims[axis] - 1) as f64;
        let lo = ((value - radius - self.origin[axis]) / self.edge).floor().max(0.0);
        let hi = ((value + radius - self.origin[axis]) / self.edge).floor().min(last);
        (lo <= hi).then(|| lo as usize..=hi as usize)
    }

    fn members(&self, cell: [usize; 3]) -> &[usize] {
        let c = self.flat(cell);
        &self.members[self.starts[c]..self.starts[c + 1]]
    }
}

/// Grid-based spatial index over particle centers answering range queries
pub struct PointsSearcher {
    points: Vec<Point3<f64>>,
    grid: CellGrid,
}

impl PointsSearcher {
    /// Index `points` on a grid whose cells have edge `cell_edge`.
    ///
    /// Queries are fastest when `cell_edge` is close to the typical query radius.
    pub fn new(points: &[Point3<f64>], cell_edge: f64) -> Self {
        let cell_edge = if cell_edge.is_finite() && cell_edge > 0.0 {
            cell_edge
        } else {
            1.0
        };
        Self {
            points: points.to_vec(),
            grid: CellGrid::new(points, cell_edge),
        }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// All points within `radius` of `center` (closed ball), sorted by distance.
    ///
    /// `exclude` skips one id, typically the query particle itself.
    pub fn find_ids_within(
        &self,
        center: &Point3<f64>,
        radius: f64,
        exclude: Option<usize>,
    ) -> Vec<ValuedId> {
        let mut result = Vec::new();
        if self.points.is_empty() || radius < 0.0 {
            return result;
        }
        let (Some(xs), Some(ys), Some(zs)) = (
            self.grid.span(center.x, radius, 0),
            self.grid.span(center.y, radius, 1),
            self.grid.span(center.z, radius, 2),
        ) else {
            return result;
        };

        let radius_squared = radius * radius;
        for z in zs {
            for y in ys.clone() {
                for x in xs.clone() {
                    for &id in self.grid.members([x, y, z]) {
                        if exclude == Some(id) {
                            continue;
                        }
                        let d2 = (self.points[id] - center).norm_squared();
                        if d2 <= radius_squared {
                            result.push(ValuedId::new(d2.sqrt(), id));
                        }
                    }
                }
            }
        }

        result.sort();
        result
    }

    /// All unordered pairs `(i, j, distance)` with `i < j` and distance ≤ `cutoff`.
    ///
    /// Every reported distance is recomputed and re-checked against the cutoff.
    pub fn find_pairs_within(&self, cutoff: f64) -> Vec<(usize, usize, f64)> {
        let per_point: Vec<Vec<(usize, usize, f64)>> = (0..self.points.len())
            .into_par_iter()
            .map(|i| {
                self.find_ids_within(&self.points[i], cutoff, Some(i))
                    .into_iter()
                    .filter(|v| v.index > i)
                    .map(|v| (i, v.index, (self.points[v.index] - self.points[i]).norm()))
                    .filter(|&(_, _, d)| d <= cutoff)
                    .collect()
            })
            .collect();
        per_point.into_iter().flatten().collect()
    }
}
