//! Incremental 3-D convex hull, returning the triangulated boundary.

use std::collections::HashMap;

use log::debug;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::geometry::EPSILON;
use crate::neighbor_graph::NeighborGraph;

/// Smallest shell that can span a solid hull.
pub const MIN_HULL_MEMBERS: usize = 4;

/// Insertion attempts allowed per input point before the hull is returned as is
const INSERTIONS_PER_POINT: usize = 4;

#[derive(Debug, Clone)]
struct HullFace {
    vertices: [usize; 3],
    normal: Vector3<f64>,
    offset: f64,
}

impl HullFace {
    /// Face through `vertices`, oriented so that `interior` lies on its negative side
    fn oriented(mut vertices: [usize; 3], points: &[Point3<f64>], interior: &Point3<f64>) -> Self {
        let mut face = Self::new(vertices, points);
        if face.distance(interior) > 0.0 {
            vertices.swap(0, 1);
            face = Self::new(vertices, points);
        }
        face
    }

    fn new(vertices: [usize; 3], points: &[Point3<f64>]) -> Self {
        let [a, b, c] = vertices.map(|i| points[i]);
        let raw = (b - a).cross(&(c - a));
        let norm = raw.norm();
        let normal = if norm > 0.0 { raw / norm } else { Vector3::zeros() };
        Self {
            vertices,
            normal,
            offset: -normal.dot(&a.coords),
        }
    }

    #[inline]
    fn distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) + self.offset
    }

    #[inline]
    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Triangles of the convex hull of `points`, as index triples into `points`,
/// each wound counter-clockwise seen from outside.
///
/// Returns `None` for fewer than 4 points or when all points are coplanar.
/// Points lying on the hull surface within tolerance are not made vertices.
///
/// Points are inserted farthest first. The faces a point sees are grown from
/// the face it is farthest above and closed into a disc, so the boundary stays
/// a closed two-manifold even when visibility tests disagree near the tolerance.
#[must_use]
pub fn convex_hull_triangles(points: &[Point3<f64>]) -> Option<Vec<[usize; 3]>> {
    if points.len() < MIN_HULL_MEMBERS {
        return None;
    }
    let extent = points
        .iter()
        .map(|p| (p - points[0]).norm())
        .fold(0.0, f64::max);
    let tol = EPSILON * extent.max(1.0);

    let [p0, p1, p2, p3] = initial_simplex(points, tol)?;
    let interior = Point3::from(
        (points[p0].coords + points[p1].coords + points[p2].coords + points[p3].coords) / 4.0,
    );

    let mut faces = vec![
        HullFace::oriented([p0, p1, p2], points, &interior),
        HullFace::oriented([p0, p1, p3], points, &interior),
        HullFace::oriented([p0, p2, p3], points, &interior),
        HullFace::oriented([p1, p2, p3], points, &interior),
    ];

    let mut on_hull = vec![false; points.len()];
    let mut skipped = vec![false; points.len()];
    for _ in 0..INSERTIONS_PER_POINT * points.len() {
        on_hull.fill(false);
        for face in &faces {
            for &v in &face.vertices {
                on_hull[v] = true;
            }
        }
        let Some((eye, start)) = farthest_outside(points, &faces, &on_hull, &skipped, tol) else {
            break;
        };
        match insert_point(&faces, points, eye, start, tol) {
            Some(next) => faces = next,
            None => {
                debug!("hull point {eye} could not be inserted");
                skipped[eye] = true;
            }
        }
    }

    Some(faces.into_iter().map(|f| f.vertices).collect())
}

/// Point farthest above any face, with the face it is farthest above.
fn farthest_outside(
    points: &[Point3<f64>],
    faces: &[HullFace],
    on_hull: &[bool],
    skipped: &[bool],
    tol: f64,
) -> Option<(usize, usize)> {
    let mut best: Option<(f64, usize, usize)> = None;
    for (id, p) in points.iter().enumerate() {
        if on_hull[id] || skipped[id] {
            continue;
        }
        for (f, face) in faces.iter().enumerate() {
            let d = face.distance(p);
            if d > tol && best.is_none_or(|(top, _, _)| d > top) {
                best = Some((d, id, f));
            }
        }
    }
    best.map(|(_, id, f)| (id, f))
}

/// Hull after adding `eye`, or `None` if no disc of visible faces exists.
fn insert_point(
    faces: &[HullFace],
    points: &[Point3<f64>],
    eye: usize,
    start: usize,
    tol: f64,
) -> Option<Vec<HullFace>> {
    let adjacency = face_adjacency(faces)?;
    let distances: Vec<f64> = faces.iter().map(|f| f.distance(&points[eye])).collect();
    let visible = visible_disc(faces, &adjacency, &distances, start, tol)?;

    let mut next: Vec<HullFace> = Vec::with_capacity(faces.len() + 4);
    for (f, face) in faces.iter().enumerate() {
        if !visible[f] {
            next.push(face.clone());
            continue;
        }
        for (k, &(a, b)) in face.edges().iter().enumerate() {
            if !visible[adjacency[f][k]] {
                next.push(HullFace::new([a, b, eye], points));
            }
        }
    }
    Some(next)
}

/// For each face edge `(a, b)`, the face holding the twin edge `(b, a)`.
fn face_adjacency(faces: &[HullFace]) -> Option<Vec<[usize; 3]>> {
    let owner: HashMap<(usize, usize), usize> = faces
        .iter()
        .enumerate()
        .flat_map(|(f, face)| face.edges().map(|edge| (edge, f)))
        .collect();
    faces
        .iter()
        .map(|face| {
            let [e0, e1, e2] = face.edges();
            Some([
                *owner.get(&(e0.1, e0.0))?,
                *owner.get(&(e1.1, e1.0))?,
                *owner.get(&(e2.1, e2.0))?,
            ])
        })
        .collect()
}

/// Faces reachable from `start` through `include`d faces.
fn flood(adjacency: &[[usize; 3]], start: usize, include: impl Fn(usize) -> bool) -> Vec<bool> {
    let mut reached = vec![false; adjacency.len()];
    reached[start] = true;
    let mut stack = vec![start];
    while let Some(f) = stack.pop() {
        for &g in &adjacency[f] {
            if !reached[g] && include(g) {
                reached[g] = true;
                stack.push(g);
            }
        }
    }
    reached
}

/// Visible faces as a disc bounded by one simple horizon loop.
///
/// Starts from the faces connected to `start` that lie below the eye, fills
/// any hidden islands they enclose and absorbs the faces around a vertex the
/// horizon passes twice.
fn visible_disc(
    faces: &[HullFace],
    adjacency: &[[usize; 3]],
    distances: &[f64],
    start: usize,
    tol: f64,
) -> Option<Vec<bool>> {
    let mut visible = flood(adjacency, start, |f| distances[f] > tol);
    loop {
        let hidden_start = (0..faces.len())
            .filter(|&f| !visible[f])
            .min_by(|&a, &b| distances[a].total_cmp(&distances[b]))?;
        let hidden = flood(adjacency, hidden_start, |f| !visible[f]);
        for (v, h) in visible.iter_mut().zip(&hidden) {
            *v = !h;
        }
        match pinched_vertex(faces, adjacency, &visible) {
            None => return Some(visible),
            Some(vertex) => {
                for (v, face) in visible.iter_mut().zip(faces) {
                    if face.vertices.contains(&vertex) {
                        *v = true;
                    }
                }
            }
        }
    }
}

/// A horizon vertex that prevents the horizon from being one simple loop.
fn pinched_vertex(faces: &[HullFace], adjacency: &[[usize; 3]], visible: &[bool]) -> Option<usize> {
    let mut next: HashMap<usize, usize> = HashMap::new();
    let mut first = None;
    for (f, face) in faces.iter().enumerate().filter(|&(f, _)| visible[f]) {
        for (k, &(a, b)) in face.edges().iter().enumerate() {
            if visible[adjacency[f][k]] {
                continue;
            }
            if next.insert(a, b).is_some() {
                return Some(a);
            }
            first.get_or_insert(a);
        }
    }
    let first = first?;
    let mut vertex = first;
    let mut steps = 0;
    while steps < next.len() {
        steps += 1;
        match next.get(&vertex) {
            Some(&v) if v != first => vertex = v,
            _ => break,
        }
    }
    (steps != next.len()).then_some(first)
}

/// Hull triangles of every particle's neighbor shell, as global particle ids.
///
/// Shells with fewer than `min_members` neighbors, or whose neighbors are
/// coplanar, yield `None`. A `min_members` below [`MIN_HULL_MEMBERS`] acts as
/// [`MIN_HULL_MEMBERS`], since three or fewer points never enclose a volume.
#[must_use]
pub fn shell_triangulations(
    positions: &[Point3<f64>],
    graph: &NeighborGraph,
    min_members: usize,
) -> Vec<Option<Vec<[usize; 3]>>> {
    let shells: Vec<Option<Vec<[usize; 3]>>> = (0..positions.len())
        .into_par_iter()
        .map(|i| {
            let neighbors = graph.neighbors(i);
            if neighbors.len() < min_members.max(MIN_HULL_MEMBERS) {
                return None;
            }
            let points: Vec<Point3<f64>> = neighbors.iter().map(|&j| positions[j]).collect();
            convex_hull_triangles(&points)
                .map(|triangles| triangles.into_iter().map(|t| t.map(|k| neighbors[k])).collect())
        })
        .collect();

    let degenerate = shells.iter().filter(|s| s.is_none()).count();
    debug!("{degenerate} of {} neighbor shells have no hull", shells.len());
    shells
}

/// Four affinely independent points spanning the set, or `None` if the set is flat.
fn initial_simplex(points: &[Point3<f64>], tol: f64) -> Option<[usize; 4]> {
    let farthest = |score: &dyn Fn(&Point3<f64>) -> f64| {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (score(p), i))
            .max_by(|a, b| a.0.total_cmp(&b.0))
    };

    let p0 = 0;
    let (d1, p1) = farthest(&|p| (p - points[p0]).norm())?;
    if d1 <= tol {
        return None;
    }
    let axis = (points[p1] - points[p0]) / d1;
    let (d2, p2) = farthest(&|p| (p - points[p0]).cross(&axis).norm())?;
    if d2 <= tol {
        return None;
    }
    let normal = (points[p1] - points[p0])
        .cross(&(points[p2] - points[p0]))
        .normalize();
    let (d3, p3) = farthest(&|p| normal.dot(&(p - points[p0])).abs())?;
    if d3 <= tol {
        return None;
    }
    Some([p0, p1, p2, p3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{tetrahedron_volume, triangle_area};
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn cube() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for &x in &[0.0, 1.0] {
            for &y in &[0.0, 1.0] {
                for &z in &[0.0, 1.0] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        points
    }

    fn area(points: &[Point3<f64>], triangles: &[[usize; 3]]) -> f64 {
        triangles
            .iter()
            .map(|t| triangle_area(&points[t[0]], &points[t[1]], &points[t[2]]))
            .sum()
    }

    #[test]
    fn test_tetrahedron_hull() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let triangles = convex_hull_triangles(&points).unwrap();
        assert_eq!(triangles.len(), 4);
    }

    #[test]
    fn test_cube_hull_ignores_interior_points() {
        let mut points = cube();
        points.push(Point3::new(0.5, 0.5, 0.5));
        points.push(Point3::new(0.2, 0.7, 0.4));
        let triangles = convex_hull_triangles(&points).unwrap();
        assert_eq!(triangles.len(), 12);
        assert!(triangles.iter().flatten().all(|&i| i < 8));
        assert_relative_eq!(area(&points, &triangles), 6.0, epsilon = 1e-12);

        // Outward-facing triangles around an interior point tile the volume
        let c = Point3::new(0.5, 0.5, 0.5);
        let volume: f64 = triangles
            .iter()
            .map(|t| tetrahedron_volume(&c, &points[t[0]], &points[t[1]], &points[t[2]]))
            .sum();
        assert_relative_eq!(volume, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_octahedron_orientation() {
        let points = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let triangles = convex_hull_triangles(&points).unwrap();
        assert_eq!(triangles.len(), 8);
        for t in &triangles {
            let face = HullFace::new(*t, &points);
            assert!(face.distance(&Point3::origin()) < 0.0);
        }
    }

    #[test]
    fn test_shell_triangulations_use_particle_ids() {
        // Particle 0 at the center of an octahedron of neighbors 1..=6
        let mut positions = vec![Point3::origin()];
        for axis in 0..3 {
            for sign in [1.0, -1.0] {
                let mut p = Point3::origin();
                p[axis] = sign;
                positions.push(p);
            }
        }
        let graph = NeighborGraph::from_pairs(7, (1..7).map(|j| (0, j)));
        let shells = shell_triangulations(&positions, &graph, 4);
        let triangles = shells[0].as_ref().unwrap();
        assert_eq!(triangles.len(), 8);
        assert!(triangles.iter().flatten().all(|&id| (1..7).contains(&id)));
        assert!(shells[1..].iter().all(Option::is_none));
    }

    #[test]
    fn test_degenerate_inputs() {
        let flat = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.5, 0.3, 0.0),
        ];
        assert!(convex_hull_triangles(&flat).is_none());
        assert!(convex_hull_triangles(&flat[..3]).is_none());
        let line: Vec<_> = (0..5).map(|i| Point3::new(f64::from(i), 0.0, 0.0)).collect();
        assert!(convex_hull_triangles(&line).is_none());
    }

    #[test]
    fn test_small_min_members_acts_as_four() {
        // A three-neighbor shell never gets a hull, whatever the requested minimum
        let positions = vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let graph = NeighborGraph::from_pairs(4, (1..4).map(|j| (0, j)));
        for min_members in 0..MIN_HULL_MEMBERS {
            let shells = shell_triangulations(&positions, &graph, min_members);
            assert!(shells.iter().all(Option::is_none));
        }
    }

    /// Points moved by a deterministic pseudo-random offset in `[-amplitude, amplitude]` per axis
    #[allow(clippy::cast_precision_loss)]
    fn jittered(points: &[Point3<f64>], amplitude: f64, seed: u64) -> Vec<Point3<f64>> {
        let mut state = seed ^ 0x9e37_79b9_7f4a_7c15;
        let mut uniform = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1_u64 << 53) as f64 * 2.0 - 1.0
        };
        points
            .iter()
            .map(|p| p + Vector3::new(uniform(), uniform(), uniform()) * amplitude)
            .collect()
    }

    fn cuboctahedron() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            for a in [1.0, -1.0] {
                for b in [1.0, -1.0] {
                    let mut p = Point3::origin();
                    p[i] = a;
                    p[j] = b;
                    points.push(p);
                }
            }
        }
        points
    }

    /// Corners of the cube `[-1, 1]^3` followed by its twelve edge midpoints
    fn cube_with_edge_midpoints() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for x in [1.0, -1.0] {
            for y in [1.0, -1.0] {
                for z in [1.0, -1.0] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        points.extend(cuboctahedron());
        points
    }

    /// Every directed edge appears once with its twin, and no point lies in front of a face.
    fn assert_closed_and_enclosing(points: &[Point3<f64>], triangles: &[[usize; 3]]) {
        let mut edges: HashMap<(usize, usize), usize> = HashMap::new();
        for &[a, b, c] in triangles {
            for edge in [(a, b), (b, c), (c, a)] {
                *edges.entry(edge).or_default() += 1;
            }
        }
        for (&(a, b), &count) in &edges {
            assert_eq!(count, 1, "edge ({a}, {b}) used {count} times");
            assert_eq!(edges.get(&(b, a)), Some(&1), "edge ({a}, {b}) has no twin");
        }
        for &[a, b, c] in triangles {
            // Unnormalized so that slivers do not amplify rounding
            let normal = (points[b] - points[a]).cross(&(points[c] - points[a]));
            for p in points {
                let height = normal.dot(&(p - points[a]));
                assert!(height <= 1e-7, "point in front of face ({a}, {b}, {c}) by {height}");
            }
        }
    }

    #[test]
    fn test_jittered_cuboctahedron_stays_closed() {
        let base = cuboctahedron();
        for amplitude in [3e-10, 1e-9] {
            for seed in 0..200 {
                let points = jittered(&base, amplitude, seed);
                let triangles = convex_hull_triangles(&points).unwrap();
                assert_closed_and_enclosing(&points, &triangles);
                let expected = 12.0 + 4.0 * 3.0_f64.sqrt();
                assert_relative_eq!(area(&points, &triangles), expected, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_jittered_collinear_points_stay_closed() {
        let base = cube_with_edge_midpoints();
        for amplitude in [1e-9, 1e-8, 1e-7, 1e-6] {
            for seed in 0..100 {
                let points = jittered(&base, amplitude, seed);
                let triangles = convex_hull_triangles(&points).unwrap();
                assert_closed_and_enclosing(&points, &triangles);
                assert_relative_eq!(area(&points, &triangles), 24.0, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_exact_edge_midpoints_are_not_vertices() {
        let points = cube_with_edge_midpoints();
        let triangles = convex_hull_triangles(&points).unwrap();
        assert_eq!(triangles.len(), 12);
        assert!(triangles.iter().flatten().all(|&i| i < 8));
        assert_closed_and_enclosing(&points, &triangles);
    }
}
