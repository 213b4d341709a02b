use nalgebra::{Point3, Vector3};

/// Tolerance for floating-point comparisons.
/// Clipping and hull construction share this epsilon so that a vertex
/// classified as "on" a plane in one place is never "outside" in another.
pub const EPSILON: f64 = 1e-10;

/// Signed distance from point to plane (assumes `plane_normal` is unit length)
#[inline]
pub fn signed_distance_to_plane_unit(
    plane_point: &Point3<f64>,
    plane_normal: &Vector3<f64>,
    x: &Point3<f64>,
) -> f64 {
    plane_normal.dot(&(x - plane_point))
}

/// Point where segment ab crosses the plane given the signed distances of its ends
#[inline]
pub fn intersection_of_plane_and_segment(
    a: &Point3<f64>,
    b: &Point3<f64>,
    da: f64,
    db: f64,
) -> Point3<f64> {
    let t = da / (da - db);
    a + (b - a) * t
}

/// Triangle area from three points
#[inline]
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).norm() / 2.0
}

/// Unsigned tetrahedron volume from four points
#[inline]
pub fn tetrahedron_volume(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    (d - a).dot(&(b - a).cross(&(c - a))).abs() / 6.0
}

/// Cosine of the angle at vertex o between rays to a and b
#[inline]
pub fn cos_angle(o: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let u = a - o;
    let v = b - o;
    u.dot(&v) / (u.norm() * v.norm())
}

/// Solid angle subtended at vertex `a` by the triangle (b, c, d).
///
/// Van Oosterom–Strackee form, taken as an absolute value so vertex order does not matter.
#[allow(clippy::many_single_char_names)]
pub fn solid_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let u = b - a;
    let v = c - a;
    let w = d - a;
    let (lu, lv, lw) = (u.norm(), v.norm(), w.norm());
    let numerator = u.dot(&v.cross(&w)).abs();
    let denominator = lw.mul_add(u.dot(&v), lu * lv * lw) + lv * u.dot(&w) + lu * v.dot(&w);
    2.0 * numerator.atan2(denominator)
}

/// Volume of the four sphere sectors cut by tetrahedron (a, b, c, d) from
/// equal spheres of radius `r` centered on its vertices.
pub fn tetrahedron_sector_volume(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
    r: f64,
) -> f64 {
    let omega = solid_angle(a, b, c, d)
        + solid_angle(b, a, c, d)
        + solid_angle(c, a, b, d)
        + solid_angle(d, a, b, c);
    omega * r * r * r / 3.0
}

/// Find any vector perpendicular to the given vector
pub fn any_normal_of_vector(a: &Vector3<f64>) -> Vector3<f64> {
    let helper = if a.x.abs() <= a.y.abs() && a.x.abs() <= a.z.abs() {
        Vector3::x()
    } else if a.y.abs() <= a.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    a.cross(&helper).normalize()
}
