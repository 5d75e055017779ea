use super::{Point3, Vector3, TOLERANCE};

/// Radius-edge ratio of triangle `(a, b, c)`: circumradius over shortest edge.
///
/// Lower is better; an equilateral triangle scores `1 / sqrt(3)`.
/// Returns `None` for degenerate (collinear or coincident) triangles.
#[must_use]
pub fn radius_edge_ratio(a: &Point3, b: &Point3, c: &Point3) -> Option<f64> {
    let ab = b - a;
    let bc = c - b;
    let ca = a - c;
    let (lab, lbc, lca) = (ab.norm(), bc.norm(), ca.norm());
    let shortest = lab.min(lbc).min(lca);
    let twice_area = ab.cross(&(c - a)).norm();
    if shortest < TOLERANCE || twice_area < TOLERANCE {
        return None;
    }
    // R = |ab| |bc| |ca| / (4 * area)
    let circumradius = lab * lbc * lca / (2.0 * twice_area);
    Some(circumradius / shortest)
}

/// Unit normal of triangle `(a, b, c)` following its winding, or `None` if degenerate.
#[must_use]
pub fn facet_normal(a: &Point3, b: &Point3, c: &Point3) -> Option<Vector3> {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    if len < TOLERANCE {
        None
    } else {
        Some(n / len)
    }
}

/// Opening angle in `[0, π]` between two triangles hinged on edge `(a, b)`.
///
/// `p` and `q` are the apexes of the two triangles. A flat continuation
/// measures `π`; a triangle folded back onto its neighbour measures close
/// to `0`. Returns `None` if either apex lies on the hinge line.
#[must_use]
pub fn opening_angle(a: &Point3, b: &Point3, p: &Point3, q: &Point3) -> Option<f64> {
    let axis = b - a;
    let axis_len = axis.norm();
    if axis_len < TOLERANCE {
        return None;
    }
    let axis = axis / axis_len;
    let reject = |apex: &Point3| -> Option<Vector3> {
        let d = apex - a;
        let perp = d - axis * d.dot(&axis);
        let len = perp.norm();
        (len >= TOLERANCE).then(|| perp / len)
    };
    let u = reject(p)?;
    let v = reject(q)?;
    Some(u.dot(&v).clamp(-1.0, 1.0).acos())
}
