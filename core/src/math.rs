//! Math type aliases and geometry helpers used by buffer extraction.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// Convert a stored position into a vector.
#[inline]
pub fn vec3(p: [f32; 3]) -> Vec3 {
    Vec3::new(p[0], p[1], p[2])
}

/// Convert a stored UV coordinate into a vector.
#[inline]
pub fn vec2(p: [f32; 2]) -> Vec2 {
    Vec2::new(p[0], p[1])
}

/// Newell normal of a polygon. Returns +Z for degenerate polygons.
pub fn face_normal(points: impl Iterator<Item = [f32; 3]> + Clone) -> Vec3 {
    let mut n = Vec3::zeros();
    let first = points.clone().next();
    let mut prev: Option<Vec3> = None;
    for p in points.map(vec3) {
        if let Some(a) = prev {
            n += a.cross(&p);
        }
        prev = Some(p);
    }
    if let (Some(last), Some(first)) = (prev, first) {
        n += last.cross(&vec3(first));
    }
    n.try_normalize(f32::EPSILON)
        .unwrap_or_else(|| Vec3::new(0.0, 0.0, 1.0))
}

/// Area of a 3D triangle.
pub fn triangle_area(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> f32 {
    let ab = vec3(b) - vec3(a);
    let ac = vec3(c) - vec3(a);
    0.5 * ab.cross(&ac).norm()
}

/// Unsigned area of a UV triangle.
pub fn uv_triangle_area(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    let ab = vec2(b) - vec2(a);
    let ac = vec2(c) - vec2(a);
    0.5 * (ab.x * ac.y - ab.y * ac.x).abs()
}

/// Interior angle at `corner` between the edges to `prev` and `next`, in radians.
pub fn corner_angle(prev: Vec3, corner: Vec3, next: Vec3) -> f32 {
    let a = (prev - corner).try_normalize(f32::EPSILON);
    let b = (next - corner).try_normalize(f32::EPSILON);
    match (a, b) {
        (Some(a), Some(b)) => a.dot(&b).clamp(-1.0, 1.0).acos(),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_normal_of_ccw_quad() {
        let quad = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let n = face_normal(quad.iter().copied());
        assert!((n - Vec3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_normal_falls_back_to_up() {
        let line = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert_eq!(face_normal(line.iter().copied()), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_triangle_areas() {
        assert!((triangle_area([0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]) - 0.5).abs() < 1e-6);
        assert!((uv_triangle_area([0.0, 0.0], [0.0, 2.0], [2.0, 0.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_right_corner_angle() {
        let angle = corner_angle(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
