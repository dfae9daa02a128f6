/// A 2D vector used for position, velocity and force.
///
/// All transcendental math goes through `libm`, so trajectories computed on
/// different targets (native, wasm32) agree bit for bit given the same inputs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Unit vector pointing along `angle` (radians, counter-clockwise from +x).
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: libm::cosf(angle),
            y: libm::sinf(angle),
        }
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.magnitude_squared())
    }

    /// Returns the unit vector in the same direction, or zero for a zero vector.
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self {
                x: self.x / mag,
                y: self.y / mag,
            }
        } else {
            Self::zero()
        }
    }

    /// Rescales to exactly `magnitude`. A zero vector stays zero.
    pub fn with_magnitude(&self, magnitude: f32) -> Self {
        self.normalize() * magnitude
    }

    /// Clamps the magnitude to at most `max`.
    pub fn limit(&self, max: f32) -> Self {
        let mag_sq = self.magnitude_squared();
        if mag_sq > max * max {
            self.normalize() * max
        } else {
            *self
        }
    }

    pub fn distance(&self, other: &Vector2D) -> f32 {
        (*self - *other).magnitude()
    }

    pub fn distance_squared(&self, other: &Vector2D) -> f32 {
        (*self - *other).magnitude_squared()
    }

    /// Direction of travel in radians, `atan2(y, x)`.
    pub fn heading(&self) -> f32 {
        libm::atan2f(self.y, self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl core::ops::Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl core::ops::Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl core::ops::Neg for Vector2D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl core::ops::Mul<f32> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl core::ops::Div<f32> for Vector2D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl core::ops::SubAssign for Vector2D {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl core::ops::MulAssign<f32> for Vector2D {
    fn mul_assign(&mut self, scalar: f32) {
        self.x *= scalar;
        self.y *= scalar;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector2d_magnitude() {
        let v = Vector2D::new(3.0, 4.0);
        assert_eq!(v.magnitude(), 5.0);
        assert_eq!(v.magnitude_squared(), 25.0);
    }

    #[test]
    fn test_vector2d_normalize() {
        let v = Vector2D::new(3.0, 4.0);
        let normalized = v.normalize();
        assert!((normalized.magnitude() - 1.0).abs() < 0.0001);
        assert_eq!(Vector2D::zero().normalize(), Vector2D::zero());
    }

    #[test]
    fn test_vector2d_limit() {
        let v = Vector2D::new(30.0, 40.0);
        let limited = v.limit(5.0);
        assert!((limited.magnitude() - 5.0).abs() < 0.0001);
        assert!((limited.x - 3.0).abs() < 0.0001);

        let short = Vector2D::new(0.3, 0.4);
        assert_eq!(short.limit(5.0), short);
    }

    #[test]
    fn test_vector2d_with_magnitude() {
        let v = Vector2D::new(0.0, 0.5).with_magnitude(3.0);
        assert!((v.y - 3.0).abs() < 0.0001);
        assert_eq!(Vector2D::zero().with_magnitude(3.0), Vector2D::zero());
    }

    #[test]
    fn test_vector2d_operations() {
        let v1 = Vector2D::new(1.0, 2.0);
        let v2 = Vector2D::new(3.0, 4.0);

        let sum = v1 + v2;
        assert_eq!(sum, Vector2D::new(4.0, 6.0));

        let diff = v2 - v1;
        assert_eq!(diff, Vector2D::new(2.0, 2.0));

        assert_eq!(v1 * 2.0, Vector2D::new(2.0, 4.0));
        assert_eq!(v2 / 2.0, Vector2D::new(1.5, 2.0));
        assert_eq!(-v1, Vector2D::new(-1.0, -2.0));

        let mut acc = v1;
        acc += v2;
        acc -= v1;
        acc *= 0.5;
        assert_eq!(acc, Vector2D::new(1.5, 2.0));
    }

    #[test]
    fn test_heading_and_from_angle() {
        let v = Vector2D::new(0.0, 2.0);
        assert!((v.heading() - core::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let unit = Vector2D::from_angle(core::f32::consts::PI);
        assert!((unit.x + 1.0).abs() < 1e-6);
        assert!(unit.y.abs() < 1e-6);
    }

    #[test]
    fn test_distance() {
        let a = Vector2D::new(0.0, 0.0);
        let b = Vector2D::new(6.0, 8.0);
        assert_eq!(a.distance(&b), 10.0);
        assert_eq!(a.distance_squared(&b), 100.0);
    }
}
