/// A 3D vector used for position, velocity and acceleration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3D {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn dot(&self, other: &Vector3D) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3D) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn sqr_magnitude(&self) -> f32 {
        self.dot(self)
    }

    pub fn magnitude(&self) -> f32 {
        sqrt(self.sqr_magnitude())
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            *self / mag
        } else {
            Self::zero()
        }
    }

    /// Clamps the magnitude to `max`.
    pub fn limit(&self, max: f32) -> Self {
        let sqr = self.sqr_magnitude();
        if sqr > max * max {
            self.normalize() * max
        } else {
            *self
        }
    }

    pub fn distance(&self, other: &Vector3D) -> f32 {
        (*self - *other).magnitude()
    }
}

#[cfg(feature = "std")]
pub(crate) fn sqrt(v: f32) -> f32 {
    v.sqrt()
}

#[cfg(not(feature = "std"))]
pub(crate) fn sqrt(v: f32) -> f32 {
    libm::sqrtf(v)
}

impl core::ops::Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl core::ops::Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl core::ops::Neg for Vector3D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl core::ops::Mul<f32> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl core::ops::Div<f32> for Vector3D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector3D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl core::ops::SubAssign for Vector3D {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
        self.z -= other.z;
    }
}

/// Rotation of a boid, stored as the orthonormal basis of its local frame.
///
/// Local `+Z` is forward, `+Y` is up and `+X` is right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub right: Vector3D,
    pub up: Vector3D,
    pub forward: Vector3D,
}

impl Orientation {
    pub const IDENTITY: Self = Self {
        right: Vector3D::RIGHT,
        up: Vector3D::UP,
        forward: Vector3D::FORWARD,
    };

    /// Rotation looking along `forward` with world `+Y` as the up hint.
    ///
    /// A zero `forward` gives the identity. When `forward` is parallel to the
    /// up hint, world `+X` is used as the right axis instead.
    pub fn look_rotation(forward: Vector3D) -> Self {
        let forward = forward.normalize();
        if forward.is_zero() {
            return Self::IDENTITY;
        }

        let mut right = Vector3D::UP.cross(&forward);
        if right.sqr_magnitude() < 1e-12 {
            right = Vector3D::RIGHT;
        } else {
            right = right.normalize();
        }
        let up = forward.cross(&right);

        Self { right, up, forward }
    }

    /// Maps a direction from the local frame into world space.
    pub fn transform_direction(&self, local: Vector3D) -> Vector3D {
        self.right * local.x + self.up * local.y + self.forward * local.z
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}
