use crate::vector::{sqrt, Vector3D};

/// Maximum number of obstacle probe directions a flock can carry.
pub const MAX_PROBE_DIRECTIONS: usize = 300;

/// Ordered obstacle probe directions in a boid's local frame.
///
/// Directions are ordered by preference: index 0 points straight ahead and
/// the angle away from forward grows with the index, so the first clear probe
/// is the smallest deviation from the current heading.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeDirections {
    directions: heapless::Vec<Vector3D, MAX_PROBE_DIRECTIONS>,
}

impl ProbeDirections {
    /// Points distributed on a golden-angle spiral over the unit sphere,
    /// starting at local forward.
    pub fn golden_spiral(count: usize) -> Self {
        let count = count.min(MAX_PROBE_DIRECTIONS);
        let golden_ratio = (1.0 + sqrt(5.0)) / 2.0;
        let angle_increment = core::f32::consts::PI * 2.0 * golden_ratio;

        let mut directions = heapless::Vec::new();
        for i in 0..count {
            let t = i as f32 / count as f32;
            let inclination = acos(1.0 - 2.0 * t);
            let azimuth = angle_increment * i as f32;

            let x = sin(inclination) * cos(azimuth);
            let y = sin(inclination) * sin(azimuth);
            let z = cos(inclination);
            // Capacity is bounded by the clamp above.
            let _ = directions.push(Vector3D::new(x, y, z));
        }

        Self { directions }
    }

    /// Builds a probe set from explicit directions, normalizing each one.
    ///
    /// Zero vectors are dropped. Returns the directions that did not fit.
    pub fn from_directions<I>(directions: I) -> Result<Self, usize>
    where
        I: IntoIterator<Item = Vector3D>,
    {
        let mut probes = heapless::Vec::new();
        let mut overflow = 0;
        for dir in directions {
            let dir = dir.normalize();
            if dir.is_zero() {
                continue;
            }
            if probes.push(dir).is_err() {
                overflow += 1;
            }
        }

        if overflow > 0 {
            Err(overflow)
        } else {
            Ok(Self { directions: probes })
        }
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Vector3D> {
        self.directions.iter()
    }

    pub fn as_slice(&self) -> &[Vector3D] {
        &self.directions
    }
}

impl Default for ProbeDirections {
    fn default() -> Self {
        Self::golden_spiral(MAX_PROBE_DIRECTIONS)
    }
}

impl<'a> IntoIterator for &'a ProbeDirections {
    type Item = &'a Vector3D;
    type IntoIter = core::slice::Iter<'a, Vector3D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "std")]
fn acos(v: f32) -> f32 {
    v.acos()
}
#[cfg(feature = "std")]
fn sin(v: f32) -> f32 {
    v.sin()
}
#[cfg(feature = "std")]
fn cos(v: f32) -> f32 {
    v.cos()
}

#[cfg(not(feature = "std"))]
fn acos(v: f32) -> f32 {
    libm::acosf(v)
}
#[cfg(not(feature = "std"))]
fn sin(v: f32) -> f32 {
    libm::sinf(v)
}
#[cfg(not(feature = "std"))]
fn cos(v: f32) -> f32 {
    libm::cosf(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_probe_is_forward() {
        let probes = ProbeDirections::golden_spiral(50);
        assert_eq!(probes.len(), 50);
        assert_eq!(probes.as_slice()[0], Vector3D::FORWARD);
    }

    #[test]
    fn test_probes_are_unit_and_ordered_by_deviation() {
        let probes = ProbeDirections::default();
        assert_eq!(probes.len(), MAX_PROBE_DIRECTIONS);

        let mut last_z = f32::INFINITY;
        for dir in &probes {
            assert!((dir.magnitude() - 1.0).abs() < 1e-4);
            // z is cos(angle from forward), so it must not increase.
            assert!(dir.z <= last_z + 1e-6);
            last_z = dir.z;
        }
        assert!(last_z < -0.9);
    }

    #[test]
    fn test_golden_spiral_clamps_to_capacity() {
        let probes = ProbeDirections::golden_spiral(MAX_PROBE_DIRECTIONS * 2);
        assert_eq!(probes.len(), MAX_PROBE_DIRECTIONS);
    }

    #[test]
    fn test_from_directions_normalizes_and_skips_zero() {
        let probes = ProbeDirections::from_directions([
            Vector3D::new(0.0, 0.0, 3.0),
            Vector3D::zero(),
            Vector3D::new(2.0, 0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(probes.as_slice(), &[Vector3D::FORWARD, Vector3D::RIGHT]);
    }

    #[test]
    fn test_from_directions_reports_overflow() {
        let dirs = core::iter::repeat(Vector3D::FORWARD).take(MAX_PROBE_DIRECTIONS + 3);
        assert_eq!(ProbeDirections::from_directions(dirs), Err(3));
    }
}
