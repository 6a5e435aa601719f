use flock_core::{EntityHost, EntityId, LayerMask, ObstacleQuery, Orientation, Vector3D};

/// Static obstacle geometry the boids steer around
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Obstacle {
    Sphere {
        center: Vector3D,
        radius: f32,
        layer: LayerMask,
    },
    /// Everything behind the plane through `point` facing `normal` is solid
    HalfSpace {
        point: Vector3D,
        normal: Vector3D,
        layer: LayerMask,
    },
}

impl Obstacle {
    pub fn layer(&self) -> LayerMask {
        match self {
            Obstacle::Sphere { layer, .. } | Obstacle::HalfSpace { layer, .. } => *layer,
        }
    }

    /// Distance along `direction` at which a sphere of `radius` starting at
    /// `origin` first touches this obstacle. Obstacles the sphere already
    /// overlaps at `origin` are not reported.
    pub fn sweep(&self, origin: Vector3D, radius: f32, direction: Vector3D) -> Option<f32> {
        match *self {
            Obstacle::Sphere { center, radius: r, .. } => {
                let reach = r + radius;
                let m = origin - center;
                let c = m.sqr_magnitude() - reach * reach;
                if c <= 0.0 {
                    return None;
                }
                let b = m.dot(&direction);
                if b >= 0.0 {
                    return None;
                }
                let disc = b * b - c * direction.sqr_magnitude();
                if disc < 0.0 {
                    return None;
                }
                Some((-b - disc.sqrt()) / direction.sqr_magnitude())
            }
            Obstacle::HalfSpace { point, normal, .. } => {
                let normal = normal.normalize();
                let gap = (origin - point).dot(&normal) - radius;
                if gap <= 0.0 {
                    return None;
                }
                let closing = -direction.dot(&normal);
                if closing <= 0.0 {
                    return None;
                }
                Some(gap / closing)
            }
        }
    }
}

/// Analytic obstacle set answering sphere sweeps
#[derive(Debug, Clone, Default)]
pub struct ObstacleWorld {
    obstacles: Vec<Obstacle>,
}

impl ObstacleWorld {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

impl ObstacleQuery for ObstacleWorld {
    fn sphere_sweep(
        &self,
        origin: Vector3D,
        radius: f32,
        direction: Vector3D,
        max_distance: f32,
        mask: LayerMask,
    ) -> bool {
        if direction.is_zero() {
            return false;
        }
        self.obstacles
            .iter()
            .filter(|o| mask.contains_any(o.layer()))
            .filter_map(|o| o.sweep(origin, radius, direction))
            .any(|distance| distance <= max_distance)
    }
}

/// Last transform pushed for an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityTransform {
    pub position: Vector3D,
    pub orientation: Orientation,
}

/// Entity store standing in for a scene graph: boids write their transforms
/// here and entities can be destroyed behind the flock's back.
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    slots: Vec<Option<EntityTransform>>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: EntityId) -> Option<&EntityTransform> {
        self.slots.get(entity.0 as usize).and_then(Option::as_ref)
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn live_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| EntityId(i as u32))
    }

    pub fn destroy(&mut self, entity: EntityId) -> bool {
        match self.slots.get_mut(entity.0 as usize) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    /// Destroys the `count` oldest live entities, returning how many went.
    pub fn destroy_oldest(&mut self, count: usize) -> usize {
        let doomed: Vec<EntityId> = self.live_ids().take(count).collect();
        for entity in &doomed {
            self.destroy(*entity);
        }
        doomed.len()
    }

    pub fn release(&mut self, entities: &[EntityId]) {
        for entity in entities {
            self.destroy(*entity);
        }
    }
}

impl EntityHost for EntityTable {
    fn is_valid(&self, entity: EntityId) -> bool {
        self.get(entity).is_some()
    }

    fn set_transform(&mut self, entity: EntityId, position: Vector3D, orientation: Orientation) {
        if let Some(Some(slot)) = self.slots.get_mut(entity.0 as usize) {
            *slot = EntityTransform { position, orientation };
        }
    }

    fn spawn(&mut self, position: Vector3D, orientation: Orientation) -> EntityId {
        self.slots.push(Some(EntityTransform { position, orientation }));
        EntityId((self.slots.len() - 1) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(x: f32, y: f32, z: f32, radius: f32) -> Obstacle {
        Obstacle::Sphere {
            center: Vector3D::new(x, y, z),
            radius,
            layer: LayerMask::ENVIRONMENT,
        }
    }

    #[test]
    fn test_sphere_sweep_hits_ahead() {
        let world = ObstacleWorld::new(vec![sphere(0.0, 0.0, 4.0, 1.0)]);
        let origin = Vector3D::zero();

        assert!(world.sphere_sweep(origin, 0.5, Vector3D::FORWARD, 5.0, LayerMask::ENVIRONMENT));
        // Contact happens at distance 2.5, out of reach of a 2.0 probe.
        assert!(!world.sphere_sweep(origin, 0.5, Vector3D::FORWARD, 2.0, LayerMask::ENVIRONMENT));
        assert!(!world.sphere_sweep(origin, 0.5, Vector3D::UP, 5.0, LayerMask::ENVIRONMENT));
        assert!(!world.sphere_sweep(origin, 0.5, -Vector3D::FORWARD, 5.0, LayerMask::ENVIRONMENT));
    }

    #[test]
    fn test_sphere_sweep_grazing_uses_probe_radius() {
        let world = ObstacleWorld::new(vec![sphere(1.2, 0.0, 4.0, 1.0)]);
        assert!(!world.sphere_sweep(Vector3D::zero(), 0.1, Vector3D::FORWARD, 10.0, LayerMask::ALL));
        assert!(world.sphere_sweep(Vector3D::zero(), 0.3, Vector3D::FORWARD, 10.0, LayerMask::ALL));
    }

    #[test]
    fn test_sweep_ignores_overlap_at_start() {
        let world = ObstacleWorld::new(vec![sphere(0.0, 0.0, 0.5, 1.0)]);
        assert!(!world.sphere_sweep(Vector3D::zero(), 0.2, Vector3D::FORWARD, 5.0, LayerMask::ALL));
    }

    #[test]
    fn test_sweep_respects_mask() {
        let world = ObstacleWorld::new(vec![sphere(0.0, 0.0, 4.0, 1.0)]);
        assert!(!world.sphere_sweep(
            Vector3D::zero(),
            0.5,
            Vector3D::FORWARD,
            5.0,
            LayerMask::ENEMY_PROJECTILE
        ));
    }

    #[test]
    fn test_half_space_sweep() {
        let wall = Obstacle::HalfSpace {
            point: Vector3D::new(0.0, 0.0, 10.0),
            normal: Vector3D::new(0.0, 0.0, -2.0),
            layer: LayerMask::ENVIRONMENT,
        };
        let distance = wall.sweep(Vector3D::new(0.0, 0.0, 6.0), 0.5, Vector3D::FORWARD);
        assert!((distance.unwrap() - 3.5).abs() < 1e-5);
        assert_eq!(wall.sweep(Vector3D::new(0.0, 0.0, 6.0), 0.5, Vector3D::UP), None);

        // Already behind the plane: no contact reported.
        assert_eq!(wall.sweep(Vector3D::new(0.0, 0.0, 11.0), 0.5, Vector3D::FORWARD), None);
    }

    #[test]
    fn test_entity_table_lifecycle() {
        let mut table = EntityTable::new();
        let a = table.spawn(Vector3D::zero(), Orientation::IDENTITY);
        let b = table.spawn(Vector3D::FORWARD, Orientation::IDENTITY);
        let c = table.spawn(Vector3D::UP, Orientation::IDENTITY);
        assert_eq!((a, b, c), (EntityId(0), EntityId(1), EntityId(2)));

        table.set_transform(b, Vector3D::new(5.0, 5.0, 5.0), Orientation::IDENTITY);
        assert_eq!(table.get(b).unwrap().position, Vector3D::new(5.0, 5.0, 5.0));

        assert_eq!(table.destroy_oldest(2), 2);
        assert!(!table.is_valid(a));
        assert!(!table.is_valid(b));
        assert!(table.is_valid(c));
        assert_eq!(table.live_count(), 1);

        // Writes to destroyed entities are dropped.
        table.set_transform(a, Vector3D::UP, Orientation::IDENTITY);
        assert!(table.get(a).is_none());
        assert!(!table.destroy(EntityId(99)));
    }
}
