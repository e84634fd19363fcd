use std::collections::BTreeMap;

use log::{debug, info, trace, warn};

use crate::core::math::{Vec2, Vec2Ext};

use super::bounds::Aabb;
use super::collision::{self, Contact, MergedContact};
use super::config::WorldConfig;
use super::connection::{Anchor, Connection};
use super::debug::{DebugLayer, DebugLines};
use super::handle::{Arena, ConnectionHandle, ObjectHandle};
use super::index::{CandidatePair, IndexItem, SpatialIndex};
use super::object::Object;
use super::shape::Shape;
use super::PhysicsError;

/// Counters from one [`World::step`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Broad-phase pairs handed to the narrow phase
    pub candidate_pairs: usize,
    /// Object pairs in contact after merging
    pub contacts: usize,
    /// Objects moved by positional correction
    pub corrected_objects: usize,
    /// Connections that applied a force
    pub connections_applied: usize,
}

/// Physics world that owns every object and connection and runs the step
/// pipeline: integrate, index, detect, correct, then apply springs.
pub struct World {
    config: WorldConfig,

    objects: Arena<Object>,
    connections: Arena<Connection>,

    /// Rebuilt every step; queries between steps read the latest one
    index: SpatialIndex,
    candidate_pairs: Vec<CandidatePair>,
    contacts: Vec<MergedContact>,

    step_count: u64,
}

impl World {
    /// Create an empty world
    pub fn new(config: WorldConfig) -> Self {
        info!(
            "Physics world created (viscosity {}, spring gain {}, index depth {})",
            config.viscosity, config.spring_gain, config.index.max_depth
        );
        Self {
            config,
            objects: Arena::new(),
            connections: Arena::new(),
            index: SpatialIndex::new(config.index),
            candidate_pairs: Vec::new(),
            contacts: Vec::new(),
            step_count: 0,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Replace the configuration; index settings apply from the next rebuild
    pub fn set_config(&mut self, config: WorldConfig) {
        self.config = config;
    }

    // Registry

    /// Add an object after validating its shapes and mass parameters
    pub fn add_object(&mut self, object: Object) -> Result<ObjectHandle, PhysicsError> {
        for shape in object.shapes() {
            shape.validate()?;
        }
        let (position, angle) = object.pose();
        if !position.is_finite() || !angle.is_finite() {
            return Err(PhysicsError::InvalidObject(format!(
                "pose ({}, {}) is not finite",
                position, angle
            )));
        }
        if !(object.weight().is_finite() && object.weight() > 0.0) {
            return Err(PhysicsError::InvalidObject(format!(
                "weight {} must be positive",
                object.weight()
            )));
        }
        if !(object.weight_distribution().is_finite() && object.weight_distribution() > 0.0) {
            return Err(PhysicsError::InvalidObject(format!(
                "weight distribution {} must be positive",
                object.weight_distribution()
            )));
        }

        let shapes = object.shapes().len();
        let name = object.name().unwrap_or("unnamed").to_string();
        let handle = self.objects.insert(object);
        info!(
            "Added object {} '{}' ({} shapes, {} objects)",
            handle,
            name,
            shapes,
            self.objects.len()
        );
        Ok(handle)
    }

    /// Remove an object together with every connection attached to it
    pub fn remove_object(&mut self, handle: ObjectHandle) -> Result<Object, PhysicsError> {
        let object = self
            .objects
            .remove(handle)
            .ok_or(PhysicsError::ObjectNotFound(handle))?;

        let attached: Vec<ConnectionHandle> = self
            .connections
            .iter()
            .filter(|(_, c)| c.references(handle))
            .map(|(h, _)| h)
            .collect();
        for connection in &attached {
            self.connections.remove(*connection);
        }

        info!(
            "Removed object {} and {} connections ({} objects left)",
            handle,
            attached.len(),
            self.objects.len()
        );
        Ok(object)
    }

    /// Add a connection; object anchors must refer to live objects
    pub fn add_connection(&mut self, connection: Connection) -> Result<ConnectionHandle, PhysicsError> {
        for anchor in [&connection.a, &connection.b] {
            if let Some(object) = anchor.object_handle() {
                if !self.objects.contains(object) {
                    return Err(PhysicsError::ObjectNotFound(object));
                }
            }
        }
        let handle = self.connections.insert(connection);
        info!("Added connection {} ({} connections)", handle, self.connections.len());
        Ok(handle)
    }

    pub fn remove_connection(&mut self, handle: ConnectionHandle) -> Result<Connection, PhysicsError> {
        let connection = self
            .connections
            .remove(handle)
            .ok_or(PhysicsError::ConnectionNotFound(handle))?;
        info!("Removed connection {} ({} connections left)", handle, self.connections.len());
        Ok(connection)
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&Object> {
        self.objects.get(handle)
    }

    pub fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut Object> {
        self.objects.get_mut(handle)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectHandle, &Object)> {
        self.objects.iter()
    }

    pub fn connection(&self, handle: ConnectionHandle) -> Option<&Connection> {
        self.connections.get(handle)
    }

    pub fn connection_mut(&mut self, handle: ConnectionHandle) -> Option<&mut Connection> {
        self.connections.get_mut(handle)
    }

    pub fn connections(&self) -> impl Iterator<Item = (ConnectionHandle, &Connection)> {
        self.connections.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // Step pipeline

    /// Advance the simulation by `dt` seconds
    pub fn step(&mut self, dt: f64) -> Result<StepReport, PhysicsError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::InvalidTimestep(dt));
        }

        self.integrate(dt);
        self.rebuild_index();
        let contacts = self.detect_collisions()?;
        let corrected_objects = self.resolve_collisions();
        let connections_applied = self.apply_connections();
        self.step_count += 1;

        let report = StepReport {
            candidate_pairs: self.candidate_pairs.len(),
            contacts,
            corrected_objects,
            connections_applied,
        };
        debug!(
            "Step {}: {} items, {} nodes ({} leaves), {} candidate pairs, {} contacts, {} corrected",
            self.step_count,
            self.index.len(),
            self.index.node_count(),
            self.index.leaf_count(),
            report.candidate_pairs,
            report.contacts,
            report.corrected_objects
        );
        Ok(report)
    }

    /// Move every non-fixed object by its velocity, then damp the velocity
    pub fn integrate(&mut self, dt: f64) {
        let damping = (1.0 - self.config.viscosity * dt).max(0.0);
        for (_, object) in self.objects.iter_mut().filter(|(_, o)| !o.fixed()) {
            let (velocity, angular_velocity) = (object.velocity(), object.angular_velocity());
            if velocity != Vec2::ZERO || angular_velocity != 0.0 {
                let (position, angle) = object.pose();
                object.set_pose(position + velocity * dt, angle + angular_velocity * dt);
            }
            object.set_velocity(velocity * damping);
            object.set_angular_velocity(angular_velocity * damping);
        }
    }

    /// Rebuild the KD-tree from the current world bounds of every primitive
    pub fn rebuild_index(&mut self) {
        let mut items = Vec::new();
        for (handle, object) in self.objects.iter_mut() {
            items.extend(
                object
                    .world_shapes()
                    .iter()
                    .enumerate()
                    .map(|(primitive, shape)| IndexItem::new(shape.bounds(), handle, primitive)),
            );
        }
        self.index = SpatialIndex::build(self.config.index, items);
    }

    /// Broad phase, narrow phase and per-object-pair merge.
    /// Returns the number of object pairs in contact.
    pub fn detect_collisions(&mut self) -> Result<usize, PhysicsError> {
        self.candidate_pairs = self.index.collect_pairs()?;

        let mut grouped: BTreeMap<(ObjectHandle, ObjectHandle), Vec<Contact>> = BTreeMap::new();
        for pair in &self.candidate_pairs {
            let (Some(first), Some(second)) = (self.world_shape(&pair.first), self.world_shape(&pair.second)) else {
                continue;
            };
            if let Some(contact) = collision::test(&first, &second) {
                trace!(
                    "{}:{} ({:?}) x {}:{} ({:?}) depth {:.4}",
                    pair.first.object,
                    pair.first.primitive,
                    first.kind(),
                    pair.second.object,
                    pair.second.primitive,
                    second.kind(),
                    contact.depth
                );
                grouped
                    .entry((pair.first.object, pair.second.object))
                    .or_default()
                    .push(contact);
            }
        }

        self.contacts = grouped
            .into_iter()
            .filter_map(|((first, second), contacts)| MergedContact::from_contacts(first, second, &contacts))
            .collect();
        Ok(self.contacts.len())
    }

    /// Push overlapping objects apart along each merged contact.
    /// Returns how many object corrections were applied.
    pub fn resolve_collisions(&mut self) -> usize {
        let tolerance = self.config.normal_tolerance;
        let mut corrected = 0;

        for contact in &self.contacts {
            let (Some(first), Some(second)) = self.objects.get2_mut(contact.object1, contact.object2) else {
                continue;
            };
            let share = match (first.fixed(), second.fixed()) {
                (false, false) => 0.5,
                (false, true) | (true, false) => 1.0,
                (true, true) => continue,
            };
            let depth = contact.depth * share;

            let (first_position, second_position) = (first.position(), second.position());
            let moves = [
                (first, second_position, -contact.normal1, contact.object1),
                (second, first_position, -contact.normal2, contact.object2),
            ];
            for (object, other_position, push, handle) in moves {
                if object.fixed() {
                    continue;
                }
                match push_direction(object.position(), other_position, push, tolerance) {
                    Some(direction) => {
                        object.set_position(object.position() + direction * depth);
                        corrected += 1;
                    }
                    None => warn!("Skipping correction of {}: no usable push direction", handle),
                }
            }
        }
        corrected
    }

    /// Apply every connection's spring force to its attached objects.
    /// Returns how many connections were applied.
    pub fn apply_connections(&mut self) -> usize {
        let gain = self.config.spring_gain;
        let mut applied = 0;

        for (handle, connection) in self.connections.iter() {
            let Some(displacement) = connection.displacement(&self.objects) else {
                warn!("Connection {} has a dangling anchor", handle);
                continue;
            };
            let pull = displacement * gain;
            for (anchor, force) in [(&connection.a, pull), (&connection.b, -pull)] {
                if let Anchor::Object { object, local_point } = anchor {
                    if let Some(object) = self.objects.get_mut(*object) {
                        let local_force = object.world_to_local_vector(force);
                        object.apply_local_force(local_force, *local_point);
                    }
                }
            }
            applied += 1;
        }
        applied
    }

    // Results

    /// Merged contacts of the last step, ordered by object pair
    pub fn contacts(&self) -> &[MergedContact] {
        &self.contacts
    }

    /// Broad-phase pairs of the last step
    pub fn candidate_pairs(&self) -> &[CandidatePair] {
        &self.candidate_pairs
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    // Queries

    /// World-space copy of one primitive, from the cache when it is fresh
    fn primitive(&self, handle: ObjectHandle, primitive: usize) -> Option<Shape> {
        let object = self.objects.get(handle)?;
        match object.cached_world_shapes() {
            Some(shapes) => shapes.get(primitive).copied(),
            None => object
                .shapes()
                .get(primitive)
                .map(|s| s.transformed(&object.transform())),
        }
    }

    fn world_shape(&self, item: &IndexItem) -> Option<Shape> {
        self.primitive(item.object, item.primitive)
    }

    fn live(&self, items: Vec<IndexItem>) -> Vec<IndexItem> {
        items.into_iter().filter(|i| self.objects.contains(i.object)).collect()
    }

    /// Primitives whose bounds contain `point`
    pub fn query_point(&self, point: Vec2) -> Vec<IndexItem> {
        self.live(self.index.point_query(point))
    }

    /// Primitives whose bounds intersect `region`
    pub fn query_region(&self, region: &Aabb) -> Vec<IndexItem> {
        self.live(self.index.region_query(region))
    }

    /// Primitives actually touching `shape` (given in world space)
    pub fn query_shape(&self, shape: &Shape) -> Vec<IndexItem> {
        self.query_region(&shape.bounds())
            .into_iter()
            .filter(|item| {
                self.world_shape(item)
                    .is_some_and(|other| collision::test(shape, &other).is_some())
            })
            .collect()
    }

    /// Object whose position is closest to `point`
    pub fn nearest_object(&self, point: Vec2, movable_only: bool) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .filter(|(_, o)| !(movable_only && o.fixed()))
            .min_by(|(_, a), (_, b)| {
                a.position()
                    .distance_squared(point)
                    .total_cmp(&b.position().distance_squared(point))
            })
            .map(|(h, _)| h)
    }

    /// Deform an object around a world-space point with the configured strength
    pub fn deform_at(&mut self, handle: ObjectHandle, world_point: Vec2) -> Result<(), PhysicsError> {
        let strength = self.config.deform_strength;
        let object = self
            .objects
            .get_mut(handle)
            .ok_or(PhysicsError::ObjectNotFound(handle))?;
        let local = object.world_to_local(world_point);
        object.deform(local, strength);
        debug!("Deformed {} at {}", handle, world_point);
        Ok(())
    }

    // Debug output

    /// Edges of every KD-tree node
    pub fn index_debug_lines(&self) -> Vec<(Vec2, Vec2)> {
        self.index.debug_lines()
    }

    /// Outlines of every world-space primitive
    pub fn shape_debug_lines(&self) -> Vec<(Vec2, Vec2)> {
        self.objects
            .iter()
            .flat_map(|(handle, object)| {
                (0..object.shapes().len()).filter_map(move |primitive| self.primitive(handle, primitive))
            })
            .flat_map(|shape| shape.outline())
            .collect()
    }

    /// One segment per connection between its anchors
    pub fn connection_debug_lines(&self) -> Vec<(Vec2, Vec2)> {
        self.connections
            .iter()
            .filter_map(|(_, c)| c.world_points(&self.objects))
            .collect()
    }

    /// Cross at each contact point plus its first normal scaled by depth
    pub fn contact_debug_lines(&self) -> Vec<(Vec2, Vec2)> {
        const CROSS: f64 = 0.25;
        self.contacts
            .iter()
            .flat_map(|c| {
                [
                    (c.position - Vec2::X * CROSS, c.position + Vec2::X * CROSS),
                    (c.position - Vec2::Y * CROSS, c.position + Vec2::Y * CROSS),
                    (c.position, c.position + c.normal1 * c.depth),
                ]
            })
            .collect()
    }

    /// All debug layers as one colored line list
    pub fn debug_geometry(&self) -> DebugLines {
        let mut lines = DebugLines::new();
        lines.push_layer(DebugLayer::Index, self.index_debug_lines());
        lines.push_layer(DebugLayer::Shapes, self.shape_debug_lines());
        lines.push_layer(DebugLayer::Connections, self.connection_debug_lines());
        lines.push_layer(DebugLayer::Contacts, self.contact_debug_lines());
        lines
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// Direction to move an object at `position` away from `other`.
///
/// The contact push direction wins when it is within `tolerance` of the line
/// between the two positions; otherwise the line itself is used.
fn push_direction(position: Vec2, other: Vec2, push: Vec2, tolerance: f64) -> Option<Vec2> {
    match ((position - other).try_unit(), push.try_unit()) {
        (Some(line), Some(push)) if line.signed_angle(push).abs() < tolerance => Some(push),
        (Some(line), _) => Some(line),
        (None, push) => push,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::{presets, ObjectBuilder};
    use approx::assert_relative_eq;

    fn still() -> WorldConfig {
        WorldConfig::default().with_viscosity(0.0).with_spring_gain(0.0)
    }

    #[test]
    fn test_overlapping_balls_are_pushed_apart_equally() {
        let mut world = World::new(still());
        let a = world.add_object(presets::ball(0.0, 0.0, 5.0)).unwrap();
        let b = world.add_object(presets::ball(6.0, 0.0, 5.0)).unwrap();

        let report = world.step(1.0 / 60.0).unwrap();
        assert_eq!(report.candidate_pairs, 1);
        assert_eq!(report.contacts, 1);
        assert_eq!(report.corrected_objects, 2);

        let pa = world.object(a).unwrap().position();
        let pb = world.object(b).unwrap().position();
        assert_relative_eq!(pa.x, -2.0, epsilon = 1e-9);
        assert_relative_eq!(pa.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pb.x, 8.0, epsilon = 1e-9);
        assert_relative_eq!(pb.y, 0.0, epsilon = 1e-9);

        let contact = world.contacts()[0];
        assert_relative_eq!(contact.depth, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_primitive_contacts_merge_into_one_correction() {
        let mut world = World::new(still());
        // circles at x = -1, 1 against circles at x = 0, 2: three overlaps of depth 1
        let a = world.add_object(presets::circle_cluster(0.0, 0.0, 2, 1, 1.0)).unwrap();
        let b = world.add_object(presets::circle_cluster(1.0, 0.0, 2, 1, 1.0)).unwrap();

        let report = world.step(1.0 / 60.0).unwrap();
        assert_eq!(report.contacts, 1);
        assert_eq!(report.corrected_objects, 2);

        let contact = world.contacts()[0];
        assert_eq!(contact.count, 3);
        assert_relative_eq!(contact.depth, 1.0, epsilon = 1e-9);

        // each side moves by half the averaged depth, once
        let pa = world.object(a).unwrap().position();
        let pb = world.object(b).unwrap().position();
        assert_relative_eq!(pa.x, -0.5, epsilon = 1e-9);
        assert_relative_eq!(pa.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pb.x, 1.5, epsilon = 1e-9);
        assert_relative_eq!(pb.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_object_takes_no_correction() {
        let mut world = World::new(still());
        let wall = world.add_object(presets::wall(0.0, 0.0, 10.0, 10.0, 0.0)).unwrap();
        let ball = world.add_object(presets::ball(5.5, 0.0, 1.0)).unwrap();

        let report = world.step(0.0).unwrap();
        assert_eq!(report.corrected_objects, 1);
        assert_eq!(world.object(wall).unwrap().position(), Vec2::ZERO);
        assert_relative_eq!(world.object(ball).unwrap().position().x, 6.0, epsilon = 1e-9);

        // resting contact: no further movement
        world.step(0.0).unwrap();
        assert_relative_eq!(world.object(ball).unwrap().position().x, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_pairs_are_skipped() {
        let mut world = World::new(still());
        world.add_object(presets::wall(0.0, 0.0, 4.0, 4.0, 0.0)).unwrap();
        world.add_object(presets::wall(1.0, 0.0, 4.0, 4.0, 0.0)).unwrap();

        let report = world.step(0.1).unwrap();
        assert_eq!(report.contacts, 1);
        assert_eq!(report.corrected_objects, 0);
    }

    #[test]
    fn test_separated_objects_do_not_touch() {
        let mut world = World::new(still());
        world.add_object(presets::ball(0.0, 0.0, 1.0)).unwrap();
        world.add_object(presets::ball(10.0, 0.0, 1.0)).unwrap();
        let report = world.step(0.1).unwrap();
        assert_eq!(report.candidate_pairs, 0);
        assert!(world.contacts().is_empty());
    }

    #[test]
    fn test_integration_moves_and_damps() {
        let mut world = World::new(WorldConfig::default().with_viscosity(0.5));
        let handle = world
            .add_object(
                ObjectBuilder::new_movable()
                    .velocity(1.0, 0.0)
                    .angular_velocity(2.0)
                    .shape(Shape::circle(Vec2::ZERO, 1.0))
                    .build(),
            )
            .unwrap();
        world.integrate(0.1);

        let object = world.object(handle).unwrap();
        assert_relative_eq!(object.position().x, 0.1);
        assert_relative_eq!(object.angle(), 0.2);
        assert_relative_eq!(object.velocity().x, 0.95);
        assert_relative_eq!(object.angular_velocity(), 1.9);
    }

    #[test]
    fn test_fixed_objects_do_not_integrate() {
        let mut world = World::default();
        let mut wall = presets::wall(0.0, 0.0, 1.0, 1.0, 0.0);
        wall.set_velocity(Vec2::new(5.0, 5.0));
        let handle = world.add_object(wall).unwrap();
        world.step(1.0).unwrap();
        assert_eq!(world.object(handle).unwrap().position(), Vec2::ZERO);
    }

    #[test]
    fn test_spring_settles_on_world_anchor() {
        let config = WorldConfig::default().with_viscosity(1.0).with_spring_gain(1.0);
        let mut world = World::new(config);
        let ball = world.add_object(presets::ball(0.0, 0.0, 0.5)).unwrap();
        world
            .add_connection(Connection::new(
                Anchor::object(ball, Vec2::ZERO),
                Anchor::world(Vec2::new(10.0, 0.0)),
            ))
            .unwrap();

        for _ in 0..2000 {
            let report = world.step(0.01).unwrap();
            assert_eq!(report.connections_applied, 1);
            let error = world.object(ball).unwrap().position().x - 10.0;
            assert!(error.abs() <= 10.0 + 1e-9, "oscillation grew: {}", error);
        }
        let position = world.object(ball).unwrap().position();
        assert!((position.x - 10.0).abs() < 0.01, "ended at {}", position);
        assert_relative_eq!(position.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_spring_between_objects_pulls_both() {
        let mut world = World::new(still().with_spring_gain(0.1));
        let a = world.add_object(presets::ball(0.0, 0.0, 0.5)).unwrap();
        let b = world.add_object(presets::ball(10.0, 0.0, 0.5)).unwrap();
        world
            .add_connection(Connection::new(Anchor::object(a, Vec2::ZERO), Anchor::object(b, Vec2::ZERO)))
            .unwrap();
        world.step(0.0).unwrap();

        assert_relative_eq!(world.object(a).unwrap().velocity().x, 1.0);
        assert_relative_eq!(world.object(b).unwrap().velocity().x, -1.0);
    }

    #[test]
    fn test_remove_object_cascades_connections() {
        let mut world = World::default();
        let a = world.add_object(presets::ball(0.0, 0.0, 1.0)).unwrap();
        let b = world.add_object(presets::ball(5.0, 0.0, 1.0)).unwrap();
        let link = world
            .add_connection(Connection::new(Anchor::object(a, Vec2::ZERO), Anchor::object(b, Vec2::ZERO)))
            .unwrap();
        let keep = world
            .add_connection(Connection::new(Anchor::object(b, Vec2::ZERO), Anchor::world(Vec2::ZERO)))
            .unwrap();

        world.remove_object(a).unwrap();
        assert_eq!(world.object_count(), 1);
        assert_eq!(world.connection_count(), 1);
        assert!(world.connection(link).is_none());
        assert!(world.connection(keep).is_some());
    }

    #[test]
    fn test_stale_handles_are_rejected() {
        let mut world = World::default();
        let a = world.add_object(presets::ball(0.0, 0.0, 1.0)).unwrap();
        world.remove_object(a).unwrap();
        let reused = world.add_object(presets::ball(1.0, 0.0, 1.0)).unwrap();
        assert_eq!(a.index(), reused.index());

        assert!(world.object(a).is_none());
        assert!(matches!(world.remove_object(a), Err(PhysicsError::ObjectNotFound(h)) if h == a));
        assert!(matches!(world.deform_at(a, Vec2::ZERO), Err(PhysicsError::ObjectNotFound(_))));
        assert!(matches!(
            world.add_connection(Connection::new(Anchor::object(a, Vec2::ZERO), Anchor::world(Vec2::ZERO))),
            Err(PhysicsError::ObjectNotFound(_))
        ));

        let link = world
            .add_connection(Connection::new(Anchor::object(reused, Vec2::ZERO), Anchor::world(Vec2::ZERO)))
            .unwrap();
        world.remove_connection(link).unwrap();
        assert!(matches!(world.remove_connection(link), Err(PhysicsError::ConnectionNotFound(_))));
    }

    #[test]
    fn test_invalid_timestep() {
        let mut world = World::default();
        assert!(matches!(world.step(-0.1), Err(PhysicsError::InvalidTimestep(_))));
        assert!(matches!(world.step(f64::NAN), Err(PhysicsError::InvalidTimestep(_))));
        assert!(matches!(world.step(f64::INFINITY), Err(PhysicsError::InvalidTimestep(_))));
        assert!(world.step(0.0).is_ok());
        assert_eq!(world.step_count(), 1);
    }

    #[test]
    fn test_invalid_objects_are_rejected() {
        let mut world = World::default();
        let bad_shape = ObjectBuilder::new_movable().shape(Shape::circle(Vec2::ZERO, -1.0)).build();
        assert!(matches!(world.add_object(bad_shape), Err(PhysicsError::InvalidShape(_))));

        let weightless = ObjectBuilder::new_movable().weight(0.0).build();
        assert!(matches!(world.add_object(weightless), Err(PhysicsError::InvalidObject(_))));
        assert_eq!(world.object_count(), 0);
    }

    #[test]
    fn test_queries() {
        let mut world = World::new(still());
        let a = world.add_object(presets::ball(0.0, 0.0, 1.0)).unwrap();
        let b = world.add_object(presets::ball(3.0, 0.0, 1.0)).unwrap();
        world.step(0.0).unwrap();

        let hits = world.query_point(Vec2::new(0.9, 0.9));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object, a);

        // inside the bounds corner but outside the circle
        assert!(world.query_shape(&Shape::circle(Vec2::new(0.95, 0.95), 0.01)).is_empty());
        let touching = world.query_shape(&Shape::segment(Vec2::new(-1.0, 0.0), Vec2::new(4.0, 0.0)));
        assert_eq!(touching.iter().map(|i| i.object).collect::<Vec<_>>(), vec![a, b]);

        let region = Aabb::new(Vec2::new(2.5, -0.5), Vec2::new(2.6, 0.5));
        assert_eq!(world.query_region(&region).len(), 1);

        world.remove_object(b).unwrap();
        assert!(world.query_point(Vec2::new(3.0, 0.0)).is_empty());
    }

    #[test]
    fn test_nearest_object() {
        let mut world = World::default();
        let wall = world.add_object(presets::wall(0.0, 0.0, 1.0, 1.0, 0.0)).unwrap();
        let ball = world.add_object(presets::ball(10.0, 0.0, 1.0)).unwrap();

        assert_eq!(world.nearest_object(Vec2::new(1.0, 0.0), false), Some(wall));
        assert_eq!(world.nearest_object(Vec2::new(1.0, 0.0), true), Some(ball));
        assert_eq!(World::default().nearest_object(Vec2::ZERO, false), None);
    }

    #[test]
    fn test_deform_at_moves_shapes_away() {
        let mut world = World::default();
        let handle = world
            .add_object(
                ObjectBuilder::new_movable()
                    .position(5.0, 0.0)
                    .shape(Shape::circle(Vec2::new(1.0, 0.0), 0.5))
                    .build(),
            )
            .unwrap();
        world.deform_at(handle, Vec2::new(5.0, 0.0)).unwrap();

        let center = match world.object(handle).unwrap().shapes()[0] {
            Shape::Circle(c) => c.center,
            _ => unreachable!(),
        };
        let expected = 1.0 + (-0.5f64).exp() * world.config().deform_strength;
        assert_relative_eq!(center.x, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_debug_geometry_layers() {
        let mut world = World::new(still());
        let a = world.add_object(presets::ball(0.0, 0.0, 1.0)).unwrap();
        world.add_object(presets::ball(1.5, 0.0, 1.0)).unwrap();
        world
            .add_connection(Connection::new(Anchor::object(a, Vec2::ZERO), Anchor::world(Vec2::new(0.0, 5.0))))
            .unwrap();
        world.step(0.0).unwrap();

        assert_eq!(world.shape_debug_lines().len(), 32);
        assert_eq!(world.connection_debug_lines().len(), 1);
        assert_eq!(world.contact_debug_lines().len(), 3);
        assert_eq!(world.index_debug_lines().len(), world.index().node_count() * 4);

        let lines = world.debug_geometry();
        let expected = world.index_debug_lines().len() + 32 + 1 + 3;
        assert_eq!(lines.segment_count(), expected);
    }

    #[test]
    fn test_push_direction() {
        let tolerance = 0.15;
        // contact close to the center line wins
        let d = push_direction(Vec2::ZERO, Vec2::X, Vec2::new(-1.0, 0.1), tolerance).unwrap();
        assert_relative_eq!(d.y, Vec2::new(-1.0, 0.1).normalize().y);
        // far off: fall back to the center line
        let d = push_direction(Vec2::ZERO, Vec2::X, Vec2::new(0.0, 1.0), tolerance).unwrap();
        assert_eq!(d, Vec2::new(-1.0, 0.0));
        // coincident centers: contact direction only
        assert_eq!(push_direction(Vec2::ZERO, Vec2::ZERO, Vec2::Y, tolerance), Some(Vec2::Y));
        assert_eq!(push_direction(Vec2::ZERO, Vec2::ZERO, Vec2::ZERO, tolerance), None);
    }
}
