use glam::Vec3;

use crate::scene::{EntityId, SceneDescriptor, SceneHelpers, SceneLights, SceneObject};

/// Mutable instance of a [`SceneDescriptor`]'s contents.
///
/// Animation, drag and panel edits write here; the descriptor the graph was
/// instantiated from is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    objects: Vec<SceneObject>,
    pub lights: SceneLights,
    pub helpers: SceneHelpers,
}

impl SceneGraph {
    pub fn instantiate(descriptor: &SceneDescriptor) -> Self {
        Self {
            objects: descriptor.objects().to_vec(),
            lights: *descriptor.lights(),
            helpers: *descriptor.helpers(),
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get(&self, id: EntityId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    pub fn update<F, R>(&mut self, id: EntityId, updater: F) -> Option<R>
    where
        F: FnOnce(&mut SceneObject) -> R,
    {
        self.get_mut(id).map(updater)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        let moved = self.update(id, |obj| obj.transform.position = position);
        moved.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{create_scene, SceneVariant};

    #[test]
    fn edits_do_not_touch_the_descriptor() {
        let descriptor = create_scene(SceneVariant::Cube);
        let mut graph = SceneGraph::instantiate(&descriptor);
        let subject = descriptor.subject_id();

        assert!(graph.set_position(subject, Vec3::new(1.0, 2.0, 3.0)));
        graph.lights.point.visible = false;

        assert_eq!(
            graph.get(subject).unwrap().transform.position,
            Vec3::new(1.0, 2.0, 3.0)
        );
        assert_eq!(descriptor.subject().transform.position, Vec3::new(0.0, 0.5, 0.0));
        assert!(descriptor.lights().point.visible);
    }

    #[test]
    fn update_returns_none_for_missing_entity() {
        let mut graph = SceneGraph::instantiate(&create_scene(SceneVariant::Sphere));
        assert!(!graph.set_position(EntityId(42), Vec3::ONE));
        assert!(graph.update(EntityId(42), |_| ()).is_none());
    }
}
