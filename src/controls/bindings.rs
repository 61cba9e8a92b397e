use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::scene::{EntityId, SceneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Orbit,
    Drag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub kind: BindingKind,
    pub scene: SceneId,
    pub entity: EntityId,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    entries: Vec<(u64, Binding)>,
}

/// Ledger of the control bindings currently attached to scene entities.
///
/// Every binding is owned by a [`BindingGuard`]; dropping the guard removes
/// the entry, so a control can never outlive its registration.
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, binding: Binding) -> BindingGuard {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.push((id, binding));
        log::debug!("bound {:?} control to {:?}", binding.kind, binding.entity);
        BindingGuard {
            id,
            binding,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(_, binding)| *binding)
            .collect()
    }

    pub fn bindings_for(&self, scene: SceneId) -> Vec<Binding> {
        self.bindings()
            .into_iter()
            .filter(|binding| binding.scene == scene)
            .collect()
    }
}

#[derive(Debug)]
pub struct BindingGuard {
    id: u64,
    binding: Binding,
    registry: Weak<Mutex<RegistryInner>>,
}

impl BindingGuard {
    pub fn binding(&self) -> Binding {
        self.binding
    }
}

impl Drop for BindingGuard {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry.lock().entries.retain(|(id, _)| *id != self.id);
        log::debug!(
            "released {:?} control from {:?}",
            self.binding.kind,
            self.binding.entity
        );
    }
}
