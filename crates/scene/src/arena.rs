use crate::entity::Entity;
use shadelab_common::EntityId;
use std::ops::{Index, IndexMut};

/// Stable-index entity storage.
///
/// Ids are allocated in creation order and never reused. Removing an entity
/// leaves its slot vacant, so every other id stays valid and iteration order
/// stays the creation order.
#[derive(Debug, Clone, Default)]
pub struct EntityArena {
    slots: Vec<Option<Entity>>,
    live: usize,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entity and return its id.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.slots.len() as u32);
        self.slots.push(Some(entity));
        self.live += 1;
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Remove an entity. Its id is not handed out again.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let taken = self.slots.get_mut(id.index()).and_then(Option::take);
        if taken.is_some() {
            self.live -= 1;
        }
        taken
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live entities in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (EntityId(i as u32), e)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut Entity)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|e| (EntityId(i as u32), e)))
    }

    /// Empty the arena, yielding entities newest first.
    pub fn drain_reverse(&mut self) -> impl Iterator<Item = (EntityId, Entity)> + '_ {
        self.live = 0;
        self.slots
            .drain(..)
            .enumerate()
            .rev()
            .filter_map(|(i, slot)| slot.map(|e| (EntityId(i as u32), e)))
    }
}

impl Index<EntityId> for EntityArena {
    type Output = Entity;

    /// Panics on a removed or foreign id. Ids held by the scene are always live.
    fn index(&self, id: EntityId) -> &Entity {
        match self.get(id) {
            Some(e) => e,
            None => panic!("entity {id} is not live"),
        }
    }
}

impl IndexMut<EntityId> for EntityArena {
    fn index_mut(&mut self, id: EntityId) -> &mut Entity {
        match self.get_mut(id) {
            Some(e) => e,
            None => panic!("entity {id} is not live"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Material;
    use shadelab_common::{GeometryHandle, TechniqueHandle};
    use shadelab_render::{TechniqueBinding, TechniqueKind};

    fn entity(name: &str) -> Entity {
        let technique = TechniqueBinding {
            kind: TechniqueKind::PlainColour,
            handle: TechniqueHandle(0),
            layout: TechniqueKind::PlainColour.required_attributes(),
        };
        Entity::new(name, GeometryHandle(0), technique, Material::default())
    }

    #[test]
    fn ids_follow_creation_order() {
        let mut arena = EntityArena::new();
        let a = arena.insert(entity("a"));
        let b = arena.insert(entity("b"));
        assert_eq!(a, EntityId(0));
        assert_eq!(b, EntityId(1));
        let names: Vec<_> = arena.iter().map(|(_, e)| e.name().to_string()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut arena = EntityArena::new();
        let a = arena.insert(entity("a"));
        let b = arena.insert(entity("b"));
        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        assert_eq!(arena.len(), 1);
        assert!(!arena.contains(a));
        assert_eq!(arena[b].name(), "b");

        let c = arena.insert(entity("c"));
        assert_eq!(c, EntityId(2));
    }

    #[test]
    fn drain_reverse_yields_newest_first() {
        let mut arena = EntityArena::new();
        for name in ["a", "b", "c"] {
            arena.insert(entity(name));
        }
        arena.remove(EntityId(1));
        let order: Vec<_> = arena.drain_reverse().map(|(id, _)| id).collect();
        assert_eq!(order, [EntityId(2), EntityId(0)]);
        assert!(arena.is_empty());
    }

    #[test]
    fn iter_mut_reaches_every_entity() {
        let mut arena = EntityArena::new();
        arena.insert(entity("a"));
        arena.insert(entity("b"));
        for (_, e) in arena.iter_mut() {
            e.update_matrix();
        }
        assert!(arena.iter().all(|(_, e)| !e.is_stale()));
    }

    #[test]
    #[should_panic(expected = "not live")]
    fn indexing_vacant_slot_panics() {
        let mut arena = EntityArena::new();
        let a = arena.insert(entity("a"));
        arena.remove(a);
        let _ = &arena[a];
    }
}
