use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Keys the scene can bind to. Platform layers map their own key codes onto
/// these; anything unmapped is simply never held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    I,
    J,
    K,
    L,
    U,
    O,
    Period,
    Comma,
    Escape,
}

/// Keys held during one frame.
///
/// Built once per frame by the platform layer and handed to the scene by
/// reference; nothing downstream can change it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    held: BTreeSet<Key>,
}

impl InputSnapshot {
    /// A snapshot with nothing held.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// `Some(key)` bindings read the snapshot; `None` bindings are never held.
    pub fn binding_held(&self, key: Option<Key>) -> bool {
        key.is_some_and(|k| self.is_held(k))
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

impl FromIterator<Key> for InputSnapshot {
    fn from_iter<T: IntoIterator<Item = Key>>(iter: T) -> Self {
        Self {
            held: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_holds_nothing() {
        let s = InputSnapshot::empty();
        assert!(!s.is_held(Key::W));
        assert_eq!(s.held_count(), 0);
    }

    #[test]
    fn collected_keys_are_held() {
        let s: InputSnapshot = [Key::W, Key::Left, Key::W].into_iter().collect();
        assert!(s.is_held(Key::W));
        assert!(s.is_held(Key::Left));
        assert!(!s.is_held(Key::S));
        assert_eq!(s.held_count(), 2);
    }

    #[test]
    fn unbound_key_is_never_held() {
        let s: InputSnapshot = [Key::U].into_iter().collect();
        assert!(!s.binding_held(None));
        assert!(s.binding_held(Some(Key::U)));
    }
}
