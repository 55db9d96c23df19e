use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed index into a [`ModelCache`](super::ModelCache).
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

// Implemented by hand so none of them bound `T`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.index).finish()
    }
}

impl<T> Handle<T> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_copy_for_non_clone_payloads() {
        struct NotClone;
        let first: Handle<NotClone> = Handle::new(3);
        let second = first;
        assert_eq!(first, second);
        assert_eq!(second.index(), 3);
    }

    #[test]
    fn handles_compare_and_print_without_payload_traits() {
        use std::collections::HashSet;

        struct Opaque;
        let a: Handle<Opaque> = Handle::new(1);
        let b: Handle<Opaque> = Handle::new(2);
        assert_ne!(a, b);
        assert_eq!(format!("{a:?}"), "Handle(1)");

        let set: HashSet<Handle<Opaque>> = [a, b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
