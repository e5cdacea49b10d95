/// Declares an index newtype and a vector that can only be indexed by it.
///
/// Both arenas in this crate (segments and buildings) only ever grow, so an
/// index handed out once stays valid for the lifetime of its arena.
macro_rules! typed_vec {
    ($(#[$vec_meta:meta])* $vec_name:ident, $(#[$idx_meta:meta])* $idx_name:ident, $dbg_prefix:expr) => {
        $(#[$idx_meta])*
        #[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $idx_name(pub usize);

        impl std::fmt::Debug for $idx_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", $dbg_prefix, self.0)
            }
        }

        $(#[$vec_meta])*
        #[derive(Clone)]
        pub struct $vec_name<T> {
            inner: Vec<T>,
        }

        #[allow(dead_code)]
        impl<T> $vec_name<T> {
            /// Returns an iterator over all indices into this vector.
            pub fn indices(&self) -> impl Iterator<Item = $idx_name> {
                (0..self.inner.len()).map($idx_name)
            }

            /// The number of elements.
            pub fn len(&self) -> usize {
                self.inner.len()
            }

            /// Are we empty?
            pub fn is_empty(&self) -> bool {
                self.inner.is_empty()
            }

            /// Adds a new element, returning its index.
            pub fn push(&mut self, elt: T) -> $idx_name {
                self.inner.push(elt);
                $idx_name(self.inner.len() - 1)
            }

            /// The element at `idx`, if `idx` belongs to this vector.
            pub fn get(&self, idx: $idx_name) -> Option<&T> {
                self.inner.get(idx.0)
            }

            /// Mutable access to two distinct elements at once.
            ///
            /// # Panics
            ///
            /// Panics if `a == b`.
            pub fn pair_mut(&mut self, a: $idx_name, b: $idx_name) -> (&mut T, &mut T) {
                assert_ne!(a, b, "pair_mut needs two distinct indices");
                if a.0 < b.0 {
                    let (lo, hi) = self.inner.split_at_mut(b.0);
                    (&mut lo[a.0], &mut hi[0])
                } else {
                    let (lo, hi) = self.inner.split_at_mut(a.0);
                    (&mut hi[0], &mut lo[b.0])
                }
            }

            /// Returns an iterator over indices and elements.
            pub fn iter(&self) -> impl Iterator<Item = ($idx_name, &T)> + '_ {
                self.inner
                    .iter()
                    .enumerate()
                    .map(|(idx, t)| ($idx_name(idx), t))
            }

            /// Returns an iterator over the elements, in index order.
            pub fn values(&self) -> std::slice::Iter<'_, T> {
                self.inner.iter()
            }
        }

        impl<T> Default for $vec_name<T> {
            fn default() -> Self {
                Self { inner: Vec::new() }
            }
        }

        impl<T> std::ops::Index<$idx_name> for $vec_name<T> {
            type Output = T;

            fn index(&self, index: $idx_name) -> &Self::Output {
                &self.inner[index.0]
            }
        }

        impl<T> std::ops::IndexMut<$idx_name> for $vec_name<T> {
            fn index_mut(&mut self, index: $idx_name) -> &mut T {
                &mut self.inner[index.0]
            }
        }

        impl<T: std::fmt::Debug> std::fmt::Debug for $vec_name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                struct Entry<'a, T> {
                    idx: $idx_name,
                    inner: &'a T,
                }

                impl<T: std::fmt::Debug> std::fmt::Debug for Entry<'_, T> {
                    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                        write!(f, "{idx:?}: {inner:?}", idx = self.idx, inner = self.inner,)
                    }
                }

                let mut list = f.debug_list();
                for (idx, inner) in self.iter() {
                    list.entry(&Entry { idx, inner });
                }
                list.finish()
            }
        }
    };
}
