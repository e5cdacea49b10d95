//! A region quadtree over axis-aligned boxes.
//!
//! Boxes live at the deepest node whose quadrant contains them entirely;
//! a box straddling a node's center lines stays at that node forever. Queries
//! are conservative: [`QuadTree::retrieve`] returns everything that *might*
//! intersect the query, and callers are expected to follow up with an exact
//! test.

use crate::{buildings::BuildingIdx, geom::Aabb, segment::SegIdx};

/// What an index entry refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Owner {
    /// A committed road segment.
    Segment(SegIdx),
    /// A placed building.
    Building(BuildingIdx),
}

/// A bounding box, tagged with the thing it bounds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Entry {
    /// The box.
    pub bounds: Aabb,
    /// Whose box it is.
    pub owner: Owner,
}

/// Shape parameters for a [`QuadTree`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct QuadTreeParams {
    /// The region covered by the root node.
    ///
    /// Boxes outside it can still be inserted; they just end up in whatever
    /// quadrant they are on the far side of.
    pub bounds: Aabb,
    /// A node splits once it holds more than this many boxes.
    pub max_objects: usize,
    /// Nodes at this depth never split.
    pub max_levels: usize,
}

impl Default for QuadTreeParams {
    fn default() -> Self {
        QuadTreeParams {
            bounds: Aabb::new(-20000.0, -20000.0, 40000.0, 40000.0),
            max_objects: 10,
            max_levels: 10,
        }
    }
}

/// A quadtree node, and (recursively) all of its descendants.
#[derive(Clone, Debug)]
pub struct QuadTree {
    bounds: Aabb,
    level: usize,
    max_objects: usize,
    max_levels: usize,
    objects: Vec<Entry>,
    // Quadrants in the order top-right, top-left, bottom-left, bottom-right.
    children: Option<Box<[QuadTree; 4]>>,
}

impl QuadTree {
    /// Creates an empty tree.
    pub fn new(params: QuadTreeParams) -> Self {
        QuadTree::node(params.bounds, 0, params.max_objects, params.max_levels)
    }

    fn node(bounds: Aabb, level: usize, max_objects: usize, max_levels: usize) -> Self {
        QuadTree {
            bounds,
            level,
            max_objects,
            max_levels,
            objects: Vec::new(),
            children: None,
        }
    }

    /// The region covered by this node.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Has this node been split into quadrants?
    pub fn is_split(&self) -> bool {
        self.children.is_some()
    }

    /// The entries held at this node itself (not in its descendants).
    pub fn local_entries(&self) -> &[Entry] {
        &self.objects
    }

    /// The total number of entries in this node and its descendants.
    pub fn len(&self) -> usize {
        self.objects.len()
            + self
                .children
                .iter()
                .flat_map(|c| c.iter())
                .map(QuadTree::len)
                .sum::<usize>()
    }

    /// Is the tree empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn split(&mut self) {
        let Aabb {
            x,
            y,
            width,
            height,
        } = self.bounds;
        let w = width / 2.0;
        let h = height / 2.0;
        let child = |x, y| QuadTree::node(Aabb::new(x, y, w, h), self.level + 1, self.max_objects, self.max_levels);
        self.children = Some(Box::new([
            child(x + w, y),
            child(x, y),
            child(x, y + h),
            child(x + w, y + h),
        ]));
    }

    /// Inserts an entry.
    pub fn insert(&mut self, entry: Entry) {
        if let Some(children) = &mut self.children {
            if let Some(i) = quadrant(&self.bounds, &entry.bounds) {
                children[i].insert(entry);
                return;
            }
        }

        self.objects.push(entry);

        if self.objects.len() > self.max_objects && self.level < self.max_levels {
            if self.children.is_none() {
                self.split();
            }
            let bounds = self.bounds;
            if let Some(children) = &mut self.children {
                let objects = std::mem::take(&mut self.objects);
                for e in objects {
                    match quadrant(&bounds, &e.bounds) {
                        Some(i) => children[i].insert(e),
                        None => self.objects.push(e),
                    }
                }
            }
        }
    }

    /// Returns every entry that might intersect `query`.
    ///
    /// This is guaranteed to include every entry whose box intersects
    /// `query`, and usually includes a few more.
    pub fn retrieve(&self, query: &Aabb) -> Vec<Entry> {
        let mut out = Vec::new();
        self.retrieve_into(query, &mut out);
        out
    }

    /// Like [`QuadTree::retrieve`], but appends to an existing buffer.
    pub fn retrieve_into(&self, query: &Aabb, out: &mut Vec<Entry>) {
        out.extend_from_slice(&self.objects);
        if let Some(children) = &self.children {
            match quadrant(&self.bounds, query) {
                Some(i) => children[i].retrieve_into(query, out),
                None => {
                    for child in children.iter() {
                        child.retrieve_into(query, out);
                    }
                }
            }
        }
    }

    /// Iterates over every entry in the tree, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        let mut stack = vec![self];
        let empty: &[Entry] = &[];
        let mut local = empty.iter();
        std::iter::from_fn(move || loop {
            if let Some(e) = local.next() {
                return Some(e);
            }
            let node = stack.pop()?;
            local = node.objects.iter();
            stack.extend(node.children.iter().flat_map(|c| c.iter()));
        })
    }

    /// Removes all entries and collapses the tree back to a single node.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.children = None;
    }
}

/// Which quadrant of `node` fully contains `r`, if any.
///
/// The center lines belong to no quadrant, so a box touching one stays at the
/// parent.
fn quadrant(node: &Aabb, r: &Aabb) -> Option<usize> {
    let vertical_mid = node.x + node.width / 2.0;
    let horizontal_mid = node.y + node.height / 2.0;

    let top = r.y < horizontal_mid && r.max_y() < horizontal_mid;
    let bottom = r.y > horizontal_mid;

    if r.x < vertical_mid && r.max_x() < vertical_mid {
        if top {
            Some(1)
        } else if bottom {
            Some(2)
        } else {
            None
        }
    } else if r.x > vertical_mid {
        if top {
            Some(0)
        } else if bottom {
            Some(3)
        } else {
            None
        }
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;
    use proptest::prelude::*;

    fn seg(i: usize, bounds: Aabb) -> Entry {
        Entry {
            bounds,
            owner: Owner::Segment(SegIdx(i)),
        }
    }

    fn small() -> QuadTree {
        QuadTree::new(QuadTreeParams {
            bounds: Aabb::new(0.0, 0.0, 100.0, 100.0),
            max_objects: 2,
            max_levels: 3,
        })
    }

    #[test]
    fn roots_near_the_origin() {
        let mut tree = QuadTree::new(QuadTreeParams::default());
        let a = seg(0, Aabb::enclosing([Point::new(0.0, 0.0), Point::new(400.0, 0.0)]));
        let b = seg(1, Aabb::enclosing([Point::new(0.0, 0.0), Point::new(0.0, 400.0)]));
        tree.insert(a);
        tree.insert(b);

        let found = tree.retrieve(&Aabb::new(-10.0, -10.0, 20.0, 20.0));
        assert!(found.contains(&a));
        assert!(found.contains(&b));
    }

    #[test]
    fn quadrants() {
        let node = Aabb::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(quadrant(&node, &Aabb::new(60.0, 10.0, 5.0, 5.0)), Some(0));
        assert_eq!(quadrant(&node, &Aabb::new(10.0, 10.0, 5.0, 5.0)), Some(1));
        assert_eq!(quadrant(&node, &Aabb::new(10.0, 60.0, 5.0, 5.0)), Some(2));
        assert_eq!(quadrant(&node, &Aabb::new(60.0, 60.0, 5.0, 5.0)), Some(3));
        // Straddling, and touching a center line.
        assert_eq!(quadrant(&node, &Aabb::new(45.0, 10.0, 10.0, 5.0)), None);
        assert_eq!(quadrant(&node, &Aabb::new(50.0, 10.0, 5.0, 5.0)), None);
        assert_eq!(quadrant(&node, &Aabb::new(10.0, 45.0, 5.0, 5.0)), None);
    }

    #[test]
    fn splits_and_redistributes() {
        let mut tree = small();
        tree.insert(seg(0, Aabb::new(10.0, 10.0, 5.0, 5.0)));
        tree.insert(seg(1, Aabb::new(40.0, 40.0, 20.0, 20.0)));
        assert!(!tree.is_split());

        tree.insert(seg(2, Aabb::new(70.0, 70.0, 5.0, 5.0)));
        assert!(tree.is_split());
        // Only the straddling box stays at the root.
        assert_eq!(tree.local_entries(), &[seg(1, Aabb::new(40.0, 40.0, 20.0, 20.0))]);
        assert_eq!(tree.len(), 3);

        // A query inside one quadrant skips the other three.
        let found = tree.retrieve(&Aabb::new(5.0, 5.0, 20.0, 20.0));
        assert_eq!(found.len(), 2);
        assert_eq!(tree.entries().count(), 3);

        tree.clear();
        assert!(tree.is_empty());
        assert!(!tree.is_split());
    }

    #[test]
    fn depth_is_capped() {
        let mut tree = small();
        for i in 0..20 {
            tree.insert(seg(i, Aabb::new(1.0, 1.0, 1.0, 1.0)));
        }
        let mut node = &tree;
        let mut depth = 0;
        while let Some(children) = &node.children {
            node = &children[1];
            depth += 1;
        }
        assert_eq!(depth, 3);
        assert_eq!(node.local_entries().len(), 20);
    }

    fn reasonable_box() -> BoxedStrategy<Aabb> {
        (-500.0..500.0, -500.0..500.0, 0.0..200.0, 0.0..200.0)
            .prop_map(|(x, y, w, h)| Aabb::new(x, y, w, h))
            .boxed()
    }

    proptest! {
        #[test]
        fn retrieve_is_a_superset(
            boxes in prop::collection::vec(reasonable_box(), 0..80),
            query in reasonable_box(),
        ) {
            let mut tree = QuadTree::new(QuadTreeParams {
                bounds: Aabb::new(-400.0, -400.0, 800.0, 800.0),
                max_objects: 3,
                max_levels: 6,
            });
            for (i, b) in boxes.iter().enumerate() {
                tree.insert(seg(i, *b));
            }
            prop_assert_eq!(tree.len(), boxes.len());

            let found = tree.retrieve(&query);
            for (i, b) in boxes.iter().enumerate() {
                if b.intersects(&query) {
                    prop_assert!(found.contains(&seg(i, *b)));
                }
            }
            // Everything can find itself.
            for (i, b) in boxes.iter().enumerate() {
                prop_assert!(tree.retrieve(b).contains(&seg(i, *b)));
            }
        }
    }
}

/// Checks on the index, driven by arbitrary input.
///
/// These are shared between the unit tests and the fuzz targets.
#[cfg(any(test, feature = "arbitrary"))]
pub mod arbtests {
    use arbitrary::Unstructured;

    use super::*;
    use crate::arbitrary::{aabb_in, another_aabb_in};

    /// After any sequence of inserts, a query returns at least every box
    /// that intersects it, and every box can find itself.
    pub fn retrieve_is_superset(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
        let params = QuadTreeParams {
            bounds: Aabb::new(-1000.0, -1000.0, 2000.0, 2000.0),
            max_objects: u.int_in_range(1..=8)?,
            max_levels: u.int_in_range(0..=6)?,
        };
        let mut tree = QuadTree::new(params);
        let mut boxes: Vec<Aabb> = Vec::new();

        let count: usize = u.int_in_range(0..=64)?;
        for i in 0..count {
            let near: bool = u.arbitrary()?;
            let bounds = match (near, boxes.last()) {
                (true, Some(prev)) => another_aabb_in(&params.bounds, prev, u)?,
                _ => aabb_in(&params.bounds, u)?,
            };
            tree.insert(Entry {
                bounds,
                owner: Owner::Segment(SegIdx(i)),
            });
            boxes.push(bounds);
        }
        assert_eq!(tree.len(), boxes.len());

        let query = aabb_in(&params.bounds, u)?;
        let found = tree.retrieve(&query);
        for (i, b) in boxes.iter().enumerate() {
            let owner = Owner::Segment(SegIdx(i));
            if b.intersects(&query) {
                assert!(found.iter().any(|e| e.owner == owner), "{owner:?} missing from query");
            }
            assert!(tree.retrieve(b).iter().any(|e| e.owner == owner));
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        #[test]
        fn retrieve_is_superset() {
            arbtest::arbtest(super::retrieve_is_superset);
        }
    }
}
