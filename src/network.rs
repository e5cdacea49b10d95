//! The committed road graph and its spatial index.

use crate::{
    geom::Point,
    quadtree::{QuadTree, QuadTreeParams},
    segment::{End, Links, SegIdx, Segment, SegmentVec},
    Error, Result,
};

/// A road network: committed segments, their adjacency, and a quadtree over
/// their bounding boxes.
///
/// Segments are never removed. Splitting a segment keeps its id for one half
/// and commits a new segment for the other.
#[derive(Clone, Debug)]
pub struct RoadNetwork {
    segments: SegmentVec<Segment>,
    index: QuadTree,
}

impl RoadNetwork {
    /// Creates an empty network whose index covers the given region.
    pub fn new(params: QuadTreeParams) -> Self {
        RoadNetwork {
            segments: SegmentVec::default(),
            index: QuadTree::new(params),
        }
    }

    /// All committed segments.
    pub fn segments(&self) -> &SegmentVec<Segment> {
        &self.segments
    }

    /// The committed segment at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` doesn't come from this network.
    pub fn segment(&self, idx: SegIdx) -> &Segment {
        &self.segments[idx]
    }

    /// The number of committed segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Are there no segments?
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The spatial index, holding segments and any buildings placed since.
    pub fn index(&self) -> &QuadTree {
        &self.index
    }

    pub(crate) fn index_mut(&mut self) -> &mut QuadTree {
        &mut self.index
    }

    pub(crate) fn segment_mut(&mut self, idx: SegIdx) -> &mut Segment {
        &mut self.segments[idx]
    }

    /// Adds a segment to the graph and the index, returning its new id.
    ///
    /// The segment keeps whatever links it was built with; it's up to the
    /// caller to make them mutual.
    pub fn commit(&mut self, mut segment: Segment) -> SegIdx {
        let idx = SegIdx(self.segments.len());
        segment.set_owner(idx);
        if let Some(entry) = segment.collider().entry() {
            self.index.insert(entry);
        }
        self.segments.push(segment)
    }

    /// Links two segments through their backward lists.
    pub fn link_backward(&mut self, a: SegIdx, b: SegIdx) {
        let (sa, sb) = self.segments.pair_mut(a, b);
        sa.links.backward.push(b);
        sb.links.backward.push(a);
    }

    /// Does `idx`'s backward list attach at its start point?
    ///
    /// This is worked out from coordinates: if there's a backward neighbor, we
    /// check whether it touches our start. Otherwise we check whether the first
    /// forward neighbor touches our end.
    pub fn start_is_backwards(&self, idx: SegIdx) -> Result<bool> {
        let seg = &self.segments[idx];
        let touches = |other: SegIdx, p: Point| {
            let other = &self.segments[other];
            other.start().coincides(p) || other.end().coincides(p)
        };

        if let Some(&b) = seg.links.backward.first() {
            Ok(touches(b, seg.start()))
        } else if let Some(&f) = seg.links.forward.first() {
            Ok(touches(f, seg.end()))
        } else {
            Err(Error::Unlinked(idx))
        }
    }

    // An unlinked segment is taken to have its backward end at the start,
    // which is where its first link will come from.
    fn oriented(&self, idx: SegIdx) -> Result<bool> {
        match self.start_is_backwards(idx) {
            Err(Error::Unlinked(_)) => Ok(true),
            r => r,
        }
    }

    /// The link list of `idx` that attaches to the physical end `end`.
    ///
    /// A segment with no links at all is treated as if its backward list were
    /// at its start.
    pub fn links_at(&self, idx: SegIdx, end: End) -> Result<&Vec<SegIdx>> {
        let links = &self.segments[idx].links;
        Ok(match (self.oriented(idx)?, end) {
            (true, End::Start) | (false, End::End) => &links.backward,
            (true, End::End) | (false, End::Start) => &links.forward,
        })
    }

    pub(crate) fn links_at_mut(&mut self, idx: SegIdx, end: End) -> Result<&mut Vec<SegIdx>> {
        let start_is_backwards = self.oriented(idx)?;
        let links = &mut self.segments[idx].links;
        Ok(match (start_is_backwards, end) {
            (true, End::Start) | (false, End::End) => &mut links.backward,
            (true, End::End) | (false, End::Start) => &mut links.forward,
        })
    }

    /// The link list of `idx` that mentions `neighbor`.
    pub fn links_for_end_containing(&self, idx: SegIdx, neighbor: SegIdx) -> Result<&Vec<SegIdx>> {
        self.segments[idx]
            .links
            .list_containing(neighbor)
            .ok_or(Error::MissingLink {
                segment: idx,
                neighbor,
            })
    }

    pub(crate) fn links_for_end_containing_mut(
        &mut self,
        idx: SegIdx,
        neighbor: SegIdx,
    ) -> Result<&mut Vec<SegIdx>> {
        self.segments[idx]
            .links
            .list_containing_mut(neighbor)
            .ok_or(Error::MissingLink {
                segment: idx,
                neighbor,
            })
    }

    /// Which physical end of `idx` the neighbor `neighbor` attaches to.
    pub fn end_containing(&self, idx: SegIdx, neighbor: SegIdx) -> Result<End> {
        let start_is_backwards = self.start_is_backwards(idx)?;
        let links = &self.segments[idx].links;
        let at_backward_end = if links.backward.contains(&neighbor) {
            true
        } else if links.forward.contains(&neighbor) {
            false
        } else {
            return Err(Error::MissingLink {
                segment: idx,
                neighbor,
            });
        };
        Ok(if at_backward_end == start_is_backwards {
            End::Start
        } else {
            End::End
        })
    }

    /// All neighbors of `idx`, forward ones first.
    pub fn neighbours(&self, idx: SegIdx) -> impl Iterator<Item = SegIdx> + '_ {
        let links = &self.segments[idx].links;
        links.forward.iter().chain(&links.backward).copied()
    }

    /// Splits `idx` at `point`, where the segment `intruder` meets it.
    ///
    /// The original segment keeps the part from `point` to its end; a new twin
    /// takes the part from its start to `point`. Neighbors at the start are
    /// moved over to the twin, and both halves become neighbors of each other
    /// and of `intruder` (which gets them in its forward list).
    ///
    /// Returns the id of the twin.
    pub fn split(&mut self, idx: SegIdx, point: Point, intruder: SegIdx) -> Result<SegIdx> {
        let start_is_backwards = self.start_is_backwards(idx)?;

        // The twin is indexed with the full pre-split box, which still covers it.
        let twin = self.segments[idx].twin();
        let twin = self.commit(twin);
        self.segments[twin].set_end(point);
        self.segments[idx].set_start(point);
        let links = self.segments[idx].links.clone();
        self.segments[twin].links = links;

        let fix_links = if start_is_backwards {
            self.segments[twin].links.backward.clone()
        } else {
            self.segments[twin].links.forward.clone()
        };
        for link in fix_links {
            let Links { backward, forward } = &mut self.segments[link].links;
            let slot = backward
                .iter_mut()
                .chain(forward.iter_mut())
                .find(|s| **s == idx)
                .ok_or(Error::MissingLink {
                    segment: link,
                    neighbor: idx,
                })?;
            *slot = twin;
        }

        let (first, second) = if start_is_backwards {
            (twin, idx)
        } else {
            (idx, twin)
        };
        self.segments[first].links.forward = vec![intruder, second];
        self.segments[second].links.backward = vec![intruder, first];
        let intruder_links = &mut self.segments[intruder].links.forward;
        intruder_links.push(first);
        intruder_links.push(second);

        tracing::debug!(segment = ?idx, ?twin, ?intruder, ?point, "split");
        Ok(twin)
    }

    /// Checks that every link is mutual: if `a` lists `b` as a neighbor, then
    /// `b` lists `a`.
    pub fn check_links(&self) -> Result<()> {
        for (idx, seg) in self.segments.iter() {
            for other in seg.links.backward.iter().chain(&seg.links.forward) {
                if !self.segments[*other].links.contains(idx) {
                    return Err(Error::MissingLink {
                        segment: *other,
                        neighbor: idx,
                    });
                }
            }
        }
        Ok(())
    }

    /// Draws the network as an svg document, highways in a darker color.
    /// Buildings, if given, are outlined on top.
    #[cfg(feature = "debug-svg")]
    pub fn dump_svg(&self, buildings: Option<&crate::Buildings>) -> svg::Document {
        let bbox = crate::geom::Aabb::enclosing(
            self.segments
                .values()
                .flat_map(|s| [s.start(), s.end()])
                .chain([Point::ZERO]),
        );
        let view = bbox.to_kurbo().inflate(200.0, 200.0);
        let mut document =
            svg::Document::new().set("viewBox", (view.x0, view.y0, view.width(), view.height()));
        document = document.add(
            svg::node::element::Rectangle::new()
                .set("x", view.x0)
                .set("y", view.y0)
                .set("width", view.width())
                .set("height", view.height())
                .set("fill", "#f4f1e8"),
        );

        // Normal roads first so that highways are drawn over them.
        let mut ordered: Vec<&Segment> = self.segments.values().collect();
        ordered.sort_by_key(|s| s.highway());
        for seg in ordered {
            let data = svg::node::element::path::Data::new()
                .move_to((seg.start().x, seg.start().y))
                .line_to((seg.end().x, seg.end().y));
            let color = if seg.highway() { "#a0522d" } else { "#555555" };
            let path = svg::node::element::Path::new()
                .set("stroke", color)
                .set("stroke-width", seg.width())
                .set("stroke-linecap", "round")
                .set("fill", "none")
                .set("d", data);
            document = document.add(path);
        }

        if let Some(buildings) = buildings {
            for building in buildings.values() {
                let [c0, c1, c2, c3] = building.corners();
                let data = svg::node::element::path::Data::new()
                    .move_to((c0.x, c0.y))
                    .line_to((c1.x, c1.y))
                    .line_to((c2.x, c2.y))
                    .line_to((c3.x, c3.y))
                    .close();
                let path = svg::node::element::Path::new()
                    .set("stroke", "black")
                    .set("stroke-width", 2.0)
                    .set("fill", building.kind().color())
                    .set("fill-opacity", 0.6)
                    .set("d", data);
                document = document.add(path);
            }
        }

        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Aabb;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn params() -> QuadTreeParams {
        QuadTreeParams::default()
    }

    fn road(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(Point::new(x0, y0), Point::new(x1, y1), 0.0, true, 16.0)
    }

    /// Two roots meeting at the origin, pointing along the x axis in opposite
    /// directions.
    fn roots() -> (RoadNetwork, SegIdx, SegIdx) {
        let mut net = RoadNetwork::new(params());
        let a = net.commit(road(0.0, 0.0, 400.0, 0.0));
        let b = net.commit(road(0.0, 0.0, -400.0, 0.0));
        net.link_backward(a, b);
        (net, a, b)
    }

    fn layout(net: &RoadNetwork) -> String {
        net.segments()
            .iter()
            .map(|(idx, s)| {
                format!(
                    "{idx:?}: {:?} -> {:?}, back {:?}, fwd {:?}",
                    s.start(),
                    s.end(),
                    s.links().backward,
                    s.links().forward
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn orientation() {
        let (net, a, b) = roots();
        assert!(net.start_is_backwards(a).unwrap());
        assert!(net.start_is_backwards(b).unwrap());
        assert_eq!(net.end_containing(a, b).unwrap(), End::Start);
        assert_eq!(net.links_at(a, End::Start).unwrap(), &vec![b]);
        assert!(net.links_at(a, End::End).unwrap().is_empty());
        assert_eq!(net.neighbours(a).collect::<Vec<_>>(), vec![b]);
        net.check_links().unwrap();
    }

    #[test]
    fn unlinked_and_missing() {
        let mut net = RoadNetwork::new(params());
        let a = net.commit(road(0.0, 0.0, 10.0, 0.0));
        let b = net.commit(road(10.0, 0.0, 20.0, 0.0));
        assert_matches!(net.start_is_backwards(a), Err(Error::Unlinked(s)) if s == a);
        assert!(net.links_at(a, End::End).unwrap().is_empty());
        assert_matches!(
            net.links_for_end_containing(a, b),
            Err(Error::MissingLink { segment, neighbor }) if segment == a && neighbor == b
        );

        // A one-sided link breaks the invariant.
        net.segment_mut(a).links.forward.push(b);
        assert_matches!(net.check_links(), Err(Error::MissingLink { segment, neighbor }) if segment == b && neighbor == a);
        // But orientation can still be worked out from the forward neighbor.
        assert!(net.start_is_backwards(a).unwrap());
        assert_eq!(net.links_for_end_containing(a, b).unwrap(), &vec![b]);
    }

    #[test]
    fn split_root() {
        let (mut net, a, b) = roots();
        let c = net.commit(road(200.0, -100.0, 200.0, 0.0));
        let twin = net.split(a, Point::new(200.0, 0.0), c).unwrap();
        assert_eq!(twin, SegIdx(3));

        insta::assert_snapshot!(layout(&net), @r"
        s_0: (200.0, 0.0) -> (400.0, 0.0), back [s_2, s_3], fwd []
        s_1: (0.0, 0.0) -> (-400.0, 0.0), back [s_3], fwd []
        s_2: (200.0, -100.0) -> (200.0, 0.0), back [], fwd [s_3, s_0]
        s_3: (0.0, 0.0) -> (200.0, 0.0), back [s_1], fwd [s_2, s_0]
        ");

        net.check_links().unwrap();
        assert_eq!(net.end_containing(twin, b).unwrap(), End::Start);
        assert_eq!(net.end_containing(a, twin).unwrap(), End::Start);
        assert_eq!(net.end_containing(twin, a).unwrap(), End::End);
        assert_eq!(net.segment(a).length(), 200.0);
        assert_eq!(net.segment(twin).length(), 200.0);

        // Both halves are findable near the split point.
        let found = net.index().retrieve(&Aabb::around(Point::new(200.0, 0.0), 1.0));
        for idx in [a, twin] {
            assert!(found.iter().any(|e| e.owner == crate::Owner::Segment(idx)));
        }
    }

    #[test]
    fn split_reversed_segment() {
        // `a`'s backward neighbor is at its end, so the halves swap roles.
        let mut net = RoadNetwork::new(params());
        let a = net.commit(road(0.0, 0.0, 100.0, 0.0));
        let b = net.commit(road(100.0, 0.0, 200.0, 0.0));
        net.link_backward(a, b);
        assert!(!net.start_is_backwards(a).unwrap());

        let c = net.commit(road(50.0, 50.0, 50.0, 0.0));
        let twin = net.split(a, Point::new(50.0, 0.0), c).unwrap();
        net.check_links().unwrap();

        // `a` keeps the far half, which still touches `b`.
        assert_eq!(net.segment(a).start(), Point::new(50.0, 0.0));
        assert_eq!(net.segment(a).links().backward, vec![b]);
        assert_eq!(net.segment(a).links().forward, vec![c, twin]);
        assert_eq!(net.segment(twin).links().backward, vec![c, a]);
        assert_eq!(net.segment(c).links().forward, vec![a, twin]);
    }

    proptest! {
        #[test]
        fn split_conserves_links(
            extra_back in 0usize..4,
            extra_fwd in 0usize..4,
            frac in 0.01..0.99f64,
        ) {
            // A horizontal segment with a fan of neighbors at each end.
            let mut net = RoadNetwork::new(params());
            let s = net.commit(road(0.0, 0.0, 100.0, 0.0));
            for i in 0..=extra_back {
                let n = net.commit(road(0.0, 0.0, -10.0, i as f64));
                net.link_backward(s, n);
            }
            for i in 0..extra_fwd {
                let n = net.commit(road(100.0, 0.0, 110.0, i as f64));
                net.segment_mut(s).links.forward.push(n);
                net.segment_mut(n).links.backward.push(s);
            }
            let before = net.segment(s).links().len();

            let point = Point::new(100.0 * frac, 0.0);
            let intruder = net.commit(road(100.0 * frac, 50.0, 100.0 * frac, 0.0));
            let twin = net.split(s, point, intruder).unwrap();

            let after = net.segment(s).links().len() + net.segment(twin).links().len();
            // Besides the original links, each half gains the intruder and the
            // other half.
            prop_assert_eq!(after, before + 4);
            prop_assert_eq!(net.segment(intruder).links().forward.len(), 2);
            prop_assert!(net.check_links().is_ok());
        }
    }
}

/// Checks on graph surgery, driven by arbitrary input.
///
/// These are shared between the unit tests and the fuzz targets.
#[cfg(any(test, feature = "arbitrary"))]
pub mod arbtests {
    use arbitrary::Unstructured;

    use super::*;
    use crate::arbitrary::float_in_range;

    fn total_links(network: &RoadNetwork) -> usize {
        network.segments.values().map(|s| s.links.len()).sum()
    }

    fn touches(a: &Segment, b: &Segment) -> bool {
        [a.start(), a.end()]
            .into_iter()
            .any(|p| p.coincides(b.start()) || p.coincides(b.end()))
    }

    /// Lays out a straight road of linked segments (some pointing backwards),
    /// then repeatedly splits random pieces of it with crossing intruders.
    ///
    /// Every split adds exactly six link entries (two each for the halves and
    /// the intruder), links stay mutual, and linked segments always touch.
    pub fn split_keeps_links(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
        let mut network = RoadNetwork::new(QuadTreeParams::default());
        let mut road = Vec::new();

        let count: usize = u.int_in_range(2..=6)?;
        for i in 0..count {
            let near = Point::new(i as f64 * 100.0, 0.0);
            let far = Point::new((i + 1) as f64 * 100.0, 0.0);
            let reversed: bool = u.arbitrary()?;
            let (start, end) = if reversed { (far, near) } else { (near, far) };
            let idx = network.commit(Segment::new(start, end, 0.0, false, 6.0));
            if let Some(&prev) = road.last() {
                network.segments[prev].links.forward.push(idx);
                network.segments[idx].links.backward.push(prev);
            }
            road.push(idx);
        }

        let splits: usize = u.int_in_range(1..=8)?;
        for _ in 0..splits {
            let victim = road[u.choose_index(road.len())?];
            let seg = &network.segments[victim];
            let t = float_in_range(0.05, 0.95, u)?;
            let point = seg.start() + (seg.end() - seg.start()) * t;
            let intruder = network.commit(Segment::new(
                point + Point::new(0.0, 100.0),
                point,
                1.0,
                false,
                6.0,
            ));

            let before = total_links(&network);
            let twin = network.split(victim, point, intruder).expect("the road is linked");
            road.push(twin);

            assert_eq!(total_links(&network), before + 6);
            assert_eq!(network.segments[intruder].links.forward.len(), 2);
            network.check_links().expect("links are mutual");
        }

        for (idx, seg) in network.segments.iter() {
            for other in seg.links.backward.iter().chain(&seg.links.forward) {
                assert!(touches(seg, &network.segments[*other]), "{idx:?} doesn't touch {other:?}");
            }
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        #[test]
        fn split_keeps_links() {
            arbtest::arbtest(super::split_keeps_links);
        }
    }
}
