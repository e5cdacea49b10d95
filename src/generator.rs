//! The growth loop.
//!
//! Candidate segments wait in a priority queue ordered by their scheduling
//! time `t`. Each popped candidate is checked against the committed network
//! ("local constraints"): it may be cut short where it crosses another road,
//! snapped onto a nearby junction or road, or thrown away. Accepted candidates
//! are committed, and then propose up to three follow-up candidates of their
//! own ("global goals"), steered by a population density map.

use arrayvec::ArrayVec;
use rand::Rng;

use crate::{
    config::Config,
    geom::{distance_to_line, intersect_segments, min_degree_difference, Point},
    network::RoadNetwork,
    population::PopulationDensity,
    queue::PriorityQueue,
    quadtree::Owner,
    rng::{random_angle, GenRng},
    segment::{End, SegIdx, Segment},
    Result,
};

/// A segment that hasn't been committed yet.
#[derive(Clone, Debug)]
struct Candidate {
    segment: Segment,
    // The committed segment this one grows out of. Links to it (and to its
    // other children) are made only once this candidate is accepted.
    parent: Option<SegIdx>,
    root: bool,
}

/// How a candidate interacts with the road it runs into.
///
/// When a candidate qualifies for several of these, the one listed first
/// wins.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Action {
    /// The candidate crosses `other`; `t` is the crossing's parameter along
    /// the candidate.
    Intersect { other: SegIdx, point: Point, t: f64 },
    /// The candidate ends near `other`'s end.
    SnapToEnd { other: SegIdx, point: Point },
    /// The candidate ends near the middle of `other`.
    SnapToLine { other: SegIdx, point: Point },
}

impl Action {
    fn priority(&self) -> u8 {
        match self {
            Action::Intersect { .. } => 4,
            Action::SnapToEnd { .. } => 3,
            Action::SnapToLine { .. } => 2,
        }
    }
}

/// Counters describing a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenerationStats {
    /// Candidates taken off the queue.
    pub popped: usize,
    /// Candidates committed.
    pub accepted: usize,
    /// Candidates thrown away by local constraints.
    pub rejected: usize,
    /// Candidates cut short by a crossing.
    pub intersections: usize,
    /// Candidates snapped onto an existing junction.
    pub snaps: usize,
    /// Committed segments split in two.
    pub splits: usize,
    /// Did the run stop because it hit the segment limit?
    pub cap_reached: bool,
}

/// The result of a generation run.
#[derive(Debug)]
pub struct Generation<P> {
    /// The road network.
    pub network: RoadNetwork,
    /// What happened along the way.
    pub stats: GenerationStats,
    /// The population map the network was grown against.
    pub population: P,
    /// The run's random generator, positioned after the last draw made by
    /// the growth loop, for follow-up steps like building placement.
    pub rng: GenRng,
}

/// Grows a road network.
pub struct Generator<P> {
    config: Config,
    population: P,
    rng: GenRng,
    network: RoadNetwork,
    queue: PriorityQueue<Candidate>,
    first_root: Option<SegIdx>,
    stats: GenerationStats,
}

impl<P: PopulationDensity> Generator<P> {
    /// Prepares a run, queueing the two root segments.
    ///
    /// The roots start at the origin and point in opposite directions along
    /// the `x` axis.
    pub fn new(config: Config, population: P, rng: GenRng) -> Result<Self> {
        config.validate()?;

        let mut queue = PriorityQueue::new();
        let highway = config.root_is_highway;
        let length = config.highway_segment_length;
        let width = config.segment_width(highway);
        for end in [Point::new(length, 0.0), Point::new(-length, 0.0)] {
            queue.push(
                0.0,
                Candidate {
                    segment: Segment::new(Point::ZERO, end, 0.0, highway, width),
                    parent: None,
                    root: true,
                },
            );
        }

        Ok(Generator {
            network: RoadNetwork::new(config.quadtree),
            config,
            population,
            rng,
            queue,
            first_root: None,
            stats: GenerationStats::default(),
        })
    }

    /// Runs until there's nothing left to grow or the network is full.
    pub fn run(mut self) -> Result<Generation<P>> {
        while self.network.len() < self.config.segment_count_limit {
            let Some(candidate) = self.queue.pop() else {
                break;
            };
            self.step(candidate)?;
        }

        self.stats.cap_reached = self.network.len() >= self.config.segment_count_limit;
        tracing::info!(
            segments = self.network.len(),
            pending = self.queue.len(),
            ran_dry = self.queue.is_empty(),
            cap_reached = self.stats.cap_reached,
            "road network generated"
        );

        Ok(Generation {
            network: self.network,
            stats: self.stats,
            population: self.population,
            rng: self.rng,
        })
    }

    fn step(&mut self, candidate: Candidate) -> Result<()> {
        self.stats.popped += 1;
        let Candidate {
            segment,
            parent,
            root,
        } = candidate;

        let action = self.local_constraints(&segment);
        tracing::trace!(start = ?segment.start(), end = ?segment.end(), t = segment.t(), ?action, "evaluating");

        let Some(idx) = self.apply(segment, action)? else {
            self.stats.rejected += 1;
            tracing::debug!(?action, "rejected candidate");
            return Ok(());
        };

        if let Some(parent) = parent {
            self.link_branch(parent, idx)?;
        }
        if root {
            match self.first_root {
                Some(other) => self.network.link_backward(other, idx),
                None => self.first_root = Some(idx),
            }
        }
        self.stats.accepted += 1;
        #[cfg(feature = "slow-asserts")]
        self.check_invariants();

        for branch in self.global_goals(idx) {
            self.queue.push(branch.segment.t(), branch);
        }
        Ok(())
    }

    // Every link is mutual, and linked segments share an endpoint.
    #[cfg(feature = "slow-asserts")]
    fn check_invariants(&self) {
        if let Err(e) = self.network.check_links() {
            panic!("broken links: {e}");
        }
        for (idx, seg) in self.network.segments().iter() {
            for &other in seg.links().backward.iter().chain(&seg.links().forward) {
                let other_seg = self.network.segment(other);
                assert!(
                    [seg.start(), seg.end()]
                        .into_iter()
                        .any(|p| p.coincides(other_seg.start()) || p.coincides(other_seg.end())),
                    "{idx:?} is linked to {other:?} but they don't touch"
                );
            }
        }
    }

    /// Finds the most important interaction between `segment` and the
    /// committed network, if there is one.
    fn local_constraints(&self, segment: &Segment) -> Option<Action> {
        let snap = self.config.road_snap_distance;
        let mut action: Option<Action> = None;
        let priority = |a: &Option<Action>| a.as_ref().map_or(0, Action::priority);

        for entry in self.network.index().retrieve(&segment.limits()) {
            let Owner::Segment(idx) = entry.owner else {
                continue;
            };
            let other = self.network.segment(idx);

            if priority(&action) <= 4 {
                let crossing = intersect_segments(
                    segment.start(),
                    segment.end(),
                    other.start(),
                    other.end(),
                    true,
                );
                if let Some(crossing) = crossing {
                    let closer = match action {
                        Some(Action::Intersect { t, .. }) => crossing.t < t,
                        _ => true,
                    };
                    if closer {
                        action = Some(Action::Intersect {
                            other: idx,
                            point: crossing.point,
                            t: crossing.t,
                        });
                    }
                }
            }

            if priority(&action) <= 3 && segment.end().distance(other.end()) <= snap {
                action = Some(Action::SnapToEnd {
                    other: idx,
                    point: other.end(),
                });
            }

            if priority(&action) <= 2 {
                let d = distance_to_line(segment.end(), other.start(), other.end());
                if d.distance2 < snap * snap && d.within_segment() {
                    action = Some(Action::SnapToLine {
                        other: idx,
                        point: d.point_on_line,
                    });
                }
            }
        }

        action
    }

    fn deviates_enough(&self, segment: &Segment, other: SegIdx) -> bool {
        let other_dir = self.network.segment(other).dir();
        min_degree_difference(other_dir, segment.dir()) >= self.config.minimum_intersection_deviation
    }

    /// Carries out `action`, committing the (possibly modified) segment.
    ///
    /// Returns `None` if the segment was rejected, in which case nothing was
    /// changed.
    fn apply(&mut self, mut segment: Segment, action: Option<Action>) -> Result<Option<SegIdx>> {
        let Some(action) = action else {
            return Ok(Some(self.network.commit(segment)));
        };

        match action {
            Action::Intersect { other, point, .. } => {
                if !self.deviates_enough(&segment, other) {
                    return Ok(None);
                }
                segment.set_end(point);
                segment.set_severed();
                let idx = self.network.commit(segment);
                self.network.split(other, point, idx)?;
                self.stats.intersections += 1;
                self.stats.splits += 1;
                Ok(Some(idx))
            }
            Action::SnapToEnd { other, point } => {
                segment.set_end(point);
                segment.set_severed();

                let links = self.network.links_at(other, End::End)?.clone();
                let duplicate = links.iter().any(|&link| {
                    let link = self.network.segment(link);
                    let (s, e) = (segment.start(), segment.end());
                    (link.start().coincides(e) && link.end().coincides(s))
                        || (link.start().coincides(s) && link.end().coincides(e))
                });
                if duplicate {
                    return Ok(None);
                }

                let idx = self.network.commit(segment);
                for &link in &links {
                    self.network.links_for_end_containing_mut(link, other)?.push(idx);
                    self.network.segment_mut(idx).links.forward.push(link);
                }
                self.network.links_at_mut(other, End::End)?.push(idx);
                self.network.segment_mut(idx).links.forward.push(other);
                self.stats.snaps += 1;
                Ok(Some(idx))
            }
            Action::SnapToLine { other, point } => {
                segment.set_end(point);
                segment.set_severed();
                if !self.deviates_enough(&segment, other) {
                    return Ok(None);
                }
                let idx = self.network.commit(segment);
                self.network.split(other, point, idx)?;
                self.stats.snaps += 1;
                self.stats.splits += 1;
                Ok(Some(idx))
            }
        }
    }

    /// Connects a newly committed branch to its parent and to the parent's
    /// other children.
    fn link_branch(&mut self, parent: SegIdx, branch: SegIdx) -> Result<()> {
        let siblings = self.network.links_at(parent, End::End)?.clone();
        for sibling in siblings {
            self.network.segment_mut(branch).links.backward.push(sibling);
            self.network
                .links_for_end_containing_mut(sibling, parent)?
                .push(branch);
        }
        self.network.links_at_mut(parent, End::End)?.push(branch);
        self.network.segment_mut(branch).links.backward.push(parent);
        Ok(())
    }

    /// Proposes follow-up segments starting at the end of `idx`.
    fn global_goals(&mut self, idx: SegIdx) -> ArrayVec<Candidate, 3> {
        let Generator {
            config,
            population,
            rng,
            network,
            ..
        } = self;
        let mut branches = ArrayVec::new();

        let parent = network.segment(idx);
        if parent.severed() {
            return branches;
        }

        let (start, dir, length, highway) = (parent.end(), parent.dir(), parent.length(), parent.highway());
        let t = parent.t() + 1.0;
        let candidate = |segment| Candidate {
            segment,
            parent: Some(idx),
            root: false,
        };
        // Same kind of road as the parent.
        let continuation = |dir| {
            candidate(Segment::using_direction(
                start,
                dir,
                length,
                t,
                highway,
                config.segment_width(highway),
            ))
        };
        // A normal road, delayed if it leaves a highway.
        let delay = if highway {
            config.normal_branch_time_delay_from_highway
        } else {
            0.0
        };
        let side_road = |dir| {
            candidate(Segment::using_direction(
                start,
                dir,
                config.default_segment_length,
                t + delay,
                false,
                config.default_segment_width,
            ))
        };

        let straight = continuation(dir);
        let straight_pop = population.on_road(&straight.segment);

        if highway {
            let deviated = continuation(dir + random_angle(rng, config.straight_angle_deviation));
            let deviated_pop = population.on_road(&deviated.segment);
            let road_pop = if deviated_pop > straight_pop {
                branches.push(deviated);
                deviated_pop
            } else {
                branches.push(straight);
                straight_pop
            };

            if road_pop > config.highway_branch_population_threshold {
                if rng.gen::<f64>() < config.highway_branch_probability {
                    let jitter = random_angle(rng, config.branch_angle_deviation);
                    branches.push(continuation(dir - 90.0 + jitter));
                } else if rng.gen::<f64>() < config.highway_branch_probability {
                    let jitter = random_angle(rng, config.branch_angle_deviation);
                    branches.push(continuation(dir + 90.0 + jitter));
                }
            }
        } else if straight_pop > config.normal_branch_population_threshold {
            branches.push(straight);
        }

        if straight_pop > config.normal_branch_population_threshold {
            if rng.gen::<f64>() < config.default_branch_probability {
                let jitter = random_angle(rng, config.branch_angle_deviation);
                branches.push(side_road(dir - 90.0 + jitter));
            } else if rng.gen::<f64>() < config.default_branch_probability {
                let jitter = random_angle(rng, config.branch_angle_deviation);
                branches.push(side_road(dir + 90.0 + jitter));
            }
        }

        branches
    }
}
