use roadgrowth::{
    generate, rng, BuildingKind, Buildings, Config, Generation, Generator, Point, PopulationDensity,
    RoadNetwork,
};

fn capped(limit: usize) -> Config {
    Config {
        segment_count_limit: limit,
        ..Config::default()
    }
}

fn endpoints(network: &RoadNetwork) -> Vec<(Point, Point)> {
    network.segments().values().map(|s| (s.start(), s.end())).collect()
}

fn grow<P: PopulationDensity>(seed: u64, config: Config, population: P) -> Generation<P> {
    Generator::new(config, population, rng::seeded(seed))
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn same_seed_same_network() {
    for seed in [0, 1, 42] {
        let a = generate(seed, &capped(400)).unwrap();
        let b = generate(seed, &capped(400)).unwrap();
        assert_eq!(endpoints(&a.network), endpoints(&b.network));
        assert_eq!(a.stats, b.stats);
    }
}

/// Endpoints to a tenth of a unit, road kinds, and what got built.
fn layout(network: &RoadNetwork, buildings: &Buildings) -> String {
    let mut lines: Vec<String> = network
        .segments()
        .iter()
        .map(|(idx, s)| {
            let (a, b) = (s.start(), s.end());
            let kind = if s.highway() { "highway" } else { "road" };
            format!("{idx:?}: ({:.1}, {:.1}) -> ({:.1}, {:.1}) {kind}", a.x, a.y, b.x, b.y)
        })
        .collect();
    let residential = buildings
        .values()
        .filter(|b| b.kind() == BuildingKind::Residential)
        .count();
    lines.push(format!(
        "buildings: {residential} residential, {} import",
        buildings.len() - residential
    ));
    lines.join("\n")
}

// Any change to the order of random draws (branch directions, branch
// choices, building attempts) shows up here.
#[test]
fn seed_7_layout() {
    let config = capped(20);
    let mut city = grow(7, config.clone(), |x: f64, y: f64| {
        (0.5 + (y - x) / 4000.0).clamp(0.0, 1.0)
    });
    let mut buildings = Buildings::new(config.buildings);
    buildings.populate(&mut city.network, &mut city.rng).unwrap();

    insta::assert_snapshot!(layout(&city.network, &buildings), @r"
    s_0: (0.0, 0.0) -> (400.0, 0.0) highway
    s_1: (0.0, 0.0) -> (-400.0, 0.0) highway
    s_2: (400.0, 0.0) -> (792.9, 75.2) highway
    s_3: (-400.0, 0.0) -> (-800.0, 0.0) highway
    s_4: (792.9, 75.2) -> (1185.6, 151.1) highway
    s_5: (-800.0, 0.0) -> (-1199.7, 16.3) highway
    s_6: (1185.6, 151.1) -> (1578.3, 227.1) highway
    s_7: (-1199.7, 16.3) -> (-1599.3, 32.7) highway
    s_8: (1578.3, 227.1) -> (1959.0, 349.8) highway
    s_9: (-1599.3, 32.7) -> (-1999.0, 49.0) highway
    s_10: (1959.0, 349.8) -> (2339.7, 472.6) highway
    s_11: (-1999.0, 49.0) -> (-2398.7, 65.3) highway
    s_12: (400.0, 0.0) -> (391.5, 299.9) road
    s_13: (-400.0, 0.0) -> (-391.8, -299.9) road
    s_14: (2339.7, 472.6) -> (2720.4, 595.4) highway
    s_15: (-2398.7, 65.3) -> (-2798.3, 81.6) highway
    s_16: (-800.0, 0.0) -> (-802.3, -300.0) road
    s_17: (391.5, 299.9) -> (383.1, 599.8) road
    s_18: (391.5, 299.9) -> (91.6, 296.2) road
    s_19: (-391.8, -299.9) -> (-383.6, -599.8) road
    buildings: 7 residential, 2 import
    ");
}

#[test]
fn different_seeds_differ() {
    let a = generate(1, &capped(400)).unwrap();
    let b = generate(2, &capped(400)).unwrap();
    assert_ne!(endpoints(&a.network), endpoints(&b.network));
}

#[test]
fn links_are_mutual_and_meet_at_endpoints() {
    for seed in 0..4 {
        let city = grow(seed, capped(600), |_: f64, _: f64| 1.0);
        let network = &city.network;
        network.check_links().unwrap();

        for (idx, seg) in network.segments().iter() {
            let links = seg.links();
            for &other in links.backward.iter().chain(&links.forward) {
                assert_ne!(other, idx, "{idx:?} is linked to itself");
                let other_seg = network.segment(other);
                let shares_end = [seg.start(), seg.end()]
                    .iter()
                    .any(|p| p.coincides(other_seg.start()) || p.coincides(other_seg.end()));
                assert!(shares_end, "{idx:?} and {other:?} are linked but don't touch");
            }
        }
    }
}

#[test]
fn every_segment_is_indexed() {
    let city = generate(9, &capped(300)).unwrap();
    let network = &city.network;
    assert_eq!(network.index().len(), network.len());
    for (idx, seg) in network.segments().iter() {
        let found = network.index().retrieve(&seg.limits());
        assert!(found.iter().any(|e| e.owner == roadgrowth::Owner::Segment(idx)));
    }
}

#[test]
fn dense_population_hits_the_cap() {
    let city = grow(3, capped(300), |_: f64, _: f64| 1.0);
    assert!(city.stats.cap_reached);
    // A split can commit one extra segment on the last step.
    assert!((300..=301).contains(&city.network.len()));
    assert_eq!(
        city.stats.accepted + city.stats.splits,
        city.network.len(),
        "every segment is either accepted or a split twin"
    );
    assert_eq!(city.stats.popped, city.stats.accepted + city.stats.rejected);
}

#[test]
fn empty_population_runs_dry() {
    let config = Config {
        root_is_highway: false,
        ..capped(300)
    };
    let city = grow(3, config, |_: f64, _: f64| 0.0);
    assert!(!city.stats.cap_reached);
    assert_eq!(city.network.len(), 2);
    city.network.check_links().unwrap();
}

#[test]
fn buildings_never_overlap() {
    let mut city = grow(5, capped(300), |_: f64, _: f64| 1.0);
    let config = Config::default();
    let mut buildings = Buildings::new(config.buildings);
    let placed = buildings.populate(&mut city.network, &mut city.rng).unwrap();
    assert_eq!(placed, buildings.len());
    assert!(!buildings.is_empty());

    for (i, a) in buildings.iter() {
        for (_, seg) in city.network.segments().iter() {
            assert!(a.collider().collide(seg.collider()).unwrap().is_none());
        }
        // Buildings were checked against everything placed before them.
        for (j, b) in buildings.iter().take(i.0) {
            assert!(
                a.collider().collide(b.collider()).unwrap().is_none(),
                "{i:?} overlaps {j:?}"
            );
        }
    }

    // Everything (roads and buildings) shares the one index.
    assert_eq!(city.network.index().len(), city.network.len() + buildings.len());
}
