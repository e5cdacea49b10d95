use criterion::{black_box, criterion_group, criterion_main, Criterion};

use roadgrowth::{
    collision::rect_rect,
    generators::{box_field, box_grid, staggered_rect_grid},
    Aabb, Entry, Owner, QuadTree, QuadTreeParams, SegIdx,
};

fn tree_of(boxes: &[Aabb]) -> QuadTree {
    let mut tree = QuadTree::new(QuadTreeParams::default());
    for (i, &bounds) in boxes.iter().enumerate() {
        tree.insert(Entry {
            bounds,
            owner: Owner::Segment(SegIdx(i)),
        });
    }
    tree
}

fn quadtree_insert(c: &mut Criterion) {
    let boxes = box_field(&QuadTreeParams::default().bounds, 10_000);
    c.bench_function("quadtree insert", |b| b.iter(|| black_box(tree_of(&boxes))));
}

fn quadtree_retrieve(c: &mut Criterion) {
    let bounds = QuadTreeParams::default().bounds;
    let tree = tree_of(&box_field(&bounds, 10_000));
    let queries = box_grid((bounds.x, bounds.y), 500.0, 2000.0, 20);

    let mut out = Vec::new();
    c.bench_function("quadtree retrieve", |b| {
        b.iter(|| {
            let mut total = 0;
            for q in &queries {
                out.clear();
                tree.retrieve_into(q, &mut out);
                total += out.len();
            }
            black_box(total)
        })
    });
}

fn sat(c: &mut Criterion) {
    // Neighbors overlap slightly, so most pairs go through every axis.
    let rects = staggered_rect_grid(30.0, 20.0, 25.0, 20);
    c.bench_function("rect-rect neighbors", |b| {
        b.iter(|| {
            rects
                .windows(2)
                .filter(|w| rect_rect(&w[0], &w[1]).is_some())
                .count()
        })
    });
}

criterion_group!(benches, quadtree_insert, quadtree_retrieve, sat);
criterion_main!(benches);
