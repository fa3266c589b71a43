use common::{Aabb, Plane};
use frustum::{build_packed_planes, intersect, Intersection};
use glam::Vec3;
use quadtree::{Config, QuadCoord, QuadTree, QuadtreeError, DELETED_SENTINEL};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn test_config() -> Config {
    Config {
        origin: Vec3::new(-32.0, 0.0, -32.0),
        node_size: 2.0,
        node_height: 16.0,
        max_lod: 3,
        root_cells: 4,
        cull_enabled: true,
        parallel_threshold: 4,
    }
}

fn quantized(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    let steps = ((hi - lo) * 4.0) as i32;
    lo + rng.gen_range(0..=steps) as f32 * 0.25
}

// Boxes on a 0.25 lattice, so every test below is exact in f32.
fn random_lattice_aabb(rng: &mut StdRng) -> Aabb {
    let min = Vec3::new(
        quantized(rng, -40.0, 36.0),
        quantized(rng, -2.0, 14.0),
        quantized(rng, -40.0, 36.0),
    );
    let size = Vec3::new(
        quantized(rng, 0.0, 6.0),
        quantized(rng, 0.0, 4.0),
        quantized(rng, 0.0, 6.0),
    );
    Aabb::from_min_max(min, min + size)
}

fn box_frustum(min: Vec3, max: Vec3) -> Vec<Plane> {
    vec![
        Plane::new(Vec3::X, -min.x),
        Plane::new(-Vec3::X, max.x),
        Plane::new(Vec3::Y, -min.y),
        Plane::new(-Vec3::Y, max.y),
        Plane::new(Vec3::Z, -min.z),
        Plane::new(-Vec3::Z, max.z),
    ]
}

fn assert_same_entries(a: &QuadTree, b: &QuadTree, indices: &[u32]) {
    assert_eq!(a.len(), b.len());
    assert_eq!(a.bucket_count(), b.bucket_count());
    assert_eq!(a.outsider_count(), b.outsider_count());
    let mut coords = HashSet::new();
    for &index in indices {
        assert_eq!(a.coord_of(index), b.coord_of(index), "index {}", index);
        if let Some(coord) = a.coord_of(index) {
            coords.insert(coord);
        }
    }
    for coord in coords {
        let mut left = a.indices_at(coord).to_vec();
        let mut right = b.indices_at(coord).to_vec();
        left.sort_unstable();
        right.sort_unstable();
        assert_eq!(left, right, "bucket {:?}", coord);
    }
}

#[test]
fn test_calculate_coord_finest_level() {
    let tree = QuadTree::new(Config {
        origin: Vec3::ZERO,
        node_size: 1.0,
        node_height: 10.0,
        max_lod: 4,
        root_cells: 1,
        ..Config::default()
    });

    let inside_one = Aabb::from_min_max(Vec3::new(2.25, 0.0, 3.25), Vec3::new(2.75, 1.0, 3.5));
    assert_eq!(tree.calculate_coord(&inside_one), QuadCoord::new(2, 3, 0));

    // Straddles x = 1 at lod 0, fits the lod 1 cell of size 2.
    let straddle_0 = Aabb::from_min_max(Vec3::new(0.75, 0.0, 0.25), Vec3::new(1.25, 1.0, 0.5));
    assert_eq!(tree.calculate_coord(&straddle_0), QuadCoord::new(0, 0, 1));

    // Straddles x = 2 at lods 0 and 1.
    let straddle_1 = Aabb::from_min_max(Vec3::new(1.5, 0.0, 0.25), Vec3::new(2.5, 1.0, 0.5));
    assert_eq!(tree.calculate_coord(&straddle_1), QuadCoord::new(0, 0, 2));

    // Straddles z = 8 all the way to the single root.
    let straddle_root = Aabb::from_min_max(Vec3::new(0.5, 0.0, 7.5), Vec3::new(0.75, 1.0, 8.5));
    assert_eq!(tree.calculate_coord(&straddle_root), QuadCoord::new(0, 0, 4));

    // The far edge of the region belongs to the last cell.
    let far_edge = Aabb::from_min_max(Vec3::new(15.5, 0.0, 15.5), Vec3::new(16.0, 10.0, 16.0));
    assert_eq!(tree.calculate_coord(&far_edge), QuadCoord::new(15, 15, 0));
}

#[test]
fn test_calculate_coord_outsiders() {
    let tree = QuadTree::new(test_config());
    let cases = [
        Aabb::new(Vec3::new(f32::NAN, 1.0, 0.0), Vec3::ONE),
        Aabb::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(f32::INFINITY, 1.0, 1.0)),
        Aabb::from_min_max(Vec3::new(-33.0, 1.0, 0.0), Vec3::new(-31.0, 2.0, 1.0)),
        Aabb::from_min_max(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 2.0, 1.0)),
        Aabb::from_min_max(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 17.0, 1.0)),
        Aabb::from_min_max(Vec3::new(0.0, 0.0, 30.0), Vec3::new(1.0, 16.5, 33.0)),
        // Taller than a node.
        Aabb::from_min_max(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 20.0, 1.0)),
        // Straddles two root cells (root cell size is 16).
        Aabb::from_min_max(Vec3::new(-1.0, 1.0, 2.0), Vec3::new(1.0, 2.0, 3.0)),
    ];
    for aabb in &cases {
        assert_eq!(tree.calculate_coord(aabb), QuadCoord::OUTSIDER, "{:?}", aabb);
    }
}

#[test]
fn test_calculate_coord_boxes_on_region_edges_with_unaligned_origin() {
    for step in 0..199 {
        let o = 0.1 * step as f32 + 0.037;
        let tree = QuadTree::new(Config {
            origin: Vec3::splat(o),
            node_size: 0.3,
            node_height: 1.0,
            max_lod: 2,
            root_cells: 3,
            ..Config::default()
        });
        let size = tree.config().world_size();
        let last = tree.config().cells_per_axis(0) - 1;

        let near = Aabb::from_min_max(Vec3::splat(o), Vec3::splat(o + 0.01));
        assert_eq!(tree.calculate_coord(&near), QuadCoord::new(0, 0, 0), "origin {}", o);

        let far = Aabb::from_min_max(
            Vec3::new(o + size - 0.01, o, o + size - 0.01),
            Vec3::new(o + size, o + 0.01, o + size),
        );
        assert_eq!(tree.calculate_coord(&far), QuadCoord::new(last, last, 0), "origin {}", o);

        let below = Aabb::from_min_max(Vec3::splat(o - 0.01), Vec3::splat(o + 0.01));
        assert_eq!(tree.calculate_coord(&below), QuadCoord::OUTSIDER, "origin {}", o);
    }
}

#[test]
fn test_calculate_coord_matches_cell_scan() {
    let mut rng = StdRng::seed_from_u64(11);
    let config = test_config();
    let tree = QuadTree::new(config.clone());
    let cell_of = |value: f32, lod: u32| ((value / config.cell_size(lod)).floor()) as i32;

    for _ in 0..5_000 {
        let aabb = random_lattice_aabb(&mut rng);
        let coord = tree.calculate_coord(&aabb);
        assert_eq!(coord, tree.calculate_coord(&aabb));
        if coord.is_outsider() {
            continue;
        }
        assert!(tree.world_bounds().contains_aabb(&aabb));
        let node = tree.node_aabb(coord).unwrap();
        assert!(node.contains_aabb(&aabb), "{:?} not in {:?}", aabb, node);

        if coord.lod > 0 {
            let finer = coord.lod as u32 - 1;
            let rel_min = aabb.min() - config.origin;
            let rel_max = aabb.max() - config.origin;
            let last = config.cells_per_axis(finer) - 1;
            let straddles = cell_of(rel_min.x, finer).min(last) != cell_of(rel_max.x, finer).min(last)
                || cell_of(rel_min.z, finer).min(last) != cell_of(rel_max.z, finer).min(last);
            assert!(straddles, "{:?} fits a finer cell than {:?}", aabb, coord);
        }
    }
}

#[test]
fn test_calculate_coords_batch_matches_single() {
    let mut rng = StdRng::seed_from_u64(5);
    let tree = QuadTree::new(test_config());
    let aabbs: Vec<Aabb> = (0..1_000).map(|_| random_lattice_aabb(&mut rng)).collect();
    let batch = tree.calculate_coords(&aabbs);
    for (aabb, coord) in aabbs.iter().zip(batch) {
        assert_eq!(tree.calculate_coord(aabb), coord);
    }
}

#[test]
fn test_insert_and_delete() {
    let mut tree = QuadTree::new(test_config());
    let aabb = Aabb::from_min_max(Vec3::new(0.25, 1.0, 0.25), Vec3::new(0.75, 2.0, 0.75));
    let coord = tree.insert(4, &aabb);
    assert_eq!(coord, QuadCoord::new(16, 16, 0));
    tree.insert(9, &aabb);
    let outsider = tree.insert(2, &Aabb::new(Vec3::splat(1000.0), Vec3::ONE));
    assert!(outsider.is_outsider());

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.outsider_count(), 1);
    assert_eq!(tree.bucket_count(), 1);
    assert!(tree.contains(4));
    assert_eq!(tree.coord_of(9), Some(coord));
    assert!(tree.check_consistency());

    assert!(tree.delete(4));
    assert!(!tree.delete(4));
    assert!(!tree.delete(77));
    assert_eq!(tree.indices_at(coord), &[9]);
    assert!(tree.delete(9));
    assert_eq!(tree.bucket_count(), 0);
    assert!(tree.delete(2));
    assert!(tree.is_empty());
    assert!(tree.check_consistency());
}

#[test]
fn test_insert_coord_outside_grid_is_outsider() {
    let mut tree = QuadTree::new(test_config());
    tree.insert_coord(1, QuadCoord::new(4, 0, 3));
    tree.insert_coord(2, QuadCoord::new(0, 0, 4));
    tree.insert_coord(3, QuadCoord::new(-1, 0, 0));
    tree.insert_coord(4, QuadCoord::new(31, 31, 0));
    assert_eq!(tree.outsider_count(), 3);
    assert_eq!(tree.coord_of(4), Some(QuadCoord::new(31, 31, 0)));
    assert!(tree.check_consistency());
}

#[test]
#[should_panic(expected = "already in the quadtree")]
fn test_double_insert_panics() {
    let mut tree = QuadTree::new(test_config());
    tree.insert_coord(1, QuadCoord::new(0, 0, 0));
    tree.insert_coord(1, QuadCoord::new(1, 0, 0));
}

#[test]
fn test_reinsert_marked_index_flushes() {
    let mut tree = QuadTree::new(test_config());
    tree.insert_coord(1, QuadCoord::new(0, 0, 0));
    tree.insert_coord(2, QuadCoord::new(0, 0, 0));
    assert!(tree.mark_for_delete(1));
    assert!(!tree.delete(1));
    tree.insert_coord(1, QuadCoord::new(3, 3, 1));

    assert_eq!(tree.pending_deletes(), 0);
    assert_eq!(tree.indices_at(QuadCoord::new(0, 0, 0)), &[2]);
    assert_eq!(tree.coord_of(1), Some(QuadCoord::new(3, 3, 1)));
    assert_eq!(tree.len(), 2);
    assert!(tree.check_consistency());
}

#[test]
fn test_insert_batch_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(21);
    let config = test_config();
    let world = QuadTree::new(config.clone()).world_bounds();
    let items: Vec<(u32, Aabb)> = (0..2_000u32)
        .map(|index| {
            let extents = Vec3::new(
                rng.gen_range(0.0..3.0),
                rng.gen_range(0.0..2.0),
                rng.gen_range(0.0..3.0),
            );
            (index, world.get_random_aabb_inside(extents, &mut rng))
        })
        .collect();

    let mut batched = QuadTree::new(config.clone());
    let coords = batched.insert_batch(&items);
    let mut sequential = QuadTree::new(config);
    for (&(index, aabb), &coord) in items.iter().zip(&coords) {
        assert_eq!(sequential.insert(index, &aabb), coord);
    }
    let indices: Vec<u32> = items.iter().map(|&(index, _)| index).collect();
    assert_same_entries(&batched, &sequential, &indices);
    assert!(batched.check_consistency());
}

#[test]
fn test_mark_and_flush_equals_delete() {
    let mut rng = StdRng::seed_from_u64(99);
    let config = test_config();
    let mut immediate = QuadTree::new(config.clone());
    let mut deferred = QuadTree::new(config);

    let mut live: Vec<u32> = Vec::new();
    let mut next_index = 0u32;
    let mut seen = Vec::new();
    for _round in 0..20 {
        for _ in 0..rng.gen_range(50..200) {
            let aabb = random_lattice_aabb(&mut rng);
            immediate.insert(next_index, &aabb);
            deferred.insert(next_index, &aabb);
            live.push(next_index);
            seen.push(next_index);
            next_index += 1;
        }
        let mut marked = 0;
        for _ in 0..rng.gen_range(0..live.len()) {
            let index = live.swap_remove(rng.gen_range(0..live.len()));
            assert!(immediate.delete(index));
            assert!(deferred.mark_for_delete(index));
            marked += 1;
        }
        assert_eq!(deferred.pending_deletes(), marked);
        assert!(deferred.check_consistency());
        assert_eq!(deferred.flush_deletes(), marked);
        assert_eq!(deferred.flush_deletes(), 0);

        assert_same_entries(&immediate, &deferred, &seen);
        assert!(immediate.check_consistency());
        assert!(deferred.check_consistency());
    }
    for index in &seen {
        assert_eq!(immediate.contains(*index), live.contains(index));
    }
}

#[test]
fn test_cull_without_planes_returns_everything_once() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut tree = QuadTree::new(test_config());
    for index in 0..3_000 {
        tree.insert(index, &random_lattice_aabb(&mut rng));
    }
    let outsiders = tree.outsider_count();
    assert!(outsiders > 0);

    let result = tree.cull(&build_packed_planes(&[]), true);
    assert_eq!(result.visible.len() + result.partial.len(), 3_000);
    assert_eq!(result.partial.len(), outsiders);
    let all: HashSet<u32> = result.visible.iter().chain(&result.partial).copied().collect();
    assert_eq!(all.len(), 3_000);
    assert_eq!(result.stats.nodes_out, 0);
    assert_eq!(result.stats.nodes_partial, 0);
}

#[test]
fn test_cull_accepts_subtree_of_inside_root_without_testing() {
    let mut tree = QuadTree::new(test_config());
    // All entries live under root cell (0, 0), spanning x and z in [-32, -16].
    tree.insert_coord(1, QuadCoord::new(0, 0, 3));
    tree.insert_coord(2, QuadCoord::new(2, 3, 1));
    tree.insert_coord(3, QuadCoord::new(0, 0, 0));
    tree.insert_coord(4, QuadCoord::new(1, 1, 0));
    tree.insert_coord(5, QuadCoord::new(1, 1, 0));

    let planes = build_packed_planes(&box_frustum(
        Vec3::new(-33.0, -1.0, -33.0),
        Vec3::new(-15.5, 17.0, -15.5),
    ));
    let result = tree.cull(&planes, true);

    assert_eq!(result.stats.nodes_tested, 1);
    assert_eq!(result.stats.nodes_in, 1);
    assert_eq!(result.stats.nodes_partial, 0);
    // (0,0,2) (1,1,2), then (0,0,1) (2,3,1), then (0,0,0) (1,1,0).
    assert_eq!(result.stats.nodes_accepted, 6);
    assert!(result.partial.is_empty());
    let mut visible = result.visible.clone();
    visible.sort_unstable();
    assert_eq!(visible, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_cull_disabled_returns_everything_as_partial() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut tree = QuadTree::new(Config {
        cull_enabled: false,
        ..test_config()
    });
    for index in 0..500 {
        tree.insert(index, &random_lattice_aabb(&mut rng));
    }
    let planes = build_packed_planes(&box_frustum(Vec3::splat(100.0), Vec3::splat(101.0)));
    let result = tree.cull_with_config(&planes);
    assert!(result.visible.is_empty());
    let all: HashSet<u32> = result.partial.iter().copied().collect();
    assert_eq!(result.partial.len(), 500);
    assert_eq!(all.len(), 500);
    assert_eq!(result.stats.nodes_tested, 0);
}

#[test]
fn test_cull_everything_out_keeps_outsiders() {
    let mut rng = StdRng::seed_from_u64(10);
    let mut tree = QuadTree::new(test_config());
    for index in 0..1_000 {
        tree.insert(index, &random_lattice_aabb(&mut rng));
    }
    let planes = build_packed_planes(&[Plane::new(Vec3::Y, -1000.0)]);
    let result = tree.cull(&planes, true);
    assert!(result.visible.is_empty());
    assert_eq!(result.partial.len(), tree.outsider_count());
    assert!(result.stats.nodes_out > 0);
    assert_eq!(result.stats.nodes_tested, result.stats.nodes_out);
}

#[test]
fn test_cull_partitions_entries() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut tree = QuadTree::new(test_config());
    let mut aabbs = Vec::new();
    for index in 0..4_000u32 {
        let aabb = random_lattice_aabb(&mut rng);
        tree.insert(index, &aabb);
        aabbs.push(aabb);
    }

    for _ in 0..50 {
        let a = Vec3::new(
            quantized(&mut rng, -40.0, 40.0),
            quantized(&mut rng, -2.0, 18.0),
            quantized(&mut rng, -40.0, 40.0),
        );
        let b = Vec3::new(
            quantized(&mut rng, -40.0, 40.0),
            quantized(&mut rng, -2.0, 18.0),
            quantized(&mut rng, -40.0, 40.0),
        );
        let planes = build_packed_planes(&box_frustum(a.min(b), a.max(b)));
        let result = tree.cull(&planes, true);

        let visible: HashSet<u32> = result.visible.iter().copied().collect();
        let partial: HashSet<u32> = result.partial.iter().copied().collect();
        assert_eq!(visible.len(), result.visible.len());
        assert_eq!(partial.len(), result.partial.len());
        assert!(visible.is_disjoint(&partial));

        for (index, aabb) in aabbs.iter().enumerate() {
            let index = index as u32;
            let class = intersect(&planes, aabb);
            if tree.coord_of(index) == Some(QuadCoord::OUTSIDER) {
                assert!(partial.contains(&index));
                continue;
            }
            if class != Intersection::Out {
                assert!(
                    visible.contains(&index) || partial.contains(&index),
                    "index {} with {:?} missing",
                    index,
                    class
                );
            }
            if visible.contains(&index) {
                assert_eq!(class, Intersection::In);
            }
        }
    }
}

#[test]
fn test_cull_flushes_pending_deletes() {
    let mut tree = QuadTree::new(test_config());
    tree.insert_coord(1, QuadCoord::new(0, 0, 0));
    tree.insert_coord(2, QuadCoord::new(0, 0, 0));
    tree.insert_coord(3, QuadCoord::OUTSIDER);
    assert!(tree.mark_for_delete(1));
    assert!(tree.mark_for_delete(3));

    let result = tree.cull(&build_packed_planes(&[]), true);
    assert_eq!(tree.pending_deletes(), 0);
    assert_eq!(result.visible, vec![2]);
    assert!(result.partial.is_empty());
    assert!(!result.visible.contains(&DELETED_SENTINEL));
}

#[test]
fn test_clear() {
    let mut tree = QuadTree::new(test_config());
    tree.insert_coord(1, QuadCoord::new(0, 0, 0));
    tree.insert_coord(2, QuadCoord::OUTSIDER);
    tree.mark_for_delete(1);
    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.bucket_count(), 0);
    assert_eq!(tree.pending_deletes(), 0);
    assert!(tree.check_consistency());
    tree.insert_coord(1, QuadCoord::new(0, 0, 0));
    assert!(tree.contains(1));
}

#[test]
fn test_invalid_configs() {
    let check = |config: Config| QuadTree::try_new(config).err();
    assert_eq!(
        check(Config {
            node_size: 0.0,
            ..Config::default()
        }),
        Some(QuadtreeError::InvalidNodeSize { node_size: 0.0 })
    );
    assert_eq!(
        check(Config {
            node_height: -1.0,
            ..Config::default()
        }),
        Some(QuadtreeError::InvalidNodeHeight { node_height: -1.0 })
    );
    assert_eq!(
        check(Config {
            root_cells: 0,
            ..Config::default()
        }),
        Some(QuadtreeError::NoRootCells)
    );
    assert_eq!(
        check(Config {
            root_cells: 1 << 12,
            max_lod: 20,
            ..Config::default()
        }),
        Some(QuadtreeError::GridTooLarge {
            root_cells: 1 << 12,
            max_lod: 20
        })
    );
    assert!(matches!(
        check(Config {
            origin: Vec3::new(f32::NAN, 0.0, 0.0),
            ..Config::default()
        }),
        Some(QuadtreeError::NonFiniteOrigin { .. })
    ));
    assert!(QuadTree::try_new(Config::default()).is_ok());
}

#[test]
#[should_panic(expected = "invalid quadtree config")]
fn test_new_panics_on_invalid_config() {
    let _ = QuadTree::new(Config {
        max_lod: 40,
        ..Config::default()
    });
}

#[test]
fn test_config_deserializes_with_defaults() {
    let config: Config =
        serde_json::from_str(r#"{ "max_lod": 2, "origin": [1.0, 2.0, 3.0] }"#).unwrap();
    assert_eq!(config.max_lod, 2);
    assert_eq!(config.origin, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(config.root_cells, Config::default().root_cells);
    assert!(config.validate().is_ok());
}
