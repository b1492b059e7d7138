//! Property tests for the quadrant split and the quadtree aggregates.

use bhsim_dist::{Body, DirectSum, ForceEvaluator, Gravity, NVec2, QuadTree, Quadrant};
use proptest::prelude::*;

fn arb_quadrant() -> impl Strategy<Value = Quadrant> {
    (-100.0..100.0f64, -100.0..100.0f64, 1e-3..100.0f64, 1e-3..100.0f64).prop_map(
        |(x, y, w, h)| Quadrant::new(x, y, x + w, y + h).expect("positive extents"),
    )
}

/// Bodies strictly inside the default domain with positive mass
fn arb_bodies(max: usize) -> impl Strategy<Value = Vec<Body>> {
    prop::collection::vec((0.0..4.0f64, 0.0..4.0f64, 0.01..10.0f64), 1..max).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(id, (x, y, m))| Body::new(id, NVec2::new(x, y), NVec2::zeros(), m))
            .collect()
    })
}

proptest! {
    #[test]
    fn children_tile_parent(q in arb_quadrant()) {
        let (tl, tr, bl, br) = (q.top_left(), q.top_right(), q.bot_left(), q.bot_right());
        let (mx, my) = (q.halfway_x(), q.halfway_y());

        // shared edges sit exactly on the midpoint, outer edges on the parent
        let bounds = |c: Quadrant| (c.x_min(), c.y_min(), c.x_max(), c.y_max());
        prop_assert_eq!(bounds(bl), (q.x_min(), q.y_min(), mx, my));
        prop_assert_eq!(bounds(br), (mx, q.y_min(), q.x_max(), my));
        prop_assert_eq!(bounds(tl), (q.x_min(), my, mx, q.y_max()));
        prop_assert_eq!(bounds(tr), (mx, my, q.x_max(), q.y_max()));

        let quarter = q.area() / 4.0;
        for child in [tl, tr, bl, br] {
            prop_assert!((child.area() - quarter).abs() <= 1e-9 * q.area());
        }
    }

    #[test]
    fn routing_lands_inside_the_child(q in arb_quadrant(), fx in 0.0..=1.0f64, fy in 0.0..=1.0f64) {
        let p = NVec2::new(
            q.x_min() + fx * (q.x_max() - q.x_min()),
            q.y_min() + fy * (q.y_max() - q.y_min()),
        );
        prop_assume!(q.contains(&p));
        prop_assert!(q.child(q.child_for(&p)).contains(&p));
    }

    #[test]
    fn insertion_conserves_mass(mut bodies in arb_bodies(80)) {
        let tree = QuadTree::build(Quadrant::default(), &mut bodies);

        let m: f64 = bodies.iter().map(|b| b.m).sum();
        let com = bodies.iter().fold(NVec2::zeros(), |acc, b| acc + b.x * b.m) / m;

        prop_assert_eq!(tree.count(), bodies.len());
        prop_assert!(bodies.iter().all(|b| b.is_active()));
        prop_assert!((tree.total_mass() - m).abs() <= 1e-9 * m);
        prop_assert!((tree.center_of_mass().unwrap() - com).norm() <= 1e-9);
    }

    #[test]
    fn exact_walk_matches_direct_sum(mut bodies in arb_bodies(40)) {
        let gravity = Gravity::default();
        let tree = QuadTree::build(Quadrant::default(), &mut bodies);
        let direct = DirectSum { bodies: &bodies, gravity };

        for b in &bodies {
            let scale: f64 = bodies
                .iter()
                .filter(|o| o.id != b.id)
                .map(|o| gravity.pairwise(b.m, &b.x, o.m, &o.x).norm())
                .sum();
            let diff = (tree.force_on(b, &gravity, 0.0) - direct.force_on(b)).norm();
            prop_assert!(diff <= 1e-12 * scale + 1e-300);
        }
    }
}
