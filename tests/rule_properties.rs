//! Property-based checks of the rule algebra against point sampling.

use proptest::prelude::*;

use comblayer::geometry::{Cone, Primitive};
use comblayer::math::{Point3, Vector3};
use comblayer::register::SurfaceRegister;
use comblayer::rule::RuleNode;
use comblayer::HeadRule;

// ---------------------------------------------------------------------------
// Fixtures and strategies
// ---------------------------------------------------------------------------

/// Six mixed surfaces numbered 1..=6.
fn register() -> SurfaceRegister {
    let mut reg = SurfaceRegister::default();
    reg.build_plane(1, Point3::new(0.5, 0.0, 0.0), Vector3::x()).unwrap();
    reg.build_plane(2, Point3::new(0.0, -1.0, 0.0), Vector3::new(1.0, 1.0, 0.0))
        .unwrap();
    reg.build_cylinder(3, Point3::origin(), Vector3::z(), 2.0).unwrap();
    reg.build_sphere(4, Point3::new(1.0, 1.0, 1.0), 3.0).unwrap();
    reg.build_plane(5, Point3::origin(), Vector3::z()).unwrap();
    reg.build_cone(6, Point3::new(0.0, -2.0, 0.0), Vector3::y(), 30.0)
        .unwrap();
    reg
}

fn arb_node() -> impl Strategy<Value = RuleNode> {
    let leaf = (1i32..=6, any::<bool>()).prop_map(|(s, neg)| RuleNode::Surf(if neg { -s } else { s }));
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(RuleNode::Intersection),
            prop::collection::vec(inner, 0..4).prop_map(RuleNode::Union),
        ]
    })
}

fn arb_point() -> impl Strategy<Value = Point3> {
    (-6.0f64..6.0, -6.0f64..6.0, -6.0f64..6.0).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

/// Direct evaluation of an unsimplified tree.
fn eval_raw(node: &RuleNode, reg: &SurfaceRegister, p: &Point3) -> bool {
    match node {
        RuleNode::Surf(s) => reg.half_space_contains(*s, p).unwrap(),
        RuleNode::Intersection(items) => items.iter().all(|n| eval_raw(n, reg, p)),
        RuleNode::Union(items) => items.iter().any(|n| eval_raw(n, reg, p)),
    }
}

fn valid(rule: &HeadRule, reg: &SurfaceRegister, p: &Point3) -> bool {
    rule.is_valid(reg, p).unwrap()
}

// ---------------------------------------------------------------------------
// Algebra
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn simplification_preserves_region(node in arb_node(), p in arb_point()) {
        let reg = register();
        let rule = HeadRule::from_node(node.clone());
        prop_assert_eq!(valid(&rule, &reg, &p), eval_raw(&node, &reg, &p));
    }

    #[test]
    fn complement_is_an_involution(node in arb_node(), p in arb_point()) {
        let reg = register();
        let rule = HeadRule::from_node(node);
        let twice = rule.complement().complement();
        prop_assert_eq!(valid(&twice, &reg, &p), valid(&rule, &reg, &p));
    }

    #[test]
    fn complement_flips_membership(node in arb_node(), p in arb_point()) {
        let reg = register();
        let rule = HeadRule::from_node(node);
        prop_assert_ne!(valid(&rule.complement(), &reg, &p), valid(&rule, &reg, &p));
    }

    #[test]
    fn de_morgan(a in arb_node(), b in arb_node(), p in arb_point()) {
        let reg = register();
        let a = HeadRule::from_node(a);
        let b = HeadRule::from_node(b);
        let lhs = (&a * &b).complement();
        let rhs = a.complement() + b.complement();
        prop_assert_eq!(valid(&lhs, &reg, &p), valid(&rhs, &reg, &p));
    }

    #[test]
    fn display_reparses_to_same_region(node in arb_node(), p in arb_point()) {
        let reg = register();
        let rule = HeadRule::from_node(node);
        let again = HeadRule::parse(&rule.to_string()).unwrap();
        prop_assert_eq!(valid(&again, &reg, &p), valid(&rule, &reg, &p));
    }

    #[test]
    fn simplify_is_stable(node in arb_node()) {
        let rule = HeadRule::from_node(node);
        let mut again = rule.clone();
        again.simplify();
        prop_assert_eq!(again.to_string(), rule.to_string());
    }

    #[test]
    fn surf_set_is_unsigned_projection(node in arb_node()) {
        let rule = HeadRule::from_node(node);
        let from_signed: std::collections::BTreeSet<i32> =
            rule.signed_surf_set().into_iter().map(i32::abs).collect();
        prop_assert_eq!(rule.surf_set(), from_signed);
    }
}

// ---------------------------------------------------------------------------
// Register and plane removal
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn equal_planes_register_once(
        (ox, oy, oz) in (-50.0f64..50.0, -50.0f64..50.0, -50.0f64..50.0),
        (nx, ny, nz) in (-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0),
        (sx, sy) in (-10.0f64..10.0, -10.0f64..10.0),
        scale in 0.1f64..10.0,
    ) {
        let normal = Vector3::new(nx, ny, nz);
        prop_assume!(normal.norm() > 0.1);
        let origin = Point3::new(ox, oy, oz);
        // Slide the origin within the plane and rescale the normal
        let in_plane = comblayer::math::perpendicular_dir(&normal);
        let other_in_plane = normal.cross(&in_plane).normalize();
        let moved = origin + in_plane * sx + other_in_plane * sy;

        let mut reg = SurfaceRegister::default();
        let a = reg.build_plane(10, origin, normal).unwrap();
        let b = reg.build_plane(20, moved, normal * scale).unwrap();
        let c = reg.build_plane(30, moved, -normal).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(c, -a);
        prop_assert_eq!(reg.len(), 1);
    }

    #[test]
    fn equal_cylinders_register_once(
        r in 0.1f64..20.0,
        shift in -30.0f64..30.0,
    ) {
        let mut reg = SurfaceRegister::default();
        let a = reg.build_cylinder(1, Point3::origin(), Vector3::y(), r).unwrap();
        let b = reg.build_cylinder(2, Point3::new(0.0, shift, 0.0), -Vector3::y(), r).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn equal_cones_register_once(
        (ax, ay, az) in (-20.0f64..20.0, -20.0f64..20.0, -20.0f64..20.0),
        angle in 5.0f64..80.0,
        scale in 0.1f64..10.0,
    ) {
        let apex = Point3::new(ax, ay, az);
        let mut reg = SurfaceRegister::default();
        let a = reg.build_cone(1, apex, Vector3::z(), angle).unwrap();
        let b = reg.build_cone(2, apex, Vector3::z() * scale, angle).unwrap();
        let c = reg.build_cone(3, apex, -Vector3::z(), angle).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(a, c);
        prop_assert_eq!(reg.len(), 1);

        // A single nappe matches only the same nappe, from either axis sense
        let upper = Cone::new(apex, Vector3::z(), angle).unwrap().with_sheet(1);
        let flipped = Cone::new(apex, -Vector3::z(), angle).unwrap().with_sheet(-1);
        let lower = Cone::new(apex, Vector3::z(), angle).unwrap().with_sheet(-1);
        let u = reg.register(4, Primitive::Cone(upper)).unwrap();
        let f = reg.register(5, Primitive::Cone(flipped)).unwrap();
        let l = reg.register(6, Primitive::Cone(lower)).unwrap();
        prop_assert_ne!(u, a);
        prop_assert_eq!(f, u);
        prop_assert_ne!(l, u);
        prop_assert_eq!(reg.len(), 3);
    }

    #[test]
    fn removing_absent_axis_planes_is_noop(node in arb_node()) {
        let reg = register();
        let mut rule = HeadRule::from_node(node);
        let before = rule.clone();
        // No plane in the fixture has a normal along Y
        rule.remove_matched_planes(&reg, &Vector3::y(), 0.99).unwrap();
        prop_assert_eq!(rule, before);
    }

    #[test]
    fn removing_axis_planes_drops_them(node in arb_node()) {
        let reg = register();
        let mut rule = HeadRule::from_node(node);
        rule.remove_matched_planes(&reg, &Vector3::x(), 0.99).unwrap();
        prop_assert!(!rule.contains_surf(1));
        prop_assert!(rule.surf_set().iter().all(|&s| (2..=6).contains(&s)));
    }
}
