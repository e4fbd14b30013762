use super::RuleNode;

/// Brings a rule tree into normal form.
///
/// - nested groups of the same kind are flattened;
/// - single-child groups collapse to the child;
/// - duplicate terms are dropped, keeping first occurrence order;
/// - `s` together with `-s` makes an intersection null and a union all space;
/// - all space is the identity of intersection and absorbs a union, and
///   the null region is the identity of union and annihilates an intersection;
/// - absorption: `a (a : b)` becomes `a` and `a : a b` becomes `a`.
pub(super) fn normalize(node: RuleNode) -> RuleNode {
    match node {
        RuleNode::Surf(s) => RuleNode::Surf(s),
        RuleNode::Intersection(items) => normalize_group(items, true),
        RuleNode::Union(items) => normalize_group(items, false),
    }
}

fn is_identity(node: &RuleNode, is_and: bool) -> bool {
    match node {
        RuleNode::Intersection(v) => is_and && v.is_empty(),
        RuleNode::Union(v) => !is_and && v.is_empty(),
        RuleNode::Surf(_) => false,
    }
}

fn is_annihilator(node: &RuleNode, is_and: bool) -> bool {
    is_identity(node, !is_and)
}

fn annihilator(is_and: bool) -> RuleNode {
    if is_and {
        RuleNode::Union(Vec::new())
    } else {
        RuleNode::Intersection(Vec::new())
    }
}

fn normalize_group(items: Vec<RuleNode>, is_and: bool) -> RuleNode {
    let mut flat: Vec<RuleNode> = Vec::with_capacity(items.len());
    for item in items {
        let item = normalize(item);
        if is_identity(&item, is_and) {
            continue;
        }
        if is_annihilator(&item, is_and) {
            return annihilator(is_and);
        }
        match item {
            RuleNode::Intersection(sub) if is_and => push_all(&mut flat, sub),
            RuleNode::Union(sub) if !is_and => push_all(&mut flat, sub),
            other => push_unique(&mut flat, other),
        }
    }

    // s and -s in the same group
    let contradiction = flat.iter().any(|n| match n {
        RuleNode::Surf(s) => flat.contains(&RuleNode::Surf(-s)),
        _ => false,
    });
    if contradiction {
        return annihilator(is_and);
    }

    absorb(&mut flat, is_and);

    if flat.len() == 1 {
        return flat.pop().unwrap_or_else(|| annihilator(!is_and));
    }
    if is_and {
        RuleNode::Intersection(flat)
    } else {
        RuleNode::Union(flat)
    }
}

fn push_all(flat: &mut Vec<RuleNode>, items: Vec<RuleNode>) {
    for item in items {
        push_unique(flat, item);
    }
}

fn push_unique(flat: &mut Vec<RuleNode>, item: RuleNode) {
    if !flat.contains(&item) {
        flat.push(item);
    }
}

/// Drops sub-groups of the opposite kind that contain one of this group's
/// own terms as a direct child.
fn absorb(flat: &mut Vec<RuleNode>, is_and: bool) {
    let terms: Vec<RuleNode> = flat
        .iter()
        .filter(|n| !is_opposite_group(n, is_and))
        .cloned()
        .collect();
    flat.retain(|n| match n {
        RuleNode::Union(sub) if is_and => !sub.iter().any(|c| terms.contains(c)),
        RuleNode::Intersection(sub) if !is_and => !sub.iter().any(|c| terms.contains(c)),
        _ => true,
    });
}

fn is_opposite_group(node: &RuleNode, is_and: bool) -> bool {
    match node {
        RuleNode::Union(_) => is_and,
        RuleNode::Intersection(_) => !is_and,
        RuleNode::Surf(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(n: i32) -> RuleNode {
        RuleNode::Surf(n)
    }

    #[test]
    fn flattens_and_dedups() {
        let node = RuleNode::Intersection(vec![
            s(1),
            RuleNode::Intersection(vec![s(2), s(1)]),
            s(3),
        ]);
        assert_eq!(normalize(node), RuleNode::Intersection(vec![s(1), s(2), s(3)]));
    }

    #[test]
    fn contradiction_collapses() {
        let and = RuleNode::Intersection(vec![s(1), s(-1), s(4)]);
        assert_eq!(normalize(and), RuleNode::Union(vec![]));
        let or = RuleNode::Union(vec![s(1), s(-1)]);
        assert_eq!(normalize(or), RuleNode::Intersection(vec![]));
    }

    #[test]
    fn identity_and_annihilator() {
        let and = RuleNode::Intersection(vec![s(1), RuleNode::Intersection(vec![])]);
        assert_eq!(normalize(and), s(1));
        let and = RuleNode::Intersection(vec![s(1), RuleNode::Union(vec![])]);
        assert_eq!(normalize(and), RuleNode::Union(vec![]));
        let or = RuleNode::Union(vec![s(1), RuleNode::Intersection(vec![])]);
        assert_eq!(normalize(or), RuleNode::Intersection(vec![]));
    }

    #[test]
    fn absorption() {
        let and = RuleNode::Intersection(vec![s(1), RuleNode::Union(vec![s(1), s(2)]), s(3)]);
        assert_eq!(normalize(and), RuleNode::Intersection(vec![s(1), s(3)]));
        let or = RuleNode::Union(vec![RuleNode::Intersection(vec![s(5), s(6)]), s(5)]);
        assert_eq!(normalize(or), s(5));
    }

    #[test]
    fn singleton_groups_collapse() {
        let node = RuleNode::Union(vec![RuleNode::Intersection(vec![s(7)])]);
        assert_eq!(normalize(node), s(7));
    }
}
