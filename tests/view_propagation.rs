use mesh_store::prelude::*;
use mesh_store::storage::view::ViewParent;
use proptest::prelude::*;

fn mesh_with_vertices(n: usize) -> (Mesh, Vec<Handle>) {
    let mut mesh: Mesh = Mesh::new(MeshConfig::for_cell(ElementType::Triangle));
    let v = (0..n).map(|_| mesh.insert_vertex(())).collect();
    (mesh, v)
}

fn triangle(v: &[Handle]) -> Element<()> {
    Element::new(ElementType::Triangle).with_vertices(v.iter().copied())
}

#[test]
fn chain_of_three_views_sees_one_physical_insert() {
    let all = [ElementType::Vertex, ElementType::Line, ElementType::Triangle];
    let (mut mesh, v) = mesh_with_vertices(3);
    let mut v1 = View::empty(&mesh, all);
    let mut v2 = View::empty(&v1, all);
    let mut v3 = View::empty(&v2, all);
    assert_eq!(v3.parent(), ViewParent::View(v2.id()));

    let before = mesh.statistics();
    let (t, inserted) = {
        let mut r1 = RecursiveInserter::new(&mut v1, &mut mesh);
        let mut r2 = RecursiveInserter::new(&mut v2, &mut r1);
        let mut r3 = RecursiveInserter::new(&mut v3, &mut r2);
        r3.insert(triangle(&v))
    };
    assert!(inserted);
    let after = mesh.statistics();
    assert_eq!(after[&ElementType::Triangle], before[&ElementType::Triangle] + 1);
    for view in [&v1, &v2, &v3] {
        assert_eq!(view.handles(ElementType::Triangle), &[t]);
        // the boundary cascade runs through the same chain
        assert_eq!(view.handles(ElementType::Line).len(), 3);
        view.debug_assert_invariants();
    }
}

#[test]
fn reinserting_a_duplicate_registers_it_in_the_view() {
    let (mut mesh, v) = mesh_with_vertices(2);
    let (edge, _) = mesh.insert_element(ElementType::Line, [v[0], v[1]]);
    let mut view = View::empty(&mesh, [ElementType::Line]);
    let (again, inserted) = {
        let mut r = RecursiveInserter::new(&mut view, &mut mesh);
        r.insert(Element::new(ElementType::Line).with_vertices([v[1], v[0]]))
    };
    assert!(!inserted);
    assert_eq!(again, edge);
    assert_eq!(view.handles(ElementType::Line), &[edge]);
}

#[test]
fn predicate_is_not_reevaluated() {
    let (mut mesh, v) = mesh_with_vertices(4);
    let first = v[0];
    let only_first = |h: Handle| h == first;
    let view = View::new(&mesh, [ElementType::Vertex], Some(&only_first));
    assert_eq!(view.len(), 1);
    mesh.insert_vertex(());
    assert_eq!(view.len(), 1);
}

#[test]
fn sibling_views_are_independent() {
    let (mut mesh, v) = mesh_with_vertices(3);
    let mut left = View::empty(&mesh, [ElementType::Triangle]);
    let right = View::empty(&mesh, [ElementType::Triangle]);
    {
        let mut r = RecursiveInserter::new(&mut left, &mut mesh);
        r.insert(triangle(&v));
    }
    assert_eq!(left.len(), 1);
    assert!(right.is_empty());
}

#[test]
fn direct_physical_inserts_bypass_views() {
    let (mut mesh, v) = mesh_with_vertices(3);
    let view = View::empty(&mesh, [ElementType::Triangle]);
    mesh.insert(triangle(&v));
    assert!(view.is_empty());
}

#[test]
fn coboundary_within_view() {
    let (mut mesh, v) = mesh_with_vertices(4);
    let mut view = View::empty(&mesh, [ElementType::Triangle]);
    let (inside, _) = {
        let mut r = RecursiveInserter::new(&mut view, &mut mesh);
        r.insert(triangle(&[v[0], v[1], v[2]]))
    };
    mesh.insert(triangle(&[v[0], v[2], v[3]]));
    assert_eq!(mesh.coboundary(v[0], ElementType::Triangle).len(), 2);
    assert_eq!(mesh.coboundary_within(&view, v[0], ElementType::Triangle), vec![inside]);
}

#[test]
#[should_panic(expected = "view chain mismatch")]
fn view_bound_to_the_wrong_parent_panics() {
    let (mut mesh, _) = mesh_with_vertices(1);
    let (other, _) = mesh_with_vertices(1);
    let mut view = View::empty(&other, [ElementType::Vertex]);
    let _ = RecursiveInserter::new(&mut view, &mut mesh);
}

#[test]
#[should_panic(expected = "not declared")]
fn view_over_undeclared_type_panics() {
    let (mesh, _) = mesh_with_vertices(1);
    let _ = View::empty(&mesh, [ElementType::Hexahedron]);
}

proptest! {
    #[test]
    fn registration_is_idempotent(picks in prop::collection::vec(0usize..6, 1..30)) {
        let (mesh, v) = mesh_with_vertices(6);
        let mut view = View::empty(&mesh, [ElementType::Vertex]);
        let mut distinct = std::collections::HashSet::new();
        for i in picks {
            let added = view.register(v[i]);
            prop_assert_eq!(added, distinct.insert(i));
            prop_assert_eq!(view.len(), distinct.len());
        }
    }

    #[test]
    fn each_view_gains_exactly_one_handle(depth in 1usize..5) {
        let (mut mesh, v) = mesh_with_vertices(2);
        let mut views = vec![View::empty(&mesh, [ElementType::Line])];
        for _ in 1..depth {
            let next = View::empty(views.last().unwrap(), [ElementType::Line]);
            views.push(next);
        }
        let (edge, inserted) = insert_through(&mut mesh, &mut views, Element::new(ElementType::Line).with_vertices([v[0], v[1]]));
        prop_assert!(inserted);
        prop_assert_eq!(mesh.statistics()[&ElementType::Line], 1);
        for view in &views {
            prop_assert_eq!(view.handles(ElementType::Line), &[edge][..]);
        }
    }
}

/// Inserts through a recursive inserter bound to the last view of `views`.
fn insert_through(parent: &mut dyn Inserter<()>, views: &mut [View], element: Element<()>) -> (Handle, bool) {
    match views.split_first_mut() {
        None => parent.insert(element),
        Some((first, rest)) => {
            let mut inserter = RecursiveInserter::new(first, parent);
            insert_through(&mut inserter, rest, element)
        }
    }
}
