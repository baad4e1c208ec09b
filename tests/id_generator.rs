use mesh_store::prelude::*;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Next(ElementType),
    Observe(ElementType, u64),
}

fn op() -> impl Strategy<Value = Op> {
    let ty = prop_oneof![
        Just(ElementType::Vertex),
        Just(ElementType::Line),
        Just(ElementType::Triangle),
    ];
    prop_oneof![
        ty.clone().prop_map(Op::Next),
        (ty, 1u64..1_000).prop_map(|(t, raw)| Op::Observe(t, raw)),
    ]
}

proptest! {
    #[test]
    fn issued_ids_exceed_everything_seen(ops in prop::collection::vec(op(), 1..64)) {
        let mut ids = IdGenerator::new();
        let mut seen: std::collections::HashMap<ElementType, u64> = Default::default();
        for op in ops {
            match op {
                Op::Next(ty) => {
                    let floor = seen.get(&ty).copied().unwrap_or(0);
                    prop_assert_eq!(ids.peek(ty).map(ElementId::get), Some(floor + 1));
                    let id = ids.next(ty).get();
                    prop_assert!(id > floor);
                    seen.insert(ty, id);
                }
                Op::Observe(ty, raw) => {
                    ids.observe(ty, ElementId::new(raw).unwrap());
                    let floor = seen.entry(ty).or_insert(0);
                    *floor = (*floor).max(raw);
                }
            }
        }
    }
}

#[test]
fn preset_ids_are_observed_by_the_mesh() {
    let mut mesh: Mesh = Mesh::new(MeshConfig::for_cell(ElementType::Triangle));
    let preset = ElementId::new(40).unwrap();
    let (v, _) = mesh.insert(Element::vertex().with_id(preset));
    assert_eq!(mesh.find_by_id(ElementType::Vertex, preset), Some(v));

    let next = mesh.insert_vertex(());
    assert_eq!(mesh.dereference(next).id().map(ElementId::get), Some(41));
    // Lines are counted separately.
    let w = mesh.insert_vertex(());
    let (e, _) = mesh.insert_element(ElementType::Line, [next, w]);
    assert_eq!(mesh.dereference(e).id().map(ElementId::get), Some(1));
}

#[test]
fn erased_ids_are_not_reissued() {
    let mut mesh: Mesh = Mesh::new(MeshConfig::for_cell(ElementType::Triangle));
    let v = mesh.insert_vertex(());
    let id = mesh.dereference(v).id().unwrap();
    mesh.erase(v);
    assert_eq!(mesh.find_by_id(ElementType::Vertex, id), None);
    let w = mesh.insert_vertex(());
    assert!(mesh.dereference(w).id().unwrap() > id);
}

#[test]
fn boundary_elements_receive_ids() {
    let mut mesh: Mesh = Mesh::new(MeshConfig::for_cell(ElementType::Tetrahedron));
    let v: Vec<_> = (0..4).map(|_| mesh.insert_vertex(())).collect();
    mesh.insert_element(ElementType::Tetrahedron, v);
    let mut ids: Vec<u64> = mesh
        .collection()
        .get(ElementType::Line)
        .iter()
        .filter_map(|e| e.id().map(ElementId::get))
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=6).collect::<Vec<_>>());
}

#[test]
#[should_panic(expected = "already holds a live element")]
fn reusing_a_live_id_is_rejected() {
    let mut mesh: Mesh = Mesh::new(
        MeshConfig::for_cell(ElementType::Triangle).with_handle_kind(HandleKind::Id),
    );
    let v = mesh.insert_vertex(());
    let id = mesh.dereference(v).id().unwrap();
    mesh.insert(Element::vertex().with_id(id));
}

#[test]
fn erased_ids_may_be_supplied_again() {
    let mut mesh: Mesh = Mesh::new(
        MeshConfig::for_cell(ElementType::Triangle).with_handle_kind(HandleKind::Id),
    );
    let a = mesh.insert_vertex(());
    let b = mesh.insert_vertex(());
    let id = mesh.dereference(a).id().unwrap();
    mesh.erase(a);
    let (c, inserted) = mesh.insert(Element::vertex().with_id(id));
    assert!(inserted);
    assert_eq!(c, a);
    assert!(mesh.contains(b));
    assert_eq!(mesh.len(), 2);
    assert!(mesh.validate_invariants().is_ok());
}
