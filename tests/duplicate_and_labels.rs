use mesh_store::prelude::*;

#[derive(Clone, Debug, Default, PartialEq)]
struct Coords([f64; 2]);

fn square() -> (Mesh<Coords>, Vec<Handle>, [Handle; 2]) {
    let mut mesh = Mesh::new(MeshConfig::for_cell(ElementType::Triangle));
    let v: Vec<Handle> = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
        .into_iter()
        .map(|xy| mesh.insert_vertex(Coords(xy)))
        .collect();
    let (a, _) = mesh.insert_element(ElementType::Triangle, [v[0], v[1], v[2]]);
    let (b, _) = mesh.insert_element(ElementType::Triangle, [v[1], v[3], v[2]]);
    (mesh, v, [a, b])
}

fn id_of(mesh: &Mesh<Coords>, h: Handle) -> ElementId {
    mesh.dereference(h).id().unwrap()
}

#[test]
fn duplicate_is_independent() {
    let (mut mesh, v, [a, _]) = square();
    let copy = mesh.duplicate();
    assert_eq!(copy.statistics(), mesh.statistics());
    assert!(!copy.contains(a));
    assert!(copy.validate_invariants().is_ok());

    let a_copy = copy.find_by_id(ElementType::Triangle, id_of(&mesh, a)).unwrap();
    let v0_copy = copy.find_by_id(ElementType::Vertex, id_of(&mesh, v[0])).unwrap();
    assert_eq!(copy.dereference(a_copy).vertices()[0], v0_copy);
    assert_eq!(copy.dereference(v0_copy).appendix(), &Coords([0.0, 0.0]));

    mesh.appendix_mut(v[0]).unwrap().0 = [5.0, 5.0];
    mesh.erase(v[3]);
    assert_eq!(copy.dereference(v0_copy).appendix(), &Coords([0.0, 0.0]));
    assert_eq!(copy.statistics()[&ElementType::Triangle], 2);
    assert_eq!(mesh.statistics()[&ElementType::Triangle], 1);
}

#[test]
fn duplicate_keeps_deduplicating() {
    let (mesh, v, _) = square();
    let mut copy = mesh.duplicate();
    let v1 = copy.find_by_id(ElementType::Vertex, id_of(&mesh, v[1])).unwrap();
    let v2 = copy.find_by_id(ElementType::Vertex, id_of(&mesh, v[2])).unwrap();
    let (_, inserted) = copy.insert_element(ElementType::Line, [v2, v1]);
    assert!(!inserted);
    // Ids continue where the original left off.
    let next = copy.insert_vertex(Coords::default());
    assert_eq!(copy.dereference(next).id().map(ElementId::get), Some(5));
}

#[test]
fn duplicate_cascade_creates_fresh_edges() {
    let (mesh, v, _) = square();
    let mut copy = mesh.duplicate();
    let c: Vec<Handle> = v
        .iter()
        .map(|&h| copy.find_by_id(ElementType::Vertex, id_of(&mesh, h)).unwrap())
        .collect();
    let (t, inserted) = copy.insert_element(ElementType::Triangle, [c[0], c[3], c[2]]);
    assert!(inserted);
    assert_eq!(copy.statistics()[&ElementType::Line], 6);
    assert_eq!(copy.coboundary(c[3], ElementType::Triangle).len(), 2);
    assert!(copy.coboundary(c[3], ElementType::Triangle).contains(&t));
    assert_eq!(mesh.statistics()[&ElementType::Line], 5);
}

#[test]
fn labels_survive_duplicate() {
    let (mut mesh, v, [a, b]) = square();
    mesh.set_label(a, "material", 1).unwrap();
    mesh.set_label(b, "material", 2).unwrap();
    mesh.set_label(v[0], "corner", 1).unwrap();

    let copy = mesh.duplicate();
    let b_copy = copy.find_by_id(ElementType::Triangle, id_of(&mesh, b)).unwrap();
    assert_eq!(copy.get_label(b_copy, "material"), Some(2));
    let v0_copy = copy.find_by_id(ElementType::Vertex, id_of(&mesh, v[0])).unwrap();
    assert_eq!(copy.labelled("corner", 1), vec![v0_copy]);

    mesh.set_label(b, "material", 3).unwrap();
    assert_eq!(copy.get_label(b_copy, "material"), Some(2));
    assert!(mesh.labelled("material", 2).is_empty());
    assert_eq!(mesh.labelled("material", 3), vec![b]);
}

#[test]
fn labels_are_keyed_per_type() {
    let (mut mesh, v, [a, _]) = square();
    // Vertex 1 and triangle 1 share an id value but not a label.
    assert_eq!(id_of(&mesh, v[0]), id_of(&mesh, a));
    mesh.set_label(v[0], "tag", 3).unwrap();
    assert_eq!(mesh.get_label(a, "tag"), None);
    assert_eq!(mesh.set_label(v[0], "tag", 4), Ok(Some(3)));
    assert_eq!(
        mesh.labels().stratum("tag", 4),
        vec![(ElementType::Vertex, id_of(&mesh, v[0]))]
    );
    assert_eq!(mesh.labelled("tag", 4), vec![v[0]]);
}

#[test]
fn stale_handles_cannot_be_labelled() {
    let (mut mesh, v, [a, _]) = square();
    mesh.set_label(a, "material", 1).unwrap();
    mesh.erase(v[0]);
    assert_eq!(mesh.set_label(a, "material", 9), Err(MeshStoreError::StaleHandle(a)));
    assert!(mesh.labelled("material", 1).is_empty());
}
