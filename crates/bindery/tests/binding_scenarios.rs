//! End-to-end binding scenarios across values, lists and maps.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bindery::prelude::*;
use bindery::{Element, ListStorage, Outcome};

#[test]
fn strong_binding_then_unbind() {
    let x = Bindable::new(0);
    let y = Bindable::new(0);
    y.bind_to(&x).unwrap();

    x.set(400).unwrap();
    assert_eq!(y.get(), 400);

    y.unbind();
    x.set(200).unwrap();
    assert_eq!(y.get(), 400);
    assert_eq!(x.peer_count(), 0);
}

#[test]
fn weak_binding_flows_from_source_only() {
    let x = Bindable::new(0);
    let y = Bindable::new(0);
    y.weak_bind(&x).unwrap();

    x.set(400).unwrap();
    assert_eq!(y.get(), 400);

    y.set(200).unwrap();
    assert_eq!(x.get(), 400);
}

#[test]
fn weak_dependent_does_not_keep_source_alive() {
    let dependent = Bindable::new(0);
    {
        let source = Bindable::new(5);
        dependent.weak_bind(&source).unwrap();
        assert_eq!(dependent.get(), 5);
    }
    assert_eq!(dependent.peer_ids().len(), 1);
    assert_eq!(dependent.peer_count(), 0);
    assert_eq!(dependent.prune_peers(), 1);
    dependent.set(1).unwrap();
}

#[test]
fn chained_binds_form_one_component() {
    let a = Bindable::new(1);
    let b = Bindable::new(2);
    let c = Bindable::new(3);
    b.bind_to(&a).unwrap();
    c.bind_to(&b).unwrap();
    assert_eq!((a.get(), b.get(), c.get()), (1, 1, 1));

    c.set(9).unwrap();
    assert_eq!((a.get(), b.get(), c.get()), (9, 9, 9));

    b.unbind();
    a.set(4).unwrap();
    assert_eq!((a.get(), b.get(), c.get()), (4, 9, 9));
}

#[test]
fn ring_applies_each_mutation_once_per_node() {
    let a = BindableList::<u32>::new();
    let b = BindableList::new();
    let c = BindableList::new();
    a.bind_to(&b).unwrap();
    b.bind_to(&c).unwrap();
    c.bind_to(&a).unwrap();

    let applied = Cell::new(0);
    b.node()
        .mutate(|s: &mut ListStorage<u32>| {
            applied.set(applied.get() + 1);
            s.0.push(1);
            Ok(Outcome::Changed(
                (),
                CollectionEvent::added(vec![Element::new(1, s.0.len() - 1)]),
            ))
        })
        .unwrap();
    assert_eq!(applied.get(), 3);
    assert_eq!(a.to_vec(), vec![1]);
    assert_eq!(c.to_vec(), vec![1]);
}

#[test]
fn late_subscriber_replays_current_contents() {
    let list = BindableList::from(vec!["a", "b"]);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    list.on_change_immediate(move |e: &CollectionEvent<&str>| sink.borrow_mut().push(e.clone()));
    list.push("c").unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].kind, ChangeKind::Add);
    assert_eq!(
        seen[0].added,
        vec![Element::new("a", 0), Element::new("b", 1)]
    );
    assert_eq!(seen[1].added, vec![Element::new("c", 2)]);
}

#[test]
fn disabled_component_rejects_mutation_everywhere() {
    let a = BindableList::from(vec![1, 2]);
    let b = a.bound_copy();
    b.set_disabled(true);
    assert!(a.is_disabled());

    for attempt in [a.push(3), b.push(3), a.clear()] {
        assert!(matches!(attempt, Err(BindError::MutationWhileDisabled { .. })));
    }
    assert_eq!(a.to_vec(), vec![1, 2]);
    assert_eq!(b.to_vec(), vec![1, 2]);

    a.set_disabled(false);
    b.push(3).unwrap();
    assert_eq!(a.to_vec(), vec![1, 2, 3]);
}

#[test]
fn lease_round_trips() {
    let value = Bindable::new(String::from("v0"));
    let mirror = value.bound_copy();

    let token = value.begin_lease(true).unwrap();
    value.set(String::from("v1")).unwrap();
    assert_eq!(mirror.get(), "v1");
    value.end_lease(token).unwrap();
    assert_eq!(value.get(), "v0");
    assert_eq!(mirror.get(), "v0");

    let token = value.begin_lease(false).unwrap();
    value.set(String::from("v1")).unwrap();
    value.end_lease(token).unwrap();
    assert_eq!(value.get(), "v1");
    assert_eq!(value.lease_state(), LeaseState::None);
}

#[test]
fn lease_on_list_reverts_collection() {
    let list = BindableList::from(vec![1, 2, 3]);
    let token = list.begin_lease(true).unwrap();
    list.clear().unwrap();
    list.push(9).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    list.on_change(move |e: &CollectionEvent<i32>| sink.borrow_mut().push(e.kind));
    list.end_lease(token).unwrap();

    assert_eq!(list.to_vec(), vec![1, 2, 3]);
    assert_eq!(*events.borrow(), vec![ChangeKind::Replace]);
}

#[test]
fn copy_to_overwrites_without_linking() {
    let source = BindableMap::new();
    source.put("k", 1).unwrap();
    let target = BindableMap::new();
    target.put("other", 2).unwrap();

    source.copy_to(&target).unwrap();
    assert_eq!(target.entries(), vec![("k", 1)]);

    source.put("k", 5).unwrap();
    assert_eq!(target.get(&"k"), Some(1));
}

#[test]
fn copy_is_unbound() {
    let a = Bindable::new(1);
    let b = a.copy();
    a.set(2).unwrap();
    assert_eq!(b.get(), 1);
    assert!(!a.is_bound_to(&b));
}

#[test]
fn rebinding_and_missing_edges_are_errors() {
    let a = Bindable::new(0);
    let b = Bindable::new(0);
    b.bind_to(&a).unwrap();
    assert_eq!(
        b.bind_to(&a).unwrap_err(),
        BindError::AlreadyBound { node: b.id(), peer: a.id() }
    );

    let c = Bindable::new(0);
    assert_eq!(
        c.unbind_from(&a).unwrap_err(),
        BindError::NotBound { node: c.id(), peer: a.id() }
    );
    assert!(c.unbind_weak_from(&a).is_err());
}

#[test]
fn binding_handle_removes_its_edge() {
    let a = Bindable::new(0);
    let b = Bindable::new(0);
    let binding: Binding<_> = b.bind_to(&a).unwrap();
    assert!(binding.is_live());
    binding.unbind().unwrap();

    a.set(3).unwrap();
    assert_eq!(b.get(), 0);
}

#[test]
fn heterogeneous_binding_checks_kinds() {
    let count = Bindable::new(0_usize);
    let names = BindableList::from(vec![String::from("a")]);
    let other_names = BindableList::<String>::new();

    let nodes: [&dyn AnyBindable; 3] = [&count, &names, &other_names];
    assert!(matches!(
        nodes[0].bind_to_any(nodes[1]),
        Err(BindError::TypeMismatch { .. })
    ));
    nodes[2].bind_to_any(nodes[1]).unwrap();
    assert_eq!(other_names.to_vec(), vec!["a".to_string()]);
}

#[test]
fn subscriber_can_unbind_during_notification() {
    let a = Bindable::new(0);
    let b = a.bound_copy();
    let c = a.bound_copy();

    let b_handle = b.clone();
    a.on_change(move |_| b_handle.unbind());
    a.set(1).unwrap();
    assert_eq!((b.get(), c.get()), (1, 1));

    a.set(2).unwrap();
    assert_eq!((b.get(), c.get()), (1, 2));
}

#[test]
fn peer_unbound_mid_walk_is_skipped_and_later_peers_still_reached() {
    let a = Bindable::new(0);
    let b = a.bound_copy();
    let c = a.bound_copy();
    let d = a.bound_copy();

    let c_hits = Rc::new(Cell::new(0));
    let d_hits = Rc::new(Cell::new(0));
    let hits = Rc::clone(&c_hits);
    c.on_change(move |_| hits.set(hits.get() + 1));
    let hits = Rc::clone(&d_hits);
    d.on_change(move |_| hits.set(hits.get() + 1));

    let (a_handle, c_handle) = (a.clone(), c.clone());
    b.on_change(move |_| {
        let _ = c_handle.unbind_from(&a_handle);
    });

    a.set(1).unwrap();
    assert_eq!(b.get(), 1);
    assert_eq!((c.get(), c_hits.get()), (0, 0));
    assert_eq!((d.get(), d_hits.get()), (1, 1));
    assert!(!a.is_bound_to(&c));
    assert_eq!(a.peer_count(), 2);
}

#[test]
fn disabled_weak_dependent_keeps_its_value() {
    let source = Bindable::new(1);
    let dependent = source.weak_copy();
    dependent.set_disabled(true);
    assert!(!source.is_disabled());

    source.set(2).unwrap();
    assert_eq!(dependent.get(), 1);
    assert!(matches!(
        dependent.set(7),
        Err(BindError::MutationWhileDisabled { .. })
    ));

    dependent.set_disabled(false);
    source.set(3).unwrap();
    assert_eq!(dependent.get(), 3);
}

#[test]
fn options_carry_label_and_disabled() {
    let node = Bindable::with_options(1, NodeOptions::new().label("gain").disabled(true));
    assert_eq!(node.label().as_deref(), Some("gain"));
    assert!(node.set(2).is_err());
    assert!(format!("{:?}", node.node()).contains("gain"));
}
