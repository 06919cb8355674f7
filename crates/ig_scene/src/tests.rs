use crate::*;
use ig_event_system::ReceiverId;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn text(id: SymbolId, surface: SurfaceId) -> Rc<Symbol> {
    Symbol::new(
        id,
        surface,
        SymbolKind::Text(TextSymbol {
            text: "ALT".into(),
            alignment: 4,
            vertical: false,
            font_id: 1,
            font_size: 0.04,
        }),
    )
}

fn circle(id: SymbolId, surface: SurfaceId) -> Rc<Symbol> {
    Symbol::new(
        id,
        surface,
        SymbolKind::Circle(CircleSymbol {
            drawing: DrawingMode::Line,
            stipple_pattern: 0xFFFF,
            line_width: 1.0,
            stipple_length: 0.0,
            stipple_factor: 1.0,
            circles: vec![Circle {
                radius: 0.2,
                end_angle: 360.0,
                ..Default::default()
            }],
        }),
    )
}

fn count_removed<T: Contained>(container: &ObjectContainer<T>) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let sink = count.clone();
    container
        .removed
        .connect(ReceiverId::new(), move |_| sink.set(sink.get() + 1));
    count
}

#[test]
fn destroying_an_entity_cascades_through_the_graph() {
    let entities = EntityContainer::new();
    let top = Entity::new(1, 10);
    let first_child = Entity::new(2, 11);
    let second_child = Entity::new(3, 11);
    entities.add(top.clone());
    first_child.attach_to(&top).unwrap();
    second_child.attach_to(&top).unwrap();

    let surface = SymbolSurface::new(7, SurfaceHost::Entity(1));
    top.surfaces().add(surface.clone());

    let parent_symbol = text(1, 7);
    let sibling_symbol = circle(2, 7);
    let grandchild_symbol = text(3, 7);
    surface.symbols().add(parent_symbol.clone());
    surface.symbols().add(sibling_symbol.clone());
    surface.symbols().add(grandchild_symbol.clone());
    grandchild_symbol
        .set_parent(true, 1, Some(&parent_symbol))
        .unwrap();

    let removed_entities = count_removed(&entities);
    let removed_symbols = count_removed(surface.symbols());

    top.set_state(EntityState::Remove);

    assert_eq!(first_child.state(), EntityState::Remove);
    assert_eq!(second_child.state(), EntityState::Remove);
    assert_eq!(surface.state(), SurfaceState::Destroyed);
    assert!(parent_symbol.is_destroyed());
    assert!(sibling_symbol.is_destroyed());
    assert!(grandchild_symbol.is_destroyed());

    assert!(entities.is_empty());
    assert!(top.children().is_empty());
    assert!(top.surfaces().is_empty());
    assert!(surface.symbols().is_empty());
    assert_eq!(removed_entities.get(), 1);
    assert_eq!(removed_symbols.get(), 3);
}

#[test]
fn destroying_a_view_destroys_its_surfaces() {
    let views = ViewContainer::new();
    let view = View::new(0, 0);
    views.add(view.clone());
    let surface = SymbolSurface::new(1, SurfaceHost::View(0));
    view.surfaces().add(surface.clone());
    let symbol = text(4, 1);
    surface.symbols().add(symbol.clone());

    views.flag_all_as_destroyed();

    assert!(views.is_empty());
    assert_eq!(view.state(), ViewState::Destroyed);
    assert_eq!(surface.state(), SurfaceState::Destroyed);
    assert!(symbol.is_destroyed());
}

#[test]
fn cycle_rejection_leaves_both_symbols_unchanged() {
    let root = text(1, 1);
    let child = text(2, 1);
    let grandchild = text(3, 1);
    child.set_parent(true, 1, Some(&root)).unwrap();
    grandchild.set_parent(true, 2, Some(&child)).unwrap();

    let result = root.set_parent(true, 3, Some(&grandchild));
    assert_eq!(
        result,
        Err(SceneError::ParentCycle {
            child: 1,
            parent_id: 3
        })
    );
    assert!(!root.is_child());
    assert_eq!(root.parent_id(), NO_PARENT);
    assert!(root.parent().is_none());
    assert_eq!(grandchild.parent_id(), 2);
    assert!(grandchild
        .parent()
        .is_some_and(|parent| Rc::ptr_eq(&parent, &child)));

    let self_parent = root.set_parent(true, 1, Some(&root));
    assert!(matches!(self_parent, Err(SceneError::ParentCycle { .. })));
}

#[test]
fn destroying_twice_notifies_once() {
    let symbols = SymbolContainer::new();
    let symbol = text(9, 1);
    symbols.add(symbol.clone());

    let state_changes = Rc::new(Cell::new(0));
    let sink = state_changes.clone();
    symbol
        .state_changed
        .connect(ReceiverId::new(), move |_| sink.set(sink.get() + 1));
    let removed = count_removed(&symbols);

    symbol.set_state(SymbolState::Destroyed);
    symbol.set_state(SymbolState::Destroyed);
    symbol.set_state(SymbolState::Visible);

    assert_eq!(state_changes.get(), 1);
    assert_eq!(removed.get(), 1);
    assert_eq!(symbol.state(), SymbolState::Destroyed);
}

#[test]
fn tolerant_operations_are_silent() {
    let symbols = SymbolContainer::new();
    let added = Rc::new(Cell::new(0));
    let sink = added.clone();
    symbols
        .added
        .connect(ReceiverId::new(), move |_| sink.set(sink.get() + 1));
    let removed = count_removed(&symbols);

    symbols.add(None::<Rc<Symbol>>);
    let stranger = text(5, 1);
    symbols.remove(&stranger);

    let symbol = text(6, 1);
    symbols.add(symbol.clone());
    symbols.add(symbol.clone());
    symbol.set_state(SymbolState::Hidden);

    let destroyed = text(7, 1);
    destroyed.set_state(SymbolState::Destroyed);
    symbols.add(destroyed);

    assert_eq!(added.get(), 1);
    assert_eq!(removed.get(), 0);
    assert_eq!(symbols.ids(), vec![6]);
}

#[test]
fn id_collision_replaces_without_destroying() {
    let symbols = SymbolContainer::new();
    let first = text(1, 1);
    let second = circle(1, 1);
    let removed = count_removed(&symbols);

    symbols.add(first.clone());
    symbols.add(second.clone());

    assert_eq!(removed.get(), 1);
    assert!(symbols.get(1).is_some_and(|stored| Rc::ptr_eq(&stored, &second)));
    assert!(!first.is_destroyed());

    // The replaced object no longer drives the container.
    first.set_state(SymbolState::Destroyed);
    assert!(symbols.contains(1));
    assert_eq!(first.state_changed.slot_count(), 0);
}

#[test]
fn removal_observers_may_mutate_the_container() {
    let symbols = SymbolContainer::new();
    for id in 1..=4 {
        symbols.add(text(id, 1));
    }

    // Destroying one symbol destroys the next one from inside the
    // notification.
    let container = Rc::downgrade(&symbols);
    let order = Rc::new(RefCell::new(Vec::new()));
    let log = order.clone();
    symbols.removed.connect(ReceiverId::new(), move |symbol: &Rc<Symbol>| {
        log.borrow_mut().push(symbol.id());
        if let Some(next) = container.upgrade().and_then(|c| c.get(symbol.id() + 1)) {
            next.set_state(SymbolState::Destroyed);
        }
    });

    if let Some(first) = symbols.get(1) {
        first.set_state(SymbolState::Destroyed);
    }

    assert!(symbols.is_empty());
    assert_eq!(*order.borrow(), vec![1, 2, 3, 4]);
}

#[test]
fn child_entities_leave_their_parent_when_destroyed() {
    let parent = Entity::new(1, 0);
    let child = Entity::new(2, 0);
    child.attach_to(&parent).unwrap();

    child.set_state(EntityState::Remove);

    assert!(parent.children().is_empty());
    assert_eq!(parent.state(), EntityState::Standby);
    assert_eq!(child.parent_id(), NO_PARENT);
}
