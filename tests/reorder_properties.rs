use proptest::prelude::*;
use sortkit_core::{
    allocator, DropOutcome, ItemId, MemoryStore, OrderingConfig, PositionedItem,
    ReorderController, ScopeId, Timestamp,
};
use std::time::Duration;

fn scope() -> ScopeId {
    ScopeId::course("course-1")
}

fn abc_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert_list(
        scope(),
        vec![
            PositionedItem::new("A", 1000.0),
            PositionedItem::new("B", 2000.0),
            PositionedItem::new("C", 3000.0),
        ],
    );
    store
}

fn open(store: &mut MemoryStore, now: Timestamp) -> ReorderController {
    ReorderController::open(store, scope(), OrderingConfig::default(), now).unwrap()
}

fn order(controller: &ReorderController) -> Vec<String> {
    controller
        .sorted_view()
        .iter()
        .map(|item| item.id.to_string())
        .collect()
}

fn position(controller: &ReorderController, id: &str) -> f64 {
    controller
        .sorted_view()
        .iter()
        .find(|item| item.id == ItemId::from(id))
        .map(|item| item.position)
        .unwrap()
}

#[test]
fn start_insertion_halves_first_key() {
    let now = Timestamp::from_millis(0);
    let mut store = abc_store();
    let mut controller = open(&mut store, now);

    controller.on_reorder(&mut store, &"C".into(), 0, now).unwrap();

    assert_eq!(position(&controller, "C"), 500.0);
    assert_eq!(order(&controller), vec!["C", "A", "B"]);
}

#[test]
fn end_insertion_adds_gap() {
    let now = Timestamp::from_millis(0);
    let mut store = abc_store();
    let mut controller = open(&mut store, now);

    controller.on_reorder(&mut store, &"A".into(), 2, now).unwrap();

    assert_eq!(position(&controller, "A"), 4000.0);
    assert_eq!(order(&controller), vec!["B", "C", "A"]);
}

#[test]
fn midpoint_insertion() {
    // B between A(1000) and C(3000) keeps its key
    let key = allocator::allocate(&[1000.0, 3000.0], 1, 1000.0).unwrap();
    assert_eq!(key, 2000.0);

    // A new item D between A(1000) and B(2000)
    let now = Timestamp::from_millis(0);
    let mut store = abc_store();
    let controller = open(&mut store, now);
    assert_eq!(controller.insert_position(1).unwrap(), 1500.0);
}

#[test]
fn dropping_in_place_has_no_side_effects() {
    let now = Timestamp::from_millis(0);
    let mut store = abc_store();
    let mut controller = open(&mut store, now);

    for (id, index) in [("A", 0), ("B", 1), ("C", 2)] {
        let outcome = controller.on_reorder(&mut store, &id.into(), index, now).unwrap();
        assert_eq!(outcome, DropOutcome::NoOp);
    }

    assert!(store.issued().is_empty());
    assert_eq!(controller.pending_count(), 0);
    assert_eq!(controller.session().pending_update, None);
    assert_eq!(controller.list().positions(), vec![1000.0, 2000.0, 3000.0]);
}

#[test]
fn lock_blocks_only_the_moved_item() {
    let now = Timestamp::from_millis(0);
    let mut store = abc_store();
    let mut controller = open(&mut store, now);

    controller.on_reorder(&mut store, &"C".into(), 0, now).unwrap();
    assert!(controller.is_locked(&"C".into()));

    // X = C is refused, Y = A is accepted while C's write is in flight
    assert!(controller.drag_start(&"C".into()).is_err());
    controller.drag_start(&"A".into()).unwrap();
    let outcome = controller
        .drag_end(
            &mut store,
            Some(sortkit_core::DropTarget::Index(2)),
            now,
        )
        .unwrap();
    assert!(matches!(outcome, DropOutcome::Committed(_)));

    assert_eq!(order(&controller), vec!["C", "B", "A"]);
    assert_eq!(controller.pending_count(), 2);
}

#[test]
fn failed_write_reverts_to_snapshot() {
    let now = Timestamp::from_millis(0);
    let mut store = abc_store();
    let mut controller = open(&mut store, now);

    let DropOutcome::Committed(update) =
        controller.on_reorder(&mut store, &"B".into(), 0, now).unwrap()
    else {
        panic!("expected commit");
    };

    // Someone else renamed A meanwhile; the refresh must carry that too
    store.list_mut(&scope())[0].data = serde_json::json!({"title": "Renamed"});

    controller.on_update_settled(
        &mut store,
        update.request_id,
        Err("validation failed".to_string()),
        now + Duration::from_millis(300),
    );

    assert_eq!(order(&controller), vec!["A", "B", "C"]);
    assert_eq!(controller.sorted_view()[0].data["title"], "Renamed");
    assert!(!controller.is_locked(&"B".into()));
    assert_eq!(controller.take_notifications().len(), 1);
}

#[test]
fn failed_write_reverts_without_a_refresh() {
    let now = Timestamp::from_millis(0);
    let mut store = abc_store();
    let mut controller = open(&mut store, now);

    let DropOutcome::Committed(update) =
        controller.on_reorder(&mut store, &"C".into(), 0, now).unwrap()
    else {
        panic!("expected commit");
    };

    // Backend down: both the write and the follow-up refresh fail
    store.set_fail_fetch(true);
    controller.on_update_settled(&mut store, update.request_id, Err("timeout".to_string()), now);

    assert_eq!(order(&controller), vec!["A", "B", "C"]);
    assert_eq!(position(&controller, "C"), 3000.0);
    assert!(!controller.is_locked(&"C".into()));
    assert_eq!(controller.pending_count(), 0);
    assert_eq!(controller.take_notifications().len(), 2);

    store.set_fail_fetch(false);
    controller.tick(&mut store, now + Duration::from_secs(3600));
    assert_eq!(order(&controller), vec!["A", "B", "C"]);
}

#[test]
fn confirmed_write_survives_stale_refresh() {
    let now = Timestamp::from_millis(0);
    let mut store = abc_store();
    let mut controller = open(&mut store, now);

    let DropOutcome::Committed(update) =
        controller.on_reorder(&mut store, &"C".into(), 0, now).unwrap()
    else {
        panic!("expected commit");
    };
    controller.on_update_settled(&mut store, update.request_id, Ok(()), now);

    // Backend has not converged yet: a refresh inside the grace period
    // must not snap C back to the end
    controller.reconcile(&mut store, now + Duration::from_millis(500));
    assert_eq!(order(&controller), vec!["C", "A", "B"]);

    // Once the grace period passes the store is authoritative again
    store.apply(&update);
    assert!(controller.tick(&mut store, now + Duration::from_secs(2)));
    assert_eq!(order(&controller), vec!["C", "A", "B"]);
    assert!(!controller.is_locked(&"C".into()));
}

#[test]
fn completions_may_arrive_out_of_order() {
    let now = Timestamp::from_millis(0);
    let mut store = abc_store();
    let mut controller = open(&mut store, now);

    let DropOutcome::Committed(first) =
        controller.on_reorder(&mut store, &"A".into(), 2, now).unwrap()
    else {
        panic!("expected commit");
    };
    let DropOutcome::Committed(second) =
        controller.on_reorder(&mut store, &"B".into(), 1, now).unwrap()
    else {
        panic!("expected commit");
    };

    store.apply(&second);
    store.apply(&first);
    controller.on_update_settled(&mut store, second.request_id, Ok(()), now);
    controller.on_update_settled(&mut store, first.request_id, Ok(()), now);

    let before = order(&controller);
    controller.tick(&mut store, now + Duration::from_secs(5));
    assert_eq!(order(&controller), before);
    assert_eq!(controller.pending_count(), 0);
}

proptest! {
    #[test]
    fn requested_index_is_observed_index(
        count in 2usize..12,
        moves in prop::collection::vec((0usize..64, 0usize..64), 1..40),
    ) {
        let mut store = MemoryStore::new();
        store.insert_list(
            scope(),
            (0..count)
                .map(|i| PositionedItem::new(i as i64, (i as f64 + 1.0) * 1000.0))
                .collect(),
        );
        let mut now = Timestamp::from_millis(0);
        let mut controller = open(&mut store, now);

        for (pick, target) in moves {
            let view = controller.sorted_view().to_vec();
            let id = view[pick % count].id.clone();
            let new_index = target % count;

            // Settle earlier writes so every item is draggable again
            now = now + Duration::from_secs(10);
            let updates: Vec<_> = store.issued().to_vec();
            for update in &updates {
                store.apply(update);
                controller.on_update_settled(&mut store, update.request_id, Ok(()), now);
            }
            now = now + Duration::from_secs(10);
            controller.tick(&mut store, now);

            let mut expected: Vec<ItemId> =
                controller.sorted_view().iter().map(|item| item.id.clone()).collect();
            let old_index = expected.iter().position(|other| other == &id).unwrap();
            let moved = expected.remove(old_index);
            expected.insert(new_index, moved);

            controller.on_reorder(&mut store, &id, new_index, now).unwrap();

            let observed: Vec<ItemId> =
                controller.sorted_view().iter().map(|item| item.id.clone()).collect();
            prop_assert_eq!(observed, expected);
            prop_assert_eq!(controller.index_of(&id), Some(new_index));
        }
    }

    #[test]
    fn allocated_key_sits_between_neighbours(
        mut keys in prop::collection::vec(1.0f64..1.0e6, 1..20),
        slot in 0usize..21,
    ) {
        keys.sort_by(|a, b| a.total_cmp(b));
        keys.dedup();
        let index = slot % (keys.len() + 1);

        let key = allocator::allocate(&keys, index, 1000.0).unwrap();
        let before = index.checked_sub(1).map(|i| keys[i]);
        let after = keys.get(index).copied();
        prop_assert!(!allocator::is_degenerate(key, before, after));
    }
}
