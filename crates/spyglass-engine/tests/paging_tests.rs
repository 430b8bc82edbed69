//! Paged views over large member caches and collections

mod common;

use std::sync::Arc;

use spyglass_engine::{
    CollectionSource, InspectorConfig, InspectorSession, PagedVirtualDataSource, TargetHandle,
    ValueKind,
};
use spyglass_sdk::{FieldDef, NativeObject, ObjectRef, TypeDef, TypeId, TypeRegistry, Value};

use common::{game_registry, index_of, open, player};

const WIDE_FIELDS: usize = 1000;
const PAGE: usize = 50;

fn wide_session() -> (InspectorSession, Arc<NativeObject>) {
    let mut registry = TypeRegistry::new();
    let def = (0..WIDE_FIELDS).fold(TypeDef::class("Wide"), |def, i| {
        def.with_field(FieldDef::new(format!("f{:04}", i), TypeId::INT).with_default(i as i64))
    });
    let ty = registry.register(def);
    let registry = Arc::new(registry);
    let object = Arc::new(NativeObject::instantiate(&registry, ty));
    let config = InspectorConfig {
        page_size: PAGE,
        ..InspectorConfig::default()
    };
    (open(&registry, &object, config), object)
}

// ============================================================================
// Member pages
// ============================================================================

mod members {
    use super::*;

    #[test]
    fn test_tick_evaluates_only_the_visible_page() {
        let (mut session, _object) = wide_session();
        assert_eq!(session.item_count(), WIDE_FIELDS);
        assert_eq!(session.page_count(), WIDE_FIELDS / PAGE);

        assert_eq!(session.tick(), PAGE);
        let evaluated = session
            .descriptors()
            .iter()
            .filter(|d| !d.state().is_not_evaluated())
            .count();
        assert_eq!(evaluated, PAGE);

        // Already evaluated members are not read again without auto-update
        assert_eq!(session.tick(), 0);
    }

    #[test]
    fn test_paging_moves_the_window() {
        let (mut session, _object) = wide_session();

        session.set_page(3);
        assert_eq!(session.window().start, 3 * PAGE);
        let first = session.visible()[0];
        assert_eq!(session.descriptors()[first].signature(), "Wide.f0150");

        session.previous_page();
        assert_eq!(session.current_page(), 2);

        session.set_page(session.page_count() - 1);
        let event = session.next_page();
        assert_eq!(session.current_page(), 0);
        assert_eq!(event.window.start, 0);
    }

    #[test]
    fn test_slot_entries_follow_the_window() {
        let (mut session, _object) = wide_session();
        session.set_page(1);

        let entry = session.slot_entry(0).unwrap();
        assert_eq!(entry.label(), "Wide.f0050");
        assert_eq!(entry.evaluate(), ValueKind::Number);
        assert_eq!(entry.state().value(), Some(&Value::Int(50)));

        assert!(session.slot_entry(PAGE).is_none());
    }

    #[test]
    fn test_shrinking_filter_resets_page_and_notifies() {
        let (mut session, _object) = wide_session();
        let events = session.subscribe();

        session.set_page(10);
        let event = session.set_name_filter("f000");
        assert_eq!(session.item_count(), 10);
        assert_eq!(session.current_page(), 0);
        assert!(event.reset);
        assert_eq!(session.visible().len(), 10);

        let received: Vec<_> = events.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert_eq!(received[1], event);
    }

    #[test]
    fn test_dropped_subscriber_is_forgotten() {
        let (mut session, _object) = wide_session();
        let kept = session.subscribe();
        drop(session.subscribe());

        session.next_page();
        session.next_page();
        assert_eq!(kept.try_iter().count(), 2);
    }

    #[test]
    fn test_auto_update_rereads_visible_members() {
        let (mut session, object) = wide_session();
        session.tick();

        object.set("f0001", Value::Int(-1));
        let f1 = index_of(&session, "Wide.f0001");
        assert_eq!(
            session.descriptors()[f1].state().value(),
            Some(&Value::Int(1))
        );

        session.set_auto_update(true);
        assert_eq!(session.tick(), PAGE);
        assert_eq!(
            session.descriptors()[f1].state().value(),
            Some(&Value::Int(-1))
        );
    }
}

// ============================================================================
// Collection pages
// ============================================================================

mod collections {
    use super::*;

    const ITEMS: i64 = 100_000;
    const SLOTS: usize = 50;

    fn big_list() -> Value {
        Value::list((0..ITEMS).map(Value::Int).collect())
    }

    #[test]
    fn test_large_list_keeps_live_entries_bounded() {
        let registry = Arc::new(TypeRegistry::new());
        let list = big_list();
        let source = CollectionSource::from_value(Arc::clone(&registry), &list).unwrap();
        let mut data: PagedVirtualDataSource<CollectionSource> =
            PagedVirtualDataSource::new(source, SLOTS);

        assert_eq!(data.item_count(), ITEMS as usize);
        assert_eq!(data.page_count(), ITEMS as usize / SLOTS);

        for _ in 0..25 {
            data.next_page();
        }
        data.set_page(data.page_count() - 1);
        data.set_page(1234);

        assert!(data.peak_live() <= SLOTS);
        assert_eq!(data.live_count(), SLOTS);

        let entry = data.slot_entry(7).unwrap();
        assert_eq!(entry.label(), "[61707]");
        assert_eq!(entry.evaluate(), ValueKind::Number);
        assert_eq!(entry.state().value(), Some(&Value::Int(61_707)));
    }

    #[test]
    fn test_view_resources_are_pooled() {
        let registry = Arc::new(TypeRegistry::new());
        let list = big_list();
        let source = CollectionSource::from_value(Arc::clone(&registry), &list).unwrap();
        let mut data: PagedVirtualDataSource<CollectionSource, String> =
            PagedVirtualDataSource::new(source, SLOTS);

        for page in 0..10 {
            data.set_page(page);
            for slot in 0..SLOTS {
                data.attach(slot, || format!("row {}", slot));
            }
        }
        assert_eq!(data.pool().created(), SLOTS);
    }

    #[test]
    fn test_collection_view_from_session() {
        let (registry, types) = game_registry();
        let object = player(&registry, &types);
        let mut session = open(&registry, &object, InspectorConfig::default());

        let inventory = index_of(&session, "Player.inventory");
        assert_eq!(session.evaluate(inventory), Some(ValueKind::Collection));

        let mut view = session.collection_view(inventory).unwrap();
        assert_eq!(view.item_count(), 2);
        let entry = view.slot_entry(1).unwrap();
        entry.evaluate();
        assert_eq!(entry.state().value(), Some(&Value::str("shield")));

        // Editing through the view writes into the live list
        entry.set_value(Value::str("axe")).unwrap();
        let list = object.get("inventory").unwrap();
        let Value::List(items) = list else {
            panic!("inventory is not a list");
        };
        assert_eq!(items.read()[1], Value::str("axe"));
    }

    #[test]
    fn test_collection_view_rejects_scalars() {
        let (registry, types) = game_registry();
        let object = player(&registry, &types);
        let mut session = open(&registry, &object, InspectorConfig::default());

        let health = index_of(&session, "Player.health");
        assert!(session.collection_view(health).is_err());
        session.evaluate(health);
        assert!(session.collection_view(health).is_err());
    }

    #[test]
    fn test_dictionary_pages_pair_keys_with_values() {
        let registry = Arc::new(TypeRegistry::new());
        let dict = Value::dict(
            (0..120)
                .map(|i| (Value::str(&format!("k{}", i)), Value::Int(i)))
                .collect(),
        );
        let source = CollectionSource::from_value(Arc::clone(&registry), &dict).unwrap();
        let mut data: PagedVirtualDataSource<CollectionSource> =
            PagedVirtualDataSource::new(source, SLOTS);
        assert!(data.source().is_dictionary());

        data.set_page(2);
        assert_eq!(data.window().count, 20);
        assert_eq!(data.slot_index(0), Some(100));
        assert!(data.slot_entry(20).is_none());
    }

    #[test]
    fn test_nested_session_over_a_struct_target() {
        let (registry, types) = game_registry();
        let value = Value::Struct(
            spyglass_sdk::StructValue::new(types.vector3)
                .with("x", 0.0)
                .with("y", 0.0)
                .with("z", 0.0),
        );
        let target = TargetHandle::instance(&registry, &value).unwrap();
        let session =
            InspectorSession::open(Arc::clone(&registry), target, InspectorConfig::default())
                .unwrap();
        assert_eq!(session.page_count(), 1);
        assert!(matches!(
            session.target().object(),
            Some(ObjectRef::Native(_))
        ));
    }
}
