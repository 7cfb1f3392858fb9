//! Properties of the model tree: list uniqueness, inheritance merging,
//! ordering and metadata sealing.

use mm_model::{
    AttributeType, AttributeValue, ModelAttribute, ModelMetaData, ModelTree, ModelType,
    ORDER_ATTRIBUTE,
};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

fn ids(tree: &ModelTree, keys: &[mm_model::ModelKey]) -> Vec<String> {
    keys.iter()
        .map(|k| tree.get(*k).unwrap().id().to_string())
        .collect()
}

#[test]
fn sealed_metadata_write_is_observable_and_harmless() {
    let mut meta = ModelMetaData::new("label", AttributeType::Label);
    meta.set_default_value(json!({"en": "Title"})).unwrap();
    meta.set_mandatory(true).unwrap();
    meta.seal();

    let before = meta.clone();
    assert!(meta.set_default_value(json!({"en": "Other"})).unwrap_err().is_immutable());
    assert!(meta.set_mandatory(false).unwrap_err().is_immutable());
    assert_eq!(meta, before);
}

proptest! {
    #[test]
    fn prop_effective_fields_are_unique_and_complete(
        base in prop::collection::hash_set("[a-e]", 0..5),
        local in prop::collection::hash_set("[a-h]", 0..5),
    ) {
        let mut tree = ModelTree::new();
        let parent = tree.create(ModelType::Definition, "parent");
        let child = tree.create(ModelType::Definition, "child");
        tree.set_super(child, parent).unwrap();
        for id in &base {
            tree.create_child(parent, ModelType::Field, id.as_str()).unwrap();
        }
        for id in &local {
            tree.create_child(child, ModelType::Field, id.as_str()).unwrap();
        }

        let effective = tree.effective_fields(child);
        let effective_ids: Vec<String> = ids(&tree, &effective);
        let unique: HashSet<&String> = effective_ids.iter().collect();
        prop_assert_eq!(unique.len(), effective_ids.len());

        let expected: HashSet<&String> = base.iter().chain(local.iter()).collect();
        prop_assert_eq!(unique, expected);

        // every local id resolves to the local node
        for key in &effective {
            let id = tree.get(*key).unwrap().id();
            prop_assert_eq!(!tree.is_inherited(*key, child), local.contains(id));
        }
    }

    #[test]
    fn prop_sort_models_orders_ascending_with_missing_last(
        orders in prop::collection::vec(prop::option::of(-50i64..50), 1..8),
    ) {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "def");
        let mut keys = Vec::new();
        for (i, order) in orders.iter().enumerate() {
            let key = tree.create_child(def, ModelType::Field, format!("f{i}")).unwrap();
            if let Some(order) = order {
                tree.node_mut(key).unwrap().base.attributes.insert(
                    ModelAttribute::new(
                        ORDER_ATTRIBUTE,
                        AttributeType::Integer,
                        Some(AttributeValue::Integer(*order)),
                    )
                    .unwrap(),
                );
            }
            keys.push(key);
        }

        tree.sort_models(&mut keys, def);
        let sorted: Vec<f64> = keys
            .iter()
            .map(|k| tree.get(*k).unwrap().order().unwrap_or(f64::INFINITY))
            .collect();
        prop_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_duplicate_insert_leaves_list_unchanged(
        names in prop::collection::vec("[a-d]", 1..10),
    ) {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "def");
        let mut seen = Vec::new();
        for name in names {
            let result = tree.create_child(def, ModelType::Field, name.as_str());
            if seen.contains(&name) {
                prop_assert!(result.unwrap_err().is_duplicate());
            } else {
                prop_assert!(result.is_ok());
                seen.push(name);
            }
            let listed = ids(&tree, &tree.children(def, ModelType::Field));
            prop_assert_eq!(&listed, &seen);
        }
    }
}
