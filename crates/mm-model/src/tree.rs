//! Arena backed model tree
//!
//! [`ModelTree`] owns every node of an editing session. Containers hold
//! [`ModelList`]s of child keys; children point back through
//! [`ModelBase::parent`](crate::ModelBase). For definitions and classes the
//! parent is the super model, which is what inheritance walks.
//!
//! Structural edits go through [`ModelTree::attach`] and
//! [`ModelTree::detach`]. A detached node stays in the arena so that it can be
//! reattached at its former [`Placement`].

use crate::attribute::{AttributeValue, ModelAttribute};
use crate::error::ModelError;
use crate::list::ModelList;
use crate::node::{ModelKey, ModelNode, ModelType};
use crate::path::ModelPath;
use indexmap::IndexMap;
use slotmap::SlotMap;
use std::collections::HashSet;

/// Position of a child inside its container
///
/// Fields additionally remember their position inside the region they are
/// shown in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    /// Index in the container's list
    pub index: usize,
    /// Index in the region's field list, if the field was listed there
    pub region_index: Option<usize>,
}

impl Placement {
    /// Append at the end of the container (and of the region, if any)
    #[inline]
    #[must_use]
    pub fn append() -> Self {
        Self {
            index: usize::MAX,
            region_index: Some(usize::MAX),
        }
    }
}

/// Arena of model nodes
#[derive(Debug, Clone, Default)]
pub struct ModelTree {
    nodes: SlotMap<ModelKey, ModelNode>,
}

impl ModelTree {
    /// Create empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node of `model_type`
    pub fn create(&mut self, model_type: ModelType, id: impl Into<String>) -> ModelKey {
        self.insert(ModelNode::new(id, model_type))
    }

    /// Add a detached node
    pub fn insert(&mut self, node: ModelNode) -> ModelKey {
        self.nodes.insert(node)
    }

    /// Create a node and attach it to `container`
    ///
    /// # Errors
    /// See [`ModelTree::attach`]; on failure the new node is dropped again
    pub fn create_child(
        &mut self,
        container: ModelKey,
        model_type: ModelType,
        id: impl Into<String>,
    ) -> Result<ModelKey, ModelError> {
        let key = self.create(model_type, id);
        if let Err(e) = self.attach(container, key) {
            self.nodes.remove(key);
            return Err(e);
        }
        Ok(key)
    }

    /// Drop a node from the arena; its key becomes stale
    pub(crate) fn discard(&mut self, key: ModelKey) -> Option<ModelNode> {
        self.nodes.remove(key)
    }

    /// Node by key
    #[inline]
    #[must_use]
    pub fn get(&self, key: ModelKey) -> Option<&ModelNode> {
        self.nodes.get(key)
    }

    /// Mutable node by key
    #[inline]
    pub fn get_mut(&mut self, key: ModelKey) -> Option<&mut ModelNode> {
        self.nodes.get_mut(key)
    }

    /// Node by key, failing on stale keys
    ///
    /// # Errors
    /// `ModelError::ModelNotFound`
    pub fn node(&self, key: ModelKey) -> Result<&ModelNode, ModelError> {
        self.nodes
            .get(key)
            .ok_or_else(|| ModelError::ModelNotFound(format!("{key:?}")))
    }

    /// Mutable node by key, failing on stale keys
    ///
    /// # Errors
    /// `ModelError::ModelNotFound`
    pub fn node_mut(&mut self, key: ModelKey) -> Result<&mut ModelNode, ModelError> {
        self.nodes
            .get_mut(key)
            .ok_or_else(|| ModelError::ModelNotFound(format!("{key:?}")))
    }

    /// Node of an expected kind
    ///
    /// # Errors
    /// `ModelError::ModelNotFound` or `ModelError::WrongModelType`
    pub fn expect(&self, key: ModelKey, expected: ModelType) -> Result<&ModelNode, ModelError> {
        let node = self.node(key)?;
        if node.model_type() != expected {
            return Err(ModelError::WrongModelType {
                id: node.id().to_string(),
                expected,
                actual: node.model_type(),
            });
        }
        Ok(node)
    }

    /// Check if the key is live
    #[inline]
    #[must_use]
    pub fn contains(&self, key: ModelKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of nodes in the arena, attached or not
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes
    pub fn iter(&self) -> impl Iterator<Item = (ModelKey, &ModelNode)> {
        self.nodes.iter()
    }

    /// Attribute of a node; `None` when the node or attribute is absent
    #[must_use]
    pub fn attribute(&self, key: ModelKey, id: &str) -> Option<&ModelAttribute> {
        self.get(key).and_then(|n| n.attribute(id))
    }

    /// Mutable attribute of a node
    pub fn attribute_mut(&mut self, key: ModelKey, id: &str) -> Option<&mut ModelAttribute> {
        self.get_mut(key).and_then(|n| n.attribute_mut(id))
    }

    /// Set an attribute value, returning the previous value
    ///
    /// Absent attributes are left alone and yield `Ok(None)`.
    ///
    /// # Errors
    /// `ModelError::TypeMismatch` if the value does not fit the attribute
    pub fn set_attribute_value(
        &mut self,
        key: ModelKey,
        id: &str,
        value: Option<AttributeValue>,
    ) -> Result<Option<AttributeValue>, ModelError> {
        match self.attribute_mut(key, id) {
            Some(attribute) => attribute.set_value(value),
            None => Ok(None),
        }
    }

    /// Set the super model of a definition or class
    ///
    /// # Errors
    /// `ModelError::CyclicHierarchy` if `parent` already inherits from `key`
    pub fn set_super(&mut self, key: ModelKey, parent: ModelKey) -> Result<(), ModelError> {
        if key == parent || self.ancestors(parent).contains(&key) {
            let id = self.node(key)?.id().to_string();
            return Err(ModelError::CyclicHierarchy(id));
        }
        self.node(parent)?;
        self.node_mut(key)?.base.parent = Some(parent);
        Ok(())
    }

    /// Super models from nearest to farthest
    ///
    /// Stops at the first repeated node, so a corrupted chain cannot loop.
    #[must_use]
    pub fn ancestors(&self, key: ModelKey) -> Vec<ModelKey> {
        let mut seen = HashSet::from([key]);
        let mut chain = Vec::new();
        let mut current = self.get(key).and_then(ModelNode::parent);
        while let Some(next) = current {
            if !seen.insert(next) {
                break;
            }
            chain.push(next);
            current = self.get(next).and_then(ModelNode::parent);
        }
        chain
    }

    /// Append `child` to the owning list of `container`
    ///
    /// Fields whose region id names a region of `container` are also listed in
    /// that region.
    ///
    /// # Errors
    /// `ModelError::UnsupportedContainment` for kinds that cannot be nested,
    /// `ModelError::DuplicateModelId` if the id is taken (nothing changes),
    /// `ModelError::AlreadyAttached` if another container lists `child`
    pub fn attach(&mut self, container: ModelKey, child: ModelKey) -> Result<Placement, ModelError> {
        self.attach_at(container, child, Placement::append())
    }

    /// Insert `child` into `container` at a former placement
    ///
    /// # Errors
    /// Same as [`ModelTree::attach`]
    pub fn attach_at(
        &mut self,
        container: ModelKey,
        child: ModelKey,
        placement: Placement,
    ) -> Result<Placement, ModelError> {
        let (id, child_type, region_id) = self.child_info(child)?;
        if let Some(owner) = self.listed_in(child).filter(|owner| *owner != container) {
            return Err(ModelError::AlreadyAttached {
                id,
                container: self.node(owner)?.id().to_string(),
            });
        }
        let region = region_id.and_then(|rid| {
            self.get(container)
                .and_then(|c| c.children(ModelType::Region))
                .and_then(|regions| regions.get(&rid))
        });

        let list = self.owned_list_mut(container, child_type)?;
        let index = placement.index.min(list.len());
        list.insert_at(index, id.clone(), child)?;

        let mut region_index = None;
        if let (Some(region), Some(at)) = (region, placement.region_index) {
            if let Some(fields) = self
                .get_mut(region)
                .and_then(|r| r.children_mut(ModelType::Field))
            {
                if !fields.contains(&id) {
                    let at = at.min(fields.len());
                    fields.insert_at(at, id.clone(), child)?;
                    region_index = Some(at);
                }
            }
        }

        self.node_mut(child)?.base.parent = Some(container);
        tracing::debug!(model = %id, kind = %child_type, index, "attached model");
        Ok(Placement {
            index,
            region_index,
        })
    }

    /// Remove `child` from the owning list of `container`
    ///
    /// The node stays in the arena with no parent. The returned placement
    /// restores it through [`ModelTree::attach_at`].
    ///
    /// # Errors
    /// `ModelError::NotAttached` if `child` is not listed in `container`
    pub fn detach(&mut self, container: ModelKey, child: ModelKey) -> Result<Placement, ModelError> {
        let (id, child_type, region_id) = self.child_info(child)?;
        let container_id = self.node(container)?.id().to_string();
        let region = region_id.and_then(|rid| {
            self.get(container)
                .and_then(|c| c.children(ModelType::Region))
                .and_then(|regions| regions.get(&rid))
        });

        let list = self.owned_list_mut(container, child_type)?;
        if list.get(&id) != Some(child) {
            return Err(ModelError::NotAttached {
                id,
                container: container_id,
            });
        }
        let index = list.remove(&id).map_or(0, |(index, _)| index);

        let region_index = region
            .and_then(|r| self.get_mut(r))
            .and_then(|r| r.children_mut(ModelType::Field))
            .and_then(|fields| match fields.get(&id) {
                Some(listed) if listed == child => fields.remove(&id).map(|(at, _)| at),
                _ => None,
            });

        self.node_mut(child)?.base.parent = None;
        tracing::debug!(model = %id, kind = %child_type, index, "detached model");
        Ok(Placement {
            index,
            region_index,
        })
    }

    /// List a definition field in a region and record the region on the field
    ///
    /// # Errors
    /// `ModelError::DuplicateModelId` if the region already lists that id
    pub fn add_field_to_region(&mut self, region: ModelKey, field: ModelKey) -> Result<(), ModelError> {
        let field_id = self.expect(field, ModelType::Field)?.id().to_string();
        let region_id = self.expect(region, ModelType::Region)?.id().to_string();

        if let Some(fields) = self.node_mut(region)?.children_mut(ModelType::Field) {
            fields.insert(field_id, field)?;
        }
        if let Some(data) = self.node_mut(field)?.as_field_mut() {
            data.region_id = Some(region_id);
        }
        Ok(())
    }

    /// Field listed in a region
    #[must_use]
    pub fn region_field(&self, region: ModelKey, id: &str) -> Option<ModelKey> {
        self.get(region)
            .and_then(ModelNode::as_region)
            .and_then(|r| r.fields.get(id))
    }

    /// Fields listed in a region, in order
    #[must_use]
    pub fn region_fields(&self, region: ModelKey) -> Vec<ModelKey> {
        self.get(region)
            .and_then(ModelNode::as_region)
            .map(|r| r.fields.keys())
            .unwrap_or_default()
    }

    /// Link a field to its semantic property
    ///
    /// # Errors
    /// `ModelError::WrongModelType` if the keys are not a field and a property
    pub fn link_property(&mut self, field: ModelKey, property: ModelKey) -> Result<(), ModelError> {
        self.expect(property, ModelType::Property)?;
        self.expect(field, ModelType::Field)?;
        if let Some(data) = self.node_mut(field)?.as_field_mut() {
            data.property = Some(property);
        }
        Ok(())
    }

    /// Property referenced by a field
    #[must_use]
    pub fn field_property(&self, field: ModelKey) -> Option<ModelKey> {
        self.get(field)
            .and_then(ModelNode::as_field)
            .and_then(|f| f.property)
    }

    /// Locally owned children of `kind`
    #[must_use]
    pub fn children(&self, container: ModelKey, kind: ModelType) -> Vec<ModelKey> {
        self.get(container)
            .and_then(|c| c.children(kind))
            .map(ModelList::keys)
            .unwrap_or_default()
    }

    /// Node with the same id in the nearest super model
    ///
    /// Fields, regions, headers and action groups are looked up in the super
    /// definitions of their owner, properties in the super classes. Controls
    /// are looked up in the inherited counterparts of their field, control
    /// parameters in those of their control.
    #[must_use]
    pub fn inherited_counterpart(&self, key: ModelKey) -> Option<ModelKey> {
        let node = self.get(key)?;
        let owner = node.parent()?;
        let kind = node.model_type();
        match kind {
            ModelType::Definition | ModelType::Class => None,
            ModelType::Control | ModelType::ControlParam => {
                let mut inherited_owner = self.inherited_counterpart(owner);
                let mut seen = HashSet::new();
                while let Some(o) = inherited_owner {
                    if !seen.insert(o) {
                        break;
                    }
                    if let Some(found) = self
                        .get(o)
                        .and_then(|n| n.children(kind))
                        .and_then(|list| list.get(node.id()))
                    {
                        return Some(found);
                    }
                    inherited_owner = self.inherited_counterpart(o);
                }
                None
            }
            _ => self.ancestors(owner).into_iter().find_map(|ancestor| {
                self.get(ancestor)
                    .and_then(|a| a.children(kind))
                    .and_then(|list| list.get(node.id()))
            }),
        }
    }

    /// Check if a node is owned by something other than `context`
    #[must_use]
    pub fn is_inherited(&self, key: ModelKey, context: ModelKey) -> bool {
        self.get(key).and_then(ModelNode::parent) != Some(context)
    }

    /// Children of `kind` visible on `container` once inheritance is applied
    ///
    /// The chain is merged from the farthest super model down; an override
    /// replaces its inherited node in place and new nodes are appended.
    #[must_use]
    pub fn effective_children(&self, container: ModelKey, kind: ModelType) -> Vec<ModelKey> {
        let mut chain = self.ancestors(container);
        chain.reverse();
        chain.push(container);
        merge_lists(chain.iter().filter_map(|c| self.get(*c)?.children(kind)))
    }

    /// Effective fields of a definition
    #[must_use]
    pub fn effective_fields(&self, definition: ModelKey) -> Vec<ModelKey> {
        self.effective_children(definition, ModelType::Field)
    }

    /// Effective regions of a definition
    #[must_use]
    pub fn effective_regions(&self, definition: ModelKey) -> Vec<ModelKey> {
        self.effective_children(definition, ModelType::Region)
    }

    /// Effective headers of a definition
    #[must_use]
    pub fn effective_headers(&self, definition: ModelKey) -> Vec<ModelKey> {
        self.effective_children(definition, ModelType::Header)
    }

    /// Effective properties of a class
    #[must_use]
    pub fn effective_properties(&self, class: ModelKey) -> Vec<ModelKey> {
        self.effective_children(class, ModelType::Property)
    }

    /// Effective fields shown in the region `region_id` of a definition
    #[must_use]
    pub fn effective_region_fields(&self, definition: ModelKey, region_id: &str) -> Vec<ModelKey> {
        self.effective_fields(definition)
            .into_iter()
            .filter(|f| {
                self.get(*f)
                    .and_then(ModelNode::as_field)
                    .and_then(|data| data.region_id.as_deref())
                    == Some(region_id)
            })
            .collect()
    }

    /// Controls of a field merged with those of its inherited counterparts
    #[must_use]
    pub fn effective_controls(&self, field: ModelKey) -> Vec<ModelKey> {
        let mut chain = vec![field];
        let mut seen = HashSet::from([field]);
        let mut current = self.inherited_counterpart(field);
        while let Some(next) = current {
            if !seen.insert(next) {
                break;
            }
            chain.push(next);
            current = self.inherited_counterpart(next);
        }
        chain.reverse();
        merge_lists(
            chain
                .iter()
                .filter_map(|f| self.get(*f)?.children(ModelType::Control)),
        )
    }

    /// Sort definition models by their `order` attribute
    ///
    /// Missing orders go last. On equal order, nodes owned by `context` come
    /// before inherited ones, then the original position decides.
    pub fn sort_models(&self, keys: &mut [ModelKey], context: ModelKey) {
        let rank = |k: &ModelKey| {
            let order = self.get(*k).and_then(ModelNode::order).unwrap_or(f64::INFINITY);
            (order, self.is_inherited(*k, context))
        };
        keys.sort_by(|a, b| {
            let (order_a, inherited_a) = rank(a);
            let (order_b, inherited_b) = rank(b);
            order_a
                .total_cmp(&order_b)
                .then(inherited_a.cmp(&inherited_b))
        });
    }

    /// Sort models by label in `language`, case-insensitively
    pub fn sort_by_label(&self, keys: &mut [ModelKey], language: &str) {
        let label = |k: &ModelKey| {
            self.get(*k)
                .and_then(|n| n.description(language))
                .map(str::to_lowercase)
                .unwrap_or_default()
        };
        keys.sort_by_cached_key(label);
    }

    /// Check if a node and its attributes are valid
    #[must_use]
    pub fn is_model_valid(&self, key: ModelKey) -> bool {
        self.get(key).is_some_and(ModelNode::is_valid)
    }

    /// Check if every node is valid
    #[must_use]
    pub fn are_models_valid(&self, keys: &[ModelKey]) -> bool {
        keys.iter().all(|k| self.is_model_valid(*k))
    }

    /// Path of a node from its outermost container
    ///
    /// Definitions and classes start the path; their super models are not
    /// part of it.
    #[must_use]
    pub fn path_of(&self, key: ModelKey) -> ModelPath {
        let mut segments = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(key);
        while let Some(k) = current {
            let Some(node) = self.get(k) else { break };
            if !seen.insert(k) {
                break;
            }
            segments.push((node.model_type(), node.id().to_string()));
            current = match node.model_type() {
                ModelType::Definition | ModelType::Class => None,
                _ => node.parent(),
            };
        }
        segments
            .into_iter()
            .rev()
            .fold(ModelPath::root(), |path, (kind, id)| path.child(kind, id))
    }

    /// Container whose owning list holds `child`
    fn listed_in(&self, child: ModelKey) -> Option<ModelKey> {
        let node = self.get(child)?;
        let owner = node.parent()?;
        let listed = self
            .get(owner)?
            .children(node.model_type())?
            .get(node.id());
        (listed == Some(child)).then_some(owner)
    }

    fn child_info(&self, child: ModelKey) -> Result<(String, ModelType, Option<String>), ModelError> {
        let node = self.node(child)?;
        let region_id = node.as_field().and_then(|f| f.region_id.clone());
        Ok((node.id().to_string(), node.model_type(), region_id))
    }

    fn owned_list_mut(
        &mut self,
        container: ModelKey,
        child_type: ModelType,
    ) -> Result<&mut ModelList, ModelError> {
        let node = self.node_mut(container)?;
        let container_type = node.model_type();
        // region field lists reference fields owned by the definition
        if container_type == ModelType::Region {
            return Err(ModelError::UnsupportedContainment {
                container: container_type,
                child: child_type,
            });
        }
        node.children_mut(child_type)
            .ok_or(ModelError::UnsupportedContainment {
                container: container_type,
                child: child_type,
            })
    }
}

fn merge_lists<'a>(lists: impl Iterator<Item = &'a ModelList>) -> Vec<ModelKey> {
    let mut merged: IndexMap<&str, ModelKey> = IndexMap::new();
    for list in lists {
        for (id, key) in list.iter() {
            merged.insert(id, key);
        }
    }
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeType, ORDER_ATTRIBUTE};
    use pretty_assertions::assert_eq;

    fn ids(tree: &ModelTree, keys: &[ModelKey]) -> Vec<String> {
        keys.iter()
            .map(|k| tree.get(*k).unwrap().id().to_string())
            .collect()
    }

    fn set_order(tree: &mut ModelTree, key: ModelKey, order: i64) {
        tree.node_mut(key).unwrap().base.attributes.insert(
            ModelAttribute::new(
                ORDER_ATTRIBUTE,
                AttributeType::Integer,
                Some(AttributeValue::Integer(order)),
            )
            .unwrap(),
        );
    }

    /// `entity` <- `media` with an overridden `title` and a local `size`
    fn hierarchy() -> (ModelTree, ModelKey, ModelKey) {
        let mut tree = ModelTree::new();
        let entity = tree.create(ModelType::Definition, "entity");
        let media = tree.create(ModelType::Definition, "media");
        tree.set_super(media, entity).unwrap();

        for id in ["title", "description", "status"] {
            tree.create_child(entity, ModelType::Field, id).unwrap();
        }
        tree.create_child(media, ModelType::Field, "title").unwrap();
        tree.create_child(media, ModelType::Field, "size").unwrap();
        (tree, entity, media)
    }

    #[test]
    fn region_insertion_scenario() {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "case");
        let region = tree.create_child(def, ModelType::Region, "general").unwrap();
        let f1 = tree.create_child(def, ModelType::Field, "f1").unwrap();
        let f2 = tree.create_child(def, ModelType::Field, "f2").unwrap();
        let f3 = tree.create_child(def, ModelType::Field, "f3").unwrap();

        tree.add_field_to_region(region, f1).unwrap();
        tree.add_field_to_region(region, f2).unwrap();
        tree.add_field_to_region(region, f3).unwrap();
        assert_eq!(tree.region_fields(region), vec![f1, f2, f3]);

        let err = tree.add_field_to_region(region, f1).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(tree.region_fields(region).len(), 3);
        assert_eq!(tree.region_field(region, "f2"), Some(f2));
        assert_eq!(tree.region_field(region, "f4"), None);
    }

    #[test]
    fn duplicate_child_rejected() {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "case");
        tree.create_child(def, ModelType::Field, "title").unwrap();
        let before = tree.len();

        let err = tree.create_child(def, ModelType::Field, "title").unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(tree.len(), before);
        assert_eq!(tree.children(def, ModelType::Field).len(), 1);
    }

    #[test]
    fn unsupported_containment() {
        let mut tree = ModelTree::new();
        let class = tree.create(ModelType::Class, "document");
        let err = tree.create_child(class, ModelType::Field, "x").unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedContainment { .. }));

        let def = tree.create(ModelType::Definition, "case");
        let region = tree.create_child(def, ModelType::Region, "r").unwrap();
        let err = tree.create_child(region, ModelType::Field, "x").unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedContainment { .. }));
    }

    #[test]
    fn detach_and_reattach_keep_position() {
        let mut tree = ModelTree::new();
        let def = tree.create(ModelType::Definition, "case");
        let region = tree.create_child(def, ModelType::Region, "general").unwrap();
        let keys: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|id| tree.create_child(def, ModelType::Field, id).unwrap())
            .collect();
        for key in &keys {
            tree.add_field_to_region(region, *key).unwrap();
        }

        let placement = tree.detach(def, keys[1]).unwrap();
        assert_eq!(placement, Placement { index: 1, region_index: Some(1) });
        assert_eq!(tree.region_fields(region), vec![keys[0], keys[2]]);
        assert!(tree.get(keys[1]).unwrap().parent().is_none());
        assert!(matches!(
            tree.detach(def, keys[1]),
            Err(ModelError::NotAttached { .. })
        ));

        tree.attach_at(def, keys[1], placement).unwrap();
        assert_eq!(
            ids(&tree, &tree.children(def, ModelType::Field)),
            vec!["a", "b", "c"]
        );
        assert_eq!(tree.region_fields(region), keys);
        assert_eq!(tree.get(keys[1]).unwrap().parent(), Some(def));
    }

    #[test]
    fn attached_child_cannot_move_without_detach() {
        let mut tree = ModelTree::new();
        let first = tree.create(ModelType::Definition, "first");
        let second = tree.create(ModelType::Definition, "second");
        let field = tree.create_child(first, ModelType::Field, "title").unwrap();

        let err = tree.attach(second, field).unwrap_err();
        assert!(matches!(
            err,
            ModelError::AlreadyAttached { ref id, ref container } if id == "title" && container == "first"
        ));
        assert!(tree.children(second, ModelType::Field).is_empty());
        assert_eq!(tree.get(field).unwrap().parent(), Some(first));

        tree.detach(first, field).unwrap();
        tree.attach(second, field).unwrap();
        assert!(tree.children(first, ModelType::Field).is_empty());
        assert_eq!(tree.children(second, ModelType::Field), vec![field]);
    }

    #[test]
    fn cyclic_super_rejected() {
        let (mut tree, entity, media) = hierarchy();
        let err = tree.set_super(entity, media).unwrap_err();
        assert!(matches!(err, ModelError::CyclicHierarchy(_)));
        assert!(tree.set_super(entity, entity).is_err());
        assert_eq!(tree.ancestors(media), vec![entity]);
    }

    #[test]
    fn effective_fields_merge_overrides_in_place() {
        let (tree, entity, media) = hierarchy();
        let fields = tree.effective_fields(media);
        assert_eq!(ids(&tree, &fields), vec!["title", "description", "status", "size"]);

        // the override replaces the inherited title
        let title = fields[0];
        assert_eq!(tree.get(title).unwrap().parent(), Some(media));
        assert!(!tree.is_inherited(title, media));
        assert!(tree.is_inherited(fields[1], media));

        let counterpart = tree.inherited_counterpart(title).unwrap();
        assert_eq!(tree.get(counterpart).unwrap().parent(), Some(entity));
        assert_eq!(tree.inherited_counterpart(fields[3]), None);
        assert_eq!(tree.inherited_counterpart(counterpart), None);
    }

    #[test]
    fn controls_resolve_through_inherited_field() {
        let (mut tree, entity, media) = hierarchy();
        let base_title = tree.children(entity, ModelType::Field)[0];
        let inherited = tree
            .create_child(base_title, ModelType::Control, "RICHTEXT")
            .unwrap();
        tree.create_child(base_title, ModelType::Control, "PICKER").unwrap();

        let title = tree.children(media, ModelType::Field)[0];
        let local = tree.create_child(title, ModelType::Control, "RICHTEXT").unwrap();
        tree.create_child(title, ModelType::Control, "DEFAULT_VALUE").unwrap();

        assert_eq!(tree.inherited_counterpart(local), Some(inherited));
        let controls = tree.effective_controls(title);
        assert_eq!(
            ids(&tree, &controls),
            vec!["RICHTEXT", "PICKER", "DEFAULT_VALUE"]
        );
        assert_eq!(controls[0], local);

        let base_param = tree
            .create_child(inherited, ModelType::ControlParam, "config")
            .unwrap();
        let param = tree.create_child(local, ModelType::ControlParam, "config").unwrap();
        assert_eq!(tree.inherited_counterpart(param), Some(base_param));
        assert_eq!(
            tree.path_of(param).to_string(),
            "definition:media/field:title/control:RICHTEXT/controlParam:config"
        );
    }

    #[test]
    fn sort_by_order_then_locality() {
        let (mut tree, _, media) = hierarchy();
        let mut fields = tree.effective_fields(media);
        // title(local)=20, description(inherited)=10, status(inherited)=20, size(local)=none
        set_order(&mut tree, fields[0], 20);
        set_order(&mut tree, fields[1], 10);
        set_order(&mut tree, fields[2], 20);

        // put status ahead of title to check locality wins over position
        fields.swap(0, 2);
        tree.sort_models(&mut fields, media);
        assert_eq!(ids(&tree, &fields), vec!["description", "title", "status", "size"]);
    }

    #[test]
    fn double_orders_sort_between_integers() {
        let (mut tree, _, media) = hierarchy();
        let mut fields = tree.effective_fields(media);
        set_order(&mut tree, fields[0], 20);
        set_order(&mut tree, fields[1], 10);
        tree.node_mut(fields[2]).unwrap().base.attributes.insert(
            ModelAttribute::new(
                ORDER_ATTRIBUTE,
                AttributeType::Double,
                Some(AttributeValue::Double(15.5)),
            )
            .unwrap(),
        );

        tree.sort_models(&mut fields, media);
        assert_eq!(ids(&tree, &fields), vec!["description", "status", "title", "size"]);
    }

    #[test]
    fn path_of_nested_nodes() {
        let (mut tree, _, media) = hierarchy();
        let title = tree.children(media, ModelType::Field)[0];
        let control = tree.create_child(title, ModelType::Control, "RICHTEXT").unwrap();

        assert_eq!(tree.path_of(media).to_string(), "definition:media");
        assert_eq!(
            tree.path_of(control).to_string(),
            "definition:media/field:title/control:RICHTEXT"
        );
    }

    #[test]
    fn attribute_access_absent_is_none() {
        let (mut tree, entity, _) = hierarchy();
        assert!(tree.attribute(entity, "label").is_none());
        assert_eq!(
            tree.set_attribute_value(entity, "label", Some(AttributeValue::Integer(1)))
                .unwrap(),
            None
        );
    }

    #[test]
    fn property_link() {
        let mut tree = ModelTree::new();
        let class = tree.create(ModelType::Class, "document");
        let property = tree.create_child(class, ModelType::Property, "title").unwrap();
        let def = tree.create(ModelType::Definition, "case");
        let field = tree.create_child(def, ModelType::Field, "title").unwrap();

        assert_eq!(tree.field_property(field), None);
        tree.link_property(field, property).unwrap();
        assert_eq!(tree.field_property(field), Some(property));
        assert!(tree.link_property(property, field).is_err());
    }
}
