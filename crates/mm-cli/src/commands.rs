//! Subcommand implementations

use anyhow::{Context, Result};
use mm_actions::{ActionExecutor, ModelManagementConfig, ModelValidateAttributesActionFactory};
use mm_model::{LoadedModels, ModelFilter, ModelKey, ModelNode, ModelTree, ModelType, ModelsMetaData};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::path::Path;

/// Models loaded from the command line inputs
pub(crate) struct Workspace {
    pub(crate) tree: ModelTree,
    pub(crate) models: LoadedModels,
}

impl Workspace {
    pub(crate) fn load(models: &Path, meta: &Path) -> Result<Self> {
        let models_json = std::fs::read_to_string(models)
            .with_context(|| format!("reading models from {}", models.display()))?;
        let meta_json = std::fs::read_to_string(meta)
            .with_context(|| format!("reading metadata from {}", meta.display()))?;
        Self::from_json(&models_json, &meta_json)
    }

    pub(crate) fn from_json(models_json: &str, meta_json: &str) -> Result<Self> {
        let meta = ModelsMetaData::from_json(meta_json).context("parsing metadata")?;
        let mut tree = ModelTree::new();
        let models = tree.load_json(models_json, &meta).context("loading models")?;
        tracing::info!(
            definitions = models.definitions.len(),
            classes = models.classes.len(),
            nodes = tree.len(),
            "loaded models"
        );
        Ok(Self { tree, models })
    }
}

/// Attribute that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct InvalidAttribute {
    pub(crate) model: String,
    pub(crate) attribute: String,
    pub(crate) errors: Vec<String>,
}

/// Outcome of `mm validate`
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct ValidationReport {
    pub(crate) checked: usize,
    pub(crate) invalid: Vec<InvalidAttribute>,
}

impl ValidationReport {
    pub(crate) fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for entry in &self.invalid {
            writeln!(
                f,
                "{}#{}: {}",
                entry.model,
                entry.attribute,
                entry.errors.join(", ")
            )?;
        }
        let status = if self.is_valid() { "valid" } else { "INVALID" };
        write!(
            f,
            "{} models checked, {} invalid attributes: {status}",
            self.checked,
            self.invalid.len()
        )
    }
}

/// Validate every locally owned model of every definition and class
pub(crate) fn validate(
    workspace: &mut Workspace,
    config: &ModelManagementConfig,
) -> Result<ValidationReport> {
    let mut executor = ActionExecutor::with_rules(config.clone());
    let tree = &mut workspace.tree;

    let mut targets: Vec<(ModelKey, ModelKey)> = Vec::new();
    for definition in workspace.models.definitions.values().copied() {
        targets.push((definition, definition));
        for kind in [ModelType::Field, ModelType::Region, ModelType::Header] {
            for child in tree.children(definition, kind) {
                targets.push((child, definition));
                for control in tree.children(child, ModelType::Control) {
                    targets.push((control, child));
                    for param in tree.children(control, ModelType::ControlParam) {
                        targets.push((param, control));
                    }
                }
            }
        }
    }
    for class in workspace.models.classes.values().copied() {
        targets.push((class, class));
        for property in tree.children(class, ModelType::Property) {
            targets.push((property, class));
        }
    }

    let mut report = ValidationReport::default();
    for (model, context) in targets {
        let action = ModelValidateAttributesActionFactory
            .create()
            .with_model(model)
            .with_context(context);
        executor
            .execute(tree, action)
            .with_context(|| format!("validating {}", tree.path_of(model)))?;
        report.checked += 1;

        let path = tree.path_of(model).to_string();
        let node = tree.node(model)?;
        for attribute in node.attributes().iter() {
            let errors = attribute.validation().errors();
            if !errors.is_empty() {
                report.invalid.push(InvalidAttribute {
                    model: path.clone(),
                    attribute: attribute.id().to_string(),
                    errors: errors.to_vec(),
                });
            }
        }
    }
    Ok(report)
}

/// One line of `mm fields`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct FieldRow {
    pub(crate) id: String,
    pub(crate) label: Option<String>,
    pub(crate) order: Option<f64>,
    pub(crate) region: Option<String>,
    pub(crate) inherited_from: Option<String>,
}

impl Display for FieldRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let order = self.order.map_or_else(|| "-".to_string(), |o| o.to_string());
        write!(
            f,
            "{order:>5}  {:<24} {:<32} {}",
            self.id,
            self.label.as_deref().unwrap_or(""),
            self.region.as_deref().unwrap_or("")
        )?;
        if let Some(owner) = &self.inherited_from {
            write!(f, "  (inherited from {owner})")?;
        }
        Ok(())
    }
}

/// Visible effective fields of a definition, in display order
pub(crate) fn list_fields(
    workspace: &mut Workspace,
    definition: &str,
    filter: &ModelFilter,
    language: &str,
) -> Result<Vec<FieldRow>> {
    let key = workspace
        .models
        .definition(definition)
        .with_context(|| format!("unknown definition '{definition}'"))?;
    let tree = &mut workspace.tree;

    let mut fields = filter.apply(tree, key, language);
    tree.sort_models(&mut fields, key);

    fields
        .into_iter()
        .map(|field| -> Result<FieldRow> {
            let node = tree.node(field)?;
            let inherited_from = if tree.is_inherited(field, key) {
                node.parent()
                    .and_then(|owner| tree.get(owner))
                    .map(|owner| owner.id().to_string())
            } else {
                None
            };
            Ok(FieldRow {
                id: node.id().to_string(),
                label: node.description(language).map(str::to_string),
                order: node.order(),
                region: node
                    .as_field()
                    .and_then(|data| data.region_id.clone()),
                inherited_from,
            })
        })
        .collect()
}

/// Ids of the definitions in input order
pub(crate) fn definition_ids(workspace: &Workspace) -> Vec<&str> {
    workspace
        .models
        .definitions
        .values()
        .filter_map(|key| workspace.tree.get(*key))
        .map(ModelNode::id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_test_utils::{METADATA_JSON, MODELS_JSON};
    use pretty_assertions::assert_eq;

    fn workspace() -> Workspace {
        Workspace::from_json(MODELS_JSON, METADATA_JSON).unwrap()
    }

    #[test]
    fn fixture_is_valid() {
        let mut workspace = workspace();
        let report = validate(&mut workspace, &ModelManagementConfig::default()).unwrap();
        assert!(report.is_valid(), "{report}");
        assert!(report.checked > 10);
    }

    #[test]
    fn missing_property_is_reported() {
        let mut workspace = workspace();
        let media = workspace.models.definition("media").unwrap();
        let size = workspace
            .tree
            .children(media, ModelType::Field)
            .into_iter()
            .find(|f| workspace.tree.get(*f).unwrap().id() == "size")
            .unwrap();
        workspace.tree.set_attribute_value(size, "uri", None).unwrap();

        let report = validate(&mut workspace, &ModelManagementConfig::default()).unwrap();
        assert_eq!(
            report.invalid,
            vec![InvalidAttribute {
                model: "definition:media/field:size".into(),
                attribute: "uri".into(),
                errors: vec!["mandatory".into()],
            }]
        );
        assert!(report.to_string().ends_with("INVALID"));
    }

    #[test]
    fn fields_are_ordered_and_marked() {
        let mut workspace = workspace();
        let rows = list_fields(&mut workspace, "media", &ModelFilter::default(), "en").unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        // status is a system field
        assert_eq!(ids, ["title", "description", "size"]);
        assert_eq!(rows[0].inherited_from, None);
        assert_eq!(rows[1].inherited_from.as_deref(), Some("entity"));
        assert_eq!(rows[0].label.as_deref(), Some("Media title"));

        let all = ModelFilter::default().with_system(true).with_hidden(true);
        let rows = list_fields(&mut workspace, "media", &all, "en").unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn unknown_definition_fails() {
        let mut workspace = workspace();
        let err = list_fields(&mut workspace, "nope", &ModelFilter::default(), "en").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn definitions_in_input_order() {
        assert_eq!(definition_ids(&workspace()), ["entity", "media"]);
    }
}
