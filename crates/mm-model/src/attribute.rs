//! Typed model attributes
//!
//! Provides [`ModelAttribute`], a typed key/value pair attached to a model
//! node, together with its [`AttributeType`], [`AttributeValue`] and the
//! computed [`Restrictions`].

use crate::error::ModelError;
use crate::meta::ModelMetaData;
use crate::validation::ModelValidation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Attribute holding the multi-language label of a model
pub const LABEL_ATTRIBUTE: &str = "label";

/// Attribute holding the display order of a field or region
pub const ORDER_ATTRIBUTE: &str = "order";

/// Attribute holding the display type of a field or region
pub const DISPLAY_ATTRIBUTE: &str = "displayType";

/// Attribute holding the semantic uri of a field or property
pub const URI_ATTRIBUTE: &str = "uri";

/// Language used when a label has no entry for the requested one
pub const FALLBACK_LANGUAGE: &str = "en";

/// Fixed enumeration of attribute types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    /// Plain text
    String,
    /// Whole number
    Integer,
    /// Floating point number
    Double,
    /// Flag
    Boolean,
    /// Resource identifier
    Uri,
    /// Model identifier
    Identifier,
    /// Multi-language label
    Label,
    /// Multi-language text
    MultiLangString,
    /// Display type (`EDITABLE`, `READ_ONLY`, `HIDDEN`, `SYSTEM`)
    DisplayType,
    /// Code list reference
    CodeList,
    /// Data type descriptor (e.g. `an..180`)
    Type,
    /// Semantic class reference
    SemanticType,
}

impl AttributeType {
    /// Serialized name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Uri => "uri",
            Self::Identifier => "identifier",
            Self::Label => "label",
            Self::MultiLangString => "multiLangString",
            Self::DisplayType => "displayType",
            Self::CodeList => "codeList",
            Self::Type => "type",
            Self::SemanticType => "semanticType",
        }
    }

    /// Check if values of this type are language maps
    #[inline]
    #[must_use]
    pub fn is_multi_lang(&self) -> bool {
        matches!(self, Self::Label | Self::MultiLangString)
    }

    /// Check if `value` is representable as this type
    #[must_use]
    pub fn accepts(&self, value: &AttributeValue) -> bool {
        match (self, value) {
            (Self::Boolean, AttributeValue::Boolean(_))
            | (Self::Integer | Self::Double | Self::CodeList, AttributeValue::Integer(_))
            | (Self::Double, AttributeValue::Double(_))
            | (Self::Label | Self::MultiLangString, AttributeValue::MultiLang(_))
            | (
                Self::String
                | Self::Uri
                | Self::Identifier
                | Self::DisplayType
                | Self::CodeList
                | Self::Type
                | Self::SemanticType,
                AttributeValue::String(_),
            ) => true,
            _ => false,
        }
    }
}

impl Display for AttributeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value
///
/// Variant order matters for untagged deserialization: whole JSON numbers
/// become [`AttributeValue::Integer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Flag
    Boolean(bool),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Double(f64),
    /// Text
    String(String),
    /// Language code to text
    MultiLang(BTreeMap<String, String>),
}

impl AttributeValue {
    /// Convert a JSON value into a value of `attr_type`
    ///
    /// `null` yields `None`. An empty string stands for "no value" for every
    /// type that is not textual.
    ///
    /// # Errors
    /// `ModelError::TypeMismatch` when the JSON value does not fit `attr_type`
    pub fn from_json(
        attribute: &str,
        attr_type: AttributeType,
        json: &Value,
    ) -> Result<Option<Self>, ModelError> {
        match json {
            Value::Null => return Ok(None),
            Value::String(s) if s.is_empty() && !attr_type.accepts(&Self::String(String::new())) => {
                return Ok(None)
            }
            _ => {}
        }
        let value: Self = serde_json::from_value(json.clone())
            .map_err(|_| ModelError::type_mismatch(attribute, attr_type, json))?;
        let value = match (attr_type, value) {
            (AttributeType::Double, Self::Integer(n)) => {
                #[allow(clippy::cast_precision_loss)]
                let n = n as f64;
                Self::Double(n)
            }
            (_, value) => value,
        };
        if attr_type.accepts(&value) {
            Ok(Some(value))
        } else {
            Err(ModelError::type_mismatch(attribute, attr_type, json))
        }
    }

    /// JSON form of the value
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Check if the value carries no content (empty text or empty map)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(s) => s.trim().is_empty(),
            Self::MultiLang(map) => map.values().all(|s| s.trim().is_empty()),
            _ => false,
        }
    }

    /// Text of a plain string value
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whole number value
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value, whole numbers widened
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Flag value
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Text for a language
    ///
    /// Language maps fall back to [`FALLBACK_LANGUAGE`], then to any entry.
    /// Plain strings ignore the language.
    #[must_use]
    pub fn text(&self, language: &str) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::MultiLang(map) => map
                .get(language)
                .or_else(|| map.get(FALLBACK_LANGUAGE))
                .or_else(|| map.values().next())
                .map(String::as_str),
            _ => None,
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::MultiLang(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Computed editable / mandatory / visible state of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restrictions {
    /// Attribute may be edited
    pub updateable: bool,
    /// Attribute must carry a value
    pub mandatory: bool,
    /// Attribute is shown
    pub visible: bool,
}

impl Restrictions {
    /// Restrictions implied by metadata alone
    #[inline]
    #[must_use]
    pub fn with_mandatory(mandatory: bool) -> Self {
        Self {
            mandatory,
            ..Self::default()
        }
    }
}

impl Default for Restrictions {
    fn default() -> Self {
        Self {
            updateable: true,
            mandatory: false,
            visible: true,
        }
    }
}

/// Typed attribute of a model node
///
/// # Invariants
/// - `value`, when present, is accepted by `attr_type`
#[derive(Debug, Clone)]
pub struct ModelAttribute {
    id: String,
    attr_type: AttributeType,
    value: Option<AttributeValue>,
    meta: Option<Arc<ModelMetaData>>,
    restrictions: Restrictions,
    validation: ModelValidation,
    dirty: bool,
}

impl ModelAttribute {
    /// Create attribute
    ///
    /// # Errors
    /// `ModelError::TypeMismatch` if `value` does not fit `attr_type`
    pub fn new(
        id: impl Into<String>,
        attr_type: AttributeType,
        value: Option<AttributeValue>,
    ) -> Result<Self, ModelError> {
        let id = id.into();
        check_type(&id, attr_type, value.as_ref())?;
        Ok(Self {
            id,
            attr_type,
            value,
            meta: None,
            restrictions: Restrictions::default(),
            validation: ModelValidation::new(),
            dirty: false,
        })
    }

    /// Create attribute from metadata, holding the metadata default value
    ///
    /// # Errors
    /// `ModelError::TypeMismatch` if the metadata default does not fit its type
    pub fn from_meta(meta: &Arc<ModelMetaData>) -> Result<Self, ModelError> {
        let value = meta.default_attribute_value()?;
        Ok(Self::new(meta.id(), meta.attr_type(), value)?.with_meta(Arc::clone(meta)))
    }

    /// Attach metadata; restrictions are reset to what the metadata implies
    #[must_use]
    pub fn with_meta(mut self, meta: Arc<ModelMetaData>) -> Self {
        self.restrictions = Restrictions::with_mandatory(meta.is_mandatory());
        self.meta = Some(meta);
        self
    }

    /// Attribute id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attribute type
    #[inline]
    #[must_use]
    pub fn attr_type(&self) -> AttributeType {
        self.attr_type
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&AttributeValue> {
        self.value.as_ref()
    }

    /// Replace the value, returning the previous one
    ///
    /// # Errors
    /// `ModelError::TypeMismatch` if `value` does not fit the attribute type;
    /// the attribute is left unchanged
    pub fn set_value(
        &mut self,
        value: Option<AttributeValue>,
    ) -> Result<Option<AttributeValue>, ModelError> {
        check_type(&self.id, self.attr_type, value.as_ref())?;
        self.dirty = true;
        Ok(std::mem::replace(&mut self.value, value))
    }

    /// Check if the attribute has no value or an empty one
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map_or(true, AttributeValue::is_empty)
    }

    /// JSON form of the value (`null` when absent)
    #[must_use]
    pub fn json_value(&self) -> Value {
        self.value.as_ref().map_or(Value::Null, AttributeValue::to_json)
    }

    /// Describing metadata
    #[inline]
    #[must_use]
    pub fn meta(&self) -> Option<&Arc<ModelMetaData>> {
        self.meta.as_ref()
    }

    /// Computed restrictions
    #[inline]
    #[must_use]
    pub fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }

    /// Replace computed restrictions
    #[inline]
    pub fn set_restrictions(&mut self, restrictions: Restrictions) {
        self.restrictions = restrictions;
    }

    /// Validation state
    #[inline]
    #[must_use]
    pub fn validation(&self) -> &ModelValidation {
        &self.validation
    }

    /// Mutable validation state
    #[inline]
    pub fn validation_mut(&mut self) -> &mut ModelValidation {
        &mut self.validation
    }

    /// Check if the value was changed since loading
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

fn check_type(
    id: &str,
    attr_type: AttributeType,
    value: Option<&AttributeValue>,
) -> Result<(), ModelError> {
    match value {
        Some(v) if !attr_type.accepts(v) => Err(ModelError::type_mismatch(id, attr_type, v)),
        _ => Ok(()),
    }
}

/// Attributes of a node keyed by attribute id
#[derive(Debug, Clone, Default)]
pub struct ModelAttributes {
    items: IndexMap<String, ModelAttribute>,
}

impl ModelAttributes {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ModelAttribute> {
        self.items.get(id)
    }

    /// Mutable lookup by id
    #[inline]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ModelAttribute> {
        self.items.get_mut(id)
    }

    /// Insert or replace, returning the replaced attribute
    pub fn insert(&mut self, attribute: ModelAttribute) -> Option<ModelAttribute> {
        self.items.insert(attribute.id.clone(), attribute)
    }

    /// Remove by id
    pub fn remove(&mut self, id: &str) -> Option<ModelAttribute> {
        self.items.shift_remove(id)
    }

    /// Check if an attribute is present
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Attribute ids
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }

    /// Iterate over attributes
    pub fn iter(&self) -> impl Iterator<Item = &ModelAttribute> {
        self.items.values()
    }

    /// Iterate mutably over attributes
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModelAttribute> {
        self.items.values_mut()
    }

    /// Number of attributes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
