//! Seam to an external JSON Schema validator.
//!
//! The harness never evaluates schemas itself. A [`ValidatorFactory`]
//! builds one [`SchemaValidator`] per draft, configured for that draft's
//! dialect; remote documents and the metaschema are registered before
//! any case runs.

use serde::Serialize;

use draftsuite_corpus::Draft;

/// Dialect parameters a validator needs to interpret a draft's schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialect {
    /// `$schema` URI of the draft's metaschema.
    pub meta_schema_uri: String,
    /// Keyword carrying a schema's identifier (`id` or `$id`).
    pub id_keyword: &'static str,
}

impl Dialect {
    #[must_use]
    pub fn for_draft(draft: Draft) -> Self {
        Self {
            meta_schema_uri: draft.meta_schema_uri(),
            id_keyword: draft.id_keyword(),
        }
    }
}

/// Options handed to a [`ValidatorFactory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorOptions {
    pub draft: Draft,
    pub dialect: Dialect,
    /// Treat `format` as an assertion instead of an annotation.
    pub format_assertions: bool,
}

impl ValidatorOptions {
    #[must_use]
    pub fn for_draft(draft: Draft, format_assertions: bool) -> Self {
        Self {
            draft,
            dialect: Dialect::for_draft(draft),
            format_assertions,
        }
    }
}

/// Failure reported by a validator implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidatorError {
    pub message: String,
}

impl ValidatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait SchemaValidator {
    /// Make `document` resolvable at `uri`.
    fn add_schema(&mut self, document: &serde_json::Value, uri: &str)
    -> Result<(), ValidatorError>;

    /// Register the draft's metaschema document.
    fn add_meta_schema(&mut self, document: &serde_json::Value) -> Result<(), ValidatorError>;

    /// Whether `instance` is valid against `schema`.
    fn validate(
        &mut self,
        schema: &serde_json::Value,
        instance: &serde_json::Value,
    ) -> Result<bool, ValidatorError>;
}

/// Builds a validator for one draft.
pub trait ValidatorFactory {
    type Validator: SchemaValidator;

    fn build(&self, options: &ValidatorOptions) -> Result<Self::Validator, ValidatorError>;
}

impl<F, V> ValidatorFactory for F
where
    F: Fn(&ValidatorOptions) -> Result<V, ValidatorError>,
    V: SchemaValidator,
{
    type Validator = V;

    fn build(&self, options: &ValidatorOptions) -> Result<V, ValidatorError> {
        self(options)
    }
}
