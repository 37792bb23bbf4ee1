pub mod attributes;
pub mod element_type;
pub mod explorer;
pub mod merge;
pub mod name_normalizer;
pub mod resolved_schema;
pub mod spec_to_ir;
pub mod validators;

pub use attributes::{AttributeBuilder, SchemaFlavor};
pub use element_type::build_element_type;
pub use merge::{MergeMismatch, merge_attributes, merge_attributes_with, merge_element_types};
pub use resolved_schema::{GlobalOptions, MAX_SCHEMA_DEPTH, ResolvedSchema, SchemaKind};
pub use spec_to_ir::{EntryKind, Generated, Skipped, generate, generate_with_source};
