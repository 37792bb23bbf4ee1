pub mod attributes;
pub mod element_type;
pub mod types;
pub mod validators;

pub use attributes::*;
pub use element_type::ElementType;
pub use types::{IR_VERSION, IrDataSource, IrProvider, IrResource, IrSchema, IrSpec};
pub use validators::{Validator, ValidatorRule, ValidatorTarget};
