//! Stock attribute definitions.

mod mapped;
mod prescoped;
mod regex_split;
mod scoped;
mod simple;
mod template;

pub use mapped::{MappedAttributeDefinition, SourceValueConfig, ValueMap, ValueMapConfig};
pub use prescoped::PrescopedAttributeDefinition;
pub use regex_split::RegexSplitAttributeDefinition;
pub use scoped::ScopedAttributeDefinition;
pub use simple::SimpleAttributeDefinition;
pub use template::TemplateAttributeDefinition;
