//! Source model: directive scanning, the per-file source record, the
//! transitive source set, the aggregated project, and execution selection.

pub mod builder;
pub mod cmd;
pub mod directives;
pub mod project;
pub mod source;
pub mod source_set;

pub use builder::{Builder, JavacBuilder};
pub use cmd::{command_line, select, CmdKind, ForceType, RunContext};
pub use directives::{Directive, EnvPropertySource, PropertySource};
pub use project::{Project, ATTR_AGENT_CLASS, ATTR_PREMAIN_CLASS};
pub use source::Source;
pub use source_set::SourceSet;
