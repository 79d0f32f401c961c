//! Transform space
//!
//! A [`TransformSpace`] holds the resources of one or more packages:
//!
//! - transformer sources (`*.t`), parsed into functions at registration
//! - transformable items, texts in a known language
//! - unmanaged resources, only tracked for duplicate detection
//!
//! Functions are bound to their target item and applied in a fixed order
//! (package, source path, position in source). Changed sources go to the
//! dirty list of their package so that only affected targets are
//! transformed again. Outputs that differ from their input are handed to the
//! install hooks.

mod errors;
mod external;
mod install;
mod options;
mod package;
mod transform_space;

pub use errors::{ApplyFailure, InstallError, RegistrationError, SpaceError};
pub use external::{DirectoryResolver, ExternalItemResolver, ExternalTransformableItem};
pub use install::{FileInstaller, InstallHook, InstallerChain, MemoryInstaller};
pub use options::SpaceOptions;
pub use package::{
    BoundFunction, FunctionId, FunctionKey, FunctionState, SourceIndex, SourceKind, TargetOrigin,
    TransformPackage, TransformableItem, TransformableSource,
};
pub use transform_space::{ApplyReport, TRANSFORMER_EXTENSION, TransformSpace};

#[cfg(test)]
mod tests;
