#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod file;
pub mod rebase;
pub mod stylesheet;

pub use config::{DEFAULT_MARKER, RebaseConfig, RebaseOptions};
pub use error::{RebaseError, RebaseResult, RebaseWarning};
pub use file::SourceFile;
pub use rebase::{AssetCopier, AssetRebaser, CopiedAsset, FsCopier, Rebased};
pub use stylesheet::{CssSyntax, RawSyntax};
