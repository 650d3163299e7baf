//! Tree synchronization engine.

pub mod deploy;
pub mod resolve;
pub mod tree;

pub use deploy::{DeployOptions, DeployReport, deploy, deploy_with_handles};
pub use resolve::{ResolvedRoot, RootState, resolve_or_create};
pub use tree::{WalkStats, synchronize};
