//! Command-line arguments and their validation.
//!
//! Every check here runs before any remote contact, so a bad argument never
//! opens a connection.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::error::{DeployError, Result};
use crate::secret::Password;
use crate::store::{ExistingFolderPolicy, normalize_path};

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Upload a local directory tree to a remote site folder.
#[derive(Parser)]
#[command(name = "sitedeploy", version, about)]
pub struct CliArgs {
    /// Site URL, must use https (e.g. https://contoso.example.com/sites/dev)
    pub site_url: String,

    /// User name, e.g. user@domain.com
    pub user: String,

    /// Password of the user
    pub password: String,

    /// Target folder relative to the site root, e.g. SiteAssets/App
    pub folder: String,

    /// Local directory whose content is uploaded
    pub source: String,

    /// Route requests through a proxy
    #[arg(long)]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Resolve the target folder and print the queued operations without sending them
    #[arg(long)]
    pub dry_run: bool,

    /// How the site treats sub-folders that already exist
    #[arg(long, value_name = "reuse|fail", default_value = "reuse")]
    pub existing_folders: ExistingFolderPolicy,
}

/// Validated settings for one deploy run.
#[derive(Debug)]
pub struct DeployConfig {
    pub site_url: Url,
    pub user: String,
    pub password: Password,
    /// Target folder as given; the resolver drops a leading separator
    pub target_folder: String,
    pub source_dir: PathBuf,
    pub proxy: Option<String>,
    pub timeout: Duration,
    pub dry_run: bool,
    pub existing_folders: ExistingFolderPolicy,
}

impl TryFrom<CliArgs> for DeployConfig {
    type Error = DeployError;

    fn try_from(args: CliArgs) -> Result<Self> {
        let site_url = parse_site_url(&args.site_url)?;
        let user = parse_user(&args.user)?;
        let password = Password::new(args.password);
        let target_folder = parse_target_folder(&args.folder)?;
        let source_dir = parse_source_dir(&args.source)?;
        if args.timeout == 0 {
            return Err(DeployError::Validation("Timeout must be positive".into()));
        }

        Ok(Self {
            site_url,
            user,
            password,
            target_folder,
            source_dir,
            proxy: args.proxy,
            timeout: Duration::from_secs(args.timeout),
            dry_run: args.dry_run,
            existing_folders: args.existing_folders,
        })
    }
}

/// Site URL must be absolute and use https.
pub fn parse_site_url(value: &str) -> Result<Url> {
    let invalid = || DeployError::Validation("Invalid web url".into());
    if !value.to_ascii_lowercase().starts_with("https://") {
        return Err(invalid());
    }
    let url = Url::parse(value).map_err(|_| invalid())?;
    if url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

/// User names are e-mail style identities.
pub fn parse_user(value: &str) -> Result<String> {
    if !value.contains('@') {
        return Err(DeployError::Validation("Invalid user name".into()));
    }
    Ok(value.to_string())
}

/// Target folder must name something besides a bare leading `/`.
pub fn parse_target_folder(value: &str) -> Result<String> {
    if value.trim().is_empty() || normalize_path(value).is_empty() {
        return Err(DeployError::Validation(
            "Invalid application folder name".into(),
        ));
    }
    Ok(value.to_string())
}

/// Source must name an existing directory.
pub fn parse_source_dir(value: &str) -> Result<PathBuf> {
    if value.trim().is_empty() {
        return Err(DeployError::Validation("Invalid source folder path".into()));
    }
    let path = PathBuf::from(value);
    if !path.is_dir() {
        return Err(DeployError::Validation(
            "Source folder path does not exist".into(),
        ));
    }
    Ok(path)
}
