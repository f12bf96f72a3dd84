use crate::Opts;
use std::path::PathBuf;

pub const BUILD_DIR: &str = "build/web";
pub const BUNDLE: &str = "main.dart.js";
pub const DEPENDENTS: [&str; 4] = [
    "flutter_bootstrap.js",
    "index.html",
    "flutter_service_worker.js",
    "manifest.json",
];
pub const MAP_SUFFIX: &str = ".map";

/// Everything the rehasher needs to know about a run. `Config::default()` describes the one
/// supported layout; tests point `build_dir` elsewhere.
#[derive(Clone, Debug)]
pub struct Config {
    pub build_dir: PathBuf,
    pub bundle: String,
    /// Files that may reference `bundle`, patched in this order.
    pub dependents: Vec<String>,
    pub map_suffix: String,
    pub dry_run: bool,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(BUILD_DIR),
            bundle: BUNDLE.to_owned(),
            dependents: DEPENDENTS.iter().copied().map(ToOwned::to_owned).collect(),
            map_suffix: MAP_SUFFIX.to_owned(),
            dry_run: false,
            verbose: false,
        }
    }
}

impl Config {
    pub(crate) fn from_opts(opts: &Opts) -> Self {
        Self {
            dry_run: opts.dry_run,
            verbose: opts.verbose,
            ..Self::default()
        }
    }

    pub fn map_file(&self) -> String {
        format!("{}{}", self.bundle, self.map_suffix)
    }
}
