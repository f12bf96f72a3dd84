use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "{bundle} not found in {}\n{}Make sure to run \"flutter build web\" first.",
        build_dir.display(),
        already_hashed_hint(hashed.as_deref())
    )]
    MissingArtifact {
        bundle: String,
        build_dir: PathBuf,
        /// An already-hashed bundle found in the build directory, if any.
        hashed: Option<String>,
    },
}

fn already_hashed_hint(hashed: Option<&str>) -> String {
    hashed.map_or_else(String::new, |hashed| {
        format!("Found {hashed}; was the build directory already processed?\n")
    })
}
