use crate::{
    config::Config,
    error::Error,
    util::{hash_path_contents, hashed_name, is_hashed_name, replace_bytes},
};
use anyhow::{Context, Result};
use memchr::memmem;
use std::{
    fs::{canonicalize, metadata, read, read_dir, rename, set_permissions},
    io::Write,
    path::Path,
};
use tempfile::NamedTempFile;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// What a run did (or, for a dry run, would do). File names are relative to the build directory.
#[derive(Debug, Default)]
pub struct Outcome {
    pub hash: String,
    pub renamed: Vec<Rename>,
    pub patched: Vec<String>,
    /// Dependent files that do not exist.
    pub skipped: Vec<String>,
    /// Files that exist but contain no reference to rewrite.
    pub untouched: Vec<String>,
}

enum Patch {
    Missing,
    Unchanged,
    Patched,
}

pub fn rehash(config: &Config) -> Result<Outcome> {
    let bundle_path = config.build_dir.join(&config.bundle);
    if !bundle_path
        .try_exists()
        .with_context(|| format!("failed to check for {}", bundle_path.display()))?
    {
        return Err(Error::MissingArtifact {
            bundle: config.bundle.clone(),
            build_dir: config.build_dir.clone(),
            hashed: find_hashed_bundle(config),
        }
        .into());
    }

    let hash = hash_path_contents(&bundle_path)?;
    let hashed_bundle = hashed_name(&config.bundle, &hash);

    let mut outcome = Outcome {
        hash,
        ..Outcome::default()
    };

    rename_in(config, &config.bundle, &hashed_bundle, &mut outcome)?;

    for dependent in &config.dependents {
        let patch = patch_file(config, dependent, dependent, &config.bundle, &hashed_bundle)?;
        outcome.record(dependent, patch);
    }

    let map_file = config.map_file();
    let map_path = config.build_dir.join(&map_file);
    if map_path
        .try_exists()
        .with_context(|| format!("failed to check for {}", map_path.display()))?
    {
        let hashed_map = format!("{hashed_bundle}{}", config.map_suffix);
        rename_in(config, &map_file, &hashed_map, &mut outcome)?;

        // The bundle usually ends with a `//# sourceMappingURL=` comment naming its map.
        let current_bundle = if config.dry_run {
            &config.bundle
        } else {
            &hashed_bundle
        };
        let patch = patch_file(config, current_bundle, &hashed_bundle, &map_file, &hashed_map)?;
        outcome.record(&hashed_bundle, patch);
    }

    Ok(outcome)
}

impl Outcome {
    fn record(&mut self, name: &str, patch: Patch) {
        let list = match patch {
            Patch::Missing => &mut self.skipped,
            Patch::Unchanged => &mut self.untouched,
            Patch::Patched => &mut self.patched,
        };
        list.push(name.to_owned());
    }
}

fn rename_in(config: &Config, from: &str, to: &str, outcome: &mut Outcome) -> Result<()> {
    if config.dry_run {
        println!("Would rename {from} to {to}");
    } else {
        let from_path = config.build_dir.join(from);
        let to_path = config.build_dir.join(to);
        rename(&from_path, &to_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                from_path.display(),
                to_path.display()
            )
        })?;
        println!("Renamed {from} to {to}");
    }
    outcome.renamed.push(Rename {
        from: from.to_owned(),
        to: to.to_owned(),
    });
    Ok(())
}

/// Replaces every occurrence of `from` with `to` in the file `name`. `label` is how the file is
/// reported, which differs from `name` only when a dry run refers to a file under the name it
/// would have had.
fn patch_file(config: &Config, name: &str, label: &str, from: &str, to: &str) -> Result<Patch> {
    let path = config.build_dir.join(name);
    if !path
        .try_exists()
        .with_context(|| format!("failed to check for {}", path.display()))?
    {
        if config.verbose {
            eprintln!("Skipping {label}: not found");
        }
        return Ok(Patch::Missing);
    }

    let contents = read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    if memmem::find(&contents, from.as_bytes()).is_none() {
        if config.verbose {
            eprintln!("Leaving {label} unchanged: no reference to {from}");
        }
        return Ok(Patch::Unchanged);
    }

    if config.dry_run {
        println!("Would update {label}");
    } else {
        let patched = replace_bytes(&contents, from.as_bytes(), to.as_bytes());
        write_atomically(&path, &patched)?;
        println!("Updated {label}");
    }

    Ok(Patch::Patched)
}

/// Writes `contents` to a sibling of the file `path` resolves to, then renames it into place. A
/// symlinked dependent keeps its link and has its target updated.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let target =
        canonicalize(path).with_context(|| format!("failed to resolve {}", path.display()))?;
    let dir = target
        .parent()
        .expect("`parent` should not fail for a canonical file path");
    let permissions = metadata(&target)
        .with_context(|| format!("failed to get metadata of {}", target.display()))?
        .permissions();
    let mut tempfile = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tempfile
        .write_all(contents)
        .with_context(|| format!("failed to write {}", tempfile.path().display()))?;
    set_permissions(tempfile.path(), permissions).with_context(|| {
        format!(
            "failed to set permissions of {}",
            tempfile.path().display()
        )
    })?;
    tempfile
        .persist(&target)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(())
}

/// Looks for a bundle this tool already renamed. Only feeds a hint into `MissingArtifact`, so an
/// unreadable build directory yields `None` rather than an error.
fn find_hashed_bundle(config: &Config) -> Option<String> {
    read_dir(&config.build_dir)
        .ok()?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().to_str().map(ToOwned::to_owned))
        .filter(|name| is_hashed_name(&config.bundle, name))
        .min()
}
