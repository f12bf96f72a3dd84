use anyhow::Result;
use clap::{crate_version, Parser};

mod config;
use config::Config;

mod error;

mod opts;

mod rehash;
use rehash::{rehash, Outcome};

mod util;

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = "Content-hash a Flutter web bundle and patch the files that reference it",
    after_help = "\
Run from the project root after `flutter build web`. The following happens in build/web:

    main.dart.js      is renamed to main.<HASH>.dart.js
    main.dart.js.map  (if present) is renamed to main.<HASH>.dart.js.map

where <HASH> is the first 8 hex digits of the SHA-256 digest of main.dart.js. References to \
main.dart.js in flutter_bootstrap.js, index.html, flutter_service_worker.js, and manifest.json \
are rewritten to the new name. Running twice fails, because main.dart.js no longer exists.
"
)]
#[remain::sorted]
struct Opts {
    #[clap(
        long,
        help = "Show what would be renamed and updated without changing any files; implies \
                --verbose"
    )]
    dry_run: bool,

    #[clap(long, help = "Also report files that were skipped or left unchanged")]
    verbose: bool,
}

fn main() -> Result<()> {
    let config = Config::from_opts(opts::get());

    let outcome = rehash(&config)?;

    if config.verbose {
        summarize(&outcome);
    }

    if config.dry_run {
        println!("Dry run completed; no files were changed.");
    } else {
        println!("Content hashing completed successfully.");
    }

    Ok(())
}

fn summarize(outcome: &Outcome) {
    let Some(bundle) = outcome.renamed.first() else {
        return;
    };
    eprintln!(
        "{} -> {} (hash {}): {} updated, {} unchanged, {} not found",
        bundle.from,
        bundle.to,
        outcome.hash,
        outcome.patched.len(),
        outcome.untouched.len(),
        outcome.skipped.len()
    );
}
