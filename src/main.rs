//! Command-line driver that rebases stylesheets one after another.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use css_asset_rebaser::{AssetRebaser, RebaseOptions, SourceFile};
use same_file::is_same_file;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Copy node_modules assets referenced from CSS next to the build output and rewrite the urls.
#[derive(Debug, Parser)]
#[command(name = "css-asset-rebaser", version, about)]
struct Cli {
  /// JSON file with `dest`, `assets` and `marker` options.
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Root directory rewritten stylesheets are written under.
  #[arg(long, value_name = "DIR")]
  dest: Option<String>,

  /// Root directory assets are copied into. Defaults to `--dest`.
  #[arg(long, value_name = "DIR")]
  assets: Option<String>,

  /// Dependency directory name to look for in urls.
  #[arg(long, value_name = "NAME")]
  marker: Option<String>,

  /// Source root the stylesheets' relative paths are computed from.
  #[arg(long, value_name = "DIR", default_value = ".")]
  base: PathBuf,

  /// Continue with the remaining files after a failure.
  #[arg(long)]
  keep_going: bool,

  /// Increase log verbosity (-v for debug, -vv for trace).
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,

  /// Stylesheets to process, in order.
  #[arg(required = true, value_name = "FILES")]
  files: Vec<PathBuf>,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(&cli) {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::FAILURE,
    Err(err) => {
      error!("{err:#}");
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(verbose: u8) {
  let default_level = match verbose {
    0 => "info",
    1 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

/// Process every file; `Ok(false)` means some files failed under `--keep-going`.
fn run(cli: &Cli) -> Result<bool> {
  let options = load_options(cli)?;
  let rebaser = AssetRebaser::new(&options)?;
  let base = fs::canonicalize(&cli.base)
    .with_context(|| format!("failed to resolve base directory {}", cli.base.display()))?;

  let mut rewritten = 0usize;
  let mut copied = 0usize;
  let mut failed = 0usize;

  for path in &cli.files {
    match process_file(&rebaser, path, &base) {
      Ok((modified, assets)) => {
        rewritten += usize::from(modified);
        copied += assets;
      }
      Err(err) if cli.keep_going => {
        error!("{err:#}");
        failed += 1;
      }
      Err(err) => return Err(err),
    }
  }

  info!(
    files = cli.files.len(),
    rewritten,
    assets = copied,
    failed,
    "rebase finished"
  );
  Ok(failed == 0)
}

fn load_options(cli: &Cli) -> Result<RebaseOptions> {
  let from_file = match &cli.config {
    Some(path) => Some(RebaseOptions::from_path(path)?),
    None => RebaseOptions::discover(&cli.base)?,
  };

  let mut options = match (from_file, &cli.dest) {
    (Some(mut options), Some(dest)) => {
      options.dest = dest.clone();
      options
    }
    (Some(options), None) => options,
    (None, Some(dest)) => RebaseOptions::new(dest.clone()),
    (None, None) => anyhow::bail!("a destination is required: pass --dest or a config file"),
  };
  if let Some(assets) = &cli.assets {
    options.assets = Some(assets.clone());
  }
  if let Some(marker) = &cli.marker {
    options.marker = Some(marker.clone());
  }
  Ok(options)
}

fn process_file(rebaser: &AssetRebaser, path: &Path, base: &Path) -> Result<(bool, usize)> {
  let absolute = fs::canonicalize(path).with_context(|| format!("failed to resolve {}", path.display()))?;
  let file = SourceFile::read(&absolute, base).with_context(|| format!("failed to read {}", absolute.display()))?;
  let target = rebaser.config().dest_root().join(&file.relative);
  if target.exists() && is_same_file(&absolute, &target)? {
    anyhow::bail!(
      "refusing to overwrite source {}: the destination resolves to the same file",
      absolute.display()
    );
  }

  let rebased = rebaser.transform(file)?;
  if let Some(parent) = target.parent() {
    fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
  }
  fs::write(&target, &rebased.file.contents).with_context(|| format!("failed to write {}", target.display()))?;

  info!(
    source = %absolute.display(),
    target = %target.display(),
    modified = rebased.modified,
    assets = rebased.copied.len(),
    "processed stylesheet"
  );
  Ok((rebased.modified, rebased.copied.len()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("css-asset-rebaser").chain(args.iter().copied())).unwrap()
  }

  fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
  }

  #[test]
  fn flags_override_the_config_file() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("rebase.config.json");
    write(&config, r#"{ "dest": "from-file", "assets": "file-assets", "marker": "bower_components" }"#);
    let config = config.to_string_lossy().into_owned();

    let options = load_options(&cli(&["--config", &config, "--dest", "out", "a.css"])).unwrap();
    assert_eq!(options.dest, "out");
    assert_eq!(options.assets.as_deref(), Some("file-assets"));
    assert_eq!(options.marker.as_deref(), Some("bower_components"));

    let options = load_options(&cli(&["--config", &config, "--marker", "vendor", "a.css"])).unwrap();
    assert_eq!(options.dest, "from-file");
    assert_eq!(options.marker.as_deref(), Some("vendor"));
  }

  #[test]
  fn discovers_config_in_the_base_directory() {
    let temp = tempdir().unwrap();
    write(&temp.path().join("rebase.config.json"), r#"{ "dest": "dist" }"#);
    let base = temp.path().to_string_lossy().into_owned();

    let options = load_options(&cli(&["--base", &base, "a.css"])).unwrap();
    assert_eq!(options.dest, "dist");
  }

  #[test]
  fn destination_is_required() {
    let temp = tempdir().unwrap();
    let base = temp.path().to_string_lossy().into_owned();

    let err = load_options(&cli(&["--base", &base, "a.css"])).unwrap_err();
    assert!(err.to_string().contains("destination is required"), "{err}");
  }

  #[test]
  fn keep_going_processes_remaining_files() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(&root.join("src/node_modules/pkg/a.png"), "png");
    write(&root.join("src/bad.css"), ".a { background: url(node_modules/pkg/gone.png) }");
    write(&root.join("src/good.css"), ".b { background: url(node_modules/pkg/a.png) }");

    let dest = root.join("build").to_string_lossy().into_owned();
    let base = root.join("src").to_string_lossy().into_owned();
    let bad = root.join("src/bad.css").to_string_lossy().into_owned();
    let good = root.join("src/good.css").to_string_lossy().into_owned();

    let args = ["--dest", dest.as_str(), "--base", base.as_str(), bad.as_str(), good.as_str()];
    assert!(run(&cli(&args)).is_err());
    assert!(!root.join("build/good.css").exists());

    let mut args = args.to_vec();
    args.insert(0, "--keep-going");
    assert!(!run(&cli(&args)).unwrap());
    assert_eq!(
      fs::read_to_string(root.join("build/good.css")).unwrap(),
      ".b { background: url(pkg/a.png) }"
    );
    assert!(!root.join("build/bad.css").exists());
  }

  #[test]
  fn refuses_to_overwrite_sources() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    let contents = ".a { background: url(node_modules/pkg/a.png) }";
    write(&root.join("node_modules/pkg/a.png"), "png");
    write(&root.join("app.css"), contents);

    let dir = root.to_string_lossy().into_owned();
    let file = root.join("app.css").to_string_lossy().into_owned();
    let err = run(&cli(&["--dest", &dir, "--base", &dir, &file])).unwrap_err();

    assert!(err.to_string().contains("refusing to overwrite"), "{err}");
    assert_eq!(fs::read_to_string(root.join("app.css")).unwrap(), contents);
    assert!(!root.join("pkg").exists());
  }
}
