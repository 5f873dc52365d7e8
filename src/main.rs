use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use goreify::{specialize, SpecializeOptions, TypeMapping};
use tracing::{debug, info};

const MAPPING_HELP: &str = "\
Type mapping is in the following format:
  {generic1}={concrete1},[{generic2}={concrete2}]
where concrete can be one of the following:
  ConcreteType
        concrete type in the same package
  pkg/pkg/pkg.ConcreteType
        concrete type in a different package
  (\"pkg/pkg/go-pkg\")pkg.ConcreteType
        concrete type in a different package, package name
        doesn't match directory name
Prefix a concrete type with * to use a pointer to it.";

/// Generates concrete code from generic code.
#[derive(Parser)]
#[command(name = "reify", version, about, after_help = MAPPING_HELP)]
struct Cli {
    /// Source file with generic types
    #[arg(long = "in", value_name = "SOURCE")]
    input: PathBuf,

    /// File to save output to instead of stdout
    #[arg(long, value_name = "DEST")]
    out: Option<PathBuf>,

    /// Package name of the generated file
    #[arg(long, value_name = "NAME")]
    package: Option<String>,

    /// Start the output with a "Code generated" comment
    #[arg(long)]
    header: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Type mapping, e.g. "T=int64" or "Reader=*os.File"
    mapping: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    InvalidArgs = 1,
    InvalidTypeMapping = 2,
    DestFileFailed = 3,
    SourceFileInvalid = 4,
    GenFailed = 5,
}

struct Failure {
    exit: Exit,
    error: anyhow::Error,
}

trait ExitWith<T> {
    fn exit_with(self, exit: Exit) -> Result<T, Failure>;
}

impl<T, E: Into<anyhow::Error>> ExitWith<T> for Result<T, E> {
    fn exit_with(self, exit: Exit) -> Result<T, Failure> {
        self.map_err(|e| Failure {
            exit,
            error: e.into(),
        })
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(Exit::InvalidArgs as u8)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure { exit, error }) => {
            eprintln!("reify: {error:#}");
            ExitCode::from(exit as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let mapping = TypeMapping::parse(&cli.mapping).exit_with(Exit::InvalidTypeMapping)?;
    debug!(entries = mapping.len(), "parsed type mapping");

    let src = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))
        .exit_with(Exit::SourceFileInvalid)?;

    let package_name = match (&cli.package, &cli.out) {
        (Some(name), _) => Some(name.clone()),
        (None, Some(out)) => package_for_output(&cli.input, out).exit_with(Exit::InvalidArgs)?,
        (None, None) => None,
    };
    let options = SpecializeOptions {
        package_name,
        header: cli.header,
    };

    let filename = cli.input.to_string_lossy();
    let output = specialize(&src, &filename, &mapping, &options).exit_with(Exit::GenFailed)?;

    match &cli.out {
        Some(out) => {
            write_output(out, &output).exit_with(Exit::DestFileFailed)?;
            info!(out = %out.display(), bytes = output.len(), "wrote output");
        }
        None => io::stdout()
            .lock()
            .write_all(output.as_bytes())
            .context("writing to stdout")
            .exit_with(Exit::GenFailed)?,
    }
    Ok(())
}

fn write_output(out: &Path, text: &str) -> Result<()> {
    let dir = dir_of(out);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    fs::write(out, text).with_context(|| format!("writing {}", out.display()))
}

/// Package name for output written to `out`: the base name of its directory
/// when that differs from the input's directory.
fn package_for_output(input: &Path, out: &Path) -> Result<Option<String>> {
    let cwd = std::env::current_dir().context("resolving the working directory")?;
    let in_dir = normalize(&cwd.join(dir_of(input)));
    let out_dir = normalize(&cwd.join(dir_of(out)));
    if in_dir == out_dir {
        return Ok(None);
    }
    Ok(out_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned()))
}

fn dir_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Drops `.` and resolves `..` lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "reify", "--in", "a/t.go", "--out", "b/t.go", "-vv", "T=int",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("a/t.go"));
        assert_eq!(cli.out.as_deref(), Some(Path::new("b/t.go")));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.mapping, "T=int");
        assert!(Cli::try_parse_from(["reify", "T=int"]).is_err());
        assert!(Cli::try_parse_from(["reify", "--in", "t.go"]).is_err());
    }

    #[test]
    fn output_package_follows_the_directory() {
        let pkg = |input: &str, out: &str| {
            package_for_output(Path::new(input), Path::new(out)).unwrap()
        };
        assert_eq!(pkg("gen.go", "out.go"), None);
        assert_eq!(pkg("src/gen.go", "./src/out.go"), None);
        assert_eq!(pkg("src/gen.go", "src/../src/out.go"), None);
        assert_eq!(pkg("src/gen.go", "intset/set.go"), Some("intset".to_owned()));
        assert_eq!(pkg("gen.go", "a/b/stringset/set.go"), Some("stringset".to_owned()));
    }

    #[test]
    fn paths_normalize_lexically() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(dir_of(Path::new("x.go")), PathBuf::from("."));
    }
}
