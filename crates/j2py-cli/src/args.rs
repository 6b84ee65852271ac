use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the j2py binary.
#[derive(Parser, Debug)]
#[command(
    name = "j2py",
    version,
    about = "Render a translator event stream as Python source"
)]
pub struct CliArgs {
    /// JSON event stream. Reads stdin when absent or `-`.
    pub input: Option<PathBuf>,

    /// Configuration layer file, applied above the defaults. Repeatable;
    /// later files override earlier ones.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Vec<PathBuf>,

    /// Start from an empty configuration instead of the built-in defaults.
    #[arg(long = "no-defaults", alias = "noDefaults")]
    pub no_defaults: bool,

    /// Write the program to this file instead of stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the template tree instead of the program.
    #[arg(long = "dump-tree", alias = "dumpTree")]
    pub dump_tree: bool,
}

impl CliArgs {
    /// The input path, or `None` for stdin.
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input
            .as_ref()
            .filter(|path| path.as_os_str() != "-")
    }
}

#[cfg(test)]
#[path = "../tests/args_tests.rs"]
mod args_tests;
