/*
Copyright 2021 Google LLC

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

     https://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "scry",
    version,
    author = "Adrian Voss <adrian@scry.dev>",
    about = help::ABOUT,
    long_about = help::ABOUT
)]
pub struct Args {
    /// The search query, e.g. `fn:name == "handle"`.
    #[arg(help = help::QUERY)]
    pub query: String,

    /// Files or directories to search. Pass `-` to read a newline-separated
    /// file list from stdin instead of walking the filesystem.
    #[arg(help = help::PATHS, default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// File extensions to include in the search.
    #[arg(long, short = 'e', num_args = 1.., default_value = "py")]
    pub extensions: Vec<String>,

    /// Only search files whose path matches one of these regexes.
    #[arg(long, num_args = 1..)]
    pub include: Vec<String>,

    /// Exclude files whose path matches one of these regexes.
    #[arg(long, num_args = 1..)]
    pub exclude: Vec<String>,

    /// Don't respect .gitignore files when walking directories.
    #[arg(long)]
    pub no_git: bool,

    /// Keep narrowing on a failed assertion instead of discarding the
    /// whole expression (widens results at the cost of precision).
    #[arg(long, help = help::AGGRESSIVE)]
    pub aggressive_search: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Grep)]
    pub output_format: OutputFormat,

    #[arg(long, value_enum, default_value_t = LogLevel::Warning)]
    pub log_level: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Grep,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    None,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> LevelFilter {
        match level {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Critical => LevelFilter::Error,
            LogLevel::None => LevelFilter::Off,
        }
    }
}

pub fn parse_arguments() -> Args {
    Args::parse()
}

mod help {
    pub const ABOUT: &str = "\
scry is a semantic grep for source code. It matches structural queries
written in a small DSL against AST nodes instead of text lines.

Use --help for the full query language reference.

Example: scry 'fn:argcount in {2,3}' src/";

    pub const QUERY: &str = "\
A scry query: one or more comma-joined assertions, optionally joined by
semicolons for union. Examples:

  fn:name == \"handle\"
  fn:argcount in {2,3}
  cls:parent == \"Base\"
  fn:name == \"handle\", fn:argcount == 2
  fn:name == \"a\"; fn:name == \"b\"

Within one comma-joined expression assertions narrow the result set
(intersection). Semicolon-joined expressions are unioned together.";

    pub const PATHS: &str = "\
Files or directories to search. Directories are walked recursively,
honoring .gitignore unless --no-git is set. Pass '-' to read a
newline-separated list of file paths from stdin instead.";

    pub const AGGRESSIVE: &str = "\
By default, an assertion with zero matches discards the rest of its
expression immediately (each comma is an intersection, so a failed step
can never contribute nodes). With this flag a failed step contributes an
empty set instead and evaluation continues with later assertions treated
against that empty set.";
}
