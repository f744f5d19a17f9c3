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

#[macro_use]
extern crate log;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use colored::Colorize;
use ignore::WalkBuilder;
use simplelog::{Config as LogConfig, SimpleLogger};

use scry::ast::PythonAstProvider;
use scry::cli::{self, Args, OutputFormat};
use scry::format::{GrepFormatter, JsonFormatter, OutputFormatter};
use scry::query;
use scry::search;

fn main() {
    reset_signal_pipe_handler();

    let args = cli::parse_arguments();
    let _ = SimpleLogger::init(args.log_level.into(), LogConfig::default());

    let query = match query::parse(&args.query) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let files = collect_files(&args);
    info!("searching {} files", files.len());
    if files.is_empty() {
        warn!("no files matched the given paths/extensions; nothing to search");
    }

    let provider = PythonAstProvider;
    let matches = search::search(&provider, files, &query, args.aggressive_search);

    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut formatter: Box<dyn OutputFormatter> = match args.output_format {
        OutputFormat::Grep => Box::<GrepFormatter>::default(),
        OutputFormat::Json => Box::<JsonFormatter>::default(),
    };

    for m in matches {
        let m = match m {
            Ok(m) => m,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        };
        let rel = scry::result::relative_path(&m.path, &base);
        formatter.push(&m, &rel.display().to_string());
    }

    println!("{}", formatter.finish());
}

/// Resolve `args.paths` into a concrete, extension- and regex-filtered
/// file list. A single `-` path switches to reading a newline-separated
/// file list from stdin, matching spec's file-list discovery mode.
fn collect_files(args: &Args) -> Vec<PathBuf> {
    if args.paths.iter().any(|p| p.to_string_lossy() == "-") {
        return std::io::stdin()
            .lock()
            .lines()
            .filter_map(|l| l.ok())
            .map(PathBuf::from)
            .collect();
    }

    let include = compile_regexes(&args.include);
    let exclude = compile_regexes(&args.exclude);

    let mut files = Vec::new();
    for root in &args.paths {
        let mut builder = WalkBuilder::new(root);
        builder.git_ignore(!args.no_git).git_exclude(!args.no_git).hidden(true);
        for entry in builder.build() {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.into_path();
            if !has_matching_extension(&path, &args.extensions) {
                continue;
            }
            let path_str = path.to_string_lossy();
            if exclude.iter().any(|r| r.is_match(&path_str)) {
                continue;
            }
            if !include.is_empty() && !include.iter().any(|r| r.is_match(&path_str)) {
                continue;
            }
            files.push(path);
        }
    }
    files
}

fn has_matching_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|want| want == e))
        .unwrap_or(false)
}

fn compile_regexes(patterns: &[String]) -> Vec<regex::Regex> {
    patterns
        .iter()
        .filter_map(|p| match regex::Regex::new(p) {
            Ok(r) => Some(r),
            Err(e) => {
                eprintln!("{} invalid regex '{}': {}", "error:".red().bold(), p, e);
                std::process::exit(1);
            }
        })
        .collect()
}

// Exit on SIGPIPE instead of panicking, so `scry ... | head` behaves like
// any other Unix filter.
// see https://github.com/rust-lang/rust/issues/46016#issuecomment-605624865
fn reset_signal_pipe_handler() {
    #[cfg(target_family = "unix")]
    {
        use nix::sys::signal;

        unsafe {
            let _ = signal::signal(signal::Signal::SIGPIPE, signal::SigHandler::SigDfl)
                .map_err(|e| eprintln!("{}", e));
        }
    }
}
