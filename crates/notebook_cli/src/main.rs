//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `notebook_core` linkage.
//! - Attach the working directory as a root and print its first level.

use notebook_core::{NodeKind, Notebook, NotebookConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("notebook_core version={}", notebook_core::core_version());

    let root = match Notebook::open_local(NotebookConfig::default())
        .and_then(|mut notebook| notebook.on_root_folder_chosen("."))
    {
        Ok(view) => view,
        Err(err) => {
            eprintln!("notebook_core error_code={} error={err}", err.code());
            return ExitCode::FAILURE;
        }
    };

    println!("{}", root.path.display());
    for child in &root.children {
        let marker = match child.kind {
            NodeKind::Folder => "+",
            NodeKind::Note => "-",
        };
        println!("  {marker} {}", child.name);
    }
    ExitCode::SUCCESS
}
