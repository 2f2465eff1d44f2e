use std::io::{self, Write};

use serde::Serialize;

use crate::formats::Dataset;
use crate::hierarchy::HierarchyNode;
use crate::loader::LoadNotifier;
use crate::tree::TreeNode;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_dataset(dataset: &Dataset) -> io::Result<()> {
        match dataset {
            Dataset::Text(text) => {
                let mut stdout = io::stdout();
                stdout.write_all(text.as_bytes())?;
                if !text.ends_with('\n') {
                    stdout.write_all(b"\n")?;
                }
                Ok(())
            }
            other => Self::print_json(other),
        }
    }

    pub fn print_tree(tree: &[TreeNode]) -> io::Result<()> {
        Self::print_json(tree)
    }

    pub fn print_hierarchy(hierarchy: &HierarchyNode) -> io::Result<()> {
        Self::print_json(hierarchy)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct StderrNotifier;

impl LoadNotifier for StderrNotifier {
    fn on_begin_load(&self) {
        eprintln!("loading...");
    }

    fn on_end_load(&self) {}

    fn on_error(&self, message: &str) {
        eprintln!("API error: {message}");
    }
}
