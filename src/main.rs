/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use anyhow::{Context, Result};
use clap::Parser as clap_parser;
use clap::Subcommand;
use mspasm::file_reader::AsmFileReader;
use mspasm::linker::LinkEditor;
use std::fs;
use std::path::PathBuf;

#[derive(clap_parser)]
#[clap(version = "0.1.0", author = "Connor Nolan")]
struct Opts {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble one source file into a relocatable object module
    Assemble {
        input: PathBuf,
        #[clap(short, long)]
        output: PathBuf,
        /// Also dump the symbol/section/export/import tables and the
        /// per-line listing as JSON
        #[clap(long)]
        tables: Option<PathBuf>,
    },
    /// Link every object module in a directory into one executable object
    Link {
        dir: PathBuf,
        #[clap(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let opts: Opts = Opts::parse();
    let reader = AsmFileReader;

    match &opts.command {
        Commands::Assemble {
            input,
            output,
            tables,
        } => {
            let assembly = mspasm::assemble_file(input, &reader)?;

            fs::write(output, assembly.object().render())
                .with_context(|| format!("Failed to write object file: {}", output.display()))?;

            if let Some(tables_path) = tables {
                let report = assembly.report();
                fs::write(tables_path, serde_json::to_string_pretty(&report)?)
                    .with_context(|| {
                        format!("Failed to write tables file: {}", tables_path.display())
                    })?;
            }

            println!(
                "Successfully assembled {} to {}",
                input.display(),
                output.display()
            );
        }
        Commands::Link { dir, output } => {
            let mut editor = LinkEditor::load_dir(dir, &reader)?;
            editor.link()?;

            fs::write(output, editor.render())
                .with_context(|| format!("Failed to write linked file: {}", output.display()))?;

            println!(
                "Successfully linked {} to {}",
                dir.display(),
                output.display()
            );
        }
    }

    Ok(())
}
