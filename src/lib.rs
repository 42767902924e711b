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

pub mod assembler;
pub mod ast;
pub mod errors;
pub mod file_reader;
pub mod linker;
pub mod object;
pub mod parser;

use std::path::Path;

use anyhow::{Context, Result};
use assembler::report::{self, AssemblyReport};
use assembler::{MachineCode, Resolution};
use errors::AssemblyError;
use file_reader::FileReader;
use object::ObjectModule;

extern crate pest;
extern crate pest_derive;

// The result of one assembly run: the pass-1 tables plus the pass-2
// machine-code streams. Construct a fresh one per run via `assemble`.
#[derive(Debug)]
pub struct Assembly {
    pub resolution: Resolution,
    pub code: MachineCode,
    line_count: usize,
}

/// Runs the full pipeline over one source text: line classification,
/// pass-1 symbol resolution and pass-2 encoding.
pub fn assemble(source: &str) -> Result<Assembly, AssemblyError> {
    let lines = parser::parse_source(source)?;

    let resolution = assembler::resolve_symbols(&lines)?;

    let code = assembler::generate_machine_code(&lines, &resolution)?;

    Ok(Assembly {
        resolution,
        code,
        line_count: source.lines().count(),
    })
}

pub fn assemble_file<F: FileReader>(path: &Path, reader: &F) -> Result<Assembly> {
    let source = reader
        .read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let assembly =
        assemble(&source).with_context(|| format!("Failed to assemble {}", path.display()))?;

    Ok(assembly)
}

impl Assembly {
    /// The relocatable object module for this run.
    pub fn object(&self) -> ObjectModule {
        ObjectModule {
            text: self.code.text.iter().map(|w| w.value).collect(),
            data: self.code.data.iter().map(|w| w.hex()).collect(),
            exports: self
                .resolution
                .exports
                .iter()
                .map(|e| (e.name.clone(), e.address))
                .collect(),
            relocations: self.resolution.relocations.clone(),
        }
    }

    /// The tabular views a host front end displays.
    pub fn report(&self) -> AssemblyReport {
        report::build_report(&self.resolution, &self.code, self.line_count)
    }
}
