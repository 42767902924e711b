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

use super::{MachineCode, Resolution};
use serde::Serialize;

// Tabular views for a host front end, one row type per table.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolRow {
    pub label: String,
    pub section: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRow {
    pub section: String,
    pub start: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub symbol: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRow {
    pub symbol: String,
    // Imports are never resolved at assembly time.
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyReport {
    pub symbols: Vec<SymbolRow>,
    pub sections: Vec<SectionRow>,
    pub exports: Vec<ExportRow>,
    pub imports: Vec<ImportRow>,
    /// One entry per source line: empty, or `<binary> -> 0x<hex>` built
    /// from the words that line produced.
    pub listing: Vec<String>,
}

pub fn build_report(
    resolution: &Resolution,
    code: &MachineCode,
    line_count: usize,
) -> AssemblyReport {
    let symbols = resolution
        .sections
        .iter()
        .flat_map(|section| {
            section.symbols.iter().map(|(label, address)| SymbolRow {
                label: label.clone(),
                section: section.id.name().to_string(),
                address: format!("0x{:04X}", address),
            })
        })
        .collect();

    let sections = resolution
        .sections
        .iter()
        .map(|section| SectionRow {
            section: section.id.name().to_string(),
            start: format!("0x{:04X}", section.start),
            size: section.size,
        })
        .collect();

    let exports = resolution
        .exports
        .iter()
        .map(|export| ExportRow {
            symbol: export.name.clone(),
            address: export.address.map(|a| format!("0x{:04X}", a)),
        })
        .collect();

    let imports = resolution
        .imports
        .iter()
        .map(|import| ImportRow {
            symbol: import.name.clone(),
            address: "-".to_string(),
        })
        .collect();

    let mut listing = vec![String::new(); line_count];
    for line_code in &code.line_codes {
        if line_code.words.is_empty() {
            continue;
        }
        let bits: String = line_code.words.iter().map(|w| w.bits()).collect();
        let hex: String = line_code.words.iter().map(|w| w.hex_digits()).collect();
        if let Some(entry) = listing.get_mut(line_code.line_number - 1) {
            *entry = format!("{} -> 0x{}", bits, hex);
        }
    }

    AssemblyReport {
        symbols,
        sections,
        exports,
        imports,
        listing,
    }
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use crate::parser::parse_source;

    fn report(source: &str) -> super::AssemblyReport {
        let lines = parse_source(source).unwrap();
        let resolution = crate::assembler::resolve_symbols(&lines).unwrap();
        let code = crate::assembler::generate_machine_code(&lines, &resolution).unwrap();
        super::build_report(&resolution, &code, source.lines().count())
    }

    #[test]
    fn test_listing_lines_up_with_the_source() {
        let r = report("; header\n.text\nMOV R5, R4\n");
        assert_eq!(r.listing.len(), 3);
        assert_eq!(r.listing[0], "");
        assert_eq!(r.listing[1], "");
        assert_eq!(r.listing[2], "0100010101000100 -> 0x4544");
    }

    #[test]
    fn test_immediate_line_concatenates_its_words() {
        let r = report(".text\nMOV.W #0x1234, R4\n");
        assert_eq!(
            r.listing[1],
            "01000011011101000001001000110100 -> 0x43741234"
        );
    }

    #[test]
    fn test_symbol_and_section_rows() {
        let r = report(".data\nval1: .word 0x1234\n.text\nstart: NOP\n");
        assert_eq!(r.symbols.len(), 2);
        assert_eq!(r.symbols[0].label, "start");
        assert_eq!(r.symbols[0].section, ".text");
        assert_eq!(r.symbols[0].address, "0x0000");
        assert_eq!(r.symbols[1].label, "val1");
        assert_eq!(r.symbols[1].address, "0xC000");

        assert_eq!(r.sections[0].section, ".text");
        assert_eq!(r.sections[0].start, "0x0000");
        assert_eq!(r.sections[0].size, 2);
        assert_eq!(r.sections[1].section, ".data");
        assert_eq!(r.sections[1].size, 2);
    }

    #[test]
    fn test_export_and_import_rows() {
        let r = report(".def start, gone\n.ref ext\n.text\nstart: CALL ext\n");
        assert_eq!(r.exports.len(), 2);
        assert_eq!(r.exports[0].address.as_deref(), Some("0x0000"));
        assert_eq!(r.exports[1].address, None);
        assert_eq!(r.imports.len(), 1);
        assert_eq!(r.imports[0].symbol, "ext");
        assert_eq!(r.imports[0].address, "-");
    }

    #[test]
    fn test_report_serializes_to_json() {
        let r = report(".text\nNOP\n");
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"listing\""));
        assert!(json.contains("0x0000"));
    }
}
