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

use crate::ast::SectionId;
use crate::errors::LinkError;
use crate::file_reader::FileReader;
use crate::object::{self, LINKED_MAGIC, OBJECT_EXTENSION, ObjectModule};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

// One loaded object module plus its placement in the merged image. The
// base indices count machine words, not bytes.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub object: ObjectModule,
    pub txt_base_idx: usize,
    pub dat_base_idx: usize,
}

// Combines object modules into a single linked image, resolving imports
// against the merged export table. One instance per link run.
pub struct LinkEditor {
    modules: Vec<Module>,
    exports: HashMap<String, u16>,
    text: Vec<u16>,
    data: Vec<String>,
}

impl LinkEditor {
    /// Loads every `*.obj` file directly inside `dir`, in file-name order.
    /// A missing directory yields an empty link.
    pub fn load_dir<F: FileReader>(dir: &Path, reader: &F) -> Result<LinkEditor> {
        let mut paths: Vec<PathBuf> = reader
            .list_dir(dir)?
            .into_iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(OBJECT_EXTENSION))
            .collect();
        paths.sort();

        let mut modules = Vec::new();
        for path in paths {
            let source = reader
                .read_to_string(&path)
                .with_context(|| format!("Failed to read object file {}", path.display()))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let object =
                ObjectModule::parse(&source).map_err(|source| LinkError::MalformedObject {
                    file: name.clone(),
                    source,
                })?;
            modules.push((name, object));
        }
        Ok(Self::from_modules(modules)?)
    }

    /// Builds the merged export table. Every export must carry a resolved
    /// address and a name may be exported by at most one module.
    pub fn from_modules(modules: Vec<(String, ObjectModule)>) -> Result<LinkEditor, LinkError> {
        let mut exports = HashMap::new();
        for (_, object) in &modules {
            for (symbol, address) in &object.exports {
                let address =
                    address.ok_or_else(|| LinkError::UndefinedExport(symbol.clone()))?;
                if exports.contains_key(symbol) {
                    return Err(LinkError::DuplicateExport(symbol.clone()));
                }
                exports.insert(symbol.clone(), address);
            }
        }

        let modules = modules
            .into_iter()
            .map(|(name, object)| Module {
                name,
                object,
                txt_base_idx: 0,
                dat_base_idx: 0,
            })
            .collect();

        Ok(LinkEditor {
            modules,
            exports,
            text: Vec::new(),
            data: Vec::new(),
        })
    }

    /// Concatenates the module segments and patches every `.text`
    /// relocation site with the low byte of the resolved symbol address.
    pub fn link(&mut self) -> Result<(), LinkError> {
        let mut txt_base_idx = 0;
        let mut dat_base_idx = 0;
        for module in &mut self.modules {
            module.txt_base_idx = txt_base_idx;
            module.dat_base_idx = dat_base_idx;
            txt_base_idx += module.object.text.len();
            dat_base_idx += module.object.data.len();
        }

        for module in &self.modules {
            self.text.extend(&module.object.text);
            self.data.extend(module.object.data.iter().cloned());
        }

        for module in &self.modules {
            for reloc in &module.object.relocations {
                if reloc.section != SectionId::Text {
                    continue;
                }
                let address = *self
                    .exports
                    .get(&reloc.symbol)
                    .ok_or_else(|| LinkError::UnresolvedExtern(reloc.symbol.clone()))?;
                let index = module.txt_base_idx + reloc.offset as usize;
                let word =
                    self.text
                        .get_mut(index)
                        .ok_or_else(|| LinkError::RelocationOutOfRange {
                            module: module.name.clone(),
                            symbol: reloc.symbol.clone(),
                        })?;
                // Low byte takes the resolved address, the opcode bits in
                // the high byte stay untouched.
                *word = (*word & 0xFF00) | (address & 0x00FF);
            }
        }

        Ok(())
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn text(&self) -> &[u16] {
        &self.text
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(LINKED_MAGIC);
        out.push('\n');
        out.push_str("SECTION .text\n");
        for word in &self.text {
            let _ = writeln!(out, "0x{:04X}", word);
        }
        out.push_str("SECTION .data\n");
        for line in &self.data {
            // Legacy bit-string data lines become hex; everything else
            // passes through unchanged.
            match object::bit_string_value(line) {
                Some(value) => {
                    let _ = writeln!(out, "0x{:0width$X}", value, width = line.len() / 4);
                }
                None => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out.push_str("EOF\n");
        out
    }
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Relocation;
    use crate::file_reader::MockFileReader;

    fn defining_module() -> ObjectModule {
        ObjectModule {
            text: vec![0x0000],
            data: vec![],
            exports: vec![("foo".to_string(), Some(0x0000))],
            relocations: vec![],
        }
    }

    fn calling_module() -> ObjectModule {
        ObjectModule {
            text: vec![0x12C0],
            data: vec![],
            exports: vec![],
            relocations: vec![Relocation {
                symbol: "foo".to_string(),
                section: SectionId::Text,
                offset: 0,
            }],
        }
    }

    #[test]
    fn test_call_site_is_patched_across_modules() {
        let mut editor = LinkEditor::from_modules(vec![
            ("a.obj".to_string(), defining_module()),
            ("b.obj".to_string(), calling_module()),
        ])
        .unwrap();
        editor.link().unwrap();
        // Low byte of foo's address, high byte of the CALL word untouched.
        assert_eq!(editor.text(), &[0x0000, 0x1200]);
        assert_eq!(editor.modules()[1].txt_base_idx, 1);
    }

    #[test]
    fn test_patch_preserves_high_byte() {
        let defining = ObjectModule {
            text: vec![0x0000, 0x0000, 0x0000],
            exports: vec![("far".to_string(), Some(0xC0AB))],
            ..ObjectModule::default()
        };
        let calling = ObjectModule {
            text: vec![0x12C0],
            relocations: vec![Relocation {
                symbol: "far".to_string(),
                section: SectionId::Text,
                offset: 0,
            }],
            ..ObjectModule::default()
        };
        let mut editor = LinkEditor::from_modules(vec![
            ("a.obj".to_string(), defining),
            ("b.obj".to_string(), calling),
        ])
        .unwrap();
        editor.link().unwrap();
        assert_eq!(editor.text()[3], 0x12AB);
    }

    #[test]
    fn test_duplicate_export_is_rejected() {
        let result = LinkEditor::from_modules(vec![
            ("a.obj".to_string(), defining_module()),
            ("b.obj".to_string(), defining_module()),
        ]);
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("Duplicate export foo".to_string())
        );
    }

    #[test]
    fn test_unresolved_export_is_rejected() {
        let module = ObjectModule {
            exports: vec![("gone".to_string(), None)],
            ..ObjectModule::default()
        };
        let result = LinkEditor::from_modules(vec![("a.obj".to_string(), module)]);
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("Undefined exported symbol gone".to_string())
        );
    }

    #[test]
    fn test_unresolved_extern_fails_the_link() {
        let mut editor =
            LinkEditor::from_modules(vec![("b.obj".to_string(), calling_module())]).unwrap();
        let result = editor.link();
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("Unresolved extern: foo".to_string())
        );
    }

    #[test]
    fn test_out_of_range_relocation_fails_the_link() {
        let module = ObjectModule {
            text: vec![0x12C0],
            exports: vec![("foo".to_string(), Some(0x0000))],
            relocations: vec![Relocation {
                symbol: "foo".to_string(),
                section: SectionId::Text,
                offset: 9,
            }],
            ..ObjectModule::default()
        };
        let mut editor =
            LinkEditor::from_modules(vec![("a.obj".to_string(), module)]).unwrap();
        assert!(matches!(
            editor.link(),
            Err(LinkError::RelocationOutOfRange { .. })
        ));
    }

    #[test]
    fn test_missing_directory_links_empty() {
        let reader = MockFileReader::default();
        let mut editor = LinkEditor::load_dir(Path::new("no_such_dir"), &reader).unwrap();
        editor.link().unwrap();
        assert_eq!(
            editor.render(),
            "COFF_LINKED EXECUTABLE FILE\nSECTION .text\nSECTION .data\nEOF\n"
        );
    }

    #[test]
    fn test_modules_load_in_file_name_order() {
        let mut reader = MockFileReader::default();
        reader.add_file("objs/b.obj", &calling_module().render());
        reader.add_file("objs/a.obj", &defining_module().render());
        reader.add_file("objs/notes.txt", "not an object");
        let mut editor = LinkEditor::load_dir(Path::new("objs"), &reader).unwrap();
        editor.link().unwrap();
        assert_eq!(editor.modules().len(), 2);
        assert_eq!(editor.modules()[0].name, "a.obj");
        assert_eq!(editor.text(), &[0x0000, 0x1200]);
    }

    #[test]
    fn test_render_converts_bit_string_data() {
        let module = ObjectModule {
            data: vec!["0001001000110100".to_string(), "0x0A".to_string()],
            ..ObjectModule::default()
        };
        let mut editor =
            LinkEditor::from_modules(vec![("a.obj".to_string(), module)]).unwrap();
        editor.link().unwrap();
        assert_eq!(
            editor.render(),
            "COFF_LINKED EXECUTABLE FILE\nSECTION .text\nSECTION .data\n0x1234\n0x0A\nEOF\n"
        );
    }

    #[test]
    fn test_malformed_object_names_the_file() {
        let mut reader = MockFileReader::default();
        reader.add_file("objs/bad.obj", "not a COFF module\n");
        let result = LinkEditor::load_dir(Path::new("objs"), &reader);
        let message = format!("{:#}", result.err().unwrap());
        assert!(message.contains("bad.obj"));
    }
}
