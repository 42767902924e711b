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
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub section: SectionId,
    pub address: u16,
}

// The symbol table stores label names and their pass-1 addresses. A label
// is unique across the whole module, never per section.
pub type SymbolTable = HashMap<String, Symbol>;

// One (symbol, source line) pair noted while scanning operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub symbol: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub start: u16,
    pub size: u32,
    pub symbols: Vec<(String, u16)>,
    pub references: Vec<Reference>,
    // Running location counter; frozen once pass 1 completes.
    pub location: u16,
}

impl Section {
    fn new(id: SectionId) -> Self {
        Section {
            id,
            start: id.base(),
            size: 0,
            symbols: Vec::new(),
            references: Vec::new(),
            location: id.base(),
        }
    }

    pub fn advance(&mut self, bytes: u32) {
        self.location = self.location.wrapping_add(bytes as u16);
        self.size += bytes;
    }
}

// Sections in first-encounter order. `.text` always exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionTable {
    sections: Vec<Section>,
}

impl SectionTable {
    // Switch into a section: created at its base address on first
    // encounter, resumed at its last location afterwards.
    pub fn enter(&mut self, id: SectionId) -> &mut Section {
        if let Some(idx) = self.sections.iter().position(|s| s.id == id) {
            return &mut self.sections[idx];
        }
        self.sections.push(Section::new(id));
        self.sections.last_mut().unwrap()
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }
}

// A symbol made visible to other modules via `.def`. The address stays
// `None` until (unless) the matching label turns up.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: String,
    pub address: Option<u16>,
}

// A name pulled in from another module via `.ref`, with the source lines
// that mention it.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub name: String,
    pub lines: Vec<usize>,
}

// Instructs the linker to patch the text word at `offset` (the 0-based
// ordinal of the instruction within this module) with the resolved address
// of `symbol`.
#[derive(Debug, Clone, PartialEq)]
pub struct Relocation {
    pub symbol: String,
    pub section: SectionId,
    pub offset: u16,
}
