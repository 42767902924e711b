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

mod encoder;
pub mod report;
mod symbol_table;

pub use encoder::{EncodedWord, Width};
pub use symbol_table::*;

use crate::ast::{Directive, Instruction, Mnemonic, Operand, Register, SectionId, SourceLine, Value};
use crate::errors::AssemblyError;
use encoder::Encoder;

// Everything pass 1 learns about a module. Frozen before pass 2 runs;
// pass-2 output is a pure function of these tables and the line sequence.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub symbols: SymbolTable,
    pub sections: SectionTable,
    pub exports: Vec<Export>,
    pub imports: Vec<Import>,
    pub relocations: Vec<Relocation>,
    /// Address of the k-th `.text` instruction.
    pub text_addresses: Vec<u16>,
}

/// Pass 1: walk the classified lines, maintaining a current section and its
/// location counter, and collect the symbol, section, export, import and
/// relocation tables.
pub fn resolve_symbols(lines: &[SourceLine]) -> Result<Resolution, AssemblyError> {
    let mut resolution = Resolution::default();
    let mut current = SectionId::Text;
    resolution.sections.enter(current);

    for line in lines {
        // A label takes the current location, before the rest of the line
        // contributes any bytes.
        if let Some(label) = &line.label {
            if resolution.symbols.contains_key(label) {
                return Err(AssemblyError::SemanticError {
                    line: line.line_number,
                    reason: format!("Label '{}' redefined", label),
                });
            }
            let section = resolution.sections.enter(current);
            let address = section.location;
            section.symbols.push((label.clone(), address));
            resolution.symbols.insert(
                label.clone(),
                Symbol {
                    section: current,
                    address,
                },
            );
        }

        if let Some(directive) = &line.directive {
            match directive {
                Directive::Section(id) => {
                    current = *id;
                    resolution.sections.enter(current);
                }
                Directive::Org(address) => {
                    resolution.sections.enter(current).location = *address;
                }
                Directive::Def(names) => {
                    for name in names {
                        if !resolution.exports.iter().any(|e| e.name == *name) {
                            resolution.exports.push(Export {
                                name: name.clone(),
                                address: None,
                            });
                        }
                    }
                }
                Directive::Ref(names) => {
                    for name in names {
                        if !resolution.imports.iter().any(|i| i.name == *name) {
                            resolution.imports.push(Import {
                                name: name.clone(),
                                lines: Vec::new(),
                            });
                        }
                    }
                }
                Directive::Word(values) => {
                    note_data_references(&mut resolution, current, values, line.line_number);
                    resolution
                        .sections
                        .enter(current)
                        .advance(2 * values.len() as u32);
                }
                Directive::Byte(values) => {
                    note_data_references(&mut resolution, current, values, line.line_number);
                    resolution
                        .sections
                        .enter(current)
                        .advance(values.len() as u32);
                }
                // `.space N` reserves N zero-initialized words.
                Directive::Space(count) => {
                    resolution
                        .sections
                        .enter(current)
                        .advance(2 * *count as u32);
                }
            }
        }

        if let Some(instruction) = &line.instruction {
            if current == SectionId::Text {
                note_instruction(&mut resolution, instruction, line.line_number);
            }
            let size = instruction_size(instruction);
            resolution.sections.enter(current).advance(size);
        }
    }

    // Resolve export addresses; names without a matching label stay
    // unresolved and are rejected by the linker.
    for export in &mut resolution.exports {
        export.address = resolution.symbols.get(&export.name).map(|s| s.address);
    }

    Ok(resolution)
}

// An instruction occupies two bytes, four when an immediate, absolute or
// indexed operand is present.
fn instruction_size(instruction: &Instruction) -> u32 {
    let extended = instruction.operands.iter().any(|op| {
        matches!(
            op,
            Operand::Immediate(_) | Operand::Absolute(_) | Operand::Indexed(_, _)
        )
    });
    if extended { 4 } else { 2 }
}

fn note_instruction(resolution: &mut Resolution, instruction: &Instruction, line: usize) {
    let ordinal = resolution.text_addresses.len() as u16;
    let address = resolution.sections.enter(SectionId::Text).location;
    resolution.text_addresses.push(address);

    // One relocation per imported name mentioned by the instruction.
    let mut mentioned: Vec<&str> = Vec::new();
    for operand in &instruction.operands {
        if let Some(name) = operand_symbol(operand) {
            if !mentioned.contains(&name) {
                mentioned.push(name);
            }
        }
    }
    for name in mentioned {
        if let Some(import) = resolution.imports.iter_mut().find(|i| i.name == name) {
            import.lines.push(line);
            resolution.relocations.push(Relocation {
                symbol: name.to_string(),
                section: SectionId::Text,
                offset: ordinal,
            });
        }
    }

    // Bare identifier operands that are neither registers nor mnemonics
    // are noted as references of the owning section.
    for operand in &instruction.operands {
        if let Operand::Symbol(name) = operand {
            if Register::from_name(name).is_none() && Mnemonic::lookup(name).is_none() {
                resolution
                    .sections
                    .enter(SectionId::Text)
                    .references
                    .push(Reference {
                        symbol: name.clone(),
                        line,
                    });
            }
        }
    }
}

fn operand_symbol(operand: &Operand) -> Option<&str> {
    match operand {
        Operand::Symbol(name) => Some(name),
        Operand::Immediate(Value::Symbol(name)) => Some(name),
        Operand::Absolute(Value::Symbol(name)) => Some(name),
        Operand::Indexed(Value::Symbol(name), _) => Some(name),
        _ => None,
    }
}

fn note_data_references(
    resolution: &mut Resolution,
    current: SectionId,
    values: &[Value],
    line: usize,
) {
    for value in values {
        if let Value::Symbol(name) = value {
            if Register::from_name(name).is_some() {
                continue;
            }
            resolution.sections.enter(current).references.push(Reference {
                symbol: name.clone(),
                line,
            });
            if let Some(import) = resolution.imports.iter_mut().find(|i| i.name == *name) {
                import.lines.push(line);
            }
        }
    }
}

// The words one source line produced, for the per-line listing.
#[derive(Debug, Clone, PartialEq)]
pub struct LineCode {
    pub line_number: usize,
    pub words: Vec<EncodedWord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineCode {
    pub data: Vec<EncodedWord>,
    pub text: Vec<EncodedWord>,
    pub line_codes: Vec<LineCode>,
}

impl MachineCode {
    /// The full machine-code stream: `.data` words first, then `.text`.
    pub fn combined(&self) -> Vec<EncodedWord> {
        self.data.iter().chain(self.text.iter()).copied().collect()
    }
}

/// Pass 2: emit the machine words for every `.text` instruction and every
/// `.data` initializer, in source order. `.bss` reserves space but emits
/// nothing.
pub fn generate_machine_code(
    lines: &[SourceLine],
    resolution: &Resolution,
) -> Result<MachineCode, AssemblyError> {
    let encoder = Encoder::new(
        &resolution.symbols,
        &resolution.imports,
        &resolution.text_addresses,
    );
    let mut current = SectionId::Text;
    let mut code = MachineCode::default();
    let mut ordinal = 0usize;

    for line in lines {
        if let Some(directive) = &line.directive {
            match directive {
                Directive::Section(id) => current = *id,
                Directive::Word(values) if current == SectionId::Data => {
                    let words = values
                        .iter()
                        .map(|v| encoder.encode_word_value(v, line.line_number))
                        .collect::<Result<Vec<_>, _>>()?;
                    code.data.extend(words.iter().copied());
                    code.line_codes.push(LineCode {
                        line_number: line.line_number,
                        words,
                    });
                }
                Directive::Byte(values) if current == SectionId::Data => {
                    let words = values
                        .iter()
                        .map(|v| encoder.encode_byte_value(v, line.line_number))
                        .collect::<Result<Vec<_>, _>>()?;
                    code.data.extend(words.iter().copied());
                    code.line_codes.push(LineCode {
                        line_number: line.line_number,
                        words,
                    });
                }
                _ => {}
            }
        }

        if let Some(instruction) = &line.instruction {
            if current == SectionId::Text {
                let words = encoder.encode_instruction(instruction, ordinal, line.line_number)?;
                ordinal += 1;
                code.text.extend(words.iter().copied());
                code.line_codes.push(LineCode {
                    line_number: line.line_number,
                    words,
                });
            }
        }
    }

    Ok(code)
}

// ------------- unit tests -------------
