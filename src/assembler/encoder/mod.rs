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

pub mod constants;

use crate::assembler::symbol_table::{Import, SymbolTable};
use crate::ast::{Instruction, Mnemonic, Operand, Register, Value};
use crate::errors::AssemblyError;
use constants::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Width {
    Byte,
    Word,
}

// One emitted machine word: 16 bits for text and `.word` data, 8 bits for
// `.byte` data.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodedWord {
    pub value: u16,
    pub width: Width,
}

impl EncodedWord {
    pub fn word(value: u16) -> Self {
        EncodedWord {
            value,
            width: Width::Word,
        }
    }

    pub fn byte(value: u8) -> Self {
        EncodedWord {
            value: value as u16,
            width: Width::Byte,
        }
    }

    pub fn bits(&self) -> String {
        match self.width {
            Width::Word => format!("{:016b}", self.value),
            Width::Byte => format!("{:08b}", self.value),
        }
    }

    pub fn hex(&self) -> String {
        format!("0x{}", self.hex_digits())
    }

    pub fn hex_digits(&self) -> String {
        match self.width {
            Width::Word => format!("{:04X}", self.value),
            Width::Byte => format!("{:02X}", self.value),
        }
    }
}

// Pass-2 word encoder. Borrows the pass-1 tables; one instance per run.
pub struct Encoder<'a> {
    symbols: &'a SymbolTable,
    imports: &'a [Import],
    text_addresses: &'a [u16],
}

impl<'a> Encoder<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        imports: &'a [Import],
        text_addresses: &'a [u16],
    ) -> Self {
        Encoder {
            symbols,
            imports,
            text_addresses,
        }
    }

    /// Encodes one `.text` instruction into its machine words. `ordinal` is
    /// the 0-based position of the instruction among all `.text`
    /// instructions, used to look up its pass-1 address.
    pub fn encode_instruction(
        &self,
        instruction: &Instruction,
        ordinal: usize,
        line: usize,
    ) -> Result<Vec<EncodedWord>, AssemblyError> {
        let mnemonic = Mnemonic::lookup(&instruction.mnemonic).ok_or_else(|| {
            AssemblyError::SemanticError {
                line,
                reason: format!("Unsupported mnemonic in `{}`", instruction),
            }
        })?;

        match mnemonic {
            Mnemonic::Mov => self.encode_dual_operand(MOV_OPCODE, instruction, line),
            Mnemonic::Add => self.encode_dual_operand(ADD_OPCODE, instruction, line),
            Mnemonic::Sub => self.encode_dual_operand(SUB_OPCODE, instruction, line),
            Mnemonic::Cmp => self.encode_dual_operand(CMP_OPCODE, instruction, line),
            Mnemonic::Jne => self.encode_jump(JNE_OPCODE, instruction, ordinal, line),
            Mnemonic::Jeq => self.encode_jump(JEQ_OPCODE, instruction, ordinal, line),
            Mnemonic::Jnc => self.encode_jump(JNC_OPCODE, instruction, ordinal, line),
            Mnemonic::Jc => self.encode_jump(JC_OPCODE, instruction, ordinal, line),
            Mnemonic::Jn => self.encode_jump(JN_OPCODE, instruction, ordinal, line),
            Mnemonic::Jge => self.encode_jump(JGE_OPCODE, instruction, ordinal, line),
            Mnemonic::Jl => self.encode_jump(JL_OPCODE, instruction, ordinal, line),
            Mnemonic::Jmp => self.encode_jump(JMP_OPCODE, instruction, ordinal, line),
            Mnemonic::Nop => Ok(vec![EncodedWord::word(NOP_WORD)]),
            Mnemonic::Ret => Ok(vec![EncodedWord::word(RET_WORD)]),
            // The destination field of CALL is a fixed stub; the relocation
            // emitted in pass 1 carries the actual target.
            Mnemonic::Call => Ok(vec![EncodedWord::word(CALL_WORD)]),
        }
    }

    fn encode_dual_operand(
        &self,
        opcode: u16,
        instruction: &Instruction,
        line: usize,
    ) -> Result<Vec<EncodedWord>, AssemblyError> {
        if instruction.operands.len() < 2 {
            return Err(AssemblyError::SemanticError {
                line,
                reason: format!("Insufficient operands in `{}`", instruction),
            });
        }

        let dst = match &instruction.operands[1] {
            Operand::Register(r) => r.number(),
            // Unresolved destination: the field stays clear and the
            // relocation, if any, patches the word at link time.
            Operand::Symbol(_) => 0,
            _ => {
                return Err(AssemblyError::SemanticError {
                    line,
                    reason: format!("Unsupported operands in `{}`", instruction),
                });
            }
        };

        match &instruction.operands[0] {
            Operand::Register(r) => Ok(vec![EncodedWord::word(
                (opcode << OPCODE_SHIFT) | (r.number() << SRC_SHIFT) | BW_FLAG | AS_REGISTER | dst,
            )]),
            Operand::Symbol(_) => Ok(vec![EncodedWord::word(
                (opcode << OPCODE_SHIFT) | BW_FLAG | AS_REGISTER | dst,
            )]),
            Operand::Immediate(value) => {
                let immediate = self.resolve_immediate(value, line)?;
                let word = (opcode << OPCODE_SHIFT)
                    | (Register::R3.number() << SRC_SHIFT)
                    | BW_FLAG
                    | AS_IMMEDIATE
                    | dst;
                Ok(vec![
                    EncodedWord::word(word),
                    EncodedWord::word(immediate),
                ])
            }
            _ => Err(AssemblyError::SemanticError {
                line,
                reason: format!("Unsupported operands in `{}`", instruction),
            }),
        }
    }

    fn encode_jump(
        &self,
        opcode: u16,
        instruction: &Instruction,
        ordinal: usize,
        line: usize,
    ) -> Result<Vec<EncodedWord>, AssemblyError> {
        let target = instruction
            .operands
            .first()
            .ok_or_else(|| AssemblyError::SemanticError {
                line,
                reason: format!("Insufficient operands in `{}`", instruction),
            })?;

        let name = match target {
            Operand::Symbol(name) => name,
            other => {
                return Err(AssemblyError::SemanticError {
                    line,
                    reason: format!("Undefined label {}", other),
                });
            }
        };

        let symbol = self
            .symbols
            .get(name)
            .ok_or_else(|| AssemblyError::SemanticError {
                line,
                reason: format!("Undefined label {}", name),
            })?;

        let current =
            self.text_addresses
                .get(ordinal)
                .copied()
                .ok_or_else(|| AssemblyError::StructuralError {
                    line,
                    reason: format!("No recorded address for `{}`", instruction),
                })?;

        // 10-bit signed offset in half words, relative to the next word.
        let offset =
            ((symbol.address as i32 - (current as i32 + 2)) >> 1) & JUMP_OFFSET_MASK;
        Ok(vec![EncodedWord::word(
            (opcode << JUMP_OPCODE_SHIFT) | offset as u16,
        )])
    }

    // Resolves an immediate operand. Labels become their pass-1 address,
    // imports become a zero placeholder patched at link time, and anything
    // else must read as a hex literal.
    fn resolve_immediate(&self, value: &Value, line: usize) -> Result<u16, AssemblyError> {
        match value {
            Value::Number(n) => Ok(*n),
            Value::Symbol(name) => {
                if let Some(symbol) = self.symbols.get(name) {
                    return Ok(symbol.address);
                }
                if self.is_import(name) {
                    return Ok(0x0000);
                }
                u16::from_str_radix(name, 16).map_err(|_| AssemblyError::SemanticError {
                    line,
                    reason: format!("Undefined label {}", name),
                })
            }
        }
    }

    /// Resolves a `.word` initializer value.
    pub fn encode_word_value(
        &self,
        value: &Value,
        line: usize,
    ) -> Result<EncodedWord, AssemblyError> {
        Ok(EncodedWord::word(self.resolve_data_value(value, line)?))
    }

    /// Resolves a `.byte` initializer value.
    pub fn encode_byte_value(
        &self,
        value: &Value,
        line: usize,
    ) -> Result<EncodedWord, AssemblyError> {
        let resolved = self.resolve_data_value(value, line)?;
        if resolved > 0xFF {
            return Err(AssemblyError::SemanticError {
                line,
                reason: format!("Byte value `{}` does not fit in 8 bits", value),
            });
        }
        Ok(EncodedWord::byte(resolved as u8))
    }

    fn resolve_data_value(&self, value: &Value, line: usize) -> Result<u16, AssemblyError> {
        match value {
            Value::Number(n) => Ok(*n),
            Value::Symbol(name) => {
                if let Some(symbol) = self.symbols.get(name) {
                    return Ok(symbol.address);
                }
                if self.is_import(name) {
                    // No relocation reaches `.data`, so an import here can
                    // never be patched.
                    return Err(AssemblyError::SemanticError {
                        line,
                        reason: format!("Imported symbol {} cannot initialize data", name),
                    });
                }
                u16::from_str_radix(name, 16).map_err(|_| AssemblyError::SemanticError {
                    line,
                    reason: format!("Undefined label {}", name),
                })
            }
        }
    }

    fn is_import(&self, name: &str) -> bool {
        self.imports.iter().any(|import| import.name == name)
    }
}

// ------------- unit tests -------------
