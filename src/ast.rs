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

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
}

impl Register {
    /// The 4-bit register field value.
    pub fn number(&self) -> u16 {
        match self {
            Register::R0 => 0,
            Register::R1 => 1,
            Register::R2 => 2,
            Register::R3 => 3,
            Register::R4 => 4,
            Register::R5 => 5,
            Register::R6 => 6,
            Register::R7 => 7,
            Register::R8 => 8,
            Register::R9 => 9,
            Register::R10 => 10,
            Register::R11 => 11,
            Register::R12 => 12,
            Register::R13 => 13,
            Register::R14 => 14,
            Register::R15 => 15,
        }
    }

    pub fn from_name(name: &str) -> Option<Register> {
        match name.to_ascii_uppercase().as_str() {
            "R0" => Some(Register::R0),
            "R1" => Some(Register::R1),
            "R2" => Some(Register::R2),
            "R3" => Some(Register::R3),
            "R4" => Some(Register::R4),
            "R5" => Some(Register::R5),
            "R6" => Some(Register::R6),
            "R7" => Some(Register::R7),
            "R8" => Some(Register::R8),
            "R9" => Some(Register::R9),
            "R10" => Some(Register::R10),
            "R11" => Some(Register::R11),
            "R12" => Some(Register::R12),
            "R13" => Some(Register::R13),
            "R14" => Some(Register::R14),
            "R15" => Some(Register::R15),
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.number())
    }
}

// The three fixed sections of an object module.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SectionId {
    Text,
    Data,
    Bss,
}

impl SectionId {
    /// Default base address of the section's location counter.
    pub fn base(&self) -> u16 {
        match self {
            SectionId::Text => 0x0000,
            SectionId::Data => 0xC000,
            SectionId::Bss => 0xE000,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SectionId::Text => ".text",
            SectionId::Data => ".data",
            SectionId::Bss => ".bss",
        }
    }

    pub fn parse(name: &str) -> Option<SectionId> {
        match name {
            ".text" => Some(SectionId::Text),
            ".data" => Some(SectionId::Data),
            ".bss" => Some(SectionId::Bss),
            _ => None,
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// A literal or a symbolic name inside a directive or operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(u16),
    Symbol(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "0x{:04X}", n),
            Value::Symbol(s) => f.write_str(s),
        }
    }
}

// Represents all possible forms an argument to an instruction can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Immediate(Value),         // #0x1234 or #label
    Absolute(Value),          // &0x1234
    Indexed(Value, Register), // 0x10(R5)
    Symbol(String),           // my_label
    Number(u16),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{}", r),
            Operand::Immediate(v) => write!(f, "#{}", v),
            Operand::Absolute(v) => write!(f, "&{}", v),
            Operand::Indexed(v, r) => write!(f, "{}({})", v, r),
            Operand::Symbol(s) => f.write_str(s),
            Operand::Number(n) => write!(f, "0x{:04X}", n),
        }
    }
}

// The encoded mnemonic subset. Lookup is keyed by the uppercased spelling;
// the .W variants alias their base form.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mnemonic {
    Mov,
    Add,
    Sub,
    Cmp,
    Jne,
    Jeq,
    Jnc,
    Jc,
    Jn,
    Jge,
    Jl,
    Jmp,
    Nop,
    Ret,
    Call,
}

impl Mnemonic {
    pub fn lookup(name: &str) -> Option<Mnemonic> {
        match name.to_ascii_uppercase().as_str() {
            "MOV" | "MOV.W" => Some(Mnemonic::Mov),
            "ADD" | "ADD.W" => Some(Mnemonic::Add),
            "SUB" | "SUB.W" => Some(Mnemonic::Sub),
            "CMP" => Some(Mnemonic::Cmp),
            "JNE" => Some(Mnemonic::Jne),
            "JEQ" => Some(Mnemonic::Jeq),
            "JNC" => Some(Mnemonic::Jnc),
            "JC" => Some(Mnemonic::Jc),
            "JN" => Some(Mnemonic::Jn),
            "JGE" => Some(Mnemonic::Jge),
            "JL" => Some(Mnemonic::Jl),
            "JMP" => Some(Mnemonic::Jmp),
            "NOP" => Some(Mnemonic::Nop),
            "RET" => Some(Mnemonic::Ret),
            "CALL" => Some(Mnemonic::Call),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Section(SectionId), // .text / .data / .bss
    Org(u16),           // ORG C000
    Def(Vec<String>),   // .def start, end
    Ref(Vec<String>),   // .ref external_func
    Word(Vec<Value>),   // .word 0x1234, 0x5678
    Byte(Vec<Value>),   // .byte 0xA, 1
    Space(u16),         // .space 2
}

// One instruction as written, mnemonic not yet resolved against the
// opcode table.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub mnemonic: String,
    pub operands: Vec<Operand>,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic)?;
        for (i, op) in self.operands.iter().enumerate() {
            if i == 0 {
                write!(f, " {}", op)?;
            } else {
                write!(f, ", {}", op)?;
            }
        }
        Ok(())
    }
}

// --- Source Line Structure ---

// Represents a single classified line, which can have a label, an
// instruction or a directive, or a label plus either of the two.
#[derive(Debug, Clone, Default)]
pub struct SourceLine {
    pub line_number: usize,
    pub label: Option<String>,
    pub instruction: Option<Instruction>,
    pub directive: Option<Directive>,
}
