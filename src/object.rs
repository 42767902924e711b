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

//! The textual COFF-like object format. Five regions in fixed order:
//!
//! ```text
//! COFF
//! SECTION .text
//! 0x4544
//! SECTION .data
//! 0x1234
//! EXPORTS
//! start 0x0000
//! RELOCATIONS
//! external_func .text 0x0001
//! EOF
//! ```
//!
//! `.data` words keep their width: four hex digits for `.word` values, two
//! for `.byte` values. An export without a resolved address is written with
//! the `0x????` placeholder and rejected at link time.

use crate::assembler::Relocation;
use crate::ast::SectionId;
use crate::errors::ObjectError;
use std::fmt::Write as _;

pub const OBJECT_MAGIC: &str = "COFF";
pub const LINKED_MAGIC: &str = "COFF_LINKED EXECUTABLE FILE";
pub const OBJECT_EXTENSION: &str = "obj";

pub const UNRESOLVED_PLACEHOLDER: &str = "????";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectModule {
    pub text: Vec<u16>,
    /// Raw `.data` word lines, width preserved (`0x1234` or `0x0A`).
    pub data: Vec<String>,
    pub exports: Vec<(String, Option<u16>)>,
    pub relocations: Vec<Relocation>,
}

impl ObjectModule {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(OBJECT_MAGIC);
        out.push('\n');
        out.push_str("SECTION .text\n");
        for word in &self.text {
            let _ = writeln!(out, "0x{:04X}", word);
        }
        out.push_str("SECTION .data\n");
        for word in &self.data {
            out.push_str(word);
            out.push('\n');
        }
        out.push_str("EXPORTS\n");
        for (name, address) in &self.exports {
            match address {
                Some(address) => {
                    let _ = writeln!(out, "{} 0x{:04X}", name, address);
                }
                None => {
                    let _ = writeln!(out, "{} 0x{}", name, UNRESOLVED_PLACEHOLDER);
                }
            }
        }
        out.push_str("RELOCATIONS\n");
        for reloc in &self.relocations {
            let _ = writeln!(out, "{} {} 0x{:04X}", reloc.symbol, reloc.section, reloc.offset);
        }
        out.push_str("EOF\n");
        out
    }

    pub fn parse(source: &str) -> Result<ObjectModule, ObjectError> {
        #[derive(PartialEq)]
        enum Region {
            Preamble,
            Text,
            Data,
            Exports,
            Relocations,
        }

        let mut module = ObjectModule::default();
        let mut region = Region::Preamble;
        let mut saw_magic = false;
        let mut terminated = false;

        for raw in source.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if !saw_magic {
                if line != OBJECT_MAGIC {
                    return Err(ObjectError::MissingMagic);
                }
                saw_magic = true;
                continue;
            }
            match line {
                "SECTION .text" => region = Region::Text,
                "SECTION .data" => region = Region::Data,
                "EXPORTS" => region = Region::Exports,
                "RELOCATIONS" => region = Region::Relocations,
                "EOF" => {
                    terminated = true;
                    break;
                }
                _ => match region {
                    Region::Preamble => {
                        return Err(ObjectError::StrayLine(line.to_string()));
                    }
                    Region::Text => module.text.push(parse_word(line)?),
                    Region::Data => {
                        if !is_hex_word(line) && !is_bit_string(line) {
                            return Err(ObjectError::BadWord(line.to_string()));
                        }
                        module.data.push(line.to_string());
                    }
                    Region::Exports => module.exports.push(parse_export(line)?),
                    Region::Relocations => module.relocations.push(parse_relocation(line)?),
                },
            }
        }

        if !terminated {
            return Err(ObjectError::MissingEof);
        }
        Ok(module)
    }
}

fn parse_word(text: &str) -> Result<u16, ObjectError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|_| ObjectError::BadWord(text.to_string()))
}

fn parse_export(line: &str) -> Result<(String, Option<u16>), ObjectError> {
    let mut parts = line.split_whitespace();
    let (Some(name), Some(address), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ObjectError::BadExport(line.to_string()));
    };
    let stripped = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    if stripped == UNRESOLVED_PLACEHOLDER {
        return Ok((name.to_string(), None));
    }
    let address =
        parse_word(address).map_err(|_| ObjectError::BadExport(line.to_string()))?;
    Ok((name.to_string(), Some(address)))
}

fn parse_relocation(line: &str) -> Result<Relocation, ObjectError> {
    let mut parts = line.split_whitespace();
    let (Some(symbol), Some(section), Some(offset), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ObjectError::BadRelocation(line.to_string()));
    };
    let section =
        SectionId::parse(section).ok_or_else(|| ObjectError::BadRelocation(line.to_string()))?;
    let offset = parse_word(offset).map_err(|_| ObjectError::BadRelocation(line.to_string()))?;
    Ok(Relocation {
        symbol: symbol.to_string(),
        section,
        offset,
    })
}

fn is_hex_word(line: &str) -> bool {
    let digits = line
        .strip_prefix("0x")
        .or_else(|| line.strip_prefix("0X"));
    match digits {
        Some(digits) => {
            !digits.is_empty()
                && digits.len() <= 4
                && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

fn is_bit_string(line: &str) -> bool {
    bit_string_value(line).is_some()
}

// The numeric value of a legacy bit-string data line, if it is one.
pub(crate) fn bit_string_value(line: &str) -> Option<u16> {
    if (8..=16).contains(&line.len()) && line.chars().all(|c| c == '0' || c == '1') {
        u16::from_str_radix(line, 2).ok()
    } else {
        None
    }
}

// ------------- unit tests -------------
