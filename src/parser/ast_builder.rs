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

use super::Rule;
use crate::ast::*;
use crate::errors::AssemblyError;
use pest::iterators::Pair;

pub fn build_directive(pair: Pair<Rule>, line: usize) -> Result<Directive, AssemblyError> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::section => {
            // The grammar only matches the three known section names.
            let id = SectionId::parse(inner.as_str()).unwrap();
            Ok(Directive::Section(id))
        }
        Rule::org => {
            let addr = inner
                .into_inner()
                .find(|p| p.as_rule() == Rule::org_addr)
                .unwrap();
            Ok(Directive::Org(parse_hex(addr.as_str(), line)?))
        }
        Rule::def_decl => Ok(Directive::Def(collect_names(inner))),
        Rule::ref_decl => Ok(Directive::Ref(collect_names(inner))),
        Rule::word_decl => Ok(Directive::Word(collect_values(inner, line)?)),
        Rule::byte_decl => Ok(Directive::Byte(collect_values(inner, line)?)),
        Rule::space_decl => {
            let count = inner
                .into_inner()
                .find(|p| p.as_rule() == Rule::dec_number)
                .unwrap();
            let count =
                count
                    .as_str()
                    .parse::<u16>()
                    .map_err(|_| AssemblyError::StructuralError {
                        line,
                        reason: format!(".space count `{}` is out of range", count.as_str()),
                    })?;
            Ok(Directive::Space(count))
        }
        rule => Err(AssemblyError::StructuralError {
            line,
            reason: format!("unexpected directive rule {:?}", rule),
        }),
    }
}

pub fn build_instruction(pair: Pair<Rule>, line: usize) -> Result<Instruction, AssemblyError> {
    let mut mnemonic = String::new();
    let mut operands = Vec::new();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::mnemonic => mnemonic = p.as_str().to_string(),
            Rule::operand => operands.push(build_operand(p, line)?),
            _ => {}
        }
    }

    Ok(Instruction { mnemonic, operands })
}

fn build_operand(pair: Pair<Rule>, line: usize) -> Result<Operand, AssemblyError> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::immediate => Ok(Operand::Immediate(build_value(
            inner.into_inner().next().unwrap(),
            line,
        )?)),
        Rule::absolute => Ok(Operand::Absolute(build_value(
            inner.into_inner().next().unwrap(),
            line,
        )?)),
        Rule::indexed => {
            let mut parts = inner.into_inner();
            let offset = build_value(parts.next().unwrap(), line)?;
            let register = build_register(parts.next().unwrap(), line)?;
            Ok(Operand::Indexed(offset, register))
        }
        Rule::register => Ok(Operand::Register(build_register(inner, line)?)),
        Rule::ident => Ok(Operand::Symbol(inner.as_str().to_string())),
        Rule::hex_number | Rule::dec_number => match build_value(inner, line)? {
            Value::Number(n) => Ok(Operand::Number(n)),
            Value::Symbol(_) => unreachable!("number rules build numeric values"),
        },
        rule => Err(AssemblyError::StructuralError {
            line,
            reason: format!("unexpected operand rule {:?}", rule),
        }),
    }
}

fn build_register(pair: Pair<Rule>, line: usize) -> Result<Register, AssemblyError> {
    Register::from_name(pair.as_str()).ok_or_else(|| AssemblyError::StructuralError {
        line,
        reason: format!("invalid register `{}`", pair.as_str()),
    })
}

fn build_value(pair: Pair<Rule>, line: usize) -> Result<Value, AssemblyError> {
    match pair.as_rule() {
        Rule::hex_number => Ok(Value::Number(parse_hex(pair.as_str(), line)?)),
        // A bare immediate literal is hexadecimal even without the prefix.
        Rule::hex_bare => Ok(Value::Number(parse_hex(pair.as_str(), line)?)),
        Rule::dec_number => {
            pair.as_str()
                .parse::<u16>()
                .map(Value::Number)
                .map_err(|_| AssemblyError::StructuralError {
                    line,
                    reason: format!("value `{}` does not fit in 16 bits", pair.as_str()),
                })
        }
        Rule::ident => Ok(Value::Symbol(pair.as_str().to_string())),
        rule => Err(AssemblyError::StructuralError {
            line,
            reason: format!("unexpected value rule {:?}", rule),
        }),
    }
}

fn collect_names(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::ident)
        .map(|p| p.as_str().to_string())
        .collect()
}

fn collect_values(pair: Pair<Rule>, line: usize) -> Result<Vec<Value>, AssemblyError> {
    pair.into_inner()
        .filter(|p| {
            matches!(
                p.as_rule(),
                Rule::hex_number | Rule::dec_number | Rule::ident
            )
        })
        .map(|p| build_value(p, line))
        .collect()
}

fn parse_hex(text: &str, line: usize) -> Result<u16, AssemblyError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|_| AssemblyError::StructuralError {
        line,
        reason: format!("value `{}` does not fit in 16 bits", text),
    })
}
