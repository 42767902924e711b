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

mod ast_builder;

use crate::ast::*;
use crate::errors::AssemblyError;
use pest::Parser;
use pest_derive::Parser;

// Derive the line classifier from our grammar file.
#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct AsmParser;

// Main classification function that takes the entire source text. Blank and
// comment-only lines are dropped; every kept line carries its original
// 1-based line number.
pub fn parse_source(source: &str) -> Result<Vec<SourceLine>, AssemblyError> {
    let pairs = AsmParser::parse(Rule::program, source)?;
    let mut lines = Vec::new();

    for line_pair in pairs
        .flatten()
        .filter(|p| p.as_rule() == Rule::line_content)
    {
        let line_number = line_pair.as_span().start_pos().line_col().0;
        let mut source_line = SourceLine {
            line_number,
            ..SourceLine::default()
        };

        for pair in line_pair.into_inner() {
            match pair.as_rule() {
                Rule::label => {
                    source_line.label =
                        Some(pair.into_inner().next().unwrap().as_str().to_string());
                }
                Rule::directive => {
                    source_line.directive =
                        Some(ast_builder::build_directive(pair, line_number)?);
                }
                Rule::instruction => {
                    source_line.instruction =
                        Some(ast_builder::build_instruction(pair, line_number)?);
                }
                _ => {}
            }
        }

        if source_line.label.is_some()
            || source_line.instruction.is_some()
            || source_line.directive.is_some()
        {
            lines.push(source_line);
        }
    }

    Ok(lines)
}

// ------------- unit tests -------------
