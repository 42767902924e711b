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

use mspasm::assemble;
use mspasm::ast::SectionId;
use mspasm::file_reader::{AsmFileReader, MockFileReader};
use mspasm::linker::LinkEditor;
use std::path::Path;

const EXAMPLE: &str = "\
; --- definitions ---
.def  start, equal_label, end
.ref  external_func, extern_var

.data
val1:   .word 0x1234
val2:   .byte 0xA

.bss
temp:   .space 2

.text
start:  MOV.W #0x1234, R4      ; R4 = 0x1234
        MOV.W #0x4567, R5
        MOV.W #0x89AB, R6
        CALL external_func
        ADD R5, R4
        MOV extern_var, R5
        SUB R6, R4
        CMP R4, R5
        JEQ equal_label
        JMP not_equal_label
equal_label:
        MOV R4, R7
        JMP end
not_equal_label:
        MOV R5, R7
end:    NOP
";

#[test]
fn test_example_program_tables() {
    let assembly = assemble(EXAMPLE).unwrap();
    let resolution = &assembly.resolution;

    assert_eq!(resolution.symbols["val1"].address, 0xC000);
    assert_eq!(resolution.symbols["val2"].address, 0xC002);
    assert_eq!(resolution.symbols["temp"].address, 0xE000);
    assert_eq!(resolution.symbols["start"].address, 0x0000);
    assert_eq!(resolution.symbols["equal_label"].address, 0x001A);
    assert_eq!(resolution.symbols["not_equal_label"].address, 0x001E);
    assert_eq!(resolution.symbols["end"].address, 0x0020);

    assert_eq!(resolution.sections.get(SectionId::Text).unwrap().size, 34);
    assert_eq!(resolution.sections.get(SectionId::Data).unwrap().size, 3);
    assert_eq!(resolution.sections.get(SectionId::Bss).unwrap().size, 4);

    let exports: Vec<_> = resolution
        .exports
        .iter()
        .map(|e| (e.name.as_str(), e.address))
        .collect();
    assert_eq!(
        exports,
        vec![
            ("start", Some(0x0000)),
            ("equal_label", Some(0x001A)),
            ("end", Some(0x0020)),
        ]
    );

    assert_eq!(resolution.imports.len(), 2);
    assert_eq!(resolution.imports[0].name, "external_func");
    assert_eq!(resolution.imports[1].name, "extern_var");

    let relocations: Vec<_> = resolution
        .relocations
        .iter()
        .map(|r| (r.symbol.as_str(), r.offset))
        .collect();
    assert_eq!(relocations, vec![("external_func", 3), ("extern_var", 5)]);

    assert_eq!(
        resolution.text_addresses,
        vec![
            0x0000, 0x0004, 0x0008, 0x000C, 0x000E, 0x0010, 0x0012, 0x0014, 0x0016, 0x0018,
            0x001A, 0x001C, 0x001E, 0x0020,
        ]
    );
}

#[test]
fn test_example_program_machine_code() {
    let assembly = assemble(EXAMPLE).unwrap();

    let text: Vec<u16> = assembly.code.text.iter().map(|w| w.value).collect();
    assert_eq!(
        text,
        vec![
            0x4374, 0x1234, // MOV.W #0x1234, R4
            0x4375, 0x4567, // MOV.W #0x4567, R5
            0x4376, 0x89AB, // MOV.W #0x89AB, R6
            0x12C0, // CALL external_func
            0x5544, // ADD R5, R4
            0x4045, // MOV extern_var, R5
            0x8644, // SUB R6, R4
            0x9445, // CMP R4, R5
            0x2401, // JEQ equal_label
            0x3C02, // JMP not_equal_label
            0x4447, // MOV R4, R7
            0x3C01, // JMP end
            0x4547, // MOV R5, R7
            0x0000, // NOP
        ]
    );

    let data: Vec<String> = assembly.code.data.iter().map(|w| w.hex()).collect();
    assert_eq!(data, vec!["0x1234", "0x0A"]);

    // The combined stream is data first, then text.
    let combined = assembly.code.combined();
    assert_eq!(combined.len(), text.len() + data.len());
    assert_eq!(combined[0].value, 0x1234);
    assert_eq!(combined[2].value, 0x4374);
}

#[test]
fn test_example_program_object_file() {
    let assembly = assemble(EXAMPLE).unwrap();
    let rendered = assembly.object().render();

    assert!(rendered.starts_with("COFF\nSECTION .text\n0x4374\n"));
    assert!(rendered.contains("SECTION .data\n0x1234\n0x0A\n"));
    assert!(rendered.contains("EXPORTS\nstart 0x0000\nequal_label 0x001A\nend 0x0020\n"));
    assert!(rendered.contains(
        "RELOCATIONS\nexternal_func .text 0x0003\nextern_var .text 0x0005\nEOF\n"
    ));
}

#[test]
fn test_example_program_listing() {
    let assembly = assemble(EXAMPLE).unwrap();
    let report = assembly.report();

    assert_eq!(report.listing.len(), EXAMPLE.lines().count());
    // Directive-only and blank lines stay empty.
    assert_eq!(report.listing[0], "");
    assert_eq!(report.listing[1], "");
    // val1: .word 0x1234
    assert_eq!(report.listing[5], "0001001000110100 -> 0x1234");
    // start: MOV.W #0x1234, R4
    assert_eq!(
        report.listing[12],
        "01000011011101000001001000110100 -> 0x43741234"
    );
    // end: NOP
    assert_eq!(report.listing[27], "0000000000000000 -> 0x0000");
}

#[test]
fn test_unresolved_export_is_written_as_placeholder() {
    let assembly = assemble(".def ghost\n.text\nNOP\n").unwrap();
    let rendered = assembly.object().render();
    assert!(rendered.contains("EXPORTS\nghost 0x????\n"));
}

#[test]
fn test_assemble_then_link_two_modules() {
    let defining = assemble(".def foo\n.text\nfoo: NOP\n").unwrap();
    let calling = assemble(".ref foo\n.text\nCALL foo\n").unwrap();

    let mut reader = MockFileReader::default();
    reader.add_file("objs/a.obj", &defining.object().render());
    reader.add_file("objs/b.obj", &calling.object().render());

    let mut editor = LinkEditor::load_dir(Path::new("objs"), &reader).unwrap();
    editor.link().unwrap();

    // The call word's low byte now carries foo's address, the high byte is
    // untouched.
    assert_eq!(editor.text(), &[0x0000, 0x1200]);
    assert_eq!(
        editor.render(),
        "COFF_LINKED EXECUTABLE FILE\nSECTION .text\n0x0000\n0x1200\nSECTION .data\nEOF\n"
    );
}

#[test]
fn test_link_directory_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    let defining = assemble(".def foo\n.text\nfoo: NOP\n").unwrap();
    let calling = assemble(".ref foo\n.data\nv: .word 0x1234\n.text\nCALL foo\n").unwrap();
    std::fs::write(dir.path().join("a.obj"), defining.object().render()).unwrap();
    std::fs::write(dir.path().join("b.obj"), calling.object().render()).unwrap();

    let mut editor = LinkEditor::load_dir(dir.path(), &AsmFileReader).unwrap();
    editor.link().unwrap();
    let rendered = editor.render();

    assert!(rendered.starts_with("COFF_LINKED EXECUTABLE FILE\n"));
    assert!(rendered.contains("SECTION .text\n0x0000\n0x1200\n"));
    assert!(rendered.contains("SECTION .data\n0x1234\n"));
}

#[test]
fn test_linking_an_unresolved_export_fails() {
    let ghost = assemble(".def ghost\n.text\nNOP\n").unwrap();

    let mut reader = MockFileReader::default();
    reader.add_file("objs/ghost.obj", &ghost.object().render());

    let result = LinkEditor::load_dir(Path::new("objs"), &reader);
    let message = format!("{:#}", result.err().unwrap());
    assert!(message.contains("Undefined exported symbol ghost"));
}

#[test]
fn test_redefined_label_reports_line_number() {
    let error = assemble("a: NOP\na: NOP\n").unwrap_err();
    assert_eq!(
        error.to_string(),
        "Semantic Error on line 2: Label 'a' redefined"
    );
}

#[test]
fn test_undefined_jump_target_reports_line_number() {
    let error = assemble(".text\nJMP nowhere\n").unwrap_err();
    assert_eq!(
        error.to_string(),
        "Semantic Error on line 2: Undefined label nowhere"
    );
}

#[test]
fn test_assemble_file_via_reader() {
    let mut reader = MockFileReader::default();
    reader.add_file("prog.asm", ".text\nNOP\n");

    let assembly = mspasm::assemble_file(Path::new("prog.asm"), &reader).unwrap();
    assert_eq!(assembly.code.text.len(), 1);

    let missing = mspasm::assemble_file(Path::new("gone.asm"), &reader);
    assert!(missing.is_err());
}
