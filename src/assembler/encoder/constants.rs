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

// Dual-operand opcodes (4 bit, word layout: opcode | src | Ad | B/W | As | dst)
pub const MOV_OPCODE: u16 = 0b0100;
pub const ADD_OPCODE: u16 = 0b0101;
pub const SUB_OPCODE: u16 = 0b1000;
pub const CMP_OPCODE: u16 = 0b1001;

// Jump opcodes (6 bit, word layout: opcode | 10-bit signed offset)
pub const JNE_OPCODE: u16 = 0b001000;
pub const JEQ_OPCODE: u16 = 0b001001;
pub const JNC_OPCODE: u16 = 0b001010;
pub const JC_OPCODE: u16 = 0b001011;
pub const JN_OPCODE: u16 = 0b001100;
pub const JGE_OPCODE: u16 = 0b001101;
pub const JL_OPCODE: u16 = 0b001110;
pub const JMP_OPCODE: u16 = 0b001111;

// Fixed single-word forms. RET and CALL carry a stub destination field;
// operand-dependent CALL encoding is not implemented.
pub const NOP_WORD: u16 = 0x0000;
pub const RET_WORD: u16 = 0b0001_0011_0000_0000; // 0x1300
pub const CALL_WORD: u16 = 0b0001_0010_1100_0000; // 0x12C0

// Field positions within a dual-operand word.
pub const OPCODE_SHIFT: u32 = 12;
pub const SRC_SHIFT: u32 = 8;
pub const JUMP_OPCODE_SHIFT: u32 = 10;

// Fixed encoder choices: Ad = 0, B/W = 1.
pub const BW_FLAG: u16 = 1 << 6;

// Source addressing mode bits (the As field).
pub const AS_REGISTER: u16 = 0b00 << 4;
pub const AS_IMMEDIATE: u16 = 0b11 << 4;

pub const JUMP_OFFSET_MASK: i32 = 0x3FF;
