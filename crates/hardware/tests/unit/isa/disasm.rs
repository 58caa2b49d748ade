//! Disassembler tests: canonical text and decode round trips.

use moesim_core::isa::disasm::listing;
use moesim_core::isa::{AluOp, BranchCond, Instruction, Labels, decode_line};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::sample::select;

const LEN: usize = 64;

fn reg() -> impl Strategy<Value = usize> {
    0usize..32
}

fn instruction() -> impl Strategy<Value = Instruction> {
    let imm_ops: Vec<AluOp> = AluOp::ALL
        .into_iter()
        .filter(|op| op.imm_mnemonic().is_some())
        .collect();
    prop_oneof![
        Just(Instruction::Nop),
        Just(Instruction::Halt),
        reg().prop_map(|rd| Instruction::HartId { rd }),
        (reg(), reg()).prop_map(|(rd, rs)| Instruction::Mv { rd, rs }),
        (reg(), any::<i32>()).prop_map(|(rd, imm)| Instruction::Li { rd, imm }),
        (select(AluOp::ALL.to_vec()), reg(), reg(), reg())
            .prop_map(|(op, rd, rs1, rs2)| Instruction::Alu { op, rd, rs1, rs2 }),
        (select(imm_ops), reg(), reg(), any::<i32>())
            .prop_map(|(op, rd, rs1, imm)| Instruction::AluImm { op, rd, rs1, imm }),
        (select(BranchCond::ALL.to_vec()), reg(), reg(), 0..LEN).prop_map(
            |(cond, rs1, rs2, target)| Instruction::Branch {
                cond,
                rs1,
                rs2,
                target
            }
        ),
        (reg(), 0..LEN).prop_map(|(rd, target)| Instruction::Jal { rd, target }),
        (reg(), reg(), any::<i32>()).prop_map(|(rd, rs1, imm)| Instruction::Jalr { rd, rs1, imm }),
        (reg(), reg(), any::<i32>()).prop_map(|(rd, base, offset)| Instruction::Lw {
            rd,
            base,
            offset
        }),
        (reg(), reg(), any::<i32>()).prop_map(|(rs, base, offset)| Instruction::Sw {
            rs,
            base,
            offset
        }),
    ]
}

proptest! {
    #[test]
    fn rendered_text_decodes_to_the_same_instruction(inst in instruction()) {
        let text = inst.to_string();
        prop_assert_eq!(decode_line(&text, &Labels::new(), LEN), Ok(inst), "{}", text);
    }
}

#[test]
fn canonical_forms() {
    let cases = [
        (Instruction::AluImm { op: AluOp::Srl, rd: 1, rs1: 2, imm: 3 }, "SRLI x1, x2, 3"),
        (Instruction::Alu { op: AluOp::Sltu, rd: 3, rs1: 4, rs2: 5 }, "SLTU x3, x4, x5"),
        (
            Instruction::Branch { cond: BranchCond::Ltu, rs1: 1, rs2: 0, target: 9 },
            "BLTU x1, x0, @9",
        ),
        (Instruction::Lw { rd: 10, base: 2, offset: -8 }, "LW x10, -8(x2)"),
        (Instruction::Sw { rs: 5, base: 0, offset: 508 }, "SW x5, 508(x0)"),
        (Instruction::Li { rd: 7, imm: -1 }, "LI x7, -1"),
        (Instruction::HartId { rd: 5 }, "HARTID x5"),
    ];
    for (inst, text) in cases {
        assert_eq!(inst.to_string(), text);
    }
}

#[test]
fn listing_has_one_line_per_instruction() {
    let program = [Instruction::Li { rd: 10, imm: 42 }, Instruction::Nop, Instruction::Halt];
    assert_eq!(listing(&program), "LI x10, 42\nNOP\nHALT\n");
    assert_eq!(listing(&[]), "");
}
