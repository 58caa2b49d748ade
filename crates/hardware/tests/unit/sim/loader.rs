//! Program loader tests.

use moesim_core::common::error::{DecodeError, DecodeErrorKind};
use moesim_core::isa::{BranchCond, Instruction};
use moesim_core::sim::loader::load;
use pretty_assertions::assert_eq;

#[test]
fn forward_labels_resolve() {
    let program = load("start: beq x0, x0, end\n  nop  \nend: halt").unwrap();
    assert_eq!(program.len(), 3);
    assert_eq!(
        program.instructions()[0],
        Instruction::Branch {
            cond: BranchCond::Eq,
            rs1: 0,
            rs2: 0,
            target: 2
        }
    );
    assert_eq!(program.labels().get("end"), Some(&2));
    assert_eq!(program.labels().get("start"), Some(&0));
    assert_eq!(program.source_line(1), Some("nop"));
    assert_eq!(program.source_line(3), None);
}

#[test]
fn empty_text_is_an_empty_program() {
    let program = load("").unwrap();
    assert!(program.is_empty());
    assert_eq!(program.listing(), "");
}

#[test]
fn crlf_line_endings_are_accepted() {
    let program = load("li a0, 1\r\nhalt\r\n").unwrap();
    assert_eq!(program.instructions(), &[Instruction::Li { rd: 10, imm: 1 }, Instruction::Halt]);
}

#[test]
fn lowest_bad_line_is_reported() {
    let err = load("nop\nFROB x1\n9bad: nop\nADD x1").unwrap_err();
    assert_eq!(
        err,
        DecodeError {
            line: 1,
            text: "FROB x1".to_owned(),
            kind: DecodeErrorKind::UnknownMnemonic("FROB".to_owned()),
        }
    );
    assert_eq!(err.to_string(), "line 1: unknown mnemonic `FROB` in `FROB x1`");
}

#[test]
fn label_errors_on_earlier_lines_win_over_decode_errors() {
    let err = load("1x: nop\nFROB").unwrap_err();
    assert_eq!(err.line, 0);
    assert_eq!(err.kind, DecodeErrorKind::BadLabel("1x".to_owned()));
}

#[test]
fn duplicate_labels_name_the_first_definition() {
    let err = load("a: nop\nb: nop\n  a: halt").unwrap_err();
    assert_eq!(err.line, 2);
    assert_eq!(
        err.kind,
        DecodeErrorKind::DuplicateLabel {
            label: "a".to_owned(),
            first: 0
        }
    );
}

#[test]
fn loading_is_deterministic() {
    let text = "loop: lw a0, 0(sp)\naddi sp, sp, 4\nbne a0, zero, loop\nhalt";
    assert_eq!(load(text), load(text));
}

#[test]
fn listing_decodes_back_to_the_same_program() {
    let text = "hartid t0\nloop: addi t0, t0, -1\nbne t0, zero, loop\nsw t0, 0x10(sp)\nhalt";
    let program = load(text).unwrap();
    let again = load(&program.listing()).unwrap();
    assert_eq!(again.instructions(), program.instructions());
}
