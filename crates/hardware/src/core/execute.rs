//! Instruction Execution.
//!
//! This module executes one instruction for one agent. It performs:
//! 1. **Fetch:** Bounds-checked lookup of the instruction at the agent's program counter.
//! 2. **Execute:** Register arithmetic, branches and jumps, `HALT` and `HARTID`.
//! 3. **Memory:** Address validation, then loads and stores through the coherence bus.
//! 4. **Retire:** Register write and program counter update.
//!
//! A failing instruction has no architectural effect: every check that can fail runs
//! before the destination register or the program counter is written.

use crate::common::addr::{AddrFault, WordAddr};
use crate::common::error::SimError;
use crate::core::agent::Agent;
use crate::isa::instruction::Instruction;
use crate::soc::interconnect::CoherenceBus;

/// Validates the effective address of a load or store issued by `agent` at `pc`.
fn effective_addr(agent: &Agent, base: usize, offset: i32) -> Result<WordAddr, SimError> {
    let raw = agent.regs.read(base).wrapping_add(offset as u32);
    WordAddr::new(raw).map_err(|fault| match fault {
        AddrFault::OutOfRange => SimError::AddressOutOfBounds {
            agent: agent.id,
            pc: agent.regs.pc,
            text: String::new(),
            addr: raw,
        },
        AddrFault::Misaligned => SimError::Misaligned {
            agent: agent.id,
            pc: agent.regs.pc,
            text: String::new(),
            addr: raw,
        },
    })
}

/// Executes the instruction at agent `id`'s program counter.
///
/// # Arguments
///
/// * `agents` - Every agent; the bus needs the others to snoop.
/// * `id` - Index of the executing agent.
/// * `code` - The loaded program.
/// * `bus` - Coherence bus for loads and stores.
///
/// # Returns
///
/// The retired instruction.
///
/// # Errors
///
/// [`SimError::PcOutOfBounds`] if the program counter is past the program,
/// [`SimError::AddressOutOfBounds`] or [`SimError::Misaligned`] for bad memory
/// operands, and any protocol violation raised by the bus. Memory faults leave the
/// source text empty for the caller to fill in.
pub fn execute(
    agents: &mut [Agent],
    id: usize,
    code: &[Instruction],
    bus: &mut CoherenceBus,
) -> Result<Instruction, SimError> {
    let pc = agents[id].regs.pc;
    let inst = *code.get(pc).ok_or(SimError::PcOutOfBounds {
        agent: id,
        pc,
        len: code.len(),
    })?;
    let next = pc + 1;
    let link = next as u32;

    let (write, next_pc) = {
        let agent = &agents[id];
        let r = |idx: usize| agent.regs.read(idx);
        match inst {
            Instruction::Nop | Instruction::Halt => (None, next),
            Instruction::HartId { rd } => (Some((rd, id as u32)), next),
            Instruction::Mv { rd, rs } => (Some((rd, r(rs))), next),
            Instruction::Li { rd, imm } => (Some((rd, imm as u32)), next),
            Instruction::Alu { op, rd, rs1, rs2 } => (Some((rd, op.apply(r(rs1), r(rs2)))), next),
            Instruction::AluImm { op, rd, rs1, imm } => {
                (Some((rd, op.apply(r(rs1), imm as u32))), next)
            }
            Instruction::Branch {
                cond,
                rs1,
                rs2,
                target,
            } => (None, if cond.holds(r(rs1), r(rs2)) { target } else { next }),
            Instruction::Jal { rd, target } => (Some((rd, link)), target),
            Instruction::Jalr { rd, rs1, imm } => {
                let target = r(rs1).wrapping_add(imm as u32) as usize;
                (Some((rd, link)), target)
            }
            Instruction::Lw { rd, base, offset } => {
                let addr = effective_addr(agent, base, offset)?;
                let value = bus.load(agents, id, addr)?;
                (Some((rd, value)), next)
            }
            Instruction::Sw { rs, base, offset } => {
                let addr = effective_addr(agent, base, offset)?;
                let value = r(rs);
                bus.store(agents, id, addr, value)?;
                (None, next)
            }
        }
    };

    let agent = &mut agents[id];
    if let Some((rd, value)) = write {
        agent.regs.write(rd, value);
    }
    agent.regs.pc = next_pc;
    if inst == Instruction::Halt {
        agent.halted = true;
    }
    Ok(inst)
}
