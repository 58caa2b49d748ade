//! Debug controller tests.

use moesim_core::common::error::ErrorKind;
use moesim_core::config::{Config, ReplacementPolicy};
use moesim_core::{LineState, SimError, Simulator};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::TestContext;
use crate::common::harness::config;

#[test]
fn fresh_machine_is_zeroed() {
    let sim = Simulator::default();
    assert_eq!(sim.agents(), 1);
    assert_eq!(sim.registers(), [0; 32]);
    assert_eq!(sim.pc(), 0);
    assert_eq!(sim.memory(), [0; 128]);
    assert!(sim.program().is_empty());
    assert!(sim.breakpoints().is_empty());
    assert_eq!(sim.last_error(), None);
    assert_eq!(sim.error_code(), 0);
    assert_eq!(sim.error_message(), "");
    assert!(sim.cache_states().0.iter().flatten().all(|s| *s == LineState::Invalid));
}

#[test]
fn machine_shape_is_clamped() {
    let sim = Simulator::new(config(20, 0, ReplacementPolicy::Fifo));
    assert_eq!(sim.agents(), 8);
    assert_eq!(sim.config().cache.lines, 1);
}

#[test]
fn single_add_then_runs_off_the_end() {
    let mut ctx = TestContext::new().load("ADD r1, r0, r0");
    ctx.step();
    assert_eq!(ctx.reg(0, 1), 0);
    assert_eq!(ctx.sim.pc(), 1);

    assert!(!ctx.sim.step());
    assert_eq!(ctx.sim.error_code(), ErrorKind::Bounds.code());
    assert_eq!(
        ctx.sim.last_error(),
        Some(&SimError::PcOutOfBounds {
            agent: 0,
            pc: 1,
            len: 1
        })
    );
}

#[test]
fn two_writers_leave_the_last_one_modified() {
    let mut ctx = TestContext::with_agents(2).load("hartid t0\naddi t1, t0, 10\nsw t1, 0(zero)\nhalt");
    ctx.steps(3);
    assert_eq!(ctx.state(0, 0), LineState::Invalid);
    assert_eq!(ctx.state(1, 0), LineState::Modified);
    assert_eq!(ctx.word(0), 11);
    assert_eq!(ctx.backing_word(0), 10, "agent 0 flushed when agent 1 took the line");
    ctx.assert_coherent();
}

#[test]
fn run_to_break_stops_on_the_breakpoint_line() {
    let mut ctx = TestContext::new().load("li x1, 1\nli x2, 2\nli x3, 3\nli x4, 4\nhalt");
    assert!(ctx.sim.add_breakpoint(3));
    assert!(ctx.sim.run_to_break());
    assert_eq!(ctx.sim.pc(), 3);
    assert_eq!(ctx.sim.stats().instructions_retired, 3);
    assert_eq!(ctx.reg(0, 3), 3);
    assert_eq!(ctx.reg(0, 4), 0);

    // Running again leaves the breakpoint line first.
    ctx.run();
    assert!(ctx.sim.is_halted(0));
    assert_eq!(ctx.reg(0, 4), 4);
}

#[test]
fn rejected_program_keeps_the_previous_one() {
    let mut ctx = TestContext::new().load("li a0, 1\nli a1, 2\nhalt");
    ctx.step();
    assert!(!ctx.sim.set_code_text("nop\nbogus x1, x2\nhalt"));

    assert_eq!(ctx.sim.error_code(), 1);
    assert_eq!(ctx.sim.last_error().and_then(SimError::pc), Some(1));
    assert!(ctx.sim.error_message().contains("bogus"));
    assert_eq!(ctx.sim.program().len(), 3);
    assert_eq!(ctx.sim.pc(), 1);

    ctx.step();
    assert_eq!(ctx.reg(0, 11), 2);
    assert_eq!(ctx.sim.last_error(), None);
}

#[test]
fn loading_resets_pcs_but_keeps_machine_state() {
    let mut ctx = TestContext::new().load("li a0, 7\nsw a0, 64(zero)\nhalt");
    ctx.run();
    assert!(ctx.sim.all_halted());

    ctx = ctx.load("lw a1, 64(zero)\nhalt");
    assert!(!ctx.sim.is_halted(0));
    assert_eq!(ctx.sim.pc(), 0);
    assert_eq!(ctx.reg(0, 10), 7);
    assert_eq!(ctx.state(0, 64), LineState::Modified);
    ctx.step();
    assert_eq!(ctx.reg(0, 11), 7);
}

#[test]
fn stepping_a_halted_machine_fails() {
    let mut ctx = TestContext::new().load("halt");
    ctx.run();
    assert!(!ctx.sim.step());
    assert_eq!(ctx.sim.last_error(), Some(&SimError::Halted));
    assert_eq!(ctx.sim.error_code(), 4);
    assert!(!ctx.sim.run_to_break());
    assert!(!ctx.sim.run_amount(3));
}

#[test]
fn one_agent_halting_ends_the_run() {
    let program = "hartid t0\nbne t0, zero, @3\nhalt\nli a0, 5\nli a1, 6\nhalt";
    let mut ctx = TestContext::with_agents(2).load(program);
    ctx.run();
    assert!(ctx.sim.is_halted(0));
    assert!(!ctx.sim.is_halted(1));
    assert_eq!(ctx.reg(1, 10), 5);
    assert_eq!(ctx.reg(1, 11), 0);

    ctx.run();
    assert!(ctx.sim.all_halted());
    assert_eq!(ctx.reg(1, 11), 6);
    assert_eq!(ctx.sim.stats().agents[0].retired, 3);
    assert_eq!(ctx.sim.stats().agents[1].retired, 5);
}

#[rstest]
#[case(0, 0)]
#[case(2, 2)]
#[case(10, 4)]
fn run_amount_is_bounded_by_the_budget_and_halt(#[case] budget: u32, #[case] pc: usize) {
    let mut ctx = TestContext::new().load("nop\nnop\nnop\nhalt\nnop");
    assert!(ctx.sim.run_amount(budget));
    assert_eq!(ctx.sim.pc(), pc);
}

#[test]
fn run_amount_stops_at_a_breakpoint() {
    let mut ctx = TestContext::new().load("loop: addi a0, a0, 1\nbeq zero, zero, loop");
    assert!(ctx.sim.add_breakpoint(1));
    assert!(ctx.sim.run_amount(100));
    assert_eq!(ctx.sim.pc(), 1);
    assert_eq!(ctx.reg(0, 10), 1);
    assert!(ctx.sim.run_amount(100));
    assert_eq!(ctx.reg(0, 10), 2);
}

#[test]
fn breakpoints_are_a_set() {
    let mut sim = Simulator::default();
    assert!(sim.add_breakpoint(4));
    assert!(!sim.add_breakpoint(4));
    assert!(sim.add_breakpoint(1));
    assert_eq!(sim.breakpoints().iter().copied().collect::<Vec<_>>(), vec![1, 4]);
    assert!(sim.remove_breakpoint(4));
    assert!(!sim.remove_breakpoint(4));
    sim.clear_breakpoints();
    assert!(sim.breakpoints().is_empty());
}

#[test]
fn reset_discards_everything_but_the_configuration() {
    let mut ctx = TestContext::with_agents(2).load("li a0, 3\nsw a0, 8(zero)\nhalt");
    assert!(ctx.sim.add_breakpoint(2));
    ctx.run();
    assert_eq!(ctx.word(8), 3);

    ctx.sim.reset();
    assert_eq!(ctx.sim.agents(), 2);
    assert_eq!(ctx.sim.registers(), [0; 32]);
    assert_eq!(ctx.sim.memory(), [0; 128]);
    assert_eq!(ctx.state(0, 8), LineState::Invalid);
    assert!(ctx.sim.trace().is_empty());
    assert_eq!(ctx.sim.stats().rounds, 0);
    assert!(ctx.sim.program().is_empty());
    assert!(ctx.sim.breakpoints().is_empty());
    assert!(ctx.sim.last_error().is_none());

    assert!(!ctx.sim.step());
    assert_eq!(ctx.sim.error_code(), 2);
}

#[test]
fn reset_then_reload_runs_from_scratch() {
    let mut ctx = TestContext::new().load("nop\nnop");
    assert!(ctx.sim.add_breakpoint(1));
    ctx.sim.reset();
    assert_eq!(ctx.sim.program().len(), 0);

    ctx = ctx.load("nop\nnop\nhalt");
    ctx.run();
    assert!(ctx.sim.is_halted(0));
    assert_eq!(ctx.sim.stats().rounds, 3);
}

#[test]
fn snapshots_are_idempotent() {
    let mut ctx = TestContext::with_agents(3).load("hartid a0\nsw a0, 0(zero)\nlw a1, 0(zero)\nhalt");
    ctx.steps(3);
    assert_eq!(ctx.sim.memory(), ctx.sim.memory());
    assert_eq!(ctx.sim.cache_states(), ctx.sim.cache_states());
    assert_eq!(ctx.sim.registers_of(2), ctx.sim.registers_of(2));
    assert_eq!(ctx.sim.stats(), ctx.sim.stats());
    assert_eq!(ctx.sim.registers_of(3), None);
    assert_eq!(ctx.sim.pc_of(3), None);
}

#[test]
fn misaligned_access_is_recoverable() {
    let mut ctx = TestContext::new().load("li t0, 2\nlw a0, 0(t0)\nhalt");
    ctx.step();
    assert!(!ctx.sim.step());
    assert_eq!(ctx.sim.error_code(), 3);
    assert_eq!(ctx.sim.pc(), 1);
    assert!(!ctx.sim.is_poisoned());

    ctx = ctx.load("li t0, 4\nlw a0, 0(t0)\nhalt");
    ctx.run();
    assert_eq!(ctx.sim.last_error(), None);
}

#[test]
fn runtime_errors_quote_the_failing_line() {
    let mut ctx = TestContext::new().load("li x1, 6\n  lw x2, 0(x1)   # load\nhalt");
    ctx.step();
    assert!(!ctx.sim.step());
    let msg = ctx.sim.error_message();
    assert!(msg.contains("lw x2, 0(x1)"), "{msg}");
    assert_eq!(msg, "agent 0, line 1 `lw x2, 0(x1)   # load`: misaligned word access at 0x6");
    assert_eq!(ctx.sim.last_error().and_then(SimError::pc), Some(1));

    ctx = ctx.load("li a0, 600\nsw a0, 0(a0)");
    ctx.step();
    assert!(!ctx.sim.step());
    assert!(ctx.sim.error_message().contains("`sw a0, 0(a0)`"));
}

#[test]
fn register_dump_lists_each_agent() {
    let mut ctx = TestContext::with_agents(2).load("hartid t0\nhalt");
    ctx.run();
    let dump = ctx.sim.register_dump(1).unwrap();
    assert_eq!(dump.lines().count(), 16);
    assert!(dump.contains("x5 =0x00000001"), "{dump}");
    assert_eq!(ctx.sim.register_dump(2), None);
}

#[test]
fn memory_view_prefers_dirty_cached_data() {
    let mut ctx = TestContext::new().load("li a0, 0x55\nsw a0, 400(zero)\nhalt");
    ctx.run();
    assert_eq!(ctx.word(400), 0x55);
    assert_eq!(ctx.backing_word(400), 0);
}

#[test]
fn instruction_tracing_does_not_change_results() {
    let mut cfg = Config::default();
    cfg.general.trace_instructions = true;
    let mut ctx = TestContext::with_config(cfg).load("li a0, 2\nslli a0, a0, 3\nhalt");
    ctx.run();
    assert_eq!(ctx.reg(0, 10), 16);
}
