//! Instruction execution tests.
//!
//! These drive `execute` directly against a bare bus, without the scheduler.

use moesim_core::SimError;
use moesim_core::common::addr::WordAddr;
use moesim_core::config::CacheConfig;
use moesim_core::core::Agent;
use moesim_core::core::execute::execute;
use moesim_core::isa::Instruction;
use moesim_core::sim::loader;
use moesim_core::soc::CoherenceBus;
use pretty_assertions::assert_eq;
use rstest::rstest;

struct Machine {
    agents: Vec<Agent>,
    bus: CoherenceBus,
    code: Vec<Instruction>,
}

impl Machine {
    fn new(agents: usize, text: &str) -> Self {
        let config = CacheConfig::default();
        Self {
            agents: (0..agents).map(|id| Agent::new(id, &config)).collect(),
            bus: CoherenceBus::new(64),
            code: loader::load(text).unwrap().instructions().to_vec(),
        }
    }

    fn exec(&mut self, id: usize) -> Result<Instruction, SimError> {
        execute(&mut self.agents, id, &self.code, &mut self.bus)
    }

    fn exec_n(&mut self, id: usize, n: usize) {
        for _ in 0..n {
            let _ = self.exec(id).unwrap();
        }
    }

    fn reg(&self, id: usize, idx: usize) -> u32 {
        self.agents[id].regs.read(idx)
    }

    fn pc(&self, id: usize) -> usize {
        self.agents[id].regs.pc
    }
}

#[test]
fn arithmetic_wraps_at_32_bits() {
    let mut m = Machine::new(
        1,
        "li x1, 7\nli x2, -3\nmul x3, x1, x2\naddi x4, x3, 1\nsub x5, x0, x1\nli x6, 0x7fffffff\naddi x6, x6, 1",
    );
    m.exec_n(0, 7);
    assert_eq!(m.reg(0, 3), (-21i32) as u32);
    assert_eq!(m.reg(0, 4), (-20i32) as u32);
    assert_eq!(m.reg(0, 5), (-7i32) as u32);
    assert_eq!(m.reg(0, 6), 0x8000_0000);
    assert_eq!(m.pc(0), 7);
}

#[test]
fn writes_to_x0_are_discarded() {
    let mut m = Machine::new(1, "li x0, 5\naddi zero, zero, 1\nmv x1, x0");
    m.exec_n(0, 3);
    assert_eq!(m.reg(0, 0), 0);
    assert_eq!(m.reg(0, 1), 0);
}

#[rstest]
#[case("beq x1, x0, @4", 3)]
#[case("bne x1, x0, @4", 4)]
#[case("blt x2, x1, @4", 4)]
#[case("bltu x2, x1, @4", 3)]
#[case("bge x1, x2, @4", 4)]
#[case("bgeu x1, x2, @4", 3)]
fn branches_compare_signed_and_unsigned(#[case] branch: &str, #[case] pc: usize) {
    // x1 = 1, x2 = -1
    let text = format!("li x1, 1\nli x2, -1\n{branch}\nnop\nnop");
    let mut m = Machine::new(1, &text);
    m.exec_n(0, 3);
    assert_eq!(m.pc(0), pc);
}

#[test]
fn jumps_link_the_next_line() {
    let mut m = Machine::new(1, "jal ra, target\nnop\ntarget: jalr x5, ra, 1");
    let _ = m.exec(0).unwrap();
    assert_eq!((m.pc(0), m.reg(0, 1)), (2, 1));
    let _ = m.exec(0).unwrap();
    assert_eq!((m.pc(0), m.reg(0, 5)), (2, 3));
}

#[test]
fn jalr_past_the_end_faults_on_the_next_fetch() {
    let mut m = Machine::new(1, "li t0, 40\njalr x0, t0, 0");
    m.exec_n(0, 2);
    assert_eq!(m.pc(0), 40);
    assert_eq!(
        m.exec(0),
        Err(SimError::PcOutOfBounds {
            agent: 0,
            pc: 40,
            len: 2
        })
    );
}

#[test]
fn hartid_reports_the_executing_agent() {
    let mut m = Machine::new(3, "hartid a0");
    let _ = m.exec(2).unwrap();
    let _ = m.exec(1).unwrap();
    assert_eq!(m.reg(2, 10), 2);
    assert_eq!(m.reg(1, 10), 1);
    assert_eq!(m.reg(0, 10), 0);
}

#[test]
fn store_then_load_goes_through_the_cache() {
    let mut m = Machine::new(1, "li x1, 0x40\nli x2, 99\nsw x2, 4(x1)\nlw x3, 4(x1)");
    m.exec_n(0, 4);
    assert_eq!(m.reg(0, 3), 99);

    let addr = WordAddr::new(0x44).unwrap();
    assert_eq!(m.bus.memory().read_u32(addr), 0, "dirty data stays in the cache");
    assert_eq!(m.bus.coherent_line(&m.agents, addr.line())[1], 99);
    assert_eq!(m.agents[0].cache.hits, 1);
    assert_eq!(m.agents[0].cache.misses, 1);
}

#[rstest]
#[case("li x1, 510\nlw x2, 0(x1)", SimError::AddressOutOfBounds { agent: 0, pc: 1, text: String::new(), addr: 510 })]
#[case("li x1, 6\nlw x2, 0(x1)", SimError::Misaligned { agent: 0, pc: 1, text: String::new(), addr: 6 })]
#[case("li x1, 6\nsw x1, 0(x1)", SimError::Misaligned { agent: 0, pc: 1, text: String::new(), addr: 6 })]
#[case("nop\nlw x2, -4(x0)", SimError::AddressOutOfBounds { agent: 0, pc: 1, text: String::new(), addr: 0xFFFF_FFFC })]
#[case("nop\nsw x2, 512(zero)", SimError::AddressOutOfBounds { agent: 0, pc: 1, text: String::new(), addr: 512 })]
fn faulting_access_has_no_effect(#[case] text: &str, #[case] expected: SimError) {
    let mut m = Machine::new(1, text);
    let _ = m.exec(0).unwrap();
    let before = m.agents[0].regs.clone();
    assert_eq!(m.exec(0), Err(expected));
    assert_eq!(m.agents[0].regs, before);
    assert_eq!(m.bus.transactions(), 0);
}

#[test]
fn halt_advances_and_marks_the_agent() {
    let mut m = Machine::new(1, "halt\nnop");
    assert_eq!(m.exec(0), Ok(Instruction::Halt));
    assert!(m.agents[0].halted);
    assert_eq!(m.pc(0), 1);
}

#[test]
fn fetch_past_the_end_is_a_bounds_error() {
    let mut m = Machine::new(1, "nop");
    let _ = m.exec(0).unwrap();
    assert_eq!(
        m.exec(0),
        Err(SimError::PcOutOfBounds {
            agent: 0,
            pc: 1,
            len: 1
        })
    );
}
