//! WebAssembly bindings for the browser front end.
//!
//! Exposes a [`SimState`] handle and free functions under the JavaScript names the
//! front end calls. It provides:
//! 1. **Lifecycle:** `makeSimstate`, `makeSimstateWithConfig`, `setCodeText`, `reset`.
//! 2. **Control:** `step`, `runAmount`, `runToBreak` and the breakpoint calls.
//! 3. **Snapshots:** Registers, coherent and backing memory, cache states into caller buffers.
//! 4. **Errors:** `getErr` and `getErrCode` after a `false` result.
//!
//! Nothing here panics: a caller buffer that is too short is reported as a thrown
//! `Error`.

use js_sys::{Uint8Array, Uint32Array};
use moesim_core::common::constants::{MEM_WORDS, NUM_LINES, NUM_REGS};
use moesim_core::common::error::ErrorKind;
use moesim_core::{Config, Simulator};
use wasm_bindgen::prelude::*;
use web_sys::console;

/// Opaque simulator handle owned by JavaScript.
#[wasm_bindgen]
#[derive(Debug)]
pub struct SimState {
    sim: Simulator,
}

impl SimState {
    /// Logs a protocol violation to the browser console after a failed call.
    fn report(&self, ok: bool) -> bool {
        if !ok
            && let Some(err) = self.sim.last_error()
            && err.kind() == ErrorKind::ProtocolViolation
        {
            console::error_1(&JsValue::from_str(&err.to_string()));
        }
        ok
    }
}

/// Copies `data` into the front of `out`.
fn fill<T: Copy>(out: &mut [T], data: &[T], what: &str) -> Result<(), JsError> {
    let have = out.len();
    let dst = out.get_mut(..data.len()).ok_or_else(|| {
        JsError::new(&format!(
            "{what} buffer holds {have} entries, {} needed",
            data.len()
        ))
    })?;
    dst.copy_from_slice(data);
    Ok(())
}

/// Creates the default single-agent machine.
#[wasm_bindgen(js_name = makeSimstate)]
pub fn make_simstate() -> SimState {
    SimState {
        sim: Simulator::default(),
    }
}

/// Creates a machine from a JSON configuration.
///
/// # Errors
///
/// Throws if the JSON is malformed or out of range.
#[wasm_bindgen(js_name = makeSimstateWithConfig)]
pub fn make_simstate_with_config(json: &str) -> Result<SimState, JsError> {
    let config = Config::from_json(json)?;
    Ok(SimState {
        sim: Simulator::new(config),
    })
}

/// Replaces the program; on a decode error the old program stays and `getErr` explains.
#[wasm_bindgen(js_name = setCodeText)]
pub fn set_code_text(state: &mut SimState, text: &str) -> bool {
    state.sim.set_code_text(text)
}

/// Executes one round.
#[wasm_bindgen]
pub fn step(state: &mut SimState) -> bool {
    let ok = state.sim.step();
    state.report(ok)
}

/// Executes up to `n` rounds, stopping at a breakpoint or `HALT`.
#[wasm_bindgen(js_name = runAmount)]
pub fn run_amount(state: &mut SimState, n: u32) -> bool {
    let ok = state.sim.run_amount(n);
    state.report(ok)
}

/// Runs until a breakpoint, `HALT` or an error.
#[wasm_bindgen(js_name = runToBreak)]
pub fn run_to_break(state: &mut SimState) -> bool {
    let ok = state.sim.run_to_break();
    state.report(ok)
}

/// Sets a breakpoint on a 0-based source line.
#[wasm_bindgen(js_name = addBreakpoint)]
pub fn add_breakpoint(state: &mut SimState, line: usize) -> bool {
    state.sim.add_breakpoint(line)
}

/// Clears the breakpoint on a source line.
#[wasm_bindgen(js_name = removeBreakpoint)]
pub fn remove_breakpoint(state: &mut SimState, line: usize) -> bool {
    state.sim.remove_breakpoint(line)
}

/// Clears every breakpoint.
#[wasm_bindgen(js_name = clearBreakpoints)]
pub fn clear_breakpoints(state: &mut SimState) {
    state.sim.clear_breakpoints();
}

/// Replaces the machine with a fresh one; the program and breakpoints are discarded.
#[wasm_bindgen]
pub fn reset(state: &mut SimState) {
    state.sim.reset();
}

/// Copies agent 0's 32 registers into `out`.
///
/// # Errors
///
/// Throws if `out` is shorter than 32 words.
#[wasm_bindgen(js_name = getRegs)]
pub fn get_regs(state: &SimState, out: &mut [u32]) -> Result<(), JsError> {
    fill(out, &state.sim.registers(), "register")
}

/// Copies `agent`'s 32 registers into `out`.
///
/// # Errors
///
/// Throws if there is no such agent or `out` is too short.
#[wasm_bindgen(js_name = getRegsOf)]
pub fn get_regs_of(state: &SimState, agent: usize, out: &mut [u32]) -> Result<(), JsError> {
    let regs = state
        .sim
        .registers_of(agent)
        .ok_or_else(|| JsError::new(&format!("no agent {agent}")))?;
    fill(out, &regs, "register")
}

/// Returns agent 0's registers as a fresh array.
#[wasm_bindgen(js_name = getRegsArray)]
pub fn get_regs_array(state: &SimState) -> Uint32Array {
    Uint32Array::from(&state.sim.registers()[..])
}

/// Copies the coherent view of memory (128 words, address order) into `out`.
///
/// # Errors
///
/// Throws if `out` is shorter than 128 words.
#[wasm_bindgen(js_name = getMem)]
pub fn get_mem(state: &SimState, out: &mut [u32]) -> Result<(), JsError> {
    fill(out, &state.sim.memory(), "memory")
}

/// Copies the raw memory image, ignoring dirty cached data, into `out`.
///
/// # Errors
///
/// Throws if `out` is shorter than 128 words.
#[wasm_bindgen(js_name = getBackingMem)]
pub fn get_backing_mem(state: &SimState, out: &mut [u32]) -> Result<(), JsError> {
    fill(out, &state.sim.backing_store().words(), "memory")
}

/// Copies the state code (I=0 S=1 E=2 O=3 M=4) of each of the 8 lines of `agent`'s
/// cache into `out`.
///
/// # Errors
///
/// Throws if there is no such agent or `out` is shorter than 8 bytes.
#[wasm_bindgen(js_name = getCacheStates)]
pub fn get_cache_states(state: &SimState, agent: usize, out: &mut [u8]) -> Result<(), JsError> {
    let table = state.sim.cache_states();
    let row = table
        .0
        .get(agent)
        .ok_or_else(|| JsError::new(&format!("no agent {agent}")))?;
    let mut codes = [0u8; NUM_LINES];
    for (code, line) in codes.iter_mut().zip(row) {
        *code = line.code();
    }
    fill(out, &codes, "cache state")
}

/// Returns the cache state codes of every agent, agent-major.
#[wasm_bindgen(js_name = getAllCacheStates)]
pub fn get_all_cache_states(state: &SimState) -> Uint8Array {
    let codes: Vec<u8> = state
        .sim
        .cache_states()
        .0
        .iter()
        .flat_map(|row| row.iter().map(|s| s.code()))
        .collect();
    Uint8Array::from(&codes[..])
}

/// Program counter (0-based line) of agent 0.
#[wasm_bindgen(js_name = getPc)]
pub fn get_pc(state: &SimState) -> usize {
    state.sim.pc()
}

/// Program counter of `agent`, or -1 if there is no such agent.
#[wasm_bindgen(js_name = getPcOf)]
pub fn get_pc_of(state: &SimState, agent: usize) -> i32 {
    state
        .sim
        .pc_of(agent)
        .and_then(|pc| i32::try_from(pc).ok())
        .unwrap_or(-1)
}

/// Whether `agent` has executed `HALT`.
#[wasm_bindgen(js_name = isHalted)]
pub fn is_halted(state: &SimState, agent: usize) -> bool {
    state.sim.is_halted(agent)
}

/// Number of agents.
#[wasm_bindgen(js_name = getAgentCount)]
pub fn get_agent_count(state: &SimState) -> usize {
    state.sim.agents()
}

/// Description of the most recent error; empty when there is none.
#[wasm_bindgen(js_name = getErr)]
pub fn get_err(state: &SimState) -> String {
    state.sim.error_message()
}

/// Code of the most recent error: 0 none, 1 decode, 2 bounds, 3 alignment,
/// 4 halted, 5 protocol violation.
#[wasm_bindgen(js_name = getErrCode)]
pub fn get_err_code(state: &SimState) -> u32 {
    state.sim.error_code()
}

/// 0-based source line of the most recent error, or -1.
#[wasm_bindgen(js_name = getErrLine)]
pub fn get_err_line(state: &SimState) -> i32 {
    state
        .sim
        .last_error()
        .and_then(moesim_core::SimError::pc)
        .and_then(|line| i32::try_from(line).ok())
        .unwrap_or(-1)
}

/// Canonical disassembly of the loaded program.
#[wasm_bindgen(js_name = getListing)]
pub fn get_listing(state: &SimState) -> String {
    state.sim.program().listing()
}

/// Statistics as JSON.
///
/// # Errors
///
/// Throws if serialization fails.
#[wasm_bindgen(js_name = getStatsJson)]
pub fn get_stats_json(state: &SimState) -> Result<String, JsError> {
    Ok(serde_json::to_string(&state.sim.stats())?)
}

/// Coherence trace (oldest first) as JSON.
///
/// # Errors
///
/// Throws if serialization fails.
#[wasm_bindgen(js_name = getTraceJson)]
pub fn get_trace_json(state: &SimState) -> Result<String, JsError> {
    Ok(serde_json::to_string(state.sim.trace())?)
}

/// Register count expected by `getRegs`.
#[wasm_bindgen(js_name = regCount)]
pub fn reg_count() -> usize {
    NUM_REGS
}

/// Word count expected by `getMem`.
#[wasm_bindgen(js_name = memWords)]
pub fn mem_words() -> usize {
    MEM_WORDS
}
