//! Register naming.
//!
//! Maps textual register names onto register indices. Three spellings are accepted
//! for every register: `xN`, `rN`, and the RISC-V ABI name (`zero`, `ra`, `sp`, ...).

use std::sync::LazyLock;

use regex::Regex;

use crate::common::constants::NUM_REGS;

/// ABI register names for x0 through x31.
pub const REG_NAMES: [&str; NUM_REGS] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// `xN` or `rN` with no leading zero.
#[allow(clippy::expect_used)]
static NUMERIC_REG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[xr](?P<num>0|[1-9][0-9]*)$").expect("register pattern is a literal")
});

/// Parses a register operand.
///
/// Matching is case-insensitive. `fp` is accepted as an alias of `s0`.
///
/// # Arguments
///
/// * `name` - The operand text, already trimmed.
///
/// # Returns
///
/// The register index, or `None` if the text names no register.
pub fn parse_reg(name: &str) -> Option<usize> {
    let lower = name.to_ascii_lowercase();
    if let Some(caps) = NUMERIC_REG.captures(&lower) {
        return caps
            .name("num")
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .filter(|&idx| idx < NUM_REGS);
    }
    if lower == "fp" {
        return Some(8);
    }
    REG_NAMES.iter().position(|&abi| abi == lower)
}
