//! Decoded instruction representation.
//!
//! An [`Instruction`] is the typed form of one source line. Operands are register
//! indices, sign-extended immediates and already-resolved branch targets (0-based
//! program lines), so execution never looks at text again.

/// Register-register and register-immediate ALU operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Wrapping multiplication (low 32 bits). Register form only.
    Mul,
    /// Logical shift left by the low 5 bits of the second operand.
    Sll,
    /// Logical shift right by the low 5 bits of the second operand.
    Srl,
    /// Arithmetic shift right by the low 5 bits of the second operand.
    Sra,
    /// Signed set-less-than (1 or 0).
    Slt,
    /// Unsigned set-less-than (1 or 0).
    Sltu,
}

impl AluOp {
    /// Every ALU operation, in mnemonic table order.
    pub const ALL: [Self; 11] = [
        Self::Add,
        Self::Sub,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Mul,
        Self::Sll,
        Self::Srl,
        Self::Sra,
        Self::Slt,
        Self::Sltu,
    ];

    /// Computes the operation on two 32-bit operands.
    pub const fn apply(self, a: u32, b: u32) -> u32 {
        match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::And => a & b,
            Self::Or => a | b,
            Self::Xor => a ^ b,
            Self::Mul => a.wrapping_mul(b),
            Self::Sll => a.wrapping_shl(b),
            Self::Srl => a.wrapping_shr(b),
            Self::Sra => (a as i32).wrapping_shr(b) as u32,
            Self::Slt => ((a as i32) < (b as i32)) as u32,
            Self::Sltu => (a < b) as u32,
        }
    }

    /// Canonical register-form mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Mul => "MUL",
            Self::Sll => "SLL",
            Self::Srl => "SRL",
            Self::Sra => "SRA",
            Self::Slt => "SLT",
            Self::Sltu => "SLTU",
        }
    }

    /// Canonical immediate-form mnemonic, if the operation has one.
    pub const fn imm_mnemonic(self) -> Option<&'static str> {
        Some(match self {
            Self::Add => "ADDI",
            Self::Sub => "SUBI",
            Self::And => "ANDI",
            Self::Or => "ORI",
            Self::Xor => "XORI",
            Self::Mul => return None,
            Self::Sll => "SLLI",
            Self::Srl => "SRLI",
            Self::Sra => "SRAI",
            Self::Slt => "SLTI",
            Self::Sltu => "SLTIU",
        })
    }
}

/// Conditions tested by the compare-and-branch instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchCond {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Signed less than.
    Lt,
    /// Signed greater or equal.
    Ge,
    /// Unsigned less than.
    Ltu,
    /// Unsigned greater or equal.
    Geu,
}

impl BranchCond {
    /// Every branch condition, in mnemonic table order.
    pub const ALL: [Self; 6] = [Self::Eq, Self::Ne, Self::Lt, Self::Ge, Self::Ltu, Self::Geu];

    /// Evaluates the condition on two register values.
    pub const fn holds(self, a: u32, b: u32) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Lt => (a as i32) < (b as i32),
            Self::Ge => (a as i32) >= (b as i32),
            Self::Ltu => a < b,
            Self::Geu => a >= b,
        }
    }

    /// Canonical mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Eq => "BEQ",
            Self::Ne => "BNE",
            Self::Lt => "BLT",
            Self::Ge => "BGE",
            Self::Ltu => "BLTU",
            Self::Geu => "BGEU",
        }
    }
}

/// A decoded instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Instruction {
    /// Does nothing. Blank, comment-only and label-only lines decode to this.
    #[default]
    Nop,
    /// Stops the executing agent.
    Halt,
    /// `rd = executing agent id`.
    HartId {
        /// Destination register.
        rd: usize,
    },
    /// `rd = rs`.
    Mv {
        /// Destination register.
        rd: usize,
        /// Source register.
        rs: usize,
    },
    /// `rd = imm`.
    Li {
        /// Destination register.
        rd: usize,
        /// Immediate, stored as its 32-bit two's complement pattern.
        imm: i32,
    },
    /// `rd = rs1 op rs2`.
    Alu {
        /// Operation.
        op: AluOp,
        /// Destination register.
        rd: usize,
        /// First source register.
        rs1: usize,
        /// Second source register.
        rs2: usize,
    },
    /// `rd = rs1 op imm`.
    AluImm {
        /// Operation (never [`AluOp::Mul`]).
        op: AluOp,
        /// Destination register.
        rd: usize,
        /// Source register.
        rs1: usize,
        /// Immediate operand.
        imm: i32,
    },
    /// `if rs1 cond rs2 { pc = target }`.
    Branch {
        /// Condition.
        cond: BranchCond,
        /// First compared register.
        rs1: usize,
        /// Second compared register.
        rs2: usize,
        /// Resolved target line.
        target: usize,
    },
    /// `rd = pc + 1; pc = target`.
    Jal {
        /// Link register.
        rd: usize,
        /// Resolved target line.
        target: usize,
    },
    /// `rd = pc + 1; pc = rs1 + imm`.
    Jalr {
        /// Link register.
        rd: usize,
        /// Base register holding a line number.
        rs1: usize,
        /// Line offset.
        imm: i32,
    },
    /// `rd = mem32[base + offset]`.
    Lw {
        /// Destination register.
        rd: usize,
        /// Base address register.
        base: usize,
        /// Byte offset.
        offset: i32,
    },
    /// `mem32[base + offset] = rs`.
    Sw {
        /// Register whose value is stored.
        rs: usize,
        /// Base address register.
        base: usize,
        /// Byte offset.
        offset: i32,
    },
}

/// Instruction categories counted by the statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstClass {
    /// Register or immediate arithmetic, moves and `HARTID`.
    Alu,
    /// `LW`.
    Load,
    /// `SW`.
    Store,
    /// Branches and jumps.
    Branch,
    /// `NOP` and `HALT`.
    Other,
}

impl Instruction {
    /// Returns the statistics category of the instruction.
    pub const fn class(&self) -> InstClass {
        match self {
            Self::Nop | Self::Halt => InstClass::Other,
            Self::HartId { .. }
            | Self::Mv { .. }
            | Self::Li { .. }
            | Self::Alu { .. }
            | Self::AluImm { .. } => InstClass::Alu,
            Self::Branch { .. } | Self::Jal { .. } | Self::Jalr { .. } => InstClass::Branch,
            Self::Lw { .. } => InstClass::Load,
            Self::Sw { .. } => InstClass::Store,
        }
    }
}
