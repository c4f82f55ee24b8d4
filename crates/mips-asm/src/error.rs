/// Assembly failures. `line` is the 1-based source line the error was
/// found on.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },
    #[error("line {line}: unknown register `{token}`")]
    UnknownRegister { line: usize, token: String },
    #[error("line {line}: bad immediate `{token}`")]
    BadImmediate { line: usize, token: String },
    #[error("line {line}: `{mnemonic}` expects {expected} operand(s), found {found}")]
    OperandCount {
        line: usize,
        mnemonic: String,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: bad memory operand `{token}`, expected imm($reg)")]
    BadMemOperand { line: usize, token: String },
    #[error("line {line}: unresolved label `{label}`")]
    UnresolvedLabel { line: usize, label: String },
    #[error("line {line}: label `{label}` already defined")]
    DuplicateLabel { line: usize, label: String },
    #[error("line {line}: label `{label}` is not followed by an instruction")]
    DanglingLabel { line: usize, label: String },
    #[error("line {line}: unknown directive `{directive}`")]
    UnknownDirective { line: usize, directive: String },
    #[error("line {line}: `.space {count}` does not fit in simulated memory")]
    SpaceTooLarge { line: usize, count: i64 },
    #[error("line {line}: malformed string literal")]
    BadString { line: usize },
}
