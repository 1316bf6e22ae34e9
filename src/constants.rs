/// Program IDs
pub mod programs {
    /// System program (native SOL transfers)
    pub const SYSTEM: &str = "11111111111111111111111111111111";
}

/// Lamports per SOL (fixed minor-unit divisor)
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Tolerance when matching a recipient's balance increase against the
/// source's outgoing delta. Instruction encodings are not always parseable,
/// so recipient resolution can fall back to balance-diff matching; rent and
/// tiny side effects make exact equality too strict.
pub const RECIPIENT_MATCH_TOLERANCE_LAMPORTS: u64 = 1_000_000;
