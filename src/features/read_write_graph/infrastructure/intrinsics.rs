//! The fixed table of pure / memory-safe intrinsics an external call is
//! checked against before falling back to the conservative "reads and
//! writes everything" `UNKNOWN_MEMORY` DefSite/UseSite pair (spec §4.3:
//! "unless the function is in a fixed table of pure/memory-safe
//! intrinsics").

/// Calls to any of these names have no memory effect beyond their already-
/// modeled operands (`memcpy`/`memmove`/`memset`/`free` are modeled
/// directly and are deliberately absent here; see §4.3 and §6.2's intrinsic
/// classification). `lifetime_end`/`stacksave`/`stackrestore`/`vastart` are
/// bookkeeping-only from the pointer analysis's perspective and never
/// observably read or write program memory.
const PURE_MEMORY_SAFE_INTRINSICS: &[&str] = &[
    "lifetime_start",
    "lifetime_end",
    "stacksave",
    "stackrestore",
    "vastart",
    "vaend",
    "vacopy",
    "llvm.dbg.value",
    "llvm.dbg.declare",
    "llvm.assume",
    "abs",
    "floor",
    "ceil",
    "sqrt",
];

pub fn is_pure_memory_safe(callee_name: &str) -> bool {
    PURE_MEMORY_SAFE_INTRINSICS.contains(&callee_name)
}
