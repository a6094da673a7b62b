//! The "diagnostics channel" of spec §7: locally-recovered conditions that
//! are reported to a host application via `tracing` rather than surfaced as
//! `Err` (`tracing::warn!`/`tracing::debug!` at recovery points).

/// A pointer-analysis constraint referenced an offset or size that could
/// not be determined statically; the affected interval was widened to
/// `UNKNOWN` (spec §3.1, §7).
pub fn widen_to_unknown(context: &str, reason: &str) {
    tracing::debug!(context, reason, "widened interval to UNKNOWN");
}

/// A construct fell outside this analysis's supported subset (spec §1
/// Non-goals): inline assembly, `setjmp`/`longjmp`, or a call through an
/// unresolved indirect target with no candidate callees. The construct is
/// treated conservatively (as if it could read/write anything reachable)
/// and the analysis continues.
pub fn out_of_scope_construct(site: &str, construct: &str) {
    tracing::warn!(site, construct, "out-of-scope construct widened conservatively");
}

/// A strong (replacing) update was performed at `site` because the
/// pointer analysis determined a unique, must-point-to target (spec
/// §4.2's "strong update" rule).
pub fn strong_update(site: &str, target: &str) {
    tracing::debug!(site, target, "strong update");
}

/// A write could not be proven to hit a unique target, so the definition
/// was added rather than replacing prior definitions (spec §4.2/§4.4's
/// "weak update" rule).
pub fn weak_update(site: &str, target: &str) {
    tracing::debug!(site, target, "weak update");
}

/// A node was dropped during sweep (spec §5.2) because it became
/// unreachable from any retained control-flow successor of a marked node,
/// not because it was itself unmarked.
pub fn unreachable_artifact_pruned(node: &str) {
    tracing::debug!(node, "pruned unreachable artifact during sweep");
}
