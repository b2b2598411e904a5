//! Greedy overlap resolution of candidate spans.

use tracing::debug;

use crate::models::span::{EntitySpan, ResolvedSpanSet};

/// Deterministic greedy resolver.
///
/// Candidates are visited by ascending start, longer spans first at equal
/// start (label order breaks any remaining tie). A span is kept only if
/// none of its offsets were claimed by a span kept before it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapResolver;

impl OverlapResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, spans: Vec<EntitySpan>) -> ResolvedSpanSet {
        self.resolve_counted(spans).0
    }

    /// Resolve and also report how many candidates were dropped.
    pub fn resolve_counted(&self, mut spans: Vec<EntitySpan>) -> (ResolvedSpanSet, usize) {
        spans.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| b.len().cmp(&a.len()))
                .then_with(|| a.label.cmp(&b.label))
        });

        let total = spans.len();
        let mut kept: Vec<EntitySpan> = Vec::with_capacity(total);
        // Visiting by start means the claimed offsets always form a prefix
        // ending at the furthest kept end.
        let mut claimed_until = 0;

        for span in spans {
            if span.is_empty() {
                continue;
            }
            if span.start >= claimed_until {
                claimed_until = claimed_until.max(span.end);
                kept.push(span);
            } else {
                debug!("Dropping conflicting span {}", span);
            }
        }

        let dropped = total - kept.len();
        (ResolvedSpanSet::from_disjoint(kept), dropped)
    }
}
