//! Per-chart aggregation gate.
//!
//! At most one aggregation per chart is outstanding. A request arriving while
//! one is in flight is deferred, replacing any earlier deferred request, and
//! the in-flight result is discarded when it lands: the last request wins.

use serde::Serialize;

use crate::state::Selection;

/// Handle for one issued aggregation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregationTicket {
    pub generation: u64,
    /// Range event that triggered the aggregation, if any
    pub trigger: Option<Selection>,
}

/// Outcome of asking the gate for an aggregation
#[derive(Clone, Debug, PartialEq)]
pub enum Admission {
    Issued(AggregationTicket),
    /// Another aggregation is in flight; this request runs after it completes
    Deferred,
}

/// What to do with a completed aggregation's result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Apply,
    /// The result belongs to a superseded request
    Discard,
}

#[derive(Clone, Debug, Default)]
pub struct AggregationGate {
    in_flight: Option<u64>,
    pending: Option<Option<Selection>>,
    next_generation: u64,
}

impl AggregationGate {
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn begin(&mut self, trigger: Option<Selection>) -> Admission {
        if let Some(generation) = self.in_flight {
            tracing::debug!(
                "Deferring aggregation while generation {} is in flight",
                generation
            );
            self.pending = Some(trigger);
            return Admission::Deferred;
        }
        Admission::Issued(self.issue(trigger))
    }

    /// Clear the in-flight flag for `ticket` and judge its result
    ///
    /// Must be called for failed aggregations too, otherwise the chart stays
    /// blocked.
    pub fn complete(&mut self, ticket: &AggregationTicket) -> Verdict {
        if self.in_flight != Some(ticket.generation) {
            return Verdict::Discard;
        }
        self.in_flight = None;
        if self.pending.is_some() {
            Verdict::Discard
        } else {
            Verdict::Apply
        }
    }

    /// Issue the deferred request, if any and if nothing is in flight
    pub fn take_pending(&mut self) -> Option<AggregationTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        let trigger = self.pending.take()?;
        Some(self.issue(trigger))
    }

    fn issue(&mut self, trigger: Option<Selection>) -> AggregationTicket {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.in_flight = Some(generation);
        AggregationTicket {
            generation,
            trigger,
        }
    }
}
