//! Single-slot lookahead cache for the page after the current one
//!
//! Holds at most one page of results plus at most one in-flight fetch. Slots
//! are replaced or cleared whole, never merged, and a fetch that finishes
//! after being superseded or invalidated is dropped on the floor.

use tokio_util::sync::CancellationToken;

use crate::domain::product::PageResult;
use crate::domain::signature::QuerySignature;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchSlot {
    pub signature: QuerySignature,
    pub result: PageResult,
    pub for_page: u32,
}

/// Handle for one background prefetch
#[derive(Debug, Clone)]
pub struct PrefetchTicket {
    id: u64,
    pub token: CancellationToken,
    pub signature: QuerySignature,
    pub for_page: u32,
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
pub struct PrefetchCache {
    slot: Option<PrefetchSlot>,
    in_flight: Option<InFlight>,
    next_id: u64,
}

impl PrefetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a result, overwriting whatever was resident
    pub fn set(&mut self, signature: QuerySignature, for_page: u32, result: PageResult) {
        self.slot = Some(PrefetchSlot { signature, result, for_page });
    }

    /// Consumes the slot if its signature matches exactly; a mismatch is a plain miss
    pub fn take(&mut self, signature: &QuerySignature) -> Option<PrefetchSlot> {
        if self.slot.as_ref().is_some_and(|slot| slot.signature == *signature) {
            self.slot.take()
        } else {
            None
        }
    }

    pub const fn peek(&self) -> Option<&PrefetchSlot> {
        self.slot.as_ref()
    }

    pub const fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Clears the slot and cancels the in-flight fetch
    pub fn invalidate(&mut self) {
        self.slot = None;
        self.cancel_in_flight();
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.token.cancel();
        }
    }

    /// Starts tracking a new prefetch; the previous slot and fetch are discarded
    pub fn begin(&mut self, signature: QuerySignature, for_page: u32) -> PrefetchTicket {
        self.invalidate();
        self.next_id += 1;
        let token = CancellationToken::new();
        self.in_flight = Some(InFlight {
            id: self.next_id,
            token: token.clone(),
        });
        PrefetchTicket {
            id: self.next_id,
            token,
            signature,
            for_page,
        }
    }

    /// Lands a finished fetch. Returns false (and stores nothing) when the
    /// ticket was superseded or cancelled in the meantime.
    pub fn complete(&mut self, ticket: PrefetchTicket, result: PageResult) -> bool {
        if !self.is_current(&ticket) {
            return false;
        }
        self.in_flight = None;
        self.set(ticket.signature, ticket.for_page, result);
        true
    }

    /// Forgets a failed fetch without touching the slot
    pub fn abandon(&mut self, ticket: &PrefetchTicket) {
        if self.is_current(ticket) {
            self.in_flight = None;
        }
    }

    fn is_current(&self, ticket: &PrefetchTicket) -> bool {
        !ticket.token.is_cancelled() && self.in_flight.as_ref().is_some_and(|f| f.id == ticket.id)
    }
}
