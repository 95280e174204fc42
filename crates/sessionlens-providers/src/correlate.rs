use std::collections::HashMap;

/// One side of a call/result pair that is still waiting for its partner.
#[derive(Debug)]
pub enum Pending<C, R> {
    AwaitingResult(C),
    AwaitingCall(R),
}

/// Bidirectional pending-match table for tool call/result correlation.
///
/// Keyed by the provider call id; tolerates either arrival order. Streaming
/// UIs can flush a tool result before the call that produced it, and some
/// tools separate a call from its result by an arbitrary number of
/// intervening lines, so neither side may assume the other was seen first.
///
/// Used by both log adapters and by the message feed assembler.
#[derive(Debug)]
pub struct PendingTable<C, R> {
    slots: HashMap<String, Pending<C, R>>,
    order: Vec<String>,
}

impl<C, R> Default for PendingTable<C, R> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<C, R> PendingTable<C, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the call side. If the result arrived first, the entry is
    /// consumed and the buffered result is returned.
    pub fn register_call(&mut self, id: &str, call: C) -> Option<R> {
        match self.slots.remove(id) {
            Some(Pending::AwaitingCall(result)) => Some(result),
            Some(Pending::AwaitingResult(_)) | None => {
                self.insert(id, Pending::AwaitingResult(call));
                None
            }
        }
    }

    /// Register the result side. If the call arrived first, the entry is
    /// consumed and the buffered call is returned.
    pub fn register_result(&mut self, id: &str, result: R) -> Option<C> {
        match self.slots.remove(id) {
            Some(Pending::AwaitingResult(call)) => Some(call),
            Some(Pending::AwaitingCall(_)) | None => {
                self.insert(id, Pending::AwaitingCall(result));
                None
            }
        }
    }

    /// Remove and return everything still unmatched, in first-seen order.
    pub fn drain(&mut self) -> Vec<(String, Pending<C, R>)> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.slots.remove(&id).map(|slot| (id, slot)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn insert(&mut self, id: &str, slot: Pending<C, R>) {
        if !self.slots.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.slots.insert(id.to_string(), slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_then_result() {
        let mut table: PendingTable<&str, &str> = PendingTable::new();
        assert!(table.register_call("c1", "bash").is_none());
        assert_eq!(table.register_result("c1", "ok"), Some("bash"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_result_then_call() {
        let mut table: PendingTable<&str, &str> = PendingTable::new();
        assert!(table.register_result("c1", "ok").is_none());
        assert_eq!(table.register_call("c1", "bash"), Some("ok"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_interleaved_ids_do_not_cross_match() {
        let mut table: PendingTable<&str, &str> = PendingTable::new();
        assert!(table.register_call("c1", "bash").is_none());
        assert!(table.register_call("c2", "read").is_none());
        assert_eq!(table.register_result("c2", "file contents"), Some("read"));
        assert_eq!(table.register_result("c1", "exit 0"), Some("bash"));
    }

    #[test]
    fn test_drain_preserves_first_seen_order() {
        let mut table: PendingTable<&str, &str> = PendingTable::new();
        table.register_result("r2", "late");
        table.register_call("c9", "bash");
        table.register_result("r1", "later");

        let ids: Vec<String> = table.drain().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["r2", "c9", "r1"]);
        assert!(table.is_empty());
    }
}
