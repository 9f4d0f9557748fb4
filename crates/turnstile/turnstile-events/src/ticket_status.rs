use serde::Serialize;

/// The public view of the ticket pool pushed to observers.
///
/// Field names on the wire follow the dashboard's camelCase schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStatus {
    /// Tickets currently sitting in the pool (0 once the pool is closed)
    pub available_tickets: u32,
    /// Tickets released into the pool since the run started
    pub total_released: u32,
    /// Every ticket the capacity allows has been released
    pub supply_exhausted: bool,
    /// The run is sold out; no further purchases succeed
    pub demand_exhausted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusEvent;

    #[test]
    fn status_event_is_tagged_by_topic() {
        let ev = StatusEvent::Status(TicketStatus {
            available_tickets: 3,
            total_released: 10,
            supply_exhausted: false,
            demand_exhausted: false,
        });
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["topic"], "status");
        assert_eq!(json["payload"]["availableTickets"], 3);
        assert_eq!(json["payload"]["totalReleased"], 10);
        assert_eq!(json["payload"]["supplyExhausted"], false);
    }
}
