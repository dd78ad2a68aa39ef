use super::value_objects::OrderStatus;

// ============================================================================
// Order Lifecycle Policy
// ============================================================================
//
//   pending -> confirmed -> assigned -> on_way -> delivered
//      \           \            \          \
//       +-----------+------------+----------+--> canceled
//
// delivered and canceled are terminal.
//
// ============================================================================

/// Statuses reachable from `from` in a single step.
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    match from {
        OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Canceled],
        OrderStatus::Confirmed => &[OrderStatus::Assigned, OrderStatus::Canceled],
        OrderStatus::Assigned => &[OrderStatus::OnWay, OrderStatus::Canceled],
        OrderStatus::OnWay => &[OrderStatus::Delivered, OrderStatus::Canceled],
        OrderStatus::Delivered | OrderStatus::Canceled => &[],
    }
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        allowed_transitions(*self).is_empty()
    }
}
