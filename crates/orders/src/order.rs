use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ordertrack_core::{CustomerId, DomainError, DomainResult, Entity, OrderId, ValueObject};
use ordertrack_events::Event;

/// Order lifecycle status.
///
/// `Delivered` and `Cancelled` are terminal: no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Created,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in declaration order. Used to test the transition
    /// table exhaustively.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Created,
        OrderStatus::Packed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// The fixed transition table, as data.
    ///
    /// Statuses not listed as a successor of the current one are illegal
    /// targets, self-loops included.
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Created => &[OrderStatus::Packed, OrderStatus::Cancelled],
            OrderStatus::Packed => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Packed => "PACKED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    /// Case-insensitive parse after trimming ("shipped" == "SHIPPED").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CREATED" => Ok(OrderStatus::Created),
            "PACKED" => Ok(OrderStatus::Packed),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// One entry of an order's audit history.
///
/// Immutable once appended. `status` is a string snapshot of the enum value
/// at the moment the entry was written, so history stays readable even if
/// the enum evolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub order_id: OrderId,
    pub status: String,
    pub occurred_at: DateTime<Utc>,
    pub note: String,
}

impl ValueObject for TrackingEvent {}

/// Entity: a tracked purchase order with status and append-only history.
///
/// Invariants (hold after every public operation):
/// - `history` is never empty;
/// - the last history entry's status equals `status`;
/// - `updated_at` equals the last history entry's `occurred_at`.
///
/// The only mutation path is [`Order::transition_to`]; fields are private
/// and readers get immutable views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    history: Vec<TrackingEvent>,
}

impl Order {
    /// Register a new order in `Created` status.
    ///
    /// The current instant is an explicit parameter; the entity never reads
    /// ambient wall-clock time.
    pub fn create(id: OrderId, customer_id: CustomerId, now: DateTime<Utc>) -> Self {
        let created = TrackingEvent {
            order_id: id.clone(),
            status: OrderStatus::Created.as_str().to_string(),
            occurred_at: now,
            note: "Order created".to_string(),
        };
        Self {
            id,
            customer_id,
            status: OrderStatus::Created,
            created_at: now,
            updated_at: now,
            history: vec![created],
        }
    }

    /// Rehydrate an order from stored parts, re-checking the entity
    /// invariants so corrupt records surface at the storage boundary.
    pub fn from_parts(
        id: OrderId,
        customer_id: CustomerId,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        history: Vec<TrackingEvent>,
    ) -> DomainResult<Self> {
        let last = history.last().ok_or_else(|| {
            DomainError::invariant(format!("order {id} has an empty tracking history"))
        })?;
        if last.status != status.as_str() {
            return Err(DomainError::invariant(format!(
                "order {id} status {status} disagrees with last history entry {}",
                last.status
            )));
        }
        if last.occurred_at != updated_at {
            return Err(DomainError::invariant(format!(
                "order {id} updated_at disagrees with last history entry"
            )));
        }
        Ok(Self {
            id,
            customer_id,
            status,
            created_at,
            updated_at,
            history,
        })
    }

    /// Move the order to `target`, recording a history entry.
    ///
    /// Fails with a business-rule violation when the transition table does
    /// not allow the current->target pair; the order is left untouched in
    /// that case (the check runs before any mutation, so status and history
    /// can never diverge).
    pub fn transition_to(
        &mut self,
        target: OrderStatus,
        at: DateTime<Utc>,
        note: impl Into<String>,
    ) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::invariant(format!(
                "cannot transition order from {} to {}",
                self.status, target
            )));
        }

        self.status = target;
        self.updated_at = at;
        self.history.push(TrackingEvent {
            order_id: self.id.clone(),
            status: target.as_str().to_string(),
            occurred_at: at,
            note: note.into(),
        });
        Ok(())
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Immutable view of the audit trail (insertion order = chronological).
    pub fn history(&self) -> &[TrackingEvent] {
        &self.history
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Notification published after every persisted status change (creation
/// included). This is what external consumers see; they never get the
/// entity itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub status: String,
    pub occurred_at: DateTime<Utc>,
}

impl OrderStatusChanged {
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id().clone(),
            customer_id: order.customer_id().clone(),
            status: order.status().as_str().to_string(),
            occurred_at: order.updated_at(),
        }
    }
}

impl Event for OrderStatusChanged {
    fn event_type(&self) -> &'static str {
        "orders.status_changed"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
