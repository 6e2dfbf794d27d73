//! API models for request and response payloads

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod dashboard;
pub mod invoice;
pub mod order;
pub mod product;
pub mod session;
pub mod table;

pub use dashboard::{Activity, DashboardStats};
pub use invoice::{
    CreateInvoiceRequest, DailyReport, DailyReportQuery, Invoice, InvoiceListQuery,
    InvoiceListResponse, MonthlyReport, MonthlyReportQuery, NewInvoice, ReportTotals,
    UpdateInvoiceStatusRequest,
};
pub use order::{AddOrderRequest, OrderItem, OrdersResponse, SessionOrder, UpdateOrderStatusRequest};
pub use product::{CreateProductRequest, Product, ProductsResponse, UpdateProductRequest};
pub use session::{
    AddMinutesRequest, AmountPreview, EndSessionResponse, ExpireSummary, InvoiceFailure,
    SessionDetails, SessionResponse, SessionsResponse, StartSessionRequest, TableSession,
    UpdatePresetDurationRequest, UpdateRemainingTimeRequest,
};
pub use table::{CreateTableRequest, Table, TableRateResponse, TablesResponse, UpdateRateRequest};

/// A stored status or category value that does not match any known variant
#[derive(Debug, Error, PartialEq)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a string-backed enum stored as a TEXT column.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident : $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    TableStatus: "table status" {
        Available => "available",
        Occupied => "occupied",
        Cleaning => "cleaning",
        Maintenance => "maintenance",
    }
}

text_enum! {
    SessionStatus: "session status" {
        Active => "active",
        Paused => "paused",
        Completed => "completed",
        Expired => "expired",
    }
}

impl SessionStatus {
    /// Completed and expired sessions are never reactivated
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Expired)
    }
}

text_enum! {
    /// How the table time of a session is billed
    SessionType: "session type" {
        FixedTime => "fixed_time",
        OpenPlay => "open_play",
    }
}

impl Default for SessionType {
    fn default() -> Self {
        SessionType::FixedTime
    }
}

text_enum! {
    OrderStatus: "order status" {
        Pending => "pending",
        Preparing => "preparing",
        Served => "served",
        Cancelled => "cancelled",
    }
}

text_enum! {
    InvoiceStatus: "invoice status" {
        Pending => "pending",
        Paid => "paid",
        Cancelled => "cancelled",
    }
}

text_enum! {
    ProductCategory: "product category" {
        Drink => "drink",
        Food => "food",
        Accessory => "accessory",
        Service => "service",
    }
}

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
