//! Request validation
//!
//! Checks that run before any query. Each returns a message suitable for the
//! `error` field of a 400 response.

use crate::models::{
    CreateInvoiceRequest, CreateProductRequest, CreateTableRequest, InvoiceListQuery, OrderItem,
    StartSessionRequest, UpdateProductRequest,
};

pub const MIN_DURATION_MINUTES: i32 = 1;
pub const MAX_DURATION_MINUTES: i32 = 480;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

fn require_name(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    if value.chars().count() > 100 {
        return Err(format!("{} must be at most 100 characters long", field));
    }
    Ok(())
}

fn require_non_negative(value: f64, field: &str) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be a non-negative number", field));
    }
    Ok(())
}

/// Durations are bounded to one working shift
pub fn validate_duration(minutes: i32, field: &str) -> Result<(), String> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(format!(
            "{} must be between {} and {}",
            field, MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        ));
    }
    Ok(())
}

/// A new hourly rate must be strictly positive
pub fn validate_rate(rate: f64) -> Result<(), String> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err("hourly_rate must be greater than 0".to_string());
    }
    Ok(())
}

pub fn validate_create_table(req: &CreateTableRequest) -> Result<(), String> {
    require_name(&req.name, "name")?;
    require_non_negative(req.hourly_rate, "hourly_rate")
}

pub fn validate_start_session(req: &StartSessionRequest) -> Result<(), String> {
    if req.table_id <= 0 {
        return Err("table_id must be a positive integer".to_string());
    }
    require_name(&req.customer_name, "customer_name")?;
    validate_duration(req.preset_duration_minutes, "preset_duration_minutes")?;
    require_non_negative(req.prepaid_amount, "prepaid_amount")
}

pub fn validate_order_items(items: &[OrderItem]) -> Result<(), String> {
    if items.is_empty() {
        return Err("items must not be empty".to_string());
    }
    for item in items {
        if item.quantity < 1 {
            return Err(format!(
                "quantity for product {} must be at least 1",
                item.product_id
            ));
        }
    }
    Ok(())
}

pub fn validate_create_invoice(req: &CreateInvoiceRequest) -> Result<(), String> {
    require_name(&req.table_name, "table_name")?;
    if req.end_time < req.start_time {
        return Err("end_time must not be before start_time".to_string());
    }
    if req.play_duration_minutes < 0 {
        return Err("play_duration_minutes must not be negative".to_string());
    }
    require_non_negative(req.hourly_rate, "hourly_rate")?;
    require_non_negative(req.service_total, "service_total")?;
    require_non_negative(req.discount, "discount")
}

pub fn validate_create_product(req: &CreateProductRequest) -> Result<(), String> {
    require_name(&req.name, "name")?;
    require_non_negative(req.price, "price")
}

pub fn validate_update_product(req: &UpdateProductRequest) -> Result<(), String> {
    if let Some(name) = &req.name {
        require_name(name, "name")?;
    }
    if let Some(price) = req.price {
        require_non_negative(price, "price")?;
    }
    Ok(())
}

/// Resolve list pagination to `(limit, offset)`, clamping out-of-range values
pub fn page_bounds(query: &InvoiceListQuery) -> (i64, i64) {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);
    (limit, offset)
}
