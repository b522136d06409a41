//! # Domain Module
//!
//! Contains all business logic for the taxi ledger application.
//!
//! This module encapsulates the core business rules, entities, and services
//! that define how fleet revenue is recorded and how driver settlements are
//! calculated. It operates independently of any specific UI framework or
//! storage mechanism.
//!
//! ## Module Organization
//!
//! - **calendar**: Calendar week selection and current-week determination
//! - **fahrzeug_service**: Vehicle management and recurring cost items
//! - **mitarbeiter_service**: Employee management and pay terms
//! - **umsatz_service**: Weekly revenue capture with quick-entry upsert and
//!   field-wise aggregation
//! - **abrechnung_service**: Settlement calculation, validation and creation
//! - **statistik_service**: Dashboard figures and weekly revenue series
//! - **commands**: Internal result types shared between services and callers
//!
//! ## Key Responsibilities
//!
//! - **Revenue Capture**: One record per employee and calendar week, with
//!   quick entry replacing instead of duplicating
//! - **Settlement Calculation**: Aggregating selected weeks and applying the
//!   employee's revenue share, fixed deductions and ad-hoc adjustments
//! - **Cost Normalization**: Converting recurring vehicle costs of any
//!   payment frequency into monthly equivalents
//! - **Data Validation**: Validating input data before anything is persisted
//!
//! ## Business Rules
//!
//! - Calendar weeks are anchored at January 1st, not at ISO week boundaries
//! - Settlements are immutable once created; corrections are new settlements
//! - The settlement share is the employee's percentage of gross revenue,
//!   unclamped
//! - Derived monthly cost equivalents are recomputed on every change, never
//!   edited directly
//!
//! ## Design Principles
//!
//! - **Domain-Driven Design**: Models the real paperwork of a small taxi fleet
//! - **Single Responsibility**: Each service has a focused purpose
//! - **Storage Agnostic**: Works with any storage implementation
//! - **UI Agnostic**: Business logic separate from presentation concerns

pub mod calendar;
pub mod commands;
pub mod fahrzeug_service;
pub mod mitarbeiter_service;
pub mod umsatz_service;
pub mod abrechnung_service;
pub mod statistik_service;

pub use calendar::*;
pub use commands::*;
pub use fahrzeug_service::*;
pub use mitarbeiter_service::*;
pub use umsatz_service::*;
pub use abrechnung_service::*;
pub use statistik_service::*;
