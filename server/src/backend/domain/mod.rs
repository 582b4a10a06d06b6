//! # Domain Module
//!
//! Business logic for the household budget and the farm record book.
//!
//! Services are cheap `Clone` handles over the shared [`Repositories`] and
//! work the same whether they are driven by the REST layer or by tests.
//!
//! ## Module Organization
//!
//! - **account_service**: Debt accounts, promotional balances and the budget summary
//! - **paycheck_service**: Biweekly paycheck breakdown
//! - **aggregator**: Categorized sums over line items
//! - **amortization**: Promotional balance payoff projection
//! - **farm_service**: The caller's farm profile
//! - **species_service**: Species and custom field definitions
//! - **animal_service**: Animals, custom field validation and display cards
//! - **health_service**: Health records, scheduled tasks and bulk actions
//! - **health_dashboard**: Alerts, counters and task lists derived from health data
//! - **withdrawal**: Withdrawal period dates and countdowns
//!
//! ## Core Concepts
//!
//! - **Session**: The authenticated caller; its user id keys the caller's farm
//! - **Clock**: Source of "today" so date windows can be tested
//! - **Batch**: A grouped write that commits every document or none
//!
//! [`Repositories`]: crate::backend::storage::Repositories

pub mod account_service;
pub mod aggregator;
pub mod amortization;
pub mod animal_service;
pub mod clock;
pub mod commands;
pub mod errors;
pub mod farm_service;
pub mod health_dashboard;
pub mod health_service;
pub mod money;
pub mod paycheck_service;
pub mod session;
pub mod species_service;
pub mod withdrawal;

pub use account_service::AccountService;
pub use animal_service::AnimalService;
pub use clock::{Clock, FixedClock, LocalClock};
pub use errors::{ServiceError, ServiceResult};
pub use farm_service::FarmService;
pub use health_service::HealthService;
pub use paycheck_service::PaycheckService;
pub use session::Session;
pub use species_service::SpeciesService;
