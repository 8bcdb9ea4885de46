mod errors;
mod loan_service;
mod locks;
mod queries;

pub use errors::{CirculationError, Result};
pub use loan_service::{MAX_OPEN_LOANS, ServiceDependencies, create_loan, renew_loan, return_loan};
pub use locks::{CirculationGuard, CirculationLocks};
pub use queries::{
    can_customer_borrow, get_loan, is_available, list_book_history, list_current, list_history,
    list_overdue,
};
