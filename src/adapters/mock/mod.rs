pub mod book_catalog;
pub mod customer_directory;
pub mod loan_repository;

pub use book_catalog::BookCatalog;
pub use customer_directory::CustomerDirectory;
pub use loan_repository::LoanRepository;
