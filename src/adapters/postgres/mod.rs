pub mod book_catalog;
pub mod customer_directory;
pub mod loan_repository;

// パブリックに型を再エクスポート
pub use book_catalog::BookCatalog as PostgresBookCatalog;
pub use customer_directory::CustomerDirectory as PostgresCustomerDirectory;
pub use loan_repository::LoanRepository as PostgresLoanRepository;
