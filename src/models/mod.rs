//! Data models for the circulation server

pub mod audit;
pub mod copy;
pub mod enums;
pub mod loan;
pub mod policy;
pub mod reader;
pub mod staff;

// Re-export commonly used types
pub use audit::AuditEntry;
pub use copy::Copy;
pub use enums::{AuditAction, CopyStatus, LoanStatus};
pub use loan::{Loan, LoanDetails};
pub use policy::LibraryPolicy;
pub use reader::Reader;
pub use staff::{Staff, StaffClaims};
