pub mod error;
pub mod ids;
pub mod key;
pub mod report;

pub use error::{ModelError, Result};
pub use ids::{DataType, FileType};
pub use key::{
    Key, MISSING_CODES, MISSING_NOT_APPLICABLE, MISSING_NOT_COLLECTED, MISSING_UNKNOWN, Tuple,
    is_missing_code, is_not_applicable,
};
pub use report::{ErrorKind, ReportSummary, ValidationError, ValidationMode, ValidationReport};
