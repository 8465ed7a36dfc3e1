use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;
