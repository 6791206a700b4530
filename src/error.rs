use std::{error, fmt, result};

/// Short form to compose Error values.
///
/// Here are few possible ways:
///
/// ```ignore
/// use crate::error::Error;
/// err_at!(IOError, msg: "failed to open {:?}", file_path)
/// ```
///
/// ```ignore
/// use crate::error::Error;
/// err_at!(IOError, fs::read(file_path))
/// ```
///
/// ```ignore
/// use crate::error::Error;
/// err_at!(IOError, fs::read(file_path), "reading {:?}", file_path)
/// ```
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err($crate::Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err($crate::Error::$v(prefix, format!("{} {}", err, msg)))
            }
        }
    }};
}

/// Error variants that can be returned by this package's API.
///
/// Each variant carries a prefix, typically identifying the
/// failing function's source location.
#[derive(Clone)]
pub enum Error {
    /// Supplied argument or statement data is invalid.
    InvalidInput(String, String),
    /// File or directory cannot be used for what it is meant for.
    InvalidFile(String, String),
    /// Named table, view, index or field is missing from the catalogs.
    KeyNotFound(String, String),
    /// Could not acquire a shared or exclusive block lock within the
    /// configured timeout. Callers are expected to roll back.
    LockAbort(String, String),
    /// No buffer frame became available within the configured timeout.
    /// Callers are expected to roll back.
    BufferAbort(String, String),
    /// Statement rejected by the lexer or the parser.
    BadSyntax(String, String),
    /// Error from underlying file I/O.
    IOError(String, String),
    /// Lossless conversion between types failed.
    FailConvert(String, String),
    /// Broken invariant or contract violation, typically a bug.
    Fatal(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            InvalidInput(p, m) => write!(f, "InvalidInput:{} {}", p, m),
            InvalidFile(p, m) => write!(f, "InvalidFile:{} {}", p, m),
            KeyNotFound(p, m) => write!(f, "KeyNotFound:{} {}", p, m),
            LockAbort(p, m) => write!(f, "LockAbort:{} {}", p, m),
            BufferAbort(p, m) => write!(f, "BufferAbort:{} {}", p, m),
            BadSyntax(p, m) => write!(f, "BadSyntax:{} {}", p, m),
            IOError(p, m) => write!(f, "IOError:{} {}", p, m),
            FailConvert(p, m) => write!(f, "FailConvert:{} {}", p, m),
            Fatal(p, m) => write!(f, "Fatal:{} {}", p, m),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl error::Error for Error {}
