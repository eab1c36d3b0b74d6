pub use log;

//
// Encapsulation for the logger routines.
// Every line carries the source file and line number of the call site.
//
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::log::info!("[{}:{}] {}", file!(), line!(), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::log::debug!("[{}:{}] {}", file!(), line!(), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::log::error!("{} [{}:{}]", format!($($arg)*), file!(), line!())
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::log::warn!("{} [{}:{}]", format!($($arg)*), file!(), line!())
    };
}

/// Forward an error untouched, only logging the place where it went through.
#[macro_export]
macro_rules! tr_fwd {
    () => {
        $crate::err_closure_fwd(format!("[{}:{}]", file!(), line!()).as_str())
    };
}

/// Forward an error untouched, logging a message and the place where it went through.
///
/// ```ignore
/// let f = File::open(filename).map_err(err_fwd!("💣 Cannot open the file, filename=[{}]", filename))?;
/// ```
#[macro_export]
macro_rules! err_fwd {
    ($($arg:tt)*) => {
        $crate::err_closure_fwd(format!("{} [{}:{}]", format!($($arg)*).as_str(), file!(), line!()).as_str())
    };
}

pub fn err_closure_fwd<'a, T: std::fmt::Display>(msg: &'a str) -> Box<dyn Fn(T) -> T + 'a> {
    let lambda = move |e: T| {
        log_error!("[{}] - {}", e, msg);
        e
    };
    Box::new(lambda)
}
