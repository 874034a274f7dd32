//! Extension trait for Option<&mut NodeInfo> to simplify logging
//!
//! ```ignore
//! ctx.log_debug("message");  // Instead of if let Some(ref mut c) = ctx { c.log_debug(...) }
//! ```

use super::{LogSummary, NodeInfo};

pub trait NodeInfoExt {
    fn log_debug(&mut self, message: &str);
    fn log_info(&mut self, message: &str);
    fn log_warning(&mut self, message: &str);
    fn log_error(&mut self, message: &str);
    fn log_status<T: LogSummary>(&mut self, status: &T);
}

impl NodeInfoExt for Option<&mut NodeInfo> {
    #[inline]
    fn log_debug(&mut self, message: &str) {
        if let Some(ref mut ctx) = self {
            ctx.log_debug(message);
        }
    }

    #[inline]
    fn log_info(&mut self, message: &str) {
        if let Some(ref mut ctx) = self {
            ctx.log_info(message);
        }
    }

    #[inline]
    fn log_warning(&mut self, message: &str) {
        if let Some(ref mut ctx) = self {
            ctx.log_warning(message);
        }
    }

    #[inline]
    fn log_error(&mut self, message: &str) {
        if let Some(ref mut ctx) = self {
            ctx.log_error(message);
        }
    }

    #[inline]
    fn log_status<T: LogSummary>(&mut self, status: &T) {
        if let Some(ref mut ctx) = self {
            ctx.log_status(status);
        }
    }
}
