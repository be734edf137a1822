// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Internal redirections: template dispatch, error pages and SPA routing.

mod error;
mod spa;
mod template;

pub use error::{ErrorContext, ErrorPages, ErrorRedirect, DEFAULT_ERROR_PAGE, MIN_ERROR_STATUS};
pub use spa::{SpaSupport, DEFAULT_NO_REDIRECT_REGEX};
pub use template::TemplateRedirect;

use crate::error::Result;
use crate::request::PageRequest;
use crate::response::ResponseSink;

/// In-process forward of a request to another path of the application.
pub trait Forward {
    /// Handles the forwarded request, writing into the response.
    fn forward(&self, request: &PageRequest, response: &mut dyn ResponseSink) -> Result<()>;
}
