//! Custom tracing layers

use tracing::{Subscriber, span};
use tracing_subscriber::{
    layer::{Context, Layer},
    registry::LookupSpan,
};

use crate::context::{UserContextData, UserContextGuard};

/// Layer that attaches the active user context to every new span
#[derive(Debug, Default)]
pub struct UserContextLayer;

impl UserContextLayer {
    /// Create a new user context layer
    pub fn new() -> Self {
        Self
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct UserContextExtension {
    pub data: UserContextData,
}

impl<S> Layer<S> for UserContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id)
            && let Some(user_ctx) = UserContextGuard::current()
        {
            span.extensions_mut()
                .insert(UserContextExtension { data: user_ctx });
        }
    }
}
