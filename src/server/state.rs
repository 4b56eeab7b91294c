use crate::caption::Captioner;
use crate::imaging::RasterBackend;

/// Shared by every request handler.
pub struct ServerState<B> {
    pub(crate) captioner: Captioner,
    pub(crate) backend: B,
}

impl<B: RasterBackend> ServerState<B> {
    pub fn new(captioner: Captioner, backend: B) -> Self {
        Self { captioner, backend }
    }
}
