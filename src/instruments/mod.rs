pub mod instrument_cache;

use crate::types::instrument::{Instrument, InstrumentId};

pub trait InstrumentProvider: Send + Sync {
    /// Looks up instrument metadata; `None` when the venue does not list it.
    fn instrument(&self, id: &InstrumentId) -> Option<Instrument>;
}
