pub mod aging;
pub mod collage;
pub mod counter;
pub mod orchestrator;
pub mod prepare;
pub mod shapes;

pub use crate::domain::model::{PhotoBytes, RequestOutcome, RequestState, SlotBox};
pub use crate::domain::ports::{ConfigProvider, ImageGenerator, ReplySink, StatusSink};
pub use crate::utils::error::Result;
