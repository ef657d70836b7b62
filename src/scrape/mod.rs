//! Price scraping from browser-rendered pages.

pub mod chromium;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod normalize;
pub mod renderer;

pub use error::{ExtractError, ExtractionFailed};
pub use extractor::{ExtractorSettings, PriceExtractor};
pub use normalize::{NormalizedPrice, PriceUnit};
pub use renderer::{ElementHandle, Locator, PageRenderer, RenderSession, RendererError};
