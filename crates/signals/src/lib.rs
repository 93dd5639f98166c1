pub mod aggregator;
pub mod charts;
pub mod normalize;
pub mod providers;

pub use aggregator::SignalAggregator;
pub use charts::{ChartCaptureService, ScreenshotServiceCapture, default_charts};
