pub mod registry;
pub mod traits;

// Data provider implementations
pub mod bcb_sgs;
pub mod yahoo_chart;
