pub mod allocation_service;
pub mod automatic_service;
pub mod currency_service;
pub mod inflation_service;
pub mod price_service;
pub mod trading_service;
