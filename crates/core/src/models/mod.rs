pub mod allocation;
pub mod asset;
pub mod automatic;
pub mod history;
pub mod inflation;
pub mod manual;
pub mod price;
pub mod settings;
