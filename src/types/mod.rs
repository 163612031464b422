pub mod instrument;
pub mod price;
pub mod quote_plan;
