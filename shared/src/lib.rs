pub mod constants;
pub mod roulette;
pub mod validation;
