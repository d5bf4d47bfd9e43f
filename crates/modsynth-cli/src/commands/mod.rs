pub mod check;
pub mod match_glob;
pub mod provenance;
pub mod resolve;
