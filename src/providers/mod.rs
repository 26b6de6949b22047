pub mod wise;

pub use wise::WiseRateProvider;
