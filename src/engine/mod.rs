pub mod fulfillment;
pub mod matching;
pub mod registry;
pub mod wallet;
