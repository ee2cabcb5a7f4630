pub mod orderer;
