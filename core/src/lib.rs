pub mod context;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod registry;
pub mod scope;
pub mod variants;

#[cfg(test)]
mod dispatch_test;
