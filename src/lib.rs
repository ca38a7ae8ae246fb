pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod fetcher;
pub mod model;
pub mod output;
pub mod query;
pub mod refine;

#[cfg(test)]
mod tests;
